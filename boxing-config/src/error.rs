use std::error;
use std::fmt;

/// Failures in parsing the `(group, key) -> value` configuration map or
/// resolving it into typed descriptors. All map directly onto the
/// top-level `CONFIG_ERROR` result code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Parse { line: usize, message: String },
    MissingKey { group: String, key: String },
    UnknownStage(String),
    UnknownFormat(String),
}

impl error::Error for ConfigError {}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Parse { line, message } => write!(f, "config parse error at line {}: {}", line, message),
            Self::MissingKey { group, key } => {
                write!(f, "missing required configuration key {}.{}", group, key)
            }
            Self::UnknownStage(name) => write!(f, "unrecognised codec stage '{}'", name),
            Self::UnknownFormat(name) => write!(f, "unknown named frame format preset '{}'", name),
        }
    }
}
