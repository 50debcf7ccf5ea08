use std::error;
use std::fmt;
use std::io;

/// The result-code taxonomy the unboxer surfaces. Each variant is exclusive;
/// a decode either returns `Ok` or exactly one of these.
#[derive(Debug)]
pub enum BoxingError {
    /// Malformed or incomplete configuration, or a pipeline stage size
    /// mismatch discovered while constructing the dispatcher.
    ConfigError(String),
    /// Corners, reference bars, or the container grid could not be
    /// recovered from the image.
    BorderTrackingError(String),
    /// A forward-error-correction stage exhausted its correction capacity.
    DataDecodeError(String),
    /// All stages succeeded but the recomputed CRC disagrees with the
    /// stored one.
    CrcMismatchError,
    /// The metadata pipeline failed, or a metadata record carried an
    /// unknown tag.
    MetadataError(String),
    /// The caller's progress callback requested an abort.
    ProcessCallbackAbort,
    /// Wraps an I/O failure from the CLI / config-loading boundary; not
    /// part of the core taxonomy but needed where core crates read files.
    Io(io::Error),
}

impl error::Error for BoxingError {}

impl fmt::Display for BoxingError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::ConfigError(msg) => write!(f, "config error: {}", msg),
            Self::BorderTrackingError(stage) => {
                write!(f, "border tracking error at stage {:?}", stage)
            }
            Self::DataDecodeError(msg) => write!(f, "data decode error: {}", msg),
            Self::CrcMismatchError => write!(f, "crc mismatch"),
            Self::MetadataError(msg) => write!(f, "metadata error: {}", msg),
            Self::ProcessCallbackAbort => write!(f, "aborted by caller"),
            Self::Io(err) => write!(f, "io error: {}", err),
        }
    }
}

impl From<io::Error> for BoxingError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}
