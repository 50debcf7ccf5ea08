use std::error;
use std::fmt;
use std::io;

use boxing_codec::StageError;
use boxing_config::ConfigError;
use boxing_core::BoxingError;

/// The top-level result taxonomy: every non-`Ok` variant maps one-to-one
/// onto a result code the unboxer returns to its caller.
#[derive(Debug)]
pub enum UnboxError {
    ConfigError(String),
    BorderTrackingError(String),
    DataDecodeError(String),
    CrcMismatchError,
    MetadataError(String),
    ProcessCallbackAbort,
    Io(io::Error),
}

impl error::Error for UnboxError {}

impl fmt::Display for UnboxError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::ConfigError(msg) => write!(f, "config error: {}", msg),
            Self::BorderTrackingError(msg) => write!(f, "border tracking error: {}", msg),
            Self::DataDecodeError(msg) => write!(f, "data decode error: {}", msg),
            Self::CrcMismatchError => write!(f, "crc mismatch"),
            Self::MetadataError(msg) => write!(f, "metadata error: {}", msg),
            Self::ProcessCallbackAbort => write!(f, "aborted by caller"),
            Self::Io(e) => write!(f, "io error: {}", e),
        }
    }
}

impl From<io::Error> for UnboxError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<BoxingError> for UnboxError {
    fn from(e: BoxingError) -> Self {
        match e {
            BoxingError::ConfigError(msg) => Self::ConfigError(msg),
            BoxingError::BorderTrackingError(msg) => Self::BorderTrackingError(msg),
            BoxingError::DataDecodeError(msg) => Self::DataDecodeError(msg),
            BoxingError::CrcMismatchError => Self::CrcMismatchError,
            BoxingError::MetadataError(msg) => Self::MetadataError(msg),
            BoxingError::ProcessCallbackAbort => Self::ProcessCallbackAbort,
            BoxingError::Io(e) => Self::Io(e),
        }
    }
}

impl From<ConfigError> for UnboxError {
    fn from(e: ConfigError) -> Self {
        Self::ConfigError(e.to_string())
    }
}

impl From<StageError> for UnboxError {
    fn from(e: StageError) -> Self {
        match e {
            StageError::DataDecodeError(msg) => Self::DataDecodeError(msg),
            StageError::CrcMismatch => Self::CrcMismatchError,
            StageError::ConfigError(msg) => Self::ConfigError(msg),
        }
    }
}

/// The coarse result code a caller checks first, independent of the
/// error message text carried by `UnboxError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultCode {
    Ok,
    ConfigError,
    BorderTrackingError,
    DataDecodeError,
    CrcMismatchError,
    MetadataError,
    ProcessCallbackAbort,
}

impl From<&UnboxError> for ResultCode {
    fn from(e: &UnboxError) -> Self {
        match e {
            UnboxError::ConfigError(_) => ResultCode::ConfigError,
            UnboxError::BorderTrackingError(_) => ResultCode::BorderTrackingError,
            UnboxError::DataDecodeError(_) => ResultCode::DataDecodeError,
            UnboxError::CrcMismatchError => ResultCode::CrcMismatchError,
            UnboxError::MetadataError(_) => ResultCode::MetadataError,
            UnboxError::ProcessCallbackAbort => ResultCode::ProcessCallbackAbort,
            UnboxError::Io(_) => ResultCode::ConfigError,
        }
    }
}
