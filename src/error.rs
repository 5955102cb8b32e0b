//! Error types for the compositing engine.

use std::path::PathBuf;

/// Coarse failure category, used by callers that only care whether the
/// input was wrong or the environment was.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Correctable caller-level contract violation.
    InvalidArgument,
    /// Environment or state failure (missing file, bad data, detached layer).
    Runtime,
}

/// Errors produced by images, layers, stacks and composers.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A parameter was outside its legal domain.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A stack index stayed negative after resolving it against the count.
    #[error("index {index} is out of bounds for a stack of {count} layers")]
    IndexOutOfBounds { index: isize, count: usize },

    /// The requested file does not exist.
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Image data could not be decoded.
    #[error("could not decode image data: {0}")]
    Decode(String),

    /// Image data could not be encoded.
    #[error("could not encode image: {0}")]
    Encode(String),

    /// The layer is not attached to the image the operation targeted.
    #[error("layer is not attached to this image")]
    NotAttached,

    /// I/O failure while reading or writing.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidArgument(_) | Error::IndexOutOfBounds { .. } => ErrorKind::InvalidArgument,
            Error::FileNotFound(_)
            | Error::Decode(_)
            | Error::Encode(_)
            | Error::NotAttached
            | Error::Io(_) => ErrorKind::Runtime,
        }
    }

    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        let e = Error::IndexOutOfBounds { index: -4, count: 3 };
        assert_eq!(e.to_string(), "index -4 is out of bounds for a stack of 3 layers");

        let e = Error::FileNotFound(PathBuf::from("missing.png"));
        assert_eq!(e.to_string(), "file not found: missing.png");

        assert_eq!(Error::NotAttached.to_string(), "layer is not attached to this image");
    }

    #[test]
    fn kinds_follow_taxonomy() {
        assert_eq!(Error::invalid("w").kind(), ErrorKind::InvalidArgument);
        assert_eq!(
            Error::IndexOutOfBounds { index: -1, count: 0 }.kind(),
            ErrorKind::InvalidArgument
        );
        assert_eq!(Error::Decode("x".into()).kind(), ErrorKind::Runtime);
        assert_eq!(Error::NotAttached.kind(), ErrorKind::Runtime);
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk");
        assert_eq!(Error::from(io).kind(), ErrorKind::Runtime);
    }
}
