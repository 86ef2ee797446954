use std::path::PathBuf;
use thiserror::Error;

/// Error type for this crate
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O Error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Decompress Error: {0}")]
    DecompressError(String),
    #[error("More data required to finish")]
    MoreDataRequired,
    #[error("Archive entry escapes the destination: {}", .0.display())]
    UnsafeEntryPath(PathBuf),
    #[error("Gave up after {0} nested compression layers")]
    DepthExceeded(usize),
    #[error("{}: {source}", path.display())]
    Failed {
        path: PathBuf,
        #[source]
        source: Box<Error>,
    },
}

/// Result type for this crate
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns `true` if the input data itself was malformed or truncated,
    /// looking through [`Error::Failed`] wrappers.
    pub fn is_decode_error(&self) -> bool {
        match self {
            Error::DecompressError(_) | Error::MoreDataRequired => true,
            Error::Failed { source, .. } => source.is_decode_error(),
            _ => false,
        }
    }

    /// Innermost error, skipping [`Error::Failed`] wrappers.
    pub fn root(&self) -> &Error {
        match self {
            Error::Failed { source, .. } => source.root(),
            e => e,
        }
    }

    pub(crate) fn at(self, path: impl Into<PathBuf>) -> Self {
        Error::Failed {
            path: path.into(),
            source: Box::new(self),
        }
    }

    /// Recover a crate error that was boxed into an [`std::io::Error`] while
    /// passing through a [`std::io::Read`] implementation.
    pub(crate) fn from_io(e: std::io::Error) -> Self {
        if !e.get_ref().map_or(false, |inner| inner.is::<Error>()) {
            return Error::IoError(e);
        }
        match e.into_inner().map(|inner| inner.downcast::<Error>()) {
            Some(Ok(inner)) => *inner,
            Some(Err(other)) => Error::IoError(std::io::Error::new(std::io::ErrorKind::Other, other)),
            None => Error::IoError(std::io::ErrorKind::Other.into()),
        }
    }
}

impl From<Error> for std::io::Error {
    fn from(e: Error) -> Self {
        match e {
            Error::IoError(e) => e,
            Error::MoreDataRequired => std::io::Error::new(std::io::ErrorKind::UnexpectedEof, e),
            _ => std::io::Error::new(std::io::ErrorKind::Other, e),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_from_io_recovers_decompress_error() {
        let io_error: std::io::Error = Error::DecompressError("bad block".to_string()).into();
        match Error::from_io(io_error) {
            Error::DecompressError(message) => assert_eq!(message, "bad block"),
            other => panic!("unexpected error: {:?}", other),
        }

        let io_error: std::io::Error = Error::MoreDataRequired.into();
        assert_eq!(io_error.kind(), std::io::ErrorKind::UnexpectedEof);
        assert!(matches!(Error::from_io(io_error), Error::MoreDataRequired));
    }

    #[test]
    fn test_from_io_keeps_plain_io_error() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        match Error::from_io(io_error) {
            Error::IoError(e) => assert_eq!(e.kind(), std::io::ErrorKind::NotFound),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_decode_error_through_wrapper() {
        let e = Error::MoreDataRequired.at("a.bz2").at("a.bz2.bz2");
        assert!(e.is_decode_error());
        assert!(matches!(e.root(), Error::MoreDataRequired));
        assert_eq!(e.to_string(), "a.bz2.bz2: a.bz2: More data required to finish");

        let e = Error::DepthExceeded(3).at("x");
        assert!(!e.is_decode_error());
    }
}
