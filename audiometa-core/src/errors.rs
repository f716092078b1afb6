// Error handling modeled after the error type used throughout this crate family: a closed
// set of error kinds, one convenience constructor per kind, and a `Result` alias.

use std::error::Error as StdError;
use std::fmt;

/// Closed set of error kinds a parser in this workspace can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Io,
    ShortRead,
    InvalidMagic,
    UnsupportedVersion,
    MalformedField,
    UnsupportedEncryption,
    UnknownCodec,
    InvalidStreamParameters,
}

impl ErrorKind {
    fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Io => "io error",
            ErrorKind::ShortRead => "short read",
            ErrorKind::InvalidMagic => "invalid magic",
            ErrorKind::UnsupportedVersion => "unsupported version",
            ErrorKind::MalformedField => "malformed field",
            ErrorKind::UnsupportedEncryption => "unsupported encryption",
            ErrorKind::UnknownCodec => "unknown codec",
            ErrorKind::InvalidStreamParameters => "invalid stream parameters",
        }
    }
}

/// An error produced by a parser in this workspace.
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    desc: String,
    source: Option<std::io::Error>,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.as_str(), self.desc)
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source.as_ref().map(|e| e as &(dyn StdError + 'static))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        let kind = match err.kind() {
            std::io::ErrorKind::UnexpectedEof => ErrorKind::ShortRead,
            _ => ErrorKind::Io,
        };
        Error { kind, desc: err.to_string(), source: Some(err) }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

fn make<T>(kind: ErrorKind, desc: impl Into<String>) -> Result<T> {
    Err(Error { kind, desc: desc.into(), source: None })
}

/// Convenience function to create an I/O error.
pub fn io_error<T>(desc: impl Into<String>) -> Result<T> {
    make(ErrorKind::Io, desc)
}

/// Convenience function to create a short-read error.
pub fn short_read_error<T>(desc: impl Into<String>) -> Result<T> {
    make(ErrorKind::ShortRead, desc)
}

/// Convenience function to create an invalid-magic error.
pub fn invalid_magic_error<T>(desc: impl Into<String>) -> Result<T> {
    make(ErrorKind::InvalidMagic, desc)
}

/// Convenience function to create an unsupported-version error.
pub fn unsupported_version_error<T>(desc: impl Into<String>) -> Result<T> {
    make(ErrorKind::UnsupportedVersion, desc)
}

/// Convenience function to create a malformed-field error.
pub fn malformed_error<T>(desc: impl Into<String>) -> Result<T> {
    make(ErrorKind::MalformedField, desc)
}

/// Convenience function to create an unsupported-encryption error.
pub fn unsupported_encryption_error<T>(desc: impl Into<String>) -> Result<T> {
    make(ErrorKind::UnsupportedEncryption, desc)
}

/// Convenience function to create an unknown-codec error.
pub fn unknown_codec_error<T>(desc: impl Into<String>) -> Result<T> {
    make(ErrorKind::UnknownCodec, desc)
}

/// Convenience function to create an invalid-stream-parameters error.
pub fn invalid_stream_parameters_error<T>(desc: impl Into<String>) -> Result<T> {
    make(ErrorKind::InvalidStreamParameters, desc)
}
