use std::fmt::{self, Debug, Display};
use std::io;

pub type Error = Box<dyn std::error::Error + Send + Sync + 'static>;

pub struct DisplayError(Error);

impl Debug for DisplayError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl<T: Into<Error>> From<T> for DisplayError {
    fn from(display: T) -> Self {
        DisplayError(display.into())
    }
}

/// Why a single request could not be served. The client only ever sees the
/// fixed "document not found" text; the detail here goes to the log.
#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    #[error("selector does not resolve: {0}")]
    NotFound(#[source] io::Error),
    #[error("stat failed on resolved node: {0}")]
    Stat(#[source] io::Error),
    #[error("directory enumeration failed: {0}")]
    Enumerate(#[source] io::Error),
    #[error("writing response: {0}")]
    Write(#[source] io::Error),
}

pub trait IoErrorExt {
    fn applies_to(&self) -> AppliesTo;
}

impl IoErrorExt for io::Error {
    fn applies_to(&self) -> AppliesTo {
        match self.kind() {
            io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset => AppliesTo::Connection,
            _ => AppliesTo::Listener,
        }
    }
}

pub enum AppliesTo {
    Connection,
    Listener,
}
