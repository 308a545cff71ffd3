use std::fmt::Display;
use std::io;

/// Errors surfaced by type resolution.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested type could not be located by any resolution path.
    #[error("type not found: {0}")]
    TypeNotFound(String),
    /// Class bytes were available but could not be parsed.
    #[error("malformed class file: {0}")]
    MalformedClass(String),
    /// The resource channel failed while delivering class bytes.
    #[error("failed to read class bytes for {name}")]
    ResourceIo {
        name: String,
        #[source]
        source: io::Error,
    },
}

impl Error {
    pub(crate) fn malformed(detail: impl Display) -> Self {
        Error::MalformedClass(detail.to_string())
    }
}
