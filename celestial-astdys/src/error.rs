//! Error taxonomy for catalog access.
//!
//! | Variant | Raised by |
//! |---------|-----------|
//! | [`Download`](Error::Download) | fetching a raw catalog that is not on disk |
//! | [`Format`](Error::Format) | raw catalogs or cached CSVs that do not match their descriptor |
//! | [`Config`](Error::Config) | unknown catalog types, invalid descriptors, epoch requests without an epoch |
//! | [`Validation`](Error::Validation) | bad query arguments |
//! | [`Io`](Error::Io) | filesystem failures |
//!
//! A lookup that finds nothing is not an error: searches return `None` or
//! omit the identifier from the result map.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(
        "failed to download {url}: {reason}. Put the raw catalog at {} (or its CSV cache next to it) manually",
        path.display()
    )]
    Download {
        url: String,
        path: PathBuf,
        reason: String,
    },

    #[error("format error: {0}")]
    Format(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn download(url: &str, path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Download {
            url: url.to_string(),
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
