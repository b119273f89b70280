use std::{
    io,
    path::{Path, PathBuf},
};

use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type Result<T, E = ZooError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ZooError {
    /// The remote answered with something other than 200.
    #[error("downloading from {url} failed with status {status}")]
    Url { url: String, status: u16 },

    /// Every download attempt failed to leave a file under its final name.
    #[error("download from {url} failed: retry limit ({limit}) reached")]
    Retry {
        url: String,
        limit: u32,
        #[source]
        last: Option<Box<ZooError>>,
    },

    #[error("unsupported archive format: {}", path.display())]
    UnsupportedArchive { path: PathBuf },

    #[error(
        "cannot merge {} into {}: a file and a directory share this name",
        from.display(),
        to.display()
    )]
    MergeTypeMismatch { from: PathBuf, to: PathBuf },

    #[error("request to {url} failed")]
    Transport {
        url: String,
        #[source]
        source: BoxError,
    },

    #[error("transfer from {url} was interrupted")]
    Transfer {
        url: String,
        #[source]
        source: io::Error,
    },

    #[error("create http client")]
    HttpClient(#[source] reqwest::Error),

    #[error("cannot derive a file name from {url}")]
    InvalidUrl { url: String },

    #[error("{context}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
}

impl ZooError {
    /// Whether this failure consumes one download attempt instead of aborting.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ZooError::Url { .. } | ZooError::Transport { .. } | ZooError::Transfer { .. }
        )
    }
}

pub(crate) trait IoContext<T> {
    fn io_context(self, action: &str, path: &Path) -> Result<T>;
}

impl<T> IoContext<T> for io::Result<T> {
    fn io_context(self, action: &str, path: &Path) -> Result<T> {
        self.map_err(|source| ZooError::Io {
            context: format!("{action} {}", path.display()),
            source,
        })
    }
}
