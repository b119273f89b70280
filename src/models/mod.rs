mod download;
mod error;
mod extract;
mod merge;
mod resolver;
mod transport;
mod zoo;

pub use download::{download, DownloadPlan};
pub use error::{BoxError, Result, ZooError};
pub use extract::{extract, ArchiveFormat};
pub use merge::merge_into;
pub use resolver::UrlResolver;
pub use transport::{RemoteResponse, ReqwestTransport, Transport};
pub use zoo::{get, ModelZoo};
