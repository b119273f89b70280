pub mod core;
pub mod models;

pub use crate::core::{
    events::{DownloadObserver, NoopObserver, TracingObserver},
    settings::ZooSettings,
};
pub use models::{get, ModelZoo, Result, ZooError};
