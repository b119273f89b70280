use std::path::{Path, PathBuf};

use tracing::info;

use super::{
    download::{download, DownloadPlan},
    error::Result,
    extract::extract,
    resolver::UrlResolver,
    transport::{ReqwestTransport, Transport},
};
use crate::core::{
    events::{DownloadObserver, NoopObserver},
    settings::ZooSettings,
};

/// Fetches pretrained model archives into local directories.
pub struct ModelZoo {
    settings: ZooSettings,
    resolver: UrlResolver,
    transport: Box<dyn Transport>,
}

impl ModelZoo {
    pub fn new(settings: ZooSettings) -> Result<Self> {
        let transport = ReqwestTransport::new()?;
        Ok(Self::with_transport(settings, Box::new(transport)))
    }

    pub fn with_transport(settings: ZooSettings, transport: Box<dyn Transport>) -> Self {
        let settings = settings.normalized();
        Self {
            resolver: UrlResolver::from_settings(&settings),
            settings,
            transport,
        }
    }

    #[must_use]
    pub fn resolve(&self, architecture: &str) -> String {
        self.resolver.resolve(architecture)
    }

    pub fn download(
        &self,
        url: &str,
        destination: &Path,
        observer: &mut dyn DownloadObserver,
    ) -> Result<PathBuf> {
        let plan = DownloadPlan::new(url, destination, &self.settings)?;
        download(&*self.transport, &plan, observer)
    }

    /// Makes the pretrained weights for `architecture` available under `path`.
    ///
    /// With `decompress` the archive is unpacked, merged into `path` and
    /// deleted; without it the raw archive is left in `path`.
    pub fn get(
        &self,
        architecture: &str,
        path: &Path,
        decompress: bool,
        observer: &mut dyn DownloadObserver,
    ) -> Result<()> {
        let url = self.resolve(architecture);
        let archive = self.download(&url, path, observer)?;
        if decompress {
            extract(&archive, observer)?;
        }
        info!("download {} finished", archive.display());
        Ok(())
    }
}

impl std::fmt::Debug for ModelZoo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelZoo")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

/// Downloads `architecture` with default settings over HTTP.
pub fn get(architecture: &str, path: impl AsRef<Path>, decompress: bool) -> Result<()> {
    ModelZoo::new(ZooSettings::default())?.get(
        architecture,
        path.as_ref(),
        decompress,
        &mut NoopObserver,
    )
}
