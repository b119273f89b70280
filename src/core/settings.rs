use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

const CONFIG_FILE: &str = "config.json";

pub const DEFAULT_HOST: &str = "https://paddle-imagenet-models-name.bj.bcebos.com/";
pub const DEFAULT_SUFFIX: &str = "_pretrained.tar";
pub const DOWNLOAD_RETRY_LIMIT: u32 = 3;
pub const DOWNLOAD_CHUNK_SIZE: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ZooSettings {
    pub host: String,
    pub suffix: String,
    pub retry_limit: u32,
    pub chunk_size: usize,
}

impl Default for ZooSettings {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.into(),
            suffix: DEFAULT_SUFFIX.into(),
            retry_limit: DOWNLOAD_RETRY_LIMIT,
            chunk_size: DOWNLOAD_CHUNK_SIZE,
        }
    }
}

impl ZooSettings {
    /// Reads `path`, falling back to defaults when no file has been written yet.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let bytes = fs::read(path).with_context(|| format!("failed reading {path:?}"))?;
        let parsed: ZooSettings =
            serde_json::from_slice(&bytes).context("config json could not be parsed")?;
        Ok(parsed.normalized())
    }

    pub fn persist(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("create dir {parent:?}"))?;
        }
        let serialized =
            serde_json::to_vec_pretty(self).context("serialize settings to json failed")?;
        fs::write(path, serialized).with_context(|| format!("write settings to {path:?}"))?;
        Ok(())
    }

    #[must_use]
    pub fn normalized(mut self) -> Self {
        if self.retry_limit == 0 {
            tracing::warn!("retryLimit of 0 would never download anything, using 1");
            self.retry_limit = 1;
        }
        if self.chunk_size == 0 {
            self.chunk_size = 1;
        }
        self
    }
}

pub fn resolve_config_path() -> Result<PathBuf> {
    let project_dirs =
        ProjectDirs::from("com", "ModelZoo", "ModelZoo").context("missing project directories")?;
    Ok(project_dirs.config_dir().join(CONFIG_FILE))
}
