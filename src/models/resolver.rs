use crate::core::settings::{ZooSettings, DEFAULT_HOST, DEFAULT_SUFFIX};

/// Builds download URLs of the form `<host><architecture><suffix>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlResolver {
    host: String,
    suffix: String,
}

impl UrlResolver {
    pub fn new(host: impl Into<String>, suffix: impl Into<String>) -> Self {
        let mut host = host.into();
        if !host.ends_with('/') {
            host.push('/');
        }
        Self {
            host,
            suffix: suffix.into(),
        }
    }

    pub fn from_settings(settings: &ZooSettings) -> Self {
        Self::new(settings.host.as_str(), settings.suffix.as_str())
    }

    #[must_use]
    pub fn resolve(&self, architecture: &str) -> String {
        format!("{}{}{}", self.host, architecture, self.suffix)
    }
}

impl Default for UrlResolver {
    fn default() -> Self {
        Self::new(DEFAULT_HOST, DEFAULT_SUFFIX)
    }
}
