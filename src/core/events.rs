use std::path::Path;

/// Receives progress and lifecycle notifications from the fetch pipeline.
///
/// Every method has an empty default so implementors only override what they
/// display. The pipeline never writes to the terminal itself.
pub trait DownloadObserver {
    fn download_started(&mut self, _url: &str, _attempt: u32, _total_bytes: Option<u64>) {}

    fn bytes_received(&mut self, _downloaded: u64, _total_bytes: Option<u64>) {}

    fn download_failed(&mut self, _url: &str, _attempt: u32, _reason: &str) {}

    fn download_finished(&mut self, _path: &Path) {}

    fn extract_started(&mut self, _archive: &Path) {}

    fn extract_finished(&mut self, _destination: &Path) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl DownloadObserver for NoopObserver {}

/// Logs download progress through `tracing` in ten-percent steps.
#[derive(Debug, Default)]
pub struct TracingObserver {
    last_decile: Option<u32>,
}

impl DownloadObserver for TracingObserver {
    fn download_started(&mut self, url: &str, attempt: u32, total_bytes: Option<u64>) {
        self.last_decile = None;
        match total_bytes {
            Some(total) => tracing::debug!("attempt {attempt}: {url} ({total} bytes)"),
            None => tracing::debug!("attempt {attempt}: {url} (unknown size)"),
        }
    }

    fn bytes_received(&mut self, downloaded: u64, total_bytes: Option<u64>) {
        if total_bytes.is_none() {
            return;
        }
        let decile = (progress_fraction(downloaded, total_bytes) * 10.0) as u32;
        if self.last_decile != Some(decile) {
            self.last_decile = Some(decile);
            tracing::info!("downloaded {}% ({downloaded} bytes)", decile * 10);
        }
    }

    fn extract_finished(&mut self, destination: &Path) {
        tracing::debug!("merged into {}", destination.display());
    }
}

pub fn progress_fraction(downloaded: u64, expected: Option<u64>) -> f32 {
    if let Some(total) = expected {
        if total > 0 {
            return ((downloaded as f64 / total as f64).clamp(0.0, 1.0)) as f32;
        }
    }
    0.0
}
