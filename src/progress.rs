use std::{path::Path, time::Duration};

use indicatif::{ProgressBar, ProgressStyle};
use model_zoo::DownloadObserver;

/// Terminal progress for downloads and a spinner while unpacking.
#[derive(Default)]
pub struct ProgressBarObserver {
    bar: Option<ProgressBar>,
}

impl ProgressBarObserver {
    fn clear(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }
}

impl DownloadObserver for ProgressBarObserver {
    fn download_started(&mut self, _url: &str, attempt: u32, total_bytes: Option<u64>) {
        self.clear();
        let bar = match total_bytes {
            Some(total) => ProgressBar::new(total).with_style(
                ProgressStyle::with_template(
                    "{msg} [{bar:40}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
            ),
            None => ProgressBar::new_spinner().with_style(
                ProgressStyle::with_template("{spinner} {msg} {bytes}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            ),
        };
        bar.set_message(format!("attempt {attempt}"));
        self.bar = Some(bar);
    }

    fn bytes_received(&mut self, downloaded: u64, _total_bytes: Option<u64>) {
        if let Some(bar) = &self.bar {
            bar.set_position(downloaded);
        }
    }

    fn download_failed(&mut self, _url: &str, attempt: u32, reason: &str) {
        if let Some(bar) = self.bar.take() {
            bar.abandon_with_message(format!("attempt {attempt} failed: {reason}"));
        }
    }

    fn download_finished(&mut self, _path: &Path) {
        self.clear();
    }

    fn extract_started(&mut self, archive: &Path) {
        self.clear();
        let spinner = ProgressBar::new_spinner().with_style(
            ProgressStyle::with_template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.set_message(format!("Decompressing {}", archive.display()));
        spinner.enable_steady_tick(Duration::from_millis(100));
        self.bar = Some(spinner);
    }

    fn extract_finished(&mut self, _destination: &Path) {
        self.clear();
    }
}
