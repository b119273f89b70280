use std::{
    fs::{self, File},
    io::{ErrorKind, Read, Write},
    path::{Path, PathBuf},
};

use tracing::{info, warn};

use super::{
    error::{IoContext, Result, ZooError},
    transport::{RemoteResponse, Transport},
};
use crate::core::{events::DownloadObserver, settings::ZooSettings};

const TMP_SUFFIX: &str = "_tmp";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadPlan {
    pub uri: String,
    pub destination: PathBuf,
    pub filename: String,
    pub retry_limit: u32,
    pub chunk_size: usize,
}

impl DownloadPlan {
    pub fn new(uri: &str, destination: &Path, settings: &ZooSettings) -> Result<Self> {
        let filename = filename_from_uri(uri).ok_or_else(|| ZooError::InvalidUrl {
            url: uri.to_string(),
        })?;
        Ok(Self {
            uri: uri.to_string(),
            destination: destination.to_path_buf(),
            filename,
            retry_limit: settings.retry_limit.max(1),
            chunk_size: settings.chunk_size.max(1),
        })
    }

    #[must_use]
    pub fn target_path(&self) -> PathBuf {
        self.destination.join(&self.filename)
    }

    /// Sibling of the target that receives bytes until the transfer completes.
    #[must_use]
    pub fn staging_path(&self) -> PathBuf {
        self.destination.join(format!("{}{}", self.filename, TMP_SUFFIX))
    }
}

enum Attempt {
    Committed { bytes: u64 },
    Failed(ZooError),
}

/// Makes sure `plan.target_path()` exists, fetching it when it does not.
///
/// An existing target is trusted as-is and returned without touching the
/// network. Otherwise up to `plan.retry_limit` GET requests are issued; a
/// non-200 status, a request that could not be sent and a body that broke
/// mid-stream each consume one attempt. Local filesystem failures abort
/// immediately. Bytes land in `plan.staging_path()` and are renamed onto the
/// target only once the body has been read to the end, so a crash never
/// leaves a partial file under the final name.
pub fn download(
    transport: &dyn Transport,
    plan: &DownloadPlan,
    observer: &mut dyn DownloadObserver,
) -> Result<PathBuf> {
    fs::create_dir_all(&plan.destination)
        .io_context("create download directory", &plan.destination)?;

    let target = plan.target_path();
    let mut attempts = 0u32;
    let mut last_failure: Option<ZooError> = None;

    while !target.exists() {
        if attempts >= plan.retry_limit {
            return Err(ZooError::Retry {
                url: plan.uri.clone(),
                limit: plan.retry_limit,
                last: last_failure.map(Box::new),
            });
        }
        attempts += 1;

        info!("Downloading {} from {}", plan.filename, plan.uri);
        match attempt(transport, plan, attempts, observer)? {
            Attempt::Committed { bytes } => {
                info!("Saved {} bytes to {}", bytes, target.display());
            }
            Attempt::Failed(error) => {
                warn!(
                    "Download attempt {}/{} for {} failed: {}",
                    attempts, plan.retry_limit, plan.uri, error
                );
                observer.download_failed(&plan.uri, attempts, &error.to_string());
                last_failure = Some(error);
            }
        }
    }

    observer.download_finished(&target);
    Ok(target)
}

fn attempt(
    transport: &dyn Transport,
    plan: &DownloadPlan,
    number: u32,
    observer: &mut dyn DownloadObserver,
) -> Result<Attempt> {
    let response = match transport.get(&plan.uri) {
        Ok(response) => response,
        Err(error) if error.is_retryable() => return Ok(Attempt::Failed(error)),
        Err(error) => return Err(error),
    };

    if response.status != 200 {
        return Ok(Attempt::Failed(ZooError::Url {
            url: plan.uri.clone(),
            status: response.status,
        }));
    }

    observer.download_started(&plan.uri, number, response.content_length);

    let staging = plan.staging_path();
    let bytes = match download_to_file(plan, response, &staging, observer) {
        Ok(bytes) => bytes,
        Err(error) if error.is_retryable() => return Ok(Attempt::Failed(error)),
        Err(error) => return Err(error),
    };

    fs::rename(&staging, plan.target_path()).io_context("promote download", &staging)?;
    Ok(Attempt::Committed { bytes })
}

fn download_to_file(
    plan: &DownloadPlan,
    mut response: RemoteResponse,
    path: &Path,
    observer: &mut dyn DownloadObserver,
) -> Result<u64> {
    let mut file = File::create(path).io_context("create staging file", path)?;
    let total = response.content_length;
    let mut downloaded = 0u64;
    let mut buffer = vec![0u8; plan.chunk_size];
    loop {
        let read = match response.body.read(&mut buffer) {
            Ok(read) => read,
            Err(error) if error.kind() == ErrorKind::Interrupted => continue,
            Err(source) => {
                return Err(ZooError::Transfer {
                    url: plan.uri.clone(),
                    source,
                })
            }
        };
        if read == 0 {
            break;
        }
        file.write_all(&buffer[..read])
            .io_context("write download chunk to", path)?;
        downloaded += read as u64;
        observer.bytes_received(downloaded, total);
    }
    file.sync_all().io_context("flush", path)?;
    Ok(downloaded)
}

fn filename_from_uri(uri: &str) -> Option<String> {
    let clean = uri.split(['?', '#']).next()?;
    let last_segment = clean.rsplit('/').next()?.trim();
    if last_segment.is_empty() || last_segment == "." || last_segment == ".." {
        None
    } else {
        Some(last_segment.to_string())
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, collections::VecDeque, io};

    use super::*;
    use crate::core::events::NoopObserver;

    enum Reply {
        Status(u16),
        Body(&'static [u8]),
        Broken,
        Refused,
    }

    struct ScriptedTransport {
        replies: RefCell<VecDeque<Reply>>,
        calls: RefCell<u32>,
    }

    impl ScriptedTransport {
        fn new(replies: Vec<Reply>) -> Self {
            Self {
                replies: RefCell::new(replies.into()),
                calls: RefCell::new(0),
            }
        }

        fn calls(&self) -> u32 {
            *self.calls.borrow()
        }
    }

    struct BrokenBody;

    impl Read for BrokenBody {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(ErrorKind::ConnectionReset, "peer went away"))
        }
    }

    impl Transport for ScriptedTransport {
        fn get(&self, url: &str) -> Result<RemoteResponse> {
            *self.calls.borrow_mut() += 1;
            let reply = self.replies.borrow_mut().pop_front().unwrap_or(Reply::Status(500));
            match reply {
                Reply::Status(status) => Ok(RemoteResponse {
                    status,
                    content_length: None,
                    body: Box::new(io::empty()),
                }),
                Reply::Body(bytes) => Ok(RemoteResponse {
                    status: 200,
                    content_length: Some(bytes.len() as u64),
                    body: Box::new(bytes),
                }),
                Reply::Broken => Ok(RemoteResponse {
                    status: 200,
                    content_length: Some(64),
                    body: Box::new(BrokenBody),
                }),
                Reply::Refused => Err(ZooError::Transport {
                    url: url.to_string(),
                    source: "connection refused".into(),
                }),
            }
        }
    }

    const URL: &str = "http://mock.local/ResNet50_pretrained.tar";

    fn plan(dir: &Path) -> DownloadPlan {
        DownloadPlan::new(URL, dir, &ZooSettings::default()).unwrap()
    }

    #[derive(Default)]
    struct Recorder {
        progress: Vec<u64>,
        failures: u32,
    }

    impl DownloadObserver for Recorder {
        fn bytes_received(&mut self, downloaded: u64, _total: Option<u64>) {
            self.progress.push(downloaded);
        }

        fn download_failed(&mut self, _url: &str, _attempt: u32, _reason: &str) {
            self.failures += 1;
        }
    }

    #[test]
    fn filename_comes_from_last_segment() {
        assert_eq!(
            filename_from_uri("https://host/a/b/model.tar?download=1#top").as_deref(),
            Some("model.tar")
        );
        assert_eq!(filename_from_uri("https://host/dir/"), None);
    }

    #[test]
    fn invalid_url_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let error = DownloadPlan::new("https://host/", dir.path(), &ZooSettings::default())
            .unwrap_err();
        assert!(matches!(error, ZooError::InvalidUrl { .. }));
    }

    #[test]
    fn creates_missing_destination_and_writes_body() {
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("models").join("nested");
        let transport = ScriptedTransport::new(vec![Reply::Body(b"archive-bytes")]);

        let path = download(&transport, &plan(&destination), &mut NoopObserver).unwrap();

        assert_eq!(path, destination.join("ResNet50_pretrained.tar"));
        assert_eq!(fs::read(&path).unwrap(), b"archive-bytes");
        assert!(!destination.join("ResNet50_pretrained.tar_tmp").exists());
    }

    #[test]
    fn second_download_makes_no_requests() {
        let dir = tempfile::tempdir().unwrap();
        let transport = ScriptedTransport::new(vec![Reply::Body(b"first")]);
        let plan = plan(dir.path());

        let first = download(&transport, &plan, &mut NoopObserver).unwrap();
        let second = download(&transport, &plan, &mut NoopObserver).unwrap();

        assert_eq!(first, second);
        assert_eq!(transport.calls(), 1);
    }

    #[test]
    fn leftover_tmp_file_is_ignored_and_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let plan = plan(dir.path());
        fs::write(plan.staging_path(), b"half a file that is much longer").unwrap();
        let transport = ScriptedTransport::new(vec![Reply::Body(b"whole")]);

        let path = download(&transport, &plan, &mut NoopObserver).unwrap();

        assert_eq!(transport.calls(), 1);
        assert_eq!(fs::read(path).unwrap(), b"whole");
        assert!(!plan.staging_path().exists());
    }

    #[test]
    fn always_failing_status_uses_exactly_three_requests() {
        let dir = tempfile::tempdir().unwrap();
        let transport = ScriptedTransport::new(vec![
            Reply::Status(404),
            Reply::Status(404),
            Reply::Status(404),
            Reply::Status(404),
        ]);
        let mut recorder = Recorder::default();

        let error = download(&transport, &plan(dir.path()), &mut recorder).unwrap_err();

        assert_eq!(transport.calls(), 3);
        assert_eq!(recorder.failures, 3);
        match error {
            ZooError::Retry { url, limit, last } => {
                assert_eq!(url, URL);
                assert_eq!(limit, 3);
                assert!(matches!(
                    last.as_deref(),
                    Some(ZooError::Url { status: 404, .. })
                ));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn transient_failures_are_retried_until_success() {
        let dir = tempfile::tempdir().unwrap();
        let transport = ScriptedTransport::new(vec![
            Reply::Refused,
            Reply::Broken,
            Reply::Body(b"ok"),
        ]);

        let path = download(&transport, &plan(dir.path()), &mut NoopObserver).unwrap();

        assert_eq!(transport.calls(), 3);
        assert_eq!(fs::read(path).unwrap(), b"ok");
    }

    #[test]
    fn retry_limit_comes_from_settings() {
        let dir = tempfile::tempdir().unwrap();
        let settings = ZooSettings {
            retry_limit: 1,
            ..ZooSettings::default()
        };
        let plan = DownloadPlan::new(URL, dir.path(), &settings).unwrap();
        let transport = ScriptedTransport::new(vec![Reply::Status(503), Reply::Body(b"late")]);

        let error = download(&transport, &plan, &mut NoopObserver).unwrap_err();

        assert!(matches!(error, ZooError::Retry { limit: 1, .. }));
        assert_eq!(transport.calls(), 1);
    }

    #[test]
    fn progress_is_reported_per_chunk() {
        let dir = tempfile::tempdir().unwrap();
        let settings = ZooSettings {
            chunk_size: 4,
            ..ZooSettings::default()
        };
        let plan = DownloadPlan::new(URL, dir.path(), &settings).unwrap();
        let transport = ScriptedTransport::new(vec![Reply::Body(b"0123456789")]);
        let mut recorder = Recorder::default();

        download(&transport, &plan, &mut recorder).unwrap();

        assert_eq!(recorder.progress, vec![4, 8, 10]);
    }
}
