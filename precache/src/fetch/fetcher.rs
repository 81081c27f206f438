//! Streaming an asset through the caching server.
//!
//! The request always goes to the proxied URL so the caching server sees the
//! transfer and stores it. The body is read to the end; kinds marked for
//! retention are also written to the output directory, everything else is
//! discarded locally.
//!
//! Local writes go to `<name>.part` and are renamed into place only after the
//! whole body has arrived. Every other exit path removes the partial file.

use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use super::outcome::{FailureKind, FetchOutcome};
use super::progress::{Progress, ProgressThrottle, DEFAULT_PROGRESS_INTERVAL};
use crate::catalog::{Asset, AssetKind};
use crate::http::HttpClient;
use crate::probe::{has_hit_marker, CacheStatus};
use crate::server::CacheServer;
use crate::sync::CancelFlag;

/// Buffer size for reading the response body (64KB).
const BUFFER_SIZE: usize = 64 * 1024;

/// Longest a blocked body read can delay noticing a cancellation.
const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Chunks read ahead of the writer.
const READ_AHEAD_CHUNKS: usize = 4;

/// Suffix of in-progress local files.
pub const PARTIAL_SUFFIX: &str = ".part";

/// A local file being written. Removed on drop unless committed.
struct PartialFile {
    part: PathBuf,
    dest: PathBuf,
    writer: Option<BufWriter<File>>,
}

impl PartialFile {
    fn create(dest: &Path) -> io::Result<Self> {
        let mut part = dest.as_os_str().to_owned();
        part.push(PARTIAL_SUFFIX);
        let part = PathBuf::from(part);
        let file = File::create(&part)?;
        Ok(Self {
            part,
            dest: dest.to_path_buf(),
            writer: Some(BufWriter::new(file)),
        })
    }

    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        match self.writer.as_mut() {
            Some(writer) => writer.write_all(bytes),
            None => Err(io::Error::new(io::ErrorKind::Other, "partial file already closed")),
        }
    }

    /// Flush and move the file into place.
    fn commit(mut self) -> io::Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
            writer.get_ref().sync_all()?;
        }
        fs::rename(&self.part, &self.dest)
    }
}

impl Drop for PartialFile {
    fn drop(&mut self) {
        // Close before removing.
        self.writer.take();
        if self.part.exists() {
            if let Err(e) = fs::remove_file(&self.part) {
                warn!(path = %self.part.display(), error = %e, "Failed to remove partial file");
            }
        }
    }
}

/// Read `body` on its own thread so a stalled connection never blocks the
/// caller. An empty chunk marks the end of the body. The thread exits at end
/// of body, on error, or once the receiver is dropped and its next read
/// returns.
fn spawn_body_reader(mut body: Box<dyn Read + Send>) -> Receiver<io::Result<Vec<u8>>> {
    let (tx, rx) = mpsc::sync_channel(READ_AHEAD_CHUNKS);
    thread::spawn(move || {
        let mut buffer = vec![0u8; BUFFER_SIZE];
        loop {
            let chunk = match body.read(&mut buffer) {
                Ok(n) => Ok(buffer[..n].to_vec()),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => Err(e),
            };
            let last = !matches!(&chunk, Ok(bytes) if !bytes.is_empty());
            if tx.send(chunk).is_err() || last {
                break;
            }
        }
    });
    rx
}

/// Where the body goes.
enum Target {
    Discard,
    File(PartialFile),
}

impl Target {
    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        match self {
            Target::Discard => Ok(()),
            Target::File(file) => file.write_all(bytes),
        }
    }

    fn finish(self) -> io::Result<()> {
        match self {
            Target::Discard => Ok(()),
            Target::File(file) => file.commit(),
        }
    }
}

/// Pulls assets through the caching server.
pub struct AssetFetcher {
    client: Arc<dyn HttpClient>,
    retain: BTreeSet<AssetKind>,
    progress_interval: Duration,
    cancel: CancelFlag,
}

impl AssetFetcher {
    /// Fetcher retaining firmware images only.
    pub fn new(client: Arc<dyn HttpClient>) -> Self {
        Self {
            client,
            retain: BTreeSet::from([AssetKind::Ipsw]),
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            cancel: CancelFlag::new(),
        }
    }

    /// Kinds written to the output directory.
    pub fn with_retain<I>(mut self, kinds: I) -> Self
    where
        I: IntoIterator<Item = AssetKind>,
    {
        self.retain = kinds.into_iter().collect();
        self
    }

    pub fn with_progress_interval(mut self, interval: Duration) -> Self {
        self.progress_interval = interval;
        self
    }

    /// Abort transfers when `cancel` is raised.
    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn retains(&self, kind: AssetKind) -> bool {
        self.retain.contains(&kind)
    }

    /// Local path a retained asset is written to.
    pub fn local_path(&self, asset: &Asset, output_dir: &Path) -> Option<PathBuf> {
        asset.file_name().map(|name| output_dir.join(name))
    }

    /// Stream `asset` through `server`.
    ///
    /// `probe` is the cache status observed beforehand. A decisive probe
    /// decides between [`FetchOutcome::Cached`] and
    /// [`FetchOutcome::Downloaded`]; after an inconclusive probe the response
    /// headers decide. Never fails: problems become
    /// [`FetchOutcome::Failed`].
    pub fn fetch(
        &self,
        server: &CacheServer,
        asset: &Asset,
        output_dir: &Path,
        probe: CacheStatus,
        on_progress: &dyn Fn(&Progress),
    ) -> FetchOutcome {
        if self.cancel.is_cancelled() {
            return FetchOutcome::skipped("cancelled");
        }

        let Some(url) = server.proxied_url(&asset.source_url) else {
            return FetchOutcome::failed(
                FailureKind::Unavailable,
                format!("source URL '{}' cannot be proxied", asset.source_url),
            );
        };

        let dest = if self.retains(asset.kind) {
            match self.local_path(asset, output_dir) {
                Some(path) => Some(path),
                None => {
                    return FetchOutcome::failed(
                        FailureKind::WriteFailure,
                        format!("no file name in '{}'", asset.source_url),
                    )
                }
            }
        } else {
            None
        };

        let started = Instant::now();
        debug!(asset = %asset, url = %url, "Requesting asset");
        let response = match self.client.get_stream(&url) {
            Ok(response) => response,
            Err(e) => return FetchOutcome::failed(FailureKind::Unavailable, e.to_string()),
        };
        if !response.head.is_success() {
            return FetchOutcome::failed(
                FailureKind::Unavailable,
                format!("HTTP {} from {}", response.head.status, url),
            );
        }

        let total = response.head.content_length().or(asset.size_bytes);
        let mut target = match self.open_target(dest.as_deref(), total) {
            Ok(target) => target,
            Err(e) => return FetchOutcome::failed(FailureKind::WriteFailure, e),
        };

        let mut throttle = ProgressThrottle::new(self.progress_interval);
        let chunks = spawn_body_reader(response.body);
        let mut transferred: u64 = 0;

        loop {
            if self.cancel.is_cancelled() {
                on_progress(&Progress::new(transferred, total));
                return FetchOutcome::failed(FailureKind::Interrupted, "cancelled");
            }

            let chunk = match chunks.recv_timeout(CANCEL_POLL_INTERVAL) {
                Ok(Ok(chunk)) if chunk.is_empty() => break,
                Ok(Ok(chunk)) => chunk,
                Ok(Err(e)) => {
                    on_progress(&Progress::new(transferred, total));
                    return FetchOutcome::failed(
                        FailureKind::Interrupted,
                        format!("after {} bytes: {}", transferred, e),
                    );
                }
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => {
                    on_progress(&Progress::new(transferred, total));
                    return FetchOutcome::failed(
                        FailureKind::Interrupted,
                        format!("body reader stopped after {} bytes", transferred),
                    );
                }
            };

            if let Err(e) = target.write_all(&chunk) {
                return FetchOutcome::failed(FailureKind::WriteFailure, e.to_string());
            }
            transferred += chunk.len() as u64;

            if throttle.ready() {
                on_progress(&Progress::new(transferred, total));
            }
        }

        on_progress(&Progress::new(transferred, total));

        if let Some(expected) = response.head.content_length() {
            if transferred < expected {
                return FetchOutcome::failed(
                    FailureKind::Interrupted,
                    format!("body ended after {} of {} bytes", transferred, expected),
                );
            }
        }

        if let Err(e) = target.finish() {
            return FetchOutcome::failed(FailureKind::WriteFailure, e.to_string());
        }

        let served_from_cache = match probe {
            CacheStatus::Cached => true,
            CacheStatus::NotCached => false,
            CacheStatus::Unknown => has_hit_marker(&response.head),
        };

        if served_from_cache {
            info!(asset = %asset, bytes = transferred, "Asset already cached");
            FetchOutcome::Cached {
                bytes_verified: transferred,
            }
        } else {
            let duration_ms = started.elapsed().as_millis() as u64;
            info!(asset = %asset, bytes = transferred, duration_ms, "Asset downloaded");
            FetchOutcome::Downloaded {
                bytes_transferred: transferred,
                duration_ms,
            }
        }
    }

    /// Pick the body target. A retained file already complete is left alone.
    fn open_target(&self, dest: Option<&Path>, total: Option<u64>) -> Result<Target, String> {
        let Some(dest) = dest else {
            return Ok(Target::Discard);
        };

        if let (Some(total), Ok(meta)) = (total, fs::metadata(dest)) {
            if meta.is_file() && meta.len() == total {
                debug!(path = %dest.display(), "Local copy complete; not rewriting");
                return Ok(Target::Discard);
            }
        }

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("cannot create {}: {}", parent.display(), e))?;
        }
        PartialFile::create(dest)
            .map(Target::File)
            .map_err(|e| format!("cannot write {}: {}", dest.display(), e))
    }
}
