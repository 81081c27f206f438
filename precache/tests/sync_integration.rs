//! Integration tests for complete sync runs.
//!
//! A small in-memory caching server stands in for the network: it serves
//! feed documents, answers liveness checks and remembers which proxied
//! URLs it has already stored.
//!
//! Run with: `cargo test --test sync_integration`

use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::Cursor;
use std::sync::Arc;

use parking_lot::Mutex;
use tempfile::TempDir;

use precache::catalog::{AssetKind, CatalogProvider, IpswFeed};
use precache::fetch::{AssetFetcher, FetchOutcome};
use precache::http::{HttpClient, HttpError, ResponseHead, StreamResponse};
use precache::probe::CacheProbe;
use precache::select::SelectionCriteria;
use precache::server::ServerResolver;
use precache::sync::{strategy_for, SyncError, SyncOrchestrator};

// ============================================================================
// Fake caching server
// ============================================================================

const SERVER: &str = "http://cache.test:49672";
const IPSW_API: &str = "http://ipsw.test/v4";

#[derive(Default)]
struct FakeCache {
    alive: bool,
    bodies: HashMap<String, Vec<u8>>,
    stored: Mutex<HashSet<String>>,
    requests: Mutex<Vec<String>>,
}

impl FakeCache {
    fn alive() -> Self {
        Self {
            alive: true,
            ..Self::default()
        }
    }

    fn serve(mut self, url: &str, body: impl Into<Vec<u8>>) -> Self {
        self.bodies.insert(url.to_string(), body.into());
        self
    }

    fn head_for(&self, url: &str, len: usize) -> ResponseHead {
        let head = ResponseHead::new(200)
            .with_header("Content-Length", len.to_string())
            .with_header("Content-Type", "application/octet-stream");
        if self.stored.lock().contains(url) {
            head.with_header("X-Cache", "HIT from fake")
        } else {
            head
        }
    }

    fn count(&self, prefix: &str) -> usize {
        self.requests
            .lock()
            .iter()
            .filter(|r| r.starts_with(prefix))
            .count()
    }

    fn check_alive(&self, url: &str) -> Result<(), HttpError> {
        if self.alive {
            Ok(())
        } else {
            Err(HttpError::Connect {
                url: url.to_string(),
                reason: "connection refused".to_string(),
            })
        }
    }
}

impl HttpClient for FakeCache {
    fn head(&self, url: &str) -> Result<ResponseHead, HttpError> {
        self.requests.lock().push(format!("HEAD {}", url));
        self.check_alive(url)?;
        match self.bodies.get(url) {
            Some(body) => Ok(self.head_for(url, body.len())),
            None if url == format!("{}/", SERVER) => Ok(ResponseHead::new(200)),
            None => Ok(ResponseHead::new(404)),
        }
    }

    fn get(&self, url: &str) -> Result<Vec<u8>, HttpError> {
        self.requests.lock().push(format!("GET {}", url));
        self.bodies.get(url).cloned().ok_or(HttpError::Status {
            url: url.to_string(),
            status: 404,
        })
    }

    fn get_stream(&self, url: &str) -> Result<StreamResponse, HttpError> {
        self.requests.lock().push(format!("GET {}", url));
        self.check_alive(url)?;
        let Some(body) = self.bodies.get(url).cloned() else {
            return Ok(StreamResponse {
                head: ResponseHead::new(404),
                body: Box::new(Cursor::new(Vec::new())),
            });
        };
        let head = self.head_for(url, body.len());
        self.stored.lock().insert(url.to_string());
        Ok(StreamResponse {
            head,
            body: Box::new(Cursor::new(body)),
        })
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn firmware_doc(device: &str, file: &str) -> String {
    format!(
        r#"{{"identifier": "{}", "firmwares": [
            {{"version": "10.1", "url": "http://appldnld.apple.com/ios/{}"}}
        ]}}"#,
        device, file
    )
}

fn feed_url(device: &str) -> String {
    format!("{}/device/{}?type=ipsw", IPSW_API, device)
}

fn proxied(file: &str) -> String {
    format!("{}/ios/{}?source=appldnld.apple.com", SERVER, file)
}

fn orchestrator(cache: &Arc<FakeCache>, devices: &[&str]) -> SyncOrchestrator {
    let client: Arc<dyn HttpClient> = cache.clone();
    let mut provider = CatalogProvider::new(client.clone());
    for device in devices {
        provider = provider.with_feed(IpswFeed::for_device(IPSW_API, device));
    }
    SyncOrchestrator::new(
        ServerResolver::new(client.clone(), Vec::new()),
        provider,
        CacheProbe::new(client.clone()),
        AssetFetcher::new(client),
    )
}

// ============================================================================
// Tests
// ============================================================================

#[test]
fn test_second_run_finds_everything_cached() {
    let cache = Arc::new(
        FakeCache::alive()
            .serve(&feed_url("iPad6,7"), firmware_doc("iPad6,7", "a.ipsw"))
            .serve(&feed_url("iPhone9,1"), firmware_doc("iPhone9,1", "b.ipsw"))
            .serve(&proxied("a.ipsw"), vec![1u8; 2000])
            .serve(&proxied("b.ipsw"), vec![2u8; 100]),
    );
    let out = TempDir::new().unwrap();
    let sync = orchestrator(&cache, &["iPad6,7", "iPhone9,1"]);
    let criteria = SelectionCriteria::new().with_models(["iPad6,7", "iPhone9,1"]);

    let first = sync.run(Some(SERVER), &criteria, out.path()).unwrap();
    assert_eq!(first.counts().downloaded, 2);
    assert_eq!(fs::read(out.path().join("a.ipsw")).unwrap().len(), 2000);
    assert_eq!(fs::read(out.path().join("b.ipsw")).unwrap().len(), 100);

    let second = sync.run(Some(SERVER), &criteria, out.path()).unwrap();
    assert_eq!(second.counts().cached, 2);
    assert_eq!(
        second.outcome_for("iPad6,7", AssetKind::Ipsw),
        Some(&FetchOutcome::Cached {
            bytes_verified: 2000
        })
    );
    assert!(second.is_success());
}

#[test]
fn test_unreachable_server_requests_no_feeds() {
    let cache = Arc::new(
        FakeCache::default().serve(&feed_url("iPad6,7"), firmware_doc("iPad6,7", "a.ipsw")),
    );
    let out = TempDir::new().unwrap();

    let err = orchestrator(&cache, &["iPad6,7"])
        .run(Some(SERVER), &SelectionCriteria::new(), out.path())
        .unwrap_err();

    assert!(matches!(err, SyncError::ServerUnreachable { .. }));
    assert_eq!(cache.count("GET"), 0);
}

#[test]
fn test_missing_feed_and_missing_asset_do_not_abort() {
    let cache = Arc::new(
        FakeCache::alive()
            .serve(&feed_url("iPad6,7"), firmware_doc("iPad6,7", "gone.ipsw"))
            .serve(&feed_url("iPhone9,1"), firmware_doc("iPhone9,1", "ok.ipsw"))
            .serve(&proxied("ok.ipsw"), vec![0u8; 10]),
    );
    let out = TempDir::new().unwrap();

    let summary = orchestrator(&cache, &["iPad6,7", "iPhone9,1", "AppleTV5,3"])
        .run(Some(SERVER), &SelectionCriteria::new(), out.path())
        .unwrap();

    assert_eq!(summary.warnings.len(), 1);
    assert_eq!(summary.counts().failed, 1);
    assert_eq!(summary.counts().downloaded, 1);
    assert!(summary.is_success());
    assert!(!out.path().join("gone.ipsw").exists());
    assert!(!out.path().join("gone.ipsw.part").exists());
}

#[test]
fn test_parallel_run_keeps_selection_order() {
    let devices = ["iPad6,7", "iPad6,8", "iPhone9,1", "iPhone9,2", "AppleTV5,3"];
    let mut fake = FakeCache::alive();
    for (i, device) in devices.iter().enumerate() {
        let file = format!("fw{}.ipsw", i);
        fake = fake
            .serve(&feed_url(device), firmware_doc(device, &file))
            .serve(&proxied(&file), vec![0u8; 50 * (i + 1)]);
    }
    let cache = Arc::new(fake);
    let out = TempDir::new().unwrap();

    let summary = orchestrator(&cache, &devices)
        .with_strategy(strategy_for(3))
        .run(Some(SERVER), &SelectionCriteria::new(), out.path())
        .unwrap();

    let sizes: Vec<u64> = summary
        .outcomes
        .iter()
        .map(|(_, outcome)| match outcome {
            FetchOutcome::Downloaded {
                bytes_transferred, ..
            } => *bytes_transferred,
            other => panic!("unexpected outcome {}", other),
        })
        .collect();
    assert_eq!(sizes, vec![50, 100, 150, 200, 250]);
}
