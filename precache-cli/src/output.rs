//! Console rendering of run events.
//!
//! Progress bars go to stderr through `indicatif`; milestone and outcome
//! lines are printed above them so the bars never tear.

use std::collections::HashMap;
use std::time::Duration;

use console::style;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use parking_lot::Mutex;
use precache::catalog::Asset;
use precache::fetch::FetchOutcome;
use precache::sync::{EventSink, RunSummary, SyncEvent};

const SIZE_UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Human-readable byte count with two decimals, e.g. `1.50 KB`.
pub fn format_size(bytes: u64) -> String {
    let mut size = bytes as f64;
    let mut unit = 0;
    while size > 1024.0 && unit < SIZE_UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{:.2} {}", size, SIZE_UNITS[unit])
}

fn sized_style() -> ProgressStyle {
    ProgressStyle::with_template(
        "{msg}\n[{elapsed_precise}] [{bar:40.cyan/white}] {bytes}/{total_bytes} @ {bytes_per_sec}",
    )
    .map(|s| s.progress_chars("=> "))
    .unwrap_or_else(|_| ProgressStyle::default_bar())
}

fn unsized_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.cyan} {msg} {bytes} @ {bytes_per_sec}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

fn bar_key(asset: &Asset) -> String {
    format!("{}\n{}", asset.identifier, asset.source_url)
}

/// One line describing how an asset ended.
pub fn outcome_line(asset: &Asset, outcome: &FetchOutcome) -> String {
    let detail = match outcome {
        FetchOutcome::Skipped { reason } => reason.clone(),
        FetchOutcome::Cached { bytes_verified } => {
            format!("already cached, {} verified", format_size(*bytes_verified))
        }
        FetchOutcome::Downloaded {
            bytes_transferred,
            duration_ms,
        } => format!(
            "{} in {:.1}s",
            format_size(*bytes_transferred),
            *duration_ms as f64 / 1000.0
        ),
        FetchOutcome::Failed { kind, detail } => format!("{}: {}", kind, detail),
    };
    format!("{:<10} {} {} ({})", outcome.label(), asset.identifier, asset.version, detail)
}

/// Event sink drawing one progress bar per transfer in flight.
pub struct ConsoleSink {
    multi: MultiProgress,
    bars: Mutex<HashMap<String, ProgressBar>>,
}

impl ConsoleSink {
    /// Bars are hidden when stderr is not a terminal.
    pub fn new() -> Self {
        let target = if console::user_attended_stderr() {
            ProgressDrawTarget::stderr()
        } else {
            ProgressDrawTarget::hidden()
        };
        Self {
            multi: MultiProgress::with_draw_target(target),
            bars: Mutex::new(HashMap::new()),
        }
    }

    fn line(&self, text: String) {
        if self.multi.is_hidden() {
            eprintln!("{}", text);
        } else {
            let _ = self.multi.println(text);
        }
    }

    fn start_bar(&self, asset: &Asset, index: usize, total: usize) {
        let bar = match asset.size_bytes {
            Some(size) => ProgressBar::new(size).with_style(sized_style()),
            None => ProgressBar::new_spinner().with_style(unsized_style()),
        };
        let bar = self.multi.add(bar);
        bar.set_message(format!("[{}/{}] {}", index + 1, total, asset));
        bar.enable_steady_tick(Duration::from_millis(200));
        self.bars.lock().insert(bar_key(asset), bar);
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for ConsoleSink {
    fn emit(&self, event: &SyncEvent<'_>) {
        match event {
            SyncEvent::ServerResolved { server } => {
                self.line(format!("{} {}", style("Caching server:").bold(), server));
            }
            SyncEvent::FeedWarning { warning } => {
                self.line(format!("{} {}", style("warning:").yellow().bold(), warning));
            }
            SyncEvent::CatalogBuilt { assets, warnings } => {
                let mut text = format!("Catalog: {} assets", assets);
                if *warnings > 0 {
                    text.push_str(&format!(" ({} feeds unavailable)", warnings));
                }
                self.line(text);
            }
            SyncEvent::SelectionMade { selected } => {
                self.line(format!("Selected: {} assets", selected));
            }
            SyncEvent::ProbeCompleted { .. } => {}
            SyncEvent::FetchStarted {
                asset,
                index,
                total,
            } => self.start_bar(asset, *index, *total),
            SyncEvent::Progress { asset, progress } => {
                if let Some(bar) = self.bars.lock().get(&bar_key(asset)) {
                    if let Some(total) = progress.total_bytes {
                        bar.set_length(total);
                    }
                    bar.set_position(progress.bytes_so_far);
                }
            }
            SyncEvent::AssetFinished { asset, outcome } => {
                if let Some(bar) = self.bars.lock().remove(&bar_key(asset)) {
                    bar.finish_and_clear();
                    self.multi.remove(&bar);
                }
                let text = outcome_line(asset, outcome);
                let text = match outcome {
                    FetchOutcome::Failed { .. } => style(text).red().to_string(),
                    FetchOutcome::Downloaded { .. } => style(text).green().to_string(),
                    _ => text,
                };
                self.line(text);
            }
        }
    }
}

/// Closing report of a run.
pub fn summary_lines(summary: &RunSummary) -> Vec<String> {
    let counts = summary.counts();
    let mut lines = vec![
        format!(
            "{} downloaded, {} cached, {} skipped, {} failed",
            counts.downloaded, counts.cached, counts.skipped, counts.failed
        ),
        format!(
            "Transferred {} through {}",
            format_size(summary.bytes_transferred()),
            summary.server
        ),
    ];
    for (asset, outcome) in summary.failures() {
        lines.push(format!("  failed: {} ({})", asset, outcome));
    }
    lines
}

pub fn print_summary(summary: &RunSummary) {
    println!();
    println!("{}", style("Summary").bold());
    for line in summary_lines(summary) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use precache::catalog::AssetKind;
    use precache::fetch::FailureKind;
    use precache::server::CacheServer;

    fn asset(id: &str) -> Asset {
        Asset::new(id, AssetKind::Ipsw, "12.1", format!("http://updates.test/{}.ipsw", id))
    }

    #[test]
    fn test_format_size_units() {
        assert_eq!(format_size(0), "0.00 B");
        assert_eq!(format_size(512), "512.00 B");
        assert_eq!(format_size(1024), "1024.00 B");
        assert_eq!(format_size(1536), "1.50 KB");
        assert_eq!(format_size(3 * 1024 * 1024 * 1024), "3.00 GB");
    }

    #[test]
    fn test_format_size_caps_at_terabytes() {
        let bytes = 2048u64 * 1024 * 1024 * 1024 * 1024;
        assert_eq!(format_size(bytes), "2048.00 TB");
    }

    #[test]
    fn test_outcome_line_downloaded() {
        let line = outcome_line(
            &asset("iPad6,7"),
            &FetchOutcome::Downloaded {
                bytes_transferred: 1536,
                duration_ms: 2500,
            },
        );
        assert!(line.starts_with("downloaded"));
        assert!(line.contains("iPad6,7 12.1"));
        assert!(line.ends_with("(1.50 KB in 2.5s)"));
    }

    #[test]
    fn test_outcome_line_failed() {
        let line = outcome_line(
            &asset("iPad6,7"),
            &FetchOutcome::failed(FailureKind::Interrupted, "cancelled"),
        );
        assert!(line.contains("cancelled"));
    }

    #[test]
    fn test_summary_lines_lists_failures() {
        let server = CacheServer::new("http", "cache.test", 49672);
        let mut summary = RunSummary::new(server, Vec::new());
        summary.outcomes = vec![
            (asset("a"), FetchOutcome::Cached { bytes_verified: 10 }),
            (
                asset("b"),
                FetchOutcome::failed(FailureKind::Unavailable, "HTTP 404"),
            ),
        ];

        let lines = summary_lines(&summary);
        assert_eq!(lines[0], "0 downloaded, 1 cached, 0 skipped, 1 failed");
        assert_eq!(lines.len(), 3);
        assert!(lines[2].contains("b 12.1"));
    }
}
