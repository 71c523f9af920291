use serde::{Deserialize, Serialize};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::metrics::{histogram, ResultSet, Statistics, HISTOGRAM_BUCKETS};

/// Widest histogram bar, in characters.
const BAR_WIDTH: usize = 40;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to write {path}: {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error("Failed to encode results: {0}")]
    Json(#[from] serde_json::Error),
}

/// Attempt counters as written to the output file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub total_attempts: u64,
    pub successful: u64,
    pub failed: u64,
    pub timeouts: u64,
}

/// Raw per-stage durations (ms) of every successful probe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timings {
    pub connection_times: Vec<f64>,
    pub handshake_times: Vec<f64>,
    pub first_message_times: Vec<f64>,
    pub total_times: Vec<f64>,
}

/// JSON document persisted for one driver run.
///
/// ```json
/// {
///   "timestamp": "2026-01-01T12:00:00.123456+00:00",
///   "relay_url": "ws://localhost:8080",
///   "statistics": { "total_attempts": 1, "successful": 1, "failed": 0, "timeouts": 0 },
///   "timings": { "connection_times": [1.2], "handshake_times": [0.1],
///                "first_message_times": [0.8], "total_times": [2.4] },
///   "errors": []
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// RFC 3339 / ISO-8601 local time at which the snapshot was taken.
    pub timestamp: String,
    pub relay_url: String,
    pub statistics: Summary,
    pub timings: Timings,
    pub errors: Vec<String>,
}

impl Snapshot {
    pub fn capture(results: &ResultSet, relay_url: &str) -> Self {
        Self {
            timestamp: chrono::Local::now().to_rfc3339(),
            relay_url: relay_url.to_string(),
            statistics: Summary {
                total_attempts: results.total_attempts(),
                successful: results.successful(),
                failed: results.failures,
                timeouts: results.timeouts,
            },
            timings: Timings {
                connection_times: results.connect_ms(),
                handshake_times: results.handshake_ms(),
                first_message_times: results.first_message_ms(),
                total_times: results.total_ms(),
            },
            errors: results.errors.clone(),
        }
    }
}

/// File written for a run in `mode` when the user passed `--output prefix`.
pub fn output_path(prefix: &str, mode: &str) -> PathBuf {
    PathBuf::from(format!("{prefix}_{mode}.json"))
}

/// Write a [`Snapshot`] of `results` to `path` as pretty-printed JSON.
pub fn save(results: &ResultSet, relay_url: &str, path: &Path) -> Result<(), ReportError> {
    let snapshot = Snapshot::capture(results, relay_url);
    let bytes = serde_json::to_vec_pretty(&snapshot)?;
    std::fs::write(path, bytes).map_err(|source| ReportError::Io { path: path.to_path_buf(), source })
}

/// Render the human-readable report for one run.
pub fn render(results: &ResultSet, relay_url: &str, out: &mut impl Write) -> io::Result<()> {
    let rule = "=".repeat(60);
    writeln!(out)?;
    writeln!(out, "{rule}")?;
    writeln!(out, "CONNECTION PERFORMANCE RESULTS - {relay_url}")?;
    writeln!(out, "{rule}")?;

    writeln!(out)?;
    writeln!(out, "Summary:")?;
    writeln!(out, "  Total attempts: {}", results.total_attempts())?;
    writeln!(out, "  Successful: {}", results.successful())?;
    writeln!(out, "  Failed: {}", results.failures)?;
    writeln!(out, "  Timeouts: {}", results.timeouts)?;
    writeln!(out, "  Success rate: {:.1}%", results.success_rate())?;

    if !results.errors.is_empty() {
        writeln!(out)?;
        writeln!(out, "Unique errors encountered:")?;
        for error in &results.errors {
            writeln!(out, "  - {error}")?;
        }
    }

    let connect = results.connect_ms();
    for (title, data) in [
        ("Connection Establishment Times (ms):", &connect),
        ("Handshake Times (ms):", &results.handshake_ms()),
        ("First Message Times (ms):", &results.first_message_ms()),
        ("Total Operation Times (ms):", &results.total_ms()),
    ] {
        writeln!(out)?;
        writeln!(out, "{title}")?;
        render_statistics(data, out)?;
    }

    writeln!(out)?;
    writeln!(out, "Connection Time Distribution:")?;
    render_histogram(&connect, out)
}

fn render_statistics(data: &[f64], out: &mut impl Write) -> io::Result<()> {
    let Some(stats) = Statistics::compute(data) else {
        return writeln!(out, "  No data available");
    };
    writeln!(out, "  Min:    {:.2}", stats.min)?;
    writeln!(out, "  Max:    {:.2}", stats.max)?;
    writeln!(out, "  Mean:   {:.2}", stats.mean)?;
    writeln!(out, "  Median: {:.2}", stats.median)?;
    if let Some(std_dev) = stats.std_dev {
        writeln!(out, "  StdDev: {std_dev:.2}")?;
    }
    writeln!(out, "  P50:    {:.2}", stats.p50)?;
    writeln!(out, "  P90:    {:.2}", stats.p90)?;
    writeln!(out, "  P95:    {:.2}", stats.p95)?;
    writeln!(out, "  P99:    {:.2}", stats.p99)
}

fn render_histogram(data: &[f64], out: &mut impl Write) -> io::Result<()> {
    let buckets = histogram(data, HISTOGRAM_BUCKETS);
    let max_count = buckets.iter().map(|b| b.count).max().unwrap_or(0);
    if max_count == 0 {
        return writeln!(out, "  No data available");
    }
    for bucket in &buckets {
        let bar = "█".repeat(bucket.count * BAR_WIDTH / max_count);
        writeln!(out, "  {:6.1}-{:6.1}ms: {} ({})", bucket.start, bucket.end, bar, bucket.count)?;
    }
    Ok(())
}
