use relayprobe_common::{ProbeFailure, ProbeOutcome, TimingRecord};

/// Number of buckets used for the connection-time distribution.
pub const HISTOGRAM_BUCKETS: usize = 10;

/// Everything one driver run observed.
///
/// Records are kept in insertion order, which is completion order. Failures
/// are counted, not stored; their descriptions are kept once each.
#[derive(Debug, Default, Clone)]
pub struct ResultSet {
    pub records: Vec<TimingRecord>,
    pub failures: u64,
    pub timeouts: u64,
    /// Distinct connection error descriptions, in first-seen order.
    pub errors: Vec<String>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one probe outcome into the set.
    pub fn record(&mut self, outcome: ProbeOutcome) {
        match outcome {
            Ok(record) => self.records.push(record),
            Err(ProbeFailure::Timeout { .. }) => self.timeouts += 1,
            Err(ProbeFailure::Connection(description)) => {
                self.failures += 1;
                if !self.errors.contains(&description) {
                    self.errors.push(description);
                }
            }
        }
    }

    pub fn successful(&self) -> u64 {
        self.records.len() as u64
    }

    pub fn total_attempts(&self) -> u64 {
        self.successful() + self.failures + self.timeouts
    }

    /// Percentage of attempts that succeeded; 0 when nothing was attempted.
    pub fn success_rate(&self) -> f64 {
        let total = self.total_attempts();
        if total == 0 {
            return 0.0;
        }
        self.successful() as f64 / total as f64 * 100.0
    }

    pub fn connect_ms(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.connect_ms).collect()
    }

    pub fn handshake_ms(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.handshake_ms).collect()
    }

    pub fn first_message_ms(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.first_message_ms).collect()
    }

    pub fn total_ms(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.total_ms).collect()
    }
}

/// Descriptive statistics over a non-empty sequence of durations (ms).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Statistics {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    /// Sample standard deviation; `None` with fewer than two samples.
    pub std_dev: Option<f64>,
    pub p50: f64,
    pub p90: f64,
    pub p95: f64,
    pub p99: f64,
}

impl Statistics {
    /// Returns `None` for an empty slice.
    pub fn compute(data: &[f64]) -> Option<Self> {
        if data.is_empty() {
            return None;
        }
        let mut sorted = data.to_vec();
        sorted.sort_by(f64::total_cmp);

        let n = sorted.len();
        let mean = sorted.iter().sum::<f64>() / n as f64;
        let median = if n % 2 == 1 {
            sorted[n / 2]
        } else {
            (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
        };
        let std_dev = (n > 1).then(|| {
            let sum_sq: f64 = sorted.iter().map(|v| (v - mean).powi(2)).sum();
            (sum_sq / (n - 1) as f64).sqrt()
        });

        Some(Self {
            min: sorted[0],
            max: sorted[n - 1],
            // Summation order can push the mean a hair outside [min, max].
            mean: mean.clamp(sorted[0], sorted[n - 1]),
            median,
            std_dev,
            p50: percentile(&sorted, 0.50),
            p90: percentile(&sorted, 0.90),
            p95: percentile(&sorted, 0.95),
            p99: percentile(&sorted, 0.99),
        })
    }
}

/// Nearest-rank selection on ascending `sorted`: element at `floor(p * n)`, clamped.
fn percentile(sorted: &[f64], p: f64) -> f64 {
    let idx = (p * sorted.len() as f64).floor() as usize;
    sorted[idx.min(sorted.len() - 1)]
}

/// One equal-width slice of a distribution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistogramBucket {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

/// Split `[min, max]` of `data` into `bucket_count` equal-width buckets.
///
/// Empty input (or zero buckets) yields no buckets. When every value is equal
/// the width is zero and all values land in bucket 0.
pub fn histogram(data: &[f64], bucket_count: usize) -> Vec<HistogramBucket> {
    if data.is_empty() || bucket_count == 0 {
        return Vec::new();
    }
    let min = data.iter().copied().fold(f64::INFINITY, f64::min);
    let max = data.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let width = (max - min) / bucket_count as f64;

    let mut buckets: Vec<HistogramBucket> = (0..bucket_count)
        .map(|i| {
            let start = min + i as f64 * width;
            HistogramBucket { start, end: start + width, count: 0 }
        })
        .collect();

    for &value in data {
        let idx = if width > 0.0 {
            (((value - min) / width).floor() as usize).min(bucket_count - 1)
        } else {
            0
        };
        buckets[idx].count += 1;
    }
    buckets
}
