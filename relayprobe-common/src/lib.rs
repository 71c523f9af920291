use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Deadline for opening the WebSocket connection.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Deadline for the first inbound message after the subscribe request is sent.
pub const RECEIVE_TIMEOUT: Duration = Duration::from_secs(5);

/// Deadline for the relay to answer our Close frame.
pub const CLOSE_TIMEOUT: Duration = Duration::from_secs(10);

/// Event kinds requested by every probe subscription.
pub const SUBSCRIBE_KINDS: [u32; 1] = [1];

/// Result limit requested by every probe subscription.
pub const SUBSCRIBE_LIMIT: u32 = 1;

/// Stage of the probe lifecycle that a deadline applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    Connect,
    Receive,
    Close,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Connect => f.write_str("connect"),
            Stage::Receive => f.write_str("receive"),
            Stage::Close => f.write_str("close"),
        }
    }
}

/// Per-stage timings of one successful probe, in milliseconds.
///
/// `total_ms` covers the whole cycle including close, so it is never smaller
/// than the sum of the three measured stages.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimingRecord {
    pub connect_ms: f64,
    pub handshake_ms: f64,
    pub first_message_ms: f64,
    pub total_ms: f64,
}

/// Why a probe did not produce a [`TimingRecord`].
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProbeFailure {
    #[error("Timed out during {stage}")]
    Timeout { stage: Stage },

    /// Carries the underlying error's text verbatim; the text is the dedup key in reports.
    #[error("{0}")]
    Connection(String),
}

/// Outcome of a single probe: timings on success, a classified failure otherwise.
pub type ProbeOutcome = std::result::Result<TimingRecord, ProbeFailure>;

/// Subscription id for the probe with the given connection index.
pub fn subscription_id(index: usize) -> String {
    format!("test-{index}")
}

/// Encode the subscribe request `["REQ", "test-{index}", {"kinds": [1], "limit": 1}]`.
pub fn subscribe_request(index: usize) -> String {
    serde_json::json!([
        "REQ",
        subscription_id(index),
        { "kinds": SUBSCRIBE_KINDS, "limit": SUBSCRIBE_LIMIT }
    ])
    .to_string()
}

/// Milliseconds elapsed since `start`, as a float.
pub fn elapsed_ms(start: Instant) -> f64 {
    duration_ms(start.elapsed())
}

/// Convert a duration to fractional milliseconds.
pub fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}
