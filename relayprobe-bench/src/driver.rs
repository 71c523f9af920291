use futures::stream::{FuturesUnordered, StreamExt};
use relayprobe_client::Probe;
use relayprobe_common::{ProbeFailure, ProbeOutcome};
use std::ops::Range;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::metrics::ResultSet;

/// Sequential runs report progress after this many completed probes.
pub const PROGRESS_EVERY: usize = 10;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DriverError {
    #[error("Batch size must be at least 1")]
    ZeroBatchSize,
}

/// Probe indices `0..count` strictly one after another, sleeping `delay`
/// between probes (not after the last one).
pub async fn run_sequential<P: Probe>(
    probe: &P,
    count: usize,
    delay: Duration,
    verbose: bool,
) -> ResultSet {
    info!(count, delay_ms = delay.as_millis() as u64, "testing sequential connections");
    let mut results = ResultSet::new();

    for index in 0..count {
        let outcome = probe.probe(index).await;
        if verbose {
            log_outcome(index, &outcome);
        }
        results.record(outcome);

        let completed = index + 1;
        if !verbose && completed % PROGRESS_EVERY == 0 {
            info!(completed, total = count, "progress");
        }
        if completed < count && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
    results
}

/// Probe indices `0..count` in consecutive batches of at most `batch_size`.
///
/// Every probe of a batch runs concurrently and the batch is drained
/// completely (failures included) before the next batch starts. Outcomes are
/// recorded here, in completion order, so the result set has a single writer.
pub async fn run_parallel<P: Probe>(
    probe: &P,
    count: usize,
    batch_size: usize,
    verbose: bool,
) -> Result<ResultSet, DriverError> {
    let batches = batches(count, batch_size)?;
    info!(count, batch_size, "testing parallel connections");
    let mut results = ResultSet::new();

    for batch in batches {
        let completed = batch.end;
        let mut in_flight: FuturesUnordered<_> = batch
            .map(move |index| async move { (index, probe.probe(index).await) })
            .collect();

        while let Some((index, outcome)) = in_flight.next().await {
            if verbose {
                log_outcome(index, &outcome);
            }
            results.record(outcome);
        }

        if !verbose {
            info!(completed, total = count, "progress");
        }
    }
    Ok(results)
}

/// Partition `0..count` into consecutive ranges of at most `batch_size`.
pub fn batches(count: usize, batch_size: usize) -> Result<Vec<Range<usize>>, DriverError> {
    if batch_size == 0 {
        return Err(DriverError::ZeroBatchSize);
    }
    Ok((0..count)
        .step_by(batch_size)
        .map(|start| start..(start + batch_size).min(count))
        .collect())
}

fn log_outcome(index: usize, outcome: &ProbeOutcome) {
    match outcome {
        Ok(r) => info!(
            index,
            connect_ms = r.connect_ms,
            handshake_ms = r.handshake_ms,
            first_message_ms = r.first_message_ms,
            "connection succeeded"
        ),
        Err(ProbeFailure::Timeout { stage }) => info!(index, %stage, "connection timed out"),
        Err(ProbeFailure::Connection(e)) => info!(index, error = %e, "connection failed"),
    }
}
