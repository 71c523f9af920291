use futures_util::{SinkExt, StreamExt};
use relayprobe_common::{
    elapsed_ms, subscribe_request, ProbeFailure, ProbeOutcome, Stage, TimingRecord,
    CLOSE_TIMEOUT, CONNECT_TIMEOUT, RECEIVE_TIMEOUT,
};
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::{self, error::ProtocolError, Message};
use tracing::debug;

/// Probe configuration
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    /// WebSocket URL of the relay (`ws://` or `wss://`).
    pub url: String,
    pub connect_timeout: Duration,
    pub receive_timeout: Duration,
    /// How long to wait for the relay's Close reply.
    pub close_timeout: Duration,
}

impl ProbeConfig {
    /// Config for `url` with the default connect and receive deadlines.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            connect_timeout: CONNECT_TIMEOUT,
            receive_timeout: RECEIVE_TIMEOUT,
            close_timeout: CLOSE_TIMEOUT,
        }
    }
}

/// One connect/subscribe/receive/close cycle, identified by a connection index.
///
/// Implementations must never panic or return early with an error: every
/// failure is reported through the returned [`ProbeOutcome`].
pub trait Probe {
    fn probe(&self, index: usize) -> impl Future<Output = ProbeOutcome>;
}

/// Probe that opens a real WebSocket connection per invocation.
pub struct WsProbe {
    pub config: ProbeConfig,
}

impl WsProbe {
    pub fn new(config: ProbeConfig) -> Self {
        Self { config }
    }

    /// Run the full probe cycle against the configured relay.
    pub async fn run(&self, index: usize) -> ProbeOutcome {
        let start = Instant::now();

        let connect_start = Instant::now();
        let (mut ws, _) = match timeout(
            self.config.connect_timeout,
            tokio_tungstenite::connect_async(self.config.url.as_str()),
        )
        .await
        {
            Ok(Ok(pair)) => pair,
            Ok(Err(e)) => return Err(connection_error(index, e)),
            Err(_) => {
                debug!(index, "connect deadline exceeded");
                return Err(ProbeFailure::Timeout { stage: Stage::Connect });
            }
        };
        let connect_ms = elapsed_ms(connect_start);

        // Measures local serialize + transmit cost only.
        let handshake_start = Instant::now();
        let request = subscribe_request(index);
        ws.send(Message::text(request))
            .await
            .map_err(|e| connection_error(index, e))?;
        let handshake_ms = elapsed_ms(handshake_start);

        let first_start = Instant::now();
        let first = timeout(self.config.receive_timeout, async {
            // Control frames are protocol noise, not a relay response.
            loop {
                match ws.next().await {
                    Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_))) => continue,
                    Some(Ok(Message::Close(_))) | None => {
                        return Err(ProbeFailure::Connection(
                            "Connection closed before first message".to_string(),
                        ))
                    }
                    Some(Ok(_)) => return Ok(()),
                    Some(Err(e)) => return Err(connection_error(index, e)),
                }
            }
        })
        .await;
        match first {
            Ok(Ok(())) => {}
            Ok(Err(failure)) => return Err(failure),
            Err(_) => {
                debug!(index, "receive deadline exceeded");
                return Err(ProbeFailure::Timeout { stage: Stage::Receive });
            }
        }
        let first_message_ms = elapsed_ms(first_start);

        let closed = timeout(self.config.close_timeout, async {
            match ws.close(None).await {
                Ok(()) => {}
                Err(e) if closing_handshake_done(&e) => return Ok(()),
                Err(e) => return Err(connection_error(index, e)),
            }
            // The stream ends once the relay's Close reply has been read.
            loop {
                match ws.next().await {
                    None => return Ok(()),
                    Some(Ok(_)) => continue,
                    Some(Err(e)) if closing_handshake_done(&e) => return Ok(()),
                    Some(Err(e)) => return Err(connection_error(index, e)),
                }
            }
        })
        .await;
        match closed {
            Ok(Ok(())) => {}
            Ok(Err(failure)) => return Err(failure),
            Err(_) => {
                debug!(index, "close deadline exceeded");
                return Err(ProbeFailure::Timeout { stage: Stage::Close });
            }
        }

        Ok(TimingRecord {
            connect_ms,
            handshake_ms,
            first_message_ms,
            total_ms: elapsed_ms(start),
        })
    }
}

impl Probe for WsProbe {
    fn probe(&self, index: usize) -> impl Future<Output = ProbeOutcome> {
        self.run(index)
    }
}

/// Relays that drop the socket right after our Close frame have still ended the session.
fn closing_handshake_done(e: &tungstenite::Error) -> bool {
    matches!(
        e,
        tungstenite::Error::ConnectionClosed
            | tungstenite::Error::AlreadyClosed
            | tungstenite::Error::Protocol(ProtocolError::ResetWithoutClosingHandshake)
    )
}

fn connection_error(index: usize, e: tungstenite::Error) -> ProbeFailure {
    debug!(index, error = %e, "probe failed");
    ProbeFailure::Connection(e.to_string())
}
