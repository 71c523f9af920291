use futures_util::{SinkExt, StreamExt};
use relayprobe_relay::config::DEFAULT_ADDRESS;
use relayprobe_relay::{reply_for, AppState, Relay, RelayConfig};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;

const READY_TIMEOUT: Duration = Duration::from_secs(10);

// --- Test helpers ---

async fn start_relay(response_delay: Duration, silent: bool) -> (String, AppState) {
    let relay = Relay::new(RelayConfig {
        address: "127.0.0.1:0".parse().unwrap(),
        response_delay,
        silent,
    });
    let state = relay.state();
    let (ready_tx, ready_rx) = oneshot::channel();
    tokio::spawn(async move {
        relay.run(ready_tx).await.expect("relay failed");
    });
    let addr = timeout(READY_TIMEOUT, ready_rx)
        .await
        .expect("relay did not start in time")
        .expect("relay ready signal dropped");
    (format!("ws://{addr}"), state)
}

// --- reply_for ---

#[test]
fn test_reply_for_req_is_eose_with_same_id() {
    let reply = reply_for(r#"["REQ","test-5",{"kinds":[1],"limit":1}]"#).unwrap();
    assert_eq!(reply, r#"["EOSE","test-5"]"#);
}

#[test]
fn test_reply_for_close_is_silent() {
    assert_eq!(reply_for(r#"["CLOSE","test-5"]"#), None);
}

#[test]
fn test_reply_for_other_frames_is_notice() {
    for frame in ["hello", "{}", "[]", r#"["EVENT",{}]"#, r#"["REQ"]"#] {
        let reply = reply_for(frame).unwrap();
        assert!(reply.starts_with(r#"["NOTICE""#), "frame {frame:?} got {reply}");
    }
}

// --- config ---

#[test]
fn test_default_config() {
    let config = RelayConfig::default();
    assert_eq!(config.address, DEFAULT_ADDRESS);
    assert_eq!(config.address.to_string(), "127.0.0.1:8080");
    assert_eq!(config.response_delay, Duration::ZERO);
    assert!(!config.silent);
    assert_eq!(Relay::new(config).address(), DEFAULT_ADDRESS);
}

// --- live relay ---

#[tokio::test]
async fn test_relay_answers_subscription() {
    let (url, state) = start_relay(Duration::ZERO, false).await;
    let (mut ws, _) = tokio_tungstenite::connect_async(url.as_str()).await.unwrap();

    ws.send(Message::text(r#"["REQ","test-1",{"kinds":[1],"limit":1}]"#)).await.unwrap();
    let reply = timeout(Duration::from_secs(2), ws.next()).await.unwrap().unwrap().unwrap();
    assert_eq!(reply.into_text().unwrap(), r#"["EOSE","test-1"]"#);

    ws.close(None).await.unwrap();
    assert_eq!(state.connection_count(), 1);
}

#[tokio::test]
async fn test_silent_relay_never_answers() {
    let (url, _) = start_relay(Duration::ZERO, true).await;
    let (mut ws, _) = tokio_tungstenite::connect_async(url.as_str()).await.unwrap();

    ws.send(Message::text(r#"["REQ","test-1",{}]"#)).await.unwrap();
    assert!(timeout(Duration::from_millis(200), ws.next()).await.is_err());
}

#[tokio::test]
async fn test_response_delay_is_applied() {
    let (url, _) = start_relay(Duration::from_millis(150), false).await;
    let (mut ws, _) = tokio_tungstenite::connect_async(url.as_str()).await.unwrap();

    let sent = std::time::Instant::now();
    ws.send(Message::text(r#"["REQ","test-2",{}]"#)).await.unwrap();
    ws.next().await.unwrap().unwrap();
    assert!(sent.elapsed() >= Duration::from_millis(150));
}

#[tokio::test]
async fn test_connection_count_tracks_each_client() {
    let (url, state) = start_relay(Duration::ZERO, false).await;
    for i in 0..3 {
        let (mut ws, _) = tokio_tungstenite::connect_async(url.as_str()).await.unwrap();
        ws.send(Message::text(format!(r#"["REQ","test-{i}",{{}}]"#))).await.unwrap();
        ws.next().await.unwrap().unwrap();
        ws.close(None).await.unwrap();
    }
    assert_eq!(state.connection_count(), 3);
}
