use relayprobe_common::{
    duration_ms, elapsed_ms, subscribe_request, subscription_id, TimingRecord, CLOSE_TIMEOUT,
    CONNECT_TIMEOUT, RECEIVE_TIMEOUT,
};
use serde_json::Value;
use std::time::{Duration, Instant};

#[test]
fn test_subscription_id_embeds_index() {
    assert_eq!(subscription_id(0), "test-0");
    assert_eq!(subscription_id(42), "test-42");
}

#[test]
fn test_subscribe_request_shape() {
    let parsed: Value = serde_json::from_str(&subscribe_request(7)).unwrap();
    let arr = parsed.as_array().expect("request must be a JSON array");

    assert_eq!(arr.len(), 3);
    assert_eq!(arr[0], "REQ");
    assert_eq!(arr[1], "test-7");
    assert_eq!(arr[2]["kinds"], serde_json::json!([1]));
    assert_eq!(arr[2]["limit"], 1);
}

#[test]
fn test_subscribe_requests_are_unique_per_index() {
    assert_ne!(subscribe_request(1), subscribe_request(2));
}

#[test]
fn test_default_deadlines() {
    assert_eq!(CONNECT_TIMEOUT, Duration::from_secs(10));
    assert_eq!(RECEIVE_TIMEOUT, Duration::from_secs(5));
    assert_eq!(CLOSE_TIMEOUT, Duration::from_secs(10));
}

#[test]
fn test_duration_ms_conversion() {
    assert_eq!(duration_ms(Duration::from_millis(250)), 250.0);
    assert_eq!(duration_ms(Duration::ZERO), 0.0);
}

#[test]
fn test_elapsed_ms_is_non_negative() {
    let start = Instant::now();
    assert!(elapsed_ms(start) >= 0.0);
}

#[test]
fn test_timing_record_json_field_names() {
    let record = TimingRecord { connect_ms: 1.0, handshake_ms: 0.5, first_message_ms: 2.0, total_ms: 4.0 };
    let json: Value = serde_json::to_value(record).unwrap();
    assert_eq!(json["connect_ms"], 1.0);
    assert_eq!(json["handshake_ms"], 0.5);
    assert_eq!(json["first_message_ms"], 2.0);
    assert_eq!(json["total_ms"], 4.0);
}
