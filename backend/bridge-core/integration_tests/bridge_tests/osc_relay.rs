//! End-to-end tests for the WebSocket <-> OSC relay.

use super::helpers::{TEST_TRACK_COUNT, TestBridge, receive_json, send_json};

use bridge_core::osc::{ControlMessage, OscArg};

use futures_util::SinkExt;
use serde_json::json;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Error as WsClientError;
use tokio_tungstenite::tungstenite::http::StatusCode;

/// **VALUE**: Connecting a client primes it with every track's state.
///
/// **WHY THIS MATTERS**: Without the refresh burst a newly opened UI shows
/// blank faders until someone touches the mixer.
///
/// **BUG THIS CATCHES**: Would catch the refresh being skipped, sent to the
/// wrong port, or carrying arguments (which the mixer treats as writes).
#[tokio::test]
async fn given_running_bridge_when_client_connects_then_refresh_burst_sent_to_mixer() {
    // GIVEN
    let bridge = TestBridge::start().await;

    // WHEN
    let _client = connect_async(bridge.handle.ws_url())
        .await
        .expect("Failed to connect");
    let burst = bridge.recv_from_bridge(TEST_TRACK_COUNT as usize * 5).await;

    // THEN
    assert_eq!(burst.len(), 40);
    assert_eq!(burst[0], ControlMessage::query("/track/1/volume"));
    assert_eq!(burst[4], ControlMessage::query("/track/1/name"));
    assert_eq!(burst[39], ControlMessage::query("/track/8/name"));
    assert_eq!(bridge.handle.stats().connections_accepted, 1);
}

/// **VALUE**: Only the configured path upgrades; anything else is a 404.
#[tokio::test]
async fn given_wrong_path_when_connecting_then_404() {
    // GIVEN
    let bridge = TestBridge::start().await;
    let url = format!("ws://{}/not-osc", bridge.handle.web_addr());

    // WHEN
    let result = connect_async(url).await;

    // THEN
    match result {
        Err(WsClientError::Http(response)) => assert_eq!(response.status(), StatusCode::NOT_FOUND),
        Err(other) => panic!("Expected HTTP 404, got {other}"),
        Ok(_) => panic!("Expected HTTP 404, got an upgraded connection"),
    }
}

/// **VALUE**: Client `osc` frames reach the mixer as datagrams.
#[tokio::test]
async fn given_connected_client_when_osc_frame_sent_then_mixer_receives_it() {
    // GIVEN
    let bridge = TestBridge::start().await;
    let mut client = bridge.connect_client().await;

    // WHEN
    send_json(
        &mut client,
        json!({"type": "osc", "address": "/track/2/volume", "args": [{"type": "f", "value": 0.5}]}),
    )
    .await;

    // THEN
    let received = bridge.recv_from_bridge(1).await;
    assert_eq!(
        received,
        vec![ControlMessage::new("/track/2/volume", vec![OscArg::Float(0.5)])]
    );
}

/// **VALUE**: Mixer feedback is broadcast to every connected client.
///
/// **WHY THIS MATTERS**: Moving a physical fader must update every open UI.
#[tokio::test]
async fn given_two_clients_when_mixer_sends_feedback_then_both_receive_osc_frame() {
    // GIVEN
    let bridge = TestBridge::start().await;
    let mut first = bridge.connect_client().await;
    let mut second = bridge.connect_client().await;

    // WHEN
    bridge
        .send_from_mixer(&ControlMessage::new("/track/5/mute", vec![OscArg::Int(1)]))
        .await;

    // THEN
    let expected = json!({"type": "osc", "address": "/track/5/mute", "args": [{"type": "i", "value": 1}]});
    assert_eq!(receive_json(&mut first).await, expected);
    assert_eq!(receive_json(&mut second).await, expected);
}

/// **VALUE**: Bad frames are dropped without closing the connection.
///
/// **BUG THIS CATCHES**: Would catch a parse error tearing down the socket,
/// which makes the UI reconnect and re-run the refresh on every typo.
#[tokio::test]
async fn given_malformed_and_unknown_frames_when_sent_then_connection_keeps_working() {
    // GIVEN
    let bridge = TestBridge::start().await;
    let mut client = bridge.connect_client().await;

    // WHEN
    client
        .send(tokio_tungstenite::tungstenite::Message::text("{not json"))
        .await
        .unwrap();
    send_json(&mut client, json!({"type": "transport", "play": true})).await;
    send_json(
        &mut client,
        json!({"type": "osc", "address": "/track/1/solo", "args": [1]}),
    )
    .await;

    // THEN
    let received = bridge.recv_from_bridge(1).await;
    assert_eq!(
        received,
        vec![ControlMessage::new("/track/1/solo", vec![OscArg::Int(1)])]
    );
    let stats = bridge.handle.stats();
    assert_eq!(stats.malformed_messages, 1);
    assert_eq!(stats.unknown_message_types, 1);
}

/// **VALUE**: A client-requested refresh re-sends the whole burst.
#[tokio::test]
async fn given_connected_client_when_refresh_requested_then_burst_sent_again() {
    // GIVEN
    let bridge = TestBridge::start().await;
    let mut client = bridge.connect_client().await;

    // WHEN
    send_json(&mut client, json!({"type": "refresh"})).await;

    // THEN
    let burst = bridge.recv_from_bridge(TEST_TRACK_COUNT as usize * 5).await;
    assert_eq!(burst.len(), 40);
}
