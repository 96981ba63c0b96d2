//! End-to-end tests for FX requests through the shared IPC files.

use super::helpers::{TestBridge, answer_when_commanded, receive_json, send_json, wait_for_command};

use bridge_core::broker::{BrokerOutcome, BypassCommand, ReadRequest};

use std::time::Duration;

use serde_json::json;
use tokio::time::timeout;

/// **VALUE**: A full FX read round-trips through the host files to the client.
///
/// **WHY THIS MATTERS**: This is the only way the UI learns plugin parameter
/// values; the file protocol has no other acknowledgement.
#[tokio::test]
async fn given_host_answering_when_fx_read_sent_then_client_receives_fx_values() {
    // GIVEN
    let bridge = TestBridge::start().await;
    let mut client = bridge.connect_client().await;
    let host = answer_when_commanded(
        &bridge.command_file(),
        &bridge.response_file(),
        "R,1",
        "P,1,0,2,0.75\nE,1,0,0\nE,1,1,1\n",
    );

    // WHEN
    send_json(&mut client, json!({"type": "fxRead", "trackIdx": 1})).await;

    // THEN
    let frame = receive_json(&mut client).await;
    assert_eq!(
        frame,
        json!({
            "type": "fxValues",
            "trackIdx": 1,
            "params": [{"fxIdx": 0, "paramIdx": 2, "value": 0.75}],
            "bypassed": {"0": true, "1": false}
        })
    );
    host.await.unwrap();
    let answered = std::fs::read_to_string(bridge.response_file()).unwrap();
    assert!(answered.is_empty(), "answer should be consumed, got {answered:?}");
}

/// **VALUE**: Parameter writes land in the command file as host lines.
#[tokio::test]
async fn given_client_when_fx_write_sent_then_command_line_appended() {
    // GIVEN
    let bridge = TestBridge::start().await;
    let mut client = bridge.connect_client().await;

    // WHEN
    send_json(
        &mut client,
        json!({"type": "fx", "trackIdx": 3, "fxIdx": 1, "paramIdx": 4, "value": 0.25}),
    )
    .await;

    // THEN
    wait_for_command(&bridge.command_file(), "3,1,4,0.25").await;
}

/// **VALUE**: Sends are read for every track and grouped per track.
#[tokio::test]
async fn given_host_answering_when_sends_read_then_all_send_values_broadcast() {
    // GIVEN
    let bridge = TestBridge::start().await;
    let mut client = bridge.connect_client().await;
    let _host = answer_when_commanded(
        &bridge.command_file(),
        &bridge.response_file(),
        "SENDS",
        "S,1,0,0.5\nS,2,0,0.25\n",
    );

    // WHEN
    send_json(&mut client, json!({"type": "sendsReadAll"})).await;

    // THEN
    assert_eq!(
        receive_json(&mut client).await,
        json!({
            "type": "allSendValues",
            "tracks": {
                "1": [{"sendIdx": 0, "vol": 0.5}],
                "2": [{"sendIdx": 0, "vol": 0.25}]
            }
        })
    );
}

/// **VALUE**: A silent host times out without broadcasting anything.
///
/// **BUG THIS CATCHES**: Would catch a timeout broadcasting an empty
/// `fxValues`, which would wipe the client's view of a track that has effects.
#[tokio::test]
async fn given_silent_host_when_bypass_toggled_then_times_out_quietly() {
    // GIVEN
    let bridge = TestBridge::start().await;
    let mut client = bridge.connect_client().await;

    // WHEN
    let outcome = bridge
        .handle
        .broker()
        .request(BypassCommand {
            track_idx: 1,
            fx_idx: 0,
        })
        .await
        .unwrap();

    // THEN
    assert_eq!(outcome, BrokerOutcome::TimedOut { attempts: 10 });
    assert_eq!(bridge.handle.stats().broker_timeouts, 1);
    let nothing = timeout(Duration::from_millis(200), receive_json(&mut client)).await;
    assert!(nothing.is_err(), "no frame expected after a timeout");
}

/// **VALUE**: A request issued through the handle resolves with the broadcast message.
#[tokio::test]
async fn given_host_answering_when_output_read_requested_then_resolved() {
    // GIVEN
    let bridge = TestBridge::start().await;
    let _host = answer_when_commanded(
        &bridge.command_file(),
        &bridge.response_file(),
        "O,2",
        "P,2,5,0,0.1\n",
    );

    // WHEN
    let outcome = bridge
        .handle
        .broker()
        .request(ReadRequest::OutputOnly(2))
        .await
        .unwrap();

    // THEN
    match outcome {
        BrokerOutcome::Resolved { message, .. } => assert_eq!(message.kind(), "fxValues"),
        other => panic!("Expected Resolved, got {other:?}"),
    }
    assert_eq!(bridge.handle.stats().broker_resolved, 1);
}
