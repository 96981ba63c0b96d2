// Unit tests for the single-flight broker actor
// Driven by an in-memory channel so attempt counts are exact

use super::super::support::{ChannelOp, ScriptedChannel, next_frame, register_client};

use crate::broker::{BrokerHandle, BrokerOutcome, BrokerPolicies, BypassCommand, FxCommand, ReadRequest};
use crate::config::PollPolicy;
use crate::error::ipc::IpcError;
use crate::message::{FxParamValue, OutboundMessage};
use crate::registry::ConnectionRegistry;
use crate::stats::BridgeStats;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

const FAST: PollPolicy = PollPolicy::new(5, 4);

async fn wait_until(condition: impl Fn() -> bool) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

fn spawn_broker(
    channel: &ScriptedChannel,
    policies: BrokerPolicies,
    queue_capacity: usize,
) -> (BrokerHandle, Arc<ConnectionRegistry>, Arc<BridgeStats>) {
    let registry = Arc::new(ConnectionRegistry::new());
    let stats = Arc::new(BridgeStats::new());
    let (handle, _task) = BrokerHandle::spawn(
        channel.clone(),
        policies,
        queue_capacity,
        Arc::clone(&registry),
        Arc::clone(&stats),
    );
    (handle, registry, stats)
}

/// **VALUE**: A request with no answer polls exactly `max_attempts` times.
///
/// **WHY THIS MATTERS**: The attempt budget is what bounds how long every
/// queued request waits behind a host that stopped answering.
///
/// **BUG THIS CATCHES**: Would catch an extra trailing read (N+1 polls) or a
/// read before the first interval elapsed.
#[tokio::test]
async fn given_silent_host_when_requested_then_times_out_after_exact_attempts() {
    // GIVEN
    let channel = ScriptedChannel::default();
    let (broker, registry, stats) = spawn_broker(&channel, BrokerPolicies::uniform(FAST), 8);
    let (_client, mut rx) = register_client(&registry, 8).await;

    // WHEN
    let outcome = broker.request(ReadRequest::Full(3)).await.unwrap();

    // THEN
    assert_eq!(outcome, BrokerOutcome::TimedOut { attempts: 4 });
    assert_eq!(channel.reads(), 4);
    assert!(rx.try_recv().is_err(), "timeouts broadcast nothing");
    assert_eq!(stats.snapshot().broker_timeouts, 1);
}

/// **VALUE**: The response slot is cleared before the command is written.
///
/// **BUG THIS CATCHES**: Would catch a stale answer from the previous request
/// being read back as this one's.
#[tokio::test]
async fn given_request_when_executed_then_clear_precedes_write_and_answer_consumed() {
    // GIVEN
    let channel = ScriptedChannel::with_responses(["", "E,1,2,0\n"]);
    let (broker, _registry, _stats) = spawn_broker(&channel, BrokerPolicies::uniform(FAST), 8);

    // WHEN
    let outcome = broker
        .request(BypassCommand {
            track_idx: 1,
            fx_idx: 2,
        })
        .await
        .unwrap();

    // THEN
    assert!(matches!(outcome, BrokerOutcome::Resolved { attempts: 2, .. }));
    assert_eq!(
        channel.ops(),
        vec![
            ChannelOp::Clear,
            ChannelOp::Append("B,1,2\n".to_string()),
            ChannelOp::Read,
            ChannelOp::Read,
            ChannelOp::Clear,
        ]
    );
}

/// **VALUE**: A full read answer is broadcast as `fxValues`.
#[tokio::test]
async fn given_full_read_answer_when_requested_then_fx_values_broadcast() {
    // GIVEN
    let channel = ScriptedChannel::with_responses(["P,1,2,3,0.5\nE,1,2,0\n"]);
    let (broker, registry, stats) = spawn_broker(&channel, BrokerPolicies::uniform(FAST), 8);
    let (_client, mut rx) = register_client(&registry, 8).await;

    // WHEN
    let outcome = broker.request(ReadRequest::Full(1)).await.unwrap();

    // THEN
    assert!(matches!(outcome, BrokerOutcome::Resolved { attempts: 1, .. }));
    assert_eq!(
        next_frame(&mut rx),
        json!({
            "type": "fxValues",
            "trackIdx": 1,
            "params": [{"fxIdx": 2, "paramIdx": 3, "value": 0.5}],
            "bypassed": {"2": true}
        })
    );
    assert_eq!(stats.snapshot().broker_resolved, 1);
}

/// **VALUE**: A sends read is broadcast as `allSendValues`.
#[tokio::test]
async fn given_sends_answer_when_requested_then_all_send_values_broadcast() {
    // GIVEN
    let channel = ScriptedChannel::with_responses(["S,1,0,0.5\nS,1,1,0.25\nS,3,0,1\n"]);
    let (broker, registry, _stats) = spawn_broker(&channel, BrokerPolicies::uniform(FAST), 8);
    let (_client, mut rx) = register_client(&registry, 8).await;

    // WHEN
    let _ = broker.request(ReadRequest::AllSends).await.unwrap();

    // THEN
    assert_eq!(
        next_frame(&mut rx),
        json!({
            "type": "allSendValues",
            "tracks": {
                "1": [{"sendIdx": 0, "vol": 0.5}, {"sendIdx": 1, "vol": 0.25}],
                "3": [{"sendIdx": 0, "vol": 1.0}]
            }
        })
    );
}

/// **VALUE**: A half-written answer is waited on, then accepted once complete.
#[tokio::test]
async fn given_partial_then_complete_answer_when_requested_then_complete_one_used() {
    // GIVEN
    let channel = ScriptedChannel::with_responses(["E,1,0,", "E,1,0,1\n"]);
    let (broker, _registry, _stats) = spawn_broker(&channel, BrokerPolicies::uniform(FAST), 8);

    // WHEN
    let outcome = broker
        .request(BypassCommand {
            track_idx: 1,
            fx_idx: 0,
        })
        .await
        .unwrap();

    // THEN
    match outcome {
        BrokerOutcome::Resolved { message, attempts } => {
            assert_eq!(attempts, 2);
            assert_eq!(
                message,
                OutboundMessage::FxValues {
                    track_idx: 1,
                    params: Vec::new(),
                    bypassed: BTreeMap::from([(0, false)]),
                }
            );
        }
        other => panic!("Expected Resolved, got {other:?}"),
    }
}

/// **VALUE**: One complete line is enough; a trailing half-line is left out.
///
/// **BUG THIS CATCHES**: Would catch waiting out the whole budget for a final
/// newline the host has not written yet.
#[tokio::test]
async fn given_complete_line_and_trailing_partial_when_requested_then_resolves_on_first_poll() {
    // GIVEN
    let channel = ScriptedChannel::with_responses([
        "P,1,2,3,0.5\nE,1,2,0",
        "P,1,2,3,0.5\nE,1,2,0",
        "P,1,2,3,0.5\nE,1,2,0",
        "P,1,2,3,0.5\nE,1,2,0",
    ]);
    let (broker, _registry, _stats) = spawn_broker(&channel, BrokerPolicies::uniform(FAST), 8);

    // WHEN
    let outcome = broker.request(ReadRequest::Full(1)).await.unwrap();

    // THEN
    match outcome {
        BrokerOutcome::Resolved { message, attempts } => {
            assert_eq!(attempts, 1);
            assert_eq!(
                message,
                OutboundMessage::FxValues {
                    track_idx: 1,
                    params: vec![FxParamValue {
                        fx_idx: 2,
                        param_idx: 3,
                        value: 0.5,
                    }],
                    bypassed: BTreeMap::new(),
                }
            );
        }
        other => panic!("Expected Resolved, got {other:?}"),
    }
    assert_eq!(channel.reads(), 1);
}

/// **VALUE**: Content that never gains a complete line times out.
#[tokio::test]
async fn given_answer_never_completed_when_requested_then_times_out() {
    // GIVEN
    let channel = ScriptedChannel::with_responses(["E,1,0", "E,1,0", "E,1,0", "E,1,0"]);
    let (broker, registry, stats) = spawn_broker(&channel, BrokerPolicies::uniform(FAST), 8);
    let (_client, mut rx) = register_client(&registry, 8).await;

    // WHEN
    let outcome = broker
        .request(BypassCommand {
            track_idx: 1,
            fx_idx: 0,
        })
        .await
        .unwrap();

    // THEN
    assert_eq!(outcome, BrokerOutcome::TimedOut { attempts: 4 });
    assert!(rx.try_recv().is_err());
    assert_eq!(stats.snapshot().broker_timeouts, 1);
}

/// **VALUE**: An answer with no usable lines still resolves and broadcasts.
///
/// **WHY THIS MATTERS**: The host did answer (for example a track with no
/// effects); clients should clear their view rather than wait.
#[tokio::test]
async fn given_answer_with_only_bad_lines_when_requested_then_empty_fx_values_broadcast() {
    // GIVEN
    let channel = ScriptedChannel::with_responses(["nothing useful\n"]);
    let (broker, registry, _stats) = spawn_broker(&channel, BrokerPolicies::uniform(FAST), 8);
    let (_client, mut rx) = register_client(&registry, 8).await;

    // WHEN
    let outcome = broker.request(ReadRequest::OutputOnly(6)).await.unwrap();

    // THEN
    assert!(matches!(outcome, BrokerOutcome::Resolved { .. }));
    assert_eq!(
        next_frame(&mut rx),
        json!({"type": "fxValues", "trackIdx": 6, "params": [], "bypassed": {}})
    );
}

/// **VALUE**: Each request kind uses its own attempt budget.
#[tokio::test]
async fn given_per_kind_policies_when_requests_time_out_then_each_uses_own_budget() {
    // GIVEN
    let channel = ScriptedChannel::default();
    let policies = BrokerPolicies {
        bypass: PollPolicy::new(2, 2),
        output_read: PollPolicy::new(2, 3),
        full_read: PollPolicy::new(2, 5),
        sends_read: PollPolicy::new(2, 1),
    };
    let (broker, _registry, _stats) = spawn_broker(&channel, policies, 8);

    // WHEN
    let bypass = broker
        .request(BypassCommand {
            track_idx: 1,
            fx_idx: 0,
        })
        .await
        .unwrap();
    let sends = broker.request(ReadRequest::AllSends).await.unwrap();

    // THEN
    assert_eq!(bypass, BrokerOutcome::TimedOut { attempts: 2 });
    assert_eq!(sends, BrokerOutcome::TimedOut { attempts: 1 });
    assert_eq!(channel.reads(), 3);
}

/// **VALUE**: Requests run one at a time, in arrival order.
///
/// **BUG THIS CATCHES**: Would catch two requests interleaving their
/// clear/write/poll sequences on the shared files.
#[tokio::test]
async fn given_concurrent_requests_when_executed_then_sequences_do_not_interleave() {
    // GIVEN
    let channel = ScriptedChannel::default();
    let (broker, _registry, _stats) =
        spawn_broker(&channel, BrokerPolicies::uniform(PollPolicy::new(3, 2)), 8);

    // WHEN
    let (a, b) = tokio::join!(
        broker.request(ReadRequest::Full(1)),
        broker.request(ReadRequest::Full(2))
    );

    // THEN
    assert!(a.is_ok() && b.is_ok());
    let expected_one = |line: &str| {
        vec![
            ChannelOp::Clear,
            ChannelOp::Append(line.to_string()),
            ChannelOp::Read,
            ChannelOp::Read,
        ]
    };
    let mut expected = expected_one("R,1\n");
    expected.extend(expected_one("R,2\n"));
    assert_eq!(channel.ops(), expected);
}

/// **VALUE**: A full queue rejects new requests as busy.
#[tokio::test]
async fn given_full_queue_when_submitted_then_busy() {
    // GIVEN: actor stuck on a long request, one waiting behind it
    let channel = ScriptedChannel::default();
    let (broker, _registry, stats) =
        spawn_broker(&channel, BrokerPolicies::uniform(PollPolicy::new(60_000, 1)), 1);
    broker.submit(ReadRequest::Full(1)).unwrap();
    wait_until(|| !channel.appended().is_empty()).await;
    broker.submit(ReadRequest::Full(2)).unwrap();

    // WHEN
    let result = broker.submit(ReadRequest::Full(3));

    // THEN
    assert!(matches!(result, Err(IpcError::Busy { .. })));
    assert_eq!(stats.snapshot().broker_busy, 1);
}

/// **VALUE**: Channel failures end the request with an error and are counted.
#[tokio::test]
async fn given_failing_reads_when_requested_then_read_error_returned() {
    // GIVEN
    let channel = ScriptedChannel::failing_reads();
    let (broker, _registry, stats) = spawn_broker(&channel, BrokerPolicies::uniform(FAST), 8);

    // WHEN
    let result = broker.request(ReadRequest::Full(1)).await;

    // THEN
    assert!(matches!(result, Err(IpcError::Read { .. })));
    assert_eq!(channel.reads(), 1);
    assert_eq!(stats.snapshot().broker_io_errors, 1);
}

/// **VALUE**: Busy errors point at the code that submitted the request.
#[tokio::test]
async fn given_full_queue_when_submitted_then_busy_location_is_call_site() {
    // GIVEN
    let channel = ScriptedChannel::default();
    let (broker, _registry, _stats) =
        spawn_broker(&channel, BrokerPolicies::uniform(PollPolicy::new(60_000, 1)), 1);
    broker.submit(ReadRequest::Full(1)).unwrap();
    wait_until(|| !channel.appended().is_empty()).await;
    broker.submit(ReadRequest::Full(2)).unwrap();

    // WHEN
    let result = broker.submit(ReadRequest::Full(3));

    // THEN
    match result {
        Err(IpcError::Busy { location, .. }) => {
            assert!(
                location.file.ends_with("actor.rs") && location.file.contains("tests"),
                "location should be this test, got {location}"
            );
        }
        other => panic!("Expected Busy, got {other:?}"),
    }
}

/// **VALUE**: Parameter writes append a line and never poll.
#[tokio::test]
async fn given_param_write_when_processed_then_line_appended_without_reads() {
    // GIVEN
    let channel = ScriptedChannel::default();
    let (broker, _registry, _stats) = spawn_broker(&channel, BrokerPolicies::uniform(FAST), 8);

    // WHEN
    broker
        .write_param(FxCommand {
            track_idx: 2,
            fx_idx: 0,
            param_idx: 5,
            value: 1.0,
        })
        .unwrap();
    wait_until(|| !channel.appended().is_empty()).await;

    // THEN
    assert_eq!(channel.ops(), vec![ChannelOp::Append("2,0,5,1\n".to_string())]);
}

/// **VALUE**: A parameter write lands while a read is polling and the request
/// queue is full.
///
/// **WHY THIS MATTERS**: Knob moves are fire-and-forget; a silent host must
/// neither delay them behind reads nor get them rejected as busy.
///
/// **BUG THIS CATCHES**: Would catch parameter writes sharing the bounded
/// request queue.
#[tokio::test]
async fn given_polling_read_and_full_queue_when_param_written_then_line_lands_immediately() {
    // GIVEN: a silent host, one read polling, one waiting, queue full
    let channel = ScriptedChannel::default();
    let (broker, _registry, stats) =
        spawn_broker(&channel, BrokerPolicies::uniform(PollPolicy::new(60_000, 1)), 1);
    broker.submit(ReadRequest::Full(1)).unwrap();
    wait_until(|| !channel.appended().is_empty()).await;
    broker.submit(ReadRequest::Full(2)).unwrap();
    assert!(matches!(
        broker.submit(ReadRequest::Full(3)),
        Err(IpcError::Busy { .. })
    ));

    // WHEN
    let result = broker.write_param(FxCommand {
        track_idx: 1,
        fx_idx: 0,
        param_idx: 0,
        value: 0.5,
    });
    wait_until(|| channel.appended().len() == 2).await;

    // THEN
    assert!(result.is_ok());
    assert_eq!(
        channel.appended(),
        vec!["R,1\n".to_string(), "1,0,0,0.5\n".to_string()]
    );
    assert_eq!(channel.reads(), 0, "the read is still waiting for its first poll");
    assert_eq!(stats.snapshot().broker_busy, 1);
}
