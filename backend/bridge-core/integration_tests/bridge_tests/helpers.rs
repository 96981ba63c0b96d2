//! Test helpers for bridge integration tests.
//!
//! This module provides utilities for driving a real bridge:
//! - Starting it on ephemeral ports with IPC files in a temp dir
//! - A UDP socket standing in for the mixer
//! - WebSocket client connect/send/receive
//! - A fake scripting host answering through the response file

use bridge_core::config::{IpcConfig, PollPolicy};
use bridge_core::osc::{ControlMessage, decode_packet, encode_message};
use bridge_core::{BridgeConfig, BridgeHandle, start_bridge};

use std::path::{Path, PathBuf};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tempfile::TempDir;
use tokio::net::{TcpStream, UdpSocket};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

pub type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// How long any single expected event may take.
pub const STEP_TIMEOUT: Duration = Duration::from_secs(5);

/// Tracks queried per refresh in these tests. Kept small so a whole burst
/// fits in the mixer socket's receive buffer before the test reads it.
pub const TEST_TRACK_COUNT: u32 = 8;

/// A running bridge plus the fakes around it.
pub struct TestBridge {
    pub handle: BridgeHandle,
    /// Plays the mixer: receives our OSC, sends feedback to `handle.osc_addr()`.
    pub mixer: UdpSocket,
    pub ipc_dir: TempDir,
}

impl TestBridge {
    pub async fn start() -> Self {
        let mixer = UdpSocket::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mixer socket");
        let mixer_addr = mixer.local_addr().unwrap();
        let ipc_dir = tempfile::tempdir().unwrap();

        let mut config = BridgeConfig::default();
        config.web.host = "127.0.0.1".to_string();
        config.web.port = 0;
        config.control_surface.host = "127.0.0.1".to_string();
        config.control_surface.port = mixer_addr.port();
        config.control_surface.listen_host = "127.0.0.1".to_string();
        config.control_surface.listen_port = 0;
        config.refresh.track_count = TEST_TRACK_COUNT;
        config.ipc = IpcConfig {
            command_file: ipc_dir.path().join("fx_commands.txt"),
            response_file: ipc_dir.path().join("fx_response.txt"),
            full_read: PollPolicy::new(20, 50),
            ..IpcConfig::default()
        };

        let handle = start_bridge(config)
            .await
            .expect("Failed to start bridge");

        Self {
            handle,
            mixer,
            ipc_dir,
        }
    }

    pub fn command_file(&self) -> PathBuf {
        self.ipc_dir.path().join("fx_commands.txt")
    }

    pub fn response_file(&self) -> PathBuf {
        self.ipc_dir.path().join("fx_response.txt")
    }

    /// Connect a client and wait until its refresh burst has reached the mixer,
    /// which also means it is registered for broadcasts.
    pub async fn connect_client(&self) -> Client {
        let (client, _) = connect_async(self.handle.ws_url())
            .await
            .expect("Failed to connect to WebSocket server");
        let burst = self.recv_from_bridge(TEST_TRACK_COUNT as usize * 5).await;
        assert_eq!(burst.len(), TEST_TRACK_COUNT as usize * 5);
        client
    }

    /// Receive `count` OSC messages the bridge sent to the mixer.
    pub async fn recv_from_bridge(&self, count: usize) -> Vec<ControlMessage> {
        let mut buf = vec![0u8; 65_536];
        let mut messages = Vec::with_capacity(count);
        while messages.len() < count {
            let (len, _) = timeout(STEP_TIMEOUT, self.mixer.recv_from(&mut buf))
                .await
                .expect("Timed out waiting for OSC from bridge")
                .expect("Mixer socket error");
            messages.extend(decode_packet(&buf[..len]).expect("Bridge sent invalid OSC"));
        }
        messages
    }

    /// Send feedback as the mixer would.
    pub async fn send_from_mixer(&self, message: &ControlMessage) {
        let datagram = encode_message(message).unwrap();
        let _ = self
            .mixer
            .send_to(&datagram, self.handle.osc_addr())
            .await
            .expect("Failed to send mixer feedback");
    }
}

/// Test helper: Send a JSON text frame.
pub async fn send_json(client: &mut Client, value: Value) {
    client
        .send(Message::text(value.to_string()))
        .await
        .expect("Failed to send message");
}

/// Test helper: Receive the next text frame as JSON.
pub async fn receive_json(client: &mut Client) -> Value {
    loop {
        let frame = timeout(STEP_TIMEOUT, client.next())
            .await
            .expect("Timed out waiting for a frame")
            .expect("Connection closed")
            .expect("Error receiving message");
        if let Message::Text(text) = frame {
            return serde_json::from_str(text.as_str()).expect("Frame is not JSON");
        }
    }
}

/// Play the scripting host once: wait for `command` to appear in the command
/// file, then write `answer` into the response file.
pub fn answer_when_commanded(
    command_file: &Path,
    response_file: &Path,
    command: &'static str,
    answer: &'static str,
) -> JoinHandle<()> {
    let command_file = command_file.to_path_buf();
    let response_file = response_file.to_path_buf();
    tokio::spawn(async move {
        loop {
            let commands = tokio::fs::read_to_string(&command_file)
                .await
                .unwrap_or_default();
            if commands.lines().any(|line| line == command) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        tokio::fs::write(&response_file, answer)
            .await
            .expect("Failed to write response file");
    })
}

/// Wait until the command file contains `line`.
pub async fn wait_for_command(command_file: &Path, line: &str) {
    let found = timeout(STEP_TIMEOUT, async {
        loop {
            let commands = tokio::fs::read_to_string(command_file)
                .await
                .unwrap_or_default();
            if commands.lines().any(|l| l == line) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
    assert!(found.is_ok(), "Command {line:?} never written");
}
