//! Configuration sections for each boundary of the bridge.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use const_format::concatcp;
use serde::{Deserialize, Serialize};

/// Directory shared with the scripting host.
const IPC_DIR: &str = "/tmp";

pub const DEFAULT_COMMAND_FILE: &str = concatcp!(IPC_DIR, "/fx_commands.txt");
pub const DEFAULT_RESPONSE_FILE: &str = concatcp!(IPC_DIR, "/fx_response.txt");

pub const DEFAULT_WEB_PORT: u16 = 3000;
pub const DEFAULT_WS_PATH: &str = "/osc";
pub const DEFAULT_CONTROL_SURFACE_HOST: &str = "127.0.0.1";
pub const DEFAULT_CONTROL_SURFACE_PORT: u16 = 9000;
pub const DEFAULT_LISTEN_PORT: u16 = 8000;

pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;
pub const DEFAULT_BYPASS_ATTEMPTS: u32 = 10;
pub const DEFAULT_READ_ATTEMPTS: u32 = 20;

pub const DEFAULT_TRACK_COUNT: u32 = 32;

// ============================================
// WEB
// ============================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WebConfig {
    #[serde(default = "default_any_host")]
    pub host: String,
    #[serde(default = "default_web_port")]
    pub port: u16,
    /// Upgrade path accepted for WebSocket clients.
    #[serde(default = "default_ws_path")]
    pub path: String,
    /// Outbound messages buffered per client before broadcasts skip it.
    #[serde(default = "default_client_buffer")]
    pub client_buffer: usize,
}

impl WebConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: default_any_host(),
            port: default_web_port(),
            path: default_ws_path(),
            client_buffer: default_client_buffer(),
        }
    }
}

// ============================================
// CONTROL SURFACE (OSC over UDP)
// ============================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ControlSurfaceConfig {
    /// Where outbound OSC is sent.
    #[serde(default = "default_control_surface_host")]
    pub host: String,
    #[serde(default = "default_control_surface_port")]
    pub port: u16,
    /// Local bind for OSC feedback from the control surface.
    #[serde(default = "default_any_host")]
    pub listen_host: String,
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,
}

impl ControlSurfaceConfig {
    pub fn remote_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.listen_host, self.listen_port)
    }

    /// Remote endpoint when `host` is a literal IP address.
    pub fn remote_socket_addr(&self) -> Option<SocketAddr> {
        self.remote_address().parse().ok()
    }
}

impl Default for ControlSurfaceConfig {
    fn default() -> Self {
        Self {
            host: default_control_surface_host(),
            port: default_control_surface_port(),
            listen_host: default_any_host(),
            listen_port: default_listen_port(),
        }
    }
}

// ============================================
// FILE IPC
// ============================================

/// Poll cadence and attempt budget for one broker request kind.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PollPolicy {
    #[serde(default = "default_poll_interval_ms")]
    pub interval_ms: u64,
    #[serde(default = "default_read_attempts")]
    pub max_attempts: u32,
}

impl PollPolicy {
    pub const fn new(interval_ms: u64, max_attempts: u32) -> Self {
        Self {
            interval_ms,
            max_attempts,
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Longest time a request of this kind waits for the host.
    pub fn budget(&self) -> Duration {
        self.interval() * self.max_attempts
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IpcConfig {
    /// Lines the scripting host consumes.
    #[serde(default = "default_command_file")]
    pub command_file: PathBuf,
    /// Single-slot answer file the scripting host writes.
    #[serde(default = "default_response_file")]
    pub response_file: PathBuf,
    /// Requests allowed to wait behind the one in flight.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    #[serde(default = "default_bypass_policy")]
    pub bypass: PollPolicy,
    #[serde(default = "default_read_policy")]
    pub output_read: PollPolicy,
    #[serde(default = "default_read_policy")]
    pub full_read: PollPolicy,
    #[serde(default = "default_read_policy")]
    pub sends_read: PollPolicy,
}

impl Default for IpcConfig {
    fn default() -> Self {
        Self {
            command_file: default_command_file(),
            response_file: default_response_file(),
            queue_capacity: default_queue_capacity(),
            bypass: default_bypass_policy(),
            output_read: default_read_policy(),
            full_read: default_read_policy(),
            sends_read: default_read_policy(),
        }
    }
}

// ============================================
// REFRESH
// ============================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RefreshConfig {
    /// Tracks queried on refresh, 1-based and inclusive.
    #[serde(default = "default_track_count")]
    pub track_count: u32,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            track_count: default_track_count(),
        }
    }
}

// ============================================
// DEFAULT FUNCTIONS
// ============================================

fn default_any_host() -> String {
    "0.0.0.0".to_string()
}
fn default_web_port() -> u16 {
    DEFAULT_WEB_PORT
}
fn default_ws_path() -> String {
    DEFAULT_WS_PATH.to_string()
}
fn default_client_buffer() -> usize {
    256
}
fn default_control_surface_host() -> String {
    DEFAULT_CONTROL_SURFACE_HOST.to_string()
}
fn default_control_surface_port() -> u16 {
    DEFAULT_CONTROL_SURFACE_PORT
}
fn default_listen_port() -> u16 {
    DEFAULT_LISTEN_PORT
}
fn default_command_file() -> PathBuf {
    PathBuf::from(DEFAULT_COMMAND_FILE)
}
fn default_response_file() -> PathBuf {
    PathBuf::from(DEFAULT_RESPONSE_FILE)
}
fn default_queue_capacity() -> usize {
    8
}
fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}
fn default_read_attempts() -> u32 {
    DEFAULT_READ_ATTEMPTS
}
fn default_bypass_policy() -> PollPolicy {
    PollPolicy::new(DEFAULT_POLL_INTERVAL_MS, DEFAULT_BYPASS_ATTEMPTS)
}
fn default_read_policy() -> PollPolicy {
    PollPolicy::new(DEFAULT_POLL_INTERVAL_MS, DEFAULT_READ_ATTEMPTS)
}
fn default_track_count() -> u32 {
    DEFAULT_TRACK_COUNT
}
