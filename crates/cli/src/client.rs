// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon client for CLI commands

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use rl_core::config::{ENV_DATA_DIR, ENV_LISTEN_ADDR};
use rl_core::{Config, Record};
use rl_daemon::protocol::{self, ProtocolError};
use rl_daemon::{Request, Response, STARTUP_MARKER_PREFIX};
use serde::Serialize;
use thiserror::Error;
use tokio::net::TcpStream;
use tracing::debug;

// Timeout configuration (env vars in milliseconds)
fn parse_duration_ms(var: &str) -> Option<Duration> {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}

/// Timeout for IPC requests (connect, write, read)
pub fn timeout_ipc() -> Duration {
    parse_duration_ms("RL_TIMEOUT_IPC_MS").unwrap_or(Duration::from_secs(5))
}

/// Timeout for waiting for daemon to start
pub fn timeout_connect() -> Duration {
    parse_duration_ms("RL_TIMEOUT_CONNECT_MS").unwrap_or(Duration::from_secs(5))
}

/// Timeout for waiting for daemon to exit
pub fn timeout_exit() -> Duration {
    parse_duration_ms("RL_TIMEOUT_EXIT_MS").unwrap_or(Duration::from_secs(2))
}

/// Polling interval for retries
pub fn poll_interval() -> Duration {
    parse_duration_ms("RL_POLL_INTERVAL_MS").unwrap_or(Duration::from_millis(50))
}

/// Client errors
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Daemon not running at {0}")]
    DaemonNotRunning(SocketAddr),

    #[error("Failed to start daemon: {0}")]
    DaemonStartFailed(String),

    #[error("Connection timeout waiting for daemon to start")]
    DaemonStartTimeout,

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Request rejected: {0}")]
    BadRequest(String),

    #[error("Daemon error: {0}")]
    Rejected(String),

    #[error("Unexpected response from daemon")]
    UnexpectedResponse,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Daemon status as reported by `Status`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DaemonStatus {
    pub addr: SocketAddr,
    pub uptime_secs: u64,
    pub records: u64,
}

impl std::fmt::Display for DaemonStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "rld running at {}", self.addr)?;
        writeln!(
            f,
            "  uptime:  {}",
            humantime::format_duration(Duration::from_secs(self.uptime_secs))
        )?;
        write!(f, "  records: {}", self.records)
    }
}

/// Daemon client
pub struct DaemonClient {
    addr: SocketAddr,
}

impl DaemonClient {
    pub fn new(addr: SocketAddr) -> Self {
        Self { addr }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    async fn connect(&self, timeout: Duration) -> Result<TcpStream, ClientError> {
        match tokio::time::timeout(timeout, TcpStream::connect(self.addr)).await {
            Err(_) => Err(ProtocolError::Timeout.into()),
            Ok(Ok(stream)) => Ok(stream),
            Ok(Err(e)) if is_not_listening(&e) => Err(ClientError::DaemonNotRunning(self.addr)),
            Ok(Err(e)) => Err(e.into()),
        }
    }

    /// Send a request and receive a response with specific timeouts
    async fn send_with_timeout(
        &self,
        request: Request,
        read_timeout: Duration,
        write_timeout: Duration,
    ) -> Result<Response, ClientError> {
        let stream = self.connect(write_timeout).await?;
        let (mut reader, mut writer) = stream.into_split();

        let data = protocol::encode(&request)?;
        tokio::time::timeout(write_timeout, protocol::write_message(&mut writer, &data))
            .await
            .map_err(|_| ProtocolError::Timeout)??;

        let response_bytes =
            tokio::time::timeout(read_timeout, protocol::read_message(&mut reader))
                .await
                .map_err(|_| ProtocolError::Timeout)??;

        let response: Response = protocol::decode(&response_bytes)?;
        debug!(?response, "received response");
        Ok(response)
    }

    /// Send a request and receive a response
    pub async fn send(&self, request: Request) -> Result<Response, ClientError> {
        self.send_with_timeout(request, timeout_ipc(), timeout_ipc())
            .await
    }

    /// Check that the daemon answers
    pub async fn ping(&self) -> Result<(), ClientError> {
        match self.send(Request::Ping).await? {
            Response::Pong => Ok(()),
            other => Err(unexpected(other)),
        }
    }

    /// Get daemon version via Hello handshake
    pub async fn hello(&self) -> Result<String, ClientError> {
        match self
            .send(Request::Hello {
                version: env!("CARGO_PKG_VERSION").to_string(),
            })
            .await?
        {
            Response::Hello { version } => Ok(version),
            other => Err(unexpected(other)),
        }
    }

    /// Append a value, returning its offset
    pub async fn produce(&self, value: Vec<u8>) -> Result<u64, ClientError> {
        match self
            .send(Request::Produce {
                record: Record::new(value),
            })
            .await?
        {
            Response::Produce { offset } => Ok(offset),
            other => Err(unexpected(other)),
        }
    }

    /// Read the record at `offset`, or `None` if it does not exist yet
    pub async fn consume(&self, offset: u64) -> Result<Option<Record>, ClientError> {
        match self.send(Request::Consume { offset }).await? {
            Response::Consume { record } => Ok(Some(record)),
            Response::NotFound { .. } => Ok(None),
            other => Err(unexpected(other)),
        }
    }

    /// Get daemon status
    pub async fn status(&self) -> Result<DaemonStatus, ClientError> {
        match self.send(Request::Status).await? {
            Response::Status {
                uptime_secs,
                records,
            } => Ok(DaemonStatus {
                addr: self.addr,
                uptime_secs,
                records,
            }),
            other => Err(unexpected(other)),
        }
    }

    /// Request daemon shutdown
    pub async fn shutdown(&self) -> Result<(), ClientError> {
        match self.send(Request::Shutdown).await? {
            Response::ShuttingDown => Ok(()),
            other => Err(unexpected(other)),
        }
    }
}

fn unexpected(response: Response) -> ClientError {
    match response {
        Response::BadRequest { message } => ClientError::BadRequest(message),
        Response::Error { message } => ClientError::Rejected(message),
        _ => ClientError::UnexpectedResponse,
    }
}

fn is_not_listening(e: &std::io::Error) -> bool {
    matches!(
        e.kind(),
        std::io::ErrorKind::ConnectionRefused
            | std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::AddrNotAvailable
    )
}

/// Start the daemon unless one already answers at the configured address.
/// Returns false if it was already running.
pub async fn daemon_start(client: &DaemonClient, config: &Config) -> Result<bool, ClientError> {
    match client.ping().await {
        Ok(()) => return Ok(false),
        Err(ClientError::DaemonNotRunning(_)) => {}
        Err(e) => return Err(e),
    }

    let child = start_daemon_background(config)?;
    wait_until_ready(client, child, &config.daemon_log_path()).await?;
    Ok(true)
}

/// Start the daemon in the background, returning the child process handle
fn start_daemon_background(config: &Config) -> Result<Child, ClientError> {
    let rld_path = find_rld_binary();
    debug!(path = %rld_path.display(), "spawning daemon");

    Command::new(&rld_path)
        .env(ENV_LISTEN_ADDR, config.listen_addr.to_string())
        .env(ENV_DATA_DIR, &config.data_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| ClientError::DaemonStartFailed(format!("{}: {}", rld_path.display(), e)))
}

/// Poll until the daemon answers `Ping`, watching for early exit
async fn wait_until_ready(
    client: &DaemonClient,
    mut child: Child,
    log_path: &Path,
) -> Result<(), ClientError> {
    let start = Instant::now();
    while start.elapsed() < timeout_connect() {
        if let Ok(Some(status)) = child.try_wait() {
            // Poll for startup error in log (filesystem may need to sync)
            let poll_start = Instant::now();
            while poll_start.elapsed() < timeout_exit() {
                if let Some(err) = read_startup_error(log_path) {
                    return Err(ClientError::DaemonStartFailed(err));
                }
                tokio::time::sleep(poll_interval()).await;
            }
            return Err(ClientError::DaemonStartFailed(format!(
                "exited with {}",
                status
            )));
        }

        match client.ping().await {
            Ok(()) => return Ok(()),
            Err(ClientError::DaemonNotRunning(_)) => {
                tokio::time::sleep(poll_interval()).await;
            }
            Err(e) => return Err(wrap_with_startup_error(e, log_path)),
        }
    }

    Err(wrap_with_startup_error(
        ClientError::DaemonStartTimeout,
        log_path,
    ))
}

/// Stop the daemon.
/// Returns true if daemon was stopped, false if it wasn't running
pub async fn daemon_stop(client: &DaemonClient, config: &Config) -> Result<bool, ClientError> {
    match client.shutdown().await {
        Ok(()) => {}
        Err(ClientError::DaemonNotRunning(_)) => return Ok(false),
        Err(e) => return Err(e),
    }

    // The daemon removes its PID file once the log is closed
    let pid_path = config.lock_path();
    let start = Instant::now();
    while start.elapsed() < timeout_exit() && pid_path.exists() {
        tokio::time::sleep(poll_interval()).await;
    }
    Ok(true)
}

/// Get the PID from the daemon PID file, if it exists
pub fn read_daemon_pid(config: &Config) -> Option<u32> {
    std::fs::read_to_string(config.lock_path())
        .ok()
        .and_then(|content| content.trim().parse::<u32>().ok())
}

/// Find the rld binary
fn find_rld_binary() -> PathBuf {
    // Explicit override (used by tests to ensure correct binary)
    if let Ok(path) = std::env::var("RL_DAEMON_BINARY") {
        return PathBuf::from(path);
    }

    // Check current executable's directory
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            let sibling = dir.join("rld");
            if sibling.exists() {
                return sibling;
            }
        }
    }

    // Fall back to PATH lookup
    PathBuf::from("rld")
}

/// Read daemon log from the last startup marker, looking for errors.
/// Returns the error message if found, None otherwise.
pub fn read_startup_error(log_path: &Path) -> Option<String> {
    let content = std::fs::read_to_string(log_path).ok()?;

    let start_pos = content.rfind(STARTUP_MARKER_PREFIX)?;
    let startup_log = &content[start_pos..];

    let errors: Vec<&str> = startup_log
        .lines()
        .filter(|line| line.contains(" ERROR ") || line.contains("Failed to start"))
        .collect();

    if errors.is_empty() {
        return None;
    }

    // Format: "timestamp LEVEL target: message"
    let error_messages: Vec<String> = errors
        .iter()
        .filter_map(|line| line.split_once(": ").map(|(_, msg)| msg.to_string()))
        .collect();

    if error_messages.is_empty() {
        Some(errors.join("\n"))
    } else {
        Some(error_messages.join("\n"))
    }
}

/// Wrap an error with startup log info if available.
fn wrap_with_startup_error(err: ClientError, log_path: &Path) -> ClientError {
    if matches!(err, ClientError::DaemonStartFailed(_)) {
        return err;
    }

    match read_startup_error(log_path) {
        Some(startup_error) => ClientError::DaemonStartFailed(startup_error),
        None => err,
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
