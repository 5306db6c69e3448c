// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Connection handling and request dispatch.

use std::sync::Arc;
use std::time::{Duration, Instant};

use rl_storage::{RecordLog, StorageError};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::watch;
use tracing::{debug, error, warn};

use crate::protocol::{self, ProtocolError, Request, Response, PROTOCOL_VERSION};

/// State shared by every connection task
pub struct Service {
    log: Arc<dyn RecordLog>,
    start_time: Instant,
    request_timeout: Duration,
    shutdown: watch::Sender<bool>,
}

impl Service {
    pub fn new(log: Arc<dyn RecordLog>, request_timeout: Duration) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            log,
            start_time: Instant::now(),
            request_timeout,
            shutdown,
        }
    }

    pub fn log(&self) -> &Arc<dyn RecordLog> {
        &self.log
    }

    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Receiver that changes once a client asks the daemon to stop
    pub fn subscribe_shutdown(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }

    pub fn shutdown_requested(&self) -> bool {
        *self.shutdown.borrow()
    }

    fn request_shutdown(&self) {
        self.shutdown.send_replace(true);
    }
}

/// Handle a single client connection: one request, one response
pub async fn handle_connection<S>(service: &Service, mut stream: S) -> Result<(), ServerError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let timeout = service.request_timeout;

    let response = match protocol::read_request(&mut stream, timeout).await {
        Ok(request) => {
            debug!("Received request: {:?}", request);
            handle_request(service, request)
        }
        Err(ProtocolError::Timeout) => {
            error!("Request read timeout");
            return Err(ServerError::Timeout);
        }
        Err(ProtocolError::ConnectionClosed) => {
            debug!("Client disconnected before sending request");
            return Ok(());
        }
        Err(ProtocolError::Json(e)) => {
            warn!("Malformed request: {}", e);
            Response::BadRequest {
                message: e.to_string(),
            }
        }
        Err(e) => {
            error!("Failed to read request: {}", e);
            return Err(ServerError::Protocol(e));
        }
    };

    debug!("Sending response: {:?}", response);

    protocol::write_response(&mut stream, &response, timeout)
        .await
        .map_err(ServerError::Protocol)?;

    Ok(())
}

/// Handle a single request and return a response
///
/// Log calls run inline on the connection task. They are short and
/// bounded by one frame plus a buffer flush.
pub fn handle_request(service: &Service, request: Request) -> Response {
    match request {
        Request::Ping => Response::Pong,

        Request::Hello { version } => {
            if version != PROTOCOL_VERSION {
                warn!(
                    client = %version,
                    daemon = PROTOCOL_VERSION,
                    "Client protocol version differs"
                );
            }
            Response::Hello {
                version: PROTOCOL_VERSION.to_string(),
            }
        }

        Request::Produce { record } => match service.log.append(&record.value) {
            Ok(offset) => {
                debug!(offset, len = record.len(), "Appended record");
                Response::Produce { offset }
            }
            Err(e) => {
                error!("Failed to append record: {}", e);
                Response::Error {
                    message: e.to_string(),
                }
            }
        },

        Request::Consume { offset } => match service.log.read(offset) {
            Ok(record) => Response::Consume { record },
            Err(StorageError::OffsetNotFound(offset)) => Response::NotFound { offset },
            Err(e) => {
                error!(offset, "Failed to read record: {}", e);
                Response::Error {
                    message: e.to_string(),
                }
            }
        },

        Request::Status => Response::Status {
            uptime_secs: service.uptime().as_secs(),
            records: service.log.len(),
        },

        Request::Shutdown => {
            service.request_shutdown();
            Response::ShuttingDown
        }
    }
}

/// Server errors
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Request timeout")]
    Timeout,
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
