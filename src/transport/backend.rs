use std::fmt;

use async_trait::async_trait;
use tokio::sync::mpsc::Sender;

use super::types::{SendMessageRequest, StreamEvent};

/// Errors that can occur while talking to the council backend.
#[derive(Debug)]
pub enum TransportError {
    /// Client misconfigured (bad base URL). Not retryable.
    Config(String),
    /// Network-level failure (timeout, DNS, connection refused). Retryable.
    Network(String),
    /// Backend returned an error response.
    Api { status: u16, message: String },
    /// Failed to parse the backend's response.
    Parse(String),
    /// Reading an attachment from disk failed.
    Io(std::io::Error),
    /// The receiving side of the event channel was dropped.
    ChannelClosed,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Config(msg) => write!(f, "config error: {msg}"),
            TransportError::Network(msg) => write!(f, "network error: {msg}"),
            TransportError::Api { status, message } => {
                write!(f, "API error (HTTP {status}): {message}")
            }
            TransportError::Parse(msg) => write!(f, "parse error: {msg}"),
            TransportError::Io(e) => write!(f, "attachment error: {e}"),
            TransportError::ChannelClosed => write!(f, "channel closed"),
        }
    }
}

impl std::error::Error for TransportError {}

impl From<std::io::Error> for TransportError {
    fn from(e: std::io::Error) -> Self {
        TransportError::Io(e)
    }
}

/// Source of council responses. The TUI only talks to this trait.
#[async_trait]
pub trait CouncilBackend: Send + Sync {
    fn name(&self) -> &str;

    /// Creates an empty conversation and returns its id.
    async fn create_conversation(&self) -> Result<String, TransportError>;

    /// Sends one message and forwards every stream event to `sender` until
    /// the backend closes the stream.
    async fn send_message_stream(
        &self,
        conversation_id: &str,
        request: &SendMessageRequest,
        sender: Sender<StreamEvent>,
    ) -> Result<(), TransportError>;
}
