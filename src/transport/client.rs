//! HTTP client for the council backend.
//!
//! ```text
//! POST {base}/api/conversations                      → {"id": "..."}
//! POST {base}/api/conversations/{id}/message/stream  → text/event-stream
//! ```

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use futures::StreamExt;
use log::{debug, info, warn};
use tokio::sync::mpsc::Sender;

use super::backend::{CouncilBackend, TransportError};
use super::types::{
    AttachmentPayload, ConversationCreated, DEFAULT_PDF_PROMPT, SendMessageRequest, SseDecoder,
    StreamEvent,
};
use crate::core::composer::Submission;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8001";

/// Builds the request body for a submission, reading and encoding the
/// attached PDF if there is one.
pub async fn build_request(submission: &Submission) -> Result<SendMessageRequest, TransportError> {
    let mut content = submission.text.clone();
    let mut attachments = Vec::new();

    if let Some(attachment) = &submission.attachment {
        let bytes = tokio::fs::read(&attachment.path).await?;
        debug!(
            "Encoding attachment {} ({} bytes)",
            attachment.filename,
            bytes.len()
        );
        attachments.push(AttachmentPayload {
            filename: attachment.filename.clone(),
            mime_type: "application/pdf".to_string(),
            base64: STANDARD.encode(&bytes),
        });
        if content.trim().is_empty() {
            content = DEFAULT_PDF_PROMPT.to_string();
        }
    }

    Ok(SendMessageRequest {
        content,
        attachments,
    })
}

pub struct CouncilClient {
    base_url: String,
    client: reqwest::Client,
}

impl CouncilClient {
    /// Creates a client for the backend at `base_url` (no trailing slash needed).
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, TransportError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(TransportError::Config("empty base URL".to_string()));
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Config(e.to_string()))?;
        Ok(Self { base_url, client })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, TransportError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "unknown error".to_string());
        warn!("Council API error: {} - {}", status, message);
        Err(TransportError::Api { status, message })
    }
}

#[async_trait]
impl CouncilBackend for CouncilClient {
    fn name(&self) -> &str {
        "council"
    }

    async fn create_conversation(&self) -> Result<String, TransportError> {
        let response = self
            .client
            .post(format!("{}/api/conversations", self.base_url))
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        let response = Self::check_status(response).await?;

        let created: ConversationCreated = response
            .json()
            .await
            .map_err(|e| TransportError::Parse(e.to_string()))?;
        info!("Created conversation {}", created.id);
        Ok(created.id)
    }

    async fn send_message_stream(
        &self,
        conversation_id: &str,
        request: &SendMessageRequest,
        sender: Sender<StreamEvent>,
    ) -> Result<(), TransportError> {
        info!(
            "Streaming message to conversation {} ({} bytes, {} attachments)",
            conversation_id,
            request.content.len(),
            request.attachments.len()
        );

        let response = self
            .client
            .post(format!(
                "{}/api/conversations/{}/message/stream",
                self.base_url, conversation_id
            ))
            .json(request)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        let response = Self::check_status(response).await?;

        let mut decoder = SseDecoder::new();
        let mut stream = response.bytes_stream();
        let mut event_count = 0usize;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| TransportError::Network(e.to_string()))?;
            debug!("Raw chunk received: {} bytes", chunk.len());

            for data in decoder.push(&chunk) {
                let event = match serde_json::from_str::<StreamEvent>(&data) {
                    Ok(event) => event,
                    Err(e) => {
                        warn!("Skipping unrecognized stream event ({}): {}", e, data);
                        continue;
                    }
                };
                event_count += 1;
                debug!("Stream event #{}: {:?}", event_count, event);
                if sender.send(event).await.is_err() {
                    warn!("Stream event send failed: receiver dropped");
                    return Err(TransportError::ChannelClosed);
                }
            }
        }

        info!("Stream closed after {} events", event_count);
        Ok(())
    }
}
