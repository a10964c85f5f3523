//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc::Sender;

use crate::core::stage::{
    AggregateRanking, FinalSynthesis, ModelResponse, PeerRanking, Stage1Result, Stage2Result,
    StageMetadata,
};
use crate::transport::{CouncilBackend, SendMessageRequest, StreamEvent, TransportError};

/// A backend that never talks to anything.
pub struct NoopBackend;

#[async_trait]
impl CouncilBackend for NoopBackend {
    fn name(&self) -> &str {
        "noop"
    }

    async fn create_conversation(&self) -> Result<String, TransportError> {
        Ok("test-conversation".to_string())
    }

    async fn send_message_stream(
        &self,
        _conversation_id: &str,
        _request: &SendMessageRequest,
        _sender: Sender<StreamEvent>,
    ) -> Result<(), TransportError> {
        Ok(())
    }
}

/// Creates a test App backed by a NoopBackend.
pub fn test_app() -> crate::core::state::App {
    crate::core::state::App::new(Arc::new(NoopBackend), "http://localhost:8001".to_string())
}

pub fn stage1_payload() -> Stage1Result {
    vec![
        ModelResponse {
            model: "openai/gpt-5.1".to_string(),
            response: "Rust has **no garbage collector**.".to_string(),
        },
        ModelResponse {
            model: "google/gemini-3-pro".to_string(),
            response: "Ownership replaces a GC.".to_string(),
        },
    ]
}

pub fn stage2_payload() -> Stage2Result {
    vec![
        PeerRanking {
            model: "openai/gpt-5.1".to_string(),
            ranking: "Response B is clearer.\n\nFINAL RANKING:\n1. Response B\n2. Response A"
                .to_string(),
            parsed_ranking: vec!["Response B".to_string(), "Response A".to_string()],
        },
        PeerRanking {
            model: "google/gemini-3-pro".to_string(),
            ranking: "Response A is more precise.\n\nFINAL RANKING:\n1. Response A\n2. Response B"
                .to_string(),
            parsed_ranking: vec!["Response A".to_string(), "Response B".to_string()],
        },
    ]
}

pub fn stage2_metadata() -> StageMetadata {
    let mut label_to_model = BTreeMap::new();
    label_to_model.insert("Response A".to_string(), "openai/gpt-5.1".to_string());
    label_to_model.insert("Response B".to_string(), "google/gemini-3-pro".to_string());
    StageMetadata {
        label_to_model,
        aggregate_rankings: Some(vec![
            AggregateRanking {
                model: "google/gemini-3-pro".to_string(),
                average_rank: 1.5,
                rankings_count: 2,
            },
            AggregateRanking {
                model: "openai/gpt-5.1".to_string(),
                average_rank: 1.5,
                rankings_count: 2,
            },
        ]),
    }
}

pub fn synthesis(text: &str) -> FinalSynthesis {
    FinalSynthesis {
        model: "google/gemini-3-pro".to_string(),
        response: text.to_string(),
    }
}
