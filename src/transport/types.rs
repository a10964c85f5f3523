use serde::{Deserialize, Serialize};

use crate::core::stage::{
    Stage, Stage1Result, Stage2Result, Stage3Result, StageMetadata, StagePayload,
};
use crate::core::transcript::StageUpdate;

/// Text sent when the user attaches a PDF without typing anything.
pub const DEFAULT_PDF_PROMPT: &str = "Please analyze this PDF document.";

/// A file embedded in the request body.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AttachmentPayload {
    pub filename: String,
    #[serde(rename = "type")]
    pub mime_type: String,
    pub base64: String,
}

/// Body of `POST /api/conversations/{id}/message/stream`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SendMessageRequest {
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<AttachmentPayload>,
}

#[derive(Deserialize, Debug)]
pub(crate) struct ConversationCreated {
    pub id: String,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct TitleData {
    pub title: String,
}

/// One server-sent event from the council backend.
///
/// The event type lives in the JSON body's `type` field, not in an SSE
/// `event:` line.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type")]
pub enum StreamEvent {
    #[serde(rename = "stage1_start")]
    Stage1Start,
    #[serde(rename = "stage1_complete")]
    Stage1Complete { data: Stage1Result },
    #[serde(rename = "stage2_start")]
    Stage2Start,
    #[serde(rename = "stage2_complete")]
    Stage2Complete {
        data: Stage2Result,
        #[serde(default)]
        metadata: Option<StageMetadata>,
    },
    #[serde(rename = "stage3_start")]
    Stage3Start,
    #[serde(rename = "stage3_complete")]
    Stage3Complete { data: Stage3Result },
    #[serde(rename = "title_complete")]
    TitleComplete { data: TitleData },
    #[serde(rename = "complete")]
    Complete,
    #[serde(rename = "error")]
    Error {
        #[serde(default)]
        message: String,
    },
}

impl StreamEvent {
    /// Addresses a stage event to the given turn. Events that are not about a
    /// stage (title, completion, errors) return `None`.
    pub fn into_stage_update(self, turn_index: usize) -> Option<StageUpdate> {
        match self {
            StreamEvent::Stage1Start => Some(StageUpdate::started(turn_index, Stage::One)),
            StreamEvent::Stage2Start => Some(StageUpdate::started(turn_index, Stage::Two)),
            StreamEvent::Stage3Start => Some(StageUpdate::started(turn_index, Stage::Three)),
            StreamEvent::Stage1Complete { data } => Some(StageUpdate::resolved(
                turn_index,
                StagePayload::One(data),
                None,
            )),
            StreamEvent::Stage2Complete { data, metadata } => Some(StageUpdate::resolved(
                turn_index,
                StagePayload::Two(data),
                metadata,
            )),
            StreamEvent::Stage3Complete { data } => Some(StageUpdate::resolved(
                turn_index,
                StagePayload::Three(data),
                None,
            )),
            StreamEvent::TitleComplete { .. } | StreamEvent::Complete | StreamEvent::Error { .. } => {
                None
            }
        }
    }
}

/// Splits a byte stream into SSE `data:` payloads.
///
/// Chunks may end mid-line or mid-character; the raw tail is buffered until
/// the next push and only complete lines are decoded.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds a chunk and returns every complete `data:` payload it finished.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut payloads = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=pos).collect();
            let decoded = String::from_utf8_lossy(&raw);
            let line = decoded.trim();

            if let Some(data) = line.strip_prefix("data:") {
                let data = data.trim_start();
                if !data.is_empty() && data != "[DONE]" {
                    payloads.push(data.to_string());
                }
            }
        }
        payloads
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_start_events() {
        let event: StreamEvent = serde_json::from_str(r#"{"type": "stage2_start"}"#).unwrap();
        assert_eq!(event, StreamEvent::Stage2Start);
    }

    #[test]
    fn parses_stage2_with_metadata() {
        let json = r#"{
            "type": "stage2_complete",
            "data": [{"model": "m1", "ranking": "FINAL RANKING:\n1. Response B", "parsed_ranking": ["Response B"]}],
            "metadata": {
                "label_to_model": {"Response A": "m1", "Response B": "m2"},
                "aggregate_rankings": [{"model": "m2", "average_rank": 1.0, "rankings_count": 1}]
            }
        }"#;
        let event: StreamEvent = serde_json::from_str(json).unwrap();
        let StreamEvent::Stage2Complete { data, metadata } = event else {
            panic!("expected stage2_complete");
        };
        assert_eq!(data[0].parsed_ranking, vec!["Response B"]);
        let metadata = metadata.unwrap();
        assert_eq!(metadata.label_to_model.len(), 2);
        assert_eq!(metadata.aggregate_rankings.unwrap()[0].model, "m2");
    }

    #[test]
    fn parses_error_without_message() {
        let event: StreamEvent = serde_json::from_str(r#"{"type": "error"}"#).unwrap();
        assert_eq!(
            event,
            StreamEvent::Error {
                message: String::new()
            }
        );
    }

    #[test]
    fn unknown_event_type_fails_to_parse() {
        assert!(serde_json::from_str::<StreamEvent>(r#"{"type": "stage4_start"}"#).is_err());
    }

    #[test]
    fn stage_events_map_to_updates() {
        let update = StreamEvent::Stage3Start.into_stage_update(5).unwrap();
        assert_eq!(update, StageUpdate::started(5, Stage::Three));

        let event = StreamEvent::Stage1Complete { data: vec![] };
        let update = event.into_stage_update(1).unwrap();
        assert_eq!(update.stage, Stage::One);
        assert_eq!(update.turn_index, 1);
    }

    #[test]
    fn non_stage_events_map_to_nothing() {
        assert!(StreamEvent::Complete.into_stage_update(0).is_none());
        let title = StreamEvent::TitleComplete {
            data: TitleData {
                title: "Rust".into(),
            },
        };
        assert!(title.into_stage_update(0).is_none());
    }

    #[test]
    fn request_omits_empty_attachments() {
        let request = SendMessageRequest {
            content: "hi".into(),
            attachments: vec![],
        };
        assert_eq!(serde_json::to_string(&request).unwrap(), r#"{"content":"hi"}"#);
    }

    #[test]
    fn decoder_handles_split_lines() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"data: {\"type\":\"stage1").is_empty());
        let payloads = decoder.push(b"_start\"}\n\ndata: {\"type\":\"complete\"}\n\n");
        assert_eq!(
            payloads,
            vec![
                r#"{"type":"stage1_start"}"#.to_string(),
                r#"{"type":"complete"}"#.to_string()
            ]
        );
    }

    #[test]
    fn decoder_keeps_characters_split_across_chunks() {
        let mut decoder = SseDecoder::new();
        let line = "data: {\"type\":\"stage3_complete\",\"data\":{\"model\":\"m\",\"response\":\"café\"}}\n\n";
        let split = line.find('é').unwrap() + 1;
        assert!(decoder.push(&line.as_bytes()[..split]).is_empty());
        let payloads = decoder.push(&line.as_bytes()[split..]);
        assert_eq!(payloads.len(), 1);
        match serde_json::from_str::<StreamEvent>(&payloads[0]).unwrap() {
            StreamEvent::Stage3Complete { data } => assert_eq!(data.response, "café"),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn decoder_skips_comments_and_done() {
        let mut decoder = SseDecoder::new();
        let payloads = decoder.push(b": keepalive\nevent: message\ndata: [DONE]\n");
        assert!(payloads.is_empty());
    }
}
