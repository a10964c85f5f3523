use std::sync::Arc;
use std::time::Duration;

use council::core::action::{Action, Effect, update};
use council::core::composer::Submission;
use council::core::stage::{Stage, StageState};
use council::core::state::App;
use council::core::turn::{FileRef, Turn};
use council::transport::{
    CouncilBackend, CouncilClient, SendMessageRequest, StreamEvent, TransportError, build_request,
};
use tokio::sync::mpsc;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_partial_json, method, path},
};

// ============================================================================
// Helper Functions
// ============================================================================

fn client(server: &MockServer) -> CouncilClient {
    CouncilClient::new(server.uri(), Duration::from_secs(5)).unwrap()
}

fn request(content: &str) -> SendMessageRequest {
    SendMessageRequest {
        content: content.to_string(),
        attachments: Vec::new(),
    }
}

/// Runs a stream to completion and collects every forwarded event.
async fn collect_events(
    client: &CouncilClient,
    conversation_id: &str,
    request: &SendMessageRequest,
) -> (Result<(), TransportError>, Vec<StreamEvent>) {
    let (tx, mut rx) = mpsc::channel(64);
    let result = client.send_message_stream(conversation_id, request, tx).await;
    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    (result, events)
}

const FULL_STREAM: &str = "\
data: {\"type\":\"stage1_start\"}

data: {\"type\":\"stage1_complete\",\"data\":[{\"model\":\"openai/gpt-5.1\",\"response\":\"Borrowing.\"},{\"model\":\"google/gemini-3-pro\",\"response\":\"Ownership.\"}]}

data: {\"type\":\"stage2_start\"}

data: {\"type\":\"stage2_complete\",\"data\":[{\"model\":\"openai/gpt-5.1\",\"ranking\":\"FINAL RANKING:\\n1. Response B\\n2. Response A\",\"parsed_ranking\":[\"Response B\",\"Response A\"]}],\"metadata\":{\"label_to_model\":{\"Response A\":\"openai/gpt-5.1\",\"Response B\":\"google/gemini-3-pro\"},\"aggregate_rankings\":[{\"model\":\"google/gemini-3-pro\",\"average_rank\":1.0,\"rankings_count\":1}]}}

data: {\"type\":\"stage3_start\"}

data: {\"type\":\"stage3_complete\",\"data\":{\"model\":\"google/gemini-3-pro\",\"response\":\"Ownership and borrowing.\"}}

data: {\"type\":\"title_complete\",\"data\":{\"title\":\"Rust memory\"}}

data: {\"type\":\"complete\"}

";

// ============================================================================
// Conversations
// ============================================================================

#[tokio::test]
async fn test_create_conversation_returns_id() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/conversations"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"id": "abc-123", "messages": []})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let id = client(&mock_server).create_conversation().await.unwrap();
    assert_eq!(id, "abc-123");
}

#[tokio::test]
async fn test_create_conversation_api_error() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/conversations"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&mock_server)
        .await;

    match client(&mock_server).create_conversation().await {
        Err(TransportError::Api { status, message }) => {
            assert_eq!(status, 500);
            assert_eq!(message, "boom");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_create_conversation_bad_body_is_parse_error() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/conversations"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&mock_server)
        .await;

    assert!(matches!(
        client(&mock_server).create_conversation().await,
        Err(TransportError::Parse(_))
    ));
}

// ============================================================================
// Streaming
// ============================================================================

#[tokio::test]
async fn test_stream_forwards_events_in_order() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/conversations/c1/message/stream"))
        .and(body_partial_json(serde_json::json!({"content": "What is Rust?"})))
        .respond_with(ResponseTemplate::new(200).set_body_string(FULL_STREAM))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (result, events) =
        collect_events(&client(&mock_server), "c1", &request("What is Rust?")).await;
    assert!(result.is_ok());
    assert_eq!(events.len(), 8);
    assert_eq!(events[0], StreamEvent::Stage1Start);
    assert!(matches!(&events[1], StreamEvent::Stage1Complete { data } if data.len() == 2));
    assert!(matches!(
        &events[3],
        StreamEvent::Stage2Complete { metadata: Some(_), .. }
    ));
    assert!(matches!(&events[6], StreamEvent::TitleComplete { data } if data.title == "Rust memory"));
    assert_eq!(events[7], StreamEvent::Complete);
}

#[tokio::test]
async fn test_stream_skips_unknown_and_malformed_events() {
    let mock_server = MockServer::start().await;
    let body = "\
data: {\"type\":\"stage1_start\"}

: keep-alive comment

data: {\"type\":\"stage9_start\"}

data: {not json

data: {\"type\":\"error\",\"message\":\"model quota exceeded\"}

";
    Mock::given(method("POST"))
        .and(path("/api/conversations/c1/message/stream"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&mock_server)
        .await;

    let (result, events) = collect_events(&client(&mock_server), "c1", &request("hi")).await;
    assert!(result.is_ok());
    assert_eq!(
        events,
        vec![
            StreamEvent::Stage1Start,
            StreamEvent::Error {
                message: "model quota exceeded".into()
            },
        ]
    );
}

#[tokio::test]
async fn test_stream_api_error() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/conversations/missing/message/stream"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Conversation not found"))
        .mount(&mock_server)
        .await;

    let (result, events) = collect_events(&client(&mock_server), "missing", &request("hi")).await;
    match result {
        Err(TransportError::Api { status, message }) => {
            assert_eq!(status, 404);
            assert!(message.contains("not found"));
        }
        other => panic!("expected Api error, got {other:?}"),
    }
    assert!(events.is_empty());
}

#[tokio::test]
async fn test_stream_reports_closed_receiver() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/conversations/c1/message/stream"))
        .respond_with(ResponseTemplate::new(200).set_body_string(FULL_STREAM))
        .mount(&mock_server)
        .await;

    let (tx, rx) = mpsc::channel(64);
    drop(rx);
    let result = client(&mock_server)
        .send_message_stream("c1", &request("hi"), tx)
        .await;
    assert!(matches!(result, Err(TransportError::ChannelClosed)));
}

#[tokio::test]
async fn test_attachment_is_sent_base64_with_default_prompt() {
    let dir = std::env::temp_dir().join(format!("council-it-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let pdf = dir.join("paper.pdf");
    std::fs::write(&pdf, b"%PDF-1.4").unwrap();

    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/conversations/c1/message/stream"))
        .and(body_partial_json(serde_json::json!({
            "content": "Please analyze this PDF document.",
            "attachments": [{
                "filename": "paper.pdf",
                "type": "application/pdf",
                "base64": "JVBERi0xLjQ="
            }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_string("data: {\"type\":\"complete\"}\n\n"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let submission = Submission {
        text: "   ".into(),
        attachment: Some(FileRef {
            path: pdf.clone(),
            filename: "paper.pdf".into(),
        }),
    };
    let body = build_request(&submission).await.unwrap();
    let (result, events) = collect_events(&client(&mock_server), "c1", &body).await;

    assert!(result.is_ok());
    assert_eq!(events, vec![StreamEvent::Complete]);
    std::fs::remove_dir_all(&dir).ok();
}

// ============================================================================
// Stream → reducer
// ============================================================================

#[tokio::test]
async fn test_full_stream_resolves_turn_through_reducer() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/conversations/c1/message/stream"))
        .respond_with(ResponseTemplate::new(200).set_body_string(FULL_STREAM))
        .mount(&mock_server)
        .await;

    let client = Arc::new(client(&mock_server));
    let mut app = App::new(client.clone(), mock_server.uri());
    app.conversation_id = Some("c1".into());

    let submission = Submission {
        text: "What is Rust?".into(),
        attachment: None,
    };
    let Effect::SpawnRequest {
        turn_index,
        submission,
    } = update(&mut app, Action::Submit(submission))
    else {
        panic!("expected SpawnRequest");
    };
    assert!(app.busy);

    let body = build_request(&submission).await.unwrap();
    let (result, events) = collect_events(&client, "c1", &body).await;
    assert!(result.is_ok());
    for event in events {
        update(&mut app, Action::from_stream_event(event, turn_index));
    }

    assert!(!app.busy);
    assert_eq!(app.title.as_deref(), Some("Rust memory"));
    assert_eq!(app.transcript.open_turn(), None);

    let Some(Turn::Assistant(turn)) = app.transcript.get(turn_index) else {
        panic!("expected assistant turn");
    };
    assert!(!turn.loading().any());
    assert!(turn.is_resolved(Stage::Three));
    assert!(turn.metadata.is_some());
    match &turn.stage3 {
        StageState::Resolved(answer) => assert_eq!(answer.response, "Ownership and borrowing."),
        other => panic!("stage 3 not resolved: {other:?}"),
    }
}
