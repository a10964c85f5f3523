//! # Actions
//!
//! Everything that can happen in the council client becomes an `Action`.
//! User presses Enter? That's `Action::Submit(submission)`.
//! Backend says stage 2 finished? That's `Action::StageResolved { .. }`.
//!
//! The `update()` function takes the current state and an action, mutates the
//! state and returns an `Effect` describing any I/O the caller should run.
//! No side effects here. I/O happens elsewhere.
//!
//! ```text
//! State + Action  →  update()  →  New State + Effect
//! ```

use log::{debug, info, warn};

use crate::core::composer::{RejectedFile, Submission};
use crate::core::stage::{Stage, StageMetadata, StagePayload};
use crate::core::state::App;
use crate::core::transcript::{StageEvent, StageUpdate};
use crate::transport::StreamEvent;

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Submit(Submission),
    ConversationCreated(String),
    StageStarted {
        turn_index: usize,
        stage: Stage,
    },
    StageResolved {
        turn_index: usize,
        payload: StagePayload,
        metadata: Option<StageMetadata>,
    },
    TitleReceived(String),
    /// The backend closed the stream normally.
    ResponseDone,
    ResponseFailed(String),
    CancelGeneration,
    AttachmentRejected(RejectedFile),
    Quit,
}

impl Action {
    /// Converts a stream event for the turn at `turn_index` into an action.
    pub fn from_stream_event(event: StreamEvent, turn_index: usize) -> Action {
        match event {
            StreamEvent::TitleComplete { data } => Action::TitleReceived(data.title),
            StreamEvent::Complete => Action::ResponseDone,
            StreamEvent::Error { message } => Action::ResponseFailed(message),
            stage_event => match stage_event.into_stage_update(turn_index) {
                Some(update) => Action::from(update),
                // into_stage_update covers every remaining variant
                None => Action::ResponseDone,
            },
        }
    }
}

impl From<StageUpdate> for Action {
    fn from(update: StageUpdate) -> Self {
        match update.event {
            StageEvent::Started => Action::StageStarted {
                turn_index: update.turn_index,
                stage: update.stage,
            },
            StageEvent::Resolved { payload, metadata } => {
                Action::StageResolved {
                    turn_index: update.turn_index,
                    payload,
                    metadata,
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    None,
    /// Send `submission` to the backend; its events belong to `turn_index`.
    SpawnRequest {
        turn_index: usize,
        submission: Submission,
    },
    Quit,
}

pub fn update(app: &mut App, action: Action) -> Effect {
    match action {
        Action::Submit(submission) => {
            if app.busy {
                debug!("Submit ignored: request already in flight");
                return Effect::None;
            }
            app.transcript
                .append_user_turn(submission.text.clone(), submission.attachment.clone());
            let turn_index = app.transcript.append_pending_assistant_turn();
            app.busy = true;
            app.status_message = "Consulting the council...".to_string();
            info!("Submitted turn {}", turn_index);
            Effect::SpawnRequest {
                turn_index,
                submission,
            }
        }
        Action::ConversationCreated(id) => {
            info!("Using conversation {}", id);
            app.conversation_id = Some(id);
            Effect::None
        }
        Action::StageStarted { turn_index, stage } => {
            apply(app, StageUpdate::started(turn_index, stage));
            Effect::None
        }
        Action::StageResolved {
            turn_index,
            payload,
            metadata,
        } => {
            apply(app, StageUpdate::resolved(turn_index, payload, metadata));
            Effect::None
        }
        Action::TitleReceived(title) => {
            debug!("Conversation title: {}", title);
            app.title = Some(title);
            Effect::None
        }
        Action::ResponseDone => {
            app.busy = false;
            app.status_message = "Ready".to_string();
            Effect::None
        }
        Action::ResponseFailed(message) => {
            warn!("Response failed: {}", message);
            app.transcript.interrupt_open_turn();
            app.busy = false;
            app.status_message = format!("Error: {}", message);
            Effect::None
        }
        Action::CancelGeneration => {
            if app.busy {
                app.transcript.interrupt_open_turn();
                app.busy = false;
                app.status_message = "Cancelled".to_string();
                info!("Generation cancelled");
            }
            Effect::None
        }
        Action::AttachmentRejected(rejected) => {
            warn!("Rejected attachment: {}", rejected);
            app.status_message = format!("{}. Please select a PDF.", rejected);
            Effect::None
        }
        Action::Quit => Effect::Quit,
    }
}

fn apply(app: &mut App, update: StageUpdate) {
    let turn_index = update.turn_index;
    let stage = update.stage;
    if let Err(e) = app.transcript.apply_stage_update(update) {
        warn!("Dropped {} update for turn {}: {}", stage, turn_index, e);
    }
}
