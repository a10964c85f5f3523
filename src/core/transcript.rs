//! # Transcript
//!
//! The ordered list of turns and the only place that mutates it.
//!
//! ```text
//! append_user_turn ──────────┐
//! append_pending_assistant ──┼──▶ turns[..] ──▶ listeners(change) + revision++
//! apply_stage_update ────────┘
//! ```
//!
//! A turn's index is its identity for the whole session. Stage updates address
//! turns by index and patch them in place; nothing is ever removed or reordered.
//!
//! Malformed or stale updates (unknown index, user turn, resolved stage, a stage
//! whose predecessor never started) are rejected with a `StageUpdateError` and
//! leave the transcript untouched. Callers log them and move on.

use std::fmt;

use crate::core::stage::{Stage, StageMetadata, StagePayload};
use crate::core::turn::{AssistantTurn, FileRef, Turn, UserTurn};

/// What a stage update carries.
#[derive(Debug, Clone, PartialEq)]
pub enum StageEvent {
    Started,
    Resolved {
        payload: StagePayload,
        metadata: Option<StageMetadata>,
    },
}

/// A single event from the stage-update channel, addressed by turn index.
#[derive(Debug, Clone, PartialEq)]
pub struct StageUpdate {
    pub turn_index: usize,
    pub stage: Stage,
    pub event: StageEvent,
}

impl StageUpdate {
    pub fn started(turn_index: usize, stage: Stage) -> Self {
        Self {
            turn_index,
            stage,
            event: StageEvent::Started,
        }
    }

    pub fn resolved(
        turn_index: usize,
        payload: StagePayload,
        metadata: Option<StageMetadata>,
    ) -> Self {
        Self {
            turn_index,
            stage: payload.stage(),
            event: StageEvent::Resolved { payload, metadata },
        }
    }
}

/// Why a stage update was dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageUpdateError {
    UnknownTurn(usize),
    NotAssistantTurn(usize),
    AlreadyStarted(Stage),
    AlreadyResolved(Stage),
    OutOfOrder { stage: Stage, previous: Stage },
    PayloadMismatch { stage: Stage, payload: Stage },
    TurnClosed,
}

impl fmt::Display for StageUpdateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageUpdateError::UnknownTurn(index) => write!(f, "no turn at index {index}"),
            StageUpdateError::NotAssistantTurn(index) => {
                write!(f, "turn {index} is not an assistant turn")
            }
            StageUpdateError::AlreadyStarted(stage) => write!(f, "{stage} already started"),
            StageUpdateError::AlreadyResolved(stage) => write!(f, "{stage} already resolved"),
            StageUpdateError::OutOfOrder { stage, previous } => {
                write!(f, "{stage} arrived before {previous} started")
            }
            StageUpdateError::PayloadMismatch { stage, payload } => {
                write!(f, "{payload} payload delivered for {stage}")
            }
            StageUpdateError::TurnClosed => write!(f, "turn no longer accepts updates"),
        }
    }
}

impl std::error::Error for StageUpdateError {}

/// Emitted to listeners after every successful mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranscriptChange {
    TurnAppended { index: usize },
    StageUpdated { index: usize, stage: Stage },
    TurnInterrupted { index: usize },
}

type Listener = Box<dyn FnMut(&TranscriptChange)>;

#[derive(Default)]
pub struct Transcript {
    turns: Vec<Turn>,
    listeners: Vec<Listener>,
    revision: u64,
}

impl fmt::Debug for Transcript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transcript")
            .field("turns", &self.turns)
            .field("listeners", &self.listeners.len())
            .field("revision", &self.revision)
            .finish()
    }
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a change listener. Listeners run synchronously, after the
    /// mutation is complete.
    pub fn subscribe(&mut self, listener: impl FnMut(&TranscriptChange) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn get(&self, index: usize) -> Option<&Turn> {
        self.turns.get(index)
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Incremented on every mutation. Renderers compare it to decide whether
    /// anything changed since their last frame.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Index of the assistant turn still accepting updates, if any.
    pub fn open_turn(&self) -> Option<usize> {
        self.turns.iter().rposition(Turn::is_open)
    }

    pub fn append_user_turn(&mut self, text: String, attachment: Option<FileRef>) -> usize {
        self.turns.push(Turn::User(UserTurn { text, attachment }));
        let index = self.turns.len() - 1;
        self.notify(TranscriptChange::TurnAppended { index });
        index
    }

    /// Appends the placeholder for the next response. A turn that is still
    /// open is interrupted first so only one turn is ever in flight.
    pub fn append_pending_assistant_turn(&mut self) -> usize {
        if let Some(stale) = self.interrupt_open_turn() {
            log::warn!("Turn {} was still open; interrupted before appending", stale);
        }
        self.turns.push(Turn::Assistant(AssistantTurn::new()));
        let index = self.turns.len() - 1;
        self.notify(TranscriptChange::TurnAppended { index });
        index
    }

    /// Closes the open assistant turn, if there is one. Stages that already
    /// resolved keep their results; stages still loading are shown as cut off.
    pub fn interrupt_open_turn(&mut self) -> Option<usize> {
        let index = self.open_turn()?;
        if let Some(Turn::Assistant(turn)) = self.turns.get_mut(index) {
            turn.interrupted = true;
        }
        self.notify(TranscriptChange::TurnInterrupted { index });
        Some(index)
    }

    /// Applies one event from the stage-update channel. On error the
    /// transcript is unchanged and no listener runs.
    pub fn apply_stage_update(&mut self, update: StageUpdate) -> Result<(), StageUpdateError> {
        let StageUpdate {
            turn_index,
            stage,
            event,
        } = update;

        let turn = match self.turns.get_mut(turn_index) {
            Some(Turn::Assistant(turn)) => turn,
            Some(Turn::User(_)) => return Err(StageUpdateError::NotAssistantTurn(turn_index)),
            None => return Err(StageUpdateError::UnknownTurn(turn_index)),
        };

        match event {
            StageEvent::Started => turn.start(stage)?,
            StageEvent::Resolved { payload, metadata } => turn.resolve(stage, payload, metadata)?,
        }

        self.notify(TranscriptChange::StageUpdated {
            index: turn_index,
            stage,
        });
        Ok(())
    }

    fn notify(&mut self, change: TranscriptChange) {
        self.revision += 1;
        for listener in &mut self.listeners {
            listener(&change);
        }
    }
}
