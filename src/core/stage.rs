//! # Stages
//!
//! An assistant turn is produced by three sequential deliberation stages:
//!
//! ```text
//! Stage 1: independent responses   (every council model answers)
//! Stage 2: peer ranking            (models rank the anonymized answers)
//! Stage 3: final synthesis         (the chairman writes the answer)
//! ```
//!
//! Each stage is tracked by its own `StageState` machine:
//!
//! ```text
//! Pending ──started──▶ Loading ──result──▶ Resolved(payload)
//!    └──────────────────result─────────────────▲
//! ```
//!
//! `Resolved` owns the payload, so a stage can never look finished without
//! its result attached.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the three deliberation stages, in presentation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    One,
    Two,
    Three,
}

impl Stage {
    pub const ALL: [Stage; 3] = [Stage::One, Stage::Two, Stage::Three];

    /// 1-based stage number as shown to the user and used on the wire.
    pub fn number(self) -> u8 {
        match self {
            Stage::One => 1,
            Stage::Two => 2,
            Stage::Three => 3,
        }
    }

    /// The stage that must have started before this one may.
    pub fn previous(self) -> Option<Stage> {
        match self {
            Stage::One => None,
            Stage::Two => Some(Stage::One),
            Stage::Three => Some(Stage::Two),
        }
    }

    /// Progress line shown while the stage is running.
    pub fn loading_label(self) -> &'static str {
        match self {
            Stage::One => "Running Stage 1: Collecting individual responses...",
            Stage::Two => "Running Stage 2: Peer rankings...",
            Stage::Three => "Running Stage 3: Final synthesis...",
        }
    }

    /// Section title shown above the resolved output.
    pub fn title(self) -> &'static str {
        match self {
            Stage::One => "Stage 1: Individual Responses",
            Stage::Two => "Stage 2: Peer Rankings",
            Stage::Three => "Stage 3: Final Council Answer",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stage {}", self.number())
    }
}

// ============================================================================
// Payloads
// ============================================================================

/// A single council member's answer to the user's question.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ModelResponse {
    pub model: String,
    pub response: String,
}

/// One model's evaluation of the anonymized stage 1 answers.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PeerRanking {
    pub model: String,
    /// Full evaluation text, refers to answers by anonymous label ("Response A").
    pub ranking: String,
    /// Labels in ranked order, best first, as extracted by the backend.
    #[serde(default)]
    pub parsed_ranking: Vec<String>,
}

/// The chairman's final answer.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FinalSynthesis {
    pub model: String,
    pub response: String,
}

pub type Stage1Result = Vec<ModelResponse>;
pub type Stage2Result = Vec<PeerRanking>;
pub type Stage3Result = FinalSynthesis;

/// Combined standing of a model across every peer ranking.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AggregateRanking {
    pub model: String,
    pub average_rank: f64,
    pub rankings_count: u32,
}

/// Auxiliary data delivered alongside stage 2.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct StageMetadata {
    /// Anonymous label ("Response A") → model id.
    #[serde(default)]
    pub label_to_model: BTreeMap<String, String>,
    #[serde(default)]
    pub aggregate_rankings: Option<Vec<AggregateRanking>>,
}

/// A resolved payload for exactly one stage.
#[derive(Debug, Clone, PartialEq)]
pub enum StagePayload {
    One(Stage1Result),
    Two(Stage2Result),
    Three(Stage3Result),
}

impl StagePayload {
    pub fn stage(&self) -> Stage {
        match self {
            StagePayload::One(_) => Stage::One,
            StagePayload::Two(_) => Stage::Two,
            StagePayload::Three(_) => Stage::Three,
        }
    }
}

// ============================================================================
// Per-stage state machine
// ============================================================================

#[derive(Debug, Clone, PartialEq, Default)]
pub enum StageState<T> {
    #[default]
    Pending,
    Loading,
    Resolved(T),
}

impl<T> StageState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, StageState::Loading)
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, StageState::Resolved(_))
    }

    /// True once the stage has left `Pending`.
    pub fn has_started(&self) -> bool {
        !matches!(self, StageState::Pending)
    }

    pub fn result(&self) -> Option<&T> {
        match self {
            StageState::Resolved(result) => Some(result),
            _ => None,
        }
    }
}
