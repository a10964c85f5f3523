//! # Turns
//!
//! One entry in the transcript. User turns are immutable; assistant turns
//! accumulate stage results in place until every stage is resolved.

use std::path::PathBuf;

use crate::core::stage::{
    Stage, Stage1Result, Stage2Result, Stage3Result, StageMetadata, StagePayload, StageState,
};
use crate::core::transcript::StageUpdateError;

/// Reference to a file sent along with a user turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRef {
    pub path: PathBuf,
    pub filename: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserTurn {
    pub text: String,
    pub attachment: Option<FileRef>,
}

/// Boolean view of the per-stage machines, one flag per stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadingFlags {
    pub stage1: bool,
    pub stage2: bool,
    pub stage3: bool,
}

impl LoadingFlags {
    pub fn any(&self) -> bool {
        self.stage1 || self.stage2 || self.stage3
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AssistantTurn {
    pub stage1: StageState<Stage1Result>,
    pub stage2: StageState<Stage2Result>,
    pub stage3: StageState<Stage3Result>,
    pub metadata: Option<StageMetadata>,
    /// Set when the turn was closed before all stages resolved.
    pub interrupted: bool,
}

impl AssistantTurn {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn loading(&self) -> LoadingFlags {
        LoadingFlags {
            stage1: self.stage1.is_loading(),
            stage2: self.stage2.is_loading(),
            stage3: self.stage3.is_loading(),
        }
    }

    pub fn is_resolved(&self, stage: Stage) -> bool {
        match stage {
            Stage::One => self.stage1.is_resolved(),
            Stage::Two => self.stage2.is_resolved(),
            Stage::Three => self.stage3.is_resolved(),
        }
    }

    pub fn has_started(&self, stage: Stage) -> bool {
        match stage {
            Stage::One => self.stage1.has_started(),
            Stage::Two => self.stage2.has_started(),
            Stage::Three => self.stage3.has_started(),
        }
    }

    pub fn is_complete(&self) -> bool {
        Stage::ALL.iter().all(|&stage| self.is_resolved(stage))
    }

    /// Still accepting stage updates.
    pub fn is_open(&self) -> bool {
        !self.interrupted && !self.is_complete()
    }

    /// `Pending → Loading`. Rejected if the stage already left `Pending`
    /// or its predecessor has not started yet.
    pub(crate) fn start(&mut self, stage: Stage) -> Result<(), StageUpdateError> {
        self.check_accepts(stage)?;
        if self.has_started(stage) {
            return Err(if self.is_resolved(stage) {
                StageUpdateError::AlreadyResolved(stage)
            } else {
                StageUpdateError::AlreadyStarted(stage)
            });
        }
        match stage {
            Stage::One => self.stage1 = StageState::Loading,
            Stage::Two => self.stage2 = StageState::Loading,
            Stage::Three => self.stage3 = StageState::Loading,
        }
        Ok(())
    }

    /// `Loading → Resolved` (or `Pending → Resolved`). The payload and the
    /// cleared loading flag land in the same assignment.
    pub(crate) fn resolve(
        &mut self,
        stage: Stage,
        payload: StagePayload,
        metadata: Option<StageMetadata>,
    ) -> Result<(), StageUpdateError> {
        if payload.stage() != stage {
            return Err(StageUpdateError::PayloadMismatch {
                stage,
                payload: payload.stage(),
            });
        }
        self.check_accepts(stage)?;
        if self.is_resolved(stage) {
            return Err(StageUpdateError::AlreadyResolved(stage));
        }
        match payload {
            StagePayload::One(result) => self.stage1 = StageState::Resolved(result),
            StagePayload::Two(result) => self.stage2 = StageState::Resolved(result),
            StagePayload::Three(result) => self.stage3 = StageState::Resolved(result),
        }
        if metadata.is_some() {
            self.metadata = metadata;
        }
        Ok(())
    }

    fn check_accepts(&self, stage: Stage) -> Result<(), StageUpdateError> {
        if self.interrupted {
            return Err(StageUpdateError::TurnClosed);
        }
        if let Some(previous) = stage.previous()
            && !self.has_started(previous)
        {
            return Err(StageUpdateError::OutOfOrder { stage, previous });
        }
        Ok(())
    }
}

/// A transcript entry. Rendering matches on the variant.
#[derive(Debug, Clone, PartialEq)]
pub enum Turn {
    User(UserTurn),
    Assistant(AssistantTurn),
}

impl Turn {
    pub fn as_assistant(&self) -> Option<&AssistantTurn> {
        match self {
            Turn::Assistant(turn) => Some(turn),
            Turn::User(_) => None,
        }
    }

    /// An assistant turn that may still change.
    pub fn is_open(&self) -> bool {
        self.as_assistant().is_some_and(AssistantTurn::is_open)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{stage1_payload, stage2_payload, synthesis};

    #[test]
    fn new_turn_is_pending_everywhere() {
        let turn = AssistantTurn::new();
        assert_eq!(turn.loading(), LoadingFlags::default());
        assert!(turn.is_open());
        assert!(!turn.is_complete());
    }

    #[test]
    fn start_then_resolve_clears_loading_and_attaches() {
        let mut turn = AssistantTurn::new();
        turn.start(Stage::One).unwrap();
        assert!(turn.loading().stage1);

        turn.resolve(Stage::One, StagePayload::One(stage1_payload()), None)
            .unwrap();
        assert!(!turn.loading().stage1);
        assert_eq!(turn.stage1.result(), Some(&stage1_payload()));
    }

    #[test]
    fn resolve_without_start_is_allowed() {
        let mut turn = AssistantTurn::new();
        turn.resolve(Stage::One, StagePayload::One(stage1_payload()), None)
            .unwrap();
        assert!(turn.stage1.is_resolved());
    }

    #[test]
    fn stage_cannot_start_before_predecessor() {
        let mut turn = AssistantTurn::new();
        assert_eq!(
            turn.start(Stage::Three),
            Err(StageUpdateError::OutOfOrder {
                stage: Stage::Three,
                previous: Stage::Two
            })
        );
        assert_eq!(turn.loading(), LoadingFlags::default());
    }

    #[test]
    fn overlapping_stages_are_tolerated() {
        let mut turn = AssistantTurn::new();
        turn.start(Stage::One).unwrap();
        turn.start(Stage::Two).unwrap();
        assert!(turn.loading().stage1);
        assert!(turn.loading().stage2);
    }

    #[test]
    fn restart_is_rejected() {
        let mut turn = AssistantTurn::new();
        turn.start(Stage::One).unwrap();
        assert_eq!(
            turn.start(Stage::One),
            Err(StageUpdateError::AlreadyStarted(Stage::One))
        );
        turn.resolve(Stage::One, StagePayload::One(stage1_payload()), None)
            .unwrap();
        assert_eq!(
            turn.start(Stage::One),
            Err(StageUpdateError::AlreadyResolved(Stage::One))
        );
        assert!(turn.stage1.is_resolved());
    }

    #[test]
    fn mismatched_payload_is_rejected() {
        let mut turn = AssistantTurn::new();
        let err = turn
            .resolve(Stage::One, StagePayload::Two(stage2_payload()), None)
            .unwrap_err();
        assert_eq!(
            err,
            StageUpdateError::PayloadMismatch {
                stage: Stage::One,
                payload: Stage::Two
            }
        );
        assert!(!turn.stage1.has_started());
    }

    #[test]
    fn complete_turn_is_closed() {
        let mut turn = AssistantTurn::new();
        turn.resolve(Stage::One, StagePayload::One(stage1_payload()), None)
            .unwrap();
        turn.resolve(Stage::Two, StagePayload::Two(stage2_payload()), None)
            .unwrap();
        turn.resolve(Stage::Three, StagePayload::Three(synthesis("done")), None)
            .unwrap();
        assert!(turn.is_complete());
        assert!(!turn.is_open());
    }

    #[test]
    fn interrupted_turn_rejects_updates() {
        let mut turn = AssistantTurn::new();
        turn.start(Stage::One).unwrap();
        turn.interrupted = true;
        assert_eq!(
            turn.resolve(Stage::One, StagePayload::One(stage1_payload()), None),
            Err(StageUpdateError::TurnClosed)
        );
        assert!(!turn.is_open());
    }

    #[test]
    fn user_turn_is_never_open() {
        let turn = Turn::User(UserTurn {
            text: "hi".into(),
            attachment: None,
        });
        assert!(!turn.is_open());
        assert!(turn.as_assistant().is_none());
    }
}
