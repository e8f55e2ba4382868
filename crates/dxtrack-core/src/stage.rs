//! # Stage Transitions
//!
//! Every stage change in the engine is expressed as a [`StageEvent`] and
//! resolved by [`next_stage`]. No transition is refused; the pipeline is
//! advisory and administrators can overwrite it at any time.
//!
//! | Event | Result |
//! |---|---|
//! | `Created` | `pending` |
//! | `SelfAssessmentMapped` | `self_submitted` |
//! | `EvaluatorsAssigned(n > 0)` | `under_review` |
//! | `EvaluatorsAssigned(0)` | unchanged |
//! | `EvaluatorScored` | `under_review` |
//! | `CommitteeSaved` | `committee_evaluated` |
//! | `FinalCalibrated` | unchanged |
//! | `Overwrite(s)` | `s` |

use crate::model::StageId;

/// Something that happened to an evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageEvent {
    Created,
    SelfAssessmentMapped,
    /// Carries the number of evaluators left after role filtering.
    EvaluatorsAssigned(usize),
    EvaluatorScored,
    CommitteeSaved,
    FinalCalibrated,
    Overwrite(StageId),
}

/// The stage an evaluation moves to when `event` happens in `current`.
#[must_use]
pub fn next_stage(current: StageId, event: StageEvent) -> StageId {
    match event {
        StageEvent::Created => StageId::Pending,
        StageEvent::SelfAssessmentMapped => StageId::SelfSubmitted,
        StageEvent::EvaluatorsAssigned(0) | StageEvent::FinalCalibrated => current,
        StageEvent::EvaluatorsAssigned(_) | StageEvent::EvaluatorScored => StageId::UnderReview,
        StageEvent::CommitteeSaved => StageId::CommitteeEvaluated,
        StageEvent::Overwrite(stage) => stage,
    }
}
