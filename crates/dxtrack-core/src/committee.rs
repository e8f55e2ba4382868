//! # Committee Merge
//!
//! Individual evaluator score sheets are kept per evaluator (one entry each,
//! replaced on resubmission). The committee assessment is always the
//! element-wise, one-decimal mean of every entry, recomputed on each
//! submission.

use crate::error::Result;
use crate::model::{Evaluation, EvaluatorAssessment};
use crate::score::{Assessment, MIN_LEVEL, mean_assessment};
use crate::stage::{StageEvent, next_stage};
use chrono::{DateTime, Utc};

/// Insert `entry`, replacing any earlier entry from the same evaluator in
/// place so list order reflects first submission.
pub fn upsert_evaluator_score(scores: &mut Vec<EvaluatorAssessment>, entry: EvaluatorAssessment) {
    match scores
        .iter_mut()
        .find(|existing| existing.evaluator_id == entry.evaluator_id)
    {
        Some(existing) => *existing = entry,
        None => scores.push(entry),
    }
}

/// One-decimal mean of every evaluator's assessment. `None` when empty.
#[must_use]
pub fn committee_average(scores: &[EvaluatorAssessment]) -> Option<Assessment> {
    mean_assessment(scores.iter().map(|entry| &entry.assessment))
}

/// Record one evaluator's scores on `evaluation`.
///
/// Validates whole levels 1..=5, upserts, recomputes the committee
/// assessment and moves the evaluation to `under_review`.
pub fn apply_evaluator_score(
    evaluation: &mut Evaluation,
    entry: EvaluatorAssessment,
    now: DateTime<Utc>,
) -> Result<()> {
    entry.assessment.ensure_whole_levels(MIN_LEVEL)?;
    upsert_evaluator_score(&mut evaluation.evaluator_scores, entry);
    evaluation.committee_assessment = committee_average(&evaluation.evaluator_scores);
    evaluation.stage = next_stage(evaluation.stage, StageEvent::EvaluatorScored);
    evaluation.updated_at = Some(now);
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::model::StageId;
    use crate::score::Score;
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    fn entry(evaluator: &str, values: [u8; 5]) -> EvaluatorAssessment {
        EvaluatorAssessment {
            evaluator_id: evaluator.into(),
            evaluator_name: format!("Evaluator {evaluator}"),
            assessment: Assessment::from_levels(values).unwrap(),
            comments: BTreeMap::new(),
            submitted_at: Utc::now(),
        }
    }

    fn evaluation() -> Evaluation {
        Evaluation::new("eval_1".into(), "proj_1".into(), Utc::now())
    }

    #[test]
    fn two_evaluators_average_to_one_decimal() {
        let mut e = evaluation();
        apply_evaluator_score(&mut e, entry("user_a", [3, 2, 2, 2, 2]), Utc::now()).unwrap();
        apply_evaluator_score(&mut e, entry("user_b", [4, 3, 3, 3, 3]), Utc::now()).unwrap();
        let committee = e.committee_assessment.unwrap();
        assert_eq!(committee.strategic.tenths(), 35);
        assert_eq!(committee.operations.tenths(), 25);
        assert_eq!(e.stage, StageId::UnderReview);
    }

    #[test]
    fn resubmission_replaces_earlier_entry() {
        let mut e = evaluation();
        apply_evaluator_score(&mut e, entry("user_a", [1, 1, 1, 1, 1]), Utc::now()).unwrap();
        apply_evaluator_score(&mut e, entry("user_b", [3, 3, 3, 3, 3]), Utc::now()).unwrap();
        apply_evaluator_score(&mut e, entry("user_a", [5, 5, 5, 5, 5]), Utc::now()).unwrap();

        assert_eq!(e.evaluator_scores.len(), 2);
        assert_eq!(e.evaluator_scores[0].evaluator_id.as_str(), "user_a");
        assert_eq!(e.committee_assessment.unwrap().data, Score::from_level(4).unwrap());
    }

    #[test]
    fn fractional_or_zero_levels_are_rejected_without_mutation() {
        let mut e = evaluation();
        let mut bad = entry("user_a", [3, 3, 3, 3, 3]);
        bad.assessment.data = Score::from_tenths(35).unwrap();
        assert!(apply_evaluator_score(&mut e, bad, Utc::now()).is_err());
        assert!(apply_evaluator_score(&mut e, entry("user_a", [0, 3, 3, 3, 3]), Utc::now()).is_err());
        assert!(e.evaluator_scores.is_empty());
        assert_eq!(e.stage, StageId::Pending);
    }

    #[test]
    fn scoring_overrides_committee_evaluated_stage() {
        let mut e = evaluation();
        e.stage = StageId::CommitteeEvaluated;
        apply_evaluator_score(&mut e, entry("user_a", [2, 2, 2, 2, 2]), Utc::now()).unwrap();
        assert_eq!(e.stage, StageId::UnderReview);
    }

    proptest! {
        #[test]
        fn average_ignores_submission_order(
            sheets in prop::collection::vec(prop::array::uniform5(1u8..=5), 1..8)
        ) {
            let entries: Vec<EvaluatorAssessment> = sheets
                .iter()
                .enumerate()
                .map(|(i, values)| entry(&format!("user_{i}"), *values))
                .collect();
            let mut reversed = entries.clone();
            reversed.reverse();
            prop_assert_eq!(committee_average(&entries), committee_average(&reversed));
        }
    }
}
