//! # Score Precedence
//!
//! Single source of truth for which assessment of an evaluation is
//! authoritative. Every aggregate in [`rollup`](crate::rollup) goes through
//! [`get_active_score`].
//!
//! Priority: final, then committee, then self (only if some pillar is above
//! zero), otherwise nothing.

use crate::model::{Evaluation, StageId};
use crate::score::{Assessment, Score};
use serde::{Deserialize, Serialize};

/// Which assessment [`get_active_score`] picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScoreSource {
    Final,
    Committee,
    SelfAssessment,
    None,
}

/// The source that currently defines the evaluation's score.
#[must_use]
pub fn score_source(evaluation: &Evaluation) -> ScoreSource {
    if evaluation.final_assessment.is_some() {
        ScoreSource::Final
    } else if evaluation.committee_assessment.is_some() {
        ScoreSource::Committee
    } else if evaluation.self_assessment.has_any_score() {
        ScoreSource::SelfAssessment
    } else {
        ScoreSource::None
    }
}

/// The authoritative assessment, if the evaluation has one.
#[must_use]
pub fn get_active_score(evaluation: &Evaluation) -> Option<&Assessment> {
    match score_source(evaluation) {
        ScoreSource::Final => evaluation.final_assessment.as_ref(),
        ScoreSource::Committee => evaluation.committee_assessment.as_ref(),
        ScoreSource::SelfAssessment => Some(&evaluation.self_assessment),
        ScoreSource::None => None,
    }
}

/// Whether the evaluation counts towards department, sector and dashboard
/// figures. `pending` evaluations never count, even with stale scores.
#[must_use]
pub fn should_include_in_aggregates(evaluation: &Evaluation) -> bool {
    evaluation.stage != StageId::Pending && get_active_score(evaluation).is_some()
}

/// Mean of all five pillars, one decimal.
#[must_use]
pub fn overall_score(assessment: &Assessment) -> Score {
    let sum: u64 = assessment
        .iter()
        .map(|(_, score)| u64::from(score.tenths()))
        .sum();
    Score::mean(sum, 5)
}

/// Mean of the pillars that carry a score, one decimal. Unset when none do.
#[must_use]
pub fn overall_score_of_set(assessment: &Assessment) -> Score {
    let (sum, count) = assessment
        .iter()
        .filter(|(_, score)| score.is_set())
        .fold((0u64, 0u64), |(sum, count), (_, score)| {
            (sum + u64::from(score.tenths()), count + 1)
        });
    Score::mean(sum, count)
}

/// Display band for a one-decimal overall score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MaturityBand(pub u8);

impl MaturityBand {
    #[must_use]
    pub fn of(score: Score) -> Self {
        let band = match score.tenths() {
            45.. => 5,
            35..=44 => 4,
            25..=34 => 3,
            15..=24 => 2,
            _ => 1,
        };
        Self(band)
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self.0 {
            5 => "Optimised",
            4 => "Managed",
            3 => "Defined",
            2 => "Developing",
            _ => "Initial",
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use chrono::Utc;
    use proptest::prelude::*;

    fn levels(values: [u8; 5]) -> Assessment {
        Assessment::from_levels(values).unwrap()
    }

    fn evaluation() -> Evaluation {
        Evaluation::new("eval_1".into(), "proj_1".into(), Utc::now())
    }

    #[test]
    fn final_beats_committee_and_self() {
        let mut e = evaluation();
        e.self_assessment = levels([1, 1, 1, 1, 1]);
        e.committee_assessment = Some(levels([2, 2, 2, 2, 2]));
        e.final_assessment = Some(levels([3, 3, 3, 3, 3]));
        assert_eq!(get_active_score(&e), Some(&levels([3, 3, 3, 3, 3])));
        assert_eq!(score_source(&e), ScoreSource::Final);
    }

    #[test]
    fn committee_beats_self() {
        let mut e = evaluation();
        e.self_assessment = levels([4, 4, 4, 4, 4]);
        e.committee_assessment = Some(levels([2, 2, 2, 2, 2]));
        assert_eq!(get_active_score(&e), Some(&levels([2, 2, 2, 2, 2])));
    }

    #[test]
    fn all_zero_self_assessment_is_no_score() {
        let e = evaluation();
        assert_eq!(get_active_score(&e), None);
        assert_eq!(score_source(&e), ScoreSource::None);

        let mut e = evaluation();
        e.self_assessment = levels([0, 0, 1, 0, 0]);
        assert_eq!(score_source(&e), ScoreSource::SelfAssessment);
    }

    #[test]
    fn pending_is_excluded_even_with_scores() {
        let mut e = evaluation();
        e.committee_assessment = Some(levels([3, 3, 3, 3, 3]));
        assert!(!should_include_in_aggregates(&e));
        e.stage = StageId::CommitteeEvaluated;
        assert!(should_include_in_aggregates(&e));
    }

    #[test]
    fn overall_means() {
        let a = levels([3, 4, 0, 0, 0]);
        assert_eq!(overall_score(&a).tenths(), 14);
        assert_eq!(overall_score_of_set(&a).tenths(), 35);
        assert_eq!(overall_score_of_set(&Assessment::UNSET), Score::UNSET);
    }

    #[test]
    fn maturity_bands() {
        let band = |tenths| MaturityBand::of(Score::from_tenths(tenths).unwrap()).0;
        assert_eq!(band(45), 5);
        assert_eq!(band(44), 4);
        assert_eq!(band(35), 4);
        assert_eq!(band(25), 3);
        assert_eq!(band(15), 2);
        assert_eq!(band(14), 1);
        assert_eq!(band(0), 1);
    }

    fn any_assessment() -> impl Strategy<Value = Assessment> {
        prop::array::uniform5(0u8..=5).prop_map(|values| levels(values))
    }

    proptest! {
        #[test]
        fn precedence_is_total(
            self_a in any_assessment(),
            committee in prop::option::of(any_assessment()),
            final_a in prop::option::of(any_assessment()),
        ) {
            let mut e = evaluation();
            e.self_assessment = self_a;
            e.committee_assessment = committee;
            e.final_assessment = final_a;

            let expected = final_a
                .or(committee)
                .or_else(|| self_a.has_any_score().then_some(self_a));
            prop_assert_eq!(get_active_score(&e).copied(), expected);
        }

        #[test]
        fn overall_score_stays_in_range(a in any_assessment()) {
            prop_assert!(overall_score(&a).tenths() <= 50);
            prop_assert!(overall_score_of_set(&a) >= overall_score(&a));
        }
    }
}
