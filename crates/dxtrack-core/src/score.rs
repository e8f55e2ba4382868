//! # Scores and Assessments
//!
//! A [`Score`] is a maturity value held as integer tenths: `0` is unset,
//! `10..=50` cover levels 1 to 5, and averaged values keep one decimal
//! (`35` is 3.5).
//!
//! Floats only exist at the JSON boundary. Human-readable formats see a
//! plain number (`3` or `3.5`); binary formats (postcard) see the raw tenths.

use crate::error::EngineError;
use serde::de::{self, Unexpected, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Highest maturity level.
pub const MAX_LEVEL: u8 = 5;

/// Lowest maturity level a reviewer may award.
pub const MIN_LEVEL: u8 = 1;

const TENTHS_PER_LEVEL: u16 = 10;
const MAX_TENTHS: u16 = MAX_LEVEL as u16 * TENTHS_PER_LEVEL;

// =============================================================================
// SCORE
// =============================================================================

/// One pillar's maturity value in tenths of a level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Score(u16);

impl Score {
    /// The "not submitted" value.
    pub const UNSET: Self = Self(0);

    /// Build from raw tenths. Returns `None` above level 5.
    #[must_use]
    pub fn from_tenths(tenths: u16) -> Option<Self> {
        (tenths <= MAX_TENTHS).then_some(Self(tenths))
    }

    /// Build from a whole level (0 = unset).
    #[must_use]
    pub fn from_level(level: u8) -> Option<Self> {
        Self::from_tenths(u16::from(level).saturating_mul(TENTHS_PER_LEVEL))
    }

    /// Raw tenths.
    #[must_use]
    pub fn tenths(self) -> u16 {
        self.0
    }

    #[must_use]
    pub fn is_set(self) -> bool {
        self.0 > 0
    }

    /// The level if this score has no fractional part.
    #[must_use]
    pub fn whole_level(self) -> Option<u8> {
        (self.0 % TENTHS_PER_LEVEL == 0).then_some((self.0 / TENTHS_PER_LEVEL) as u8)
    }

    /// Nearest whole level, halves rounding up. Used to look up level
    /// descriptors for averaged scores.
    #[must_use]
    pub fn nearest_level(self) -> u8 {
        (rounded_mean(u64::from(self.0), u64::from(TENTHS_PER_LEVEL))) as u8
    }

    /// One-decimal text, e.g. `3.0` or `3.5`.
    #[must_use]
    pub fn one_decimal(self) -> String {
        format!("{}.{}", self.0 / TENTHS_PER_LEVEL, self.0 % TENTHS_PER_LEVEL)
    }

    /// Lossy float view for presentation layers.
    #[allow(clippy::float_arithmetic)]
    #[must_use]
    pub fn as_f64(self) -> f64 {
        f64::from(self.0) / f64::from(TENTHS_PER_LEVEL)
    }

    /// Mean of `count` scores whose tenths add up to `sum`, rounded to one
    /// decimal. Zero when `count` is zero.
    pub(crate) fn mean(sum: u64, count: u64) -> Self {
        Self(rounded_mean(sum, count).min(u64::from(MAX_TENTHS)) as u16)
    }
}

/// Integer division rounding half away from zero (operands are non-negative).
pub(crate) fn rounded_mean(sum: u64, count: u64) -> u64 {
    sum.saturating_mul(2)
        .saturating_add(count)
        .checked_div(count.saturating_mul(2))
        .unwrap_or(0)
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.whole_level() {
            Some(level) => write!(f, "{level}"),
            None => f.write_str(&self.one_decimal()),
        }
    }
}

impl Serialize for Score {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        if !serializer.is_human_readable() {
            return serializer.serialize_u16(self.0);
        }
        match self.whole_level() {
            Some(level) => serializer.serialize_u8(level),
            None => serializer.serialize_f64(self.as_f64()),
        }
    }
}

impl<'de> Deserialize<'de> for Score {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            deserializer.deserialize_any(ScoreVisitor)
        } else {
            let tenths = u16::deserialize(deserializer)?;
            Self::from_tenths(tenths)
                .ok_or_else(|| de::Error::custom(format!("score out of range: {tenths} tenths")))
        }
    }
}

struct ScoreVisitor;

impl Visitor<'_> for ScoreVisitor {
    type Value = Score;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a maturity score between 0 and 5")
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> std::result::Result<Score, E> {
        u8::try_from(value)
            .ok()
            .and_then(Score::from_level)
            .ok_or_else(|| E::invalid_value(Unexpected::Unsigned(value), &self))
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> std::result::Result<Score, E> {
        u64::try_from(value)
            .map_err(|_| E::invalid_value(Unexpected::Signed(value), &self))
            .and_then(|v| self.visit_u64(v))
    }

    #[allow(clippy::float_arithmetic)]
    fn visit_f64<E: de::Error>(self, value: f64) -> std::result::Result<Score, E> {
        let scaled = (value * f64::from(TENTHS_PER_LEVEL)).round();
        if !scaled.is_finite() || !(0.0..=f64::from(MAX_TENTHS)).contains(&scaled) {
            return Err(E::invalid_value(Unexpected::Float(value), &self));
        }
        Ok(Score(scaled as u16))
    }
}

// =============================================================================
// PILLARS
// =============================================================================

/// One of the five fixed maturity dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Pillar {
    Strategic,
    Operations,
    Technology,
    Data,
    CustomerExperience,
}

impl Pillar {
    /// All pillars in rubric order.
    pub const ALL: [Self; 5] = [
        Self::Strategic,
        Self::Operations,
        Self::Technology,
        Self::Data,
        Self::CustomerExperience,
    ];

    /// Wire name (`customerExperience`, ...).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Strategic => "strategic",
            Self::Operations => "operations",
            Self::Technology => "technology",
            Self::Data => "data",
            Self::CustomerExperience => "customerExperience",
        }
    }
}

impl fmt::Display for Pillar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Pillar {
    type Err = EngineError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|pillar| pillar.as_str() == raw)
            .ok_or_else(|| EngineError::validation(format!("unknown pillar `{raw}`")))
    }
}

// =============================================================================
// ASSESSMENT
// =============================================================================

/// A full five-pillar score sheet. Value object, always embedded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assessment {
    pub strategic: Score,
    pub operations: Score,
    pub technology: Score,
    pub data: Score,
    pub customer_experience: Score,
}

impl Assessment {
    /// All pillars unset.
    pub const UNSET: Self = Self {
        strategic: Score::UNSET,
        operations: Score::UNSET,
        technology: Score::UNSET,
        data: Score::UNSET,
        customer_experience: Score::UNSET,
    };

    /// Build from whole levels in rubric order.
    pub fn from_levels(levels: [u8; 5]) -> crate::Result<Self> {
        let mut assessment = Self::UNSET;
        for (pillar, level) in Pillar::ALL.into_iter().zip(levels) {
            let score = Score::from_level(level).ok_or_else(|| {
                EngineError::validation(format!("{pillar} level {level} is above {MAX_LEVEL}"))
            })?;
            assessment.set(pillar, score);
        }
        Ok(assessment)
    }

    /// Build by evaluating `f` for each pillar.
    pub fn from_fn(mut f: impl FnMut(Pillar) -> Score) -> Self {
        let mut assessment = Self::UNSET;
        for pillar in Pillar::ALL {
            assessment.set(pillar, f(pillar));
        }
        assessment
    }

    #[must_use]
    pub fn get(&self, pillar: Pillar) -> Score {
        match pillar {
            Pillar::Strategic => self.strategic,
            Pillar::Operations => self.operations,
            Pillar::Technology => self.technology,
            Pillar::Data => self.data,
            Pillar::CustomerExperience => self.customer_experience,
        }
    }

    pub fn set(&mut self, pillar: Pillar, score: Score) {
        let slot = match pillar {
            Pillar::Strategic => &mut self.strategic,
            Pillar::Operations => &mut self.operations,
            Pillar::Technology => &mut self.technology,
            Pillar::Data => &mut self.data,
            Pillar::CustomerExperience => &mut self.customer_experience,
        };
        *slot = score;
    }

    /// Pillars with their scores in rubric order.
    pub fn iter(&self) -> impl Iterator<Item = (Pillar, Score)> + '_ {
        Pillar::ALL.into_iter().map(|pillar| (pillar, self.get(pillar)))
    }

    /// True when at least one pillar is above zero.
    #[must_use]
    pub fn has_any_score(&self) -> bool {
        self.iter().any(|(_, score)| score.is_set())
    }

    /// Reject anything that is not a whole level in `min_level..=5`.
    pub fn ensure_whole_levels(&self, min_level: u8) -> crate::Result<()> {
        for (pillar, score) in self.iter() {
            match score.whole_level() {
                Some(level) if level >= min_level => {}
                _ => {
                    return Err(EngineError::validation(format!(
                        "{pillar} must be a whole level between {min_level} and {MAX_LEVEL}, got {score}"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Reject any pillar below `min_level` (fractional values allowed).
    pub fn ensure_at_least(&self, min_level: u8) -> crate::Result<()> {
        let floor = Score::from_level(min_level).unwrap_or(Score::UNSET);
        match self.iter().find(|(_, score)| *score < floor) {
            Some((pillar, score)) => Err(EngineError::validation(format!(
                "{pillar} must be at least {min_level}, got {score}"
            ))),
            None => Ok(()),
        }
    }
}

/// Element-wise mean, each pillar rounded to one decimal.
///
/// Returns `None` for an empty input.
pub fn mean_assessment<'a, I>(assessments: I) -> Option<Assessment>
where
    I: IntoIterator<Item = &'a Assessment>,
{
    let mut sums = [0u64; 5];
    let mut count = 0u64;
    for assessment in assessments {
        for (slot, (_, score)) in sums.iter_mut().zip(assessment.iter()) {
            *slot = slot.saturating_add(u64::from(score.tenths()));
        }
        count = count.saturating_add(1);
    }
    if count == 0 {
        return None;
    }
    let mut pillars = sums.into_iter();
    Some(Assessment::from_fn(|_| {
        Score::mean(pillars.next().unwrap_or(0), count)
    }))
}

// =============================================================================
// ASSESSMENT INPUT
// =============================================================================

/// An incoming assessment where any pillar may be missing.
///
/// Converting with [`AssessmentInput::require_all`] turns a missing pillar
/// into a validation error instead of silently defaulting it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AssessmentInput {
    pub strategic: Option<Score>,
    pub operations: Option<Score>,
    pub technology: Option<Score>,
    pub data: Option<Score>,
    pub customer_experience: Option<Score>,
}

impl AssessmentInput {
    fn get(&self, pillar: Pillar) -> Option<Score> {
        match pillar {
            Pillar::Strategic => self.strategic,
            Pillar::Operations => self.operations,
            Pillar::Technology => self.technology,
            Pillar::Data => self.data,
            Pillar::CustomerExperience => self.customer_experience,
        }
    }

    /// Every pillar must be present.
    pub fn require_all(&self) -> crate::Result<Assessment> {
        if let Some(missing) = Pillar::ALL.into_iter().find(|p| self.get(*p).is_none()) {
            return Err(EngineError::validation(format!(
                "assessment is missing required pillar `{missing}`"
            )));
        }
        Ok(Assessment::from_fn(|pillar| {
            self.get(pillar).unwrap_or(Score::UNSET)
        }))
    }

    /// Missing pillars become unset.
    #[must_use]
    pub fn or_unset(&self) -> Assessment {
        Assessment::from_fn(|pillar| self.get(pillar).unwrap_or(Score::UNSET))
    }
}

impl From<Assessment> for AssessmentInput {
    fn from(assessment: Assessment) -> Self {
        Self {
            strategic: Some(assessment.strategic),
            operations: Some(assessment.operations),
            technology: Some(assessment.technology),
            data: Some(assessment.data),
            customer_experience: Some(assessment.customer_experience),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::float_arithmetic)]

    use super::*;

    fn levels(values: [u8; 5]) -> Assessment {
        Assessment::from_levels(values).unwrap()
    }

    #[test]
    fn mean_of_three_and_four_is_three_point_five() {
        let mean = mean_assessment(&[levels([3, 3, 3, 3, 3]), levels([4, 4, 4, 4, 4])]).unwrap();
        assert_eq!(mean.strategic.tenths(), 35);
        assert_eq!(mean.customer_experience.one_decimal(), "3.5");
    }

    #[test]
    fn mean_of_three_three_four_rounds_to_three_point_three() {
        let mean = mean_assessment(&[
            levels([3, 1, 1, 1, 1]),
            levels([3, 1, 1, 1, 1]),
            levels([4, 1, 1, 1, 1]),
        ])
        .unwrap();
        assert_eq!(mean.strategic.tenths(), 33);
    }

    #[test]
    fn halves_round_away_from_zero() {
        // 3.25 and 3.35 style midpoints: (32 + 33) / 2 = 32.5 -> 33
        assert_eq!(rounded_mean(65, 2), 33);
        assert_eq!(rounded_mean(15, 2), 8);
        assert_eq!(rounded_mean(14, 2), 7);
    }

    #[test]
    fn mean_of_nothing_is_none() {
        assert!(mean_assessment(std::iter::empty()).is_none());
        assert_eq!(rounded_mean(10, 0), 0);
    }

    #[test]
    fn json_uses_plain_numbers() {
        let mut assessment = levels([2, 3, 2, 3, 2]);
        assessment.data = Score::from_tenths(35).unwrap();
        let json = serde_json::to_value(assessment).unwrap();
        assert_eq!(json["strategic"], serde_json::json!(2));
        assert_eq!(json["data"].as_f64(), Some(3.5));
        assert!(json.get("customerExperience").is_some());
    }

    #[test]
    fn json_accepts_integers_and_decimals() {
        let parsed: Assessment = serde_json::from_str(
            r#"{"strategic":3,"operations":3.5,"technology":0,"data":5,"customerExperience":1.0}"#,
        )
        .unwrap();
        assert_eq!(parsed.operations.tenths(), 35);
        assert_eq!(parsed.customer_experience.whole_level(), Some(1));
        assert!(!parsed.technology.is_set());
    }

    #[test]
    fn json_rejects_out_of_range_levels() {
        assert!(serde_json::from_str::<Score>("6").is_err());
        assert!(serde_json::from_str::<Score>("-1").is_err());
        assert!(serde_json::from_str::<Score>("5.2").is_err());
    }

    #[test]
    fn postcard_stores_raw_tenths() {
        let score = Score::from_tenths(33).unwrap();
        let bytes = postcard::to_stdvec(&score).unwrap();
        let restored: Score = postcard::from_bytes(&bytes).unwrap();
        assert_eq!(restored, score);
    }

    #[test]
    fn missing_pillar_is_a_validation_error() {
        let input: AssessmentInput =
            serde_json::from_str(r#"{"strategic":3,"operations":3,"technology":3,"data":3}"#)
                .unwrap();
        let error = input.require_all().unwrap_err();
        assert!(error.to_string().contains("customerExperience"));
        assert_eq!(input.or_unset().customer_experience, Score::UNSET);
    }

    #[test]
    fn whole_level_check_rejects_fractions_and_zero() {
        let mut assessment = levels([1, 2, 3, 4, 5]);
        assert!(assessment.ensure_whole_levels(MIN_LEVEL).is_ok());
        assessment.data = Score::from_tenths(25).unwrap();
        assert!(assessment.ensure_whole_levels(MIN_LEVEL).is_err());
        assert!(levels([0, 2, 3, 4, 5]).ensure_whole_levels(MIN_LEVEL).is_err());
        assert!(levels([0, 2, 3, 4, 5]).ensure_whole_levels(0).is_ok());
    }

    #[test]
    fn nearest_level_rounds_halves_up() {
        assert_eq!(Score::from_tenths(34).unwrap().nearest_level(), 3);
        assert_eq!(Score::from_tenths(35).unwrap().nearest_level(), 4);
        assert_eq!(Score::UNSET.nearest_level(), 0);
    }

    #[test]
    fn pillar_names_round_trip() {
        for pillar in Pillar::ALL {
            assert_eq!(pillar.as_str().parse::<Pillar>().unwrap(), pillar);
        }
        assert!("culture".parse::<Pillar>().is_err());
    }
}
