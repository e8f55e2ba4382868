//! # Rubric Configuration
//!
//! The editable description of the maturity rubric: pillar names and level
//! descriptors, the pipeline stages with their display order and colour, and
//! the evaluator departments offered in the user admin screen.
//!
//! [`Config::default`] carries the production rubric. Scoring never reads
//! this: the five pillars and six stages are closed enums. The config only
//! feeds labels, pipeline ordering and the roadmap prompt.

use crate::error::{EngineError, Result};
use crate::model::StageId;
use crate::score::{MAX_LEVEL, MIN_LEVEL, Pillar};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelDescriptor {
    pub level: u8,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PillarConfig {
    pub id: Pillar,
    pub name: String,
    pub name_en: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub levels: Vec<LevelDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageConfig {
    pub id: StageId,
    pub name: String,
    pub order: u8,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluatorDepartment {
    pub id: String,
    pub name: String,
}

/// The full rubric document served at `/api/config`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub pillars: Vec<PillarConfig>,
    pub stages: Vec<StageConfig>,
    #[serde(default)]
    pub evaluator_departments: Vec<EvaluatorDepartment>,
}

impl Config {
    #[must_use]
    pub fn pillar(&self, pillar: Pillar) -> Option<&PillarConfig> {
        self.pillars.iter().find(|entry| entry.id == pillar)
    }

    /// English display name, falling back to the wire id.
    #[must_use]
    pub fn pillar_name(&self, pillar: Pillar) -> &str {
        self.pillar(pillar)
            .map(|entry| entry.name_en.as_str())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| pillar.as_str())
    }

    /// Descriptor text for `level` of `pillar`, if configured.
    #[must_use]
    pub fn level_description(&self, pillar: Pillar, level: u8) -> Option<&str> {
        self.pillar(pillar)?
            .levels
            .iter()
            .find(|descriptor| descriptor.level == level)
            .map(|descriptor| descriptor.description.as_str())
    }

    /// Stages sorted by their display order.
    #[must_use]
    pub fn ordered_stages(&self) -> Vec<&StageConfig> {
        let mut stages: Vec<&StageConfig> = self.stages.iter().collect();
        stages.sort_by_key(|stage| stage.order);
        stages
    }

    /// Structural checks applied before a replacement config is stored.
    ///
    /// Every pillar appears exactly once, levels stay within 1..=5, and
    /// stage ids are unique.
    pub fn validate(&self) -> Result<()> {
        let mut seen = BTreeSet::new();
        for entry in &self.pillars {
            if !seen.insert(entry.id) {
                return Err(EngineError::validation(format!(
                    "pillar `{}` is configured twice",
                    entry.id
                )));
            }
            if let Some(bad) = entry
                .levels
                .iter()
                .find(|d| !(MIN_LEVEL..=MAX_LEVEL).contains(&d.level))
            {
                return Err(EngineError::validation(format!(
                    "pillar `{}` has level {} outside {MIN_LEVEL}..={MAX_LEVEL}",
                    entry.id, bad.level
                )));
            }
        }
        if let Some(missing) = Pillar::ALL.into_iter().find(|p| !seen.contains(p)) {
            return Err(EngineError::validation(format!(
                "pillar `{missing}` is not configured"
            )));
        }

        let mut stage_ids = BTreeSet::new();
        for stage in &self.stages {
            if !stage_ids.insert(stage.id) {
                return Err(EngineError::validation(format!(
                    "stage `{}` is configured twice",
                    stage.id
                )));
            }
        }
        Ok(())
    }
}

// =============================================================================
// DEFAULT RUBRIC
// =============================================================================

const LEVEL_NAMES: [&str; 5] = ["Initial", "Developing", "Defined", "Managed", "Optimised"];

fn pillar(
    id: Pillar,
    name: &str,
    name_en: &str,
    description: &str,
    levels: [&str; 5],
) -> PillarConfig {
    PillarConfig {
        id,
        name: name.to_string(),
        name_en: name_en.to_string(),
        description: description.to_string(),
        levels: (1u8..)
            .zip(LEVEL_NAMES.iter().zip(levels))
            .map(|(level, (name, description))| LevelDescriptor {
                level,
                name: (*name).to_string(),
                description: description.to_string(),
            })
            .collect(),
    }
}

fn stage(id: StageId, name: &str, order: u8, color: &str) -> StageConfig {
    StageConfig {
        id,
        name: name.to_string(),
        order,
        color: color.to_string(),
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pillars: vec![
                pillar(
                    Pillar::Strategic,
                    "البعد الاستراتيجي",
                    "Strategic",
                    "Digital vision, planning and alignment with project goals",
                    [
                        "Separate digital initiatives without a strategic plan",
                        "A plan exists but is not linked to project goals",
                        "A roadmap linked to some of the project goals",
                        "An integrated plan with periodic follow-up",
                        "A sustainable strategic direction with impact measurement",
                    ],
                ),
                pillar(
                    Pillar::Operations,
                    "العمليات الرقمية",
                    "Digital Operations",
                    "Digitisation and automation of working procedures",
                    [
                        "Manual, paper-based procedures",
                        "Digital forms and limited tools",
                        "Unified processes across systems",
                        "End-to-end integrated automation",
                        "AI-supported operations",
                    ],
                ),
                pillar(
                    Pillar::Technology,
                    "التقنيات والأدوات",
                    "Technology & Tools",
                    "Systems, platforms and integration",
                    [
                        "Legacy systems and reliance on spreadsheets",
                        "Separate digital tools that are not integrated",
                        "Integrated solutions (ERP/CRM)",
                        "Cloud technologies and APIs",
                        "A smart ecosystem with AI and IoT",
                    ],
                ),
                pillar(
                    Pillar::Data,
                    "البيانات والتحليلات",
                    "Data & Analytics",
                    "Data management, reporting and analytics",
                    [
                        "Scattered, inconsistent data",
                        "A central data warehouse",
                        "Basic reports and dashboards",
                        "Predictive analytics and KPIs",
                        "AI-supported prescriptive analytics",
                    ],
                ),
                pillar(
                    Pillar::CustomerExperience,
                    "تجربة العملاء وأصحاب المصلحة",
                    "Customer Experience",
                    "Service channels and stakeholder engagement",
                    [
                        "Manual communication and limited services",
                        "Separate digital channels",
                        "Multichannel service",
                        "Personalised service and self-service portals",
                        "Proactive service with AI and chatbots",
                    ],
                ),
            ],
            stages: vec![
                stage(StageId::Pending, "Pending", 1, "#94a3b8"),
                stage(StageId::SelfSubmitted, "Self-assessment submitted", 2, "#3b82f6"),
                stage(StageId::UnderReview, "Under review", 3, "#f59e0b"),
                stage(StageId::CommitteeEvaluated, "Committee evaluated", 4, "#8b5cf6"),
                stage(StageId::SummitReviewed, "Summit reviewed", 5, "#06b6d4"),
                stage(StageId::Completed, "Completed", 6, "#22c55e"),
            ],
            evaluator_departments: vec![
                EvaluatorDepartment {
                    id: "digital_transformation".to_string(),
                    name: "Digital Transformation Office".to_string(),
                },
                EvaluatorDepartment {
                    id: "strategy".to_string(),
                    name: "Strategy Management".to_string(),
                },
                EvaluatorDepartment {
                    id: "it".to_string(),
                    name: "Information Technology".to_string(),
                },
            ],
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

    #[test]
    fn default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.stages.len(), StageId::ALL.len());
    }

    #[test]
    fn level_lookup() {
        let config = Config::default();
        assert_eq!(
            config.level_description(Pillar::Technology, 3),
            Some("Integrated solutions (ERP/CRM)")
        );
        assert_eq!(config.level_description(Pillar::Technology, 0), None);
        assert_eq!(config.pillar_name(Pillar::Data), "Data & Analytics");
    }

    #[test]
    fn ordered_stages_follow_order_field() {
        let mut config = Config::default();
        config.stages.reverse();
        let ids: Vec<StageId> = config.ordered_stages().iter().map(|s| s.id).collect();
        assert_eq!(ids, StageId::ALL.to_vec());
    }

    #[test]
    fn validate_rejects_missing_pillar_and_bad_levels() {
        let mut config = Config::default();
        config.pillars.pop();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.pillars[0].levels[0].level = 9;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        let first = config.stages[0].clone();
        config.stages.push(first);
        assert!(config.validate().is_err());
    }

    #[test]
    fn config_json_uses_camel_case() {
        let json = serde_json::to_value(Config::default()).unwrap();
        assert!(json.get("evaluatorDepartments").is_some());
        assert_eq!(json["pillars"][4]["id"], "customerExperience");
        assert_eq!(json["stages"][2]["id"], "under_review");
    }
}
