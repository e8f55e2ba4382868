//! # Roadmap Prompt
//!
//! Builds the chat prompt for the improvement roadmap. The network call lives
//! in the app; this module only turns an evaluation into text.

use crate::ProjectId;
use crate::rubric::Config;
use crate::score::{Assessment, Pillar, Score};
use serde::{Deserialize, Serialize};

/// How many low-scoring pillars the prompt singles out.
pub const WEAKEST_PILLARS: usize = 3;

const SYSTEM_PROMPT: &str = "You are a digital transformation advisor specialised in the \
government and enterprise sector in Saudi Arabia. You give practical, specific \
recommendations in Arabic.";

/// Everything needed to write a roadmap for one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoadmapRequest {
    pub project_id: ProjectId,
    pub project_name: String,
    pub department_name: String,
    pub program_manager: String,
    pub self_assessment: Assessment,
    pub committee_assessment: Option<Assessment>,
}

impl RoadmapRequest {
    /// Committee scores when present, otherwise the self-assessment.
    #[must_use]
    pub fn basis(&self) -> &Assessment {
        self.committee_assessment
            .as_ref()
            .unwrap_or(&self.self_assessment)
    }
}

/// A system/user message pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoadmapPrompt {
    pub system: String,
    pub user: String,
}

/// Pillars sorted by ascending score, ties in rubric order.
#[must_use]
pub fn weakest_pillars(assessment: &Assessment, count: usize) -> Vec<(Pillar, Score)> {
    let mut pillars: Vec<(Pillar, Score)> = assessment.iter().collect();
    pillars.sort_by_key(|(_, score)| *score);
    pillars.truncate(count);
    pillars
}

fn current_level(config: &Config, pillar: Pillar, score: Score) -> String {
    config
        .level_description(pillar, score.nearest_level())
        .map_or_else(|| "not assessed".to_string(), str::to_string)
}

#[must_use]
pub fn build_roadmap_prompt(request: &RoadmapRequest, config: &Config) -> RoadmapPrompt {
    let assessment = request.basis();

    let results: Vec<String> = assessment
        .iter()
        .map(|(pillar, score)| {
            format!(
                "- {}: {score}/5 ({})",
                config.pillar_name(pillar),
                current_level(config, pillar, score)
            )
        })
        .collect();

    let weakest: Vec<String> = weakest_pillars(assessment, WEAKEST_PILLARS)
        .into_iter()
        .enumerate()
        .map(|(rank, (pillar, score))| {
            format!("{}. {} ({score}/5)", rank + 1, config.pillar_name(pillar))
        })
        .collect();

    let user = format!(
        "Based on the following digital transformation maturity assessment of the project \
\"{name}\" in {department}, prepare an improvement roadmap.\n\n\
## Current assessment results:\n{results}\n\n\
## Weakest pillars needing focus:\n{weakest}\n\n\
## Required:\n\
Write a concise, practical roadmap for the next 6-12 months covering:\n\
1. **Quick wins (1-3 months)**: immediate, low-effort, high-impact actions\n\
2. **Medium-term initiatives (3-6 months)**: moderate development projects\n\
3. **Strategic transformations (6-12 months)**: fundamental long-term changes\n\n\
For each recommendation state:\n\
- the target pillar\n\
- the required action\n\
- the expected level after implementation\n\n\
Write in Markdown and keep the recommendations specific and actionable.",
        name = request.project_name,
        department = request.department_name,
        results = results.join("\n"),
        weakest = weakest.join("\n"),
    );

    RoadmapPrompt {
        system: SYSTEM_PROMPT.to_string(),
        user,
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn request(committee: Option<[u8; 5]>) -> RoadmapRequest {
        RoadmapRequest {
            project_id: "proj_1".into(),
            project_name: "Citizen Portal".into(),
            department_name: "Municipal Services".into(),
            program_manager: "Sara".into(),
            self_assessment: Assessment::from_levels([5, 5, 5, 5, 5]).unwrap(),
            committee_assessment: committee.map(|l| Assessment::from_levels(l).unwrap()),
        }
    }

    #[test]
    fn committee_scores_take_priority() {
        let prompt = build_roadmap_prompt(&request(Some([2, 4, 1, 3, 5])), &Config::default());
        assert!(prompt.user.contains("- Strategic: 2/5 (A plan exists but is not linked to project goals)"));
        assert!(prompt.user.contains("1. Technology & Tools (1/5)"));
        assert!(prompt.user.contains("2. Strategic (2/5)"));
        assert!(prompt.user.contains("3. Data & Analytics (3/5)"));
        assert!(!prompt.user.contains("4. "));
    }

    #[test]
    fn self_assessment_used_without_committee() {
        let prompt = build_roadmap_prompt(&request(None), &Config::default());
        assert!(prompt.user.contains("Strategic: 5/5"));
        assert!(prompt.user.contains("\"Citizen Portal\" in Municipal Services"));
        assert!(prompt.user.contains("Quick wins (1-3 months)"));
        assert!(prompt.system.contains("digital transformation advisor"));
    }

    #[test]
    fn weakest_ties_keep_rubric_order() {
        let a = Assessment::from_levels([3, 1, 3, 1, 3]).unwrap();
        let pillars: Vec<Pillar> = weakest_pillars(&a, 3).into_iter().map(|(p, _)| p).collect();
        assert_eq!(
            pillars,
            vec![Pillar::Operations, Pillar::CustomerExperience, Pillar::Strategic]
        );
    }

    #[test]
    fn fractional_committee_scores_are_shown_with_one_decimal() {
        let mut req = request(None);
        let mut committee = Assessment::from_levels([3, 3, 3, 3, 3]).unwrap();
        committee.data = Score::from_tenths(35).unwrap();
        req.committee_assessment = Some(committee);
        let prompt = build_roadmap_prompt(&req, &Config::default());
        assert!(prompt.user.contains("Data & Analytics: 3.5/5 (Predictive analytics and KPIs)"));
    }
}
