//! # Survey Submissions
//!
//! The external survey feed returns one record per filled-in form: an id, a
//! creation time and a map from question text to answer text. Question texts
//! are the survey's literal wire keys, so they live in [`SubmissionSchema`]
//! rather than in code.
//!
//! Level answers start with the level digit ("3 - Roadmap linked to ...").
//! Anything unparseable or outside 0..=5 reads as 0 (not submitted).

use crate::model::{Evaluation, Project};
use crate::score::{Assessment, MAX_LEVEL, Pillar, Score};
use crate::SubmissionId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// One record as delivered by the feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSubmission {
    pub id: SubmissionId,
    #[serde(default)]
    pub creation_time: String,
    #[serde(default)]
    pub result: BTreeMap<String, String>,
}

/// Envelope of a feed response (and of the on-disk snapshot).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedPage {
    #[serde(default)]
    pub results: Vec<RawSubmission>,
}

/// Question texts used to read a [`RawSubmission`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionSchema {
    pub project_name: String,
    pub program_manager: String,
    pub representative: String,
    pub email: String,
    /// Level question per pillar.
    pub levels: BTreeMap<Pillar, String>,
    pub strategic_comment: String,
    pub operations_comment: String,
    pub overall_comment: String,
}

const LEVEL_QUESTION_PREFIX: &str = "أي من الأوصاف التالية يعكس وضع مشروعكم الحالي في";

fn level_question(dimension: &str) -> String {
    format!("{LEVEL_QUESTION_PREFIX} <b>{dimension}</b>؟")
}

impl Default for SubmissionSchema {
    fn default() -> Self {
        let levels = [
            (Pillar::Strategic, "البعد الاستراتيجي"),
            (Pillar::Operations, "العمليات الرقمية"),
            (Pillar::Technology, "التقنيات والأدوات"),
            (Pillar::Data, "البيانات والتحليلات"),
            (Pillar::CustomerExperience, "تجربة العملاء وأصحاب المصلحة"),
        ]
        .into_iter()
        .map(|(pillar, dimension)| (pillar, level_question(dimension)))
        .collect();

        Self {
            project_name: "اسم المشروع".to_string(),
            program_manager: "مدير البرنامج".to_string(),
            representative: "ممثل المشروع".to_string(),
            email: "البريد الإلكتروني للتواصل".to_string(),
            levels,
            strategic_comment:
                "لماذا اخترتم هذا الوصف؟ يرجى توضيح أمثلة أو ممارسات تعكس الوضع الحالي."
                    .to_string(),
            operations_comment: "لماذا اخترتم هذا الوصف؟".to_string(),
            overall_comment: "هل لديكم أي ملاحظات إضافية حول مقياس النضج أو طريقة التقييم؟"
                .to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionComments {
    pub strategic: String,
    pub operations: String,
    pub overall: String,
}

/// A submission read through the schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedSubmission {
    pub id: SubmissionId,
    pub project_name: String,
    pub program_manager: String,
    pub representative: String,
    pub email: String,
    pub created_at: String,
    pub scores: Assessment,
    pub comments: SubmissionComments,
    /// True once a project or evaluation carries this submission id.
    pub mapped: bool,
}

/// Leading integer of `answer`, or 0. Values outside 0..=5 also give 0.
#[must_use]
pub fn parse_level(answer: &str) -> u8 {
    let digits: String = answer
        .trim_start()
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits
        .parse::<u8>()
        .ok()
        .filter(|level| *level <= MAX_LEVEL)
        .unwrap_or(0)
}

/// Read one raw record. `mapped` is left false.
#[must_use]
pub fn parse_submission(raw: &RawSubmission, schema: &SubmissionSchema) -> ParsedSubmission {
    let answer = |question: &str| raw.result.get(question).cloned().unwrap_or_default();
    let scores = Assessment::from_fn(|pillar| {
        schema
            .levels
            .get(&pillar)
            .and_then(|question| raw.result.get(question))
            .and_then(|text| Score::from_level(parse_level(text)))
            .unwrap_or(Score::UNSET)
    });

    ParsedSubmission {
        id: raw.id.clone(),
        project_name: answer(&schema.project_name),
        program_manager: answer(&schema.program_manager),
        representative: answer(&schema.representative),
        email: answer(&schema.email),
        created_at: raw.creation_time.clone(),
        scores,
        comments: SubmissionComments {
            strategic: answer(&schema.strategic_comment),
            operations: answer(&schema.operations_comment),
            overall: answer(&schema.overall_comment),
        },
        mapped: false,
    }
}

/// Submission ids already attached to a project or evaluation.
#[must_use]
pub fn mapped_submission_ids<'a>(
    projects: &'a [Project],
    evaluations: &'a [Evaluation],
) -> BTreeSet<&'a SubmissionId> {
    projects
        .iter()
        .filter_map(|p| p.submission_id.as_ref())
        .chain(evaluations.iter().filter_map(|e| e.submission_id.as_ref()))
        .collect()
}

/// Parse every record with a non-empty project name and flag mapped ones.
#[must_use]
pub fn list_submissions(
    raw: &[RawSubmission],
    schema: &SubmissionSchema,
    projects: &[Project],
    evaluations: &[Evaluation],
) -> Vec<ParsedSubmission> {
    let mapped = mapped_submission_ids(projects, evaluations);
    raw.iter()
        .filter(|record| {
            record
                .result
                .get(&schema.project_name)
                .is_some_and(|name| !name.is_empty())
        })
        .map(|record| ParsedSubmission {
            mapped: mapped.contains(&record.id),
            ..parse_submission(record, schema)
        })
        .collect()
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use chrono::Utc;

    fn raw(id: &str, answers: &[(&str, &str)]) -> RawSubmission {
        RawSubmission {
            id: id.into(),
            creation_time: "2025-01-05T10:00:00Z".into(),
            result: answers
                .iter()
                .map(|(q, a)| ((*q).to_string(), (*a).to_string()))
                .collect(),
        }
    }

    fn full_record(id: &str, name: &str) -> RawSubmission {
        let schema = SubmissionSchema::default();
        let mut record = raw(id, &[]);
        record.result.insert(schema.project_name.clone(), name.into());
        record.result.insert(schema.email.clone(), "pm@example.org".into());
        for (pillar, answer) in Pillar::ALL.into_iter().zip(["3", "2 - forms", "x", "7", " 4"]) {
            record
                .result
                .insert(schema.levels[&pillar].clone(), answer.into());
        }
        record
    }

    #[test]
    fn level_parsing_mirrors_leading_integer() {
        assert_eq!(parse_level("3"), 3);
        assert_eq!(parse_level(" 4 - cloud"), 4);
        assert_eq!(parse_level("abc"), 0);
        assert_eq!(parse_level(""), 0);
        assert_eq!(parse_level("9"), 0);
        assert_eq!(parse_level("-2"), 0);
    }

    #[test]
    fn parse_reads_scores_through_the_schema() {
        let parsed = parse_submission(&full_record("s1", "Portal"), &SubmissionSchema::default());
        assert_eq!(parsed.project_name, "Portal");
        assert_eq!(parsed.email, "pm@example.org");
        assert_eq!(parsed.scores, Assessment::from_levels([3, 2, 0, 0, 4]).unwrap());
        assert_eq!(parsed.program_manager, "");
    }

    #[test]
    fn default_schema_uses_survey_question_text() {
        let schema = SubmissionSchema::default();
        assert_eq!(
            schema.levels[&Pillar::Data],
            "أي من الأوصاف التالية يعكس وضع مشروعكم الحالي في <b>البيانات والتحليلات</b>؟"
        );
    }

    #[test]
    fn list_drops_unnamed_and_flags_mapped() {
        let schema = SubmissionSchema::default();
        let records = vec![
            full_record("s1", "Portal"),
            raw("s2", &[("unrelated", "x")]),
            full_record("s3", ""),
            full_record("s4", "Billing"),
        ];
        let mut evaluation = Evaluation::new("eval_1".into(), "proj_1".into(), Utc::now());
        evaluation.submission_id = Some("s4".into());

        let listed = list_submissions(&records, &schema, &[], &[evaluation]);
        let ids: Vec<&str> = listed.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["s1", "s4"]);
        assert!(!listed[0].mapped);
        assert!(listed[1].mapped);
    }

    #[test]
    fn feed_page_tolerates_missing_results() {
        let page: FeedPage = serde_json::from_str("{}").unwrap();
        assert!(page.results.is_empty());
        let page: FeedPage = serde_json::from_str(
            r#"{"results":[{"id":"s1","creationTime":"t","result":{"a":"b"}}]}"#,
        )
        .unwrap();
        assert_eq!(page.results[0].result["a"], "b");
    }
}
