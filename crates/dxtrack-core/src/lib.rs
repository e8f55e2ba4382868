//! # dxtrack-core
//!
//! The Evaluation Scoring & Stage Engine.
//!
//! This crate owns every rule that decides what an evaluation's score *is*:
//!
//! - which of the self, committee and final assessments is authoritative
//!   ([`scoring`]),
//! - how individual evaluator scores merge into the committee average
//!   ([`committee`]),
//! - when an evaluation moves between pipeline stages ([`stage`]),
//! - how scores roll up per department, per sector and for the dashboard
//!   ([`rollup`]).
//!
//! Persistence is injected through the [`storage::Repository`] trait and the
//! [`engine::Engine`] drives every operation over it. Nothing in this crate
//! performs network I/O or holds global state.
//!
//! ## Determinism
//!
//! Scores are integer tenths ([`Score`]). All averaging is integer
//! arithmetic with round-half-away-from-zero, so the same inputs always yield
//! the same one-decimal figures regardless of summation order.

pub mod committee;
pub mod engine;
pub mod error;
pub mod formats;
pub mod model;
pub mod roadmap;
pub mod rollup;
pub mod rubric;
pub mod score;
pub mod scoring;
pub mod stage;
pub mod storage;
pub mod submission;

pub use engine::Engine;
pub use error::{EngineError, EntityKind, Result};
pub use model::{
    Department, Evaluation, EvaluatorAssessment, Project, Role, StageId, User,
};
pub use rubric::Config;
pub use score::{Assessment, AssessmentInput, Pillar, Score};
pub use scoring::{get_active_score, should_include_in_aggregates};

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// IDENTIFIERS
// =============================================================================

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Wrap a raw identifier.
            pub fn new(raw: impl Into<String>) -> Self {
                Self(raw.into())
            }

            /// Borrow the raw identifier.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(raw: &str) -> Self {
                Self(raw.to_string())
            }
        }

        impl From<String> for $name {
            fn from(raw: String) -> Self {
                Self(raw)
            }
        }
    };
}

string_id!(
    /// Identifier of a [`User`] (admin or evaluator).
    UserId
);
string_id!(
    /// Identifier of a [`Project`].
    ProjectId
);
string_id!(
    /// Identifier of a [`Department`].
    DepartmentId
);
string_id!(
    /// Identifier of an [`Evaluation`].
    EvaluationId
);
string_id!(
    /// Identifier of an external survey submission.
    SubmissionId
);
