//! # Storage Module
//!
//! The [`Repository`] trait is the only way the engine touches records.
//!
//! Two backends:
//! - [`MemoryStore`]: `BTreeMap`s behind a `RwLock`, for tests and
//!   ephemeral runs;
//! - [`RedbStore`]: redb embedded database (ACID transactions, crash-safe
//!   copy-on-write B-trees, MVCC readers with a single writer).
//!
//! All methods take `&self`; each backend provides its own interior
//! mutability so one store can be shared across request handlers.
//!
//! ## Atomicity
//!
//! [`Repository::modify_evaluation`] runs its closure inside one exclusive
//! write. Two concurrent evaluator submissions on the same evaluation are
//! applied one after the other, never interleaved.

mod memory;
mod redb_store;

pub use memory::MemoryStore;
pub use redb_store::RedbStore;

use crate::error::{EntityKind, Result};
use crate::model::{Department, Evaluation, Project, User};
use crate::rubric::Config;
use crate::{DepartmentId, EvaluationId, ProjectId, UserId};

/// Closure applied by [`Repository::modify_evaluation`].
///
/// Returning an error discards every change made to the record.
pub type EvaluationUpdate<'a> = dyn FnMut(&mut Evaluation) -> Result<()> + 'a;

/// Record store used by the [`Engine`](crate::Engine).
pub trait Repository: Send + Sync {
    // -- users ---------------------------------------------------------------
    fn list_users(&self) -> Result<Vec<User>>;
    fn get_user(&self, id: &UserId) -> Result<Option<User>>;
    /// Insert or replace.
    fn put_user(&self, user: &User) -> Result<()>;
    /// Returns false when nothing was stored under `id`.
    fn delete_user(&self, id: &UserId) -> Result<bool>;

    // -- departments -----------------------------------------------------------
    fn list_departments(&self) -> Result<Vec<Department>>;
    fn get_department(&self, id: &DepartmentId) -> Result<Option<Department>>;
    fn put_department(&self, department: &Department) -> Result<()>;

    // -- projects --------------------------------------------------------------
    fn list_projects(&self) -> Result<Vec<Project>>;
    fn get_project(&self, id: &ProjectId) -> Result<Option<Project>>;
    fn put_project(&self, project: &Project) -> Result<()>;
    /// Remove the project together with its evaluation, in one write.
    fn delete_project(&self, id: &ProjectId) -> Result<Option<Project>>;

    // -- evaluations -----------------------------------------------------------
    fn list_evaluations(&self) -> Result<Vec<Evaluation>>;
    fn get_evaluation(&self, id: &EvaluationId) -> Result<Option<Evaluation>>;
    fn find_evaluation_by_project(&self, project: &ProjectId) -> Result<Option<Evaluation>>;
    /// Store a new evaluation.
    ///
    /// Fails with `Validation` if the id is taken or the project already has
    /// an evaluation.
    fn insert_evaluation(&self, evaluation: &Evaluation) -> Result<()>;
    /// Atomic read-modify-write. `NotFound` if the id is unknown.
    fn modify_evaluation(
        &self,
        id: &EvaluationId,
        update: &mut EvaluationUpdate<'_>,
    ) -> Result<Evaluation>;

    // -- config ------------------------------------------------------------------
    /// The stored rubric, or `None` before one was ever saved.
    fn get_config(&self) -> Result<Option<Config>>;
    fn put_config(&self, config: &Config) -> Result<()>;

    // -- ids ---------------------------------------------------------------------
    /// Next value of the per-prefix id sequence (starts at 1).
    fn next_sequence(&self, kind: EntityKind) -> Result<u64>;
}
