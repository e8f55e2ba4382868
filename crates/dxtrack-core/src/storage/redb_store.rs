//! redb backend.
//!
//! Layout:
//! - one `&str -> &[u8]` table per record kind, values postcard-encoded;
//! - `evaluation_by_project` (`&str -> &str`) keeps evaluations unique per
//!   project;
//! - `sequences` (`&str -> u64`) issues ids per prefix;
//! - `meta` holds the rubric config under the `config` key.
//!
//! Every table is created when the database is opened, so read
//! transactions never hit a missing table.

use super::{EvaluationUpdate, Repository};
use crate::error::{EngineError, EntityKind, Result};
use crate::model::{Department, Evaluation, Project, User};
use crate::rubric::Config;
use crate::{DepartmentId, EvaluationId, ProjectId, UserId};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;

type RecordTable = TableDefinition<'static, &'static str, &'static [u8]>;

const USERS: RecordTable = TableDefinition::new("users");
const DEPARTMENTS: RecordTable = TableDefinition::new("departments");
const PROJECTS: RecordTable = TableDefinition::new("projects");
const EVALUATIONS: RecordTable = TableDefinition::new("evaluations");
const META: RecordTable = TableDefinition::new("meta");
const EVALUATION_BY_PROJECT: TableDefinition<&str, &str> =
    TableDefinition::new("evaluation_by_project");
const SEQUENCES: TableDefinition<&str, u64> = TableDefinition::new("sequences");

const CONFIG_KEY: &str = "config";

/// redb-backed [`Repository`].
pub struct RedbStore {
    db: Database,
}

impl std::fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStore").finish_non_exhaustive()
    }
}

impl RedbStore {
    /// Open or create the database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = Database::create(path.as_ref())?;
        let txn = db.begin_write()?;
        {
            for table in [USERS, DEPARTMENTS, PROJECTS, EVALUATIONS, META] {
                txn.open_table(table)?;
            }
            txn.open_table(EVALUATION_BY_PROJECT)?;
            txn.open_table(SEQUENCES)?;
        }
        txn.commit()?;
        Ok(Self { db })
    }

    fn read_all<T: DeserializeOwned>(&self, definition: RecordTable) -> Result<Vec<T>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(definition)?;
        let mut records = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            records.push(postcard::from_bytes(value.value())?);
        }
        Ok(records)
    }

    fn read_one<T: DeserializeOwned>(&self, definition: RecordTable, key: &str) -> Result<Option<T>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(definition)?;
        let record = match table.get(key)? {
            Some(value) => Some(postcard::from_bytes(value.value())?),
            None => None,
        };
        Ok(record)
    }

    fn write_one<T: Serialize>(&self, definition: RecordTable, key: &str, record: &T) -> Result<()> {
        let bytes = postcard::to_stdvec(record)?;
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(definition)?;
            table.insert(key, bytes.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }
}

impl Repository for RedbStore {
    fn list_users(&self) -> Result<Vec<User>> {
        self.read_all(USERS)
    }

    fn get_user(&self, id: &UserId) -> Result<Option<User>> {
        self.read_one(USERS, id.as_str())
    }

    fn put_user(&self, user: &User) -> Result<()> {
        self.write_one(USERS, user.id.as_str(), user)
    }

    fn delete_user(&self, id: &UserId) -> Result<bool> {
        let txn = self.db.begin_write()?;
        let removed = {
            let mut table = txn.open_table(USERS)?;
            table.remove(id.as_str())?.is_some()
        };
        txn.commit()?;
        Ok(removed)
    }

    fn list_departments(&self) -> Result<Vec<Department>> {
        self.read_all(DEPARTMENTS)
    }

    fn get_department(&self, id: &DepartmentId) -> Result<Option<Department>> {
        self.read_one(DEPARTMENTS, id.as_str())
    }

    fn put_department(&self, department: &Department) -> Result<()> {
        self.write_one(DEPARTMENTS, department.id.as_str(), department)
    }

    fn list_projects(&self) -> Result<Vec<Project>> {
        self.read_all(PROJECTS)
    }

    fn get_project(&self, id: &ProjectId) -> Result<Option<Project>> {
        self.read_one(PROJECTS, id.as_str())
    }

    fn put_project(&self, project: &Project) -> Result<()> {
        self.write_one(PROJECTS, project.id.as_str(), project)
    }

    fn delete_project(&self, id: &ProjectId) -> Result<Option<Project>> {
        let txn = self.db.begin_write()?;
        let removed = {
            let mut projects = txn.open_table(PROJECTS)?;
            let removed: Option<Project> = match projects.remove(id.as_str())? {
                Some(value) => Some(postcard::from_bytes(value.value())?),
                None => None,
            };

            let mut index = txn.open_table(EVALUATION_BY_PROJECT)?;
            let evaluation_id = index.remove(id.as_str())?.map(|v| v.value().to_string());
            if let Some(evaluation_id) = evaluation_id {
                let mut evaluations = txn.open_table(EVALUATIONS)?;
                evaluations.remove(evaluation_id.as_str())?;
            }
            removed
        };
        txn.commit()?;
        Ok(removed)
    }

    fn list_evaluations(&self) -> Result<Vec<Evaluation>> {
        self.read_all(EVALUATIONS)
    }

    fn get_evaluation(&self, id: &EvaluationId) -> Result<Option<Evaluation>> {
        self.read_one(EVALUATIONS, id.as_str())
    }

    fn find_evaluation_by_project(&self, project: &ProjectId) -> Result<Option<Evaluation>> {
        let txn = self.db.begin_read()?;
        let index = txn.open_table(EVALUATION_BY_PROJECT)?;
        let Some(evaluation_id) = index.get(project.as_str())?.map(|v| v.value().to_string())
        else {
            return Ok(None);
        };
        let evaluations = txn.open_table(EVALUATIONS)?;
        let record = match evaluations.get(evaluation_id.as_str())? {
            Some(value) => Some(postcard::from_bytes(value.value())?),
            None => None,
        };
        Ok(record)
    }

    fn insert_evaluation(&self, evaluation: &Evaluation) -> Result<()> {
        let bytes = postcard::to_stdvec(evaluation)?;
        let txn = self.db.begin_write()?;
        {
            let mut evaluations = txn.open_table(EVALUATIONS)?;
            if evaluations.get(evaluation.id.as_str())?.is_some() {
                return Err(EngineError::validation(format!(
                    "evaluation {} already exists",
                    evaluation.id
                )));
            }
            let mut index = txn.open_table(EVALUATION_BY_PROJECT)?;
            if index.get(evaluation.project_id.as_str())?.is_some() {
                return Err(EngineError::validation(format!(
                    "project {} already has an evaluation",
                    evaluation.project_id
                )));
            }
            index.insert(evaluation.project_id.as_str(), evaluation.id.as_str())?;
            evaluations.insert(evaluation.id.as_str(), bytes.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }

    fn modify_evaluation(
        &self,
        id: &EvaluationId,
        update: &mut EvaluationUpdate<'_>,
    ) -> Result<Evaluation> {
        // Dropping the transaction without commit aborts it.
        let txn = self.db.begin_write()?;
        let updated = {
            let mut table = txn.open_table(EVALUATIONS)?;
            let mut evaluation: Evaluation = match table.get(id.as_str())? {
                Some(value) => postcard::from_bytes(value.value())?,
                None => return Err(EngineError::not_found(EntityKind::Evaluation, id)),
            };
            update(&mut evaluation)?;
            let bytes = postcard::to_stdvec(&evaluation)?;
            table.insert(id.as_str(), bytes.as_slice())?;
            evaluation
        };
        txn.commit()?;
        Ok(updated)
    }

    fn get_config(&self) -> Result<Option<Config>> {
        self.read_one(META, CONFIG_KEY)
    }

    fn put_config(&self, config: &Config) -> Result<()> {
        self.write_one(META, CONFIG_KEY, config)
    }

    fn next_sequence(&self, kind: EntityKind) -> Result<u64> {
        let txn = self.db.begin_write()?;
        let next = {
            let mut table = txn.open_table(SEQUENCES)?;
            let current = table.get(kind.id_prefix())?.map_or(0, |v| v.value());
            let next = current.saturating_add(1);
            table.insert(kind.id_prefix(), next)?;
            next
        };
        txn.commit()?;
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::model::StageId;
    use crate::storage::contract;
    use chrono::Utc;
    use tempfile::TempDir;

    fn open() -> (TempDir, RedbStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = RedbStore::open(dir.path().join("dxtrack.redb")).unwrap();
        (dir, store)
    }

    #[test]
    fn crud_round_trip() {
        let (_dir, store) = open();
        contract::crud_round_trip(&store);
    }

    #[test]
    fn one_evaluation_per_project() {
        let (_dir, store) = open();
        contract::one_evaluation_per_project(&store);
    }

    #[test]
    fn modify_commits_or_discards() {
        let (_dir, store) = open();
        contract::modify_commits_or_discards(&store);
    }

    #[test]
    fn delete_project_cascades() {
        let (_dir, store) = open();
        contract::delete_project_cascades(&store);
    }

    #[test]
    fn sequences_are_per_prefix() {
        let (_dir, store) = open();
        contract::sequences_are_per_prefix(&store);
    }

    #[test]
    fn records_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dxtrack.redb");
        {
            let store = RedbStore::open(&path).unwrap();
            let mut evaluation = Evaluation::new("eval_1".into(), "proj_1".into(), Utc::now());
            evaluation.stage = StageId::SummitReviewed;
            store.insert_evaluation(&evaluation).unwrap();
            store.next_sequence(EntityKind::Evaluation).unwrap();
        }
        let store = RedbStore::open(&path).unwrap();
        let evaluation = store.get_evaluation(&"eval_1".into()).unwrap().unwrap();
        assert_eq!(evaluation.stage, StageId::SummitReviewed);
        assert_eq!(store.next_sequence(EntityKind::Evaluation).unwrap(), 2);
    }
}
