//! In-memory backend.

use super::{EvaluationUpdate, Repository};
use crate::error::{EngineError, EntityKind, Result};
use crate::model::{Department, Evaluation, Project, User};
use crate::rubric::Config;
use crate::{DepartmentId, EvaluationId, ProjectId, UserId};
use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<UserId, User>,
    departments: BTreeMap<DepartmentId, Department>,
    projects: BTreeMap<ProjectId, Project>,
    evaluations: BTreeMap<EvaluationId, Evaluation>,
    evaluation_by_project: BTreeMap<ProjectId, EvaluationId>,
    config: Option<Config>,
    sequences: BTreeMap<&'static str, u64>,
}

/// `BTreeMap` tables behind one `RwLock`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| EngineError::Storage("memory store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|_| EngineError::Storage("memory store lock poisoned".to_string()))
    }
}

impl Repository for MemoryStore {
    fn list_users(&self) -> Result<Vec<User>> {
        Ok(self.read()?.users.values().cloned().collect())
    }

    fn get_user(&self, id: &UserId) -> Result<Option<User>> {
        Ok(self.read()?.users.get(id).cloned())
    }

    fn put_user(&self, user: &User) -> Result<()> {
        self.write()?.users.insert(user.id.clone(), user.clone());
        Ok(())
    }

    fn delete_user(&self, id: &UserId) -> Result<bool> {
        Ok(self.write()?.users.remove(id).is_some())
    }

    fn list_departments(&self) -> Result<Vec<Department>> {
        Ok(self.read()?.departments.values().cloned().collect())
    }

    fn get_department(&self, id: &DepartmentId) -> Result<Option<Department>> {
        Ok(self.read()?.departments.get(id).cloned())
    }

    fn put_department(&self, department: &Department) -> Result<()> {
        self.write()?
            .departments
            .insert(department.id.clone(), department.clone());
        Ok(())
    }

    fn list_projects(&self) -> Result<Vec<Project>> {
        Ok(self.read()?.projects.values().cloned().collect())
    }

    fn get_project(&self, id: &ProjectId) -> Result<Option<Project>> {
        Ok(self.read()?.projects.get(id).cloned())
    }

    fn put_project(&self, project: &Project) -> Result<()> {
        self.write()?
            .projects
            .insert(project.id.clone(), project.clone());
        Ok(())
    }

    fn delete_project(&self, id: &ProjectId) -> Result<Option<Project>> {
        let mut tables = self.write()?;
        let removed = tables.projects.remove(id);
        if let Some(evaluation) = tables.evaluation_by_project.remove(id) {
            tables.evaluations.remove(&evaluation);
        }
        Ok(removed)
    }

    fn list_evaluations(&self) -> Result<Vec<Evaluation>> {
        Ok(self.read()?.evaluations.values().cloned().collect())
    }

    fn get_evaluation(&self, id: &EvaluationId) -> Result<Option<Evaluation>> {
        Ok(self.read()?.evaluations.get(id).cloned())
    }

    fn find_evaluation_by_project(&self, project: &ProjectId) -> Result<Option<Evaluation>> {
        let tables = self.read()?;
        Ok(tables
            .evaluation_by_project
            .get(project)
            .and_then(|id| tables.evaluations.get(id))
            .cloned())
    }

    fn insert_evaluation(&self, evaluation: &Evaluation) -> Result<()> {
        let mut tables = self.write()?;
        if tables.evaluations.contains_key(&evaluation.id) {
            return Err(EngineError::validation(format!(
                "evaluation {} already exists",
                evaluation.id
            )));
        }
        if tables
            .evaluation_by_project
            .contains_key(&evaluation.project_id)
        {
            return Err(EngineError::validation(format!(
                "project {} already has an evaluation",
                evaluation.project_id
            )));
        }
        tables
            .evaluation_by_project
            .insert(evaluation.project_id.clone(), evaluation.id.clone());
        tables
            .evaluations
            .insert(evaluation.id.clone(), evaluation.clone());
        Ok(())
    }

    fn modify_evaluation(
        &self,
        id: &EvaluationId,
        update: &mut EvaluationUpdate<'_>,
    ) -> Result<Evaluation> {
        let mut tables = self.write()?;
        let slot = tables
            .evaluations
            .get_mut(id)
            .ok_or_else(|| EngineError::not_found(EntityKind::Evaluation, id))?;
        let mut draft = slot.clone();
        update(&mut draft)?;
        *slot = draft.clone();
        Ok(draft)
    }

    fn get_config(&self) -> Result<Option<Config>> {
        Ok(self.read()?.config.clone())
    }

    fn put_config(&self, config: &Config) -> Result<()> {
        self.write()?.config = Some(config.clone());
        Ok(())
    }

    fn next_sequence(&self, kind: EntityKind) -> Result<u64> {
        let mut tables = self.write()?;
        let counter = tables.sequences.entry(kind.id_prefix()).or_insert(0);
        *counter = counter.saturating_add(1);
        Ok(*counter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::contract;

    #[test]
    fn crud_round_trip() {
        contract::crud_round_trip(&MemoryStore::new());
    }

    #[test]
    fn one_evaluation_per_project() {
        contract::one_evaluation_per_project(&MemoryStore::new());
    }

    #[test]
    fn modify_commits_or_discards() {
        contract::modify_commits_or_discards(&MemoryStore::new());
    }

    #[test]
    fn delete_project_cascades() {
        contract::delete_project_cascades(&MemoryStore::new());
    }

    #[test]
    fn sequences_are_per_prefix() {
        contract::sequences_are_per_prefix(&MemoryStore::new());
    }
}
