//! Projects, departments, users and evaluator worklists.

use super::Engine;
use crate::error::{EngineError, EntityKind, Result};
use crate::model::{DEFAULT_CITY, Department, Evaluation, Project, Role, StageId, User};
use crate::stage::{StageEvent, next_stage};
use crate::{DepartmentId, EvaluationId, ProjectId, SubmissionId, UserId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProject {
    pub name: String,
    pub department_id: DepartmentId,
    #[serde(default)]
    pub program_manager: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
}

/// Partial project update; absent fields keep their value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectUpdate {
    pub name: Option<String>,
    pub department_id: Option<DepartmentId>,
    pub program_manager: Option<String>,
    pub city: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDepartment {
    /// Minted when absent.
    #[serde(default)]
    pub id: Option<DepartmentId>,
    pub name: String,
    #[serde(default)]
    pub name_en: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub role: Role,
    #[serde(default)]
    pub department: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserUpdate {
    pub email: Option<String>,
    pub name: Option<String>,
    pub role: Option<Role>,
    pub department: Option<String>,
}

/// One row of an evaluator's worklist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorklistItem {
    pub evaluation_id: EvaluationId,
    pub project_id: ProjectId,
    pub project_name: String,
    pub stage: StageId,
    /// Whether this evaluator already submitted scores.
    pub scored: bool,
}

/// What an evaluator sees: assigned evaluations with their projects and
/// departments, split into open and reviewed worklists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluatorContext {
    pub user: User,
    pub evaluations: Vec<Evaluation>,
    pub projects: Vec<Project>,
    pub departments: Vec<Department>,
    pub pending: Vec<WorklistItem>,
    pub completed: Vec<WorklistItem>,
}

fn required(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

impl Engine {
    // =========================================================================
    // DEPARTMENTS
    // =========================================================================

    pub fn list_departments(&self) -> Result<Vec<Department>> {
        self.store.list_departments()
    }

    pub fn get_department(&self, id: &DepartmentId) -> Result<Department> {
        self.store
            .get_department(id)?
            .ok_or_else(|| EngineError::not_found(EntityKind::Department, id))
    }

    pub fn create_department(&self, input: NewDepartment) -> Result<Department> {
        let name = required("department name", &input.name)?;
        let id = match input.id {
            Some(id) => {
                if self.store.get_department(&id)?.is_some() {
                    return Err(EngineError::validation(format!(
                        "department {id} already exists"
                    )));
                }
                id
            }
            None => DepartmentId::new(self.mint_id(EntityKind::Department, |candidate| {
                Ok(self.store.get_department(&candidate.into())?.is_some())
            })?),
        };
        let department = Department {
            id,
            name,
            name_en: input.name_en.trim().to_string(),
        };
        self.store.put_department(&department)?;
        Ok(department)
    }

    // =========================================================================
    // PROJECTS
    // =========================================================================

    pub fn list_projects(&self) -> Result<Vec<Project>> {
        self.store.list_projects()
    }

    pub fn get_project(&self, id: &ProjectId) -> Result<Project> {
        self.store
            .get_project(id)?
            .ok_or_else(|| EngineError::not_found(EntityKind::Project, id))
    }

    fn ensure_unique_project_name(&self, name: &str, except: Option<&ProjectId>) -> Result<()> {
        let clash = self
            .store
            .list_projects()?
            .into_iter()
            .any(|p| p.name == name && Some(&p.id) != except);
        if clash {
            return Err(EngineError::validation(format!(
                "a project named `{name}` already exists"
            )));
        }
        Ok(())
    }

    /// Create a project and its `pending` evaluation.
    pub fn create_project(&self, input: NewProject) -> Result<Project> {
        self.create_project_with_submission(input, None)
    }

    pub(crate) fn create_project_with_submission(
        &self,
        input: NewProject,
        submission: Option<SubmissionId>,
    ) -> Result<Project> {
        let name = required("project name", &input.name)?;
        if input.department_id.as_str().trim().is_empty() {
            return Err(EngineError::validation("department is required"));
        }
        self.get_department(&input.department_id)?;
        self.ensure_unique_project_name(&name, None)?;

        let now = self.now();
        let id = ProjectId::new(self.mint_id(EntityKind::Project, |candidate| {
            Ok(self.store.get_project(&candidate.into())?.is_some())
        })?);
        let project = Project {
            id,
            name,
            department_id: input.department_id,
            program_manager: input.program_manager.unwrap_or_default(),
            city: input
                .city
                .filter(|city| !city.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_CITY.to_string()),
            submission_id: submission.clone(),
            created_at: now,
        };
        self.store.put_project(&project)?;

        let mut evaluation = Evaluation::new(self.mint_evaluation_id()?, project.id.clone(), now);
        evaluation.stage = next_stage(evaluation.stage, StageEvent::Created);
        evaluation.submission_id = submission;
        self.store.insert_evaluation(&evaluation)?;
        Ok(project)
    }

    pub(crate) fn mint_evaluation_id(&self) -> Result<EvaluationId> {
        Ok(EvaluationId::new(self.mint_id(
            EntityKind::Evaluation,
            |candidate| Ok(self.store.get_evaluation(&candidate.into())?.is_some()),
        )?))
    }

    pub fn update_project(&self, id: &ProjectId, update: ProjectUpdate) -> Result<Project> {
        let mut project = self.get_project(id)?;
        if let Some(name) = update.name {
            let name = required("project name", &name)?;
            self.ensure_unique_project_name(&name, Some(id))?;
            project.name = name;
        }
        if let Some(department) = update.department_id {
            self.get_department(&department)?;
            project.department_id = department;
        }
        if let Some(manager) = update.program_manager {
            project.program_manager = manager;
        }
        if let Some(city) = update.city {
            project.city = city;
        }
        self.store.put_project(&project)?;
        Ok(project)
    }

    /// Delete a project and its evaluation.
    pub fn delete_project(&self, id: &ProjectId) -> Result<Project> {
        self.store
            .delete_project(id)?
            .ok_or_else(|| EngineError::not_found(EntityKind::Project, id))
    }

    // =========================================================================
    // USERS
    // =========================================================================

    pub fn list_users(&self) -> Result<Vec<User>> {
        self.store.list_users()
    }

    pub fn get_user(&self, id: &UserId) -> Result<User> {
        self.store
            .get_user(id)?
            .ok_or_else(|| EngineError::not_found(EntityKind::User, id))
    }

    fn ensure_unique_email(&self, email: &str, except: Option<&UserId>) -> Result<()> {
        let clash = self
            .store
            .list_users()?
            .into_iter()
            .any(|u| u.email.eq_ignore_ascii_case(email) && Some(&u.id) != except);
        if clash {
            return Err(EngineError::validation(format!(
                "email `{email}` is already registered"
            )));
        }
        Ok(())
    }

    pub fn create_user(&self, input: NewUser) -> Result<User> {
        let email = required("email", &input.email)?;
        let name = required("name", &input.name)?;
        self.ensure_unique_email(&email, None)?;
        let id = UserId::new(self.mint_id(EntityKind::User, |candidate| {
            Ok(self.store.get_user(&candidate.into())?.is_some())
        })?);
        let user = User {
            id,
            email,
            name,
            role: input.role,
            department: input.department.filter(|d| !d.trim().is_empty()),
        };
        self.store.put_user(&user)?;
        Ok(user)
    }

    pub fn update_user(&self, id: &UserId, update: UserUpdate) -> Result<User> {
        let mut user = self.get_user(id)?;
        if let Some(email) = update.email {
            let email = required("email", &email)?;
            self.ensure_unique_email(&email, Some(id))?;
            user.email = email;
        }
        if let Some(name) = update.name {
            user.name = required("name", &name)?;
        }
        if let Some(role) = update.role {
            user.role = role;
        }
        if let Some(department) = update.department {
            user.department = Some(department).filter(|d| !d.trim().is_empty());
        }
        self.store.put_user(&user)?;
        Ok(user)
    }

    pub fn delete_user(&self, id: &UserId) -> Result<()> {
        if !self.store.delete_user(id)? {
            return Err(EngineError::not_found(EntityKind::User, id));
        }
        Ok(())
    }

    // =========================================================================
    // EVALUATOR CONTEXT
    // =========================================================================

    pub fn evaluator_context(&self, user_id: &UserId) -> Result<EvaluatorContext> {
        let user = self.get_user(user_id)?;
        let evaluations: Vec<Evaluation> = self
            .store
            .list_evaluations()?
            .into_iter()
            .filter(|e| e.is_assigned_to(user_id))
            .collect();

        let project_ids: BTreeSet<&ProjectId> = evaluations.iter().map(|e| &e.project_id).collect();
        let projects: Vec<Project> = self
            .store
            .list_projects()?
            .into_iter()
            .filter(|p| project_ids.contains(&p.id))
            .collect();

        let department_ids: BTreeSet<&DepartmentId> =
            projects.iter().map(|p| &p.department_id).collect();
        let departments: Vec<Department> = self
            .store
            .list_departments()?
            .into_iter()
            .filter(|d| department_ids.contains(&d.id))
            .collect();

        let item = |evaluation: &Evaluation| WorklistItem {
            evaluation_id: evaluation.id.clone(),
            project_id: evaluation.project_id.clone(),
            project_name: projects
                .iter()
                .find(|p| p.id == evaluation.project_id)
                .map(|p| p.name.clone())
                .unwrap_or_default(),
            stage: evaluation.stage,
            scored: evaluation.evaluator_score(user_id).is_some(),
        };
        let pending = evaluations
            .iter()
            .filter(|e| e.stage.awaits_evaluator())
            .map(item)
            .collect();
        let completed = evaluations
            .iter()
            .filter(|e| e.stage.is_reviewed())
            .map(item)
            .collect();

        Ok(EvaluatorContext {
            user,
            evaluations,
            projects,
            departments,
            pending,
            completed,
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================
