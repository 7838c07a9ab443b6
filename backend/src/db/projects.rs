//! Project (code file) database repository

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use spx_macros::Entity;
use uuid::Uuid;

use super::ACTIVE_STATUS;
use super::orm::{DELETED_STATUS, QueryEngine, QueryError, RowStore, SqlField, SqlValue};
use super::sqlite_helpers::now_utc;

/// Project record from the `project` table
#[derive(Entity, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    pub author_id: String,
    /// Blob key of the stored code file
    pub address: String,
    pub status: i64,
    pub c_time: DateTime<Utc>,
    pub u_time: DateTime<Utc>,
}

/// Input for creating a project
#[derive(Debug, Clone)]
pub struct CreateProject {
    pub name: String,
    pub author_id: String,
    pub address: String,
}

/// Input for updating a project
#[derive(Debug, Clone)]
pub struct UpdateProject {
    pub name: String,
    pub address: String,
}

const UPDATE_PROJECT_SQL: &str =
    "UPDATE project SET name = ?, address = ?, u_time = ? WHERE id = ? AND status != ?";

pub struct ProjectRepository<S> {
    engine: QueryEngine<S>,
}

impl<S: RowStore> ProjectRepository<S> {
    pub fn new(engine: QueryEngine<S>) -> Self {
        Self { engine }
    }

    /// Get a project by ID. An empty ID never matches.
    pub async fn file_info(&self, id: &str) -> Result<Option<Project>, QueryError> {
        if id.is_empty() {
            return Ok(None);
        }
        self.engine.query_by_id::<Project>(id).await
    }

    /// Get only the stored address of a project
    pub async fn project_address(&self, id: &str) -> Result<Option<String>, QueryError> {
        Ok(self.file_info(id).await?.map(|project| project.address))
    }

    /// Create a new project
    pub async fn create(&self, input: CreateProject) -> Result<Project, QueryError> {
        let now = now_utc();
        let project = Project {
            id: Uuid::new_v4().to_string(),
            name: input.name,
            author_id: input.author_id,
            address: input.address,
            status: ACTIVE_STATUS,
            c_time: now,
            u_time: now,
        };

        self.engine.insert(&project).await?;
        tracing::debug!(id = %project.id, "Created project");
        Ok(project)
    }

    /// Update a live project's name and address. Returns `false` if not found.
    pub async fn update(&self, id: &str, input: UpdateProject) -> Result<bool, QueryError> {
        let args = [
            SqlValue::String(input.name),
            SqlValue::String(input.address),
            now_utc().to_sql_value(),
            SqlValue::from(id),
            SqlValue::Int(DELETED_STATUS),
        ];
        let affected = self.engine.store().execute(UPDATE_PROJECT_SQL, &args).await?;
        Ok(affected > 0)
    }

    /// Soft-delete a project
    pub async fn delete(&self, id: &str) -> Result<bool, QueryError> {
        self.engine.soft_delete::<Project>(id).await
    }
}
