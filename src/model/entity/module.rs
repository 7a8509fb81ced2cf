use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;

use super::course::required_text;
use crate::model::repo::ResourceTyped;
use crate::model::{DatabaseError, ModelManager, error::DatabaseResult, repo::CrudRepository};
use crate::web::AuthenticatedUser;

/// Implicit catch-all module for items without one.
pub const GENERAL_MODULE_ID: i64 = 0;
pub const GENERAL_MODULE_NAME: &str = "Geral";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Module {
    id: i64,
    course_id: i64,
    name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, utoipa::ToSchema)]
pub struct ModuleCreate {
    pub course_id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, utoipa::ToSchema)]
pub struct ModuleUpdate {
    pub name: String,
}

impl ResourceTyped for Module {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Module
    }
}

impl Module {
    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn course_id(&self) -> i64 {
        self.course_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn list_by_course(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        course_id: i64,
    ) -> DatabaseResult<Vec<Self>> {
        let modules = sqlx::query_as("SELECT * FROM modules WHERE course_id = ?1 ORDER BY name ASC, id ASC")
            .bind(course_id)
            .fetch_all(mm.executor())
            .await?;
        Ok(modules)
    }

    /// Checks that `module_id` is the general bucket or a module of `course_id`.
    pub async fn ensure_in_course(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        course_id: i64,
        module_id: i64,
    ) -> DatabaseResult<()> {
        if module_id == GENERAL_MODULE_ID {
            return Ok(());
        }
        match Self::find_by_id(mm, actor, module_id).await? {
            Some(module) if module.course_id == course_id => Ok(()),
            _ => Err(DatabaseError::rejected("Module does not belong to this course.")),
        }
    }
}

#[async_trait]
impl CrudRepository<Module, ModuleCreate, ModuleUpdate> for Module {
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: ModuleCreate,
    ) -> DatabaseResult<Self> {
        let name = required_text(&data.name, "Name is required.")?;
        let id: i64 = sqlx::query_scalar("INSERT INTO modules (course_id, name) VALUES (?1, ?2) RETURNING id")
            .bind(data.course_id)
            .bind(&name)
            .fetch_one(mm.executor())
            .await?;

        Ok(Module {
            id,
            course_id: data.course_id,
            name,
        })
    }

    async fn update(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: ModuleUpdate,
    ) -> DatabaseResult<Self> {
        let name = required_text(&data.name, "Name is required.")?;
        sqlx::query("UPDATE modules SET name = ?1 WHERE id = ?2")
            .bind(&name)
            .bind(self.id)
            .execute(mm.executor())
            .await?;

        self.name = name;
        Ok(self)
    }

    /// Deletes the module; its items fall back to the general bucket.
    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        let mut tx = mm.executor().begin().await?;
        sqlx::query("UPDATE items SET module_id = NULL WHERE module_id = ?1")
            .bind(self.id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM modules WHERE id = ?1")
            .bind(self.id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn find_by_id(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        id: i64,
    ) -> DatabaseResult<Option<Self>> {
        let found = sqlx::query_as("SELECT * FROM modules WHERE id = ?1")
            .bind(id)
            .fetch_optional(mm.executor())
            .await?;
        Ok(found)
    }
}
