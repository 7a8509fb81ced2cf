use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;

use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult, repo::CrudRepository};
use crate::web::{AuthenticatedUser, UserRole};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct UserEntity {
    id: i64,
    username: String,
    #[serde(skip_serializing, default)]
    password_hash: String,
    role: String,
}

#[derive(Debug)]
pub struct UserEntityCreate {
    pub username: String,
    pub password_hash: String,
    pub role: UserRole,
}

#[derive(Debug)]
pub struct UserEntityUpdate {
    pub username: Option<String>,
    pub password_hash: Option<String>,
    pub role: Option<UserRole>,
}

impl ResourceTyped for UserEntity {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::User
    }
}

impl UserEntity {
    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn hash(&self) -> &str {
        &self.password_hash
    }

    pub fn role(&self) -> UserRole {
        UserRole::from(self.role.as_str())
    }

    pub fn as_actor(&self) -> AuthenticatedUser {
        AuthenticatedUser::new(self.id, self.role())
    }

    pub async fn find_by_username(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        username: &str,
    ) -> DatabaseResult<Option<Self>> {
        let found = sqlx::query_as("SELECT * FROM users WHERE username = ?1")
            .bind(username)
            .fetch_optional(mm.executor())
            .await?;
        Ok(found)
    }
}

#[async_trait]
impl CrudRepository<UserEntity, UserEntityCreate, UserEntityUpdate> for UserEntity {
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: UserEntityCreate,
    ) -> DatabaseResult<Self> {
        let role = data.role.to_string();
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO users (username, password_hash, role) VALUES (?1, ?2, ?3) RETURNING id",
        )
        .bind(&data.username)
        .bind(&data.password_hash)
        .bind(&role)
        .fetch_one(mm.executor())
        .await?;

        Ok(Self {
            id,
            username: data.username,
            password_hash: data.password_hash,
            role,
        })
    }

    async fn update(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: UserEntityUpdate,
    ) -> DatabaseResult<Self> {
        if let Some(username) = data.username {
            self.username = username;
        }
        if let Some(hash) = data.password_hash {
            self.password_hash = hash;
        }
        if let Some(role) = data.role {
            self.role = role.to_string();
        }

        sqlx::query("UPDATE users SET username = ?1, password_hash = ?2, role = ?3 WHERE id = ?4")
            .bind(&self.username)
            .bind(&self.password_hash)
            .bind(&self.role)
            .bind(self.id)
            .execute(mm.executor())
            .await?;

        Ok(self)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM users WHERE id = ?1")
            .bind(self.id)
            .execute(mm.executor())
            .await?;
        Ok(())
    }

    async fn find_by_id(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        id: i64,
    ) -> DatabaseResult<Option<Self>> {
        let found = sqlx::query_as("SELECT * FROM users WHERE id = ?1")
            .bind(id)
            .fetch_optional(mm.executor())
            .await?;
        Ok(found)
    }
}
