use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;

use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult, now_rfc3339, repo::CrudRepository};
use crate::web::AuthenticatedUser;

/// Public URL prefix the uploads directory is served under.
pub const STATIC_PREFIX: &str = "/api/v1/static/";

pub fn static_url(stored_name: &str) -> String {
    format!("{STATIC_PREFIX}{stored_name}")
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct MediaAsset {
    id: i64,
    filename: String,
    stored_name: String,
    mime: String,
    created_at: String,
}

#[derive(Debug)]
pub struct MediaAssetCreate {
    pub filename: String,
    pub stored_name: String,
    pub mime: String,
}

impl ResourceTyped for MediaAsset {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Media
    }
}

impl MediaAsset {
    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn stored_name(&self) -> &str {
        &self.stored_name
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn url(&self) -> String {
        static_url(&self.stored_name)
    }
}

#[async_trait]
impl CrudRepository<MediaAsset, MediaAssetCreate, MediaAssetCreate> for MediaAsset {
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: MediaAssetCreate,
    ) -> DatabaseResult<Self> {
        let created_at = now_rfc3339();
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO media (filename, stored_name, mime, created_at) VALUES (?1, ?2, ?3, ?4) RETURNING id",
        )
        .bind(&data.filename)
        .bind(&data.stored_name)
        .bind(&data.mime)
        .bind(&created_at)
        .fetch_one(mm.executor())
        .await?;

        Ok(Self {
            id,
            filename: data.filename,
            stored_name: data.stored_name,
            mime: data.mime,
            created_at,
        })
    }

    async fn update(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: MediaAssetCreate,
    ) -> DatabaseResult<Self> {
        sqlx::query("UPDATE media SET filename = ?1, stored_name = ?2, mime = ?3 WHERE id = ?4")
            .bind(&data.filename)
            .bind(&data.stored_name)
            .bind(&data.mime)
            .bind(self.id)
            .execute(mm.executor())
            .await?;

        self.filename = data.filename;
        self.stored_name = data.stored_name;
        self.mime = data.mime;
        Ok(self)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM media WHERE id = ?1")
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
        let found = sqlx::query_as("SELECT * FROM media WHERE id = ?1")
            .bind(id)
            .fetch_optional(mm.executor())
            .await?;
        Ok(found)
    }
}
