use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;

use super::PostStatus;
use super::media::{MediaAsset, static_url};
use crate::model::repo::ResourceTyped;
use crate::model::{
    DatabaseError, ModelManager, error::DatabaseResult, now_rfc3339, repo::CrudRepository,
};
use crate::web::AuthenticatedUser;

const SELECT_COURSE: &str = r#"
    SELECT c.id, c.title, c.status, c.content, c.excerpt, c.cover_id, c.created_at,
           m.stored_name AS cover_file
    FROM courses c
    LEFT JOIN media m ON m.id = c.cover_id
"#;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Course {
    id: i64,
    title: String,
    status: PostStatus,
    content: String,
    excerpt: String,
    cover_id: Option<i64>,
    created_at: String,
    #[serde(skip)]
    cover_file: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, utoipa::ToSchema)]
pub struct CourseCreate {
    pub title: String,
    #[serde(default)]
    pub status: PostStatus,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub excerpt: String,
    pub cover_id: Option<i64>,
}

/// Partial update. `cover_id: Some(0)` removes the cover.
#[derive(Debug, Clone, Default, Deserialize, Serialize, utoipa::ToSchema)]
pub struct CourseUpdate {
    pub title: Option<String>,
    pub status: Option<PostStatus>,
    pub content: Option<String>,
    pub excerpt: Option<String>,
    pub cover_id: Option<i64>,
}

impl ResourceTyped for Course {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Course
    }
}

impl Course {
    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn status(&self) -> PostStatus {
        self.status
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn excerpt(&self) -> &str {
        &self.excerpt
    }

    pub fn cover_id(&self) -> Option<i64> {
        self.cover_id
    }

    pub fn cover_url(&self) -> Option<String> {
        self.cover_file.as_deref().map(static_url)
    }

    pub fn created_at(&self) -> &str {
        &self.created_at
    }

    /// Every course that is not in the trash, newest first.
    pub async fn list_active(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Vec<Self>> {
        let query = format!("{SELECT_COURSE} WHERE c.trashed_at IS NULL ORDER BY c.created_at DESC, c.id DESC");
        let courses = sqlx::query_as(&query).fetch_all(mm.executor()).await?;
        Ok(courses)
    }

    async fn ensure_cover(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        cover_id: i64,
    ) -> DatabaseResult<()> {
        if MediaAsset::find_by_id(mm, actor, cover_id).await?.is_none() {
            return Err(DatabaseError::rejected("Cover image not found."));
        }
        Ok(())
    }
}

pub(crate) fn required_text(value: &str, message: &str) -> DatabaseResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(DatabaseError::rejected(message));
    }
    Ok(value.to_string())
}

#[async_trait]
impl CrudRepository<Course, CourseCreate, CourseUpdate> for Course {
    async fn create(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        data: CourseCreate,
    ) -> DatabaseResult<Self> {
        let title = required_text(&data.title, "Title is required.")?;
        let cover_id = data.cover_id.filter(|id| *id > 0);
        if let Some(cover_id) = cover_id {
            Self::ensure_cover(mm, actor, cover_id).await?;
        }

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO courses (title, status, content, excerpt, cover_id, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6) RETURNING id",
        )
        .bind(&title)
        .bind(data.status)
        .bind(&data.content)
        .bind(&data.excerpt)
        .bind(cover_id)
        .bind(now_rfc3339())
        .fetch_one(mm.executor())
        .await?;

        tracing::debug!(course_id = id, "course created");
        Self::find_by_id(mm, actor, id)
            .await?
            .ok_or(DatabaseError::SqlxError(sqlx::Error::RowNotFound))
    }

    async fn update(
        mut self,
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        data: CourseUpdate,
    ) -> DatabaseResult<Self> {
        if let Some(title) = data.title {
            self.title = required_text(&title, "Title is required.")?;
        }
        if let Some(status) = data.status {
            self.status = status;
        }
        if let Some(content) = data.content {
            self.content = content;
        }
        if let Some(excerpt) = data.excerpt {
            self.excerpt = excerpt;
        }
        match data.cover_id {
            Some(id) if id > 0 => {
                Self::ensure_cover(mm, actor, id).await?;
                self.cover_id = Some(id);
            }
            Some(_) => self.cover_id = None,
            None => {}
        }

        sqlx::query(
            "UPDATE courses SET title = ?1, status = ?2, content = ?3, excerpt = ?4, cover_id = ?5 WHERE id = ?6",
        )
        .bind(&self.title)
        .bind(self.status)
        .bind(&self.content)
        .bind(&self.excerpt)
        .bind(self.cover_id)
        .bind(self.id)
        .execute(mm.executor())
        .await?;

        Self::find_by_id(mm, actor, self.id)
            .await?
            .ok_or(DatabaseError::SqlxError(sqlx::Error::RowNotFound))
    }

    /// Moves the course to the trash. Nothing is purged.
    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("UPDATE courses SET trashed_at = ?1 WHERE id = ?2")
            .bind(now_rfc3339())
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
        let query = format!("{SELECT_COURSE} WHERE c.id = ?1 AND c.trashed_at IS NULL");
        let found = sqlx::query_as(&query)
            .bind(id)
            .fetch_optional(mm.executor())
            .await?;
        Ok(found)
    }
}
