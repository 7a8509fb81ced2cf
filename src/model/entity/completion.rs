use serde::{Deserialize, Serialize};

use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult, now_rfc3339};
use crate::web::AuthenticatedUser;

/// Per-user set of completed lesson ids, independent of course structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Completion {
    user_id: i64,
    lessons: Vec<i64>,
}

/// Result of flipping one lesson.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CompletionToggle {
    pub is_completed: bool,
    pub total_completed: i64,
}

impl ResourceTyped for Completion {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Completion
    }
}

impl Completion {
    pub fn user_id(&self) -> i64 {
        self.user_id
    }

    pub fn lessons(&self) -> &[i64] {
        &self.lessons
    }

    pub fn contains(&self, lesson_id: i64) -> bool {
        self.lessons.binary_search(&lesson_id).is_ok()
    }

    pub async fn for_user(mm: &ModelManager, actor: &AuthenticatedUser) -> DatabaseResult<Self> {
        let lessons = sqlx::query_scalar(
            "SELECT lesson_id FROM completions WHERE user_id = ?1 ORDER BY lesson_id ASC",
        )
        .bind(actor.user_id())
        .fetch_all(mm.executor())
        .await?;

        Ok(Self {
            user_id: actor.user_id(),
            lessons,
        })
    }

    /// Adds the lesson to the caller's set, or removes it if already there.
    pub async fn toggle(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        lesson_id: i64,
    ) -> DatabaseResult<CompletionToggle> {
        let mut tx = mm.executor().begin().await?;

        let removed = sqlx::query("DELETE FROM completions WHERE user_id = ?1 AND lesson_id = ?2")
            .bind(actor.user_id())
            .bind(lesson_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if removed == 0 {
            sqlx::query("INSERT INTO completions (user_id, lesson_id, completed_at) VALUES (?1, ?2, ?3)")
                .bind(actor.user_id())
                .bind(lesson_id)
                .bind(now_rfc3339())
                .execute(&mut *tx)
                .await?;
        }

        let total_completed: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM completions WHERE user_id = ?1")
                .bind(actor.user_id())
                .fetch_one(&mut *tx)
                .await?;

        tx.commit().await?;

        Ok(CompletionToggle {
            is_completed: removed == 0,
            total_completed,
        })
    }
}
