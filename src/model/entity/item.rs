use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;

use super::course::required_text;
use super::module::{GENERAL_MODULE_ID, Module};
use super::{AccessMode, ItemType, PostStatus};
use crate::model::repo::ResourceTyped;
use crate::model::{
    Capability, DatabaseError, ModelManager, check_capability, error::DatabaseResult,
    now_rfc3339, repo::CrudRepository,
};
use crate::web::AuthenticatedUser;

/// Upper bound on offer bullet lines kept per item.
pub const MAX_OFFER_BULLETS: usize = 8;

/// Listing cap for the content library.
pub const CONTENT_LISTING_LIMIT: i64 = 200;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(default)]
pub struct ItemContent {
    pub html: String,
    pub excerpt: String,
}

/// Media fields for every item type. Which ones matter depends on the type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(default)]
pub struct ItemMedia {
    pub video_url: String,
    pub pdf_url: String,
    pub duration: String,
    pub pages: String,
    pub read_time: String,
    pub code_language: String,
    pub code: String,
    pub instructions: String,
    pub live_url: String,
    pub live_datetime: String,
    pub live_status: String,
}

/// Only keys present in the payload are written.
#[derive(Debug, Clone, Default, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(default)]
pub struct ItemMediaPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdf_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub live_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub live_datetime: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub live_status: Option<String>,
}

impl ItemMediaPatch {
    pub fn apply(self, media: &mut ItemMedia) {
        let trimmed = |v: String| v.trim().to_string();

        if let Some(v) = self.video_url {
            media.video_url = trimmed(v);
        }
        if let Some(v) = self.pdf_url {
            media.pdf_url = trimmed(v);
        }
        if let Some(v) = self.duration {
            media.duration = trimmed(v);
        }
        if let Some(v) = self.pages {
            media.pages = trimmed(v);
        }
        if let Some(v) = self.read_time {
            media.read_time = trimmed(v);
        }
        if let Some(v) = self.code_language {
            media.code_language = trimmed(v);
        }
        // code and instructions keep their whitespace
        if let Some(v) = self.code {
            media.code = v;
        }
        if let Some(v) = self.instructions {
            media.instructions = v;
        }
        if let Some(v) = self.live_url {
            media.live_url = trimmed(v);
        }
        if let Some(v) = self.live_datetime {
            media.live_datetime = trimmed(v);
        }
        if let Some(v) = self.live_status {
            media.live_status = trimmed(v);
        }
    }
}

impl From<ItemMedia> for ItemMediaPatch {
    fn from(media: ItemMedia) -> Self {
        Self {
            video_url: Some(media.video_url),
            pdf_url: Some(media.pdf_url),
            duration: Some(media.duration),
            pages: Some(media.pages),
            read_time: Some(media.read_time),
            code_language: Some(media.code_language),
            code: Some(media.code),
            instructions: Some(media.instructions),
            live_url: Some(media.live_url),
            live_datetime: Some(media.live_datetime),
            live_status: Some(media.live_status),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(default)]
pub struct ItemAccess {
    pub mode: AccessMode,
    pub checkout_url: String,
    pub offer_title: String,
    pub offer_price: String,
    pub offer_bullets: Vec<String>,
}

/// Access change. Upsell fields are dropped unless the actor may manage them.
#[derive(Debug, Clone, Default, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(default)]
pub struct ItemAccessPatch {
    #[serde(alias = "access", skip_serializing_if = "Option::is_none")]
    pub mode: Option<AccessMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkout_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offer_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offer_price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offer_bullets: Option<Vec<String>>,
}

impl ItemAccessPatch {
    pub fn apply(self, access: &mut ItemAccess, can_manage_upsell: bool) {
        if let Some(mode) = self.mode {
            access.mode = mode;
        }
        if !can_manage_upsell {
            return;
        }
        if let Some(v) = self.checkout_url {
            access.checkout_url = v.trim().to_string();
        }
        if let Some(v) = self.offer_title {
            access.offer_title = v.trim().to_string();
        }
        if let Some(v) = self.offer_price {
            access.offer_price = v.trim().to_string();
        }
        if let Some(v) = self.offer_bullets {
            access.offer_bullets = clean_bullets(v);
        }
    }
}

/// Trims lines, drops empty ones and keeps at most [`MAX_OFFER_BULLETS`].
pub fn clean_bullets(lines: Vec<String>) -> Vec<String> {
    lines
        .into_iter()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .take(MAX_OFFER_BULLETS)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Item {
    id: i64,
    course_id: i64,
    module_id: i64,
    title: String,
    status: PostStatus,
    menu_order: i64,
    #[serde(rename = "type")]
    item_type: ItemType,
    content: ItemContent,
    media: ItemMedia,
    access: ItemAccess,
    created_at: String,
}

#[derive(Debug, FromRow)]
struct ItemRow {
    id: i64,
    course_id: i64,
    module_id: Option<i64>,
    title: String,
    status: PostStatus,
    menu_order: i64,
    item_type: ItemType,
    html: String,
    excerpt: String,
    media: String,
    access: String,
    created_at: String,
}

impl TryFrom<ItemRow> for Item {
    type Error = serde_json::Error;

    fn try_from(row: ItemRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            course_id: row.course_id,
            module_id: row.module_id.unwrap_or(GENERAL_MODULE_ID),
            title: row.title,
            status: row.status,
            menu_order: row.menu_order,
            item_type: row.item_type,
            content: ItemContent {
                html: row.html,
                excerpt: row.excerpt,
            },
            media: serde_json::from_str(&row.media)?,
            access: serde_json::from_str(&row.access)?,
            created_at: row.created_at,
        })
    }
}

fn rows_into_items(rows: Vec<ItemRow>) -> DatabaseResult<Vec<Item>> {
    Ok(rows
        .into_iter()
        .map(Item::try_from)
        .collect::<Result<_, _>>()?)
}

#[derive(Debug, Clone, Deserialize, Serialize, utoipa::ToSchema)]
pub struct ItemCreate {
    pub course_id: i64,
    #[serde(default)]
    pub module_id: i64,
    pub title: String,
    #[serde(default, rename = "type")]
    pub item_type: ItemType,
    #[serde(default)]
    pub status: PostStatus,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub excerpt: String,
    pub menu_order: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(default)]
pub struct ItemUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<PostStatus>,
    /// Rich HTML body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub menu_order: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module_id: Option<i64>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub item_type: Option<ItemType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media: Option<ItemMediaPatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access: Option<ItemAccessPatch>,
}

impl ResourceTyped for Item {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Item
    }
}

impl Item {
    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn course_id(&self) -> i64 {
        self.course_id
    }

    pub fn module_id(&self) -> i64 {
        self.module_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn status(&self) -> PostStatus {
        self.status
    }

    pub fn menu_order(&self) -> i64 {
        self.menu_order
    }

    pub fn item_type(&self) -> ItemType {
        self.item_type
    }

    pub fn content(&self) -> &ItemContent {
        &self.content
    }

    pub fn media(&self) -> &ItemMedia {
        &self.media
    }

    pub fn access(&self) -> &ItemAccess {
        &self.access
    }

    pub fn created_at(&self) -> &str {
        &self.created_at
    }

    /// Items of a course outside the trash, in display order.
    pub async fn list_by_course(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        course_id: i64,
    ) -> DatabaseResult<Vec<Self>> {
        let rows: Vec<ItemRow> = sqlx::query_as(
            "SELECT * FROM items WHERE course_id = ?1 AND trashed_at IS NULL ORDER BY menu_order ASC, id ASC",
        )
        .bind(course_id)
        .fetch_all(mm.executor())
        .await?;
        rows_into_items(rows)
    }

    pub async fn list_published_by_course(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        course_id: i64,
    ) -> DatabaseResult<Vec<Self>> {
        let rows: Vec<ItemRow> = sqlx::query_as(
            "SELECT * FROM items WHERE course_id = ?1 AND status = ?2 AND trashed_at IS NULL ORDER BY menu_order ASC, id ASC",
        )
        .bind(course_id)
        .bind(PostStatus::Publish)
        .fetch_all(mm.executor())
        .await?;
        rows_into_items(rows)
    }

    /// Newest items of one type across all courses.
    pub async fn list_by_type(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        item_type: ItemType,
        limit: i64,
    ) -> DatabaseResult<Vec<Self>> {
        let rows: Vec<ItemRow> = sqlx::query_as(
            "SELECT * FROM items WHERE item_type = ?1 AND trashed_at IS NULL ORDER BY created_at DESC, id DESC LIMIT ?2",
        )
        .bind(item_type)
        .bind(limit)
        .fetch_all(mm.executor())
        .await?;
        rows_into_items(rows)
    }

    /// Types with at least one item outside the trash, in [`ItemType::ALL`] order.
    pub async fn types_present(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Vec<ItemType>> {
        let present: Vec<ItemType> =
            sqlx::query_scalar("SELECT DISTINCT item_type FROM items WHERE trashed_at IS NULL")
                .fetch_all(mm.executor())
                .await?;

        Ok(ItemType::ALL
            .into_iter()
            .filter(|t| present.contains(t))
            .collect())
    }

    async fn module_item_ids(
        mm: &ModelManager,
        course_id: i64,
        module_id: i64,
    ) -> DatabaseResult<Vec<i64>> {
        let ids = sqlx::query_scalar(
            "SELECT id FROM items WHERE course_id = ?1 AND COALESCE(module_id, 0) = ?2 AND trashed_at IS NULL ORDER BY menu_order ASC, id ASC",
        )
        .bind(course_id)
        .bind(module_id)
        .fetch_all(mm.executor())
        .await?;
        Ok(ids)
    }

    /// Writes `menu_order = position` for a module's items. `ordered` must be a
    /// permutation of the module's current items. No version check: the last
    /// reorder wins.
    pub async fn reorder(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        course_id: i64,
        module_id: i64,
        ordered: &[i64],
    ) -> DatabaseResult<()> {
        if ordered.is_empty() {
            return Err(DatabaseError::rejected("ordered_item_ids is empty."));
        }
        Module::ensure_in_course(mm, actor, course_id, module_id).await?;

        let mut current = Self::module_item_ids(mm, course_id, module_id).await?;
        let mut requested = ordered.to_vec();
        current.sort_unstable();
        requested.sort_unstable();
        if current != requested {
            return Err(DatabaseError::rejected(
                "ordered_item_ids must list every item of the module exactly once.",
            ));
        }

        let mut tx = mm.executor().begin().await?;
        for (position, id) in ordered.iter().enumerate() {
            sqlx::query("UPDATE items SET menu_order = ?1 WHERE id = ?2")
                .bind(position as i64)
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        tracing::debug!(course_id, module_id, count = ordered.len(), "items reordered");
        Ok(())
    }

    async fn next_menu_order(
        mm: &ModelManager,
        course_id: i64,
        module_id: i64,
    ) -> DatabaseResult<i64> {
        let next: i64 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(menu_order) + 1, 0) FROM items WHERE course_id = ?1 AND COALESCE(module_id, 0) = ?2 AND trashed_at IS NULL",
        )
        .bind(course_id)
        .bind(module_id)
        .fetch_one(mm.executor())
        .await?;
        Ok(next)
    }
}

fn nullable_module(module_id: i64) -> Option<i64> {
    (module_id != GENERAL_MODULE_ID).then_some(module_id)
}

#[async_trait]
impl CrudRepository<Item, ItemCreate, ItemUpdate> for Item {
    async fn create(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        data: ItemCreate,
    ) -> DatabaseResult<Self> {
        let title = required_text(&data.title, "Title and course are required.")?;
        if data.course_id <= 0 {
            return Err(DatabaseError::rejected("Title and course are required."));
        }
        Module::ensure_in_course(mm, actor, data.course_id, data.module_id).await?;

        let menu_order = match data.menu_order {
            Some(order) => order,
            None => Self::next_menu_order(mm, data.course_id, data.module_id).await?,
        };

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO items (course_id, module_id, title, status, menu_order, item_type, html, excerpt, media, access, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            RETURNING id
            "#,
        )
        .bind(data.course_id)
        .bind(nullable_module(data.module_id))
        .bind(&title)
        .bind(data.status)
        .bind(menu_order)
        .bind(data.item_type)
        .bind(&data.content)
        .bind(&data.excerpt)
        .bind(serde_json::to_string(&ItemMedia::default())?)
        .bind(serde_json::to_string(&ItemAccess::default())?)
        .bind(now_rfc3339())
        .fetch_one(mm.executor())
        .await?;

        tracing::debug!(item_id = id, course_id = data.course_id, "item created");
        Self::find_by_id(mm, actor, id)
            .await?
            .ok_or(DatabaseError::SqlxError(sqlx::Error::RowNotFound))
    }

    async fn update(
        mut self,
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        data: ItemUpdate,
    ) -> DatabaseResult<Self> {
        if let Some(title) = data.title {
            self.title = required_text(&title, "Title is required.")?;
        }
        if let Some(status) = data.status {
            self.status = status;
        }
        if let Some(html) = data.content {
            self.content.html = html;
        }
        if let Some(excerpt) = data.excerpt {
            self.content.excerpt = excerpt;
        }
        if let Some(order) = data.menu_order {
            self.menu_order = order;
        }
        if let Some(module_id) = data.module_id {
            Module::ensure_in_course(mm, actor, self.course_id, module_id).await?;
            self.module_id = module_id;
        }
        if let Some(item_type) = data.item_type {
            self.item_type = item_type;
        }
        if let Some(media) = data.media {
            media.apply(&mut self.media);
        }
        if let Some(access) = data.access {
            let can_manage_upsell = check_capability(actor, Capability::ManageUpsell).is_ok();
            access.apply(&mut self.access, can_manage_upsell);
        }

        sqlx::query(
            r#"
            UPDATE items
            SET module_id = ?1, title = ?2, status = ?3, menu_order = ?4, item_type = ?5,
                html = ?6, excerpt = ?7, media = ?8, access = ?9
            WHERE id = ?10
            "#,
        )
        .bind(nullable_module(self.module_id))
        .bind(&self.title)
        .bind(self.status)
        .bind(self.menu_order)
        .bind(self.item_type)
        .bind(&self.content.html)
        .bind(&self.content.excerpt)
        .bind(serde_json::to_string(&self.media)?)
        .bind(serde_json::to_string(&self.access)?)
        .bind(self.id)
        .execute(mm.executor())
        .await?;

        Ok(self)
    }

    /// Moves the item to the trash.
    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("UPDATE items SET trashed_at = ?1 WHERE id = ?2")
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
        let row: Option<ItemRow> =
            sqlx::query_as("SELECT * FROM items WHERE id = ?1 AND trashed_at IS NULL")
                .bind(id)
                .fetch_optional(mm.executor())
                .await?;
        Ok(row.map(Item::try_from).transpose()?)
    }
}
