//! Typed drafts, one per kind of entity the editor can hold.

use crate::model::entity::{
    CourseUpdate, GENERAL_MODULE_ID, Item, ItemAccess, ItemAccessPatch, ItemMedia, ItemMediaPatch,
    ItemType, ItemUpdate, PostStatus,
};
use crate::web::dto::{courses::CourseDetail, tree::ModuleNode};

/// What the editor has selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityRef {
    Course(i64),
    Module(i64),
    Item(i64),
}

impl EntityRef {
    pub fn id(&self) -> i64 {
        match self {
            Self::Course(id) | Self::Module(id) | Self::Item(id) => *id,
        }
    }

    pub fn is_general_module(&self) -> bool {
        *self == Self::Module(GENERAL_MODULE_ID)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseDraft {
    pub id: i64,
    pub title: String,
    pub status: PostStatus,
    pub content: String,
    pub excerpt: String,
    pub cover_id: i64,
    pub cover_url: String,
}

impl From<CourseDetail> for CourseDraft {
    fn from(c: CourseDetail) -> Self {
        Self {
            id: c.id,
            title: c.title,
            status: c.status,
            content: c.content,
            excerpt: c.excerpt,
            cover_id: c.cover_id,
            cover_url: c.cover_url,
        }
    }
}

impl CourseDraft {
    /// Cover changes go through their own calls and are left out.
    pub fn to_update(&self) -> CourseUpdate {
        CourseUpdate {
            title: Some(self.title.clone()),
            status: Some(self.status),
            content: Some(self.content.clone()),
            excerpt: Some(self.excerpt.clone()),
            cover_id: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleDraft {
    pub id: i64,
    pub course_id: i64,
    pub name: String,
}

impl ModuleDraft {
    pub fn from_node(course_id: i64, node: &ModuleNode) -> Self {
        Self {
            id: node.id,
            course_id,
            name: node.name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemDraft {
    pub id: i64,
    pub course_id: i64,
    pub module_id: i64,
    pub title: String,
    pub status: PostStatus,
    pub item_type: ItemType,
    pub html: String,
    pub excerpt: String,
    pub media: ItemMedia,
    pub access: ItemAccess,
}

impl From<Item> for ItemDraft {
    fn from(item: Item) -> Self {
        Self {
            id: item.id(),
            course_id: item.course_id(),
            module_id: item.module_id(),
            title: item.title().to_string(),
            status: item.status(),
            item_type: item.item_type(),
            html: item.content().html.clone(),
            excerpt: item.content().excerpt.clone(),
            media: item.media().clone(),
            access: item.access().clone(),
        }
    }
}

impl ItemDraft {
    /// First problem that blocks saving, if any.
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err(String::from("Title is required."));
        }
        match self.item_type {
            ItemType::Video if self.media.video_url.trim().is_empty() => {
                Err(String::from("Video URL is required."))
            }
            ItemType::Doc if self.media.pdf_url.trim().is_empty() => {
                Err(String::from("PDF URL is required."))
            }
            _ => Ok(()),
        }
    }

    /// Upsell fields are only sent when the user may manage them.
    pub fn to_update(&self, can_manage_upsell: bool) -> ItemUpdate {
        let access = if can_manage_upsell {
            ItemAccessPatch {
                mode: Some(self.access.mode),
                checkout_url: Some(self.access.checkout_url.clone()),
                offer_title: Some(self.access.offer_title.clone()),
                offer_price: Some(self.access.offer_price.clone()),
                offer_bullets: Some(self.access.offer_bullets.clone()),
            }
        } else {
            ItemAccessPatch {
                mode: Some(self.access.mode),
                ..Default::default()
            }
        };

        ItemUpdate {
            title: Some(self.title.clone()),
            status: Some(self.status),
            content: Some(self.html.clone()),
            excerpt: Some(self.excerpt.clone()),
            menu_order: None,
            module_id: Some(self.module_id),
            item_type: Some(self.item_type),
            media: Some(ItemMediaPatch::from(self.media.clone())),
            access: Some(access),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Draft {
    Course(CourseDraft),
    Module(ModuleDraft),
    Item(ItemDraft),
}

impl Draft {
    pub fn entity(&self) -> EntityRef {
        match self {
            Self::Course(d) => EntityRef::Course(d.id),
            Self::Module(d) => EntityRef::Module(d.id),
            Self::Item(d) => EntityRef::Item(d.id),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        match self {
            Self::Item(d) => d.validate(),
            Self::Course(_) | Self::Module(_) => Ok(()),
        }
    }
}
