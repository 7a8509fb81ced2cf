use serde::{Deserialize, Serialize};

use crate::model::entity::{
    GENERAL_MODULE_ID, GENERAL_MODULE_NAME, Item, ItemType, Module, PostStatus,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ModuleSummary {
    pub id: i64,
    pub name: String,
}

impl From<&Module> for ModuleSummary {
    fn from(module: &Module) -> Self {
        Self {
            id: module.id(),
            name: module.name().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ItemSummary {
    pub id: i64,
    pub title: String,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    pub status: PostStatus,
    pub menu_order: i64,
}

impl From<&Item> for ItemSummary {
    fn from(item: &Item) -> Self {
        Self {
            id: item.id(),
            title: item.title().to_string(),
            item_type: item.item_type(),
            status: item.status(),
            menu_order: item.menu_order(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ModuleNode {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub items: Vec<ItemSummary>,
}

impl ModuleNode {
    pub fn is_general(&self) -> bool {
        self.id == GENERAL_MODULE_ID
    }

    pub fn item_ids(&self) -> Vec<i64> {
        self.items.iter().map(|i| i.id).collect()
    }
}

/// Modules of one course with their items. The general bucket is always
/// present and always last.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CourseTree {
    pub modules: Vec<ModuleNode>,
}

impl CourseTree {
    /// `modules` in display order, `items` as `(module_id, summary)` in display
    /// order. Items pointing at an unknown module land in the general bucket.
    pub fn build<M, I>(modules: M, items: I) -> Self
    where
        M: IntoIterator<Item = (i64, String)>,
        I: IntoIterator<Item = (i64, ItemSummary)>,
    {
        let mut nodes: Vec<ModuleNode> = modules
            .into_iter()
            .filter(|(id, _)| *id != GENERAL_MODULE_ID)
            .map(|(id, name)| ModuleNode {
                id,
                name,
                items: Vec::new(),
            })
            .collect();
        nodes.push(ModuleNode {
            id: GENERAL_MODULE_ID,
            name: GENERAL_MODULE_NAME.to_string(),
            items: Vec::new(),
        });

        for (module_id, item) in items {
            let idx = nodes
                .iter()
                .position(|n| n.id == module_id)
                .unwrap_or(nodes.len() - 1);
            nodes[idx].items.push(item);
        }

        Self { modules: nodes }
    }

    pub fn from_entities(modules: &[Module], items: &[Item]) -> Self {
        Self::build(
            modules.iter().map(|m| (m.id(), m.name().to_string())),
            items.iter().map(|i| (i.module_id(), ItemSummary::from(i))),
        )
    }

    pub fn module(&self, module_id: i64) -> Option<&ModuleNode> {
        self.modules.iter().find(|m| m.id == module_id)
    }

    pub fn module_mut(&mut self, module_id: i64) -> Option<&mut ModuleNode> {
        self.modules.iter_mut().find(|m| m.id == module_id)
    }

    /// Module currently holding `item_id`.
    pub fn module_of(&self, item_id: i64) -> Option<&ModuleNode> {
        self.modules
            .iter()
            .find(|m| m.items.iter().any(|i| i.id == item_id))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ContentTab {
    #[serde(rename = "type")]
    pub item_type: ItemType,
    pub label: String,
}

impl From<ItemType> for ContentTab {
    fn from(item_type: ItemType) -> Self {
        Self {
            item_type,
            label: item_type.label().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ContentEntry {
    pub id: i64,
    pub title: String,
    pub status: PostStatus,
    pub course_id: i64,
    pub module_id: i64,
    pub date: String,
}

impl From<&Item> for ContentEntry {
    fn from(item: &Item) -> Self {
        Self {
            id: item.id(),
            title: item.title().to_string(),
            status: item.status(),
            course_id: item.course_id(),
            module_id: item.module_id(),
            date: item.created_at().to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, utoipa::IntoParams)]
pub struct ContentQuery {
    #[serde(rename = "type")]
    pub item_type: Option<String>,
}
