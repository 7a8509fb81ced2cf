use crate::web::dto::tree::{CourseTree, ItemSummary, ModuleNode};

use super::optimistic::Optimistic;
use super::reorder;

/// The studio's copy of one course's structure. Always replaced whole after
/// a structural change, except for the local reorder preview.
#[derive(Debug, Clone, Default)]
pub struct TreeCache {
    course_id: Option<i64>,
    tree: CourseTree,
}

impl TreeCache {
    pub fn course_id(&self) -> Option<i64> {
        self.course_id
    }

    pub fn tree(&self) -> &CourseTree {
        &self.tree
    }

    pub fn modules(&self) -> &[ModuleNode] {
        &self.tree.modules
    }

    pub fn replace(&mut self, course_id: i64, tree: CourseTree) {
        self.course_id = Some(course_id);
        self.tree = tree;
    }

    pub fn clear(&mut self) {
        self.course_id = None;
        self.tree = CourseTree::default();
    }

    pub fn module(&self, module_id: i64) -> Option<&ModuleNode> {
        self.tree.module(module_id)
    }

    pub fn item(&self, item_id: i64) -> Option<&ItemSummary> {
        self.tree
            .modules
            .iter()
            .flat_map(|m| m.items.iter())
            .find(|i| i.id == item_id)
    }

    /// Moves `item_id` to `to` inside `module_id` locally. Returns the new id
    /// order and the snapshot needed to undo it.
    pub fn preview_move(
        &mut self,
        module_id: i64,
        item_id: i64,
        to: usize,
    ) -> Option<(Vec<i64>, Optimistic<Vec<ItemSummary>>)> {
        let node = self.tree.module_mut(module_id)?;
        let from = node.items.iter().position(|i| i.id == item_id)?;

        let mut next = node.items.clone();
        reorder::splice(&mut next, from, to);
        for (position, item) in next.iter_mut().enumerate() {
            item.menu_order = position as i64;
        }
        let ids = next.iter().map(|i| i.id).collect();

        Some((ids, Optimistic::apply(&mut node.items, next)))
    }

    /// Undoes a [`TreeCache::preview_move`].
    pub fn rollback_move(&mut self, module_id: i64, pending: Optimistic<Vec<ItemSummary>>) {
        match self.tree.module_mut(module_id) {
            Some(node) => pending.rollback(&mut node.items),
            None => {
                let _ = pending.commit();
            }
        }
    }
}
