use serde::{Deserialize, Serialize};

use crate::model::entity::{
    Completion, CompletionToggle, GENERAL_MODULE_ID, GENERAL_MODULE_NAME, Item, ItemType, Module,
};

/// Shown when a lesson carries no duration of its own.
pub const DEFAULT_DURATION: &str = "10 min";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(default)]
pub struct LessonContent {
    pub video_url: String,
    pub pdf_url: String,
    pub html: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct PlayerLesson {
    pub id: i64,
    pub title: String,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    pub duration: String,
    pub is_completed: bool,
    pub content: LessonContent,
}

impl PlayerLesson {
    pub fn from_item(item: &Item, completion: &Completion) -> Self {
        let media = item.media();
        let duration = match media.duration.trim() {
            "" => DEFAULT_DURATION.to_string(),
            d => d.to_string(),
        };

        Self {
            id: item.id(),
            title: item.title().to_string(),
            item_type: item.item_type(),
            duration,
            is_completed: completion.contains(item.id()),
            content: LessonContent {
                video_url: media.video_url.clone(),
                pdf_url: media.pdf_url.clone(),
                html: item.content().html.clone(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct PlayerModule {
    pub id: i64,
    pub title: String,
    pub lessons: Vec<PlayerLesson>,
}

/// Groups lessons by module in order of first appearance. `lessons` must
/// already be in `menu_order`.
pub fn group_lessons<I>(modules: &[Module], lessons: I) -> Vec<PlayerModule>
where
    I: IntoIterator<Item = (i64, PlayerLesson)>,
{
    let mut groups: Vec<PlayerModule> = Vec::new();

    for (module_id, lesson) in lessons {
        // unknown modules collapse into the general bucket
        let known = modules.iter().find(|m| m.id() == module_id);
        let (id, title) = match known {
            Some(m) => (m.id(), m.name().to_string()),
            None => (GENERAL_MODULE_ID, GENERAL_MODULE_NAME.to_string()),
        };

        match groups.iter_mut().find(|g| g.id == id) {
            Some(group) => group.lessons.push(lesson),
            None => groups.push(PlayerModule {
                id,
                title,
                lessons: vec![lesson],
            }),
        }
    }

    groups
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct PlayerCourse {
    pub id: i64,
    pub title: String,
    pub modules: Vec<PlayerModule>,
    pub total_completed: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CompleteResponse {
    pub success: bool,
    pub is_completed: bool,
    pub total_completed: i64,
}

impl From<CompletionToggle> for CompleteResponse {
    fn from(toggle: CompletionToggle) -> Self {
        Self {
            success: true,
            is_completed: toggle.is_completed,
            total_completed: toggle.total_completed,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn lesson(id: i64) -> PlayerLesson {
        PlayerLesson {
            id,
            title: format!("Aula {id}"),
            item_type: ItemType::Video,
            duration: DEFAULT_DURATION.to_string(),
            is_completed: false,
            content: LessonContent::default(),
        }
    }

    #[test]
    fn groups_follow_first_appearance() {
        let groups = group_lessons(&[], vec![(0, lesson(1)), (0, lesson(2))]);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].title, GENERAL_MODULE_NAME);
        assert_eq!(
            groups[0].lessons.iter().map(|l| l.id).collect::<Vec<_>>(),
            vec![1, 2]
        );
    }

    #[test]
    fn unknown_module_falls_back_to_general() {
        let groups = group_lessons(&[], vec![(42, lesson(3))]);
        assert_eq!(groups[0].id, GENERAL_MODULE_ID);
    }

    #[test]
    fn toggle_converts_to_response() {
        let resp = CompleteResponse::from(CompletionToggle {
            is_completed: true,
            total_completed: 3,
        });
        assert!(resp.success);
        assert_eq!(resp.total_completed, 3);
    }
}
