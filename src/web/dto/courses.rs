use serde::{Deserialize, Serialize};

use crate::model::entity::{Course, PostStatus};

/// Row of the studio course list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CourseSummary {
    pub id: i64,
    pub title: String,
    pub status: PostStatus,
    pub date: String,
    pub cover_id: i64,
    pub cover_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CourseDetail {
    pub id: i64,
    pub title: String,
    pub status: PostStatus,
    pub content: String,
    pub excerpt: String,
    pub cover_id: i64,
    pub cover_url: String,
}

impl From<&Course> for CourseSummary {
    fn from(course: &Course) -> Self {
        Self {
            id: course.id(),
            title: course.title().to_string(),
            status: course.status(),
            date: course.created_at().to_string(),
            cover_id: course.cover_id().unwrap_or(0),
            cover_url: course.cover_url().unwrap_or_default(),
        }
    }
}

impl From<&Course> for CourseDetail {
    fn from(course: &Course) -> Self {
        Self {
            id: course.id(),
            title: course.title().to_string(),
            status: course.status(),
            content: course.content().to_string(),
            excerpt: course.excerpt().to_string(),
            cover_id: course.cover_id().unwrap_or(0),
            cover_url: course.cover_url().unwrap_or_default(),
        }
    }
}
