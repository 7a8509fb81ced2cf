use serde::{Deserialize, Serialize};

use crate::model::entity::PostStatus;
use crate::web::dto::courses::CourseSummary;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    #[serde(untagged)]
    Only(PostStatus),
}

impl StatusFilter {
    pub fn matches(&self, status: PostStatus) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => *wanted == status,
        }
    }
}

/// Status and title search over the studio course list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CourseFilter {
    pub status: StatusFilter,
    pub search: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub all: usize,
    pub draft: usize,
    pub publish: usize,
    pub pending: usize,
    pub private: usize,
}

impl StatusCounts {
    pub fn get(&self, filter: StatusFilter) -> usize {
        match filter {
            StatusFilter::All => self.all,
            StatusFilter::Only(PostStatus::Draft) => self.draft,
            StatusFilter::Only(PostStatus::Publish) => self.publish,
            StatusFilter::Only(PostStatus::Pending) => self.pending,
            StatusFilter::Only(PostStatus::Private) => self.private,
        }
    }
}

impl CourseFilter {
    pub fn matches(&self, course: &CourseSummary) -> bool {
        let needle = self.search.trim().to_lowercase();
        let search_ok = needle.is_empty() || course.title.to_lowercase().contains(&needle);
        search_ok && self.status.matches(course.status)
    }

    pub fn apply<'a>(&self, courses: &'a [CourseSummary]) -> Vec<&'a CourseSummary> {
        courses.iter().filter(|c| self.matches(c)).collect()
    }

    /// Per-status totals, ignoring both the status and the search filter.
    pub fn counts(courses: &[CourseSummary]) -> StatusCounts {
        courses.iter().fold(StatusCounts::default(), |mut acc, c| {
            acc.all += 1;
            match c.status {
                PostStatus::Draft => acc.draft += 1,
                PostStatus::Publish => acc.publish += 1,
                PostStatus::Pending => acc.pending += 1,
                PostStatus::Private => acc.private += 1,
            }
            acc
        })
    }
}
