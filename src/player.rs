//! Learner side: one opened course and its completion state.

use thiserror::Error;

use crate::client::{ApiClient, ApiError};
use crate::studio::optimistic::Optimistic;
use crate::web::dto::player::{CompleteResponse, PlayerCourse, PlayerLesson};

pub type PlayerResult<T> = std::result::Result<T, PlayerError>;

#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("api error: {0}")]
    Api(#[from] ApiError),
    #[error("lesson {0} is not part of this course")]
    UnknownLesson(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

impl Progress {
    /// Whole percent, 0 for an empty course.
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        ((self.completed * 100) / self.total) as u8
    }
}

pub struct PlayerSession {
    api: ApiClient,
    course: PlayerCourse,
    current: Option<i64>,
}

impl PlayerSession {
    /// Loads the course and opens its first lesson.
    pub async fn open(api: ApiClient, course_id: i64) -> PlayerResult<Self> {
        let course = api.player_course(course_id).await?;
        let current = course
            .modules
            .iter()
            .flat_map(|m| m.lessons.first())
            .map(|l| l.id)
            .next();
        tracing::debug!(course_id, ?current, "player opened");

        Ok(Self { api, course, current })
    }

    pub fn course(&self) -> &PlayerCourse {
        &self.course
    }

    pub fn lessons(&self) -> impl Iterator<Item = &PlayerLesson> {
        self.course.modules.iter().flat_map(|m| m.lessons.iter())
    }

    pub fn lesson(&self, lesson_id: i64) -> Option<&PlayerLesson> {
        self.lessons().find(|l| l.id == lesson_id)
    }

    fn lesson_mut(course: &mut PlayerCourse, lesson_id: i64) -> Option<&mut PlayerLesson> {
        course
            .modules
            .iter_mut()
            .flat_map(|m| m.lessons.iter_mut())
            .find(|l| l.id == lesson_id)
    }

    pub fn current_lesson(&self) -> Option<&PlayerLesson> {
        self.current.and_then(|id| self.lesson(id))
    }

    pub fn select_lesson(&mut self, lesson_id: i64) -> PlayerResult<&PlayerLesson> {
        if self.lesson(lesson_id).is_none() {
            return Err(PlayerError::UnknownLesson(lesson_id));
        }
        self.current = Some(lesson_id);
        self.lesson(lesson_id).ok_or(PlayerError::UnknownLesson(lesson_id))
    }

    /// The lesson after the current one, across module boundaries.
    pub fn next_lesson(&self) -> Option<&PlayerLesson> {
        let current = self.current?;
        self.lessons().skip_while(|l| l.id != current).nth(1)
    }

    pub fn progress(&self) -> Progress {
        Progress {
            completed: self.lessons().filter(|l| l.is_completed).count(),
            total: self.lessons().count(),
        }
    }

    /// Flips the lesson's flag at once, then adopts the server's answer. The
    /// flag and the course total go back if the call fails.
    pub async fn toggle_complete(&mut self, lesson_id: i64) -> PlayerResult<CompleteResponse> {
        if self.lesson(lesson_id).is_none() {
            return Err(PlayerError::UnknownLesson(lesson_id));
        }

        let pending = Optimistic::modify(&mut self.course, |course| {
            let Some(lesson) = Self::lesson_mut(course, lesson_id) else {
                return;
            };
            lesson.is_completed = !lesson.is_completed;
            let delta = if lesson.is_completed { 1 } else { -1 };
            course.total_completed += delta;
        });

        match self.api.complete_lesson(lesson_id).await {
            Ok(response) => {
                let _ = pending.commit();
                if let Some(lesson) = Self::lesson_mut(&mut self.course, lesson_id) {
                    lesson.is_completed = response.is_completed;
                }
                self.course.total_completed = response.total_completed;
                Ok(response)
            }
            Err(e) => {
                tracing::warn!(lesson_id, "completion toggle failed: {}", e.message());
                pending.rollback(&mut self.course);
                Err(e.into())
            }
        }
    }
}
