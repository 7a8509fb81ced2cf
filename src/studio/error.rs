use thiserror::Error;

use super::editor::EditorError;
use crate::client::ApiError;

pub type StudioResult<T> = std::result::Result<T, StudioError>;

#[derive(Debug, Error)]
pub enum StudioError {
    #[error("api error: {0}")]
    Api(#[from] ApiError),
    #[error("editor error: {0}")]
    Editor(#[from] EditorError),
    #[error("you are not allowed to use the Studio")]
    AccessDenied,
    #[error("no course is selected")]
    NoCourseSelected,
    #[error("module {0} is not in the loaded course")]
    UnknownModule(i64),
    #[error("item {0} is not in the loaded course")]
    UnknownItem(i64),
}

impl StudioError {
    /// Text suitable for a notice.
    pub fn message(&self) -> String {
        match self {
            Self::Api(e) => e.message(),
            Self::Editor(e) => e.to_string(),
            e => e.to_string(),
        }
    }
}
