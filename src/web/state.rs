use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::Config;
use crate::model::ModelManager;

#[derive(Debug, Clone)]
pub struct AppState {
    mm: ModelManager,
    jwt: Arc<str>,
    uploads_dir: Arc<PathBuf>,
}

impl AppState {
    pub fn new<S: Into<Arc<str>>>(mm: ModelManager, jwt: S, uploads_dir: PathBuf) -> Self {
        Self {
            mm,
            jwt: jwt.into(),
            uploads_dir: Arc::new(uploads_dir),
        }
    }

    pub fn from_config(mm: ModelManager, config: &Config) -> Self {
        Self::new(mm, config.app().jwt(), config.app().uploads_dir().to_path_buf())
    }

    pub fn pool(&self) -> &ModelManager {
        &self.mm
    }

    pub fn jwt(&self) -> &str {
        &self.jwt
    }

    pub fn uploads_dir(&self) -> &Path {
        &self.uploads_dir
    }
}
