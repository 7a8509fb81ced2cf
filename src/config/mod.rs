use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use tokio::sync::OnceCell;

static CONFIG: OnceCell<Config> = OnceCell::const_new();

mod config_dir;
pub use config_dir::{find_config_file, read_config, read_config_from};

mod error;
pub use error::{ConfigError, ConfigResult};

#[derive(Debug, Deserialize)]
pub struct Config {
    host: Host,
    app: App,
    #[serde(default)]
    studio: Studio,
}

#[derive(Debug, Deserialize)]
pub struct Host {
    bindto: String,
}

#[derive(Debug, Deserialize)]
pub struct App {
    jwt: String,
    database_uri: String,
    #[serde(default)]
    docs: bool,
    #[serde(default = "default_uploads_dir")]
    uploads_dir: PathBuf,
}

/// Client-side knobs for the studio editor.
#[derive(Debug, Clone, Deserialize)]
pub struct Studio {
    #[serde(default = "default_autosave_secs")]
    autosave_secs: u64,
    #[serde(default = "default_notice_secs")]
    notice_secs: u64,
}

fn default_uploads_dir() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_autosave_secs() -> u64 {
    20
}

fn default_notice_secs() -> u64 {
    4
}

impl Default for Studio {
    fn default() -> Self {
        Self {
            autosave_secs: default_autosave_secs(),
            notice_secs: default_notice_secs(),
        }
    }
}

impl Config {
    #[tracing::instrument]
    pub async fn get_or_init(use_local: bool) -> &'static Config {
        CONFIG
            .get_or_init(|| async {
                let config = match Self::load(use_local) {
                    Ok(c) => c,
                    Err(e) => {
                        if !matches!(e, ConfigError::ConfigNotFound) {
                            crate::error::log_error(&e);
                        }
                        tracing::error!("Unable to load config: {e}");
                        std::process::exit(1);
                    }
                };

                config
            })
            .await
    }

    pub fn load(use_local: bool) -> ConfigResult<Self> {
        let bytes = read_config(use_local)?;
        Self::from_slice(&bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> ConfigResult<Self> {
        let config: Self = toml::from_slice(bytes)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.app.jwt.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "app.jwt",
                reason: "must not be empty",
            });
        }
        if self.studio.autosave_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "studio.autosave_secs",
                reason: "must be at least one second",
            });
        }
        Ok(())
    }

    #[inline]
    pub fn host(&self) -> &Host {
        &self.host
    }

    #[inline]
    pub fn app(&self) -> &App {
        &self.app
    }

    #[inline]
    pub fn studio(&self) -> &Studio {
        &self.studio
    }
}

impl Host {
    #[inline]
    pub fn bindto(&self) -> &str {
        &self.bindto
    }
}

impl App {
    #[inline]
    pub fn jwt(&self) -> &str {
        &self.jwt
    }

    #[inline]
    pub fn database_uri(&self) -> &str {
        &self.database_uri
    }

    #[inline]
    pub fn docs(&self) -> bool {
        self.docs
    }

    #[inline]
    pub fn uploads_dir(&self) -> &std::path::Path {
        &self.uploads_dir
    }
}

impl Studio {
    pub fn new(autosave_secs: u64, notice_secs: u64) -> Self {
        Self {
            autosave_secs,
            notice_secs,
        }
    }

    #[inline]
    pub fn autosave_delay(&self) -> Duration {
        Duration::from_secs(self.autosave_secs)
    }

    #[inline]
    pub fn notice_ttl(&self) -> Duration {
        Duration::from_secs(self.notice_secs)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn config_test() {
        let config = Config::get_or_init(true).await;
        assert_eq!(config.host().bindto(), "127.0.0.1:5000"); // defaults
        assert_eq!(config.studio().autosave_delay(), Duration::from_secs(20));
    }

    #[test]
    fn studio_section_is_optional() {
        let config = Config::from_slice(
            br#"
            [host]
            bindto = "0.0.0.0:80"

            [app]
            jwt = "k"
            database_uri = "sqlite::memory:"
            "#,
        )
        .unwrap();

        assert!(!config.app().docs());
        assert_eq!(config.app().uploads_dir(), std::path::Path::new("uploads"));
        assert_eq!(config.studio().notice_ttl(), Duration::from_secs(4));
    }

    #[test]
    fn zero_autosave_is_rejected() {
        let err = Config::from_slice(
            br#"
            [host]
            bindto = "0.0.0.0:80"

            [app]
            jwt = "k"
            database_uri = "sqlite::memory:"

            [studio]
            autosave_secs = 0
            "#,
        )
        .unwrap_err();

        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                key: "studio.autosave_secs",
                ..
            }
        ));
    }
}
