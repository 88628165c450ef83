use thiserror::Error;
use url::Url;

use super::Config;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.telegram.bot_token.trim().is_empty() {
            return Err(ConfigError::InvalidConfig(
                "telegram.bot_token cannot be empty".to_string(),
            ));
        }

        if let Some(api_url) = self.telegram.api_url.as_deref() {
            if let Err(err) = Url::parse(api_url) {
                return Err(ConfigError::InvalidConfig(format!(
                    "telegram.api_url is not a valid url: {err}"
                )));
            }
        }

        if self.database.sqlite_path().is_empty() {
            return Err(ConfigError::InvalidConfig(
                "database.filename cannot be empty".to_string(),
            ));
        }

        if let Err(err) = Url::parse(&self.notion.api_url) {
            return Err(ConfigError::InvalidConfig(format!(
                "notion.api_url is not a valid url: {err}"
            )));
        }

        if self.notion.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidConfig(
                "notion.request_timeout_secs must be greater than zero".to_string(),
            ));
        }

        if self.notion.title_property.trim().is_empty() {
            return Err(ConfigError::InvalidConfig(
                "notion.title_property cannot be empty".to_string(),
            ));
        }

        if self.web.enabled && self.web.port == 0 {
            return Err(ConfigError::InvalidConfig(
                "web.port must be between 1 and 65535".to_string(),
            ));
        }

        Ok(())
    }
}
