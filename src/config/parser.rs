use super::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub notion: NotionConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub web: WebConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: String,
    #[serde(default)]
    pub api_url: Option<String>,
    #[serde(default = "default_register_commands")]
    pub register_commands: bool,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            api_url: None,
            register_commands: default_register_commands(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NotionConfig {
    #[serde(default = "default_notion_api_url")]
    pub api_url: String,
    #[serde(default = "default_notion_version")]
    pub api_version: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_title_property")]
    pub title_property: String,
}

impl Default for NotionConfig {
    fn default() -> Self {
        Self {
            api_url: default_notion_api_url(),
            api_version: default_notion_version(),
            request_timeout_secs: default_request_timeout_secs(),
            title_property: default_title_property(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_database_filename")]
    pub filename: String,
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            filename: default_database_filename(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

impl DatabaseConfig {
    pub fn sqlite_path(&self) -> String {
        match self.url.as_deref() {
            Some(url) if !url.is_empty() => {
                url.strip_prefix("sqlite://").unwrap_or(url).to_string()
            }
            _ => self.filename.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(alias = "console", default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WebConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_web_port")]
    pub port: u16,
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: default_web_port(),
            bind_address: default_bind_address(),
        }
    }
}

impl Config {
    /// Loads `path`, falling back to built-in defaults when the file does not
    /// exist, then applies environment overrides and validates.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Self::load_with_env(path.as_ref(), |key| std::env::var(key).ok())
    }

    fn load_with_env<F>(path: &Path, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match std::fs::read_to_string(path) {
            Ok(content) => Self::from_yaml(&content)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(err) => return Err(err.into()),
        };
        config.apply_env_overrides(lookup);
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(content)?)
    }

    fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("TELEGRAM_BOT_TOKEN") {
            self.telegram.bot_token = value;
        }
        if let Some(value) = lookup("NOTION_API_URL") {
            self.notion.api_url = value;
        }
        if let Some(value) = lookup("DATABASE_FILENAME") {
            self.database.url = None;
            self.database.filename = value;
        }
    }
}

fn default_register_commands() -> bool {
    true
}

fn default_notion_api_url() -> String {
    "https://api.notion.com".to_string()
}

fn default_notion_version() -> String {
    "2022-06-28".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_title_property() -> String {
    "title".to_string()
}

fn default_database_filename() -> String {
    "bot_db.sqlite".to_string()
}

fn default_busy_timeout_ms() -> u64 {
    5000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_web_port() -> u16 {
    9006
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}
