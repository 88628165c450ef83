pub use self::parser::{
    Config, DatabaseConfig, LoggingConfig, NotionConfig, TelegramConfig, WebConfig,
};
pub use self::validator::ConfigError;

mod parser;
mod validator;
