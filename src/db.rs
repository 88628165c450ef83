pub use self::error::DatabaseError;
pub use self::manager::DatabaseManager;
pub use self::models::{ChatCredential, ThreadLink};
pub use self::stores::{CredentialStore, ThreadStore};

pub mod error;
pub mod manager;
pub mod models;
pub mod stores;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "sqlite")]
pub mod schema_sqlite;
