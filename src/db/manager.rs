use crate::config::DatabaseConfig;
use crate::db::{CredentialStore, DatabaseError, ThreadStore};
use std::sync::Arc;

#[cfg(feature = "sqlite")]
use crate::db::sqlite::{SqliteCredentialStore, SqliteTarget, SqliteThreadStore};
#[cfg(feature = "sqlite")]
use diesel::RunQueryDsl;

#[derive(Clone)]
pub struct DatabaseManager {
    #[cfg(feature = "sqlite")]
    target: Arc<SqliteTarget>,
    credential_store: Arc<dyn CredentialStore>,
    thread_store: Arc<dyn ThreadStore>,
}

impl DatabaseManager {
    pub async fn new(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        #[cfg(feature = "sqlite")]
        {
            let path = config.sqlite_path();
            if path.is_empty() {
                return Err(DatabaseError::Connection(
                    "sqlite database path is empty".to_string(),
                ));
            }

            let target = Arc::new(SqliteTarget::new(path, config.busy_timeout_ms));
            let credential_store = Arc::new(SqliteCredentialStore::new(target.clone()));
            let thread_store = Arc::new(SqliteThreadStore::new(target.clone()));

            Ok(Self {
                target,
                credential_store,
                thread_store,
            })
        }

        #[cfg(not(feature = "sqlite"))]
        {
            let _ = config;
            Err(DatabaseError::Connection(
                "SQLite feature not enabled".to_string(),
            ))
        }
    }

    pub async fn migrate(&self) -> Result<(), DatabaseError> {
        #[cfg(feature = "sqlite")]
        {
            Self::migrate_sqlite(self.target.clone()).await
        }

        #[cfg(not(feature = "sqlite"))]
        {
            Err(DatabaseError::Migration(
                "SQLite feature not enabled".to_string(),
            ))
        }
    }

    // Additive only: every statement must stay safe to run on an existing file.
    #[cfg(feature = "sqlite")]
    async fn migrate_sqlite(target: Arc<SqliteTarget>) -> Result<(), DatabaseError> {
        tokio::task::spawn_blocking(move || {
            let mut conn = target.connect()?;

            let statements = [
                r#"
                CREATE TABLE IF NOT EXISTS chat_credentials (
                    chat_id INTEGER PRIMARY KEY NOT NULL,
                    collection_id TEXT,
                    secret TEXT,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                )
                "#,
                r#"
                CREATE TABLE IF NOT EXISTS thread_links (
                    chat_id INTEGER NOT NULL,
                    message_id INTEGER NOT NULL,
                    remote_record_id TEXT NOT NULL,
                    created_at TEXT NOT NULL,
                    PRIMARY KEY (chat_id, message_id)
                )
                "#,
                "CREATE INDEX IF NOT EXISTS idx_thread_links_record ON thread_links(remote_record_id)",
            ];

            for statement in statements {
                diesel::sql_query(statement)
                    .execute(&mut conn)
                    .map_err(|e| DatabaseError::Migration(e.to_string()))?;
            }

            Ok(())
        })
        .await
        .map_err(|e| DatabaseError::Migration(format!("migration task failed: {e}")))?
    }

    pub fn credential_store(&self) -> Arc<dyn CredentialStore> {
        self.credential_store.clone()
    }

    pub fn thread_store(&self) -> Arc<dyn ThreadStore> {
        self.thread_store.clone()
    }
}

#[cfg(test)]
mod tests {
    use tempfile::NamedTempFile;

    use super::DatabaseManager;
    use crate::config::DatabaseConfig;
    use crate::db::ThreadLink;

    fn sqlite_config(file: &NamedTempFile) -> DatabaseConfig {
        DatabaseConfig {
            url: None,
            filename: file.path().to_string_lossy().to_string(),
            busy_timeout_ms: 5000,
        }
    }

    async fn open(config: &DatabaseConfig) -> DatabaseManager {
        let manager = DatabaseManager::new(config).await.expect("db manager");
        manager.migrate().await.expect("migrate");
        manager
    }

    #[tokio::test]
    async fn sqlite_credential_upsert_preserves_other_field() {
        let file = NamedTempFile::new().expect("temp sqlite file");
        let manager = open(&sqlite_config(&file)).await;
        let store = manager.credential_store();

        assert!(store.get_credential(42).await.expect("get").is_none());

        store.set_collection(42, "X").await.expect("set collection");
        let partial = store
            .get_credential(42)
            .await
            .expect("get after collection")
            .expect("credential exists");
        assert_eq!(partial.collection_id.as_deref(), Some("X"));
        assert!(partial.secret.is_none());

        store.set_secret(42, "Y").await.expect("set secret");
        let full = store
            .get_credential(42)
            .await
            .expect("get after secret")
            .expect("credential exists");
        assert_eq!(full.collection_id.as_deref(), Some("X"));
        assert_eq!(full.secret.as_deref(), Some("Y"));

        store.set_collection(42, "Z").await.expect("replace collection");
        let replaced = store
            .get_credential(42)
            .await
            .expect("get after replace")
            .expect("credential exists");
        assert_eq!(replaced.collection_id.as_deref(), Some("Z"));
        assert_eq!(replaced.secret.as_deref(), Some("Y"));
        assert_eq!(replaced.created_at, full.created_at);

        assert_eq!(store.count_credentials().await.expect("count"), 1);
    }

    #[tokio::test]
    async fn sqlite_credentials_are_isolated_per_chat() {
        let file = NamedTempFile::new().expect("temp sqlite file");
        let manager = open(&sqlite_config(&file)).await;
        let store = manager.credential_store();

        store.set_secret(1, "secret-one").await.expect("set secret 1");
        store.set_collection(2, "db-two").await.expect("set collection 2");

        let one = store.get_credential(1).await.expect("get 1").expect("exists");
        let two = store.get_credential(2).await.expect("get 2").expect("exists");
        assert_eq!(one.secret.as_deref(), Some("secret-one"));
        assert!(one.collection_id.is_none());
        assert_eq!(two.collection_id.as_deref(), Some("db-two"));
        assert!(two.secret.is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn sqlite_concurrent_credential_writes_keep_both_fields() {
        let file = NamedTempFile::new().expect("temp sqlite file");
        let manager = open(&sqlite_config(&file)).await;

        let mut handles = Vec::new();
        for round in 0..8 {
            let store = manager.credential_store();
            handles.push(tokio::spawn(async move {
                store
                    .set_collection(7, &format!("collection-{round}"))
                    .await
            }));
            let store = manager.credential_store();
            handles.push(tokio::spawn(async move {
                store.set_secret(7, &format!("secret-{round}")).await
            }));
        }
        for handle in handles {
            handle.await.expect("join").expect("write");
        }

        let stored = manager
            .credential_store()
            .get_credential(7)
            .await
            .expect("get")
            .expect("exists");
        assert!(stored
            .collection_id
            .as_deref()
            .is_some_and(|value| value.starts_with("collection-")));
        assert!(stored
            .secret
            .as_deref()
            .is_some_and(|value| value.starts_with("secret-")));
    }

    #[tokio::test]
    async fn sqlite_thread_link_first_write_wins_and_persists() {
        let file = NamedTempFile::new().expect("temp sqlite file");
        let config = sqlite_config(&file);
        let manager = open(&config).await;
        let store = manager.thread_store();

        let inserted = store
            .put_link(&ThreadLink::new(42, 100, "r1"))
            .await
            .expect("insert link");
        assert!(inserted);

        let duplicate = store
            .put_link(&ThreadLink::new(42, 100, "r2"))
            .await
            .expect("duplicate link");
        assert!(!duplicate);

        let other_chat = store
            .put_link(&ThreadLink::new(43, 100, "r3"))
            .await
            .expect("same message id in other chat");
        assert!(other_chat);

        let manager_reopened = open(&config).await;
        let store = manager_reopened.thread_store();

        let link = store
            .get_link(42, 100)
            .await
            .expect("query link")
            .expect("link exists");
        assert_eq!(link.remote_record_id, "r1");

        let other = store
            .get_link(43, 100)
            .await
            .expect("query other chat")
            .expect("other link exists");
        assert_eq!(other.remote_record_id, "r3");

        assert!(store.get_link(42, 101).await.expect("query missing").is_none());
        assert_eq!(store.count_links().await.expect("count"), 2);
    }

    #[tokio::test]
    async fn empty_path_is_rejected() {
        let config = DatabaseConfig {
            url: None,
            filename: String::new(),
            busy_timeout_ms: 5000,
        };

        assert!(DatabaseManager::new(&config).await.is_err());
    }
}
