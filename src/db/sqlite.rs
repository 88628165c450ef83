use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use std::sync::Arc;

use crate::db::schema_sqlite::{chat_credentials, thread_links};

use super::{
    DatabaseError,
    models::{ChatCredential, ThreadLink},
};

// Helper function to convert DateTime to ISO string for SQLite
fn datetime_to_string(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

// Helper function to parse ISO string to DateTime
fn string_to_datetime(s: &str) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DatabaseError::Query(format!("invalid datetime format: {}", e)))
}

/// Location of the database file plus the per-connection settings.
#[derive(Debug, Clone)]
pub struct SqliteTarget {
    pub path: String,
    pub busy_timeout_ms: u64,
}

impl SqliteTarget {
    pub fn new(path: impl Into<String>, busy_timeout_ms: u64) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms,
        }
    }

    pub fn connect(&self) -> Result<SqliteConnection, DatabaseError> {
        let mut conn = SqliteConnection::establish(&self.path)
            .map_err(|e| DatabaseError::Connection(e.to_string()))?;
        conn.batch_execute(&format!("PRAGMA busy_timeout = {};", self.busy_timeout_ms))
            .map_err(|e| DatabaseError::Connection(e.to_string()))?;
        Ok(conn)
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = chat_credentials)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
struct DbChatCredential {
    chat_id: i64,
    collection_id: Option<String>,
    secret: Option<String>,
    created_at: String,
    updated_at: String,
}

impl DbChatCredential {
    fn to_chat_credential(&self) -> Result<ChatCredential, DatabaseError> {
        Ok(ChatCredential {
            chat_id: self.chat_id,
            collection_id: self.collection_id.clone(),
            secret: self.secret.clone(),
            created_at: string_to_datetime(&self.created_at)?,
            updated_at: string_to_datetime(&self.updated_at)?,
        })
    }
}

#[derive(Insertable)]
#[diesel(table_name = chat_credentials)]
struct NewChatCredential<'a> {
    chat_id: i64,
    collection_id: Option<&'a str>,
    secret: Option<&'a str>,
    created_at: String,
    updated_at: String,
}

// Both fields are always written so the stored row is replaced as a whole.
#[derive(AsChangeset)]
#[diesel(table_name = chat_credentials)]
#[diesel(treat_none_as_null = true)]
struct ReplaceChatCredential<'a> {
    collection_id: Option<&'a str>,
    secret: Option<&'a str>,
    updated_at: String,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = thread_links)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
struct DbThreadLink {
    chat_id: i64,
    message_id: i64,
    remote_record_id: String,
    created_at: String,
}

impl DbThreadLink {
    fn to_thread_link(&self) -> Result<ThreadLink, DatabaseError> {
        Ok(ThreadLink {
            chat_id: self.chat_id,
            message_id: self.message_id,
            remote_record_id: self.remote_record_id.clone(),
            created_at: string_to_datetime(&self.created_at)?,
        })
    }
}

#[derive(Insertable)]
#[diesel(table_name = thread_links)]
struct NewThreadLink<'a> {
    chat_id: i64,
    message_id: i64,
    remote_record_id: &'a str,
    created_at: String,
}

enum CredentialField {
    Collection(String),
    Secret(String),
}

fn upsert_credential_field(
    conn: &mut SqliteConnection,
    chat: i64,
    field: CredentialField,
) -> Result<(), DatabaseError> {
    // IMMEDIATE takes the write lock before the read, so two writers for the
    // same chat cannot both read the old row.
    conn.immediate_transaction::<_, DatabaseError, _>(|conn| {
        let existing = chat_credentials::table
            .filter(chat_credentials::chat_id.eq(chat))
            .select(DbChatCredential::as_select())
            .first::<DbChatCredential>(conn)
            .optional()?;

        let (mut next_collection, mut next_secret) = existing
            .as_ref()
            .map(|row| (row.collection_id.clone(), row.secret.clone()))
            .unwrap_or((None, None));
        match field {
            CredentialField::Collection(value) => next_collection = Some(value),
            CredentialField::Secret(value) => next_secret = Some(value),
        }

        let now = datetime_to_string(&Utc::now());
        if existing.is_some() {
            let changes = ReplaceChatCredential {
                collection_id: next_collection.as_deref(),
                secret: next_secret.as_deref(),
                updated_at: now,
            };
            diesel::update(chat_credentials::table.filter(chat_credentials::chat_id.eq(chat)))
                .set(changes)
                .execute(conn)?;
        } else {
            let new_credential = NewChatCredential {
                chat_id: chat,
                collection_id: next_collection.as_deref(),
                secret: next_secret.as_deref(),
                created_at: now.clone(),
                updated_at: now,
            };
            diesel::insert_into(chat_credentials::table)
                .values(new_credential)
                .execute(conn)?;
        }

        Ok(())
    })
}

pub struct SqliteCredentialStore {
    target: Arc<SqliteTarget>,
}

impl SqliteCredentialStore {
    pub fn new(target: Arc<SqliteTarget>) -> Self {
        Self { target }
    }
}

#[async_trait]
impl super::CredentialStore for SqliteCredentialStore {
    async fn get_credential(
        &self,
        chat: i64,
    ) -> Result<Option<ChatCredential>, DatabaseError> {
        let target = self.target.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = target.connect()?;
            chat_credentials::table
                .filter(chat_credentials::chat_id.eq(chat))
                .select(DbChatCredential::as_select())
                .first::<DbChatCredential>(&mut conn)
                .optional()
                .map_err(|e| DatabaseError::Query(e.to_string()))?
                .map(|row| row.to_chat_credential())
                .transpose()
        })
        .await
        .map_err(|e| DatabaseError::Query(format!("database task failed: {e}")))?
    }

    async fn set_collection(&self, chat: i64, collection: &str) -> Result<(), DatabaseError> {
        let field = CredentialField::Collection(collection.to_string());
        let target = self.target.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = target.connect()?;
            upsert_credential_field(&mut conn, chat, field)
        })
        .await
        .map_err(|e| DatabaseError::Query(format!("database task failed: {e}")))?
    }

    async fn set_secret(&self, chat: i64, secret: &str) -> Result<(), DatabaseError> {
        let field = CredentialField::Secret(secret.to_string());
        let target = self.target.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = target.connect()?;
            upsert_credential_field(&mut conn, chat, field)
        })
        .await
        .map_err(|e| DatabaseError::Query(format!("database task failed: {e}")))?
    }

    async fn count_credentials(&self) -> Result<i64, DatabaseError> {
        let target = self.target.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = target.connect()?;
            chat_credentials::table
                .count()
                .get_result(&mut conn)
                .map_err(|e| DatabaseError::Query(e.to_string()))
        })
        .await
        .map_err(|e| DatabaseError::Query(format!("database task failed: {e}")))?
    }
}

pub struct SqliteThreadStore {
    target: Arc<SqliteTarget>,
}

impl SqliteThreadStore {
    pub fn new(target: Arc<SqliteTarget>) -> Self {
        Self { target }
    }
}

#[async_trait]
impl super::ThreadStore for SqliteThreadStore {
    async fn get_link(
        &self,
        chat: i64,
        message: i64,
    ) -> Result<Option<ThreadLink>, DatabaseError> {
        let target = self.target.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = target.connect()?;
            thread_links::table
                .filter(thread_links::chat_id.eq(chat))
                .filter(thread_links::message_id.eq(message))
                .select(DbThreadLink::as_select())
                .first::<DbThreadLink>(&mut conn)
                .optional()
                .map_err(|e| DatabaseError::Query(e.to_string()))?
                .map(|row| row.to_thread_link())
                .transpose()
        })
        .await
        .map_err(|e| DatabaseError::Query(format!("database task failed: {e}")))?
    }

    async fn put_link(&self, link: &ThreadLink) -> Result<bool, DatabaseError> {
        let link = link.clone();
        let target = self.target.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = target.connect()?;
            let new_link = NewThreadLink {
                chat_id: link.chat_id,
                message_id: link.message_id,
                remote_record_id: &link.remote_record_id,
                created_at: datetime_to_string(&link.created_at),
            };

            diesel::insert_or_ignore_into(thread_links::table)
                .values(new_link)
                .execute(&mut conn)
                .map(|inserted| inserted > 0)
                .map_err(|e| DatabaseError::Query(e.to_string()))
        })
        .await
        .map_err(|e| DatabaseError::Query(format!("database task failed: {e}")))?
    }

    async fn count_links(&self) -> Result<i64, DatabaseError> {
        let target = self.target.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = target.connect()?;
            thread_links::table
                .count()
                .get_result(&mut conn)
                .map_err(|e| DatabaseError::Query(e.to_string()))
        })
        .await
        .map_err(|e| DatabaseError::Query(format!("database task failed: {e}")))?
    }
}
