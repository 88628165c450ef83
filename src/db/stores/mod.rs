use async_trait::async_trait;

use super::DatabaseError;
use super::models::{ChatCredential, ThreadLink};

#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn get_credential(
        &self,
        chat_id: i64,
    ) -> Result<Option<ChatCredential>, DatabaseError>;
    /// Stores the collection id, keeping whatever secret the chat already has.
    async fn set_collection(
        &self,
        chat_id: i64,
        collection_id: &str,
    ) -> Result<(), DatabaseError>;
    /// Stores the secret, keeping whatever collection id the chat already has.
    async fn set_secret(&self, chat_id: i64, secret: &str) -> Result<(), DatabaseError>;
    async fn count_credentials(&self) -> Result<i64, DatabaseError>;
}

#[async_trait]
pub trait ThreadStore: Send + Sync {
    async fn get_link(
        &self,
        chat_id: i64,
        message_id: i64,
    ) -> Result<Option<ThreadLink>, DatabaseError>;
    /// Returns `false` when a link for the same message already existed; the
    /// stored link is left untouched in that case.
    async fn put_link(&self, link: &ThreadLink) -> Result<bool, DatabaseError>;
    async fn count_links(&self) -> Result<i64, DatabaseError>;
}
