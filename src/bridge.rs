use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use secrecy::SecretString;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::db::{DatabaseError, DatabaseManager, ThreadLink};
use crate::notion::{NotionApi, NotionError, RemoteErrorKind};

pub mod outcome;

pub use self::outcome::{Outcome, RelayPath, Relayed};

/// One inbound entry to relay, already stripped of any command prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayRequest {
    pub entry_text: String,
    pub chat_id: i64,
    pub message_id: i64,
    pub reply_to_message_id: Option<i64>,
}

#[derive(Debug, Error)]
enum RelayError {
    #[error("chat has no notion secret")]
    NoCredential,
    #[error("chat has no notion database")]
    NoCollection,
    #[error("parent record {0} no longer exists")]
    ParentMissing(String),
    #[error(transparent)]
    Remote(#[from] NotionError),
    #[error(transparent)]
    Storage(#[from] DatabaseError),
}

impl RelayError {
    fn is_retryable(&self) -> bool {
        matches!(self, RelayError::Remote(err) if err.kind().is_retryable())
    }
}

impl From<RelayError> for Outcome {
    fn from(err: RelayError) -> Self {
        match err {
            RelayError::NoCredential => Outcome::NoCredential,
            RelayError::NoCollection => Outcome::NoCollection,
            RelayError::ParentMissing(_) => Outcome::RemoteFailure(RemoteErrorKind::NotFound),
            RelayError::Remote(err) => Outcome::RemoteFailure(err.kind()),
            RelayError::Storage(_) => Outcome::StorageFailure,
        }
    }
}

#[derive(Debug, Default)]
pub struct RelayStats {
    received: AtomicU64,
    created: AtomicU64,
    appended: AtomicU64,
    failed: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RelayStatsSnapshot {
    pub received: u64,
    pub created: u64,
    pub appended: u64,
    pub failed: u64,
}

impl RelayStats {
    fn record(&self, outcome: &Outcome) {
        let counter = match outcome {
            Outcome::Success(Relayed {
                path: RelayPath::Created,
                ..
            }) => &self.created,
            Outcome::Success(Relayed {
                path: RelayPath::Appended,
                ..
            }) => &self.appended,
            _ => &self.failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> RelayStatsSnapshot {
        RelayStatsSnapshot {
            received: self.received.load(Ordering::Relaxed),
            created: self.created.load(Ordering::Relaxed),
            appended: self.appended.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

/// Decides between creating a record and appending to a linked one, and keeps
/// the thread map in step with what was written remotely.
#[derive(Clone)]
pub struct BridgeCore {
    db_manager: Arc<DatabaseManager>,
    notion: Arc<dyn NotionApi>,
    stats: Arc<RelayStats>,
}

impl BridgeCore {
    pub fn new(db_manager: Arc<DatabaseManager>, notion: Arc<dyn NotionApi>) -> Self {
        Self {
            db_manager,
            notion,
            stats: Arc::new(RelayStats::default()),
        }
    }

    pub async fn handle(&self, request: &RelayRequest) -> Outcome {
        self.stats.received.fetch_add(1, Ordering::Relaxed);

        let outcome = match self.relay(request).await {
            Ok(relayed) => Outcome::Success(relayed),
            Err(err) => {
                warn!(
                    "relay failed chat_id={} message_id={} reply_to={:?} retryable={} error={}",
                    request.chat_id,
                    request.message_id,
                    request.reply_to_message_id,
                    err.is_retryable(),
                    err
                );
                Outcome::from(err)
            }
        };

        self.stats.record(&outcome);
        info!(
            "relay outcome chat_id={} message_id={} code={}",
            request.chat_id,
            request.message_id,
            outcome.code()
        );
        outcome
    }

    async fn relay(&self, request: &RelayRequest) -> Result<Relayed, RelayError> {
        let credential = self
            .db_manager
            .credential_store()
            .get_credential(request.chat_id)
            .await?;
        let Some(credential) = credential else {
            return Err(RelayError::NoCredential);
        };
        let Some(secret) = credential.secret() else {
            return Err(RelayError::NoCredential);
        };
        let Some(collection_id) = credential.collection_id() else {
            return Err(RelayError::NoCollection);
        };
        let secret = SecretString::from(secret.to_string());

        let thread_store = self.db_manager.thread_store();
        let parent = match request.reply_to_message_id {
            Some(reply_to) => thread_store.get_link(request.chat_id, reply_to).await?,
            None => None,
        };

        let relayed = match parent {
            Some(parent) => {
                let record_id = parent.remote_record_id;
                debug!(
                    "appending under linked record chat_id={} message_id={} record_id={}",
                    request.chat_id, request.message_id, record_id
                );
                if !self.notion.retrieve_record(&secret, &record_id).await? {
                    return Err(RelayError::ParentMissing(record_id));
                }
                self.notion
                    .append_child(&secret, &record_id, &request.entry_text)
                    .await?;
                Relayed {
                    record_id,
                    path: RelayPath::Appended,
                }
            }
            None => {
                let record_id = self
                    .notion
                    .create_record(&secret, collection_id, &request.entry_text)
                    .await?;
                Relayed {
                    record_id,
                    path: RelayPath::Created,
                }
            }
        };

        let inserted = thread_store
            .put_link(&ThreadLink::new(
                request.chat_id,
                request.message_id,
                relayed.record_id.as_str(),
            ))
            .await?;
        if !inserted {
            debug!(
                "thread link already present chat_id={} message_id={}",
                request.chat_id, request.message_id
            );
        }

        Ok(relayed)
    }

    pub async fn set_collection(
        &self,
        chat_id: i64,
        collection_id: &str,
    ) -> Result<(), DatabaseError> {
        self.db_manager
            .credential_store()
            .set_collection(chat_id, collection_id)
            .await?;
        info!("notion database configured chat_id={}", chat_id);
        Ok(())
    }

    pub async fn set_secret(&self, chat_id: i64, secret: &str) -> Result<(), DatabaseError> {
        self.db_manager
            .credential_store()
            .set_secret(chat_id, secret)
            .await?;
        info!("notion secret configured chat_id={}", chat_id);
        Ok(())
    }

    pub fn stats(&self) -> RelayStatsSnapshot {
        self.stats.snapshot()
    }

    pub fn db(&self) -> Arc<DatabaseManager> {
        self.db_manager.clone()
    }
}
