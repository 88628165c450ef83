use chrono::{DateTime, Utc};

/// Notion target and integration secret configured for one chat.
///
/// Both fields stay `None` until the matching command has been used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatCredential {
    pub chat_id: i64,
    pub collection_id: Option<String>,
    pub secret: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ChatCredential {
    pub fn secret(&self) -> Option<&str> {
        self.secret.as_deref().filter(|value| !value.trim().is_empty())
    }

    pub fn collection_id(&self) -> Option<&str> {
        self.collection_id
            .as_deref()
            .filter(|value| !value.trim().is_empty())
    }
}

/// Remote record an inbound message resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadLink {
    pub chat_id: i64,
    pub message_id: i64,
    pub remote_record_id: String,
    pub created_at: DateTime<Utc>,
}

impl ThreadLink {
    pub fn new(chat_id: i64, message_id: i64, remote_record_id: impl Into<String>) -> Self {
        Self {
            chat_id,
            message_id,
            remote_record_id: remote_record_id.into(),
            created_at: Utc::now(),
        }
    }
}
