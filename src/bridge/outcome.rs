use serde::Serialize;

use crate::notion::RemoteErrorKind;

pub const SUCCESS_REPLY: &str = "Your message has been added to the Notion database.";
pub const FAILURE_REPLY: &str =
    "Failed to add your message to the Notion database. Please try again.";

/// Which remote write a successful relay performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RelayPath {
    Created,
    Appended,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relayed {
    pub record_id: String,
    pub path: RelayPath,
}

/// Result of relaying one entry. Every failure of the relay ends up here;
/// nothing propagates further up to the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success(Relayed),
    NoCredential,
    NoCollection,
    RemoteFailure(RemoteErrorKind),
    StorageFailure,
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    /// Stable code used in logs.
    pub fn code(&self) -> &'static str {
        match self {
            Outcome::Success(Relayed {
                path: RelayPath::Created,
                ..
            }) => "created",
            Outcome::Success(Relayed {
                path: RelayPath::Appended,
                ..
            }) => "appended",
            Outcome::NoCredential => "no_credential",
            Outcome::NoCollection => "no_collection",
            Outcome::RemoteFailure(kind) => kind.as_str(),
            Outcome::StorageFailure => "storage_failure",
        }
    }

    pub fn reply_text(&self) -> &'static str {
        if self.is_success() {
            SUCCESS_REPLY
        } else {
            FAILURE_REPLY
        }
    }
}
