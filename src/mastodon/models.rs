// Shared types for Mastodon notifications and statuses.
//
// Unknown payload fields are kept in flattened maps so the native
// serialization mode can write the event back out losslessly.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The actor behind a notification.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Account {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub acct: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A status (toot) attached to a notification, or fetched from a timeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Status {
    pub id: String,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account: Option<Account>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One activity notification (mention, favourite, reblog, follow, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub created_at: String,
    #[serde(default)]
    pub account: Account,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NotificationEvent {
    /// Normalize a raw timeline status into the common event shape.
    ///
    /// `id`, `account` and `created_at` are split out to the top level and
    /// the remainder nested under `status`, with `type` fixed to "status".
    /// The account moves rather than copies; `created_at` stays on the
    /// nested status too, where document builders read it.
    pub fn from_status(mut status: Status) -> Self {
        let account = status.account.take().unwrap_or_default();
        Self {
            id: status.id.clone(),
            kind: "status".to_string(),
            created_at: status.created_at.clone(),
            account,
            status: Some(status),
            extra: Map::new(),
        }
    }

    /// The event as a JSON value, as handed to transforms and sinks.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
