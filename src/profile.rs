// ActivityPub dereferencing — fetch actor profiles and activity documents.
//
// Plain HTTP GETs with an `Accept: application/activity+json` header
// against arbitrary fediverse URLs. Profiles are fetched on demand and
// never cached across events.

use std::time::Duration;

use regex_lite::Regex;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{Error, SourceError};

const ACTIVITY_JSON: &str = "application/activity+json";

/// One `{name, value}` metadata pair on a profile; values may carry
/// inline markup.
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileField {
    pub name: String,
    pub value: String,
}

/// A dereferenced actor profile.
#[derive(Debug, Clone, Deserialize)]
pub struct ActorProfile {
    /// Delivery endpoint for documents addressed to this actor.
    pub inbox: String,
    #[serde(default)]
    pub attachment: Vec<ProfileField>,
}

/// HTTP client for dereferencing fediverse URLs.
pub struct Dereferencer {
    client: reqwest::Client,
}

impl Dereferencer {
    /// Build a dereferencer whose requests abort after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .user_agent("mastopipe/0.1")
            .timeout(timeout)
            .build()?;

        Ok(Self { client })
    }

    /// Fetch an actor profile; requires at least an `inbox`.
    pub async fn fetch_profile(&self, url: &str) -> Result<ActorProfile, Error> {
        let body = self.fetch(url).await?;
        serde_json::from_value(body).map_err(|e| Error::Dereference {
            url: url.to_string(),
            reason: format!("malformed profile: {e}"),
        })
    }

    /// Fetch an arbitrary activity document (as2 serialization mode).
    pub async fn fetch_document(&self, url: &str) -> Result<Value, Error> {
        self.fetch(url).await
    }

    async fn fetch(&self, url: &str) -> Result<Value, Error> {
        debug!(url = url, "Dereferencing");

        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, ACTIVITY_JSON)
            .send()
            .await
            .map_err(|e| Error::Dereference {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Dereference {
                url: url.to_string(),
                reason: format!("got {status}"),
            });
        }

        response.json().await.map_err(|e| Error::Dereference {
            url: url.to_string(),
            reason: format!("malformed body: {e}"),
        })
    }
}

/// The first attachment value whose name matches `pattern`, with inline
/// markup stripped. Returns `None` when nothing matches or the pattern
/// is invalid.
pub fn attachment_value(profile: &ActorProfile, pattern: &str) -> Option<String> {
    let name_re = Regex::new(pattern).ok()?;
    let tag_re = Regex::new("<[^>]+>").ok()?;

    profile
        .attachment
        .iter()
        .find(|field| name_re.is_match(&field.name))
        .map(|field| tag_re.replace_all(&field.value, "").into_owned())
}
