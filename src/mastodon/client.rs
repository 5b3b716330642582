// Authenticated Mastodon REST client.
//
// A thin reqwest wrapper with generic GET/POST helpers and typed
// operations for the endpoints the pipeline uses. One-shot calls carry
// the configured timeout; the streaming connection (see `stream.rs`)
// deliberately does not.

use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::debug;

use super::models::{Account, NotificationEvent, Status};
use crate::error::SourceError;

/// Parameters for the bounded notification poll.
#[derive(Debug, Default, Clone)]
pub struct NotificationQuery {
    pub limit: u32,
    pub exclude_types: Vec<String>,
    pub since_id: Option<String>,
    pub max_id: Option<String>,
}

/// Parameters for the account-timeline lookup.
#[derive(Debug, Default, Clone)]
pub struct TimelineQuery {
    pub limit: u32,
    pub since_id: Option<String>,
    pub max_id: Option<String>,
    pub exclude_reblogs: bool,
    pub exclude_replies: bool,
}

/// Authenticated HTTP client for the Mastodon REST API.
pub struct MastodonClient {
    client: reqwest::Client,
    base_url: String,
    access_token: String,
}

impl MastodonClient {
    /// Create a client for the given instance with a per-call timeout.
    pub fn new(
        base_url: &str,
        access_token: &str,
        timeout: Duration,
    ) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .user_agent("mastopipe/0.1")
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token: access_token.to_string(),
        })
    }

    /// GET an API path with query parameters and deserialize the response.
    async fn api_get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T, SourceError> {
        let url = format!("{}{}", self.base_url, path);

        debug!(path = path, "GET request");

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.access_token)
            .query(params)
            .send()
            .await?;

        Self::decode(response).await
    }

    /// POST a JSON body to an API path and deserialize the response.
    async fn api_post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<T, SourceError> {
        let url = format!("{}{}", self.base_url, path);

        debug!(path = path, "POST request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(body)
            .send()
            .await?;

        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, SourceError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Status { status, body });
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Fetch one notification by id, ignoring all other filters.
    pub async fn get_notification(&self, id: &str) -> Result<NotificationEvent, SourceError> {
        self.api_get(&format!("/api/v1/notifications/{id}"), &[])
            .await
    }

    /// Fetch up to `limit` notifications newer than `since_id`,
    /// filtered by excluded types.
    pub async fn get_notifications(
        &self,
        query: &NotificationQuery,
    ) -> Result<Vec<NotificationEvent>, SourceError> {
        let limit = query.limit.to_string();
        let mut params: Vec<(&str, &str)> = vec![("limit", &limit)];

        for kind in &query.exclude_types {
            params.push(("exclude_types[]", kind));
        }
        if let Some(ref since) = query.since_id {
            params.push(("since_id", since));
        }
        if let Some(ref max) = query.max_id {
            params.push(("max_id", max));
        }

        self.api_get("/api/v1/notifications", &params).await
    }

    /// Resolve an account name (webfinger-style `acct`) to its account record.
    pub async fn lookup_account(&self, acct: &str) -> Result<Account, SourceError> {
        self.api_get("/api/v1/accounts/lookup", &[("acct", acct)])
            .await
    }

    /// Fetch an account's timeline, normalized into the common event shape.
    pub async fn account_statuses(
        &self,
        account_id: &str,
        query: &TimelineQuery,
    ) -> Result<Vec<NotificationEvent>, SourceError> {
        let limit = query.limit.to_string();
        let mut params: Vec<(&str, &str)> = vec![("limit", &limit)];

        if let Some(ref since) = query.since_id {
            params.push(("since_id", since));
        }
        if let Some(ref max) = query.max_id {
            params.push(("max_id", max));
        }
        if query.exclude_reblogs {
            params.push(("exclude_reblogs", "true"));
        }
        if query.exclude_replies {
            params.push(("exclude_replies", "true"));
        }

        let statuses: Vec<Status> = self
            .api_get(&format!("/api/v1/accounts/{account_id}/statuses"), &params)
            .await?;

        Ok(statuses
            .into_iter()
            .map(NotificationEvent::from_status)
            .collect())
    }

    /// Open the persistent user-stream subscription.
    pub async fn stream_user(&self) -> Result<super::stream::UserStream, SourceError> {
        super::stream::connect(&self.base_url, &self.access_token).await
    }

    /// Post a status with the given visibility.
    pub async fn post_status(
        &self,
        content: &str,
        visibility: Option<&str>,
    ) -> Result<Status, SourceError> {
        let mut body = serde_json::json!({ "status": content });
        if let Some(visibility) = visibility {
            body["visibility"] = serde_json::Value::String(visibility.to_string());
        }

        self.api_post("/api/v1/statuses", &body).await
    }
}
