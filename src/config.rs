use std::env;

use anyhow::Result;

use mastopipe::handler::Origin;

/// Central configuration loaded from environment variables.
///
/// Every value can be overridden by a CLI flag. The .env file is loaded
/// automatically at startup via dotenvy; secrets never live in code.
pub struct Config {
    /// Mastodon instance base URL (MASTODON_URL).
    pub base_url: String,
    /// Access token for the account being ingested (MASTODON_ACCESS_TOKEN).
    pub access_token: String,
    /// Destination directory, or "stdout" (MASTODON_INBOX_PATH).
    pub inbox: String,
    /// Notification types to exclude (MASTODON_EXCLUDE_TYPES, comma list).
    pub exclude: Vec<String>,
    /// Fetch limit per poll (MASTODON_LIMIT_NUM).
    pub limit: u32,
    /// Cursor file path (MASTODON_HISTORY_FILE).
    pub history: Option<String>,
    /// Serialization mode: "native" or "as2" (MASTODON_SERIALIZE_TYPE).
    pub serialize: String,
    /// Handler spec (MASTODON_HANDLER).
    pub handler: Option<String>,
    /// Retry ceiling for one-shot calls (MASTODON_RETRY_ATTEMPTS).
    pub retry_attempts: u32,
    /// Timeout in seconds for one-shot HTTP calls (MASTODON_TIMEOUT_SECS).
    /// The streaming connection itself is never timed out.
    pub timeout_secs: u64,
    /// Fan out one document per reference link when the
    /// MASTODON_HANDLER_FEATURE list contains "split_links".
    pub split_links: bool,
    /// This pipeline's own actor identity (MASTODON_ORIGIN_*).
    pub origin: Origin,
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        let limit = match env::var("MASTODON_LIMIT_NUM") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| anyhow::anyhow!("MASTODON_LIMIT_NUM is not a number: {raw}"))?,
            Err(_) => 10,
        };

        let retry_attempts = match env::var("MASTODON_RETRY_ATTEMPTS") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| anyhow::anyhow!("MASTODON_RETRY_ATTEMPTS is not a number: {raw}"))?,
            Err(_) => mastopipe::backoff::DEFAULT_MAX_ATTEMPTS,
        };

        let timeout_secs = match env::var("MASTODON_TIMEOUT_SECS") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| anyhow::anyhow!("MASTODON_TIMEOUT_SECS is not a number: {raw}"))?,
            Err(_) => 30,
        };

        let split_links = env::var("MASTODON_HANDLER_FEATURE")
            .map(|raw| raw.contains("split_links"))
            .unwrap_or(false);

        Ok(Self {
            base_url: env::var("MASTODON_URL").unwrap_or_default(),
            access_token: env::var("MASTODON_ACCESS_TOKEN").unwrap_or_default(),
            inbox: env::var("MASTODON_INBOX_PATH").unwrap_or_else(|_| "./inbox".to_string()),
            exclude: env::var("MASTODON_EXCLUDE_TYPES")
                .map(|raw| parse_list(&raw))
                .unwrap_or_default(),
            limit,
            history: env::var("MASTODON_HISTORY_FILE").ok(),
            serialize: env::var("MASTODON_SERIALIZE_TYPE")
                .unwrap_or_else(|_| "native".to_string()),
            handler: env::var("MASTODON_HANDLER").ok(),
            retry_attempts,
            timeout_secs,
            split_links,
            origin: Origin {
                id: env::var("MASTODON_ORIGIN_ID").ok(),
                name: env::var("MASTODON_ORIGIN_NAME").ok(),
                inbox: env::var("MASTODON_ORIGIN_INBOX").ok(),
                kind: env::var("MASTODON_ORIGIN_TYPE").ok(),
            },
        })
    }

    /// Check that the instance URL is configured.
    pub fn require_url(&self) -> Result<()> {
        if self.base_url.is_empty() {
            anyhow::bail!(
                "MASTODON_URL not set. Add it to your .env file or pass --url.\n\
                 See .env.example for the required variables."
            );
        }
        Ok(())
    }

    /// Check that the access token is configured.
    pub fn require_token(&self) -> Result<()> {
        if self.access_token.is_empty() {
            anyhow::bail!(
                "MASTODON_ACCESS_TOKEN not set. Add it to your .env file or pass --token.\n\
                 See .env.example for the required variables."
            );
        }
        Ok(())
    }
}
