// Per-event processing: serialize, transform, persist.
//
// Every failure in here belongs to one event. Callers log the error and
// move on — one bad event never aborts a batch or a stream.

use std::str::FromStr;

use serde_json::Value;
use tracing::{info, warn};

use crate::error::Error;
use crate::handler::{self, HandlerContext};
use crate::mastodon::models::NotificationEvent;
use crate::sink;

/// What to hand to the transform: the raw event, or the dereferenced
/// activity document behind it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerializeMode {
    Native,
    As2,
}

impl FromStr for SerializeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "native" => Ok(SerializeMode::Native),
            "as2" => Ok(SerializeMode::As2),
            other => Err(format!(
                "unknown serializer type `{other}`: use 'as2' or 'native'"
            )),
        }
    }
}

/// Per-event processing options shared by both ingestion modes.
pub struct ProcessOptions {
    /// Destination directory, or the literal "stdout".
    pub inbox: String,
    pub mode: SerializeMode,
    /// Handler spec; unset means the passthrough fallback.
    pub handler: Option<String>,
}

/// Process one event: build the transform input for the configured
/// serialization mode, resolve the handler fresh, apply it, and write
/// the resulting documents. Returns the number of documents written.
pub async fn process_event(
    event: &NotificationEvent,
    ctx: &HandlerContext,
    opts: &ProcessOptions,
) -> Result<usize, Error> {
    let status_url = event.status.as_ref().and_then(|s| s.url.as_deref());

    info!(
        id = %event.id,
        created_at = %event.created_at,
        kind = %event.kind,
        account = %event.account.acct,
        url = status_url.unwrap_or("-"),
        "Processing notification"
    );

    let item: Value = match opts.mode {
        SerializeMode::Native => event.to_value(),
        SerializeMode::As2 => {
            let Some(url) = status_url else {
                warn!(id = %event.id, kind = %event.kind, "No status url, skipping");
                return Ok(0);
            };
            ctx.dereferencer.fetch_document(url).await?
        }
    };

    let transform = handler::resolve(opts.handler.as_deref(), ctx)?;
    let documents = transform.handle(&item).await?;

    if documents.is_empty() {
        return Ok(0);
    }

    sink::write_documents(&opts.inbox, &event.id, &documents)?;
    Ok(documents.len())
}
