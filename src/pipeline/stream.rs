// Streaming ingestion: process events as they arrive, one at a time.
//
// Each event runs to completion — transform, writes, cursor update —
// before the next is taken from the stream. Transport hiccups are logged
// and the loop keeps listening; only a remote close ends the run.

use std::path::PathBuf;

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::cursor;
use crate::handler::HandlerContext;
use crate::mastodon::MastodonClient;
use crate::pipeline::process::{self, ProcessOptions};

/// Options for one streaming session.
pub struct StreamParams {
    /// Notification types to drop without processing.
    pub exclude: Vec<String>,
    /// Cursor file, updated after every delivered event.
    pub history: Option<PathBuf>,
}

/// Counts for the CLI summary, reported once the remote closes.
pub struct StreamSummary {
    pub events: usize,
    pub documents: usize,
}

/// Run a streaming session until the remote closes the connection.
pub async fn run(
    client: &MastodonClient,
    ctx: &HandlerContext,
    params: &StreamParams,
    opts: &ProcessOptions,
) -> Result<StreamSummary> {
    let mut stream = client.stream_user().await?;
    info!("User stream open, waiting for notifications");

    let mut events = 0usize;
    let mut documents = 0usize;

    loop {
        match stream.next().await {
            Ok(Some(event)) => {
                if params.exclude.iter().any(|t| t == &event.kind) {
                    debug!(id = %event.id, kind = %event.kind, "Excluded type, skipping");
                    continue;
                }

                events += 1;

                match process::process_event(&event, ctx, opts).await {
                    Ok(written) => documents += written,
                    Err(e) => {
                        warn!(id = %event.id, error = %e, "Event processing failed, skipping");
                    }
                }

                // Streaming advances the cursor per event, in arrival order
                if let Some(ref path) = params.history {
                    if let Err(e) = cursor::save(path, &event.id) {
                        warn!(path = %path.display(), error = %e, "Failed to save cursor");
                    }
                }
            }
            Ok(None) => {
                info!("Stream closed by remote");
                break;
            }
            Err(e) => {
                warn!(error = %e, "Stream transport error");
            }
        }
    }

    Ok(StreamSummary { events, documents })
}
