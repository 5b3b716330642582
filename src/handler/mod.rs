// Transform dispatch — one event in, zero or more documents out.
//
// Handlers form a closed registry behind the `Transform` trait. A handler
// spec names a registry entry either directly ("announce") or as a path
// whose file stem is matched, with the `@handler` placeholder token
// standing in for the built-in handler set. Handlers are constructed
// fresh on every resolution and hold no state across events.

pub mod announce;
pub mod references;

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::error::Error;
use crate::profile::Dereferencer;

pub use announce::Origin;

/// A pluggable transform mapping one event to an ordered list of
/// output documents.
#[async_trait]
pub trait Transform: Send + Sync {
    async fn handle(&self, event: &Value) -> Result<Vec<Value>, Error>;
}

/// Everything a handler may need beyond the event itself.
pub struct HandlerContext {
    /// Client for actor-profile dereferencing.
    pub dereferencer: Arc<Dereferencer>,
    /// This pipeline's own actor identity, carried into documents.
    pub origin: Origin,
    /// Emit one document per reference link instead of one document
    /// carrying all of them.
    pub split_links: bool,
    /// Fixed destination inbox for local generation; when set, profile
    /// dereferencing is skipped.
    pub fixed_inbox: Option<String>,
}

/// The identity transform: a single-element list containing the input.
pub struct Passthrough;

#[async_trait]
impl Transform for Passthrough {
    async fn handle(&self, event: &Value) -> Result<Vec<Value>, Error> {
        Ok(vec![event.clone()])
    }
}

/// Marker for the built-in handler set in a handler path.
const HANDLER_TOKEN: &str = "@handler";

/// Resolve a handler spec to a transform.
///
/// An unset spec falls back to the passthrough identity. A recognized
/// name or path resolves to a freshly constructed built-in handler.
/// Anything else is a resolution error, which aborts only the item
/// being processed.
pub fn resolve(spec: Option<&str>, ctx: &HandlerContext) -> Result<Box<dyn Transform>, Error> {
    let spec = match spec {
        Some(spec) if !spec.is_empty() => spec,
        _ => {
            debug!("Using fallback passthrough handler");
            return Ok(Box::new(Passthrough));
        }
    };

    let trimmed = spec
        .strip_prefix(HANDLER_TOKEN)
        .map(|rest| rest.trim_start_matches('/'))
        .unwrap_or(spec);

    let name = Path::new(trimmed)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(trimmed);

    debug!(spec = spec, name = name, "Resolving handler");

    match name {
        "extract_references" => Ok(Box::new(references::ExtractReferences)),
        "create_event_notification" | "announce" => Ok(Box::new(announce::Announcer::new(
            Arc::clone(&ctx.dereferencer),
            ctx.origin.clone(),
            ctx.split_links,
            ctx.fixed_inbox.clone(),
        ))),
        _ => Err(Error::HandlerResolution(spec.to_string())),
    }
}
