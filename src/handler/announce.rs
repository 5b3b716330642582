// The announcer transform — relay extracted references as "Announce"
// documents addressed to the actor's inbox.
//
// Requires the actor's inbox URI, so a failed profile dereference is a
// warning-level "no output" outcome, never a pipeline error.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

use super::references::{content_of, extract_references};
use super::Transform;
use crate::error::Error;
use crate::profile::Dereferencer;

const AS2_CONTEXT: &str = "https://www.w3.org/ns/activitystreams";
const GENERATOR_ID: &str = "https://crates.io/crates/mastopipe";

/// This pipeline's own actor identity, carried in every document's
/// `origin` block.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Origin {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inbox: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

/// One reference link inside a document's object.
#[derive(Debug, Clone, Serialize)]
pub struct Link {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub href: String,
}

impl Link {
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            kind: "Link",
            href: href.into(),
        }
    }
}

#[derive(Serialize)]
struct ActorRef<'a> {
    id: &'a str,
    name: &'a str,
    inbox: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Serialize)]
struct NoteObject<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<&'a str>,
    url: &'a [Link],
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Serialize)]
struct Generator<'a> {
    id: &'static str,
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    context: Option<&'a str>,
}

#[derive(Serialize)]
struct AnnounceDocument<'a> {
    #[serde(rename = "@context")]
    context: &'static str,
    id: String,
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    published: Option<&'a str>,
    actor: ActorRef<'a>,
    origin: &'a Origin,
    object: NoteObject<'a>,
    generator: Generator<'a>,
}

/// Build one Announce document for an event and a set of reference links.
///
/// `inbox` is where the document is deliverable to — the dereferenced
/// actor profile's inbox during live ingestion, or a fixed configured
/// inbox for local generation. The document id is a fresh URN.
pub fn build_announce(event: &Value, inbox: &str, links: &[Link], origin: &Origin) -> Value {
    let status_url = event.pointer("/status/url").and_then(Value::as_str);

    let document = AnnounceDocument {
        context: AS2_CONTEXT,
        id: format!("urn:uuid:{}", Uuid::new_v4()),
        kind: "Announce",
        published: event.pointer("/status/created_at").and_then(Value::as_str),
        actor: ActorRef {
            id: event.pointer("/account/url").and_then(Value::as_str).unwrap_or(""),
            name: event
                .pointer("/account/display_name")
                .and_then(Value::as_str)
                .unwrap_or(""),
            inbox,
            kind: "Person",
        },
        origin,
        object: NoteObject {
            id: status_url,
            content: content_of(event),
            url: links,
            kind: "Note",
        },
        generator: Generator {
            id: GENERATOR_ID,
            kind: "Application",
            context: status_url,
        },
    };

    serde_json::to_value(&document).unwrap_or(Value::Null)
}

/// Transform that turns reference-bearing events into Announce documents.
pub struct Announcer {
    dereferencer: Arc<Dereferencer>,
    origin: Origin,
    split_links: bool,
    fixed_inbox: Option<String>,
}

impl Announcer {
    pub fn new(
        dereferencer: Arc<Dereferencer>,
        origin: Origin,
        split_links: bool,
        fixed_inbox: Option<String>,
    ) -> Self {
        Self {
            dereferencer,
            origin,
            split_links,
            fixed_inbox,
        }
    }

    /// The inbox to address documents to: the configured fixed inbox, or
    /// the event actor's dereferenced profile inbox.
    async fn resolve_inbox(&self, event: &Value) -> Option<String> {
        if let Some(ref inbox) = self.fixed_inbox {
            return Some(inbox.clone());
        }

        let Some(actor_url) = event.pointer("/account/url").and_then(Value::as_str) else {
            warn!("No actor url in notification");
            return None;
        };

        match self.dereferencer.fetch_profile(actor_url).await {
            Ok(profile) => Some(profile.inbox),
            Err(e) => {
                warn!(url = actor_url, error = %e, "Unable to dereference profile");
                None
            }
        }
    }
}

#[async_trait]
impl Transform for Announcer {
    async fn handle(&self, event: &Value) -> Result<Vec<Value>, Error> {
        let Some(content) = content_of(event) else {
            warn!("No content in notification");
            return Ok(Vec::new());
        };

        let references = extract_references(content);
        if references.is_empty() {
            warn!("No references in notification");
            return Ok(Vec::new());
        }

        let Some(inbox) = self.resolve_inbox(event).await else {
            return Ok(Vec::new());
        };

        let links: Vec<Link> = references.into_iter().map(Link::new).collect();

        if self.split_links {
            // Fan out: one minimal single-link Announce per reference
            Ok(links
                .iter()
                .map(|link| {
                    build_announce(event, &inbox, std::slice::from_ref(link), &self.origin)
                })
                .collect())
        } else {
            Ok(vec![build_announce(event, &inbox, &links, &self.origin)])
        }
    }
}
