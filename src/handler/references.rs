// Reference extraction from rich-text status content.
//
// References are the hrefs of anchor elements in the HTML fragment,
// minus mentions of other accounts (anchors whose class list carries a
// "mention" marker) — those are addressing, not content references.

use async_trait::async_trait;
use scraper::{Html, Selector};
use serde_json::Value;
use tracing::warn;

use super::Transform;
use crate::error::Error;

/// The rich-text content of an event: `status.content` for notifications,
/// falling back to a top-level `content` for dereferenced documents.
pub fn content_of(event: &Value) -> Option<&str> {
    event
        .pointer("/status/content")
        .and_then(Value::as_str)
        .or_else(|| event.get("content").and_then(Value::as_str))
}

/// Collect the href of every non-mention anchor in an HTML fragment.
pub fn extract_references(content: &str) -> Vec<String> {
    let fragment = Html::parse_fragment(content);
    let Ok(anchor) = Selector::parse("a") else {
        return Vec::new();
    };

    fragment
        .select(&anchor)
        .filter(|el| {
            !el.value()
                .attr("class")
                .is_some_and(|class| class.contains("mention"))
        })
        .filter_map(|el| el.value().attr("href"))
        .map(String::from)
        .collect()
}

/// Transform that annotates the event with its extracted references.
pub struct ExtractReferences;

#[async_trait]
impl Transform for ExtractReferences {
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

        let mut annotated = event.clone();
        if let Some(map) = annotated.as_object_mut() {
            map.insert(
                "references".to_string(),
                Value::Array(references.into_iter().map(Value::String).collect()),
            );
        }

        Ok(vec![annotated])
    }
}
