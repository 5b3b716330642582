use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};

use mastopipe::handler::announce::{build_announce, Announcer, Link};
use mastopipe::handler::references::{content_of, extract_references};
use mastopipe::handler::{resolve, HandlerContext, Origin, Transform};
use mastopipe::profile::Dereferencer;
use mastopipe::Error;

fn context() -> HandlerContext {
    HandlerContext {
        dereferencer: Arc::new(Dereferencer::new(Duration::from_secs(5)).unwrap()),
        origin: Origin {
            id: Some("https://pipeline.example/actor".to_string()),
            name: Some("Event Log".to_string()),
            inbox: Some("https://pipeline.example/inbox".to_string()),
            kind: Some("Service".to_string()),
        },
        split_links: false,
        fixed_inbox: Some("https://target.example/inbox".to_string()),
    }
}

fn mention_event() -> Value {
    json!({
        "id": "42",
        "type": "mention",
        "created_at": "2024-03-01T10:00:00.000Z",
        "account": {
            "acct": "u",
            "url": "https://x/actor",
            "display_name": "U"
        },
        "status": {
            "id": "9001",
            "created_at": "2024-03-01T09:59:00.000Z",
            "url": "https://x/status/9001",
            "content": "<a class='mention' href='https://x/u1'>@u</a><a href='https://x/ref'>link</a>"
        }
    })
}

// --- Reference extraction ---

#[test]
fn mention_anchors_are_excluded_from_references() {
    let refs = extract_references(
        "<a class='mention' href='https://x/u1'>@u</a><a href='https://x/ref'>link</a>",
    );
    assert_eq!(refs, vec!["https://x/ref".to_string()]);
}

#[test]
fn mention_class_excluded_regardless_of_href() {
    let refs = extract_references(
        "<a class=\"u-url mention\" href=\"https://somewhere.example/resource\">ref?</a>",
    );
    assert!(refs.is_empty());
}

#[test]
fn multiple_references_keep_document_order() {
    let refs = extract_references(
        "<p>see <a href=\"https://a.example/1\">one</a> and \
         <a href=\"https://b.example/2\">two</a></p>",
    );
    assert_eq!(refs, vec!["https://a.example/1", "https://b.example/2"]);
}

#[test]
fn anchors_without_href_are_ignored() {
    assert!(extract_references("<a name=\"top\">anchor</a>").is_empty());
}

#[test]
fn content_of_prefers_status_content() {
    let event = mention_event();
    assert!(content_of(&event).unwrap().contains("https://x/ref"));
}

#[test]
fn content_of_falls_back_to_top_level_content() {
    let doc = json!({ "content": "<a href='https://x/ref'>link</a>" });
    assert_eq!(content_of(&doc), Some("<a href='https://x/ref'>link</a>"));
}

// --- Dispatcher ---

#[tokio::test]
async fn unset_spec_resolves_to_passthrough_identity() {
    let ctx = context();
    let transform = resolve(None, &ctx).unwrap();

    let event = mention_event();
    let out = transform.handle(&event).await.unwrap();
    assert_eq!(out, vec![event]);
}

#[tokio::test]
async fn empty_spec_resolves_to_passthrough() {
    let ctx = context();
    assert!(resolve(Some(""), &ctx).is_ok());
}

#[test]
fn handler_token_path_resolves_builtin() {
    let ctx = context();
    assert!(resolve(Some("@handler/create_event_notification"), &ctx).is_ok());
    assert!(resolve(Some("@handler/extract_references"), &ctx).is_ok());
}

#[test]
fn path_with_extension_resolves_by_stem() {
    let ctx = context();
    assert!(resolve(Some("./handlers/extract_references.js"), &ctx).is_ok());
}

#[test]
fn alias_resolves_announcer() {
    let ctx = context();
    assert!(resolve(Some("announce"), &ctx).is_ok());
}

#[test]
fn unknown_spec_is_a_resolution_error() {
    let ctx = context();
    let err = resolve(Some("no_such_handler"), &ctx)
        .map(|_| ())
        .expect_err("resolution should fail");
    match err {
        Error::HandlerResolution(spec) => assert_eq!(spec, "no_such_handler"),
        other => panic!("expected HandlerResolution, got {other}"),
    }
}

// --- Extract-references transform ---

#[tokio::test]
async fn extract_references_annotates_the_event() {
    let ctx = context();
    let transform = resolve(Some("extract_references"), &ctx).unwrap();

    let out = transform.handle(&mention_event()).await.unwrap();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0]["references"], json!(["https://x/ref"]));
    // Original fields are still present
    assert_eq!(out[0]["id"], json!("42"));
}

#[tokio::test]
async fn extract_references_without_content_yields_nothing() {
    let ctx = context();
    let transform = resolve(Some("extract_references"), &ctx).unwrap();

    let event = json!({ "id": "1", "type": "follow" });
    assert!(transform.handle(&event).await.unwrap().is_empty());
}

#[tokio::test]
async fn extract_references_with_only_mentions_yields_nothing() {
    let ctx = context();
    let transform = resolve(Some("extract_references"), &ctx).unwrap();

    let event = json!({
        "status": { "content": "<a class='mention' href='https://x/u1'>@u</a>" }
    });
    assert!(transform.handle(&event).await.unwrap().is_empty());
}

// --- Announce documents ---

#[test]
fn announce_document_carries_event_and_origin_fields() {
    let ctx = context();
    let links = vec![Link::new("https://x/ref")];
    let doc = build_announce(
        &mention_event(),
        "https://target.example/inbox",
        &links,
        &ctx.origin,
    );

    assert_eq!(doc["@context"], json!("https://www.w3.org/ns/activitystreams"));
    assert_eq!(doc["type"], json!("Announce"));
    assert!(doc["id"].as_str().unwrap().starts_with("urn:uuid:"));
    assert_eq!(doc["published"], json!("2024-03-01T09:59:00.000Z"));

    assert_eq!(doc["actor"]["id"], json!("https://x/actor"));
    assert_eq!(doc["actor"]["inbox"], json!("https://target.example/inbox"));
    assert_eq!(doc["actor"]["type"], json!("Person"));

    assert_eq!(doc["origin"]["id"], json!("https://pipeline.example/actor"));
    assert_eq!(doc["origin"]["type"], json!("Service"));

    assert_eq!(doc["object"]["id"], json!("https://x/status/9001"));
    assert_eq!(doc["object"]["type"], json!("Note"));
    assert_eq!(doc["object"]["url"][0]["href"], json!("https://x/ref"));
    assert_eq!(doc["generator"]["context"], json!("https://x/status/9001"));
}

#[test]
fn announce_ids_are_unique_per_document() {
    let ctx = context();
    let links = vec![Link::new("https://x/ref")];
    let a = build_announce(&mention_event(), "https://i", &links, &ctx.origin);
    let b = build_announce(&mention_event(), "https://i", &links, &ctx.origin);
    assert_ne!(a["id"], b["id"]);
}

fn three_link_event() -> Value {
    json!({
        "id": "7",
        "type": "mention",
        "created_at": "2024-03-01T10:00:00.000Z",
        "account": { "acct": "u", "url": "https://x/actor", "display_name": "U" },
        "status": {
            "id": "1",
            "created_at": "2024-03-01T09:00:00.000Z",
            "url": "https://x/status/1",
            "content": "<a href='https://x/a'>a</a><a href='https://x/b'>b</a>\
                        <a href='https://x/c'>c</a>"
        }
    })
}

#[tokio::test]
async fn split_links_disabled_yields_one_document_with_all_links() {
    let ctx = context();
    let announcer = Announcer::new(
        Arc::clone(&ctx.dereferencer),
        ctx.origin.clone(),
        false,
        ctx.fixed_inbox.clone(),
    );

    let out = announcer.handle(&three_link_event()).await.unwrap();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0]["object"]["url"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn split_links_enabled_fans_out_one_document_per_link() {
    let ctx = context();
    let announcer = Announcer::new(
        Arc::clone(&ctx.dereferencer),
        ctx.origin.clone(),
        true,
        ctx.fixed_inbox.clone(),
    );

    let out = announcer.handle(&three_link_event()).await.unwrap();
    assert_eq!(out.len(), 3);
    for doc in &out {
        assert_eq!(doc["object"]["url"].as_array().unwrap().len(), 1);
    }
    assert_eq!(out[0]["object"]["url"][0]["href"], json!("https://x/a"));
    assert_eq!(out[2]["object"]["url"][0]["href"], json!("https://x/c"));
}

#[tokio::test]
async fn announcer_without_references_yields_nothing() {
    let ctx = context();
    let announcer = Announcer::new(
        Arc::clone(&ctx.dereferencer),
        ctx.origin.clone(),
        false,
        ctx.fixed_inbox.clone(),
    );

    let event = json!({
        "status": { "content": "<p>plain text, no anchors</p>" }
    });
    assert!(announcer.handle(&event).await.unwrap().is_empty());
}
