// Sink writer — persist output documents plus their metadata sidecars.
//
// Document i (1-based) for event `id` lands at `{inbox}/{id}-{i}.jsonld`
// with a companion `.jsonld.meta` holding the fixed delivery headers.
// The special destination "stdout" prints documents to the console and
// never writes sidecars.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::error::Error;

/// Destination value that routes documents to the console.
pub const STDOUT: &str = "stdout";

/// Fixed sidecar headers for every persisted document.
fn meta_headers() -> Value {
    serde_json::json!({
        "Content-Type": "application/ld+json",
        "Access-Control-Allow-Origin": "*"
    })
}

fn write_json(path: &Path, value: &Value) -> Result<(), Error> {
    let body = serde_json::to_string_pretty(value).unwrap_or_default();
    fs::write(path, body).map_err(|source| Error::Sink {
        path: path.to_path_buf(),
        source,
    })
}

/// Write each document (and sidecar) for the given event id.
///
/// Returns the paths written; empty for the stdout destination. All
/// writes are full-file overwrites.
pub fn write_documents(inbox: &str, id: &str, documents: &[Value]) -> Result<Vec<PathBuf>, Error> {
    let mut written = Vec::new();

    for (i, document) in documents.iter().enumerate() {
        if inbox == STDOUT {
            println!(
                "{}",
                serde_json::to_string_pretty(document).unwrap_or_default()
            );
            continue;
        }

        let file = Path::new(inbox).join(format!("{}-{}.jsonld", id, i + 1));
        debug!(path = %file.display(), "Writing document");
        write_json(&file, document)?;
        written.push(file);

        let meta_file = Path::new(inbox).join(format!("{}-{}.jsonld.meta", id, i + 1));
        debug!(path = %meta_file.display(), "Writing sidecar");
        write_json(&meta_file, &meta_headers())?;
        written.push(meta_file);
    }

    Ok(written)
}
