// Cursor store — the single "last seen" marker between polls.
//
// The cursor is one opaque id in a plain-text file. A missing file is a
// valid initial state, not an error. Writes replace the whole file;
// last-writer-wins is acceptable since no two workers share a cursor.

use std::fs;
use std::io;
use std::path::Path;

use tracing::info;

use crate::mastodon::models::NotificationEvent;

/// Load the stored cursor, or `None` when the file does not exist.
pub fn load(path: &Path) -> io::Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(contents) => {
            let cursor = contents.trim().to_string();
            info!(path = %path.display(), since = %cursor, "Loaded cursor");
            Ok(Some(cursor))
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// Overwrite the cursor file with a new value.
pub fn save(path: &Path, cursor: &str) -> io::Result<()> {
    info!(path = %path.display(), since = %cursor, "Saving cursor");
    fs::write(path, cursor)
}

/// An explicitly supplied bound always overrides the stored cursor.
pub fn resolve_since(explicit: Option<&str>, stored: Option<&str>) -> Option<String> {
    explicit.or(stored).map(String::from)
}

/// The id of the most recent event in a batch, by `created_at`.
///
/// ISO-8601 timestamps order lexicographically, so a plain string
/// comparison picks the newest event regardless of source order.
pub fn latest_event_id(events: &[NotificationEvent]) -> Option<&str> {
    events
        .iter()
        .max_by(|a, b| a.created_at.cmp(&b.created_at))
        .map(|event| event.id.as_str())
}
