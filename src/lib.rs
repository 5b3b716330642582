// Mastopipe: Mastodon notification ingestion and ActivityStreams relay.
//
// This is the library root. Each module corresponds to one stage of the
// ingestion pipeline.

pub mod backoff;
pub mod cursor;
pub mod error;
pub mod handler;
pub mod mastodon;
pub mod pipeline;
pub mod profile;
pub mod sink;

pub use error::{Error, SourceError};
