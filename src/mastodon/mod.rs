// Mastodon API client — authenticated REST calls and the user stream.
//
// Each submodule handles one area: `client` for one-shot HTTP calls,
// `stream` for the persistent WebSocket subscription, `models` for the
// shared notification/status types.

pub mod client;
pub mod models;
pub mod stream;

pub use client::MastodonClient;
