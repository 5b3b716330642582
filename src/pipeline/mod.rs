// Pipeline orchestration — poll-once and persistent-stream ingestion.
//
// `poll` runs one bounded fetch-and-process cycle; `stream` keeps a
// connection open and processes events as they arrive. Both share the
// per-event processing stage in `process`.

pub mod poll;
pub mod process;
pub mod stream;

pub use process::{ProcessOptions, SerializeMode};
