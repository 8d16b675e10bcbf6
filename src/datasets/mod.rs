pub mod client;
pub mod preview;
pub mod runner;

#[cfg(test)]
pub(crate) mod mock;

pub use client::{archive_filename, ContentKind, DatasetsClient};
pub use preview::{parse_record_count, PreviewResponse, RECORD_COUNT_MARKER};
pub use runner::{DatasetsCli, ToolOutput, ToolRunner};
