use crate::error::{FetchError, Result};
use serde::{Deserialize, Serialize};

/// Substring that must appear in preview stdout before it is parsed as JSON.
pub const RECORD_COUNT_MARKER: &str = "record_count";

/// Subset of the `datasets download ... --preview` JSON document.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct PreviewResponse {
    #[serde(default)]
    pub record_count: u64,
    #[serde(default, rename = "size_in_MB")]
    pub size_in_mb: Option<f64>,
    #[serde(default)]
    pub resource_updated_on: Option<String>,
}

impl PreviewResponse {
    pub fn parse(stdout: &str) -> Result<Self> {
        serde_json::from_str(stdout.trim()).map_err(|e| FetchError::InvalidPreview {
            message: e.to_string(),
        })
    }
}

/// Record count declared by preview output. Output without the marker
/// declares nothing and counts as zero.
pub fn parse_record_count(stdout: &str) -> Result<u64> {
    if !stdout.contains(RECORD_COUNT_MARKER) {
        return Ok(0);
    }
    Ok(PreviewResponse::parse(stdout)?.record_count)
}
