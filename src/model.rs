//! Manifest row model
//!
//! Typed views of one input manifest record and the output record built from
//! it. Positional correspondence matters: `output_results[i]` always belongs
//! to `urls()[i]`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Rendered in the output manifest in place of a reference
pub const FAILURE_MARKER: &str = "Processing Failed";

/// Separator used when joining rendered results into one manifest cell
pub const OUTPUT_SEPARATOR: &str = ", ";

/// One validated row of the input manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputRow {
    pub serial_number: String,
    pub product_name: String,
    /// Raw comma-delimited cell, kept verbatim for the output manifest
    pub image_urls: String,
}

impl InputRow {
    pub fn new(
        serial_number: impl Into<String>,
        product_name: impl Into<String>,
        image_urls: impl Into<String>,
    ) -> Self {
        Self {
            serial_number: serial_number.into(),
            product_name: product_name.into(),
            image_urls: image_urls.into(),
        }
    }

    /// Split the URL cell on commas and trim each token.
    ///
    /// Empty tokens are kept so that result positions line up with the
    /// source cell.
    pub fn urls(&self) -> Vec<&str> {
        self.image_urls.split(',').map(str::trim).collect()
    }
}

/// Where a processed image ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference {
    /// JPEG saved under the local output directory
    Local(PathBuf),
    /// Public URL of an uploaded object
    Remote(String),
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reference::Local(path) => write!(f, "file://{}", path.display()),
            Reference::Remote(url) => f.write_str(url),
        }
    }
}

/// Outcome of the fetch-transcode sequence for a single URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputResult {
    Success(Reference),
    Failure,
}

impl OutputResult {
    pub fn is_success(&self) -> bool {
        matches!(self, OutputResult::Success(_))
    }
}

impl fmt::Display for OutputResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputResult::Success(reference) => write!(f, "{reference}"),
            OutputResult::Failure => f.write_str(FAILURE_MARKER),
        }
    }
}

/// One row of the output manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRow {
    pub serial_number: String,
    pub product_name: String,
    pub input_image_urls: String,
    pub output_results: Vec<OutputResult>,
}

impl OutputRow {
    /// Order-preserving rendering of every result for the manifest cell
    pub fn output_image_urls(&self) -> String {
        self.output_results
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(OUTPUT_SEPARATOR)
    }

    pub fn failed_count(&self) -> usize {
        self.output_results.iter().filter(|r| !r.is_success()).count()
    }
}

/// Lifecycle of a single image URL within one batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProcessingState {
    #[default]
    Unprocessed,
    Processing,
    Processed,
    Failed,
}

impl fmt::Display for ProcessingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProcessingState::Unprocessed => "Unprocessed",
            ProcessingState::Processing => "Processing",
            ProcessingState::Processed => "Processed",
            ProcessingState::Failed => "Failed",
        };
        f.write_str(name)
    }
}
