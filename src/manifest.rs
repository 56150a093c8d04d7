//! Manifest CSV loading, validation and writing

use serde::Serialize;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use thiserror::Error;

use crate::model::{InputRow, OutputRow};

pub const SERIAL_NUMBER: &str = "Serial Number";
pub const PRODUCT_NAME: &str = "Product Name";
pub const INPUT_IMAGE_URLS: &str = "Input Image Urls";
pub const OUTPUT_IMAGE_URLS: &str = "Output Image Urls";

/// Columns every input manifest must carry, checked in this order
pub const REQUIRED_COLUMNS: [&str; 3] = [SERIAL_NUMBER, PRODUCT_NAME, INPUT_IMAGE_URLS];

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    /// `row` is the data-row index + 1, header excluded
    #[error("Missing data at row {row}")]
    MissingField { row: usize },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ManifestError>;

/// Unvalidated manifest contents as read from CSV
#[derive(Debug, Clone)]
pub struct RawManifest {
    pub headers: csv::StringRecord,
    pub records: Vec<csv::StringRecord>,
}

impl RawManifest {
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers = reader.headers()?.clone();
        let records = reader.records().collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Self { headers, records })
    }

    fn column_index(&self, name: &str) -> Option<usize> {
        self.headers
            .iter()
            .position(|h| h.trim_start_matches('\u{FEFF}').trim() == name)
    }
}

/// Check required columns and fields, returning typed rows
pub fn validate(manifest: &RawManifest) -> Result<Vec<InputRow>> {
    let mut indices = [0usize; 3];
    for (slot, name) in indices.iter_mut().zip(REQUIRED_COLUMNS) {
        *slot = manifest
            .column_index(name)
            .ok_or_else(|| ManifestError::MissingColumn(name.to_string()))?;
    }
    let [serial_idx, product_idx, urls_idx] = indices;

    let mut rows = Vec::with_capacity(manifest.records.len());
    for (index, record) in manifest.records.iter().enumerate() {
        // Emptiness is judged on the trimmed value; the URL cell itself is kept raw
        let field = |i: usize| {
            record
                .get(i)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ManifestError::MissingField { row: index + 1 })
        };

        rows.push(InputRow::new(
            field(serial_idx)?.trim(),
            field(product_idx)?.trim(),
            field(urls_idx)?,
        ));
    }

    Ok(rows)
}

/// Load and validate an input manifest from any reader
pub fn read_manifest_from<R: Read>(reader: R) -> Result<Vec<InputRow>> {
    let manifest = RawManifest::from_reader(reader)?;
    validate(&manifest)
}

/// Load and validate an input manifest file
pub fn read_manifest(path: &Path) -> Result<Vec<InputRow>> {
    let file = File::open(path)?;
    let rows = read_manifest_from(file)?;
    tracing::info!(path = %path.display(), rows = rows.len(), "Loaded input manifest");
    Ok(rows)
}

#[derive(Debug, Serialize)]
struct OutputRecord<'a> {
    #[serde(rename = "Serial Number")]
    serial_number: &'a str,
    #[serde(rename = "Product Name")]
    product_name: &'a str,
    #[serde(rename = "Input Image Urls")]
    input_image_urls: &'a str,
    #[serde(rename = "Output Image Urls")]
    output_image_urls: String,
}

impl<'a> From<&'a OutputRow> for OutputRecord<'a> {
    fn from(row: &'a OutputRow) -> Self {
        Self {
            serial_number: &row.serial_number,
            product_name: &row.product_name,
            input_image_urls: &row.input_image_urls,
            output_image_urls: row.output_image_urls(),
        }
    }
}

/// Write output rows, header first
pub fn write_manifest_to<W: Write>(writer: W, rows: &[OutputRow]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);

    if rows.is_empty() {
        writer.write_record([SERIAL_NUMBER, PRODUCT_NAME, INPUT_IMAGE_URLS, OUTPUT_IMAGE_URLS])?;
    }
    for row in rows {
        writer.serialize(OutputRecord::from(row))?;
    }

    writer.flush()?;
    Ok(())
}

pub fn write_manifest(path: &Path, rows: &[OutputRow]) -> Result<()> {
    let file = File::create(path)?;
    write_manifest_to(file, rows)?;
    tracing::info!(path = %path.display(), rows = rows.len(), "Output manifest saved");
    Ok(())
}
