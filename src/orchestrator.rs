//! Sequential batch driver over manifest rows

use serde::Serialize;
use tracing::info;

use crate::model::{InputRow, OutputRow};
use crate::processor::ImageProcessor;

/// Totals for a finished batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub rows: usize,
    pub images: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl BatchSummary {
    pub fn from_rows(rows: &[OutputRow]) -> Self {
        rows.iter().fold(Self::default(), |mut acc, row| {
            let failed = row.failed_count();
            acc.rows += 1;
            acc.images += row.output_results.len();
            acc.failed += failed;
            acc.succeeded += row.output_results.len() - failed;
            acc
        })
    }
}

pub struct BatchOrchestrator {
    processor: ImageProcessor,
}

impl BatchOrchestrator {
    pub fn new(processor: ImageProcessor) -> Self {
        Self { processor }
    }

    pub fn processor(&self) -> &ImageProcessor {
        &self.processor
    }

    /// Process every row in order; row N+1 starts once row N is resolved
    pub async fn process_all(&self, rows: &[InputRow]) -> Vec<OutputRow> {
        let mut output = Vec::with_capacity(rows.len());

        for (index, row) in rows.iter().enumerate() {
            output.push(self.process_row(row).await);
            info!(
                row = index + 1,
                total = rows.len(),
                serial_number = %row.serial_number,
                "Row completed"
            );
        }

        output
    }

    pub async fn process_row(&self, row: &InputRow) -> OutputRow {
        let urls = row.urls();
        let mut output_results = Vec::with_capacity(urls.len());
        for url in urls {
            output_results.push(self.processor.process(url).await);
        }
        self.processor.metrics().row_completed();

        OutputRow {
            serial_number: row.serial_number.clone(),
            product_name: row.product_name.clone(),
            input_image_urls: row.image_urls.clone(),
            output_results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{HttpClient, HttpConfig};
    use crate::model::{OutputResult, ProcessingState, Reference};
    use crate::processor::Quality;
    use std::path::PathBuf;

    fn orchestrator(dir: &std::path::Path) -> BatchOrchestrator {
        let client = HttpClient::new(HttpConfig::default()).unwrap();
        BatchOrchestrator::new(ImageProcessor::new(client, dir, Quality::default()))
    }

    #[tokio::test]
    async fn test_row_results_match_url_count() {
        let dir = tempfile::TempDir::new().unwrap();
        let orchestrator = orchestrator(dir.path());
        let rows = vec![
            InputRow::new("1", "SKU1", "bad-1, bad-2,bad-3"),
            InputRow::new("2", "SKU2", "bad-4"),
        ];

        let output = orchestrator.process_all(&rows).await;

        assert_eq!(output.len(), 2);
        assert_eq!(output[0].output_results, vec![OutputResult::Failure; 3]);
        assert_eq!(output[0].input_image_urls, "bad-1, bad-2,bad-3");
        assert_eq!(output[1].serial_number, "2");
        assert_eq!(output[1].output_image_urls(), "Processing Failed");
        assert_eq!(
            orchestrator.processor().tracker().get("bad-2").await,
            ProcessingState::Failed
        );
        assert_eq!(orchestrator.processor().metrics().snapshot().rows_completed, 2);
    }

    #[test]
    fn test_summary_counts() {
        let ok = OutputResult::Success(Reference::Local(PathBuf::from("a.jpg")));
        let rows = vec![
            OutputRow {
                serial_number: "1".into(),
                product_name: "A".into(),
                input_image_urls: "x,y".into(),
                output_results: vec![ok.clone(), ok],
            },
            OutputRow {
                serial_number: "2".into(),
                product_name: "B".into(),
                input_image_urls: "z".into(),
                output_results: vec![OutputResult::Failure],
            },
        ];

        assert_eq!(
            BatchSummary::from_rows(&rows),
            BatchSummary { rows: 2, images: 3, succeeded: 2, failed: 1 }
        );
    }
}
