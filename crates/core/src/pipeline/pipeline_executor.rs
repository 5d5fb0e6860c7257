use std::sync::Arc;

use crate::detection::domain::detector_factory::DetectorFactory;
use crate::pipeline::annotate_image_use_case::{AnnotateImageUseCase, ImageJob, ImageOutcome};
use crate::pipeline::batch_report::BatchReport;
use crate::pipeline::image_failure::ImageFailure;
use crate::pipeline::output_namer::OutputNamer;
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::storage::domain::blob_store::{Blob, BlobStore, StoreError};

/// Tuning knobs for a batch run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PipelineConfig {
    pub workers: usize,
    pub queue_capacity: usize,
}

/// Abstracts how the enumerate → annotate → write loop over a batch runs.
///
/// Implementations own scheduling only; per-image work is delegated to the
/// [`AnnotateImageUseCase`]. Per-image failures end up in the returned
/// report. `Err` means the batch could not run at all.
pub trait PipelineExecutor: Send {
    fn execute(
        &self,
        store: Arc<dyn BlobStore>,
        input_root: &str,
        namer: OutputNamer,
        task: Arc<AnnotateImageUseCase>,
        factory: &dyn DetectorFactory,
        logger: &mut dyn PipelineLogger,
    ) -> Result<BatchReport, Box<dyn std::error::Error>>;
}

/// Turns one enumerated item into a job by claiming its destination.
///
/// Returns the key and failure when the item cannot be processed.
pub fn admit(
    namer: &mut OutputNamer,
    item: Result<Blob, StoreError>,
) -> Result<ImageJob, (String, ImageFailure)> {
    let Blob { key, bytes } = match item {
        Ok(blob) => blob,
        Err(StoreError::Unkeyable { path }) => {
            return Err((path.clone(), ImageFailure::InvalidKey { key: path }));
        }
        Err(e) => {
            return Err((e.subject().to_string(), ImageFailure::Read(e.to_string())));
        }
    };
    match namer.claim(&key) {
        Ok(destination) => Ok(ImageJob {
            key,
            bytes,
            destination,
        }),
        Err(failure) => Err((key, failure)),
    }
}

/// Folds a finished image into the report and emits its log line.
pub fn record_outcome(
    report: &mut BatchReport,
    logger: &mut dyn PipelineLogger,
    outcome: ImageOutcome,
) {
    for (stage, ms) in &outcome.timings {
        logger.timing(stage, *ms);
    }
    match outcome.result {
        Ok(written) => {
            logger.metric("faces", written.faces as f64);
            logger.metric("people", written.people as f64);
            logger.info(&format!("Processed {}", written.key));
            report.record_written(written);
        }
        Err(failure) => record_failure(report, logger, outcome.key, failure),
    }
}

pub fn record_failure(
    report: &mut BatchReport,
    logger: &mut dyn PipelineLogger,
    key: String,
    failure: ImageFailure,
) {
    logger.warn(&format!("Skipped {key} ({}): {failure}", failure.stage()));
    report.record_failure(key, failure);
}
