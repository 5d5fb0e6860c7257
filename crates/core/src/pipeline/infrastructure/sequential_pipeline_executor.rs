use std::sync::Arc;

use crate::detection::domain::detector_factory::DetectorFactory;
use crate::pipeline::annotate_image_use_case::AnnotateImageUseCase;
use crate::pipeline::batch_report::BatchReport;
use crate::pipeline::output_namer::OutputNamer;
use crate::pipeline::pipeline_executor::{admit, record_failure, record_outcome, PipelineExecutor};
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::storage::domain::blob_store::BlobStore;

/// Runs the batch on the calling thread, one image at a time.
///
/// The full input listing is materialized before the first image is
/// processed and a single detector pair serves the whole batch.
#[derive(Default)]
pub struct SequentialPipelineExecutor;

impl SequentialPipelineExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl PipelineExecutor for SequentialPipelineExecutor {
    fn execute(
        &self,
        store: Arc<dyn BlobStore>,
        input_root: &str,
        mut namer: OutputNamer,
        task: Arc<AnnotateImageUseCase>,
        factory: &dyn DetectorFactory,
        logger: &mut dyn PipelineLogger,
    ) -> Result<BatchReport, Box<dyn std::error::Error>> {
        let mut detectors = factory.create()?;

        let blobs = store.read_all(input_root)?;
        let total = blobs.len();
        logger.info(&format!("Found {total} objects under {input_root}"));

        let mut report = BatchReport::new();
        for (i, item) in blobs.into_iter().enumerate() {
            match admit(&mut namer, item) {
                Ok(job) => {
                    let outcome = task.execute(job, &mut detectors, store.as_ref());
                    record_outcome(&mut report, logger, outcome);
                }
                Err((key, failure)) => record_failure(&mut report, logger, key, failure),
            }
            logger.progress(i + 1, Some(total));
        }

        Ok(report)
    }
}
