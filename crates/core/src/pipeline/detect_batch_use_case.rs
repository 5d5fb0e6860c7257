use std::sync::Arc;
use std::time::Instant;

use crate::detection::domain::detector_factory::DetectorFactory;
use crate::pipeline::annotate_image_use_case::AnnotateImageUseCase;
use crate::pipeline::batch_report::BatchReport;
use crate::pipeline::output_namer::OutputNamer;
use crate::pipeline::pipeline_executor::PipelineExecutor;
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::storage::domain::blob_store::BlobStore;

/// Batch driver: annotates every object under an input root and writes the
/// results under an output root.
///
/// All collaborators are injected once and live for the whole process.
pub struct DetectBatchUseCase {
    store: Arc<dyn BlobStore>,
    task: Arc<AnnotateImageUseCase>,
    factory: Box<dyn DetectorFactory>,
    executor: Box<dyn PipelineExecutor>,
    logger: Box<dyn PipelineLogger>,
}

impl DetectBatchUseCase {
    pub fn new(
        store: Arc<dyn BlobStore>,
        task: AnnotateImageUseCase,
        factory: Box<dyn DetectorFactory>,
        executor: Box<dyn PipelineExecutor>,
        logger: Box<dyn PipelineLogger>,
    ) -> Self {
        Self {
            store,
            task: Arc::new(task),
            factory,
            executor,
            logger,
        }
    }

    /// Runs one batch. Per-image failures are in the report; `Err` only
    /// when the batch could not start.
    pub fn execute(
        &mut self,
        input_root: &str,
        output_root: &str,
    ) -> Result<BatchReport, Box<dyn std::error::Error>> {
        let start = Instant::now();
        let report = self.executor.execute(
            Arc::clone(&self.store),
            input_root,
            OutputNamer::new(output_root),
            Arc::clone(&self.task),
            self.factory.as_ref(),
            self.logger.as_mut(),
        )?;

        self.logger.info(&format!(
            "Batch {input_root} -> {output_root}: {} written, {} failed in {:.1}s",
            report.written(),
            report.failed(),
            start.elapsed().as_secs_f64()
        ));
        self.logger.summary();
        Ok(report)
    }
}
