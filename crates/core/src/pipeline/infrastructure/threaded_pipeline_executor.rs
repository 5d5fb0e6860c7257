use std::collections::BTreeSet;
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender};

use crate::detection::domain::detector_factory::{DetectorFactory, DetectorPair};
use crate::pipeline::annotate_image_use_case::{AnnotateImageUseCase, ImageJob, ImageOutcome};
use crate::pipeline::batch_report::BatchReport;
use crate::pipeline::image_failure::ImageFailure;
use crate::pipeline::output_namer::OutputNamer;
use crate::pipeline::pipeline_executor::{
    admit, record_failure, record_outcome, PipelineConfig, PipelineExecutor,
};
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::shared::constants::DEFAULT_QUEUE_CAPACITY;
use crate::storage::domain::blob_store::BlobStore;

/// Executes the batch on a pool of worker threads fed from a bounded queue.
///
/// Layout: `main [enumerate/claim] → job queue → N workers → main [report]`
///
/// Inputs are pulled lazily from the store, so at most `queue_capacity`
/// undecoded images wait in memory. Every worker owns its own detector pair.
/// The coordinating thread is the only one touching the logger and report.
/// A worker that dies leaves its unfinished images in the report as
/// [`ImageFailure::Panicked`].
pub struct ThreadedPipelineExecutor {
    config: PipelineConfig,
}

impl ThreadedPipelineExecutor {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config: PipelineConfig {
                workers: config.workers.max(1),
                queue_capacity: config.queue_capacity.max(1),
            },
        }
    }
}

impl Default for ThreadedPipelineExecutor {
    fn default() -> Self {
        let workers = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self::new(PipelineConfig {
            workers,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        })
    }
}

impl PipelineExecutor for ThreadedPipelineExecutor {
    fn execute(
        &self,
        store: Arc<dyn BlobStore>,
        input_root: &str,
        mut namer: OutputNamer,
        task: Arc<AnnotateImageUseCase>,
        factory: &dyn DetectorFactory,
        logger: &mut dyn PipelineLogger,
    ) -> Result<BatchReport, Box<dyn std::error::Error>> {
        // Build every pair up front so a setup failure aborts before any work.
        let pairs = (0..self.config.workers)
            .map(|_| factory.create())
            .collect::<Result<Vec<_>, _>>()?;

        let blobs = store.entries(input_root)?;
        logger.info(&format!(
            "Annotating {input_root} with {} workers",
            self.config.workers
        ));

        let (job_tx, job_rx) = crossbeam_channel::bounded::<ImageJob>(self.config.queue_capacity);
        let (done_tx, done_rx) = crossbeam_channel::unbounded::<ImageOutcome>();

        let mut handles = Vec::with_capacity(pairs.len());
        for (id, pair) in pairs.into_iter().enumerate() {
            handles.push(spawn_worker(
                id,
                pair,
                Arc::clone(&task),
                Arc::clone(&store),
                job_rx.clone(),
                done_tx.clone(),
            )?);
        }
        drop(job_rx);
        drop(done_tx);

        let mut report = BatchReport::new();
        let mut pending = BTreeSet::new();
        let mut enumerated = 0usize;
        let mut completed = 0usize;

        for item in blobs {
            enumerated += 1;
            match admit(&mut namer, item) {
                Ok(job) => {
                    logger.metric("queue_depth", job_tx.len() as f64);
                    let key = job.key.clone();
                    if job_tx.send(job).is_ok() {
                        pending.insert(key);
                    } else {
                        let failure = ImageFailure::Panicked("no worker left to take it".into());
                        record_failure(&mut report, logger, key, failure);
                        completed += 1;
                        logger.progress(completed, None);
                    }
                }
                Err((key, failure)) => {
                    record_failure(&mut report, logger, key, failure);
                    completed += 1;
                    logger.progress(completed, None);
                }
            }

            for outcome in done_rx.try_iter() {
                pending.remove(&outcome.key);
                record_outcome(&mut report, logger, outcome);
                completed += 1;
                logger.progress(completed, None);
            }
        }
        drop(job_tx);

        for outcome in done_rx {
            pending.remove(&outcome.key);
            record_outcome(&mut report, logger, outcome);
            completed += 1;
            logger.progress(completed, Some(enumerated));
        }

        let panicked = join_workers(handles);
        if panicked > 0 {
            logger.warn(&format!("{panicked} worker thread(s) panicked"));
        }
        // Jobs held by a dead worker, or still queued when the last one died.
        for key in pending {
            let failure = ImageFailure::Panicked("worker exited before finishing it".into());
            record_failure(&mut report, logger, key, failure);
            completed += 1;
            logger.progress(completed, Some(enumerated));
        }
        Ok(report)
    }
}

fn spawn_worker(
    id: usize,
    mut detectors: DetectorPair,
    task: Arc<AnnotateImageUseCase>,
    store: Arc<dyn BlobStore>,
    job_rx: Receiver<ImageJob>,
    done_tx: Sender<ImageOutcome>,
) -> std::io::Result<JoinHandle<()>> {
    std::thread::Builder::new()
        .name(format!("annotate-{id}"))
        .spawn(move || {
            for job in job_rx {
                let outcome = task.execute(job, &mut detectors, store.as_ref());
                if done_tx.send(outcome).is_err() {
                    break;
                }
            }
        })
}

/// Waits for every worker and returns how many of them panicked.
fn join_workers(handles: Vec<JoinHandle<()>>) -> usize {
    handles
        .into_iter()
        .map(JoinHandle::join)
        .filter(Result::is_err)
        .count()
}
