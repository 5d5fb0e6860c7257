use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use crate::annotation::domain::annotation_engine::AnnotationEngine;
use crate::annotation::domain::frame_builder::FrameBuilder;
use crate::codec::domain::image_codec::ImageCodec;
use crate::detection::domain::detector_factory::DetectorPair;
use crate::pipeline::batch_report::WrittenImage;
use crate::pipeline::image_failure::ImageFailure;
use crate::shared::detection::{count_class, DetectionClass};
use crate::storage::domain::blob_store::BlobStore;

/// One admitted input: its key, raw bytes and the destination it claimed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageJob {
    pub key: String,
    pub bytes: Vec<u8>,
    pub destination: String,
}

/// Encoded annotated image and where it goes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputRecord {
    pub destination: String,
    pub bytes: Vec<u8>,
}

/// Result of processing one job, with per-stage durations in milliseconds.
#[derive(Debug)]
pub struct ImageOutcome {
    pub key: String,
    pub result: Result<WrittenImage, ImageFailure>,
    pub timings: Vec<(&'static str, f64)>,
}

/// Per-image pipeline: decode → variants → annotate → encode → write.
///
/// Holds only read-only configuration, so one instance is shared by every
/// worker. Detectors are passed in per call by the task that owns them.
pub struct AnnotateImageUseCase {
    codec: Box<dyn ImageCodec>,
    frame_builder: FrameBuilder,
    engine: AnnotationEngine,
}

struct Annotated {
    record: OutputRecord,
    faces: usize,
    people: usize,
}

impl AnnotateImageUseCase {
    pub fn new(
        codec: Box<dyn ImageCodec>,
        frame_builder: FrameBuilder,
        engine: AnnotationEngine,
    ) -> Self {
        Self {
            codec,
            frame_builder,
            engine,
        }
    }

    /// Runs the whole per-image pipeline and writes the result to `store`.
    ///
    /// Nothing is written unless every earlier stage succeeded. A panic in
    /// a backend becomes [`ImageFailure::Panicked`] for this image only.
    pub fn execute(
        &self,
        job: ImageJob,
        detectors: &mut DetectorPair,
        store: &dyn BlobStore,
    ) -> ImageOutcome {
        let mut timings = Vec::with_capacity(4);
        let key = job.key.clone();

        let annotated = panic::catch_unwind(AssertUnwindSafe(|| {
            self.annotate(job, detectors, &mut timings)
        }))
        .unwrap_or_else(|payload| Err(ImageFailure::Panicked(panic_message(payload.as_ref()))));

        let result = annotated.and_then(|annotated| {
            let start = Instant::now();
            let Annotated {
                record,
                faces,
                people,
            } = annotated;
            store
                .write(&record.destination, &record.bytes)
                .map_err(|e| ImageFailure::Write {
                    path: record.destination.clone(),
                    reason: e.to_string(),
                })?;
            timings.push(("write", elapsed_ms(start)));
            Ok(WrittenImage {
                key: key.clone(),
                destination: record.destination,
                byte_len: record.bytes.len(),
                faces,
                people,
            })
        });

        ImageOutcome {
            key,
            result,
            timings,
        }
    }

    fn annotate(
        &self,
        job: ImageJob,
        detectors: &mut DetectorPair,
        timings: &mut Vec<(&'static str, f64)>,
    ) -> Result<Annotated, ImageFailure> {
        let start = Instant::now();
        let mut image = self
            .codec
            .decode(&job.bytes)
            .map_err(|e| ImageFailure::Decode(e.to_string()))?;
        drop(job.bytes);
        timings.push(("decode", elapsed_ms(start)));

        let start = Instant::now();
        let detections = self
            .frame_builder
            .build_variants(&image)
            .and_then(|variants| {
                self.engine.annotate(
                    &mut image,
                    &variants,
                    detectors.face.as_mut(),
                    detectors.person.as_mut(),
                )
            })
            .map_err(|e| ImageFailure::Detection(e.to_string()))?;
        timings.push(("detect", elapsed_ms(start)));

        let start = Instant::now();
        let bytes = self
            .codec
            .encode(&image)
            .map_err(|e| ImageFailure::Encode(e.to_string()))?;
        timings.push(("encode", elapsed_ms(start)));

        Ok(Annotated {
            record: OutputRecord {
                destination: job.destination,
                bytes,
            },
            faces: count_class(&detections, DetectionClass::Face),
            people: count_class(&detections, DetectionClass::Person),
        })
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
