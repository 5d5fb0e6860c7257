use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::detection::domain::face_detector::{CascadeParams, FaceDetector};
use crate::shared::frame::Frame;
use crate::shared::region::Region;

const DEFAULT_MIN_FACE_SIZE: u32 = 20;
const DEFAULT_SCORE_THRESH: f64 = 2.0;
const DEFAULT_WINDOW_STEP: u32 = 4;

/// Face detector backed by the `rustface` crate (SeetaFace funnel cascade).
///
/// The model is loaded once and shared by value; every [`FaceDetector::detect`]
/// call builds a fresh classifier from it, so no result state survives
/// between calls.
///
/// `scale_factor` maps to the pyramid step `1 / scale_factor`. The funnel
/// cascade merges overlapping windows internally and has no neighbor count,
/// so `min_neighbors` is not applied.
pub struct RustfaceDetector {
    model: rustface::Model,
    min_face_size: u32,
    score_thresh: f64,
    window_step: u32,
}

impl RustfaceDetector {
    pub fn from_model(model: rustface::Model) -> Self {
        Self {
            model,
            min_face_size: DEFAULT_MIN_FACE_SIZE,
            score_thresh: DEFAULT_SCORE_THRESH,
            window_step: DEFAULT_WINDOW_STEP,
        }
    }
}

impl FaceDetector for RustfaceDetector {
    fn detect(
        &mut self,
        gray: &Frame,
        params: &CascadeParams,
    ) -> Result<Vec<Region>, Box<dyn std::error::Error>> {
        if gray.channels() != 1 {
            return Err(format!(
                "Face detection expects a grayscale frame, got {} channels",
                gray.channels()
            )
            .into());
        }
        if gray.is_empty() {
            return Ok(Vec::new());
        }

        let mut detector = rustface::create_detector_with_model(self.model.clone());
        detector.set_min_face_size(self.min_face_size);
        detector.set_score_thresh(self.score_thresh);
        detector.set_pyramid_scale_factor(pyramid_step(params.scale_factor)?);
        detector.set_slide_window_step(self.window_step, self.window_step);

        let faces = detector.detect(&rustface::ImageData::new(
            gray.data(),
            gray.width(),
            gray.height(),
        ));

        Ok(faces
            .iter()
            .map(|face| {
                let bbox = face.bbox();
                Region::new(
                    bbox.x(),
                    bbox.y(),
                    bbox.width() as i32,
                    bbox.height() as i32,
                )
            })
            .collect())
    }
}

/// Parses a SeetaFace model file.
pub fn load_model(model_path: &Path) -> Result<rustface::Model, Box<dyn std::error::Error>> {
    let file = File::open(model_path)
        .map_err(|e| format!("Failed to open face model {}: {e}", model_path.display()))?;
    Ok(rustface::read_model(BufReader::new(file))?)
}

/// Steps rustface accepts; anything outside panics inside the detector.
const PYRAMID_STEP_RANGE: std::ops::RangeInclusive<f32> = 0.01..=0.99;

/// Converts an upscaling pyramid ratio into rustface's downscaling step.
///
/// The accepted ratios are roughly `1.0102..=100.0`.
pub fn pyramid_step(scale_factor: f64) -> Result<f32, Box<dyn std::error::Error>> {
    let step = (1.0 / scale_factor) as f32;
    if !scale_factor.is_finite() || !PYRAMID_STEP_RANGE.contains(&step) {
        return Err(format!(
            "Cascade scale factor must give a pyramid step in {:?}, got {scale_factor}",
            PYRAMID_STEP_RANGE
        )
        .into());
    }
    Ok(step)
}
