use std::path::{Path, PathBuf};

use crate::detection::domain::detector_factory::{DetectorFactory, DetectorPair};

use super::onnx_person_detector::OnnxPersonDetector;
use super::rustface_detector::{load_model, RustfaceDetector};

/// Builds [`RustfaceDetector`] + [`OnnxPersonDetector`] pairs from model files.
///
/// The face model is parsed once up front and cloned into each pair; the
/// person model is loaded into a new ONNX session per pair.
pub struct ModelDetectorFactory {
    face_model: rustface::Model,
    person_model_path: PathBuf,
    person_confidence: f64,
}

impl ModelDetectorFactory {
    pub fn new(
        face_model_path: &Path,
        person_model_path: &Path,
        person_confidence: f64,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let face_model = load_model(face_model_path)?;
        if !person_model_path.is_file() {
            return Err(format!(
                "Person model not found: {}",
                person_model_path.display()
            )
            .into());
        }
        Ok(Self {
            face_model,
            person_model_path: person_model_path.to_path_buf(),
            person_confidence,
        })
    }
}

impl DetectorFactory for ModelDetectorFactory {
    fn create(&self) -> Result<DetectorPair, Box<dyn std::error::Error>> {
        let face = RustfaceDetector::from_model(self.face_model.clone());
        let person = OnnxPersonDetector::new(&self.person_model_path, self.person_confidence)?;
        Ok(DetectorPair {
            face: Box::new(face),
            person: Box::new(person),
        })
    }
}
