use crate::detection::domain::face_detector::FaceDetector;
use crate::detection::domain::person_detector::PersonDetector;

/// The two detectors one pipeline task owns for its whole lifetime.
pub struct DetectorPair {
    pub face: Box<dyn FaceDetector>,
    pub person: Box<dyn PersonDetector>,
}

/// Builds detector pairs for pipeline tasks.
///
/// Detectors take `&mut self`, so each concurrently running task needs its
/// own pair; the factory itself is shared across threads.
pub trait DetectorFactory: Send + Sync {
    fn create(&self) -> Result<DetectorPair, Box<dyn std::error::Error>>;
}
