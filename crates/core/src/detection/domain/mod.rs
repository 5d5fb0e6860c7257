pub mod detector_factory;
pub mod face_detector;
pub mod person_detector;
