pub mod execution_provider;
pub mod math;
pub mod model_detector_factory;
pub mod onnx_person_detector;
pub mod rustface_detector;
