pub mod annotation_engine;
pub mod frame_builder;
pub mod frame_painter;
