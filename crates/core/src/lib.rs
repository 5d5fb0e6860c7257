pub mod annotation;
pub mod codec;
pub mod detection;
pub mod pipeline;
pub mod shared;
pub mod storage;
