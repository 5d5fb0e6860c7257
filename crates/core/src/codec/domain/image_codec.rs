use crate::shared::frame::Frame;

/// Converts between encoded image bytes and 3-channel RGB frames.
///
/// The output format is fixed when the codec is constructed.
pub trait ImageCodec: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> Result<Frame, Box<dyn std::error::Error>>;

    fn encode(&self, frame: &Frame) -> Result<Vec<u8>, Box<dyn std::error::Error>>;
}
