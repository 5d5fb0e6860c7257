use crate::shared::detection::Detection;
use crate::shared::frame::Frame;

/// Domain interface for drawing detections onto a color frame.
///
/// Implementations modify the frame in-place and never change its dimensions.
pub trait FramePainter: Send + Sync {
    fn paint(
        &self,
        frame: &mut Frame,
        detections: &[Detection],
    ) -> Result<(), Box<dyn std::error::Error>>;
}
