use serde::{Deserialize, Serialize};

use crate::shared::frame::Frame;
use crate::shared::region::Region;

/// Sliding-window pedestrian detection parameters.
///
/// Field meanings follow the histogram-of-oriented-gradients detector
/// convention; backends document which of them they honor.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HogParams {
    /// Minimum classifier margin for a window to count as a hit.
    pub hit_threshold: f64,
    /// Window step `(x, y)` in pixels.
    pub win_stride: (u32, u32),
    /// Border `(x, y)` added around the image before scanning.
    pub padding: (u32, u32),
    /// Ratio between consecutive pyramid levels.
    pub scale: f64,
    /// A grouped box is kept only when more than this many raw hits support it.
    pub group_threshold: u32,
    pub use_mean_shift: bool,
}

impl Default for HogParams {
    fn default() -> Self {
        Self {
            hit_threshold: 0.0,
            win_stride: (4, 4),
            padding: (8, 8),
            scale: 1.1,
            group_threshold: 8,
            use_mean_shift: false,
        }
    }
}

/// Domain interface for person detection on a grayscale raster.
pub trait PersonDetector: Send {
    fn detect(
        &mut self,
        gray: &Frame,
        params: &HogParams,
    ) -> Result<Vec<Region>, Box<dyn std::error::Error>>;
}
