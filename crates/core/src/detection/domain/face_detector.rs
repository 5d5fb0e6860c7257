use serde::{Deserialize, Serialize};

use crate::shared::frame::Frame;
use crate::shared::region::Region;

/// Multi-scale cascade parameters for a face detection call.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CascadeParams {
    /// Ratio between consecutive pyramid levels (> 1.0).
    pub scale_factor: f64,
    /// Neighboring hits required to keep a candidate.
    pub min_neighbors: u32,
}

impl Default for CascadeParams {
    fn default() -> Self {
        Self {
            scale_factor: 1.25,
            min_neighbors: 3,
        }
    }
}

/// Domain interface for face detection on a grayscale raster.
///
/// Each call returns its own `Vec`; implementations never hand back a
/// buffer that a later call overwrites.
pub trait FaceDetector: Send {
    fn detect(
        &mut self,
        gray: &Frame,
        params: &CascadeParams,
    ) -> Result<Vec<Region>, Box<dyn std::error::Error>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let p = CascadeParams::default();
        assert_eq!(p.scale_factor, 1.25);
        assert_eq!(p.min_neighbors, 3);
    }

    #[test]
    fn test_deserializes_from_json() {
        let p: CascadeParams =
            serde_json::from_str(r#"{"scale_factor": 1.1, "min_neighbors": 5}"#).unwrap();
        assert_eq!(p.min_neighbors, 5);
    }
}
