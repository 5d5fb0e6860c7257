use crate::shared::frame::Frame;

// BT.601 luma weights in 14-bit fixed point.
const LUMA_R: u32 = 4899;
const LUMA_G: u32 = 9617;
const LUMA_B: u32 = 1868;
const LUMA_SHIFT: u32 = 14;
const LUMA_ROUND: u32 = 1 << (LUMA_SHIFT - 1);

/// Detection-ready rasters derived from one source image.
///
/// Owned by the task that built them and dropped once detection completes.
#[derive(Clone, Debug)]
pub struct DetectionVariants {
    pub gray: Frame,
    pub mirrored: Frame,
}

/// Derives the grayscale and horizontally mirrored grayscale variants of a
/// color frame.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameBuilder;

impl FrameBuilder {
    pub fn new() -> Self {
        Self
    }

    pub fn build_variants(
        &self,
        source: &Frame,
    ) -> Result<DetectionVariants, Box<dyn std::error::Error>> {
        let gray = to_grayscale(source)?;
        let mirrored = mirror_horizontal(&gray);
        Ok(DetectionVariants { gray, mirrored })
    }
}

/// Converts a 3-channel RGB frame to single-channel luma.
pub fn to_grayscale(source: &Frame) -> Result<Frame, Box<dyn std::error::Error>> {
    if source.channels() != 3 {
        return Err(format!(
            "Grayscale conversion expects 3 channels, got {}",
            source.channels()
        )
        .into());
    }

    let gray = source
        .data()
        .chunks_exact(3)
        .map(|px| {
            let y = px[0] as u32 * LUMA_R + px[1] as u32 * LUMA_G + px[2] as u32 * LUMA_B;
            ((y + LUMA_ROUND) >> LUMA_SHIFT) as u8
        })
        .collect();

    Ok(Frame::gray(gray, source.width(), source.height()))
}

/// Flips a frame around its vertical axis: output `(x, y)` is input `(width - 1 - x, y)`.
pub fn mirror_horizontal(frame: &Frame) -> Frame {
    let row_len = frame.width() as usize * frame.channels() as usize;
    let channels = frame.channels() as usize;
    let mut data = Vec::with_capacity(frame.data().len());

    if row_len > 0 {
        for row in frame.data().chunks_exact(row_len) {
            for px in row.chunks_exact(channels).rev() {
                data.extend_from_slice(px);
            }
        }
    }

    Frame::new(data, frame.width(), frame.height(), frame.channels())
}
