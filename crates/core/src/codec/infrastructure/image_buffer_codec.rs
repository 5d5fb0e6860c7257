use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};
use serde::{Deserialize, Serialize};

use crate::codec::domain::image_codec::ImageCodec;
use crate::shared::constants::DEFAULT_JPEG_QUALITY;
use crate::shared::frame::Frame;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Jpeg { quality: u8 },
    Png,
}

impl Default for OutputFormat {
    fn default() -> Self {
        OutputFormat::Jpeg {
            quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

/// [`ImageCodec`] backed by the `image` crate.
///
/// Decodes any format the crate recognizes into RGB8 and encodes to the
/// configured [`OutputFormat`].
pub struct ImageBufferCodec {
    format: OutputFormat,
}

impl ImageBufferCodec {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }
}

impl Default for ImageBufferCodec {
    fn default() -> Self {
        Self::new(OutputFormat::default())
    }
}

impl ImageCodec for ImageBufferCodec {
    fn decode(&self, bytes: &[u8]) -> Result<Frame, Box<dyn std::error::Error>> {
        let img = image::load_from_memory(bytes)?.to_rgb8();
        let (width, height) = img.dimensions();
        Ok(Frame::new(img.into_raw(), width, height, 3))
    }

    fn encode(&self, frame: &Frame) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
        if frame.channels() != 3 {
            return Err(format!("Expected a 3-channel frame, got {}", frame.channels()).into());
        }

        let mut out = Cursor::new(Vec::new());
        match self.format {
            OutputFormat::Jpeg { quality } => {
                // The encoder only accepts 1..=100.
                let quality = quality.clamp(1, 100);
                JpegEncoder::new_with_quality(&mut out, quality).write_image(
                    frame.data(),
                    frame.width(),
                    frame.height(),
                    ExtendedColorType::Rgb8,
                )?;
            }
            OutputFormat::Png => {
                PngEncoder::new(&mut out).write_image(
                    frame.data(),
                    frame.width(),
                    frame.height(),
                    ExtendedColorType::Rgb8,
                )?;
            }
        }
        Ok(out.into_inner())
    }
}
