use crate::annotation::domain::frame_painter::FramePainter;
use crate::shared::constants::OUTLINE_THICKNESS;
use crate::shared::detection::Detection;
use crate::shared::frame::Frame;

/// Draws each detection as a rectangle outline in its class color.
///
/// For region `(x, y, w, h)` the outermost ring runs along `(x, y)`–`(x+w, y+h)`
/// inclusive; each further ring of thickness steps one pixel inward. Pixels
/// outside the frame are clipped.
pub struct OutlinePainter {
    thickness: u32,
}

impl OutlinePainter {
    pub fn new(thickness: u32) -> Self {
        Self { thickness }
    }
}

impl Default for OutlinePainter {
    fn default() -> Self {
        Self::new(OUTLINE_THICKNESS)
    }
}

impl FramePainter for OutlinePainter {
    fn paint(
        &self,
        frame: &mut Frame,
        detections: &[Detection],
    ) -> Result<(), Box<dyn std::error::Error>> {
        if frame.channels() != 3 {
            return Err(format!(
                "Outline painting expects a 3-channel frame, got {}",
                frame.channels()
            )
            .into());
        }

        for det in detections {
            let r = det.region;
            let color = det.class.color();
            for ring in 0..self.thickness as i32 {
                let (x0, y0) = (r.x + ring, r.y + ring);
                let (x1, y1) = (r.right() - ring, r.bottom() - ring);
                if x0 > x1 || y0 > y1 {
                    break;
                }
                draw_ring(frame, x0, y0, x1, y1, color);
            }
        }

        Ok(())
    }
}

/// Sets the border pixels of the inclusive box `(x0, y0)`–`(x1, y1)`.
fn draw_ring(frame: &mut Frame, x0: i32, y0: i32, x1: i32, y1: i32, color: [u8; 3]) {
    let w = frame.width() as i32;
    let h = frame.height() as i32;
    if x1 < 0 || y1 < 0 || x0 >= w || y0 >= h {
        return;
    }

    let mut px = frame.as_ndarray_mut();
    let mut set = |x: i32, y: i32| {
        if (0..w).contains(&x) && (0..h).contains(&y) {
            for (c, &v) in color.iter().enumerate() {
                px[[y as usize, x as usize, c]] = v;
            }
        }
    };

    for x in x0.max(0)..=x1.min(w - 1) {
        set(x, y0);
        set(x, y1);
    }
    for y in y0.max(0)..=y1.min(h - 1) {
        set(x0, y);
        set(x1, y);
    }
}
