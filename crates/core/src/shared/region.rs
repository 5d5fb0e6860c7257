/// An axis-aligned rectangle in pixel coordinates of the raster it was found in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Region {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Region {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Builds a region from `[x1, y1, x2, y2]` float corners, rounding to pixels.
    pub fn from_corners(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        let x = x1.round() as i32;
        let y = y1.round() as i32;
        Self {
            x,
            y,
            width: (x2.round() as i32 - x).max(0),
            height: (y2.round() as i32 - y).max(0),
        }
    }

    /// Right edge, inclusive of the outline drawn at `x + width`.
    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    /// Maps a region found in a horizontally mirrored raster of width
    /// `image_width` back into the unmirrored coordinate space.
    ///
    /// `x' = image_width - x - width`; `y` is unaffected by a horizontal flip.
    /// Applying the transform twice yields the original region.
    pub fn mirrored(&self, image_width: u32) -> Self {
        Self {
            x: image_width as i32 - self.x - self.width,
            ..*self
        }
    }
}
