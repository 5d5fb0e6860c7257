use crate::shared::region::Region;

/// Which detector produced a [`Detection`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DetectionClass {
    Face,
    Person,
}

impl DetectionClass {
    /// Outline color in RGB order: faces red, people green.
    pub fn color(&self) -> [u8; 3] {
        match self {
            DetectionClass::Face => [255, 0, 0],
            DetectionClass::Person => [0, 255, 0],
        }
    }
}

/// A rectangle in native (source image) coordinates tagged with its class.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Detection {
    pub region: Region,
    pub class: DetectionClass,
}

impl Detection {
    pub fn face(region: Region) -> Self {
        Self {
            region,
            class: DetectionClass::Face,
        }
    }

    pub fn person(region: Region) -> Self {
        Self {
            region,
            class: DetectionClass::Person,
        }
    }
}

/// Number of detections of the given class.
pub fn count_class(detections: &[Detection], class: DetectionClass) -> usize {
    detections.iter().filter(|d| d.class == class).count()
}
