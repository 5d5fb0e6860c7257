use std::fs;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use humanmark_core::codec::infrastructure::image_buffer_codec::OutputFormat;
use humanmark_core::detection::domain::face_detector::CascadeParams;
use humanmark_core::detection::domain::person_detector::HogParams;
use humanmark_core::detection::infrastructure::onnx_person_detector::DEFAULT_CONFIDENCE;
use humanmark_core::detection::infrastructure::rustface_detector::pyramid_step;
use humanmark_core::shared::constants::{DEFAULT_JPEG_QUALITY, DEFAULT_QUEUE_CAPACITY};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Jpg,
    Png,
}

/// Batch settings after merging defaults, the optional JSON file and CLI flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub store_dir: PathBuf,
    /// `None` uses every available core.
    pub workers: Option<usize>,
    pub queue_capacity: usize,
    pub face_model: Option<PathBuf>,
    pub person_model: Option<PathBuf>,
    pub person_confidence: f64,
    pub format: Format,
    pub jpeg_quality: u8,
    pub face: CascadeParams,
    pub person: HogParams,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            store_dir: PathBuf::from("."),
            workers: None,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            face_model: None,
            person_model: None,
            person_confidence: DEFAULT_CONFIDENCE,
            format: Format::Jpg,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            face: CascadeParams::default(),
            person: HogParams::default(),
        }
    }
}

/// Values given on the command line; `None` leaves the lower layer in place.
#[derive(Debug, Default)]
pub struct Overrides {
    pub store_dir: Option<PathBuf>,
    pub workers: Option<usize>,
    pub queue_capacity: Option<usize>,
    pub face_model: Option<PathBuf>,
    pub person_model: Option<PathBuf>,
    pub format: Option<Format>,
    pub jpeg_quality: Option<u8>,
}

impl Settings {
    pub fn from_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let json = fs::read_to_string(path)
            .map_err(|e| format!("Cannot read config {}: {e}", path.display()))?;
        let settings = serde_json::from_str(&json)
            .map_err(|e| format!("Invalid config {}: {e}", path.display()))?;
        Ok(settings)
    }

    pub fn load(
        config: Option<&Path>,
        overrides: Overrides,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let mut settings = match config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        settings.apply(overrides);
        Ok(settings)
    }

    pub fn apply(&mut self, overrides: Overrides) {
        if let Some(dir) = overrides.store_dir {
            self.store_dir = dir;
        }
        if overrides.workers.is_some() {
            self.workers = overrides.workers;
        }
        if let Some(capacity) = overrides.queue_capacity {
            self.queue_capacity = capacity;
        }
        if overrides.face_model.is_some() {
            self.face_model = overrides.face_model;
        }
        if overrides.person_model.is_some() {
            self.person_model = overrides.person_model;
        }
        if let Some(format) = overrides.format {
            self.format = format;
        }
        if let Some(quality) = overrides.jpeg_quality {
            self.jpeg_quality = quality;
        }
    }

    pub fn validate(&self) -> Result<(), Box<dyn std::error::Error>> {
        if self.workers == Some(0) {
            return Err("Workers must be at least 1".into());
        }
        if self.queue_capacity == 0 {
            return Err("Queue capacity must be at least 1".into());
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(format!(
                "JPEG quality must be between 1 and 100, got {}",
                self.jpeg_quality
            )
            .into());
        }
        if !(0.0..=1.0).contains(&self.person_confidence) {
            return Err(format!(
                "Person confidence must be between 0.0 and 1.0, got {}",
                self.person_confidence
            )
            .into());
        }
        pyramid_step(self.face.scale_factor)?;
        if self.person.use_mean_shift {
            return Err("Mean-shift grouping is not supported by the person detector".into());
        }
        Ok(())
    }

    pub fn output_format(&self) -> OutputFormat {
        match self.format {
            Format::Jpg => OutputFormat::Jpeg {
                quality: self.jpeg_quality,
            },
            Format::Png => OutputFormat::Png,
        }
    }
}
