use crate::pipeline::image_failure::ImageFailure;

/// One annotated image that reached the store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WrittenImage {
    pub key: String,
    pub destination: String,
    pub byte_len: usize,
    pub faces: usize,
    pub people: usize,
}

/// Outcome of a whole batch: every enumerated image is either written or
/// failed, never both.
#[derive(Clone, Debug, Default)]
pub struct BatchReport {
    written: Vec<WrittenImage>,
    failures: Vec<(String, ImageFailure)>,
}

impl BatchReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_written(&mut self, image: WrittenImage) {
        self.written.push(image);
    }

    pub fn record_failure(&mut self, key: impl Into<String>, failure: ImageFailure) {
        self.failures.push((key.into(), failure));
    }

    pub fn written(&self) -> usize {
        self.written.len()
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn total(&self) -> usize {
        self.written() + self.failed()
    }

    pub fn outputs(&self) -> &[WrittenImage] {
        &self.written
    }

    pub fn failures(&self) -> &[(String, ImageFailure)] {
        &self.failures
    }

    pub fn output_for(&self, key: &str) -> Option<&WrittenImage> {
        self.written.iter().find(|w| w.key == key)
    }

    pub fn failure_for(&self, key: &str) -> Option<&ImageFailure> {
        self.failures
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, failure)| failure)
    }

    /// Orders entries by key so reports from concurrent runs compare equal.
    pub fn sort_by_key(&mut self) {
        self.written.sort_by(|a, b| a.key.cmp(&b.key));
        self.failures.sort_by(|a, b| a.0.cmp(&b.0));
    }
}
