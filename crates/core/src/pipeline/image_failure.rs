use thiserror::Error;

/// Why one image of a batch produced no output.
///
/// Payloads are plain strings so failures can cross worker threads and be
/// kept in the [`super::batch_report::BatchReport`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImageFailure {
    #[error("key {key:?} has no usable output name")]
    InvalidKey { key: String },
    #[error("destination {path} already claimed by {claimed_by}")]
    DestinationCollision { path: String, claimed_by: String },
    #[error("read failed: {0}")]
    Read(String),
    #[error("decode failed: {0}")]
    Decode(String),
    #[error("detection failed: {0}")]
    Detection(String),
    #[error("encode failed: {0}")]
    Encode(String),
    #[error("write to {path} failed: {reason}")]
    Write { path: String, reason: String },
    #[error("processing panicked: {0}")]
    Panicked(String),
}

impl ImageFailure {
    /// Short stage label used in log lines and the batch summary.
    pub fn stage(&self) -> &'static str {
        match self {
            ImageFailure::InvalidKey { .. } | ImageFailure::DestinationCollision { .. } => "name",
            ImageFailure::Read(_) => "read",
            ImageFailure::Decode(_) => "decode",
            ImageFailure::Detection(_) => "detect",
            ImageFailure::Encode(_) => "encode",
            ImageFailure::Write { .. } => "write",
            ImageFailure::Panicked(_) => "panic",
        }
    }
}
