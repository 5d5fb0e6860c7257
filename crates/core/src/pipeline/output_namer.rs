use std::collections::HashMap;

use crate::pipeline::image_failure::ImageFailure;
use crate::shared::constants::{KEY_NAME_FIELD, KEY_SEPARATOR};

/// Derives output paths from composite input keys and tracks which key
/// claimed each destination.
///
/// The file name is field 1 of the `,`-separated key, joined to the output
/// root. Claims are first-come: a second key mapping to the same
/// destination is a collision and must not be written.
pub struct OutputNamer {
    output_root: String,
    claimed: HashMap<String, String>,
}

impl OutputNamer {
    pub fn new(output_root: &str) -> Self {
        Self {
            output_root: output_root.trim_end_matches('/').to_string(),
            claimed: HashMap::new(),
        }
    }

    /// Pure key → destination mapping.
    pub fn destination_for(&self, key: &str) -> Result<String, ImageFailure> {
        let name = key
            .split(KEY_SEPARATOR)
            .nth(KEY_NAME_FIELD)
            .filter(|name| is_plain_file_name(name))
            .ok_or_else(|| ImageFailure::InvalidKey {
                key: key.to_string(),
            })?;

        if self.output_root.is_empty() {
            Ok(name.to_string())
        } else {
            Ok(format!("{}/{name}", self.output_root))
        }
    }

    /// Maps `key` and registers the destination as taken by it.
    pub fn claim(&mut self, key: &str) -> Result<String, ImageFailure> {
        let destination = self.destination_for(key)?;
        if let Some(owner) = self.claimed.get(&destination) {
            return Err(ImageFailure::DestinationCollision {
                path: destination,
                claimed_by: owner.clone(),
            });
        }
        self.claimed.insert(destination.clone(), key.to_string());
        Ok(destination)
    }

    pub fn claimed_count(&self) -> usize {
        self.claimed.len()
    }
}

fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\'])
}
