// src/render/bands.rs
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::utils::error::ConfigError;

// --- Constants ---
const DEFAULT_BANDS: [&str; 4] = ["A-G", "H-N", "O-U", "V-Z"];

/// An alphabetic navigation band such as "A-G". Its start letter is the
/// first byte of the label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Band {
    label: String,
    start: u8,
}

impl Band {
    pub fn new(label: &str) -> Option<Self> {
        let start = *label.as_bytes().first()?;
        Some(Self { label: label.to_string(), start })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn start(&self) -> u8 {
        self.start
    }
}

/// Ordered list of bands used by the author-ordered page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BandSet {
    bands: Vec<Band>,
}

#[derive(Debug, Deserialize)]
struct BandFile {
    bands: Vec<String>,
}

impl Default for BandSet {
    fn default() -> Self {
        Self {
            bands: DEFAULT_BANDS.iter().filter_map(|label| Band::new(label)).collect(),
        }
    }
}

impl BandSet {
    pub fn from_labels<S: AsRef<str>>(labels: &[S]) -> Result<Self, ConfigError> {
        if labels.is_empty() {
            return Err(ConfigError::EmptyBands);
        }
        let bands = labels
            .iter()
            .enumerate()
            .map(|(i, label)| Band::new(label.as_ref()).ok_or(ConfigError::EmptyLabel(i)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { bands })
    }

    /// Loads bands from a JSON file of the form `{"bands": ["A-M", "N-Z"]}`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let file: BandFile = serde_json::from_str(&text).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        let set = Self::from_labels(&file.bands)?;
        tracing::info!("Loaded {} bands from {}", set.bands.len(), path.display());
        Ok(set)
    }

    pub fn bands(&self) -> &[Band] {
        &self.bands
    }
}
