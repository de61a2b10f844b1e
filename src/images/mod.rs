//! Image materialization: turning image references found in a case record
//! into downscaled, embeddable JPEG data.

mod discover;
mod fetch;
mod materializer;
mod resize;

use std::collections::BTreeMap;
use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::error::ReportError;

pub use discover::discover_image_urls;
pub use fetch::{HttpImageFetcher, ImageFetcher};
pub use materializer::{ImageDiagnostics, ImageFailure, ImageMaterializer};
pub use resize::{downscaled_dimensions, embed_image};

/// A downscaled JPEG ready to be placed in a document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddedImage {
    width: u32,
    height: u32,
    #[serde(with = "base64_bytes")]
    data: Vec<u8>,
}

impl EmbeddedImage {
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            data,
        }
    }

    /// Pixel width.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Pixel height.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Encoded JPEG bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn base64(&self) -> String {
        STANDARD.encode(&self.data)
    }

    pub fn data_uri(&self) -> String {
        format!("data:image/jpeg;base64,{}", self.base64())
    }
}

mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded.as_bytes()).map_err(de::Error::custom)
    }
}

/// URL-keyed embedded images of one generation run.
///
/// A URL that failed to resolve has no entry; renderers skip it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageCache {
    entries: BTreeMap<String, EmbeddedImage>,
}

impl ImageCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, url: &str) -> Option<&EmbeddedImage> {
        self.entries.get(url)
    }

    pub fn contains(&self, url: &str) -> bool {
        self.entries.contains_key(url)
    }

    pub fn insert(&mut self, url: impl Into<String>, image: EmbeddedImage) {
        self.entries.insert(url.into(), image);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn urls(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Loads a cache previously written with [`ImageCache::save`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ReportError> {
        let contents = std::fs::read(path)?;
        Ok(serde_json::from_slice(&contents)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ReportError> {
        let contents = serde_json::to_vec(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }
}
