//! Runtime configuration for report generation.
//!
//! Values come from an optional TOML file and are then overridden by
//! `CLAIM_REPORT_*` environment variables, so deployments can tweak a single
//! setting without shipping a config file.

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::warn;
use serde::Deserialize;

use crate::error::ReportError;

/// Environment variable naming a directory with the report fonts.
pub const FONTS_DIR_ENV: &str = "CLAIM_REPORT_FONTS_DIR";

const AGENCY_NAME_ENV: &str = "CLAIM_REPORT_AGENCY_NAME";
const AGENCY_ADDRESS_ENV: &str = "CLAIM_REPORT_AGENCY_ADDRESS";
const AGENCY_CONTACT_ENV: &str = "CLAIM_REPORT_AGENCY_CONTACT";
const MAX_IMAGE_EDGE_ENV: &str = "CLAIM_REPORT_MAX_IMAGE_EDGE";
const JPEG_QUALITY_ENV: &str = "CLAIM_REPORT_JPEG_QUALITY";
const FETCH_TIMEOUT_ENV: &str = "CLAIM_REPORT_FETCH_TIMEOUT_SECS";

/// Letterhead identity of the investigating agency.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AgencyProfile {
    pub name: String,
    pub address: String,
    pub contact: String,
}

impl Default for AgencyProfile {
    fn default() -> Self {
        Self {
            name: "Claim Investigation Services".to_owned(),
            address: String::new(),
            contact: String::new(),
        }
    }
}

/// Knobs of the image materializer.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ImageSettings {
    /// Longest edge, in pixels, an embedded image may keep.
    pub max_edge_px: u32,
    /// JPEG quality on a 1..=100 scale.
    pub jpeg_quality: u8,
    /// Per-image fetch timeout in seconds.
    pub fetch_timeout_secs: u64,
}

impl Default for ImageSettings {
    fn default() -> Self {
        Self {
            max_edge_px: 800,
            jpeg_quality: 70,
            fetch_timeout_secs: 10,
        }
    }
}

impl ImageSettings {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

/// Complete configuration of a report generator.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub agency: AgencyProfile,
    pub images: ImageSettings,
    /// Extra directory searched for the PDF font family.
    pub fonts_dir: Option<PathBuf>,
}

impl ReportConfig {
    /// Parses a TOML document.
    pub fn from_toml_str(input: &str) -> Result<Self, ReportError> {
        let config: Self =
            toml::from_str(input).map_err(|err| ReportError::Config(err.to_string()))?;
        config.validate()
    }

    /// Reads a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ReportError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|err| {
            ReportError::Config(format!("cannot read {}: {}", path.display(), err))
        })?;
        Self::from_toml_str(&contents)
    }

    /// Defaults overridden by the environment.
    pub fn from_env() -> Result<Self, ReportError> {
        Self::default().with_env_overrides()
    }

    /// Applies `CLAIM_REPORT_*` environment variables on top of `self`.
    pub fn with_env_overrides(mut self) -> Result<Self, ReportError> {
        if let Some(name) = env_string(AGENCY_NAME_ENV) {
            self.agency.name = name;
        }
        if let Some(address) = env_string(AGENCY_ADDRESS_ENV) {
            self.agency.address = address;
        }
        if let Some(contact) = env_string(AGENCY_CONTACT_ENV) {
            self.agency.contact = contact;
        }
        if let Some(edge) = env_number(MAX_IMAGE_EDGE_ENV)? {
            self.images.max_edge_px = edge;
        }
        if let Some(quality) = env_number(JPEG_QUALITY_ENV)? {
            self.images.jpeg_quality = quality;
        }
        if let Some(timeout) = env_number(FETCH_TIMEOUT_ENV)? {
            self.images.fetch_timeout_secs = timeout;
        }
        if let Some(dir) = env_string(FONTS_DIR_ENV) {
            self.fonts_dir = Some(PathBuf::from(dir));
        }
        self.validate()
    }

    fn validate(self) -> Result<Self, ReportError> {
        if self.images.max_edge_px == 0 {
            return Err(ReportError::Config(
                "images.max_edge_px must be greater than zero".to_owned(),
            ));
        }
        if !(1..=100).contains(&self.images.jpeg_quality) {
            return Err(ReportError::Config(format!(
                "images.jpeg_quality must be within 1..=100, got {}",
                self.images.jpeg_quality
            )));
        }
        if self.images.fetch_timeout_secs == 0 {
            warn!("Image fetch timeout of 0 s disables every fetch; images will be omitted");
        }
        Ok(self)
    }
}

fn env_string(var: &str) -> Option<String> {
    env::var(var).ok().filter(|value| !value.trim().is_empty())
}

fn env_number<T: std::str::FromStr>(var: &str) -> Result<Option<T>, ReportError> {
    match env_string(var) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ReportError::Config(format!("{var} is not a valid number: {raw}"))),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_image_policy() {
        let config = ReportConfig::default();
        assert_eq!(config.images.max_edge_px, 800);
        assert_eq!(config.images.jpeg_quality, 70);
        assert_eq!(config.images.fetch_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn toml_overrides_only_given_keys() {
        let config = ReportConfig::from_toml_str(
            r#"
            [agency]
            name = "Sharma Investigations"

            [images]
            max_edge_px = 640
            "#,
        )
        .expect("valid config");
        assert_eq!(config.agency.name, "Sharma Investigations");
        assert_eq!(config.agency.address, "");
        assert_eq!(config.images.max_edge_px, 640);
        assert_eq!(config.images.jpeg_quality, 70);
    }

    #[test]
    fn rejects_out_of_range_quality() {
        let err = ReportConfig::from_toml_str("[images]\njpeg_quality = 0\n").unwrap_err();
        assert!(matches!(err, ReportError::Config(message) if message.contains("jpeg_quality")));
    }
}
