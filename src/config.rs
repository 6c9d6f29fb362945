//! Render configuration.

use serde::{Deserialize, Serialize};

use crate::align::{AlignOptions, DEFAULT_DELIMITER};
use crate::error::Result;
use crate::html::ObsOptions;

/// Options shared by every render request.
///
/// All fields have defaults, so `{}` is a valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    /// Joins discontinuous runs of an aligned quote.
    pub quote_token_delimiter: String,
    /// Cached renders made by another version are stale.
    pub preview_version: String,
    pub obs_image_base_url: String,
    /// `none` leaves OBS images out.
    pub obs_image_resolution: String,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        let obs = ObsOptions::default();
        Self {
            quote_token_delimiter: DEFAULT_DELIMITER.to_string(),
            preview_version: env!("CARGO_PKG_VERSION").to_string(),
            obs_image_base_url: obs.image_base_url,
            obs_image_resolution: obs.resolution,
        }
    }
}

impl PreviewConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn align_options(&self) -> AlignOptions {
        AlignOptions {
            delimiter: self.quote_token_delimiter.clone(),
        }
    }

    pub fn obs_options(&self) -> ObsOptions {
        ObsOptions {
            image_base_url: self.obs_image_base_url.clone(),
            resolution: self.obs_image_resolution.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PreviewConfig::from_json("{}").unwrap();
        assert_eq!(config, PreviewConfig::default());
        assert_eq!(config.quote_token_delimiter, " … ");
        assert_eq!(config.obs_image_resolution, "360px");
    }

    #[test]
    fn test_partial_override() {
        let config = PreviewConfig::from_json(r#"{"quote_token_delimiter": " & ", "obs_image_resolution": "none"}"#).unwrap();
        assert_eq!(config.align_options().delimiter, " & ");
        assert_eq!(config.obs_options().resolution, "none");
        assert_eq!(config.preview_version, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_invalid_json() {
        assert!(PreviewConfig::from_json("{").is_err());
    }
}
