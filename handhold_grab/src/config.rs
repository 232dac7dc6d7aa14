// Copyright 2025 the Handhold Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Interactor configuration, loadable from TOML.
//!
//! ```
//! use handhold_grab::config::GrabberConfig;
//!
//! let cfg = GrabberConfig::from_toml_str(
//!     r#"
//!     allow_palm_grab = false
//!     pinch_collider_radius = 0.02
//!     "#,
//! )
//! .unwrap();
//! assert!(!cfg.allow_palm_grab);
//! assert!(cfg.allow_pinch_grab);
//! assert_eq!(cfg.pinch_collider_radius, 0.02);
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced while loading or validating a [`GrabberConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// File that was being read.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// The TOML could not be parsed.
    #[error("failed to parse grabber config: {0}")]
    Parse(#[from] toml::de::Error),
    /// The config could not be serialized.
    #[error("failed to serialize grabber config: {0}")]
    Serialize(#[from] toml::ser::Error),
    /// A value is out of range.
    #[error("invalid grabber config: {field} must be finite and positive, got {value}")]
    Invalid {
        /// Offending field.
        field: &'static str,
        /// Offending value.
        value: f32,
    },
}

/// Settings for a [`GrabInteractor`](crate::interactor::GrabInteractor).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct GrabberConfig {
    /// Whether palm colliders may hover and grab.
    pub allow_palm_grab: bool,
    /// Whether pinch colliders may hover and grab.
    pub allow_pinch_grab: bool,
    /// Radius of the default palm sphere, in meters.
    pub palm_collider_radius: f32,
    /// Radius of the default pinch sphere, in meters.
    pub pinch_collider_radius: f32,
    /// Offset of the default palm sphere relative to the interactor.
    pub palm_offset: Vec3,
    /// Invoke the debug visualizer every tick.
    pub debug_visuals: bool,
}

impl Default for GrabberConfig {
    fn default() -> Self {
        Self {
            allow_palm_grab: true,
            allow_pinch_grab: true,
            palm_collider_radius: 0.05,
            pinch_collider_radius: 0.01,
            palm_offset: Vec3::ZERO,
            debug_visuals: false,
        }
    }
}

impl GrabberConfig {
    /// Parse and validate a config from TOML text. Missing keys take defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let cfg: Self = toml::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read, parse, and validate a config file.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let cfg = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), "loaded grabber config");
        Ok(cfg)
    }

    /// Serialize to pretty TOML.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check that both collider radii are finite and positive.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("palm_collider_radius", self.palm_collider_radius),
            ("pinch_collider_radius", self.pinch_collider_radius),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::Invalid { field, value });
            }
        }
        Ok(())
    }
}
