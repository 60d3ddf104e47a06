//! Export settings
//!
//! Loaded from a TOML file; every key is optional.
//!
//! ```toml
//! axis_forward = "X"
//! axis_up = "Y"
//! quad_method = "shortest_diagonal"
//! ngon_method = "clip"
//! info = "exported by scm-export"
//! uv_tolerance = 0.0
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::convert::{Axis, AxisConversion};

/// How quads are split into two triangles
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuadMethod {
    /// Pick the diagonal giving the best-shaped triangles
    #[default]
    Beauty,
    /// Split along the first and third corners
    Fixed,
    /// Split along the second and fourth corners
    FixedAlternate,
    /// Split along the shorter diagonal
    ShortestDiagonal,
}

/// How polygons with more than four corners are triangulated
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NgonMethod {
    /// Ear clipping followed by quality-improving diagonal flips
    #[default]
    Beauty,
    /// Plain ear clipping
    Clip,
}

/// Caller-supplied export configuration
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportSettings {
    pub axis_forward: Axis,
    pub axis_up: Axis,
    pub quad_method: QuadMethod,
    pub ngon_method: NgonMethod,
    /// Free text stored in the model's info section
    pub info: String,
    /// Largest per-component UV difference still treated as the same coordinate
    pub uv_tolerance: f32,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            axis_forward: Axis::X,
            axis_up: Axis::Y,
            quad_method: QuadMethod::default(),
            ngon_method: NgonMethod::default(),
            info: String::new(),
            uv_tolerance: 1e-6,
        }
    }
}

impl ExportSettings {
    /// Load settings from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings: {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("Failed to parse settings: {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let settings: Self = toml::from_str(content)?;
        if settings.uv_tolerance.is_nan() || settings.uv_tolerance < 0.0 {
            anyhow::bail!(
                "uv_tolerance must be a non-negative number, got {}",
                settings.uv_tolerance
            );
        }
        Ok(settings)
    }

    /// Axis conversion described by `axis_forward`/`axis_up`
    pub fn axis_conversion(&self) -> crate::error::Result<AxisConversion> {
        AxisConversion::new(self.axis_forward, self.axis_up)
    }
}
