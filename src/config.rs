//! Engine configuration.
//!
//! Both configs are plain serializable structs with defaults, so they can be
//! loaded from JSON or built in code with the `with_*` methods.

use serde::{Deserialize, Serialize};

use crate::error::{PhotoMapError, Result};

/// Configuration for the clustering index.
///
/// Two nodes merge at a given zoom when their projected screen distance at
/// that zoom is within `radius_px` (pixels at the reference `tile_size`).
/// Above `max_zoom` points are never merged.
///
/// # Example
///
/// ```rust
/// use photomap::ClusterConfig;
///
/// let config = ClusterConfig::default()
///     .with_radius_px(60.0)
///     .with_zoom_range(2, 18);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Clustering radius in pixels at the reference tile size.
    #[serde(default = "ClusterConfig::default_radius_px")]
    pub radius_px: f64,

    /// Reference tile size in pixels for the zoom/pixel projection.
    #[serde(default = "ClusterConfig::default_tile_size")]
    pub tile_size: f64,

    /// Coarsest zoom level clusters are generated for.
    #[serde(default)]
    pub min_zoom: u8,

    /// Finest zoom level clusters are generated for.
    #[serde(default = "ClusterConfig::default_max_zoom")]
    pub max_zoom: u8,
}

impl ClusterConfig {
    /// Upper bound for `max_zoom`; beyond this the per-zoom merge radius
    /// degenerates below float resolution in unit-square coordinates.
    pub const MAX_SUPPORTED_ZOOM: u8 = 30;

    const fn default_radius_px() -> f64 {
        40.0
    }

    const fn default_tile_size() -> f64 {
        256.0
    }

    const fn default_max_zoom() -> u8 {
        16
    }

    pub fn with_radius_px(mut self, radius_px: f64) -> Self {
        self.radius_px = radius_px;
        self
    }

    pub fn with_tile_size(mut self, tile_size: f64) -> Self {
        self.tile_size = tile_size;
        self
    }

    pub fn with_zoom_range(mut self, min_zoom: u8, max_zoom: u8) -> Self {
        self.min_zoom = min_zoom;
        self.max_zoom = max_zoom;
        self
    }

    /// Check all values are in range. Called on every index build.
    pub fn validate(&self) -> Result<()> {
        if !self.radius_px.is_finite() || self.radius_px <= 0.0 {
            return Err(PhotoMapError::InvalidConfig(format!(
                "radius_px must be a positive finite number, got {}",
                self.radius_px
            )));
        }
        if !self.tile_size.is_finite() || self.tile_size <= 0.0 {
            return Err(PhotoMapError::InvalidConfig(format!(
                "tile_size must be a positive finite number, got {}",
                self.tile_size
            )));
        }
        if self.min_zoom > self.max_zoom {
            return Err(PhotoMapError::InvalidConfig(format!(
                "min_zoom ({}) must not exceed max_zoom ({})",
                self.min_zoom, self.max_zoom
            )));
        }
        if self.max_zoom > Self::MAX_SUPPORTED_ZOOM {
            return Err(PhotoMapError::InvalidConfig(format!(
                "max_zoom must be at most {}, got {}",
                Self::MAX_SUPPORTED_ZOOM,
                self.max_zoom
            )));
        }
        Ok(())
    }
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            radius_px: Self::default_radius_px(),
            tile_size: Self::default_tile_size(),
            min_zoom: 0,
            max_zoom: Self::default_max_zoom(),
        }
    }
}

/// Configuration for the ingestion pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Number of files extracted concurrently per batch. The pipeline
    /// yields to the scheduler between batches.
    #[serde(default = "IngestConfig::default_batch_size")]
    pub batch_size: usize,
}

impl IngestConfig {
    const fn default_batch_size() -> usize {
        10
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(PhotoMapError::InvalidConfig(
                "batch_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            batch_size: Self::default_batch_size(),
        }
    }
}
