//! Spherical-mercator projection onto the unit square.
//!
//! All clustering math runs in projected `[0, 1] x [0, 1]` coordinates so
//! that the pixel radius scales uniformly with zoom: one zoom level doubles
//! the map, halving the merge radius in unit-square terms.

use std::f64::consts::PI;

/// Project longitude in degrees to `[0, 1]`.
#[inline]
pub(crate) fn project_x(lng: f64) -> f64 {
    lng / 360.0 + 0.5
}

/// Project latitude in degrees to `[0, 1]`, clamped at the mercator poles.
#[inline]
pub(crate) fn project_y(lat: f64) -> f64 {
    let sin = lat.to_radians().sin();
    // lat == ±90 produces an infinity here; the clamp pins it to the edge
    let y = 0.5 - 0.25 * ((1.0 + sin) / (1.0 - sin)).ln() / PI;
    y.clamp(0.0, 1.0)
}

#[inline]
pub(crate) fn unproject_lng(x: f64) -> f64 {
    (x - 0.5) * 360.0
}

#[inline]
pub(crate) fn unproject_lat(y: f64) -> f64 {
    let y2 = (180.0 - y * 360.0) * PI / 180.0;
    360.0 * y2.exp().atan() / PI - 90.0
}

/// Merge radius in unit-square coordinates for a pixel radius at a zoom.
#[inline]
pub(crate) fn merge_radius(radius_px: f64, tile_size: f64, zoom: u8) -> f64 {
    radius_px / (tile_size * (zoom as f64).exp2())
}
