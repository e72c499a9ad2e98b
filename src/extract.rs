//! Geotag extraction from raw image bytes.
//!
//! The pipeline only depends on the [`GeotagExtractor`] trait; the bundled
//! [`ExifExtractor`] reads GPS coordinates from EXIF metadata. Everything
//! else about the file (pixels, thumbnails, orientation) is out of scope.

use std::io::Cursor;

use exif::{Exif, In, Reader, Tag, Value};

use crate::error::ExtractError;
use crate::types::GeoTag;

/// Black-box interface turning file bytes into optional coordinates.
///
/// "No GPS metadata" (`Ok(None)`) and "unreadable file" (`Err`) are treated
/// identically by the pipeline: the file is dropped with a diagnostic.
pub trait GeotagExtractor: Send + Sync {
    fn extract(&self, bytes: &[u8]) -> Result<Option<GeoTag>, ExtractError>;
}

/// EXIF-based extractor: decodes GPS rational degree/minute/second triplets
/// together with their hemisphere references into decimal degrees.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExifExtractor;

impl ExifExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl GeotagExtractor for ExifExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<Option<GeoTag>, ExtractError> {
        let mut cursor = Cursor::new(bytes);
        let exif = Reader::new().read_from_container(&mut cursor)?;

        let lat = gps_coordinate(&exif, Tag::GPSLatitude, Tag::GPSLatitudeRef)?;
        let lng = gps_coordinate(&exif, Tag::GPSLongitude, Tag::GPSLongitudeRef)?;

        match (lat, lng) {
            (Some(lat), Some(lng)) => Ok(Some(GeoTag::new(lat, lng))),
            _ => Ok(None),
        }
    }
}

/// Read one GPS coordinate and apply its hemisphere reference.
///
/// Returns `Ok(None)` when the coordinate or its reference is absent.
fn gps_coordinate(exif: &Exif, coord_tag: Tag, ref_tag: Tag) -> Result<Option<f64>, ExtractError> {
    let (Some(coord), Some(hemisphere)) = (
        exif.get_field(coord_tag, In::PRIMARY),
        exif.get_field(ref_tag, In::PRIMARY),
    ) else {
        return Ok(None);
    };

    let Value::Rational(parts) = &coord.value else {
        return Err(ExtractError::MalformedGps("coordinate is not rational"));
    };
    if parts.len() != 3 {
        return Err(ExtractError::MalformedGps(
            "coordinate is not a degree/minute/second triplet",
        ));
    }

    let decimal = dms_to_decimal(parts[0].to_f64(), parts[1].to_f64(), parts[2].to_f64());

    let Value::Ascii(refs) = &hemisphere.value else {
        return Err(ExtractError::MalformedGps("hemisphere reference is not ascii"));
    };
    match refs.first().and_then(|s| s.first()) {
        Some(b'N') | Some(b'E') => Ok(Some(decimal)),
        Some(b'S') | Some(b'W') => Ok(Some(-decimal)),
        _ => Err(ExtractError::MalformedGps("unknown hemisphere reference")),
    }
}

/// Convert a degree/minute/second triplet to decimal degrees.
#[inline]
fn dms_to_decimal(degrees: f64, minutes: f64, seconds: f64) -> f64 {
    degrees + minutes / 60.0 + seconds / 3600.0
}
