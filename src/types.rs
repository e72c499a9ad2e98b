//! Core data types shared across the engine.

use bytes::Bytes;
use geo::Point;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Globally unique photo identifier.
///
/// UUID v7: a millisecond timestamp component plus random bits, so ids
/// generated by concurrent extractions within and across batches never
/// collide, and ids from separate upload sessions stay disjoint.
pub type PhotoId = Uuid;

/// An immutable geotagged photo record.
///
/// Created once per successfully extracted file and never mutated. The
/// photo collection owns these; the cluster index only holds ids and
/// coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Photo {
    pub id: PhotoId,
    /// Opaque reference to displayable image data.
    pub url: String,
    /// Original filename, display-only.
    pub name: String,
    /// WGS84 latitude in degrees, `[-90, 90]`.
    pub lat: f64,
    /// WGS84 longitude in degrees, `[-180, 180]`.
    pub lng: f64,
}

impl Photo {
    /// Create a photo with a freshly generated id.
    pub fn new(name: impl Into<String>, url: impl Into<String>, lat: f64, lng: f64) -> Self {
        Self {
            id: Uuid::now_v7(),
            url: url.into(),
            name: name.into(),
            lat,
            lng,
        }
    }

    /// Position as a `geo` point (x = longitude, y = latitude).
    pub fn position(&self) -> Point {
        Point::new(self.lng, self.lat)
    }
}

/// Coordinates read from a file's metadata.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTag {
    pub lat: f64,
    pub lng: f64,
}

impl GeoTag {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Whether both coordinates are finite and inside WGS84 bounds.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    pub fn point(&self) -> Point {
        Point::new(self.lng, self.lat)
    }
}

/// A user-supplied file queued for ingestion.
#[derive(Debug, Clone)]
pub struct FileHandle {
    /// Original filename.
    pub name: String,
    /// Declared media type, e.g. `image/jpeg`. Decides image-ness; there is
    /// no format allow-list beyond this filter.
    pub media_type: String,
    /// Raw file contents.
    pub bytes: Bytes,
    /// Host-provided displayable URL. When `None` the pipeline synthesizes
    /// an in-memory URL from the photo id.
    pub display_url: Option<String>,
}

impl FileHandle {
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, bytes: Bytes) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            bytes,
            display_url: None,
        }
    }

    pub fn with_display_url(mut self, url: impl Into<String>) -> Self {
        self.display_url = Some(url.into());
        self
    }

    /// Whether the declared media type marks this file as an image.
    pub fn is_image(&self) -> bool {
        self.media_type
            .trim()
            .to_ascii_lowercase()
            .starts_with("image/")
    }
}

/// A viewport bounding box in WGS84 degrees, boundaries inclusive.
///
/// `west > east` is allowed and means the box crosses the antimeridian.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl BoundingBox {
    pub fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    /// The whole world.
    pub fn world() -> Self {
        Self::new(-180.0, -90.0, 180.0, 90.0)
    }

    pub fn crosses_antimeridian(&self) -> bool {
        self.west > self.east
    }

    /// Whether a coordinate lies inside the box, boundaries inclusive.
    pub fn contains(&self, lat: f64, lng: f64) -> bool {
        if lat < self.south || lat > self.north {
            return false;
        }
        if self.crosses_antimeridian() {
            lng >= self.west || lng <= self.east
        } else {
            lng >= self.west && lng <= self.east
        }
    }

    /// Center of the box, antimeridian-aware on the longitude axis.
    pub fn center(&self) -> Point {
        let lat = (self.south + self.north) / 2.0;
        let lng = if self.crosses_antimeridian() {
            let span = (self.east + 360.0) - self.west;
            let mid = self.west + span / 2.0;
            if mid > 180.0 { mid - 360.0 } else { mid }
        } else {
            (self.west + self.east) / 2.0
        };
        Point::new(lng, lat)
    }
}

/// Identifier of a render node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeId {
    /// An individual photo rendered as its own marker.
    Photo(PhotoId),
    /// An aggregate cluster; ids are assigned deterministically at build.
    Cluster(u64),
}

/// What a render node stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeKind {
    /// Exactly one photo.
    Point { photo: PhotoId },
    /// Two or more photos aggregated at the queried zoom.
    Cluster { count: u32 },
}

/// One node of a cluster query result, ready for the rendering surface.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderNode {
    pub id: NodeId,
    /// Representative latitude: the photo's own position for points, the
    /// count-weighted centroid for clusters.
    pub lat: f64,
    pub lng: f64,
    #[serde(flatten)]
    pub kind: NodeKind,
}

impl RenderNode {
    pub fn is_cluster(&self) -> bool {
        matches!(self.kind, NodeKind::Cluster { .. })
    }

    /// Number of leaf photos this node represents (1 for a point).
    pub fn count(&self) -> u32 {
        match self.kind {
            NodeKind::Point { .. } => 1,
            NodeKind::Cluster { count } => count,
        }
    }
}

/// Instruction returned to the view controller after a marker click.
#[derive(Debug, Clone, PartialEq)]
pub enum ClickAction {
    /// Open the gallery over these photos, starting at `start_index`.
    OpenGallery {
        photos: Vec<Photo>,
        start_index: usize,
    },
    /// Recenter the viewport and zoom in by `zoom_delta` levels. Fallback
    /// for a cluster that resolved to no photos.
    RecenterAndZoom {
        lat: f64,
        lng: f64,
        zoom_delta: u8,
    },
}

/// Progress of one ingestion session.
///
/// `processed` counts settled files (success or failure) and is monotone
/// within a session; each session gets a fresh counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IngestProgress {
    pub processed: usize,
    pub total: usize,
}

impl IngestProgress {
    pub fn is_complete(&self) -> bool {
        self.processed >= self.total
    }
}
