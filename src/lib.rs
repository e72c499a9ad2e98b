//! Embedded engine for geotagged photo ingestion and map clustering.
//!
//! Feed it user-supplied image files: the ingestion pipeline extracts GPS
//! metadata in bounded concurrent batches, and the cluster index answers
//! viewport queries with zoom-dependent clusters that expand back into
//! their member photos on click.
//!
//! ```rust
//! use photomap::{BoundingBox, ClusterConfig, Photo, PhotoMap};
//!
//! let mut map = PhotoMap::new(ClusterConfig::default())?;
//! map.extend(vec![
//!     Photo::new("louvre.jpg", "file:///louvre.jpg", 48.8606, 2.3376),
//!     Photo::new("orsay.jpg", "file:///orsay.jpg", 48.8600, 2.3266),
//! ])?;
//!
//! // zoomed out, the two museums merge into one cluster of 2
//! let nodes = map.query(&BoundingBox::world(), 3);
//! assert_eq!(nodes.len(), 1);
//! assert_eq!(nodes[0].count(), 2);
//!
//! // a cluster click yields every member photo for the gallery
//! let photomap::ClickAction::OpenGallery { photos, start_index } = map.click(nodes[0].id)?
//! else {
//!     unreachable!()
//! };
//! assert_eq!((photos.len(), start_index), (2, 0));
//! # Ok::<(), photomap::PhotoMapError>(())
//! ```

pub mod cluster;
pub mod config;
pub mod error;
pub mod extract;
pub mod gallery;
pub mod ingest;
pub mod map;
pub mod types;

pub use cluster::ClusterIndex;
pub use config::{ClusterConfig, IngestConfig};
pub use error::{ExtractError, PhotoMapError, Result};
pub use extract::{ExifExtractor, GeotagExtractor};
pub use gallery::Gallery;
pub use ingest::{IngestPipeline, IngestSession};
pub use map::PhotoMap;

pub use types::{
    BoundingBox, ClickAction, FileHandle, GeoTag, IngestProgress, NodeId, NodeKind, Photo,
    PhotoId, RenderNode,
};

pub use geo::Point;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {

    pub use crate::{PhotoMap, PhotoMapError, Result};

    pub use crate::{ClusterConfig, ClusterIndex, IngestConfig};

    pub use crate::{ExifExtractor, GeotagExtractor, IngestPipeline, IngestSession};

    pub use crate::{
        BoundingBox, ClickAction, FileHandle, GeoTag, Gallery, IngestProgress, NodeId, NodeKind,
        Photo, PhotoId, RenderNode,
    };

    pub use geo::Point;
}
