//! Owning facade over the photo collection and its cluster index.
//!
//! `PhotoMap` is mutated only by the context that owns it (typically the UI
//! thread), after an ingestion session has fully completed; extraction
//! tasks never touch it. Every mutation rebuilds the index and swaps the
//! `Arc` snapshot, so queries running against an older snapshot stay
//! consistent.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::cluster::ClusterIndex;
use crate::config::ClusterConfig;
use crate::error::{PhotoMapError, Result};
use crate::types::{BoundingBox, ClickAction, NodeId, Photo, PhotoId, RenderNode};

/// How many levels the viewport zooms in when a cluster click cannot be
/// resolved into photos.
const FALLBACK_ZOOM_DELTA: u8 = 2;

pub struct PhotoMap {
    config: ClusterConfig,
    photos: Vec<Photo>,
    by_id: FxHashMap<PhotoId, usize>,
    index: Arc<ClusterIndex>,
}

impl PhotoMap {
    /// Create an empty map. Fails only on an invalid config.
    pub fn new(config: ClusterConfig) -> Result<Self> {
        let index = Arc::new(ClusterIndex::build(&[], config.clone())?);
        Ok(Self {
            config,
            photos: Vec::new(),
            by_id: FxHashMap::default(),
            index,
        })
    }

    /// Append an ingestion session's output and rebuild the index.
    ///
    /// Additive: photos from earlier sessions stay on the map. A photo
    /// whose id is already present is skipped with a diagnostic (ids are
    /// generated to make this impossible in practice). Returns the number
    /// of photos added.
    pub fn extend(&mut self, photos: Vec<Photo>) -> Result<usize> {
        let mut added = 0usize;
        for photo in photos {
            if self.by_id.contains_key(&photo.id) {
                log::warn!("skipping duplicate photo id {} ({})", photo.id, photo.name);
                continue;
            }
            self.by_id.insert(photo.id, self.photos.len());
            self.photos.push(photo);
            added += 1;
        }
        if added > 0 {
            self.rebuild()?;
        }
        Ok(added)
    }

    /// Discard the whole collection, e.g. at the start of a new upload
    /// session that replaces the map contents.
    pub fn clear(&mut self) -> Result<()> {
        self.photos.clear();
        self.by_id.clear();
        self.rebuild()
    }

    fn rebuild(&mut self) -> Result<()> {
        let index = ClusterIndex::build(&self.photos, self.config.clone())?;
        self.index = Arc::new(index);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.photos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.photos.is_empty()
    }

    pub fn photos(&self) -> &[Photo] {
        &self.photos
    }

    pub fn photo(&self, id: PhotoId) -> Option<&Photo> {
        self.by_id.get(&id).map(|&idx| &self.photos[idx])
    }

    /// Current index snapshot. Callers holding the `Arc` can keep querying
    /// it while the map is extended underneath them.
    pub fn index(&self) -> Arc<ClusterIndex> {
        Arc::clone(&self.index)
    }

    /// Query the current snapshot for a viewport.
    pub fn query(&self, bbox: &BoundingBox, zoom: u8) -> Vec<RenderNode> {
        self.index.query(bbox, zoom)
    }

    /// Resolve a marker click into an instruction for the view controller.
    ///
    /// A point click opens the gallery over that single photo; a cluster
    /// click opens it over every leaf photo, starting at index 0. A cluster
    /// that resolves to zero photos (guarded invariant violation) yields a
    /// recenter-and-zoom instruction instead of an empty gallery.
    pub fn click(&self, node: NodeId) -> Result<ClickAction> {
        match node {
            NodeId::Photo(id) => {
                let photo = self.photo(id).ok_or(PhotoMapError::UnknownNode(node))?;
                Ok(ClickAction::OpenGallery {
                    photos: vec![photo.clone()],
                    start_index: 0,
                })
            }
            NodeId::Cluster(cluster_id) => {
                let leaves = self
                    .index
                    .expand(cluster_id)
                    .ok_or(PhotoMapError::UnknownNode(node))?;
                let photos: Vec<Photo> = leaves
                    .iter()
                    .filter_map(|&id| self.photo(id).cloned())
                    .collect();

                if photos.is_empty() {
                    let (lat, lng) = self
                        .index
                        .cluster_center(cluster_id)
                        .ok_or(PhotoMapError::UnknownNode(node))?;
                    log::warn!(
                        "cluster {cluster_id} expanded to zero photos; zooming in instead"
                    );
                    return Ok(ClickAction::RecenterAndZoom {
                        lat,
                        lng,
                        zoom_delta: FALLBACK_ZOOM_DELTA,
                    });
                }

                Ok(ClickAction::OpenGallery {
                    photos,
                    start_index: 0,
                })
            }
        }
    }
}
