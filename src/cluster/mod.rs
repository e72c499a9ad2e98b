//! Zoom-leveled clustering index over a photo collection.
//!
//! The index precomputes cluster candidates for every discrete zoom level in
//! the configured range, coarse-to-fine: the finest level holds every photo
//! unclustered (served at and above `max_zoom`, where markers always render
//! individually), and each step toward `min_zoom` greedily merges nodes
//! whose projected screen distance falls within the configured pixel radius. Each level keeps an R-tree over its
//! entries so viewport queries never rescan the whole collection.
//!
//! A build is an immutable snapshot: the owning map rebuilds on every
//! collection change and swaps the `Arc`, so in-flight queries keep reading
//! a consistent index.

mod projection;
mod query;


use rstar::{Point as RstarPoint, RTree};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::config::ClusterConfig;
use crate::error::Result;
use crate::types::{Photo, PhotoId};

/// A projected entry wrapper for use with the R-tree.
///
/// Carries the index of its [`ClusterEntry`] within the level so query hits
/// can be resolved back to full entries.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ProjectedEntry {
    pub x: f64,
    pub y: f64,
    pub idx: u32,
}

impl RstarPoint for ProjectedEntry {
    type Scalar = f64;
    const DIMENSIONS: usize = 2;

    fn generate(mut generator: impl FnMut(usize) -> Self::Scalar) -> Self {
        Self {
            x: generator(0),
            y: generator(1),
            idx: u32::MAX,
        }
    }

    fn nth(&self, index: usize) -> Self::Scalar {
        match index {
            0 => self.x,
            1 => self.y,
            _ => unreachable!(),
        }
    }

    fn nth_mut(&mut self, index: usize) -> &mut Self::Scalar {
        match index {
            0 => &mut self.x,
            1 => &mut self.y,
            _ => unreachable!(),
        }
    }
}

/// What a level entry stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EntryNode {
    /// A single photo, by index into the build input.
    Photo(u32),
    /// A merged cluster, by deterministic build-order id.
    Cluster(u64),
}

/// One node at one zoom level.
#[derive(Debug, Clone)]
pub(crate) struct ClusterEntry {
    /// Projected unit-square position; for clusters this is the
    /// count-weighted centroid of the children.
    pub x: f64,
    pub y: f64,
    /// Total leaf photos underneath.
    pub count: u32,
    pub node: EntryNode,
    /// Indices into the next finer level. Empty only at the leaf level; an
    /// unmerged entry carries a single child through.
    pub children: SmallVec<[u32; 8]>,
}

/// Entries plus the R-tree over their projected positions.
pub(crate) struct Level {
    pub entries: Vec<ClusterEntry>,
    pub tree: RTree<ProjectedEntry>,
}

impl Level {
    fn new(entries: Vec<ClusterEntry>) -> Self {
        let tree = RTree::bulk_load(
            entries
                .iter()
                .enumerate()
                .map(|(idx, entry)| ProjectedEntry {
                    x: entry.x,
                    y: entry.y,
                    idx: idx as u32,
                })
                .collect(),
        );
        Self { entries, tree }
    }
}

/// Leaf photo data retained by the index: id plus the original coordinates,
/// so point nodes render at the exact photo position rather than a
/// projection round-trip.
#[derive(Debug, Clone, Copy)]
pub(crate) struct LeafPhoto {
    pub id: PhotoId,
    pub lat: f64,
    pub lng: f64,
}

/// Immutable, hierarchical cluster index. See the module docs.
pub struct ClusterIndex {
    config: ClusterConfig,
    /// `levels[0]` is the unclustered leaf level; each subsequent level is
    /// one zoom step coarser, down to `min_zoom` at the end.
    levels: Vec<Level>,
    /// Cluster id -> (level depth, entry index) at the creation level.
    registry: FxHashMap<u64, (u16, u32)>,
    photos: Vec<LeafPhoto>,
}

impl ClusterIndex {
    /// Build an index over a snapshot of the photo collection.
    ///
    /// Deterministic: the same photos in the same order under the same
    /// config produce identical levels, ids, and membership.
    pub fn build(photos: &[Photo], config: ClusterConfig) -> Result<Self> {
        config.validate()?;

        let leaf_photos: Vec<LeafPhoto> = photos
            .iter()
            .map(|p| LeafPhoto {
                id: p.id,
                lat: p.lat,
                lng: p.lng,
            })
            .collect();

        let leaf_entries: Vec<ClusterEntry> = photos
            .iter()
            .enumerate()
            .map(|(idx, p)| ClusterEntry {
                x: projection::project_x(p.lng),
                y: projection::project_y(p.lat),
                count: 1,
                node: EntryNode::Photo(idx as u32),
                children: SmallVec::new(),
            })
            .collect();

        let zoom_steps = (config.max_zoom - config.min_zoom) as usize;
        let mut levels: Vec<Level> = Vec::with_capacity(zoom_steps + 1);
        let mut registry = FxHashMap::default();
        let mut next_cluster_id: u64 = 0;

        let mut current = Level::new(leaf_entries);
        for zoom in (config.min_zoom..config.max_zoom).rev() {
            let depth = (levels.len() + 1) as u16;
            let coarser = merge_level(
                &current,
                zoom,
                &config,
                &mut registry,
                &mut next_cluster_id,
                depth,
            );
            levels.push(current);
            current = coarser;
        }
        levels.push(current);

        log::debug!(
            "built cluster index: {} photos, {} levels, {} clusters",
            photos.len(),
            levels.len(),
            next_cluster_id
        );

        Ok(Self {
            config,
            levels,
            registry,
            photos: leaf_photos,
        })
    }

    /// Number of indexed photos.
    pub fn len(&self) -> usize {
        self.photos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.photos.is_empty()
    }

    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    /// Depth into `levels` serving a query zoom: zooms at or above
    /// `max_zoom` get the unclustered leaf level, zooms below `min_zoom`
    /// the coarsest one.
    pub(crate) fn depth_for_zoom(&self, zoom: u8) -> usize {
        let zoom = zoom.clamp(self.config.min_zoom, self.config.max_zoom);
        (self.config.max_zoom - zoom) as usize
    }

    /// Collect every leaf photo id underneath an entry, depth-first in
    /// child order.
    pub(crate) fn collect_leaves(&self, depth: u16, idx: u32, out: &mut Vec<PhotoId>) {
        let entry = &self.levels[depth as usize].entries[idx as usize];
        if entry.children.is_empty() {
            if let EntryNode::Photo(photo_idx) = entry.node {
                out.push(self.photos[photo_idx as usize].id);
            }
            return;
        }
        for &child in &entry.children {
            self.collect_leaves(depth - 1, child, out);
        }
    }
}

/// Produce the level for `zoom` by greedily merging the next finer level.
///
/// Entries are visited in index order; each unassigned entry claims every
/// unassigned neighbor within the merge radius. Neighbor candidates are
/// sorted by index before claiming, so merge groups are independent of the
/// R-tree's internal iteration order.
fn merge_level(
    finer: &Level,
    zoom: u8,
    config: &ClusterConfig,
    registry: &mut FxHashMap<u64, (u16, u32)>,
    next_cluster_id: &mut u64,
    depth: u16,
) -> Level {
    let radius = projection::merge_radius(config.radius_px, config.tile_size, zoom);
    let radius_sq = radius * radius;

    let mut assigned = vec![false; finer.entries.len()];
    let mut entries: Vec<ClusterEntry> = Vec::with_capacity(finer.entries.len());

    for i in 0..finer.entries.len() {
        if assigned[i] {
            continue;
        }
        assigned[i] = true;
        let origin = &finer.entries[i];

        let probe = ProjectedEntry {
            x: origin.x,
            y: origin.y,
            idx: i as u32,
        };
        let mut neighbors: Vec<u32> = finer
            .tree
            .locate_within_distance(probe, radius_sq)
            .map(|hit| hit.idx)
            .filter(|&j| !assigned[j as usize])
            .collect();
        neighbors.sort_unstable();

        let mut group: SmallVec<[u32; 8]> = SmallVec::new();
        group.push(i as u32);
        for &j in &neighbors {
            assigned[j as usize] = true;
            group.push(j);
        }

        if group.len() == 1 {
            // Unmerged: carry the node through unchanged, same id and
            // position, so zooming out does not re-label lone markers.
            entries.push(ClusterEntry {
                x: origin.x,
                y: origin.y,
                count: origin.count,
                node: origin.node,
                children: group,
            });
        } else {
            let total: u32 = group
                .iter()
                .map(|&j| finer.entries[j as usize].count)
                .sum();
            let weight = total as f64;
            let mut x = 0.0;
            let mut y = 0.0;
            for &j in &group {
                let child = &finer.entries[j as usize];
                x += child.x * child.count as f64;
                y += child.y * child.count as f64;
            }

            let id = *next_cluster_id;
            *next_cluster_id += 1;
            registry.insert(id, (depth, entries.len() as u32));

            entries.push(ClusterEntry {
                x: x / weight,
                y: y / weight,
                count: total,
                node: EntryNode::Cluster(id),
                children: group,
            });
        }
    }

    Level::new(entries)
}
