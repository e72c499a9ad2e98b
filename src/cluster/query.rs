//! Viewport queries and cluster expansion over the built index.

use rstar::AABB;

use super::projection::{project_x, project_y, unproject_lat, unproject_lng};
use super::{ClusterIndex, EntryNode, ProjectedEntry};
use crate::types::{BoundingBox, NodeId, NodeKind, PhotoId, RenderNode};

impl ClusterIndex {
    /// Return the render nodes for a viewport at a zoom level.
    ///
    /// Only nodes whose representative coordinate falls inside `bbox`
    /// (boundaries inclusive) are returned; a box with `west > east` is
    /// split at the antimeridian into two envelope queries. Results are in
    /// a stable order, and repeated calls with the same arguments return
    /// the identical node set.
    pub fn query(&self, bbox: &BoundingBox, zoom: u8) -> Vec<RenderNode> {
        if ![bbox.west, bbox.south, bbox.east, bbox.north]
            .iter()
            .all(|v| v.is_finite())
        {
            log::warn!("rejecting viewport query with non-finite coordinates");
            return Vec::new();
        }

        let depth = self.depth_for_zoom(zoom);
        let level = &self.levels[depth];
        if level.entries.is_empty() {
            return Vec::new();
        }

        let y_min = project_y(bbox.north.min(90.0));
        let y_max = project_y(bbox.south.max(-90.0));

        let mut hits: Vec<u32> = Vec::new();
        for (west, east) in longitude_spans(bbox) {
            let envelope = AABB::from_corners(
                ProjectedEntry {
                    x: project_x(west),
                    y: y_min,
                    idx: 0,
                },
                ProjectedEntry {
                    x: project_x(east),
                    y: y_max,
                    idx: 0,
                },
            );
            hits.extend(level.tree.locate_in_envelope(&envelope).map(|p| p.idx));
        }

        // entry order is build order; sorting makes the result independent
        // of R-tree iteration and of the split-query visit order
        hits.sort_unstable();
        hits.dedup();

        hits.into_iter()
            .map(|idx| self.render_node(depth, idx))
            .collect()
    }

    /// Every leaf photo id under a cluster, in depth-first child order, no
    /// duplicates and no omissions. `None` when the id is not in this
    /// index (e.g. it came from a previous snapshot).
    pub fn expand(&self, cluster_id: u64) -> Option<Vec<PhotoId>> {
        let &(depth, idx) = self.registry.get(&cluster_id)?;
        let mut leaves = Vec::with_capacity(
            self.levels[depth as usize].entries[idx as usize].count as usize,
        );
        self.collect_leaves(depth, idx, &mut leaves);
        Some(leaves)
    }

    /// Representative coordinate of a cluster, for the zoom-in fallback.
    pub fn cluster_center(&self, cluster_id: u64) -> Option<(f64, f64)> {
        let &(depth, idx) = self.registry.get(&cluster_id)?;
        let entry = &self.levels[depth as usize].entries[idx as usize];
        Some((unproject_lat(entry.y), unproject_lng(entry.x)))
    }

    fn render_node(&self, depth: usize, idx: u32) -> RenderNode {
        let entry = &self.levels[depth].entries[idx as usize];
        match entry.node {
            EntryNode::Photo(photo_idx) => {
                let photo = &self.photos[photo_idx as usize];
                RenderNode {
                    id: NodeId::Photo(photo.id),
                    lat: photo.lat,
                    lng: photo.lng,
                    kind: NodeKind::Point { photo: photo.id },
                }
            }
            EntryNode::Cluster(id) => RenderNode {
                id: NodeId::Cluster(id),
                lat: unproject_lat(entry.y),
                lng: unproject_lng(entry.x),
                kind: NodeKind::Cluster { count: entry.count },
            },
        }
    }
}

/// Normalize a viewport's longitude range into one or two west<=east spans
/// within `[-180, 180]`.
fn longitude_spans(bbox: &BoundingBox) -> Vec<(f64, f64)> {
    // viewports wider than the world see everything once
    if bbox.east - bbox.west >= 360.0 {
        return vec![(-180.0, 180.0)];
    }

    let west = wrap_longitude(bbox.west);
    let east = wrap_longitude(bbox.east);
    if west > east {
        vec![(west, 180.0), (-180.0, east)]
    } else {
        vec![(west, east)]
    }
}

/// Wrap a longitude into `[-180, 180]`, keeping ±180 distinct.
fn wrap_longitude(lng: f64) -> f64 {
    if (-180.0..=180.0).contains(&lng) {
        return lng;
    }
    let wrapped = (lng + 180.0).rem_euclid(360.0) - 180.0;
    // rem_euclid folds +180 onto -180; keep the eastern edge eastern
    if wrapped == -180.0 && lng > 0.0 {
        180.0
    } else {
        wrapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_longitude() {
        assert_eq!(wrap_longitude(0.0), 0.0);
        assert_eq!(wrap_longitude(180.0), 180.0);
        assert_eq!(wrap_longitude(-180.0), -180.0);
        assert_eq!(wrap_longitude(190.0), -170.0);
        assert_eq!(wrap_longitude(-190.0), 170.0);
        assert_eq!(wrap_longitude(540.0), 180.0);
    }

    #[test]
    fn test_longitude_spans_simple() {
        let bbox = BoundingBox::new(-10.0, -5.0, 10.0, 5.0);
        assert_eq!(longitude_spans(&bbox), vec![(-10.0, 10.0)]);
    }

    #[test]
    fn test_longitude_spans_antimeridian() {
        let bbox = BoundingBox::new(170.0, -5.0, -170.0, 5.0);
        assert_eq!(
            longitude_spans(&bbox),
            vec![(170.0, 180.0), (-180.0, -170.0)]
        );
    }

    #[test]
    fn test_longitude_spans_whole_world() {
        let bbox = BoundingBox::new(-200.0, -90.0, 200.0, 90.0);
        assert_eq!(longitude_spans(&bbox), vec![(-180.0, 180.0)]);
    }
}
