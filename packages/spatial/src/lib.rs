#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! In-memory spatial index over named boundary polygons.
//!
//! Builds an R-tree of polygon envelopes so that overlap queries (which
//! places touch this county, which county holds most of this place) only
//! run exact polygon operations against nearby candidates.

use geo::{Area, BooleanOps, BoundingRect, Intersects, MultiPolygon};
use rstar::{AABB, RTree, RTreeObject};

/// A boundary polygon stored in the R-tree with its key.
struct BoundaryEntry {
    key: String,
    envelope: AABB<[f64; 2]>,
    polygon: MultiPolygon<f64>,
}

impl RTreeObject for BoundaryEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// R-tree index of keyed polygons.
pub struct SpatialIndex {
    tree: RTree<BoundaryEntry>,
}

impl SpatialIndex {
    /// Bulk-loads an index from `(key, polygon)` pairs. Empty polygons are
    /// skipped.
    #[must_use]
    pub fn new(boundaries: impl IntoIterator<Item = (String, MultiPolygon<f64>)>) -> Self {
        let entries: Vec<BoundaryEntry> = boundaries
            .into_iter()
            .filter_map(|(key, polygon)| {
                let Some(envelope) = compute_envelope(&polygon) else {
                    log::debug!("Skipping empty boundary {key}");
                    return None;
                };
                Some(BoundaryEntry {
                    key,
                    envelope,
                    polygon,
                })
            })
            .collect();

        Self {
            tree: RTree::bulk_load(entries),
        }
    }

    /// Boundaries that actually intersect `area`, in no particular order.
    #[must_use]
    pub fn intersecting(&self, area: &MultiPolygon<f64>) -> Vec<(&str, &MultiPolygon<f64>)> {
        let Some(query_env) = compute_envelope(area) else {
            return Vec::new();
        };

        self.tree
            .locate_in_envelope_intersecting(&query_env)
            .filter(|entry| entry.polygon.intersects(area))
            .map(|entry| (entry.key.as_str(), &entry.polygon))
            .collect()
    }

    /// Union of every indexed boundary that intersects `area`.
    #[must_use]
    pub fn union_intersecting(&self, area: &MultiPolygon<f64>) -> MultiPolygon<f64> {
        self.intersecting(area)
            .into_iter()
            .fold(MultiPolygon::new(vec![]), |acc, (_, polygon)| {
                acc.union(polygon)
            })
    }

    /// Key of the boundary sharing the largest area with `area`.
    ///
    /// Ties go to the lexicographically smallest key so the result does not
    /// depend on R-tree iteration order.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn largest_overlap(&self, area: &MultiPolygon<f64>) -> Option<&str> {
        let mut best: Option<(&str, f64)> = None;

        for (key, polygon) in self.intersecting(area) {
            let overlap = polygon.intersection(area).unsigned_area();
            if overlap <= 0.0 {
                continue;
            }
            match best {
                Some((best_key, best_area))
                    if overlap < best_area || (overlap == best_area && key > best_key) => {}
                _ => best = Some((key, overlap)),
            }
        }

        best.map(|(key, _)| key)
    }
}

/// Union of a set of polygons.
#[must_use]
pub fn union_all<'a>(polygons: impl IntoIterator<Item = &'a MultiPolygon<f64>>) -> MultiPolygon<f64> {
    polygons
        .into_iter()
        .fold(MultiPolygon::new(vec![]), |acc, polygon| acc.union(polygon))
}

/// Compute the bounding box envelope for a [`MultiPolygon`], or `None` if
/// it has no coordinates.
fn compute_envelope(mp: &MultiPolygon<f64>) -> Option<AABB<[f64; 2]>> {
    mp.bounding_rect()
        .map(|rect| AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]))
}
