use crate::types::BoundaryFeature;
use geo::algorithm::bounding_rect::BoundingRect;
use geo::algorithm::contains::Contains;
use geo::Point;
use rstar::{RTree, RTreeObject, AABB};

// Wrapper for RTree indexing
struct AreaIndex {
    index: usize,
    aabb: AABB<[f64; 2]>,
}

impl RTreeObject for AreaIndex {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        self.aabb
    }
}

/// Point-in-neighborhood lookup over one cycle's boundary features.
pub struct BoundaryIndex {
    features: Vec<BoundaryFeature>,
    tree: RTree<AreaIndex>,
}

impl BoundaryIndex {
    pub fn new(features: Vec<BoundaryFeature>) -> Self {
        let items: Vec<AreaIndex> = features
            .iter()
            .enumerate()
            .filter_map(|(i, feature)| {
                let rect = feature.geometry.bounding_rect()?;
                Some(AreaIndex {
                    index: i,
                    aabb: AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]),
                })
            })
            .collect();

        Self { features, tree: RTree::bulk_load(items) }
    }

    pub fn locate(&self, lon: f64, lat: f64) -> Option<&BoundaryFeature> {
        let point = Point::new(lon, lat);
        let envelope = AABB::from_point([lon, lat]);

        self.tree
            .locate_in_envelope_intersecting(&envelope)
            .filter_map(|candidate| self.features.get(candidate.index))
            .find(|feature| feature.geometry.contains(&point))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, MultiPolygon};

    fn square(neighborhood: &str, borough: &str, x0: f64, y0: f64) -> BoundaryFeature {
        BoundaryFeature {
            neighborhood: neighborhood.to_string(),
            borough: Some(borough.to_string()),
            geometry: MultiPolygon::new(vec![polygon![
                (x: x0, y: y0),
                (x: x0 + 1.0, y: y0),
                (x: x0 + 1.0, y: y0 + 1.0),
                (x: x0, y: y0 + 1.0),
            ]]),
        }
    }

    #[test]
    fn finds_the_containing_polygon() {
        let index = BoundaryIndex::new(vec![
            square("West", "Manhattan", 0.0, 0.0),
            square("East", "Queens", 1.0, 0.0),
        ]);

        assert_eq!(index.locate(0.5, 0.5).map(|f| f.neighborhood.as_str()), Some("West"));
        assert_eq!(index.locate(1.5, 0.5).map(|f| f.neighborhood.as_str()), Some("East"));
        assert!(index.locate(5.0, 5.0).is_none());
    }
}
