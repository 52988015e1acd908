use geo::{BoundingRect, Coord, LineString, MultiLineString, MultiPolygon, Polygon, Rect};

use super::{FeatureError, PrecinctId};

/// Fewest vertices a ring needs to enclose an area.
pub const MIN_AREAL_VERTICES: usize = 3;

/// The normalized unit of work: a named precinct with one outer ring per polygon part.
///
/// Rings are stored exactly as they were expressed in the source; they are never
/// re-closed or deduplicated. The bounding rectangle and the filled shape are derived
/// once here so the predicates never rebuild them inside the scan.
#[derive(Debug, Clone)]
pub struct PrecinctGeometry {
    id: PrecinctId,
    rings: Vec<LineString<f64>>,
    bbox: Rect<f64>,
    shape: MultiPolygon<f64>,
    finite: bool,
}

impl PrecinctGeometry {
    /// Construct a precinct from its identifier and outer rings.
    /// Fails if there are no rings or if any ring has no vertices.
    pub fn new(id: PrecinctId, rings: Vec<LineString<f64>>) -> Result<Self, FeatureError> {
        if rings.is_empty() || rings.iter().any(|ring| ring.0.is_empty()) {
            return Err(FeatureError::EmptyGeometry);
        }

        let bbox = MultiLineString::new(rings.clone())
            .bounding_rect()
            .ok_or(FeatureError::EmptyGeometry)?;

        // geo::Polygon closes its exterior; the stored rings stay untouched.
        let mut parts = Vec::with_capacity(rings.len());
        for (index, ring) in rings.iter().enumerate() {
            if ring.0.len() >= MIN_AREAL_VERTICES {
                parts.push(Polygon::new(ring.clone(), vec![]));
            } else {
                tracing::warn!(%id, ring = index, vertices = ring.0.len(), "ring cannot span an area; left out of the filled shape");
            }
        }
        let shape = MultiPolygon(parts);

        let finite = rings.iter()
            .flat_map(|ring| ring.0.iter())
            .all(|c| c.x.is_finite() && c.y.is_finite());

        Ok(Self { id, rings, bbox, shape, finite })
    }

    /// Shorthand for tests and callers holding plain coordinate lists.
    pub fn from_coords(id: impl Into<PrecinctId>, rings: Vec<Vec<(f64, f64)>>) -> Result<Self, FeatureError> {
        Self::new(id.into(), rings.into_iter().map(LineString::from).collect())
    }

    #[inline] pub fn id(&self) -> &PrecinctId { &self.id }

    #[inline] pub fn rings(&self) -> &[LineString<f64>] { &self.rings }

    /// Axis-aligned bounding rectangle over every ring.
    #[inline] pub fn bbox(&self) -> &Rect<f64> { &self.bbox }

    /// Filled form of the rings, one polygon per areal part, no holes.
    /// Rings with fewer than [`MIN_AREAL_VERTICES`] vertices are left out, so this
    /// may be empty.
    #[inline] pub fn shape(&self) -> &MultiPolygon<f64> { &self.shape }

    /// False if any vertex has a NaN or infinite ordinate.
    #[inline] pub fn is_finite(&self) -> bool { self.finite }

    /// Iterate over every vertex of every ring.
    #[inline]
    pub fn vertices(&self) -> impl Iterator<Item = &Coord<f64>> + '_ {
        self.rings.iter().flat_map(|ring| ring.0.iter())
    }

    /// Total vertex count across all rings.
    pub fn vertex_count(&self) -> usize {
        self.rings.iter().map(|ring| ring.0.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_ring_sets() {
        let err = PrecinctGeometry::from_coords(1, vec![]).unwrap_err();
        assert!(matches!(err, FeatureError::EmptyGeometry));

        let err = PrecinctGeometry::from_coords(1, vec![vec![(0.0, 0.0)], vec![]]).unwrap_err();
        assert!(matches!(err, FeatureError::EmptyGeometry));
    }

    #[test]
    fn rings_are_kept_as_expressed() {
        let open = vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)];
        let precinct = PrecinctGeometry::from_coords(1, vec![open]).unwrap();

        assert_eq!(precinct.rings()[0].0.len(), 3);
        assert_eq!(precinct.vertex_count(), 3);
        // The filled shape is closed even though the ring is not.
        assert_eq!(precinct.shape().0[0].exterior().0.len(), 4);
    }

    #[test]
    fn bbox_spans_all_parts() {
        let precinct = PrecinctGeometry::from_coords("a", vec![
            vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 0.0)],
            vec![(5.0, -2.0), (6.0, -2.0), (6.0, 3.0), (5.0, -2.0)],
        ]).unwrap();

        assert_eq!(precinct.bbox().min(), Coord { x: 0.0, y: -2.0 });
        assert_eq!(precinct.bbox().max(), Coord { x: 6.0, y: 3.0 });
        assert_eq!(precinct.vertices().count(), 8);
    }

    #[test]
    fn flags_non_finite_vertices() {
        let ok = PrecinctGeometry::from_coords(1, vec![vec![(0.0, 0.0), (1.0, 1.0)]]).unwrap();
        let bad = PrecinctGeometry::from_coords(2, vec![vec![(0.0, f64::NAN), (1.0, 1.0)]]).unwrap();

        assert!(ok.is_finite());
        assert!(!bad.is_finite());
    }

    #[test]
    fn degenerate_parts_are_left_out_of_the_shape() {
        let precinct = PrecinctGeometry::from_coords(1, vec![
            vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0), (0.0, 0.0)],
            vec![(5.0, 5.0), (6.0, 6.0)],
        ]).unwrap();

        assert_eq!(precinct.rings().len(), 2);
        assert_eq!(precinct.shape().0.len(), 1);
        assert_eq!(precinct.bbox().max(), Coord { x: 6.0, y: 6.0 });

        let sliver = PrecinctGeometry::from_coords(2, vec![vec![(0.0, 0.0), (1.0, 1.0)]]).unwrap();
        assert!(sliver.shape().0.is_empty());
    }
}
