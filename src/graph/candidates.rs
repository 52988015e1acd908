use geo::{Coord, Rect};
use rstar::{RTree, RTreeObject, AABB};
use serde::Deserialize;

use crate::precinct::PrecinctGeometry;

/// Which pairs a row evaluates the predicate on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Candidates {
    /// Every later index: `n(n-1)/2` evaluations in total.
    #[default]
    AllPairs,
    /// Only later indices whose padded bounding box meets the row's.
    /// Same relation as `AllPairs` with far fewer evaluations on real maps.
    Envelope,
}

/// A padded bounding box in an R-tree, associated with a precinct by index.
#[derive(Debug, Clone)]
struct BoundingBox {
    idx: usize, // Index of corresponding precinct in the scan input
    bbox: Rect<f64>,
}

impl RTreeObject for BoundingBox {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.bbox.min().into(), self.bbox.max().into())
    }
}

/// R-tree over precinct bounding boxes, each grown by `pad` on every side.
///
/// Precincts with non-finite coordinates stay out of the tree and have no candidates:
/// every predicate on them fails anyway.
#[derive(Debug)]
pub(crate) struct EnvelopeIndex {
    boxes: Vec<Option<BoundingBox>>,
    rtree: RTree<BoundingBox>,
}

impl EnvelopeIndex {
    /// `pad` is half the reach of the predicate, so two padded boxes meet whenever
    /// the unpadded boxes are within `reach`.
    pub(crate) fn new(precincts: &[PrecinctGeometry], reach: f64) -> Self {
        let pad = reach / 2.0;
        let boxes: Vec<Option<BoundingBox>> = precincts.iter().enumerate()
            .map(|(idx, precinct)| {
                if precinct.is_finite() {
                    Some(BoundingBox { idx, bbox: grow(precinct.bbox(), pad) })
                } else {
                    tracing::warn!(id = %precinct.id(), "non-finite coordinates; precinct left out of envelope index");
                    None
                }
            })
            .collect();

        Self { rtree: RTree::bulk_load(boxes.iter().flatten().cloned().collect()), boxes }
    }

    /// Indices whose padded box intersects the padded box of `idx`, including `idx` itself.
    pub(crate) fn candidates(&self, idx: usize) -> impl Iterator<Item = usize> + '_ {
        self.boxes[idx].iter()
            .flat_map(|bb| self.rtree.locate_in_envelope_intersecting(&bb.envelope()))
            .map(|bb| bb.idx)
    }
}

fn grow(rect: &Rect<f64>, pad: f64) -> Rect<f64> {
    Rect::new(
        Coord { x: rect.min().x - pad, y: rect.min().y - pad },
        Coord { x: rect.max().x + pad, y: rect.max().y + pad },
    )
}
