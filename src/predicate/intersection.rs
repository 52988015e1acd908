use geo::Intersects;

use crate::precinct::PrecinctGeometry;

use super::{require_finite, PredicateError};

/// True if the filled regions of `a` and `b` share at least one point.
/// Shared edges and single shared vertices both count, and any areal part of `a`
/// touching any areal part of `b` is enough.
pub(super) fn intersects(a: &PrecinctGeometry, b: &PrecinctGeometry) -> Result<bool, PredicateError> {
    require_areal(a)?;
    require_areal(b)?;

    if !a.bbox().intersects(b.bbox()) {
        return Ok(false);
    }
    Ok(a.shape().intersects(b.shape()))
}

/// Every vertex must be finite and at least one ring must span an area.
/// Degenerate parts next to an areal one are skipped (see [`PrecinctGeometry::shape`]).
fn require_areal(precinct: &PrecinctGeometry) -> Result<(), PredicateError> {
    require_finite(precinct)?;

    if !precinct.shape().0.is_empty() {
        return Ok(());
    }
    // No areal part: every ring is degenerate, report the first.
    Err(PredicateError::DegenerateRing {
        id: precinct.id().clone(),
        ring: 0,
        vertices: precinct.rings().first().map_or(0, |ring| ring.0.len()),
    })
}
