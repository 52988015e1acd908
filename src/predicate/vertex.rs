use geo::Rect;

use crate::precinct::PrecinctGeometry;

use super::{require_finite, PredicateError};

/// Bounding-box distance beyond which no vertex pair can be within `epsilon`.
/// Slightly above `sqrt(epsilon)` so rounding in `dx * dx` never defeats the prefilter.
#[inline]
pub(super) fn reach(epsilon: f64) -> f64 {
    epsilon.max(0.0).sqrt() * (1.0 + 4.0 * f64::EPSILON)
}

/// True if any vertex of `a` is within squared distance `epsilon` of any vertex of `b`.
/// `epsilon = 0` still matches exactly coincident vertices.
pub(super) fn within_epsilon(a: &PrecinctGeometry, b: &PrecinctGeometry, epsilon: f64) -> Result<bool, PredicateError> {
    require_finite(a)?;
    require_finite(b)?;

    if !boxes_within(a.bbox(), b.bbox(), reach(epsilon)) {
        return Ok(false);
    }

    Ok(a.vertices().any(|p| b.vertices().any(|q| {
        let dx = p.x - q.x;
        let dy = p.y - q.y;
        dx * dx + dy * dy <= epsilon
    })))
}

/// True if the two rectangles are no more than `pad` apart along each axis.
#[inline]
fn boxes_within(a: &Rect<f64>, b: &Rect<f64>, pad: f64) -> bool {
    a.min().x - pad <= b.max().x && b.min().x - pad <= a.max().x
        && a.min().y - pad <= b.max().y && b.min().y - pad <= a.max().y
}
