mod intersection;
mod vertex;

use std::fmt;

use thiserror::Error;

use crate::precinct::{PrecinctGeometry, PrecinctId};

/// Default squared-distance threshold for the vertex-proximity strategy,
/// in source coordinate units.
pub const DEFAULT_EPSILON: f64 = 1e-2;

/// A geometric test failed on one precinct of a pair.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredicateError {
    #[error("precinct {id} has a non-finite coordinate")]
    NonFiniteCoordinate { id: PrecinctId },
    #[error("precinct {id}: ring {ring} has {vertices} vertices, an area needs at least 3")]
    DegenerateRing { id: PrecinctId, ring: usize, vertices: usize },
}

/// The binary "adjacent or not" test driving the scan, matched directly in the inner loop.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Closeness {
    /// Some vertex of A lies within squared distance `epsilon` of some vertex of B.
    VertexProximity { epsilon: f64 },
    /// The filled regions intersect, boundary-only contact included.
    Intersection,
}

impl Default for Closeness {
    fn default() -> Self {
        Self::VertexProximity { epsilon: DEFAULT_EPSILON }
    }
}

impl Closeness {
    /// Evaluate the predicate on a pair. Pure and symmetric in `a` and `b`.
    pub fn try_is_adjacent(&self, a: &PrecinctGeometry, b: &PrecinctGeometry) -> Result<bool, PredicateError> {
        match *self {
            Self::VertexProximity { epsilon } => vertex::within_epsilon(a, b, epsilon),
            Self::Intersection => intersection::intersects(a, b),
        }
    }

    /// Fail-open form of [`Closeness::try_is_adjacent`]: an evaluation error counts as
    /// "not adjacent".
    #[inline]
    pub fn is_adjacent(&self, a: &PrecinctGeometry, b: &PrecinctGeometry) -> bool {
        self.try_is_adjacent(a, b).unwrap_or(false)
    }

    /// How far apart two bounding boxes may be and still hold an adjacent pair.
    /// Used to pad envelopes for candidate pruning.
    pub fn reach(&self) -> f64 {
        match *self {
            Self::VertexProximity { epsilon } => vertex::reach(epsilon),
            Self::Intersection => 0.0,
        }
    }
}

impl fmt::Display for Closeness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::VertexProximity { epsilon } => write!(f, "vertex-proximity(epsilon={epsilon})"),
            Self::Intersection => f.write_str("intersection"),
        }
    }
}

fn require_finite(precinct: &PrecinctGeometry) -> Result<(), PredicateError> {
    if precinct.is_finite() {
        Ok(())
    } else {
        Err(PredicateError::NonFiniteCoordinate { id: precinct.id().clone() })
    }
}
