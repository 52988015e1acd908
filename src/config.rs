use std::{fs, path::{Path, PathBuf}, time::Duration};

use serde::{de, Deserialize, Deserializer};
use thiserror::Error;

use crate::graph::{AdjacencyBuilder, Candidates};
use crate::predicate::{Closeness, DEFAULT_EPSILON};

/// Identifier property read from each feature unless configured otherwise.
pub const DEFAULT_ID_FIELD: &str = "GEOID10";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Io { path: PathBuf, #[source] source: std::io::Error },
    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("epsilon must be a finite, non-negative number (got {0})")]
    InvalidEpsilon(f64),
    #[error("worker_count must be at least 1")]
    ZeroWorkers,
    #[error("missing {0}")]
    MissingPath(&'static str),
}

/// Which closeness predicate to scan with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    #[default]
    VertexProximity,
    Intersection,
}

/// Options for one adjacency build, as read from a TOML file.
///
/// ```toml
/// strategy = "intersection"
/// input_path = "data/precincts.geojson"
/// output_path = "data/adjacency.json"
/// worker_count = 8
/// cancellation_timeout = 3600.0   # seconds
/// ```
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    pub strategy: Strategy,
    /// Squared-distance threshold, used only by the vertex-proximity strategy.
    pub epsilon: f64,
    /// `None` uses the available hardware parallelism.
    pub worker_count: Option<usize>,
    pub input_path: Option<PathBuf>,
    pub output_path: Option<PathBuf>,
    #[serde(deserialize_with = "seconds")]
    pub cancellation_timeout: Option<Duration>,
    pub id_field: String,
    pub candidates: Candidates,
    pub max_predicate_failures: Option<usize>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::default(),
            epsilon: DEFAULT_EPSILON,
            worker_count: None,
            input_path: None,
            output_path: None,
            cancellation_timeout: None,
            id_field: DEFAULT_ID_FIELD.to_string(),
            candidates: Candidates::default(),
            max_predicate_failures: None,
        }
    }
}

/// Optional duration written as (fractional) seconds.
fn seconds<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Duration>, D::Error> {
    Option::<f64>::deserialize(deserializer)?
        .map(|secs| Duration::try_from_secs_f64(secs).map_err(de::Error::custom))
        .transpose()
}

impl BuildConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        Self::from_toml_str(&text)
    }

    /// Check option values. Paths are checked separately by [`BuildConfig::paths`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.epsilon.is_finite() || self.epsilon < 0.0 {
            return Err(ConfigError::InvalidEpsilon(self.epsilon));
        }
        if self.worker_count == Some(0) {
            return Err(ConfigError::ZeroWorkers);
        }
        Ok(())
    }

    /// The input and output paths, both required for a full run.
    pub fn paths(&self) -> Result<(&Path, &Path), ConfigError> {
        let input = self.input_path.as_deref().ok_or(ConfigError::MissingPath("input_path"))?;
        let output = self.output_path.as_deref().ok_or(ConfigError::MissingPath("output_path"))?;
        Ok((input, output))
    }

    pub fn closeness(&self) -> Closeness {
        match self.strategy {
            Strategy::VertexProximity => Closeness::VertexProximity { epsilon: self.epsilon },
            Strategy::Intersection => Closeness::Intersection,
        }
    }

    pub fn builder(&self) -> AdjacencyBuilder {
        AdjacencyBuilder::new(self.closeness())
            .workers(self.worker_count.unwrap_or(0))
            .timeout(self.cancellation_timeout)
            .candidates(self.candidates)
            .max_predicate_failures(self.max_predicate_failures)
    }
}
