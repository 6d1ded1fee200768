//! Search configuration.
//!
//! Every field has a default, so a TOML document only needs to name what it changes:
//!
//! ```toml
//! algorithm = "jps_plus"
//! heuristic = "manhattan"
//! goal_bounding_strength = 0.5
//! ```
use core::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PathfindingError, Result};
use crate::heuristic::HeuristicKind;
use crate::search::SearchPolicy;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Algorithm {
    #[default]
    #[serde(rename = "astar")]
    AStar,
    #[serde(rename = "hpa")]
    Hpa,
    #[serde(rename = "jps_plus")]
    JpsPlus,
}

impl Algorithm {
    pub const ALL: [Algorithm; 3] = [Algorithm::AStar, Algorithm::Hpa, Algorithm::JpsPlus];

    pub fn name(self) -> &'static str {
        match self {
            Algorithm::AStar => "astar",
            Algorithm::Hpa => "hpa",
            Algorithm::JpsPlus => "jps_plus",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchConfig {
    pub algorithm: Algorithm,
    pub heuristic: HeuristicKind,
    /// Strength of the goal-bounding bias; 0 disables it.
    pub goal_bounding_strength: f64,
    /// Reopen visited nodes when a cheaper path to them turns up.
    pub cost_overwrite: bool,
    /// Factor a new cost has to beat the stored one by before it overwrites it; at least 1.
    pub error_margin: f64,
    /// Side length of the chunks used by HPA*.
    pub chunk_size: usize,
    /// Finish runs between disconnected cells immediately instead of searching.
    pub skip_unreachable: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            algorithm: Algorithm::AStar,
            heuristic: HeuristicKind::Euclidean,
            goal_bounding_strength: 0.0,
            cost_overwrite: true,
            error_margin: 1.0,
            chunk_size: 8,
            skip_unreachable: false,
        }
    }
}

impl SearchConfig {
    pub fn with_algorithm(algorithm: Algorithm) -> SearchConfig {
        SearchConfig {
            algorithm,
            ..SearchConfig::default()
        }
    }

    pub fn from_toml_str(source: &str) -> Result<SearchConfig> {
        let config: SearchConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<SearchConfig> {
        let source = std::fs::read_to_string(path)?;
        SearchConfig::from_toml_str(&source)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.goal_bounding_strength.is_finite() || self.goal_bounding_strength < 0.0 {
            return Err(PathfindingError::InvalidConfig(format!(
                "goal bounding strength must be a finite value >= 0, got {}",
                self.goal_bounding_strength
            )));
        }
        if !self.error_margin.is_finite() || self.error_margin < 1.0 {
            return Err(PathfindingError::InvalidConfig(format!(
                "error margin must be a finite value >= 1, got {}",
                self.error_margin
            )));
        }
        if self.chunk_size == 0 {
            return Err(PathfindingError::InvalidChunkSize(self.chunk_size));
        }
        Ok(())
    }

    pub fn policy(&self) -> SearchPolicy {
        SearchPolicy::new(self.cost_overwrite, self.error_margin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = SearchConfig::default();
        assert_eq!(config.algorithm, Algorithm::AStar);
        assert_eq!(config.heuristic, HeuristicKind::Euclidean);
        assert_eq!(config.chunk_size, 8);
        assert!(config.validate().is_ok());
        assert_eq!(config.policy(), SearchPolicy::default());
        assert_eq!(SearchConfig::from_toml_str("").unwrap(), config);
    }

    #[test]
    fn parses_partial_toml() {
        let config = SearchConfig::from_toml_str(
            r#"
            algorithm = "jps_plus"
            heuristic = "manhattan"
            goal_bounding_strength = 0.25
            cost_overwrite = false
            "#,
        )
        .unwrap();
        assert_eq!(config.algorithm, Algorithm::JpsPlus);
        assert_eq!(config.heuristic, HeuristicKind::Manhattan);
        assert_eq!(config.goal_bounding_strength, 0.25);
        assert!(!config.cost_overwrite);
        assert_eq!(config.error_margin, 1.0);
    }

    #[test]
    fn rejects_out_of_range_values() {
        assert!(matches!(
            SearchConfig::from_toml_str("error_margin = 0.5"),
            Err(PathfindingError::InvalidConfig(_))
        ));
        assert!(matches!(
            SearchConfig::from_toml_str("goal_bounding_strength = -1.0"),
            Err(PathfindingError::InvalidConfig(_))
        ));
        assert!(matches!(
            SearchConfig::from_toml_str("chunk_size = 0"),
            Err(PathfindingError::InvalidChunkSize(0))
        ));
        assert!(matches!(
            SearchConfig::from_toml_str("algorithm = \"dijkstra\""),
            Err(PathfindingError::Toml(_))
        ));
        assert!(matches!(
            SearchConfig::from_toml_str("chunk = 4"),
            Err(PathfindingError::Toml(_))
        ));
    }

    #[test]
    fn algorithm_names_match_serde() {
        for algorithm in Algorithm::ALL {
            let source = format!("algorithm = \"{algorithm}\"");
            assert_eq!(
                SearchConfig::from_toml_str(&source).unwrap().algorithm,
                algorithm
            );
        }
    }
}
