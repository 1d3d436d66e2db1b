use crate::{
    error::{ConfigError, GridError},
    planner::{astar::PlanMode, PlannerKind},
};
use serde::Deserialize;

/// Boundary inputs of a simulation run. Every field has a default, so a TOML document only needs
/// to name the values it changes.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub width: usize,
    pub height: usize,
    pub obstacle_count: usize,
    pub max_steps: usize,
    /// Seed for obstacle placement, drawn from entropy when absent.
    pub seed: Option<u64>,
    pub planner: PlannerKind,
    pub mode: PlanMode,
    pub heuristic_factor: f32,
    /// Fail before the first step if the goal cannot be reached at all.
    pub require_reachable_goal: bool,
    /// Delay between rendered frames, only used by drivers.
    pub step_delay_ms: u64,
}

impl Default for SimulationConfig {
    fn default() -> SimulationConfig {
        SimulationConfig {
            width: 50,
            height: 30,
            obstacle_count: 150,
            max_steps: 150,
            seed: None,
            planner: PlannerKind::Astar,
            mode: PlanMode::Replan,
            heuristic_factor: 1.0,
            require_reachable_goal: false,
            step_delay_ms: 100,
        }
    }
}

impl SimulationConfig {
    pub fn from_toml_str(s: &str) -> Result<SimulationConfig, ConfigError> {
        let config: SimulationConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the preconditions of grid construction without building one.
    pub fn validate(&self) -> Result<(), GridError> {
        if self.width == 0 || self.height < 2 {
            return Err(GridError::InvalidConfiguration(format!(
                "grid must be at least 1x2, got {}x{}",
                self.width, self.height
            )));
        }
        let free_cells = self
            .width
            .checked_mul(self.height)
            .map(|cells| cells - 2)
            .ok_or_else(|| GridError::InvalidConfiguration("grid is too large".to_owned()))?;
        if self.obstacle_count > free_cells {
            return Err(GridError::InvalidConfiguration(format!(
                "{} obstacles do not fit in {} free cells",
                self.obstacle_count, free_cells
            )));
        }
        if !(self.heuristic_factor.is_finite() && self.heuristic_factor >= 0.0) {
            return Err(GridError::InvalidConfiguration(format!(
                "heuristic factor must be a non-negative number, got {}",
                self.heuristic_factor
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_gives_defaults() {
        let config = SimulationConfig::from_toml_str("").unwrap();
        assert_eq!(config, SimulationConfig::default());
    }

    #[test]
    fn partial_document_overrides_fields() {
        let config = SimulationConfig::from_toml_str(
            r#"
            width = 10
            height = 8
            obstacle_count = 12
            seed = 7
            planner = "greedy"
            mode = "cached"
            "#,
        )
        .unwrap();
        assert_eq!(config.width, 10);
        assert_eq!(config.height, 8);
        assert_eq!(config.obstacle_count, 12);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.planner, PlannerKind::Greedy);
        assert_eq!(config.mode, PlanMode::Cached);
        assert_eq!(config.max_steps, 150);
    }

    #[test]
    fn too_many_obstacles_rejected() {
        let err = SimulationConfig::from_toml_str("width = 3\nheight = 3\nobstacle_count = 8")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(GridError::InvalidConfiguration(_))));
    }

    #[test]
    fn bad_heuristic_factor_rejected() {
        for doc in ["heuristic_factor = -1.0", "heuristic_factor = nan", "heuristic_factor = inf"] {
            let err = SimulationConfig::from_toml_str(doc).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid(GridError::InvalidConfiguration(_))));
        }
        let config = SimulationConfig::from_toml_str("heuristic_factor = 0.0").unwrap();
        assert_eq!(config.heuristic_factor, 0.0);
    }

    #[test]
    fn malformed_document_rejected() {
        let err = SimulationConfig::from_toml_str("width = \"wide\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
