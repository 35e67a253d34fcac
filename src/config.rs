// Configuration module for reading Snake.toml
// All tunable constants for the search and the per-turn policy live here

use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Main configuration structure containing all tunable parameters
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub timing: TimingConfig,
    pub search: SearchConfig,
    pub policy: PolicyConfig,
    pub food: FoodConfig,
}

/// Turn budget constants
#[derive(Debug, Deserialize, Clone)]
pub struct TimingConfig {
    /// Reserved for the command round-trip, subtracted from the arena's remaining tick time
    pub network_overhead_ms: u64,
    /// Upper bound on the planning budget regardless of what the arena reports
    pub max_turn_budget_ms: u64,
}

impl TimingConfig {
    /// Computes the planning budget from the arena's remaining tick time
    pub fn effective_budget_ms(&self, tick_remain_ms: u64) -> u64 {
        tick_remain_ms
            .saturating_sub(self.network_overhead_ms)
            .min(self.max_turn_budget_ms)
    }
}

/// Edge cost weights and safety valves for the A* searches
#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    pub max_frontier: usize,
    pub centrality_weight: f64,
    pub centrality_cap: f64,
    pub danger_weight: f64,
    pub crowding_weight: f64,
    pub crowding_cap: f64,
    pub sort_neighbors_toward_center: bool,
}

/// Fallback ladder constants
#[derive(Debug, Deserialize, Clone)]
pub struct PolicyConfig {
    /// Manhattan radius around the head for goal-seek candidates
    pub goal_radius: i32,
    /// Manhattan radius used to sum surrounding food value
    pub rich_region_radius: i32,
    /// Rich regions closer than this to a consumed one are dropped
    pub rich_region_min_separation: i32,
    /// Beyond this Manhattan distance a waypoint toward the region is used instead
    pub rich_region_reach: i32,
    /// Center seeking kicks in beyond this fraction of the world diagonal
    pub center_threshold_fraction: f64,
    /// Length of the step toward the center
    pub center_step: f64,
    pub random_offset_radius: i32,
    /// Fixed seed for agent ordering and random exploration; OS entropy when absent
    #[serde(default)]
    pub rng_seed: Option<u64>,
}

/// Values assigned to special food
#[derive(Debug, Deserialize, Clone)]
pub struct FoodConfig {
    pub golden_value: i32,
    pub suspicious_value: i32,
}

impl Config {
    /// Loads configuration from a TOML file
    ///
    /// # Arguments
    /// * `path` - Path to the Snake.toml configuration file
    ///
    /// # Returns
    /// * `Result<Config, String>` - Parsed configuration or error message
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let contents = fs::read_to_string(path.as_ref())
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        toml::from_str(&contents).map_err(|e| format!("Failed to parse config file: {}", e))
    }

    /// Loads default configuration from Snake.toml in the project root
    pub fn load_default() -> Result<Self, String> {
        Self::from_file("Snake.toml")
    }

    /// Creates a configuration with hardcoded default values as fallback
    /// This should match the constants defined in Snake.toml
    pub fn default_hardcoded() -> Self {
        Config {
            timing: TimingConfig {
                network_overhead_ms: 20,
                max_turn_budget_ms: 400,
            },
            search: SearchConfig {
                max_frontier: 200_000,
                centrality_weight: 1.0,
                centrality_cap: 30.0,
                danger_weight: 1.0,
                crowding_weight: 1.0,
                crowding_cap: 10.0,
                sort_neighbors_toward_center: true,
            },
            policy: PolicyConfig {
                goal_radius: 100,
                rich_region_radius: 10,
                rich_region_min_separation: 15,
                rich_region_reach: 30,
                center_threshold_fraction: 0.3,
                center_step: 10.0,
                random_offset_radius: 3,
                rng_seed: None,
            },
            food: FoodConfig {
                golden_value: 10,
                suspicious_value: -1,
            },
        }
    }

    /// Attempts to load from file, falls back to hardcoded defaults on error
    pub fn load_or_default() -> Self {
        Self::load_default().unwrap_or_else(|e| {
            log::warn!("Could not load Snake.toml ({}), using hardcoded defaults", e);
            Self::default_hardcoded()
        })
    }
}
