// World snapshot and decision types
// Mirrors the arena's JSON world payload; see the `world` endpoint of the contest API

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashSet;

use crate::config::FoodConfig;
use crate::geometry::{Bounds, Vec3};

/// Liveness as reported by the arena
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SnakeStatus {
    Alive,
    Dead,
}

/// One of our own snakes
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Snake {
    pub id: String,
    pub direction: Vec3,
    pub old_direction: Vec3,
    /// Body cells, head first
    pub geometry: Vec<Vec3>,
    pub death_count: u32,
    pub status: SnakeStatus,
    #[serde(default)]
    pub revive_remain_ms: Option<i64>,
}

impl Snake {
    pub fn head(&self) -> Option<Vec3> {
        self.geometry.first().copied()
    }

    /// Alive and occupying at least one cell
    pub fn is_live(&self) -> bool {
        self.status == SnakeStatus::Alive && !self.geometry.is_empty()
    }
}

/// An opposing snake; only its body is visible
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct EnemySnake {
    pub geometry: Vec<Vec3>,
    pub status: SnakeStatus,
    #[serde(default)]
    pub kills: u32,
}

/// Food entry as sent on the wire
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Food {
    #[serde(rename = "c")]
    pub position: Vec3,
    pub points: i32,
}

/// Positions of special food, listed separately from the regular food
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct SpecialFood {
    #[serde(default)]
    pub golden: Vec<Vec3>,
    #[serde(default)]
    pub suspicious: Vec<Vec3>,
}

/// Complete world state received once per turn
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct WorldSnapshot {
    pub map_size: Bounds,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub points: i64,
    #[serde(default)]
    pub fences: Vec<Vec3>,
    #[serde(default)]
    pub snakes: Vec<Snake>,
    #[serde(default)]
    pub enemies: Vec<EnemySnake>,
    #[serde(default)]
    pub food: Vec<Food>,
    #[serde(default)]
    pub special_food: SpecialFood,
    pub turn: i64,
    #[serde(default)]
    pub revive_timeout_sec: i64,
    pub tick_remain_ms: i64,
    #[serde(default)]
    pub errors: Vec<Value>,
}

/// Food category after merging the regular and special lists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FoodKind {
    Normal,
    Golden,
    Suspicious,
}

/// A goal candidate: a cell and what it is worth
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FoodItem {
    pub position: Vec3,
    pub value: i32,
    pub kind: FoodKind,
}

impl WorldSnapshot {
    pub fn live_snakes(&self) -> impl Iterator<Item = &Snake> {
        self.snakes.iter().filter(|s| s.is_live())
    }

    /// Merges regular, golden and suspicious food into one list
    ///
    /// A regular food cell that is also flagged suspicious takes the
    /// configured suspicious value. Golden cells take whichever is larger of
    /// their listed points and the configured golden value; golden cells that
    /// are missing from the regular list are appended.
    pub fn food_items(&self, food_config: &FoodConfig) -> Vec<FoodItem> {
        let golden: HashSet<Vec3> = self.special_food.golden.iter().copied().collect();
        let suspicious: HashSet<Vec3> = self.special_food.suspicious.iter().copied().collect();

        let mut items: Vec<FoodItem> = self
            .food
            .iter()
            .map(|f| {
                if suspicious.contains(&f.position) {
                    FoodItem {
                        position: f.position,
                        value: food_config.suspicious_value,
                        kind: FoodKind::Suspicious,
                    }
                } else if golden.contains(&f.position) {
                    FoodItem {
                        position: f.position,
                        value: f.points.max(food_config.golden_value),
                        kind: FoodKind::Golden,
                    }
                } else {
                    FoodItem {
                        position: f.position,
                        value: f.points,
                        kind: FoodKind::Normal,
                    }
                }
            })
            .collect();

        let listed: HashSet<Vec3> = items.iter().map(|item| item.position).collect();
        for &position in &self.special_food.golden {
            if !listed.contains(&position) && !suspicious.contains(&position) {
                items.push(FoodItem {
                    position,
                    value: food_config.golden_value,
                    kind: FoodKind::Golden,
                });
            }
        }
        for &position in &self.special_food.suspicious {
            if !listed.contains(&position) {
                items.push(FoodItem {
                    position,
                    value: food_config.suspicious_value,
                    kind: FoodKind::Suspicious,
                });
            }
        }

        items
    }
}

/// Which fallback tier produced a decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DecisionTier {
    #[serde(rename = "goal-seek")]
    GoalSeek,
    #[serde(rename = "rich-region")]
    RichRegion,
    #[serde(rename = "center")]
    Center,
    #[serde(rename = "random")]
    Random,
}

impl DecisionTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionTier::GoalSeek => "goal-seek",
            DecisionTier::RichRegion => "rich-region",
            DecisionTier::Center => "center",
            DecisionTier::Random => "random",
        }
    }
}

impl std::fmt::Display for DecisionTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// The move chosen for one agent this turn
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decision {
    pub agent_id: String,
    /// Unit step: `path[1] - path[0]`
    pub direction: Vec3,
    /// Full diagnostic path, head first
    pub path: Vec<Vec3>,
    pub tier: DecisionTier,
    /// Goal cell the path was planned toward
    pub target: Vec3,
}

impl Decision {
    /// Builds a decision from a path of at least two cells
    pub fn from_path(agent_id: &str, path: Vec<Vec3>, tier: DecisionTier) -> Option<Self> {
        if path.len() < 2 {
            return None;
        }
        let direction = path[1] - path[0];
        let target = *path.last()?;
        Some(Decision {
            agent_id: agent_id.to_string(),
            direction,
            path,
            tier,
            target,
        })
    }
}

/// Everything the planner produced for one turn
#[derive(Debug, Clone, Serialize)]
pub struct TurnReport {
    pub turn: i64,
    pub decisions: Vec<Decision>,
    /// Live agents that received no decision
    pub skipped: Vec<String>,
    pub budget_ms: u64,
    pub elapsed_ms: u64,
    pub computed_at: String,
}

impl TurnReport {
    /// Command body in the arena's format: one direction per decided snake
    pub fn command_payload(&self) -> Value {
        let snakes: Vec<Value> = self
            .decisions
            .iter()
            .map(|d| json!({ "id": d.agent_id, "direction": d.direction }))
            .collect();

        json!({ "snakes": snakes })
    }

    pub fn decision_for(&self, agent_id: &str) -> Option<&Decision> {
        self.decisions.iter().find(|d| d.agent_id == agent_id)
    }
}
