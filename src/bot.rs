// Service-facing bot
//
// Owns the turn planner behind a single lock: one turn at a time. Only the
// blocking planning task takes that lock. Budgets are computed from a copy of
// the timing config, and operator bans live in their own set that is handed to
// the planner at the start of each turn, so request threads never wait on a
// running turn.

use log::{error, info};
use parking_lot::{Mutex, RwLock};
use serde_json::{json, Value};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::{Config, TimingConfig};
use crate::error::TurnError;
use crate::geometry::Vec3;
use crate::orchestrator::{turn_budget, TurnPlanner};
use crate::types::{TurnReport, WorldSnapshot};

pub struct Bot {
    timing: TimingConfig,
    planner: Arc<Mutex<TurnPlanner>>,
    /// Operator bans; copied into the planner when a turn starts
    banned: RwLock<BTreeSet<Vec3>>,
    /// Most recent turn, kept for diagnostics only
    last_report: RwLock<Option<TurnReport>>,
}

impl Bot {
    /// Creates a new Bot instance with the given configuration
    ///
    /// # Arguments
    /// * `config` - Static configuration that does not change during the bot's lifetime
    pub fn new(config: Config) -> Self {
        Bot {
            timing: config.timing.clone(),
            planner: Arc::new(Mutex::new(TurnPlanner::new(&config))),
            banned: RwLock::new(BTreeSet::new()),
            last_report: RwLock::new(None),
        }
    }

    /// Returns bot metadata
    /// Corresponds to GET / endpoint
    pub fn info(&self) -> Value {
        info!("INFO");

        json!({
            "apiversion": "1",
            "author": "ksiopiolosz-aterlo",
            "kind": "voxel-snake",
            "tiers": ["goal-seek", "rich-region", "center", "random"],
        })
    }

    /// Plans one turn for every live snake in the snapshot
    /// Corresponds to POST /turn endpoint
    ///
    /// # Returns
    /// * `Ok(TurnReport)` - decisions for the agents that could be planned
    /// * `Err(TurnError)` - the snapshot carried a negative time budget, or
    ///   the planning task died
    pub async fn plan(&self, snapshot: WorldSnapshot) -> Result<TurnReport, TurnError> {
        let received = Instant::now();
        let turn = snapshot.turn;

        let budget = self.budget_for(&snapshot).map_err(|e| {
            error!("Turn {}: rejecting snapshot: {}", turn, e);
            e
        })?;
        info!("Turn {}: planning with {}ms budget", turn, budget.as_millis());

        let banned = self.banned();
        let planner = self.planner.clone();
        let report = tokio::task::spawn_blocking(move || {
            let mut planner = planner.lock();
            planner.set_banned(banned);
            // The budget clock started when the request arrived
            let remaining = budget.saturating_sub(received.elapsed());
            planner.plan_turn(&snapshot, remaining)
        })
        .await
        .map_err(|e| {
            error!("Turn {}: planner task failed: {}", turn, e);
            TurnError::PlannerUnavailable(e.to_string())
        })?;

        *self.last_report.write() = Some(report.clone());
        Ok(report)
    }

    /// Planning budget for a snapshot, without touching the planner
    pub fn budget_for(&self, snapshot: &WorldSnapshot) -> Result<Duration, TurnError> {
        turn_budget(&self.timing, snapshot.tick_remain_ms)
    }

    /// Vetoes a target for every agent until cleared, starting with the next turn
    /// Returns false if it was already banned
    pub fn ban_target(&self, target: Vec3) -> bool {
        info!("Banning target {}", target);
        self.banned.write().insert(target)
    }

    pub fn clear_banned(&self) {
        let mut banned = self.banned.write();
        info!("Clearing {} banned targets", banned.len());
        banned.clear();
    }

    /// Banned targets in coordinate order
    pub fn banned(&self) -> Vec<Vec3> {
        self.banned.read().iter().copied().collect()
    }

    pub fn last_report(&self) -> Option<TurnReport> {
        self.last_report.read().clone()
    }
}
