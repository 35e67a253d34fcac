// Per-turn orchestration
//
// Agents are planned one after another. Later agents see the targets earlier
// agents committed to, which is what keeps two snakes from chasing the same
// food; running agents in parallel would break that.
//
// Each agent walks a fallback ladder until a tier yields a path of at least
// two cells:
// 1. goal-seek: multi-goal A* over nearby food, best value/distance ratio
// 2. rich-region: head toward the richest food cluster not yet taken
// 3. center: drift toward the world center when far out
// 4. random: short random hop

use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use std::time::{Duration, Instant};

use crate::config::{Config, TimingConfig};
use crate::error::TurnError;
use crate::geometry::{Vec3, Vec3f};
use crate::obstacles::ObstacleIndex;
use crate::pathfinding::{
    find_path, find_paths_multi, MultiGoalRequest, SearchOutcome, SearchRequest, SearchWeights,
};
use crate::scoring::{rank_rich_regions, select_best_goal, take_rich_region, RichRegion};
use crate::targets::TargetRegistry;
use crate::types::{Decision, DecisionTier, FoodItem, Snake, TurnReport, WorldSnapshot};

/// Converts a millisecond budget into a `Duration`, refusing negative values
pub fn budget_from_millis(ms: i64) -> Result<Duration, TurnError> {
    if ms < 0 {
        return Err(TurnError::NegativeBudget(ms));
    }
    Ok(Duration::from_millis(ms as u64))
}

/// Planning budget from the arena's remaining tick time
///
/// Negative tick times are rejected; anything under the network overhead
/// clamps to zero.
pub fn turn_budget(timing: &TimingConfig, tick_remain_ms: i64) -> Result<Duration, TurnError> {
    let remain = budget_from_millis(tick_remain_ms)?;
    let effective = timing.effective_budget_ms(remain.as_millis() as u64);
    Ok(Duration::from_millis(effective))
}

/// Derived, read-only view of one turn plus the rich-region cache
struct TurnContext<'a> {
    snapshot: &'a WorldSnapshot,
    obstacles: ObstacleIndex,
    foods: Vec<FoodItem>,
    /// `None` until the first agent needs it, then consumed agent by agent
    rich_regions: Option<Vec<RichRegion>>,
}

/// Owns the state that survives between turns
pub struct TurnPlanner {
    config: Config,
    weights: SearchWeights,
    registry: TargetRegistry,
    rng: StdRng,
}

impl TurnPlanner {
    pub fn new(config: &Config) -> Self {
        let rng = match config.policy.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        TurnPlanner {
            weights: SearchWeights::from_config(&config.search),
            config: config.clone(),
            registry: TargetRegistry::new(),
            rng,
        }
    }

    pub fn registry(&self) -> &TargetRegistry {
        &self.registry
    }

    pub fn ban_target(&mut self, target: Vec3) -> bool {
        info!("Banning target {}", target);
        self.registry.ban(target)
    }

    /// Replaces the banned set wholesale with an operator-owned list
    pub fn set_banned<I: IntoIterator<Item = Vec3>>(&mut self, banned: I) {
        self.registry.replace_banned(banned);
    }

    /// Planning budget for a snapshot: remaining tick time minus network overhead
    pub fn budget_for(&self, snapshot: &WorldSnapshot) -> Result<Duration, TurnError> {
        turn_budget(&self.config.timing, snapshot.tick_remain_ms)
    }

    /// Plans one move per live agent within `budget`
    ///
    /// Agents that cannot be planned (no tier produced a path, malformed
    /// head, or the budget ran out before their turn) are listed in
    /// `skipped` and get no decision.
    pub fn plan_turn(&mut self, snapshot: &WorldSnapshot, budget: Duration) -> TurnReport {
        let started = Instant::now();
        let deadline = started + budget;

        let mut order: Vec<&Snake> = snapshot.live_snakes().collect();
        let foods = snapshot.food_items(&self.config.food);
        let food_positions: HashSet<Vec3> = foods.iter().map(|f| f.position).collect();
        self.registry
            .begin_turn(order.iter().map(|s| s.id.as_str()), &food_positions);

        let mut report = TurnReport {
            turn: snapshot.turn,
            decisions: Vec::new(),
            skipped: Vec::new(),
            budget_ms: budget.as_millis() as u64,
            elapsed_ms: 0,
            computed_at: String::new(),
        };

        if snapshot.map_size.is_degenerate() {
            warn!(
                "Turn {}: degenerate world bounds {}, skipping all agents",
                snapshot.turn, snapshot.map_size.0
            );
            report.skipped = order.iter().map(|s| s.id.clone()).collect();
            return Self::finish(report, started);
        }

        // Identity order first so the shuffle is reproducible under a fixed seed
        order.sort_by(|a, b| a.id.cmp(&b.id));
        order.shuffle(&mut self.rng);

        let mut turn = TurnContext {
            snapshot,
            obstacles: ObstacleIndex::from_snapshot(snapshot),
            foods,
            rich_regions: None,
        };

        for (index, snake) in order.iter().enumerate() {
            let now = Instant::now();
            let remaining = deadline.saturating_duration_since(now);
            if remaining.is_zero() {
                warn!(
                    "Turn {}: budget exhausted, {} agents left without a decision",
                    snapshot.turn,
                    order.len() - index
                );
                report
                    .skipped
                    .extend(order[index..].iter().map(|s| s.id.clone()));
                break;
            }

            let agents_left = (order.len() - index) as u32;
            let slice_deadline = now + remaining / agents_left;

            match self.plan_agent(&mut turn, snake, slice_deadline) {
                Some(decision) => {
                    debug!(
                        "Agent {}: {} toward {} via {} ({} cells)",
                        decision.agent_id,
                        decision.direction,
                        decision.target,
                        decision.tier,
                        decision.path.len()
                    );
                    report.decisions.push(decision);
                }
                None => {
                    debug!("Agent {}: every tier failed, holding", snake.id);
                    report.skipped.push(snake.id.clone());
                }
            }
        }

        let report = Self::finish(report, started);
        info!(
            "Turn {}: {} decisions, {} skipped ({}ms of {}ms)",
            report.turn,
            report.decisions.len(),
            report.skipped.len(),
            report.elapsed_ms,
            report.budget_ms
        );
        report
    }

    fn finish(mut report: TurnReport, started: Instant) -> TurnReport {
        report.elapsed_ms = started.elapsed().as_millis() as u64;
        report.computed_at = chrono::Utc::now().to_rfc3339();
        report
    }

    fn plan_agent(
        &mut self,
        turn: &mut TurnContext,
        snake: &Snake,
        slice_deadline: Instant,
    ) -> Option<Decision> {
        let head = snake.head()?;
        if !turn.snapshot.map_size.contains(head) {
            warn!("Agent {}: head {} is out of bounds", snake.id, head);
            return None;
        }

        if let Some(decision) = self.goal_seek(turn, snake, head, slice_deadline) {
            return Some(decision);
        }
        if let Some(decision) = self.rich_region(turn, snake, head, slice_deadline) {
            return Some(decision);
        }
        if let Some(decision) = self.center_seek(turn, snake, head, slice_deadline) {
            return Some(decision);
        }
        self.random_explore(turn, snake, head, slice_deadline)
    }

    fn goal_seek(
        &mut self,
        turn: &TurnContext,
        snake: &Snake,
        head: Vec3,
        slice_deadline: Instant,
    ) -> Option<Decision> {
        let ignore = self.registry.ignore_set_for(&snake.id);
        let radius = self.config.policy.goal_radius;

        // Sorted by position: ratio ties go to the lowest coordinate
        let mut candidates: Vec<FoodItem> = turn
            .foods
            .iter()
            .filter(|f| f.value > 0)
            .filter(|f| head.manhattan(f.position) <= radius)
            .filter(|f| !ignore.contains(&f.position))
            .copied()
            .collect();
        if candidates.is_empty() {
            debug!("Agent {}: no food candidates within {}", snake.id, radius);
            return None;
        }
        candidates.sort_by(|a, b| a.position.cmp(&b.position));

        let goals: Vec<Vec3> = candidates.iter().map(|f| f.position).collect();
        let result = find_paths_multi(&MultiGoalRequest {
            start: head,
            goals: &goals,
            bounds: turn.snapshot.map_size,
            obstacles: &turn.obstacles,
            ignore: &ignore,
            weights: &self.weights,
            friendly_mass: friendly_mass(turn.snapshot, &snake.id),
            timeout: slice_deadline.saturating_duration_since(Instant::now()),
            max_frontier: self.config.search.max_frontier,
            sort_neighbors: self.config.search.sort_neighbors_toward_center,
        });

        let food = select_best_goal(&candidates, &result.distances);
        debug!(
            "Agent {}: multi-goal search {:?}, {}/{} goals discovered, picked {:?}",
            snake.id,
            result.status,
            result.discovered.len(),
            goals.len(),
            food.map(|f| f.position)
        );
        let food = food?;

        let path = result.path_to(food.position)?;
        let decision = Decision::from_path(&snake.id, path, DecisionTier::GoalSeek)?;
        self.registry.claim(&snake.id, food.position);
        Some(decision)
    }

    fn rich_region(
        &mut self,
        turn: &mut TurnContext,
        snake: &Snake,
        head: Vec3,
        slice_deadline: Instant,
    ) -> Option<Decision> {
        let policy = &self.config.policy;
        let regions = match turn.rich_regions.take() {
            Some(regions) => regions,
            None => {
                let open: Vec<FoodItem> = turn
                    .foods
                    .iter()
                    .filter(|f| !self.registry.is_banned(f.position))
                    .copied()
                    .collect();
                rank_rich_regions(&open, policy.rich_region_radius)
            }
        };
        // Regions sitting on food another agent claimed or is chasing leave the cache
        let ignore = self.registry.ignore_set_for(&snake.id);
        let open: Vec<RichRegion> = regions
            .into_iter()
            .filter(|r| !ignore.contains(&r.position))
            .collect();
        let (top, rest) = take_rich_region(open, policy.rich_region_min_separation);
        turn.rich_regions = Some(rest);

        let region = top?;
        let target = if head.manhattan(region.position) > policy.rich_region_reach {
            self.waypoint(turn, head, region.position, policy.rich_region_reach as f64)
        } else {
            region.position
        };
        debug!(
            "Agent {}: rich region {} (value {}), routing to {}",
            snake.id, region.position, region.surrounding_value, target
        );

        self.route(turn, snake, head, target, DecisionTier::RichRegion, slice_deadline)
    }

    fn center_seek(
        &self,
        turn: &TurnContext,
        snake: &Snake,
        head: Vec3,
        slice_deadline: Instant,
    ) -> Option<Decision> {
        let bounds = turn.snapshot.map_size;
        let center = bounds.center();
        let distance = head.distance(center);
        if distance <= self.config.policy.center_threshold_fraction * bounds.diagonal() {
            return None;
        }

        let step = self.config.policy.center_step.min(distance);
        let target = self.waypoint(turn, head, center, step);
        debug!("Agent {}: {:.1} from center, routing to {}", snake.id, distance, target);

        self.route(turn, snake, head, target, DecisionTier::Center, slice_deadline)
    }

    fn random_explore(
        &mut self,
        turn: &TurnContext,
        snake: &Snake,
        head: Vec3,
        slice_deadline: Instant,
    ) -> Option<Decision> {
        let r = self.config.policy.random_offset_radius.max(1);
        let bounds = turn.snapshot.map_size;
        let flat = bounds.0.z <= 1;

        let offset = Vec3::new(
            self.rng.random_range(-r..=r),
            self.rng.random_range(-r..=r),
            if flat { 0 } else { self.rng.random_range(-r..=r) },
        );
        let target = bounds.clamp(head + offset);
        debug!("Agent {}: random hop {} -> {}", snake.id, offset, target);

        self.route(turn, snake, head, target, DecisionTier::Random, slice_deadline)
    }

    /// Cell `step` units from `from` along the straight line toward `toward`
    fn waypoint(&self, turn: &TurnContext, from: Vec3, toward: Vec3, step: f64) -> Vec3 {
        let offset = ((toward - from).normalize() * step).round();
        turn.snapshot.map_size.clamp(from + offset)
    }

    /// Single-goal search from the head to a waypoint
    fn route(
        &self,
        turn: &TurnContext,
        snake: &Snake,
        head: Vec3,
        target: Vec3,
        tier: DecisionTier,
        slice_deadline: Instant,
    ) -> Option<Decision> {
        if target == head {
            return None;
        }
        // Waypoints are not food; ending a path inside an obstacle is never useful
        if turn.obstacles.contains(target) {
            debug!("Agent {}: {} waypoint {} is blocked", snake.id, tier, target);
            return None;
        }

        let outcome = find_path(&SearchRequest {
            start: head,
            goal: target,
            bounds: turn.snapshot.map_size,
            obstacles: &turn.obstacles,
            weights: &self.weights,
            timeout: slice_deadline.saturating_duration_since(Instant::now()),
            max_frontier: self.config.search.max_frontier,
            sort_neighbors: self.config.search.sort_neighbors_toward_center,
        });

        if !matches!(outcome, SearchOutcome::Found(_)) {
            debug!("Agent {}: {} search toward {}: {}", snake.id, tier, target, outcome.label());
        }

        Decision::from_path(&snake.id, outcome.into_path()?, tier)
    }
}

/// Rounded centroid of every other live agent's head
fn friendly_mass(snapshot: &WorldSnapshot, agent_id: &str) -> Option<Vec3> {
    let heads: Vec<Vec3> = snapshot
        .live_snakes()
        .filter(|s| s.id != agent_id)
        .filter_map(|s| s.head())
        .collect();
    if heads.is_empty() {
        return None;
    }

    let n = heads.len() as f64;
    let sum = heads.iter().fold(Vec3::ZERO, |acc, &h| acc + h);
    Some(
        Vec3f {
            x: sum.x as f64 / n,
            y: sum.y as f64 / n,
            z: sum.z as f64 / n,
        }
        .round(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Bounds;
    use crate::types::{Food, SnakeStatus, SpecialFood};

    fn snake(id: &str, body: &[Vec3]) -> Snake {
        Snake {
            id: id.to_string(),
            direction: Vec3::new(1, 0, 0),
            old_direction: Vec3::new(1, 0, 0),
            geometry: body.to_vec(),
            death_count: 0,
            status: SnakeStatus::Alive,
            revive_remain_ms: None,
        }
    }

    fn world(bounds: Bounds, snakes: Vec<Snake>, food: Vec<Food>) -> WorldSnapshot {
        WorldSnapshot {
            map_size: bounds,
            name: "unit".to_string(),
            points: 0,
            fences: vec![],
            snakes,
            enemies: vec![],
            food,
            special_food: SpecialFood::default(),
            turn: 7,
            revive_timeout_sec: 5,
            tick_remain_ms: 300,
            errors: vec![],
        }
    }

    fn seeded_config() -> Config {
        let mut config = Config::default_hardcoded();
        config.policy.rng_seed = Some(7);
        config
    }

    #[test]
    fn test_budget_from_millis_rejects_negative() {
        assert_eq!(budget_from_millis(-1), Err(TurnError::NegativeBudget(-1)));
        assert_eq!(budget_from_millis(0), Ok(Duration::ZERO));
        assert_eq!(budget_from_millis(25), Ok(Duration::from_millis(25)));
    }

    #[test]
    fn test_budget_for_subtracts_overhead() {
        let planner = TurnPlanner::new(&seeded_config());
        let mut snapshot = world(Bounds::new(5, 5, 1), vec![], vec![]);
        snapshot.tick_remain_ms = 120;
        assert_eq!(planner.budget_for(&snapshot), Ok(Duration::from_millis(100)));
        snapshot.tick_remain_ms = -5;
        assert_eq!(planner.budget_for(&snapshot), Err(TurnError::NegativeBudget(-5)));
    }

    #[test]
    fn test_friendly_mass_excludes_self() {
        let snapshot = world(
            Bounds::new(10, 10, 1),
            vec![
                snake("a", &[Vec3::new(0, 0, 0)]),
                snake("b", &[Vec3::new(2, 0, 0)]),
                snake("c", &[Vec3::new(4, 2, 0)]),
            ],
            vec![],
        );
        assert_eq!(friendly_mass(&snapshot, "a"), Some(Vec3::new(3, 1, 0)));
        let lonely = world(Bounds::new(10, 10, 1), vec![snake("a", &[Vec3::new(0, 0, 0)])], vec![]);
        assert_eq!(friendly_mass(&lonely, "a"), None);
    }

    #[test]
    fn test_goal_seek_commits_and_claims() {
        let food = Food { position: Vec3::new(3, 0, 0), points: 5 };
        let snapshot = world(
            Bounds::new(10, 10, 1),
            vec![snake("a", &[Vec3::new(0, 0, 0)])],
            vec![food],
        );
        let mut planner = TurnPlanner::new(&seeded_config());
        let report = planner.plan_turn(&snapshot, Duration::from_secs(2));

        let decision = report.decision_for("a").expect("agent a should move");
        assert_eq!(decision.tier, DecisionTier::GoalSeek);
        assert_eq!(decision.direction, Vec3::new(1, 0, 0));
        assert_eq!(decision.target, food.position);
        assert_eq!(planner.registry().last_target("a"), Some(food.position));
    }

    #[test]
    fn test_zero_budget_yields_no_decisions() {
        let snapshot = world(
            Bounds::new(10, 10, 1),
            vec![snake("a", &[Vec3::new(0, 0, 0)]), snake("b", &[Vec3::new(9, 9, 0)])],
            vec![Food { position: Vec3::new(3, 0, 0), points: 5 }],
        );
        let mut planner = TurnPlanner::new(&seeded_config());
        let report = planner.plan_turn(&snapshot, Duration::ZERO);
        assert!(report.decisions.is_empty());
        assert_eq!(report.skipped.len(), 2);
    }

    #[test]
    fn test_center_tier_when_no_food() {
        let snapshot = world(
            Bounds::new(30, 30, 1),
            vec![snake("a", &[Vec3::new(0, 0, 0)])],
            vec![],
        );
        let mut planner = TurnPlanner::new(&seeded_config());
        let report = planner.plan_turn(&snapshot, Duration::from_secs(2));
        let decision = report.decision_for("a").expect("far agent should seek center");
        assert_eq!(decision.tier, DecisionTier::Center);
        assert!(decision.direction.is_unit_step());
    }

    #[test]
    fn test_random_tier_near_center() {
        let snapshot = world(
            Bounds::new(9, 9, 9),
            vec![snake("a", &[Vec3::new(4, 4, 4)])],
            vec![],
        );
        let mut config = seeded_config();
        config.policy.random_offset_radius = 2;
        let mut planner = TurnPlanner::new(&config);

        // A random hop can land back on the head; a few turns make a move certain enough
        let decision = (0..20)
            .find_map(|_| planner.plan_turn(&snapshot, Duration::from_secs(1)).decisions.pop())
            .expect("random exploration should eventually move");
        assert_eq!(decision.tier, DecisionTier::Random);
        assert!(decision.direction.is_unit_step());
    }

    #[test]
    fn test_degenerate_bounds_skip_everyone() {
        let snapshot = world(
            Bounds::new(10, 0, 1),
            vec![snake("a", &[Vec3::new(0, 0, 0)])],
            vec![],
        );
        let mut planner = TurnPlanner::new(&seeded_config());
        let report = planner.plan_turn(&snapshot, Duration::from_secs(1));
        assert!(report.decisions.is_empty());
        assert_eq!(report.skipped, vec!["a".to_string()]);
    }
}
