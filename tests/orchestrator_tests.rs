// Integration tests for per-turn planning across several agents
//
// Snapshots are written in the arena's JSON shape so the wire model is
// exercised along with the planner. Scenarios:
// 1. Two agents wanting the same food end up on different targets
// 2. Banned food is never picked
// 3. A target committed last turn stays reserved for its agent
// 4. Dead and empty agents are not planned
// 5. An agent boxed in by an enemy is skipped, not crashed
// 6. A fixed seed reproduces the same decisions
// 7. Agents with no food in range head for distinct rich regions, never for
//    food another agent already claimed

use serde_json::{json, Value};
use std::time::Duration;

use voxel_snake_bot::config::Config;
use voxel_snake_bot::geometry::Vec3;
use voxel_snake_bot::orchestrator::TurnPlanner;
use voxel_snake_bot::types::{DecisionTier, WorldSnapshot};

const BUDGET: Duration = Duration::from_secs(2);

fn seeded_planner(seed: u64) -> TurnPlanner {
    let mut config = Config::default_hardcoded();
    config.policy.rng_seed = Some(seed);
    TurnPlanner::new(&config)
}

/// Goal radius shrunk so every food is out of direct reach and agents fall
/// through to the rich-region tier
fn starved_planner(seed: u64, reach: i32) -> TurnPlanner {
    let mut config = Config::default_hardcoded();
    config.policy.rng_seed = Some(seed);
    config.policy.goal_radius = 2;
    config.policy.rich_region_reach = reach;
    TurnPlanner::new(&config)
}

fn snake(id: &str, body: &[[i32; 3]]) -> Value {
    json!({
        "id": id,
        "direction": [1, 0, 0],
        "oldDirection": [1, 0, 0],
        "geometry": body,
        "deathCount": 0,
        "status": "alive",
        "reviveRemainMs": 0,
    })
}

fn food(at: [i32; 3], points: i32) -> Value {
    json!({ "c": at, "points": points })
}

fn snapshot(map_size: [i32; 3], snakes: Vec<Value>, enemies: Vec<Value>, food: Vec<Value>) -> WorldSnapshot {
    serde_json::from_value(json!({
        "mapSize": map_size,
        "name": "integration",
        "points": 0,
        "fences": [],
        "snakes": snakes,
        "enemies": enemies,
        "food": food,
        "specialFood": { "golden": [], "suspicious": [] },
        "turn": 1,
        "reviveTimeoutSec": 5,
        "tickRemainMs": 300,
        "errors": [],
    }))
    .expect("test snapshot should deserialize")
}

#[test]
fn test_agents_do_not_share_a_target() {
    let world = snapshot(
        [7, 7, 1],
        vec![snake("a", &[[0, 0, 0]]), snake("b", &[[6, 0, 0]])],
        vec![],
        vec![food([3, 0, 0], 10), food([3, 4, 0], 1)],
    );

    let report = seeded_planner(1).plan_turn(&world, BUDGET);

    assert_eq!(report.decisions.len(), 2, "both agents should move: {:?}", report);
    let a = report.decision_for("a").unwrap();
    let b = report.decision_for("b").unwrap();
    assert_eq!(a.tier, DecisionTier::GoalSeek);
    assert_eq!(b.tier, DecisionTier::GoalSeek);
    assert_ne!(a.target, b.target);

    let mut targets = vec![a.target, b.target];
    targets.sort();
    assert_eq!(targets, vec![Vec3::new(3, 0, 0), Vec3::new(3, 4, 0)]);
}

#[test]
fn test_banned_food_is_never_selected() {
    let world = snapshot(
        [7, 7, 1],
        vec![snake("a", &[[0, 0, 0]])],
        vec![],
        vec![food([3, 0, 0], 10), food([0, 3, 0], 2)],
    );
    let mut planner = seeded_planner(2);
    assert!(planner.ban_target(Vec3::new(3, 0, 0)));

    let report = planner.plan_turn(&world, BUDGET);

    let a = report.decision_for("a").expect("the unbanned food is reachable");
    assert_eq!(a.tier, DecisionTier::GoalSeek);
    assert_eq!(a.target, Vec3::new(0, 3, 0));

    planner.set_banned(Vec::new());
    let report = planner.plan_turn(&world, BUDGET);
    assert_eq!(report.decision_for("a").unwrap().target, Vec3::new(3, 0, 0));
}

#[test]
fn test_committed_target_is_kept_across_turns() {
    let prize = Vec3::new(3, 0, 0);
    let foods = vec![food([3, 0, 0], 10), food([3, 4, 0], 1)];
    let mut planner = seeded_planner(3);

    let first = snapshot([7, 7, 1], vec![snake("a", &[[0, 0, 0]])], vec![], foods.clone());
    let report = planner.plan_turn(&first, BUDGET);
    assert_eq!(report.decision_for("a").unwrap().target, prize);
    assert_eq!(planner.registry().last_target("a"), Some(prize));

    // b shows up right next to the prize; it must leave it to a
    let second = snapshot(
        [7, 7, 1],
        vec![snake("a", &[[1, 0, 0]]), snake("b", &[[4, 0, 0]])],
        vec![],
        foods,
    );
    let report = planner.plan_turn(&second, BUDGET);

    assert_eq!(report.decision_for("a").unwrap().target, prize);
    let b = report.decision_for("b").expect("b still has the other food");
    assert_eq!(b.tier, DecisionTier::GoalSeek);
    assert_eq!(b.target, Vec3::new(3, 4, 0));
}

#[test]
fn test_dead_and_empty_agents_are_not_planned() {
    let mut dead = snake("dead", &[[5, 5, 0]]);
    dead["status"] = json!("dead");
    let empty = snake("empty", &[]);

    let world = snapshot(
        [7, 7, 1],
        vec![snake("a", &[[0, 0, 0]]), dead, empty],
        vec![],
        vec![food([3, 0, 0], 10)],
    );

    let report = seeded_planner(4).plan_turn(&world, BUDGET);

    assert_eq!(report.decisions.len(), 1);
    assert!(report.decision_for("a").is_some());
    assert!(report.skipped.is_empty());
}

#[test]
fn test_boxed_in_agent_is_skipped() {
    // One-cell-wide corridor with an enemy head sitting between us and the food
    let world = snapshot(
        [5, 1, 1],
        vec![snake("a", &[[0, 0, 0]])],
        vec![json!({ "geometry": [[2, 0, 0]], "status": "alive", "kills": 0 })],
        vec![food([4, 0, 0], 5)],
    );

    let report = seeded_planner(5).plan_turn(&world, BUDGET);

    assert!(report.decisions.is_empty());
    assert_eq!(report.skipped, vec!["a".to_string()]);
    assert_eq!(report.command_payload(), json!({ "snakes": [] }));
}

#[test]
fn test_fixed_seed_reproduces_decisions() {
    let world = snapshot(
        [12, 12, 6],
        vec![
            snake("a", &[[0, 0, 0], [0, 0, 1]]),
            snake("b", &[[11, 11, 5]]),
            snake("c", &[[6, 6, 3]]),
        ],
        vec![json!({ "geometry": [[6, 0, 0], [7, 0, 0]], "status": "alive", "kills": 1 })],
        vec![food([2, 2, 0], 3), food([10, 10, 5], 4), food([6, 8, 3], 1)],
    );

    let first = seeded_planner(42).plan_turn(&world, BUDGET);
    let second = seeded_planner(42).plan_turn(&world, BUDGET);

    assert_eq!(first.decisions, second.decisions);
    assert_eq!(first.skipped, second.skipped);
    assert_eq!(first.decisions.len(), 3);
}

#[test]
fn test_command_payload_lists_each_decision() {
    let world = snapshot(
        [7, 7, 1],
        vec![snake("a", &[[0, 0, 0]]), snake("b", &[[6, 6, 0]])],
        vec![],
        vec![food([2, 0, 0], 5), food([6, 4, 0], 5)],
    );

    let report = seeded_planner(6).plan_turn(&world, BUDGET);
    let payload = report.command_payload();

    let snakes = payload["snakes"].as_array().expect("snakes array");
    assert_eq!(snakes.len(), report.decisions.len());
    for entry in snakes {
        let id = entry["id"].as_str().unwrap();
        let decision = report.decision_for(id).unwrap();
        let direction: Vec3 = serde_json::from_value(entry["direction"].clone()).unwrap();
        assert_eq!(direction, decision.direction);
        assert!(direction.is_unit_step());
    }
}

#[test]
fn test_claimed_food_is_not_a_rich_region_for_others() {
    let prize = Vec3::new(3, 0, 0);
    let world = snapshot(
        [7, 7, 1],
        vec![snake("a", &[[0, 0, 0]]), snake("b", &[[6, 0, 0]])],
        vec![],
        vec![food([3, 0, 0], 5)],
    );

    for seed in [1, 2, 3] {
        let report = seeded_planner(seed).plan_turn(&world, BUDGET);

        let chasers: Vec<_> = report.decisions.iter().filter(|d| d.target == prize).collect();
        assert_eq!(chasers.len(), 1, "seed {}: {:?}", seed, report.decisions);
        assert_eq!(chasers[0].tier, DecisionTier::GoalSeek);
        assert!(report
            .decisions
            .iter()
            .all(|d| d.tier != DecisionTier::RichRegion));
    }
}

#[test]
fn test_rich_region_tier_targets_richest_food() {
    let world = snapshot(
        [10, 10, 1],
        vec![snake("a", &[[0, 0, 0]])],
        vec![],
        vec![food([5, 0, 0], 3), food([6, 0, 0], 2), food([0, 9, 0], 1)],
    );
    let mut planner = starved_planner(7, 30);

    let report = planner.plan_turn(&world, BUDGET);

    let a = report.decision_for("a").expect("a rich region is reachable");
    assert_eq!(a.tier, DecisionTier::RichRegion);
    // (5,0,0) and (6,0,0) both sum to 5; the lower coordinate ranks first
    assert_eq!(a.target, Vec3::new(5, 0, 0));
    assert_eq!(a.direction, Vec3::new(1, 0, 0));
    assert_eq!(planner.registry().last_target("a"), None, "fallback tiers claim nothing");
}

#[test]
fn test_far_rich_region_routes_to_waypoint() {
    let world = snapshot(
        [40, 40, 1],
        vec![snake("a", &[[0, 0, 0]])],
        vec![],
        vec![food([30, 0, 0], 4)],
    );

    let report = starved_planner(8, 10).plan_turn(&world, BUDGET);

    let a = report.decision_for("a").expect("waypoint is reachable");
    assert_eq!(a.tier, DecisionTier::RichRegion);
    assert_eq!(a.target, Vec3::new(10, 0, 0));
    assert_eq!(a.path.len(), 11);
}

#[test]
fn test_starved_agents_split_rich_regions() {
    // Two cells of one cluster sit within the separation distance; the far
    // cluster is the only other region left once the first is taken
    let world = snapshot(
        [30, 30, 1],
        vec![snake("a", &[[0, 0, 0]]), snake("b", &[[0, 20, 0]])],
        vec![],
        vec![food([10, 0, 0], 5), food([11, 0, 0], 5), food([10, 20, 0], 3)],
    );

    for seed in [1, 2, 3] {
        let report = starved_planner(seed, 30).plan_turn(&world, BUDGET);

        assert_eq!(report.decisions.len(), 2, "seed {}: {:?}", seed, report);
        assert!(report
            .decisions
            .iter()
            .all(|d| d.tier == DecisionTier::RichRegion));

        let mut targets: Vec<Vec3> = report.decisions.iter().map(|d| d.target).collect();
        targets.sort();
        assert_eq!(targets, vec![Vec3::new(10, 0, 0), Vec3::new(10, 20, 0)]);
    }
}
