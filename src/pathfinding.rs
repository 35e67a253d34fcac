// Time-boxed weighted A* over the 3D grid
//
// Two variants share the frontier discipline and the edge cost model:
// - `find_path`: one start, one goal, returns a path or a reason there is none
// - `find_paths_multi`: one start, many goals, returns distance and predecessor
//   maps over every cell it reached so the caller can pick a goal afterwards
//
// Neither variant treats "no path" as an error. Running out of time, running
// out of frontier, or blowing the frontier cap are ordinary outcomes that the
// orchestrator answers by trying its next tier.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::time::{Duration, Instant};

use crate::config::SearchConfig;
use crate::geometry::{cosine_similarity, Bounds, Vec3};
use crate::obstacles::ObstacleIndex;
use crate::simple_profiler;

/// Scales for each term of the composite edge cost
#[derive(Debug, Clone, PartialEq)]
pub struct SearchWeights {
    pub centrality: f64,
    pub centrality_cap: f64,
    pub danger: f64,
    pub crowding: f64,
    pub crowding_cap: f64,
}

impl SearchWeights {
    pub fn from_config(search: &SearchConfig) -> Self {
        SearchWeights {
            centrality: search.centrality_weight,
            centrality_cap: search.centrality_cap,
            danger: search.danger_weight,
            crowding: search.crowding_weight,
            crowding_cap: search.crowding_cap,
        }
    }

    /// Every step costs exactly 1: plain shortest-hop A*
    pub fn unit() -> Self {
        SearchWeights {
            centrality: 0.0,
            centrality_cap: 1.0,
            danger: 0.0,
            crowding: 0.0,
            crowding_cap: 1.0,
        }
    }
}

/// Composite edge cost: `1 + centrality^2 + danger + crowding`, each term weighted
pub struct EdgeCost<'a> {
    center: Vec3,
    diagonal: f64,
    obstacles: &'a ObstacleIndex,
    weights: &'a SearchWeights,
    friendly_mass: Option<Vec3>,
}

impl<'a> EdgeCost<'a> {
    pub fn new(
        bounds: Bounds,
        obstacles: &'a ObstacleIndex,
        weights: &'a SearchWeights,
        friendly_mass: Option<Vec3>,
    ) -> Self {
        EdgeCost {
            center: bounds.center(),
            diagonal: bounds.diagonal(),
            obstacles,
            weights,
            friendly_mass,
        }
    }

    /// Distance from the world center, capped and scaled by the diagonal
    pub fn centrality(&self, cell: Vec3) -> f64 {
        if self.diagonal <= 0.0 {
            return 0.0;
        }
        2.0 * cell.distance(self.center).min(self.weights.centrality_cap) / self.diagonal
    }

    /// 1 when continuing straight through `to` would hit an obstacle
    pub fn danger(&self, from: Vec3, to: Vec3) -> f64 {
        let ahead = to + (to - from);
        if self.obstacles.contains(ahead) {
            1.0
        } else {
            0.0
        }
    }

    /// Close to the centroid of the other friendly heads costs more
    pub fn crowding(&self, cell: Vec3) -> f64 {
        match self.friendly_mass {
            Some(mass) if self.weights.crowding_cap > 0.0 => {
                let cap = self.weights.crowding_cap;
                1.0 - cell.distance(mass).min(cap) / cap
            }
            _ => 0.0,
        }
    }

    pub fn cost(&self, from: Vec3, to: Vec3) -> f64 {
        let centrality = self.centrality(to);
        1.0 + self.weights.centrality * centrality * centrality
            + self.weights.danger * self.danger(from, to)
            + self.weights.crowding * self.crowding(to)
    }
}

/// Frontier entry ordered as a min-heap on `(f, g, sequence)`
#[derive(Debug, Clone, Copy)]
struct FrontierEntry {
    f: f64,
    g: f64,
    sequence: u64,
    cell: Vec3,
}

impl PartialEq for FrontierEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for FrontierEntry {}

impl PartialOrd for FrontierEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FrontierEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: BinaryHeap is a max-heap
        other
            .f
            .total_cmp(&self.f)
            .then_with(|| other.g.total_cmp(&self.g))
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

/// BinaryHeap wrapper that stamps insertion order
#[derive(Default)]
struct Frontier {
    heap: BinaryHeap<FrontierEntry>,
    next_sequence: u64,
}

impl Frontier {
    fn push(&mut self, cell: Vec3, g: f64, h: f64) {
        self.heap.push(FrontierEntry {
            f: g + h,
            g,
            sequence: self.next_sequence,
            cell,
        });
        self.next_sequence += 1;
    }

    fn pop(&mut self) -> Option<FrontierEntry> {
        self.heap.pop()
    }

    fn len(&self) -> usize {
        self.heap.len()
    }
}

/// Neighbors of `cell`, optionally ordered by how well each step points at `toward`
///
/// Ordering only changes which of several equal-cost paths is discovered
/// first. The sort is stable, so ties keep the fixed enumeration order.
fn ordered_neighbors(cell: Vec3, toward: Vec3, sort: bool) -> [Vec3; 6] {
    let mut neighbors = cell.neighbors();
    if sort {
        let heading = toward - cell;
        neighbors.sort_by(|a, b| {
            let sa = cosine_similarity(*a - cell, heading);
            let sb = cosine_similarity(*b - cell, heading);
            sb.total_cmp(&sa)
        });
    }
    neighbors
}

fn reconstruct_path(came_from: &HashMap<Vec3, Vec3>, start: Vec3, target: Vec3) -> Vec<Vec3> {
    let mut path = vec![target];
    let mut current = target;
    while current != start {
        match came_from.get(&current) {
            Some(&prev) => {
                path.push(prev);
                current = prev;
            }
            None => break,
        }
    }
    path.reverse();
    path
}

/// Inputs for a single-goal search
#[derive(Debug, Clone, Copy)]
pub struct SearchRequest<'a> {
    pub start: Vec3,
    pub goal: Vec3,
    pub bounds: Bounds,
    pub obstacles: &'a ObstacleIndex,
    pub weights: &'a SearchWeights,
    pub timeout: Duration,
    pub max_frontier: usize,
    pub sort_neighbors: bool,
}

/// Result of a single-goal search
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// Path from start to goal, both included
    Found(Vec<Vec3>),
    /// Every reachable cell was expanded without meeting the goal
    Exhausted,
    /// The time slice ran out; a path may still exist
    TimedOut,
    /// The frontier outgrew its cap
    FrontierOverflow,
}

impl SearchOutcome {
    pub fn path(&self) -> Option<&[Vec3]> {
        match self {
            SearchOutcome::Found(path) => Some(path),
            _ => None,
        }
    }

    pub fn into_path(self) -> Option<Vec<Vec3>> {
        match self {
            SearchOutcome::Found(path) => Some(path),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SearchOutcome::Found(_) => "found",
            SearchOutcome::Exhausted => "no-path",
            SearchOutcome::TimedOut => "timed-out",
            SearchOutcome::FrontierOverflow => "frontier-overflow",
        }
    }
}

/// Weighted A* from `start` to `goal`
///
/// The start and goal cells are walkable even when listed as obstacles.
/// Stops with `TimedOut` as soon as a pop happens after the timeout has
/// elapsed, so a zero timeout never expands past the start cell.
pub fn find_path(request: &SearchRequest) -> SearchOutcome {
    let _guard = simple_profiler::ProfileGuard::new("single_goal");
    let started = Instant::now();
    let SearchRequest {
        start,
        goal,
        bounds,
        obstacles,
        weights,
        timeout,
        max_frontier,
        sort_neighbors,
    } = *request;

    if !bounds.contains(goal) {
        return SearchOutcome::Exhausted;
    }

    let edge = EdgeCost::new(bounds, obstacles, weights, None);
    let center = bounds.center();

    let mut frontier = Frontier::default();
    let mut best_g: HashMap<Vec3, f64> = HashMap::new();
    let mut came_from: HashMap<Vec3, Vec3> = HashMap::new();

    best_g.insert(start, 0.0);
    frontier.push(start, 0.0, start.manhattan(goal) as f64);

    let mut expanded = 0usize;

    while let Some(entry) = frontier.pop() {
        if best_g.get(&entry.cell).is_some_and(|&g| entry.g > g) {
            continue;
        }

        if entry.cell == goal {
            simple_profiler::record_expansions(expanded);
            return SearchOutcome::Found(reconstruct_path(&came_from, start, goal));
        }

        if started.elapsed() >= timeout {
            simple_profiler::record_expansions(expanded);
            simple_profiler::record_timeout();
            return SearchOutcome::TimedOut;
        }

        expanded += 1;

        for next in ordered_neighbors(entry.cell, center, sort_neighbors) {
            if !bounds.contains(next) {
                continue;
            }
            if next != goal && next != start && obstacles.contains(next) {
                continue;
            }

            let tentative = entry.g + edge.cost(entry.cell, next);
            if best_g.get(&next).map_or(true, |&old| tentative < old) {
                best_g.insert(next, tentative);
                came_from.insert(next, entry.cell);
                frontier.push(next, tentative, next.manhattan(goal) as f64);
            }
        }

        if frontier.len() > max_frontier {
            simple_profiler::record_expansions(expanded);
            simple_profiler::record_overflow();
            return SearchOutcome::FrontierOverflow;
        }
    }

    simple_profiler::record_expansions(expanded);
    SearchOutcome::Exhausted
}

/// Inputs for a multi-goal search
#[derive(Debug, Clone, Copy)]
pub struct MultiGoalRequest<'a> {
    pub start: Vec3,
    pub goals: &'a [Vec3],
    pub bounds: Bounds,
    pub obstacles: &'a ObstacleIndex,
    /// Cells neither entered nor accepted as goals
    pub ignore: &'a HashSet<Vec3>,
    pub weights: &'a SearchWeights,
    /// Centroid of the other friendly heads, if any
    pub friendly_mass: Option<Vec3>,
    pub timeout: Duration,
    pub max_frontier: usize,
    pub sort_neighbors: bool,
}

/// Why a multi-goal search stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MultiGoalStatus {
    /// Every goal was popped from the frontier
    Complete,
    TimedOut,
    Exhausted,
    FrontierOverflow,
}

/// Distance and predecessor maps over every cell the search reached
#[derive(Debug, Clone)]
pub struct MultiGoalResult {
    pub start: Vec3,
    /// Best known accumulated cost per reached cell
    pub distances: HashMap<Vec3, f64>,
    pub came_from: HashMap<Vec3, Vec3>,
    /// Settled cost of each goal, recorded when it was first popped
    pub discovered: HashMap<Vec3, f64>,
    pub status: MultiGoalStatus,
}

impl MultiGoalResult {
    /// Path from the start to any reached cell
    pub fn path_to(&self, target: Vec3) -> Option<Vec<Vec3>> {
        if !self.distances.contains_key(&target) {
            return None;
        }
        Some(reconstruct_path(&self.came_from, self.start, target))
    }
}

fn nearest_goal_distance(cell: Vec3, remaining: &[Vec3]) -> f64 {
    remaining
        .iter()
        .map(|&goal| cell.manhattan(goal))
        .min()
        .unwrap_or(0) as f64
}

/// Weighted A* toward a set of goals at once
///
/// The heuristic is the Manhattan distance to the nearest goal not yet
/// discovered. The search keeps going after the first goal and stops once
/// every goal has been popped, the frontier empties, or time runs out. Cells
/// in `ignore` are treated like obstacles and never count as goals. A goal
/// that is also an obstacle is a dead end: reachable, but not expanded.
pub fn find_paths_multi(request: &MultiGoalRequest) -> MultiGoalResult {
    let _guard = simple_profiler::ProfileGuard::new("multi_goal");
    let started = Instant::now();
    let MultiGoalRequest {
        start,
        goals,
        bounds,
        obstacles,
        ignore,
        weights,
        friendly_mass,
        timeout,
        max_frontier,
        sort_neighbors,
    } = *request;

    let goal_set: HashSet<Vec3> = goals
        .iter()
        .copied()
        .filter(|g| !ignore.contains(g) && bounds.contains(*g))
        .collect();
    let mut remaining: Vec<Vec3> = goal_set.iter().copied().collect();
    remaining.sort();

    let mut result = MultiGoalResult {
        start,
        distances: HashMap::new(),
        came_from: HashMap::new(),
        discovered: HashMap::new(),
        status: MultiGoalStatus::Exhausted,
    };
    result.distances.insert(start, 0.0);

    if remaining.is_empty() {
        result.status = MultiGoalStatus::Complete;
        return result;
    }

    let edge = EdgeCost::new(bounds, obstacles, weights, friendly_mass);
    let center = bounds.center();
    let mut frontier = Frontier::default();
    frontier.push(start, 0.0, nearest_goal_distance(start, &remaining));

    let mut expanded = 0usize;

    while let Some(entry) = frontier.pop() {
        if result.distances.get(&entry.cell).is_some_and(|&g| entry.g > g) {
            continue;
        }

        if goal_set.contains(&entry.cell) && !result.discovered.contains_key(&entry.cell) {
            result.discovered.insert(entry.cell, entry.g);
            remaining.retain(|&g| g != entry.cell);
            if remaining.is_empty() {
                result.status = MultiGoalStatus::Complete;
                break;
            }
        }

        // An occupied goal may be entered but never passed through
        if entry.cell != start && obstacles.contains(entry.cell) {
            continue;
        }

        if started.elapsed() >= timeout {
            simple_profiler::record_timeout();
            result.status = MultiGoalStatus::TimedOut;
            break;
        }

        expanded += 1;

        for next in ordered_neighbors(entry.cell, center, sort_neighbors) {
            if !bounds.contains(next) || ignore.contains(&next) {
                continue;
            }
            if !goal_set.contains(&next) && obstacles.contains(next) {
                continue;
            }

            let tentative = entry.g + edge.cost(entry.cell, next);
            if result.distances.get(&next).map_or(true, |&old| tentative < old) {
                result.distances.insert(next, tentative);
                result.came_from.insert(next, entry.cell);
                frontier.push(next, tentative, nearest_goal_distance(next, &remaining));
            }
        }

        if frontier.len() > max_frontier {
            simple_profiler::record_overflow();
            result.status = MultiGoalStatus::FrontierOverflow;
            break;
        }
    }

    simple_profiler::record_expansions(expanded);
    result
}
