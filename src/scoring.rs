// Goal scoring: pick the best reachable food, and rank food-rich regions
// for agents that found nothing worth chasing directly

use rayon::prelude::*;
use std::collections::HashMap;

use crate::geometry::Vec3;
use crate::simple_profiler;
use crate::types::FoodItem;

/// Picks the candidate with the best `value / distance`
///
/// Candidates missing from `distances` are unreachable and skipped, as is
/// anything with a non-positive value. A candidate at distance zero wins
/// outright. Exact ratio ties keep the first candidate seen, so callers that
/// want a stable pick should pass candidates in a stable order.
pub fn select_best_goal<'a>(
    candidates: &'a [FoodItem],
    distances: &HashMap<Vec3, f64>,
) -> Option<&'a FoodItem> {
    let mut best: Option<(&FoodItem, f64)> = None;

    for food in candidates {
        if food.value <= 0 {
            continue;
        }
        let Some(&distance) = distances.get(&food.position) else {
            continue;
        };
        if distance <= 0.0 {
            return Some(food);
        }

        let ratio = food.value as f64 / distance;
        if best.map_or(true, |(_, best_ratio)| ratio > best_ratio) {
            best = Some((food, ratio));
        }
    }

    best.map(|(food, _)| food)
}

/// A food cell ranked by the total value of food around it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RichRegion {
    pub position: Vec3,
    pub surrounding_value: i64,
}

/// Ranks every positive-value food by the summed value within `radius`
///
/// Highest surrounding value first; ties are ordered by position so the
/// ranking does not depend on input order.
pub fn rank_rich_regions(foods: &[FoodItem], radius: i32) -> Vec<RichRegion> {
    let _guard = simple_profiler::ProfileGuard::new("ranking");

    let positive: Vec<&FoodItem> = foods.iter().filter(|f| f.value > 0).collect();

    let mut regions: Vec<RichRegion> = positive
        .par_iter()
        .map(|center| RichRegion {
            position: center.position,
            surrounding_value: positive
                .iter()
                .filter(|other| other.position.manhattan(center.position) <= radius)
                .map(|other| other.value as i64)
                .sum(),
        })
        .collect();

    regions.sort_by(|a, b| {
        b.surrounding_value
            .cmp(&a.surrounding_value)
            .then_with(|| a.position.cmp(&b.position))
    });
    regions
}

/// Takes the top region and drops every other region near it
///
/// Returns the consumed region (if any) and the remaining ranking with all
/// entries within `min_separation` (Manhattan) of it removed.
pub fn take_rich_region(
    regions: Vec<RichRegion>,
    min_separation: i32,
) -> (Option<RichRegion>, Vec<RichRegion>) {
    let mut iter = regions.into_iter();
    let Some(top) = iter.next() else {
        return (None, Vec::new());
    };

    let rest = iter
        .filter(|r| r.position.manhattan(top.position) > min_separation)
        .collect();

    (Some(top), rest)
}
