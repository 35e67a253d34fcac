// Claimed-target registry
//
// Keeps agents from converging on the same food. Claims live for one turn,
// bans live until an operator clears them, and each agent's last committed
// target is remembered across turns so the others steer clear of it.

use std::collections::{HashMap, HashSet};

use crate::geometry::Vec3;

#[derive(Debug, Clone, Default)]
pub struct TargetRegistry {
    claimed: HashSet<Vec3>,
    banned: HashSet<Vec3>,
    last_known: HashMap<String, Vec3>,
}

impl TargetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets per-turn claims and forgets stale last-known targets
    ///
    /// An entry is stale when its agent is no longer live or its food is no
    /// longer on the map.
    pub fn begin_turn<'a, I>(&mut self, live_ids: I, food_positions: &HashSet<Vec3>)
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.claimed.clear();
        let live: HashSet<&str> = live_ids.into_iter().collect();
        self.last_known
            .retain(|id, target| live.contains(id.as_str()) && food_positions.contains(target));
    }

    /// Records a goal-seek commitment for this turn and beyond
    pub fn claim(&mut self, agent_id: &str, target: Vec3) {
        self.claimed.insert(target);
        self.last_known.insert(agent_id.to_string(), target);
    }

    /// Targets `agent_id` must not pick: this turn's claims, bans, and the
    /// last-known targets of every other agent
    pub fn ignore_set_for(&self, agent_id: &str) -> HashSet<Vec3> {
        let mut ignore: HashSet<Vec3> = self.claimed.union(&self.banned).copied().collect();
        ignore.extend(
            self.last_known
                .iter()
                .filter(|(id, _)| id.as_str() != agent_id)
                .map(|(_, target)| *target),
        );
        ignore
    }

    pub fn ban(&mut self, target: Vec3) -> bool {
        self.banned.insert(target)
    }

    pub fn replace_banned<I: IntoIterator<Item = Vec3>>(&mut self, banned: I) {
        self.banned = banned.into_iter().collect();
    }

    pub fn banned(&self) -> Vec<Vec3> {
        let mut banned: Vec<Vec3> = self.banned.iter().copied().collect();
        banned.sort();
        banned
    }

    pub fn is_banned(&self, target: Vec3) -> bool {
        self.banned.contains(&target)
    }

    pub fn last_target(&self, agent_id: &str) -> Option<Vec3> {
        self.last_known.get(agent_id).copied()
    }
}
