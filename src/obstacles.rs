// Blocked-cell index built fresh from each world snapshot

use std::collections::HashSet;

use crate::geometry::Vec3;
use crate::types::{SnakeStatus, WorldSnapshot};

/// Every cell a search must not step into
///
/// Built once per turn from fences, our own bodies, enemy bodies and the
/// one-step margin in front of each enemy head. Search start and goal cells
/// are exempted by the searches themselves, not here.
#[derive(Debug, Clone, Default)]
pub struct ObstacleIndex {
    cells: HashSet<Vec3>,
}

impl ObstacleIndex {
    pub fn from_snapshot(snapshot: &WorldSnapshot) -> Self {
        let mut cells: HashSet<Vec3> = snapshot.fences.iter().copied().collect();

        for snake in snapshot.live_snakes() {
            cells.extend(snake.geometry.iter().copied());
        }

        for enemy in &snapshot.enemies {
            if enemy.status != SnakeStatus::Alive {
                continue;
            }
            cells.extend(enemy.geometry.iter().copied());
            cells.extend(Self::head_margin(&enemy.geometry));
        }

        ObstacleIndex { cells }
    }

    pub fn from_cells<I: IntoIterator<Item = Vec3>>(cells: I) -> Self {
        ObstacleIndex {
            cells: cells.into_iter().collect(),
        }
    }

    /// Cells an enemy head can reach next turn
    ///
    /// With a neck the heading is known and only the cell straight ahead is
    /// returned; a lone head could go anywhere, so all six neighbors are.
    fn head_margin(body: &[Vec3]) -> Vec<Vec3> {
        match body {
            [] => Vec::new(),
            [head] => head.neighbors().to_vec(),
            [head, neck, ..] => {
                let heading = *head - *neck;
                if heading.is_unit_step() {
                    vec![*head + heading]
                } else {
                    head.neighbors().to_vec()
                }
            }
        }
    }

    pub fn contains(&self, cell: Vec3) -> bool {
        self.cells.contains(&cell)
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }
}
