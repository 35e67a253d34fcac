// Turn-level faults
//
// Search failures are never errors; they are values the fallback ladder
// consumes. Only input the planner cannot act on at all ends up here.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TurnError {
    #[error("negative turn budget: {0}ms")]
    NegativeBudget(i64),
    #[error("planner task failed: {0}")]
    PlannerUnavailable(String),
}
