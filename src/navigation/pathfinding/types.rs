use bevy::math::Vec3;

use crate::navigation::structures::CellCoord;

/// Completion handler for a path request: `(waypoints, success)`.
///
/// Invoked exactly once, on the thread that drains the dispatcher.
pub type PathCallback = Box<dyn FnOnce(&[Vec3], bool) + Send + 'static>;

/// Outcome of one `find_path` call.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SearchResult {
    /// World-space waypoints, start cell excluded. Empty on failure.
    pub waypoints: Vec<Vec3>,
    pub success: bool,
    /// Sum of step costs and entered-cell penalties. 0 on failure.
    pub total_cost: u32,
}

impl SearchResult {
    pub fn success(waypoints: Vec<Vec3>, total_cost: u32) -> Self {
        Self { waypoints, success: true, total_cost }
    }

    pub fn failure() -> Self {
        Self::default()
    }
}

/// Why a search ended without reaching the goal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureReason {
    /// Start or goal cell is blocked; nothing was expanded.
    UnwalkableEndpoint,
    /// The open set emptied before the goal was reached.
    UnreachableGoal,
}

/// Lifecycle of an [`AStarSearch`](super::astar::AStarSearch).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchState {
    Initialized,
    Expanding,
    Succeeded,
    Exhausted(FailureReason),
}

impl SearchState {
    pub fn is_terminal(self) -> bool {
        matches!(self, SearchState::Succeeded | SearchState::Exhausted(_))
    }
}

/// Raw result of a grid search, before simplification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SearchOutcome {
    Succeeded {
        /// Start-to-goal cell chain, both endpoints included.
        chain: Vec<CellCoord>,
        cost: u32,
        expanded: usize,
    },
    Exhausted {
        reason: FailureReason,
        expanded: usize,
    },
}

impl SearchOutcome {
    pub fn expanded(&self) -> usize {
        match self {
            SearchOutcome::Succeeded { expanded, .. } | SearchOutcome::Exhausted { expanded, .. } => {
                *expanded
            }
        }
    }
}

/// A queued path job.
pub struct PathRequest {
    pub start: Vec3,
    pub goal: Vec3,
    pub on_complete: PathCallback,
}

/// A finished job waiting for the next drain.
pub struct PathResponse {
    pub result: SearchResult,
    pub on_complete: PathCallback,
}
