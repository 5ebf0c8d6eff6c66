use std::cmp::Ordering;

use bevy::log::debug;
use bevy::math::Vec3;
use fixedbitset::FixedBitSet;
use pathweaver_macros::profile;
use rustc_hash::FxHashMap;

use crate::navigation::collections::{HeapItem, IndexedPriorityQueue};
use crate::navigation::structures::{CellCoord, CostGrid};
use super::smoothing::simplify;
use super::types::{FailureReason, SearchOutcome, SearchResult, SearchState};

/// Cost of an orthogonal step between adjacent cells.
pub const ORTHOGONAL_COST: u32 = 10;
/// Cost of a diagonal step (10 * sqrt(2), rounded down).
pub const DIAGONAL_COST: u32 = 14;

/// Octile distance in integer step units.
///
/// Never overestimates the cost of the cheapest route, since every step
/// costs at least this much and cell penalties are non-negative.
#[inline]
pub fn octile_distance(a: CellCoord, b: CellCoord) -> u32 {
    let dx = a.x.abs_diff(b.x) as u32;
    let dy = a.y.abs_diff(b.y) as u32;
    if dx > dy {
        DIAGONAL_COST * dy + ORTHOGONAL_COST * (dx - dy)
    } else {
        DIAGONAL_COST * dx + ORTHOGONAL_COST * (dy - dx)
    }
}

/// Open-set entry. Orders by f, then h, then cell index, so equal-cost
/// frontiers always expand in the same order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct OpenCell {
    f: u32,
    h: u32,
    index: usize,
}

impl Ord for OpenCell {
    fn cmp(&self, other: &Self) -> Ordering {
        self.f
            .cmp(&other.f)
            .then_with(|| self.h.cmp(&other.h))
            .then_with(|| self.index.cmp(&other.index))
    }
}

impl PartialOrd for OpenCell {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl HeapItem for OpenCell {
    #[inline]
    fn heap_key(&self) -> usize {
        self.index
    }
}

/// Per-search bookkeeping for one visited cell.
#[derive(Clone, Copy, Debug)]
struct Scratch {
    g: u32,
    parent: Option<usize>,
}

/// Incremental A* over a [`CostGrid`].
///
/// All mutable state lives here, the grid is only read, so any number of
/// searches may share one grid across threads.
///
/// ```rust
/// use bevy::math::Vec2;
/// use pathweaver::navigation::config::GridConfig;
/// use pathweaver::navigation::pathfinding::{AStarSearch, SearchState};
/// use pathweaver::navigation::structures::{CellCoord, CostGrid};
///
/// let config = GridConfig { world_size: Vec2::new(5.0, 5.0), blur_size: 0, ..Default::default() };
/// let grid = CostGrid::from_classification(&config, |_, _| (true, 0)).unwrap();
///
/// let mut search = AStarSearch::new(&grid, CellCoord::new(0, 0), CellCoord::new(4, 4));
/// assert_eq!(search.run(), SearchState::Succeeded);
/// assert_eq!(search.cost(), Some(56));
/// ```
pub struct AStarSearch<'g> {
    grid: &'g CostGrid,
    start: CellCoord,
    goal: CellCoord,
    open: IndexedPriorityQueue<OpenCell>,
    closed: FixedBitSet,
    scratch: FxHashMap<usize, Scratch>,
    state: SearchState,
    expanded: usize,
}

impl<'g> AStarSearch<'g> {
    pub fn new(grid: &'g CostGrid, start: CellCoord, goal: CellCoord) -> Self {
        Self {
            grid,
            start,
            goal,
            open: IndexedPriorityQueue::new(grid.len()),
            closed: FixedBitSet::with_capacity(grid.len()),
            scratch: FxHashMap::default(),
            state: SearchState::Initialized,
            expanded: 0,
        }
    }

    pub fn state(&self) -> SearchState {
        self.state
    }

    /// Cells popped from the open set so far.
    pub fn expanded(&self) -> usize {
        self.expanded
    }

    pub fn start(&self) -> CellCoord {
        self.start
    }

    pub fn goal(&self) -> CellCoord {
        self.goal
    }

    /// Advance by one transition: seeding from `Initialized`, one expansion
    /// while `Expanding`. Terminal states are returned unchanged.
    pub fn step(&mut self) -> SearchState {
        match self.state {
            SearchState::Initialized => self.seed(),
            SearchState::Expanding => self.expand_next(),
            SearchState::Succeeded | SearchState::Exhausted(_) => {}
        }
        self.state
    }

    /// Step until a terminal state is reached.
    pub fn run(&mut self) -> SearchState {
        while !self.state.is_terminal() {
            self.step();
        }
        self.state
    }

    /// Best known cost from the start to `coord`, if it has been reached.
    pub fn g_cost(&self, coord: CellCoord) -> Option<u32> {
        if !self.grid.contains(coord) {
            return None;
        }
        self.scratch.get(&self.grid.index(coord)).map(|s| s.g)
    }

    /// Total cost of the found path.
    pub fn cost(&self) -> Option<u32> {
        match self.state {
            SearchState::Succeeded => self.g_cost(self.goal),
            _ => None,
        }
    }

    /// Follow parent links from the goal back to the start and return the
    /// chain in start-to-goal order.
    pub fn retrace(&self) -> Option<Vec<CellCoord>> {
        if self.state != SearchState::Succeeded {
            return None;
        }

        let mut chain = Vec::new();
        let mut current = Some(self.grid.index(self.goal));
        while let Some(index) = current {
            chain.push(self.grid.coord_of(index));
            current = self.scratch.get(&index).and_then(|s| s.parent);
        }
        chain.reverse();
        Some(chain)
    }

    fn seed(&mut self) {
        if !self.grid.is_walkable(self.start) || !self.grid.is_walkable(self.goal) {
            self.state = SearchState::Exhausted(FailureReason::UnwalkableEndpoint);
            return;
        }

        let index = self.grid.index(self.start);
        let h = octile_distance(self.start, self.goal);
        self.scratch.insert(index, Scratch { g: 0, parent: None });
        self.open.push(OpenCell { f: h, h, index });
        self.state = SearchState::Expanding;
    }

    fn expand_next(&mut self) {
        let Some(current) = self.open.pop_min() else {
            self.state = SearchState::Exhausted(FailureReason::UnreachableGoal);
            return;
        };

        self.closed.insert(current.index);
        self.expanded += 1;

        let coord = self.grid.coord_of(current.index);
        if coord == self.goal {
            self.state = SearchState::Succeeded;
            return;
        }

        let current_g = self.scratch.get(&current.index).map_or(0, |s| s.g);

        for neighbour in self.grid.neighbors(coord) {
            let index = self.grid.index(neighbour);
            if self.closed.contains(index) {
                continue;
            }
            let cell = self.grid.cell(neighbour);
            if !cell.walkable {
                continue;
            }

            let candidate = current_g
                .saturating_add(octile_distance(coord, neighbour))
                .saturating_add(cell.penalty);

            let queued = self.open.contains(index);
            let improves = self.scratch.get(&index).is_none_or(|s| candidate < s.g);
            if !queued || improves {
                let h = octile_distance(neighbour, self.goal);
                self.scratch.insert(index, Scratch { g: candidate, parent: Some(current.index) });
                // push() re-sorts in place when the cell is already queued
                self.open.push(OpenCell { f: candidate.saturating_add(h), h, index });
            }
        }
    }
}

/// Run A* between two cells to completion.
pub fn search(grid: &CostGrid, start: CellCoord, goal: CellCoord) -> SearchOutcome {
    let mut astar = AStarSearch::new(grid, start, goal);
    match astar.run() {
        SearchState::Exhausted(reason) => SearchOutcome::Exhausted {
            reason,
            expanded: astar.expanded(),
        },
        _ => SearchOutcome::Succeeded {
            chain: astar.retrace().unwrap_or_default(),
            cost: astar.cost().unwrap_or(0),
            expanded: astar.expanded(),
        },
    }
}

/// Map two world points onto the grid, search between them and simplify
/// the result into waypoints.
///
/// Points outside the grid are clamped to the nearest edge cell.
#[profile]
pub fn find_path(grid: &CostGrid, start: Vec3, goal: Vec3) -> SearchResult {
    let start_cell = grid.cell_at(start);
    let goal_cell = grid.cell_at(goal);

    match search(grid, start_cell, goal_cell) {
        SearchOutcome::Succeeded { chain, cost, expanded } => {
            let waypoints = simplify(grid, &chain);
            debug!(
                "Path {:?} -> {:?}: {} cells, {} waypoints, cost {}, {} expanded",
                start_cell,
                goal_cell,
                chain.len(),
                waypoints.len(),
                cost,
                expanded
            );
            SearchResult::success(waypoints, cost)
        }
        SearchOutcome::Exhausted { reason, expanded } => {
            debug!(
                "No path {:?} -> {:?} ({:?} after {} expansions)",
                start_cell, goal_cell, reason, expanded
            );
            SearchResult::failure()
        }
    }
}
