use bevy::math::Vec3;

use crate::navigation::structures::{CellCoord, CostGrid};

/// Collapse a start-to-goal cell chain into the cells where the walking
/// direction changes, plus the goal.
///
/// The start cell is never emitted: the agent is already standing on it.
/// A single-cell chain (start equals goal) yields the goal centre, and an
/// empty chain yields nothing. The number of waypoints equals the number
/// of straight runs in the chain.
pub fn simplify(grid: &CostGrid, chain: &[CellCoord]) -> Vec<Vec3> {
    let Some(&last) = chain.last() else {
        return Vec::new();
    };

    let mut waypoints = Vec::new();
    let mut direction: Option<(isize, isize)> = None;

    for window in chain.windows(2) {
        let step = step_direction(window[0], window[1]);
        if direction.is_some_and(|d| d != step) {
            // window[0] ended the previous run
            waypoints.push(grid.world_position(window[0]));
        }
        direction = Some(step);
    }

    waypoints.push(grid.world_position(last));
    waypoints
}

#[inline]
fn step_direction(from: CellCoord, to: CellCoord) -> (isize, isize) {
    (
        to.x as isize - from.x as isize,
        to.y as isize - from.y as isize,
    )
}
