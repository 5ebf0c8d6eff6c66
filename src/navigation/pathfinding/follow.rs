use bevy::math::Vec3;

use crate::navigation::math::to_plane;
use super::path::Path;

/// Speed fraction below which the follower counts as arrived.
pub const ARRIVAL_SPEED_PERCENT: f32 = 0.01;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CursorState {
    Following { index: usize },
    Finished,
}

/// Waypoint bookkeeping for something walking a [`Path`].
///
/// The cursor never moves anything itself. Each frame the follower reports
/// its position and gets back the look point to steer at and a speed
/// multiplier for the final approach.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PathCursor {
    index: usize,
    finished: bool,
    speed_percent: f32,
}

impl Default for PathCursor {
    fn default() -> Self {
        Self::new()
    }
}

impl PathCursor {
    pub fn new() -> Self {
        Self {
            index: 0,
            finished: false,
            speed_percent: 1.0,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Speed multiplier computed by the last [`update`](Self::update).
    pub fn current_speed(&self) -> f32 {
        self.speed_percent
    }

    /// Look point the follower should currently steer towards.
    pub fn target(&self, path: &Path) -> Option<Vec3> {
        if self.finished {
            return None;
        }
        path.look_points().get(self.index).copied()
    }

    /// Move past every boundary `position` has crossed. Crossing the finish
    /// line ends the path.
    pub fn advance(&mut self, path: &Path, position: Vec3) -> CursorState {
        if self.finished {
            return CursorState::Finished;
        }

        let point = to_plane(position);
        while self.index < path.turn_boundaries().len()
            && path.turn_boundaries()[self.index].has_crossed(point)
        {
            if self.index == path.finish_line_index() {
                self.finished = true;
                return CursorState::Finished;
            }
            self.index += 1;
        }

        CursorState::Following { index: self.index }
    }

    /// Fraction of full speed for the current position: 1 until the slow-down
    /// index is reached, then the remaining distance to the finish line over
    /// `stopping_distance`, clamped to `[0, 1]`.
    pub fn speed_percent(&self, path: &Path, position: Vec3, stopping_distance: f32) -> f32 {
        if self.index < path.slow_down_index() || stopping_distance <= 0.0 {
            return 1.0;
        }
        let remaining = path.finish_line().distance_from_point(to_plane(position));
        (remaining / stopping_distance).clamp(0.0, 1.0)
    }

    /// [`advance`](Self::advance) followed by the speed update. A speed
    /// below [`ARRIVAL_SPEED_PERCENT`] finishes the path.
    pub fn update(&mut self, path: &Path, position: Vec3, stopping_distance: f32) -> CursorState {
        if let CursorState::Finished = self.advance(path, position) {
            self.speed_percent = 0.0;
            return CursorState::Finished;
        }

        self.speed_percent = self.speed_percent(path, position, stopping_distance);
        if self.speed_percent < ARRIVAL_SPEED_PERCENT {
            self.finished = true;
            self.speed_percent = 0.0;
            return CursorState::Finished;
        }

        CursorState::Following { index: self.index }
    }
}
