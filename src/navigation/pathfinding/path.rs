use bevy::math::{Vec2, Vec3};

use crate::navigation::math::to_plane;
use super::line::TurnBoundary;

/// A simplified path prepared for a follower.
///
/// Each look point has a turn boundary placed `turn_distance` before it,
/// so the follower starts turning towards the next point early. The last
/// boundary passes through the goal itself and marks arrival.
#[derive(Clone, Debug, PartialEq)]
pub struct Path {
    look_points: Vec<Vec3>,
    turn_boundaries: Vec<TurnBoundary>,
    finish_line_index: usize,
    slow_down_index: usize,
}

impl Path {
    /// Returns `None` for an empty waypoint list.
    pub fn new(
        look_points: Vec<Vec3>,
        start: Vec3,
        turn_distance: f32,
        stopping_distance: f32,
    ) -> Option<Self> {
        if look_points.is_empty() {
            return None;
        }

        let (turn_boundaries, finish_line_index) =
            build_turn_boundaries(&look_points, start, turn_distance);
        let slow_down_index = slow_down_index(&look_points, stopping_distance);

        Some(Self {
            look_points,
            turn_boundaries,
            finish_line_index,
            slow_down_index,
        })
    }

    pub fn look_points(&self) -> &[Vec3] {
        &self.look_points
    }

    pub fn turn_boundaries(&self) -> &[TurnBoundary] {
        &self.turn_boundaries
    }

    /// Index of the boundary that marks arrival.
    pub fn finish_line_index(&self) -> usize {
        self.finish_line_index
    }

    /// First look point index at which the follower should decelerate.
    pub fn slow_down_index(&self) -> usize {
        self.slow_down_index
    }

    pub fn finish_line(&self) -> &TurnBoundary {
        &self.turn_boundaries[self.finish_line_index]
    }

    pub fn goal(&self) -> Vec3 {
        self.look_points[self.finish_line_index]
    }
}

/// One boundary per look point, plus the index of the finish line.
pub fn build_turn_boundaries(
    look_points: &[Vec3],
    start: Vec3,
    turn_distance: f32,
) -> (Vec<TurnBoundary>, usize) {
    let finish_line_index = look_points.len().saturating_sub(1);
    let mut boundaries = Vec::with_capacity(look_points.len());
    let mut previous: Vec2 = to_plane(start);

    for (i, &point) in look_points.iter().enumerate() {
        let current = to_plane(point);
        let direction = (current - previous).normalize_or_zero();
        let boundary_point = if i == finish_line_index {
            current
        } else {
            current - direction * turn_distance
        };

        boundaries.push(TurnBoundary::new(
            boundary_point,
            previous - direction * turn_distance,
        ));
        previous = boundary_point;
    }

    (boundaries, finish_line_index)
}

/// Scan back from the goal, summing segment lengths, and return the first
/// index whose accumulated distance exceeds `stopping_distance`.
///
/// Returns 0 when the whole path is shorter than the stopping distance,
/// meaning the follower should slow down straight away.
pub fn slow_down_index(look_points: &[Vec3], stopping_distance: f32) -> usize {
    let mut distance_from_end = 0.0;
    for i in (1..look_points.len()).rev() {
        distance_from_end += look_points[i].distance(look_points[i - 1]);
        if distance_from_end > stopping_distance {
            return i;
        }
    }
    0
}
