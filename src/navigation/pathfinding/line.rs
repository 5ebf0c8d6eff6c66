//! Turn boundaries: lines a follower crosses to advance to the next waypoint.

use bevy::math::Vec2;

/// A line on the ground plane with a remembered approach side.
///
/// Built from a point on the line and a point the follower approaches
/// from. The line runs perpendicular to the travel direction
/// (`point_on_line - approach_point`), and [`has_crossed`](Self::has_crossed)
/// flips once a point reaches the line or passes it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TurnBoundary {
    anchor: Vec2,
    /// Unit travel direction (the line's normal).
    travel: Vec2,
    approach_side: bool,
}

impl TurnBoundary {
    pub fn new(point_on_line: Vec2, approach_point: Vec2) -> Self {
        // Coincident points: fall back to travelling along +Y (a horizontal line).
        let travel = (point_on_line - approach_point).try_normalize().unwrap_or(Vec2::Y);
        let mut boundary = Self {
            anchor: point_on_line,
            travel,
            approach_side: false,
        };
        boundary.approach_side = boundary.side(approach_point);
        boundary
    }

    pub fn anchor(&self) -> Vec2 {
        self.anchor
    }

    /// Direction along the line.
    pub fn direction(&self) -> Vec2 {
        self.travel.perp()
    }

    /// Unit travel direction the boundary faces.
    pub fn normal(&self) -> Vec2 {
        self.travel
    }

    /// True once `point` is on the line or on the far side of it.
    pub fn has_crossed(&self, point: Vec2) -> bool {
        self.side(point) != self.approach_side
    }

    /// Foot of the perpendicular from `point` onto the line.
    pub fn project(&self, point: Vec2) -> Vec2 {
        point - self.travel * self.signed_distance(point)
    }

    /// Distance from `point` to its projection on the line.
    pub fn distance_from_point(&self, point: Vec2) -> f32 {
        self.signed_distance(point).abs()
    }

    /// Distance along the travel direction; negative before the line.
    #[inline]
    fn signed_distance(&self, point: Vec2) -> f32 {
        (point - self.anchor).dot(self.travel)
    }

    #[inline]
    fn side(&self, point: Vec2) -> bool {
        self.direction().perp_dot(point - self.anchor) > 0.0
    }
}
