//! Helpers for moving between world space (Y up) and the ground plane.
//!
//! World points are `Vec3` with the terrain lying in the XZ plane. Turn
//! boundaries and follower math work on the ground plane, where a world
//! point `(x, y, z)` becomes `(x, z)`.

use bevy::math::{Vec2, Vec3};

/// Project a world point onto the ground plane.
#[inline]
pub fn to_plane(point: Vec3) -> Vec2 {
    Vec2::new(point.x, point.z)
}

/// Lift a ground-plane point back into world space at the given height.
#[inline]
pub fn from_plane(point: Vec2, height: f32) -> Vec3 {
    Vec3::new(point.x, height, point.y)
}

/// Squared ground-plane distance between two world points (height ignored).
#[inline]
pub fn plane_distance_squared(a: Vec3, b: Vec3) -> f32 {
    to_plane(a).distance_squared(to_plane(b))
}
