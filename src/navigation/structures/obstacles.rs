//! Collision queries consumed while classifying grid cells.
//!
//! The grid never talks to a physics engine directly. It asks a
//! [`CollisionProvider`] two questions per cell: "does anything blocking
//! overlap this point?" and "which terrain layer is under this point?".
//! [`ObstacleSet`] answers both from plain shapes, which is what the Bevy
//! adapter snapshots the scene into and what tests build by hand.

use bevy::math::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::navigation::math::to_plane;

/// Bitmask over the 32 collision/terrain layers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LayerMask(pub u32);

impl LayerMask {
    pub const NONE: Self = Self(0);
    pub const ALL: Self = Self(u32::MAX);

    /// Mask containing a single layer. Layers above 31 yield an empty mask.
    #[inline]
    pub fn layer(layer: u8) -> Self {
        Self(1u32.checked_shl(layer as u32).unwrap_or(0))
    }

    /// Union of the given layers.
    pub fn from_layers(layers: &[u8]) -> Self {
        layers.iter().fold(Self::NONE, |mask, &l| mask.union(Self::layer(l)))
    }

    #[inline]
    pub fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    #[inline]
    pub fn contains(self, layer: u8) -> bool {
        layer < 32 && self.0 & (1 << layer) != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

/// Host collision primitives used once per cell at grid-build time.
pub trait CollisionProvider {
    /// True if any collider on a layer in `mask` overlaps a sphere of
    /// `radius` around `point`.
    fn check_overlap(&self, point: Vec3, radius: f32, mask: LayerMask) -> bool;

    /// Cast a ray and return the layer of the first terrain surface hit on
    /// a layer in `mask`, or `None` if nothing is hit within `max_distance`.
    fn sample_terrain(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        mask: LayerMask,
    ) -> Option<u8>;
}

/// Footprint of a blocking collider on the ground plane.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum ObstacleShape {
    Circle { center: Vec2, radius: f32 },
    Box { min: Vec2, max: Vec2 },
}

impl ObstacleShape {
    /// Whether a circle of `radius` around `point` overlaps this shape.
    pub fn overlaps_circle(&self, point: Vec2, radius: f32) -> bool {
        match *self {
            ObstacleShape::Circle { center, radius: r } => {
                let reach = r + radius;
                point.distance_squared(center) < reach * reach
            }
            ObstacleShape::Box { min, max } => {
                let closest = point.clamp(min, max);
                point.distance_squared(closest) < radius * radius
            }
        }
    }
}

/// A blocking collider: shape plus the layer it lives on.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub shape: ObstacleShape,
    pub layer: u8,
}

/// Axis-aligned terrain surface at a fixed height (road, mud, grass...).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TerrainPatch {
    pub min: Vec2,
    pub max: Vec2,
    pub height: f32,
    pub layer: u8,
}

impl TerrainPatch {
    #[inline]
    fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min.x && point.x <= self.max.x && point.y >= self.min.y && point.y <= self.max.y
    }
}

/// In-memory collision world made of simple shapes.
///
/// Obstacles are treated as infinitely tall prisms, so overlap tests only
/// look at the ground plane. Terrain rays are only answered for downward
/// casts, which is the only kind the grid issues.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ObstacleSet {
    pub obstacles: Vec<Obstacle>,
    pub terrain: Vec<TerrainPatch>,
}

impl ObstacleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_circle(&mut self, center: Vec2, radius: f32, layer: u8) -> &mut Self {
        self.obstacles.push(Obstacle {
            shape: ObstacleShape::Circle { center, radius },
            layer,
        });
        self
    }

    pub fn add_box(&mut self, min: Vec2, max: Vec2, layer: u8) -> &mut Self {
        self.obstacles.push(Obstacle {
            shape: ObstacleShape::Box { min: min.min(max), max: min.max(max) },
            layer,
        });
        self
    }

    pub fn add_terrain(&mut self, min: Vec2, max: Vec2, height: f32, layer: u8) -> &mut Self {
        self.terrain.push(TerrainPatch {
            min: min.min(max),
            max: min.max(max),
            height,
            layer,
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.obstacles.is_empty() && self.terrain.is_empty()
    }
}

impl CollisionProvider for ObstacleSet {
    fn check_overlap(&self, point: Vec3, radius: f32, mask: LayerMask) -> bool {
        let p = to_plane(point);
        self.obstacles
            .iter()
            .filter(|o| mask.contains(o.layer))
            .any(|o| o.shape.overlaps_circle(p, radius))
    }

    fn sample_terrain(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        mask: LayerMask,
    ) -> Option<u8> {
        if direction.y >= 0.0 {
            return None;
        }

        let p = to_plane(origin);
        let floor = origin.y - max_distance * -direction.normalize_or_zero().y;

        // Highest surface under the ray wins; later patches win ties.
        self.terrain
            .iter()
            .filter(|t| mask.contains(t.layer) && t.contains(p))
            .filter(|t| t.height <= origin.y && t.height >= floor)
            .fold(None, |best: Option<&TerrainPatch>, t| match best {
                Some(b) if b.height > t.height => Some(b),
                _ => Some(t),
            })
            .map(|t| t.layer)
    }
}
