/// Grid-side data structures shared by the search, the dispatcher and the
/// debug renderer.
///
/// The cost grid is built once from a [`CollisionProvider`] and is
/// read-only afterwards.

mod blur;
mod cost_grid;
pub mod obstacles;


pub use blur::box_blur;
pub use cost_grid::{Cell, CellCoord, CostGrid, TERRAIN_PROBE_DISTANCE, TERRAIN_PROBE_HEIGHT};
pub use obstacles::{CollisionProvider, LayerMask, Obstacle, ObstacleSet, ObstacleShape, TerrainPatch};
