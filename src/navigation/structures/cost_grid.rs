use bevy::log::{debug, info};
use bevy::math::{Vec2, Vec3};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::navigation::config::{GridConfig, TerrainPenalty};
use crate::navigation::error::GridError;
use crate::navigation::math::to_plane;
use super::blur::box_blur;
use super::obstacles::{CollisionProvider, LayerMask};

/// Height above a cell centre from which the terrain probe is cast.
pub const TERRAIN_PROBE_HEIGHT: f32 = 50.0;
/// Length of the downward terrain probe.
pub const TERRAIN_PROBE_DISTANCE: f32 = 100.0;

/// Integer position of a cell in the lattice.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize, PartialOrd, Ord)]
pub struct CellCoord {
    pub x: usize,
    pub y: usize,
}

impl CellCoord {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

/// One lattice position. Immutable once the grid is built.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub coord: CellCoord,
    pub world_position: Vec3,
    pub walkable: bool,
    /// Blurred movement penalty added when entering this cell.
    pub penalty: u32,
}

/// Fixed 2D cost field over a rectangle of the ground plane.
///
/// The grid is centred on `center` and covers `world_size` (X by Z). Each
/// cell is classified once at build time: blocked if a collider on an
/// unwalkable layer overlaps it, and penalised according to the terrain
/// layer beneath it. Blocked cells also carry the obstacle-proximity
/// penalty so that, after blurring, walkable cells next to obstacles cost
/// more than open ground.
///
/// # Example
///
/// ```rust
/// use bevy::math::{Vec2, Vec3};
/// use pathweaver::navigation::config::GridConfig;
/// use pathweaver::navigation::structures::{CostGrid, ObstacleSet};
///
/// let config = GridConfig {
///     world_size: Vec2::new(10.0, 10.0),
///     cell_radius: 0.5,
///     ..Default::default()
/// };
/// let mut scene = ObstacleSet::new();
/// scene.add_circle(Vec2::ZERO, 1.0, 8);
///
/// let grid = CostGrid::build(&config, &scene).unwrap();
/// assert_eq!((grid.width(), grid.height()), (10, 10));
///
/// let centre = grid.cell_at(Vec3::new(0.2, 0.0, 0.2));
/// assert!(!grid.cell(centre).walkable);
/// ```
///
/// # Invariants
///
/// - `cells.len() == width * height`, row-major (`y * width + x`)
/// - dimensions and classification never change after construction
/// - search state is never stored here; searches keep their own overlay,
///   so one grid can be shared by many concurrent searches via `Arc`
#[derive(Clone, Debug)]
pub struct CostGrid {
    width: usize,
    height: usize,
    cell_radius: f32,
    cell_diameter: f32,
    center: Vec3,
    world_size: Vec2,
    cells: Vec<Cell>,
    terrain_penalties: FxHashMap<u8, u32>,
    penalty_min: u32,
    penalty_max: u32,
}

impl CostGrid {
    /// Classify every cell through `provider`, then blur the penalty field.
    pub fn build(config: &GridConfig, provider: &impl CollisionProvider) -> Result<Self, GridError> {
        let terrain_penalties = terrain_table(&config.terrain_penalties)?;
        let unwalkable_mask = LayerMask::from_layers(&config.unwalkable_layers);
        let terrain_mask = config
            .terrain_penalties
            .iter()
            .fold(LayerMask::NONE, |mask, t| mask.union(LayerMask::layer(t.layer)));

        let grid = Self::classify(config, terrain_penalties.clone(), |_, world_point| {
            let walkable = !provider.check_overlap(world_point, config.cell_radius, unwalkable_mask);

            let mut penalty = provider
                .sample_terrain(
                    world_point + Vec3::Y * TERRAIN_PROBE_HEIGHT,
                    Vec3::NEG_Y,
                    TERRAIN_PROBE_DISTANCE,
                    terrain_mask,
                )
                .and_then(|layer| terrain_penalties.get(&layer).copied())
                .unwrap_or(0);

            if !walkable {
                penalty = penalty.saturating_add(config.obstacle_proximity_penalty);
            }
            (walkable, penalty)
        })?;

        info!(
            "Built cost grid {}x{} (cell diameter {}, {} blocked, penalty range {}..={})",
            grid.width,
            grid.height,
            grid.cell_diameter,
            grid.blocked_count(),
            grid.penalty_min,
            grid.penalty_max
        );
        Ok(grid)
    }

    /// Build a grid from an explicit classification instead of collision
    /// queries. `classify` receives each cell's coordinate and world centre
    /// and returns `(walkable, raw_penalty)`; the blur is still applied.
    pub fn from_classification(
        config: &GridConfig,
        classify: impl FnMut(CellCoord, Vec3) -> (bool, u32),
    ) -> Result<Self, GridError> {
        let terrain_penalties = terrain_table(&config.terrain_penalties)?;
        Self::classify(config, terrain_penalties, classify)
    }

    fn classify(
        config: &GridConfig,
        terrain_penalties: FxHashMap<u8, u32>,
        mut classify: impl FnMut(CellCoord, Vec3) -> (bool, u32),
    ) -> Result<Self, GridError> {
        if !(config.cell_radius.is_finite() && config.cell_radius > 0.0) {
            return Err(GridError::InvalidCellRadius(config.cell_radius));
        }

        let cell_diameter = config.cell_radius * 2.0;
        let width = axis_cells(config.world_size.x, cell_diameter);
        let height = axis_cells(config.world_size.y, cell_diameter);
        if width == 0 || height == 0 {
            return Err(GridError::EmptyGrid {
                width: config.world_size.x,
                height: config.world_size.y,
                diameter: cell_diameter,
            });
        }

        let bottom_left = config.center
            - Vec3::X * (config.world_size.x / 2.0)
            - Vec3::Z * (config.world_size.y / 2.0);

        let mut cells = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                let coord = CellCoord::new(x, y);
                let world_position = bottom_left
                    + Vec3::X * (x as f32 * cell_diameter + config.cell_radius)
                    + Vec3::Z * (y as f32 * cell_diameter + config.cell_radius);
                let (walkable, penalty) = classify(coord, world_position);
                cells.push(Cell { coord, world_position, walkable, penalty });
            }
        }

        let raw: Vec<u32> = cells.iter().map(|c| c.penalty).collect();
        let blurred = box_blur(&raw, width, height, config.blur_size);
        for (cell, penalty) in cells.iter_mut().zip(blurred) {
            cell.penalty = penalty;
        }

        let penalty_min = cells.iter().map(|c| c.penalty).min().unwrap_or(0);
        let penalty_max = cells.iter().map(|c| c.penalty).max().unwrap_or(0);

        debug!(
            "Classified {} cells (blur size {}, kernel {})",
            cells.len(),
            config.blur_size,
            config.blur_size * 2 + 1
        );

        Ok(Self {
            width,
            height,
            cell_radius: config.cell_radius,
            cell_diameter,
            center: config.center,
            world_size: config.world_size,
            cells,
            terrain_penalties,
            penalty_min,
            penalty_max,
        })
    }

    // ------------------------------------------------------------------
    // Lookups
    // ------------------------------------------------------------------

    /// Cell containing (or nearest to) a world point.
    ///
    /// Points outside the grid are clamped to the nearest edge cell.
    pub fn cell_at(&self, world_point: Vec3) -> CellCoord {
        let local = to_plane(world_point) - to_plane(self.center);
        let percent_x = ((local.x + self.world_size.x / 2.0) / self.world_size.x).clamp(0.0, 1.0);
        let percent_y = ((local.y + self.world_size.y / 2.0) / self.world_size.y).clamp(0.0, 1.0);

        let x = ((self.width - 1) as f32 * percent_x).round() as usize;
        let y = ((self.height - 1) as f32 * percent_y).round() as usize;
        CellCoord::new(x.min(self.width - 1), y.min(self.height - 1))
    }

    /// Up to eight in-bounds neighbours, x-major (dx -1..=1, then dy -1..=1).
    pub fn neighbors(&self, coord: CellCoord) -> SmallVec<[CellCoord; 8]> {
        let mut out = SmallVec::new();
        for dx in -1isize..=1 {
            for dy in -1isize..=1 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let nx = coord.x as isize + dx;
                let ny = coord.y as isize + dy;
                if nx >= 0 && ny >= 0 && (nx as usize) < self.width && (ny as usize) < self.height {
                    out.push(CellCoord::new(nx as usize, ny as usize));
                }
            }
        }
        out
    }

    #[inline]
    pub fn index(&self, coord: CellCoord) -> usize {
        coord.y * self.width + coord.x
    }

    #[inline]
    pub fn coord_of(&self, index: usize) -> CellCoord {
        CellCoord::new(index % self.width, index / self.width)
    }

    #[inline]
    pub fn contains(&self, coord: CellCoord) -> bool {
        coord.x < self.width && coord.y < self.height
    }

    /// # Panics
    /// Panics if `coord` is outside the grid.
    #[inline]
    pub fn cell(&self, coord: CellCoord) -> &Cell {
        &self.cells[self.index(coord)]
    }

    pub fn get(&self, coord: CellCoord) -> Option<&Cell> {
        if self.contains(coord) {
            self.cells.get(self.index(coord))
        } else {
            None
        }
    }

    #[inline]
    pub fn is_walkable(&self, coord: CellCoord) -> bool {
        self.get(coord).is_some_and(|c| c.walkable)
    }

    #[inline]
    pub fn world_position(&self, coord: CellCoord) -> Vec3 {
        self.cell(coord).world_position
    }

    // ------------------------------------------------------------------
    // Read-only accessors (debug rendering, diagnostics)
    // ------------------------------------------------------------------

    /// All cells in row-major order.
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn width(&self) -> usize { self.width }
    pub fn height(&self) -> usize { self.height }
    pub fn len(&self) -> usize { self.cells.len() }
    pub fn is_empty(&self) -> bool { self.cells.is_empty() }
    pub fn cell_radius(&self) -> f32 { self.cell_radius }
    pub fn cell_diameter(&self) -> f32 { self.cell_diameter }
    pub fn center(&self) -> Vec3 { self.center }
    pub fn world_size(&self) -> Vec2 { self.world_size }

    /// Smallest and largest blurred penalty, for colour ramps.
    pub fn penalty_range(&self) -> (u32, u32) {
        (self.penalty_min, self.penalty_max)
    }

    /// Configured penalty for a terrain layer (before blurring).
    pub fn terrain_penalty(&self, layer: u8) -> Option<u32> {
        self.terrain_penalties.get(&layer).copied()
    }

    pub fn blocked_count(&self) -> usize {
        self.cells.iter().filter(|c| !c.walkable).count()
    }
}

fn axis_cells(extent: f32, diameter: f32) -> usize {
    let n = (extent / diameter).round();
    if n.is_finite() && n > 0.0 {
        n as usize
    } else {
        0
    }
}

fn terrain_table(penalties: &[TerrainPenalty]) -> Result<FxHashMap<u8, u32>, GridError> {
    let mut table = FxHashMap::default();
    for entry in penalties {
        if entry.layer >= 32 {
            return Err(GridError::LayerOutOfRange(entry.layer));
        }
        if table.insert(entry.layer, entry.penalty).is_some() {
            return Err(GridError::DuplicateTerrainLayer(entry.layer));
        }
    }
    Ok(table)
}
