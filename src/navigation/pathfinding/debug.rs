use bevy::prelude::*;

use crate::navigation::config::FollowSettings;
use crate::navigation::math::from_plane;
use super::systems::{ActivePath, NavGrid};

/// Height at which debug gizmos are drawn, just above the ground.
const GIZMO_HEIGHT: f32 = 0.05;
/// Half length of a drawn turn boundary.
const BOUNDARY_HALF_LENGTH: f32 = 1.0;

/// Which navigation overlays to draw.
#[derive(Resource, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NavigationDebug {
    pub show_grid: bool,
    pub show_paths: bool,
}

/// Draws cell and path gizmos. Requires Bevy's gizmo plugin.
pub struct NavigationDebugPlugin;

impl Plugin for NavigationDebugPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<NavigationDebug>()
            .add_systems(Update, (sync_debug_settings, draw_grid_gizmos, draw_path_gizmos).chain());
    }
}

fn sync_debug_settings(settings: Res<FollowSettings>, mut debug: ResMut<NavigationDebug>) {
    if !settings.is_changed() {
        return;
    }
    debug.show_grid = settings.0.debug_draw_grid;
    debug.show_paths = settings.0.debug_draw_paths;
}

fn draw_grid_gizmos(debug: Res<NavigationDebug>, grid: Option<Res<NavGrid>>, mut gizmos: Gizmos) {
    if !debug.show_grid {
        return;
    }
    let Some(grid) = grid else { return };
    let grid = &grid.0;

    let size = Vec2::splat(grid.cell_diameter() * 0.9);
    let rotation = Quat::from_rotation_x(std::f32::consts::FRAC_PI_2);

    for cell in grid.cells() {
        let color = cell_color(cell.walkable, cell.penalty, grid.penalty_range());
        gizmos.rect(
            Isometry3d::new(cell.world_position + Vec3::Y * GIZMO_HEIGHT, rotation),
            size,
            color,
        );
    }
}

fn draw_path_gizmos(debug: Res<NavigationDebug>, paths: Query<&ActivePath>, mut gizmos: Gizmos) {
    if !debug.show_paths {
        return;
    }

    for active in paths.iter() {
        let points = active.path.look_points();
        for pair in points.windows(2) {
            gizmos.line(pair[0], pair[1], Color::srgb(0.0, 1.0, 0.0));
        }
        for (i, point) in points.iter().enumerate() {
            let color = if i == active.path.slow_down_index() {
                Color::srgb(1.0, 0.6, 0.0)
            } else {
                Color::srgb(0.0, 1.0, 0.0)
            };
            gizmos.sphere(*point, 0.2, color);
        }

        for boundary in active.path.turn_boundaries() {
            let along = boundary.direction() * BOUNDARY_HALF_LENGTH;
            gizmos.line(
                from_plane(boundary.anchor() - along, GIZMO_HEIGHT),
                from_plane(boundary.anchor() + along, GIZMO_HEIGHT),
                Color::WHITE,
            );
        }
    }
}

/// Black for the cheapest walkable cells, white for the most expensive,
/// red for blocked cells.
pub fn cell_color(walkable: bool, penalty: u32, (min, max): (u32, u32)) -> Color {
    if !walkable {
        return Color::srgb(1.0, 0.0, 0.0);
    }
    let t = if max > min {
        (penalty.saturating_sub(min)) as f32 / (max - min) as f32
    } else {
        0.0
    };
    let t = t.clamp(0.0, 1.0);
    Color::srgb(t, t, t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocked_cells_are_red() {
        assert_eq!(cell_color(false, 0, (0, 10)), Color::srgb(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_penalty_ramp() {
        assert_eq!(cell_color(true, 0, (0, 10)), Color::srgb(0.0, 0.0, 0.0));
        assert_eq!(cell_color(true, 10, (0, 10)), Color::srgb(1.0, 1.0, 1.0));
        assert_eq!(cell_color(true, 5, (0, 10)), Color::srgb(0.5, 0.5, 0.5));
        // Flat field
        assert_eq!(cell_color(true, 3, (3, 3)), Color::srgb(0.0, 0.0, 0.0));
    }
}
