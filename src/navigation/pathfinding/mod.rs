mod astar;
mod debug;
mod dispatcher;
mod follow;
mod line;
mod path;
mod repath;
mod smoothing;
mod systems;
mod types;

#[cfg(test)]
mod tests;

// ============================================================================
// PUBLIC API
// ============================================================================

pub use astar::{find_path, octile_distance, search, AStarSearch, DIAGONAL_COST, ORTHOGONAL_COST};
pub use debug::{cell_color, NavigationDebug, NavigationDebugPlugin};
pub use dispatcher::{PathDispatcher, PathPlanner, PathRequester};
pub use follow::{CursorState, PathCursor, ARRIVAL_SPEED_PERCENT};
pub use line::TurnBoundary;
pub use path::{build_turn_boundaries, slow_down_index, Path};
pub use repath::{RepathPolicy, RepathTimer};
pub use smoothing::simplify;
pub use systems::{
    snapshot_scene, ActivePath, NavGrid, NavObstacle, NavTerrain, PathDelivery, PathInbox,
    PathSeeker,
};
pub use types::{
    FailureReason, PathCallback, PathRequest, PathResponse, SearchOutcome, SearchResult,
    SearchState,
};

use bevy::prelude::*;

use crate::navigation::config::FollowSettings;

/// Builds the cost grid at startup, owns the dispatcher and delivers
/// finished paths to [`PathSeeker`] entities every frame.
///
/// Insert a `GridConfig` / `DispatcherConfig` before adding the plugin to
/// skip reading `assets/navigation_grid.ron`.
pub struct PathfindingPlugin;

impl Plugin for PathfindingPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PathInbox>();
        app.init_resource::<FollowSettings>();
        app.add_systems(PreStartup, systems::load_grid_config);
        app.add_systems(PostStartup, systems::build_navigation);
        app.add_systems(
            Update,
            (
                systems::apply_repath_settings,
                systems::update_repath_timers,
                systems::drain_path_results,
                systems::apply_path_deliveries,
                systems::advance_path_cursors,
            )
                .chain(),
        );
    }
}
