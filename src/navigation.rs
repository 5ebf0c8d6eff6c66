use bevy::prelude::*;

pub mod collections;
pub mod config;
pub mod error;
pub mod math;
pub mod pathfinding;
pub mod structures;

use config::NavigationConfigPlugin;
use pathfinding::{NavigationDebugPlugin, PathfindingPlugin};

/// Grid construction, path dispatch, hot-reloaded follower settings and
/// debug gizmos in one plugin.
///
/// Headless apps (servers, tests) can add [`PathfindingPlugin`] on its own.
pub struct NavigationPlugin;

impl Plugin for NavigationPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins((NavigationConfigPlugin, PathfindingPlugin, NavigationDebugPlugin));
    }
}
