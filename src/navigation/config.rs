use std::path::Path;

use bevy::prelude::*;
use bevy_common_assets::ron::RonAssetPlugin;
use serde::{Deserialize, Serialize};

use crate::navigation::error::ConfigError;

/// Location of the static navigation configuration.
pub const INITIAL_CONFIG_PATH: &str = "assets/navigation_grid.ron";

/// Penalty applied to cells whose terrain probe hits `layer`.
#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct TerrainPenalty {
    pub layer: u8,
    pub penalty: u32,
}

/// Shape and classification rules of the cost grid.
///
/// Read once at startup; changing it requires rebuilding the grid.
#[derive(Resource, Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct GridConfig {
    /// World-space centre of the grid (the grid lies in the XZ plane).
    pub center: Vec3,
    /// Extent covered by the grid: `x` along world X, `y` along world Z.
    pub world_size: Vec2,
    /// Half the side length of a cell.
    pub cell_radius: f32,
    /// Layers whose colliders make a cell unwalkable.
    pub unwalkable_layers: Vec<u8>,
    /// Terrain layers and the penalty for walking over them.
    pub terrain_penalties: Vec<TerrainPenalty>,
    /// Extra penalty on blocked cells, bleeding into neighbours via the blur.
    pub obstacle_proximity_penalty: u32,
    /// Blur radius in cells; the kernel side is `2 * blur_size + 1`.
    pub blur_size: usize,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            center: Vec3::ZERO,
            world_size: Vec2::new(60.0, 60.0),
            cell_radius: 0.5,
            unwalkable_layers: vec![8],
            terrain_penalties: vec![
                TerrainPenalty { layer: 9, penalty: 0 },  // road
                TerrainPenalty { layer: 10, penalty: 5 }, // grass
                TerrainPenalty { layer: 11, penalty: 20 }, // mud
            ],
            obstacle_proximity_penalty: 10,
            blur_size: 3,
        }
    }
}

/// Worker pool sizing for the path request dispatcher.
#[derive(Resource, Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct DispatcherConfig {
    /// Number of search threads; 0 picks the available parallelism.
    pub worker_threads: usize,
    /// Log a warning when more requests than this are in flight.
    pub backlog_warning: usize,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            worker_threads: 0,
            backlog_warning: 64,
        }
    }
}

impl DispatcherConfig {
    /// Worker count after resolving the automatic setting.
    pub fn resolved_worker_threads(&self) -> usize {
        if self.worker_threads > 0 {
            return self.worker_threads;
        }
        std::thread::available_parallelism()
            .map(|n| n.get().saturating_sub(1).clamp(1, 8))
            .unwrap_or(2)
    }
}

/// Static configuration loaded once at startup. Changing any of these
/// values means rebuilding the grid and restarting the worker pool.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct InitialNavConfig {
    pub grid: GridConfig,
    pub dispatcher: DispatcherConfig,
}

impl InitialNavConfig {
    /// Read and parse a RON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_ron(&contents).map_err(|message| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        })
    }

    pub fn from_ron(contents: &str) -> Result<Self, String> {
        ron::from_str::<Self>(contents).map_err(|e| e.to_string())
    }

    /// Load from `path`, logging and falling back to defaults on failure.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(config) => {
                info!("Loaded navigation config from {}", path.display());
                config
            }
            Err(e) => {
                error!("{}", e);
                error!("Using default InitialNavConfig");
                Self::default()
            }
        }
    }
}

/// Runtime follower and debug settings, hot-reloadable from
/// `assets/navigation.ron`. None of these affect how paths are searched.
#[derive(Deserialize, Serialize, Asset, TypePath, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct NavigationConfig {
    /// How far before a waypoint the follower starts turning.
    pub turn_distance: f32,
    /// Distance from the goal at which the follower starts slowing down.
    pub stopping_distance: f32,
    /// Delay before a seeker's first request.
    pub repath_initial_delay: f32,
    /// Minimum seconds between repath checks.
    pub repath_interval: f32,
    /// Target displacement that triggers a new request.
    pub repath_move_threshold: f32,
    pub debug_draw_grid: bool,
    pub debug_draw_paths: bool,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            turn_distance: 5.0,
            stopping_distance: 10.0,
            repath_initial_delay: 0.3,
            repath_interval: 0.2,
            repath_move_threshold: 0.5,
            debug_draw_grid: false,
            debug_draw_paths: true,
        }
    }
}

/// Current follower settings as a plain resource, so systems that only
/// need the values do not depend on the asset server.
#[derive(Resource, Clone, Debug, Default, PartialEq)]
pub struct FollowSettings(pub NavigationConfig);

#[derive(Resource)]
pub struct NavigationConfigHandle(pub Handle<NavigationConfig>);

/// Loads `navigation.ron` as a hot-reloadable asset and mirrors it into
/// [`FollowSettings`] whenever it changes.
pub struct NavigationConfigPlugin;

impl Plugin for NavigationConfigPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(RonAssetPlugin::<NavigationConfig>::new(&["navigation.ron"]))
            .init_resource::<FollowSettings>()
            .add_systems(Startup, setup_runtime_config)
            .add_systems(Update, apply_runtime_config);
    }
}

fn setup_runtime_config(mut commands: Commands, asset_server: Res<AssetServer>) {
    let handle = asset_server.load("navigation.ron");
    commands.insert_resource(NavigationConfigHandle(handle));
}

fn apply_runtime_config(
    mut events: MessageReader<AssetEvent<NavigationConfig>>,
    handle: Option<Res<NavigationConfigHandle>>,
    configs: Res<Assets<NavigationConfig>>,
    mut settings: ResMut<FollowSettings>,
) {
    let Some(handle) = handle else { return };

    for event in events.read() {
        if event.is_loaded_with_dependencies(&handle.0) || event.is_modified(&handle.0) {
            if let Some(config) = configs.get(&handle.0) {
                info!("Applied navigation settings: {:?}", config);
                settings.0 = config.clone();
            }
        }
    }
}
