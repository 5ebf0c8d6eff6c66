use std::sync::{Arc, Mutex, PoisonError};

use bevy::prelude::*;

use crate::navigation::config::{
    DispatcherConfig, FollowSettings, GridConfig, InitialNavConfig, INITIAL_CONFIG_PATH,
};
use crate::navigation::structures::{CostGrid, ObstacleSet};
use super::dispatcher::PathDispatcher;
use super::follow::PathCursor;
use super::path::Path;
use super::repath::{RepathPolicy, RepathTimer};

// ============================================================================
// Components & Resources
// ============================================================================

/// Blocking collider footprint, centred on the entity's `Transform`.
#[derive(Component, Clone, Copy, Debug, PartialEq)]
pub enum NavObstacle {
    Circle { radius: f32, layer: u8 },
    Rect { half_extents: Vec2, layer: u8 },
}

/// Terrain surface centred on the entity's `Transform`, at its height.
#[derive(Component, Clone, Copy, Debug, PartialEq)]
pub struct NavTerrain {
    pub half_extents: Vec2,
    pub layer: u8,
}

/// Entity that keeps a path to `target` up to date.
///
/// Seekers built with [`PathSeeker::new`] take their repath policy from
/// [`FollowSettings`] and pick up hot-reloaded values. A policy passed to
/// [`PathSeeker::with_policy`] is kept as is.
#[derive(Component, Clone, Debug)]
pub struct PathSeeker {
    pub target: Entity,
    pub timer: RepathTimer,
    pub follows_settings: bool,
    /// Sequence number of the latest request sent for this seeker.
    pub request_generation: u64,
    /// Sequence number of the newest delivery applied so far.
    pub applied_generation: u64,
}

impl PathSeeker {
    pub fn new(target: Entity) -> Self {
        Self {
            follows_settings: true,
            ..Self::with_policy(target, RepathPolicy::default())
        }
    }

    pub fn with_policy(target: Entity, policy: RepathPolicy) -> Self {
        Self {
            target,
            timer: RepathTimer::new(policy),
            follows_settings: false,
            request_generation: 0,
            applied_generation: 0,
        }
    }
}

/// Latest successful path for a seeker. Replaced on every delivery.
#[derive(Component, Clone, Debug)]
pub struct ActivePath {
    pub path: Path,
    pub cursor: PathCursor,
}

/// The shared, immutable cost grid.
#[derive(Resource, Clone)]
pub struct NavGrid(pub Arc<CostGrid>);

/// One handler invocation captured for the ECS.
#[derive(Clone, Debug, PartialEq)]
pub struct PathDelivery {
    pub entity: Entity,
    /// The seeker's `request_generation` when the request was sent.
    pub generation: u64,
    pub waypoints: Vec<Vec3>,
    pub success: bool,
}

/// Where request handlers leave their results until
/// [`apply_path_deliveries`] turns them into components.
#[derive(Resource, Clone, Default)]
pub struct PathInbox(pub Arc<Mutex<Vec<PathDelivery>>>);

impl PathInbox {
    pub fn push(&self, delivery: PathDelivery) {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(delivery);
    }

    pub fn take(&self) -> Vec<PathDelivery> {
        std::mem::take(&mut *self.0.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

// ============================================================================
// Startup
// ============================================================================

/// Read `navigation_grid.ron` unless the app already supplied a grid config.
pub fn load_grid_config(
    mut commands: Commands,
    grid_config: Option<Res<GridConfig>>,
    dispatcher_config: Option<Res<DispatcherConfig>>,
) {
    if grid_config.is_some() && dispatcher_config.is_some() {
        return;
    }

    let initial = InitialNavConfig::load_or_default(INITIAL_CONFIG_PATH);
    if grid_config.is_none() {
        commands.insert_resource(initial.grid);
    }
    if dispatcher_config.is_none() {
        commands.insert_resource(initial.dispatcher);
    }
}

/// Collect every obstacle and terrain entity into an [`ObstacleSet`].
pub fn snapshot_scene<'a>(
    obstacles: impl IntoIterator<Item = (&'a Transform, &'a NavObstacle)>,
    terrain: impl IntoIterator<Item = (&'a Transform, &'a NavTerrain)>,
) -> ObstacleSet {
    let mut scene = ObstacleSet::new();

    for (transform, obstacle) in obstacles {
        let center = Vec2::new(transform.translation.x, transform.translation.z);
        match *obstacle {
            NavObstacle::Circle { radius, layer } => {
                scene.add_circle(center, radius, layer);
            }
            NavObstacle::Rect { half_extents, layer } => {
                scene.add_box(center - half_extents, center + half_extents, layer);
            }
        }
    }

    for (transform, patch) in terrain {
        let center = Vec2::new(transform.translation.x, transform.translation.z);
        scene.add_terrain(
            center - patch.half_extents,
            center + patch.half_extents,
            transform.translation.y,
            patch.layer,
        );
    }

    scene
}

/// Build the grid from the scene spawned during `Startup` and start the
/// dispatcher.
pub fn build_navigation(
    mut commands: Commands,
    grid_config: Res<GridConfig>,
    dispatcher_config: Res<DispatcherConfig>,
    obstacles: Query<(&Transform, &NavObstacle)>,
    terrain: Query<(&Transform, &NavTerrain)>,
) {
    let scene = snapshot_scene(obstacles.iter(), terrain.iter());
    info!(
        "Building navigation grid from {} obstacle(s) and {} terrain patch(es)",
        scene.obstacles.len(),
        scene.terrain.len()
    );

    let grid = match CostGrid::build(&grid_config, &scene) {
        Ok(grid) => Arc::new(grid),
        Err(e) => {
            error!("Failed to build navigation grid: {}", e);
            return;
        }
    };

    match PathDispatcher::spawn(grid.clone(), &dispatcher_config) {
        Ok(dispatcher) => commands.insert_resource(dispatcher),
        Err(e) => error!("Failed to start path dispatcher: {}", e),
    }
    commands.insert_resource(NavGrid(grid));
}

// ============================================================================
// Update
// ============================================================================

/// Copy the repath settings onto seekers that follow them, whenever the
/// settings change or a seeker is spawned.
pub fn apply_repath_settings(settings: Res<FollowSettings>, mut seekers: Query<&mut PathSeeker>) {
    let policy = RepathPolicy::from(&settings.0);
    let refresh_all = settings.is_changed();

    for mut seeker in seekers.iter_mut() {
        if !seeker.follows_settings || !(refresh_all || seeker.is_added()) {
            continue;
        }
        if *seeker.timer.policy() != policy {
            seeker.timer.set_policy(policy);
        }
    }
}

/// Submit a request for every seeker whose timer fires this frame.
pub fn update_repath_timers(
    time: Res<Time>,
    dispatcher: Option<Res<PathDispatcher>>,
    inbox: Res<PathInbox>,
    mut seekers: Query<(Entity, &Transform, &mut PathSeeker)>,
    targets: Query<&Transform>,
) {
    let Some(dispatcher) = dispatcher else { return };
    let dt = time.delta_secs();

    for (entity, transform, mut seeker) in seekers.iter_mut() {
        let Ok(target) = targets.get(seeker.target) else {
            continue;
        };
        let goal = target.translation;

        if !seeker.timer.tick(dt, goal) {
            continue;
        }

        seeker.request_generation += 1;
        let generation = seeker.request_generation;
        let inbox = inbox.clone();
        let submitted = dispatcher.request_path(transform.translation, goal, move |waypoints, success| {
            inbox.push(PathDelivery {
                entity,
                generation,
                waypoints: waypoints.to_vec(),
                success,
            });
        });
        if let Err(e) = submitted {
            warn!("Path request for {:?} dropped: {}", entity, e);
            seeker.timer.invalidate();
        }
    }
}

/// Run the handlers of every finished request.
pub fn drain_path_results(dispatcher: Option<Res<PathDispatcher>>) {
    if let Some(dispatcher) = dispatcher {
        dispatcher.drain_completed_requests();
    }
}

/// Turn delivered waypoints into [`ActivePath`] components.
///
/// Workers finish in any order, so a delivery older than one already
/// applied to the same seeker is dropped.
pub fn apply_path_deliveries(
    mut commands: Commands,
    inbox: Res<PathInbox>,
    settings: Res<FollowSettings>,
    mut seekers: Query<(&Transform, &mut PathSeeker)>,
) {
    for delivery in inbox.take() {
        // Seeker despawned while its request was in flight
        let Ok((transform, mut seeker)) = seekers.get_mut(delivery.entity) else {
            continue;
        };

        if delivery.generation <= seeker.applied_generation {
            debug!(
                "Dropping stale path for {:?} (request {} after {})",
                delivery.entity, delivery.generation, seeker.applied_generation
            );
            continue;
        }
        seeker.applied_generation = delivery.generation;

        if !delivery.success {
            debug!("No path found for {:?}", delivery.entity);
            continue;
        }

        let Some(path) = Path::new(
            delivery.waypoints,
            transform.translation,
            settings.0.turn_distance,
            settings.0.stopping_distance,
        ) else {
            continue;
        };

        commands.entity(delivery.entity).insert(ActivePath {
            path,
            cursor: PathCursor::new(),
        });
    }
}

/// Keep each cursor in step with its entity's position. Movement itself is
/// left to whoever owns the entity.
pub fn advance_path_cursors(
    settings: Res<FollowSettings>,
    mut followers: Query<(&Transform, &mut ActivePath)>,
) {
    for (transform, mut active) in followers.iter_mut() {
        if active.cursor.is_finished() {
            continue;
        }
        let ActivePath { path, cursor } = &mut *active;
        cursor.update(path, transform.translation, settings.0.stopping_distance);
    }
}
