use bevy::prelude::*;

use bevy::window::WindowResolution;

use pathweaver::navigation::pathfinding::{ActivePath, NavObstacle, NavTerrain, PathSeeker};
use pathweaver::navigation::NavigationPlugin;

use bevy::log::LogPlugin;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use std::fs;
use std::path::{Path as FsPath, PathBuf};

/// Blocking collider layer, matching `unwalkable_layers` in the grid config.
const OBSTACLE_LAYER: u8 = 8;
const MUD_LAYER: u8 = 11;
const SEEKER_SPEED: f32 = 6.0;
const SEEKER_TURN_SPEED: f32 = 3.0;

#[derive(Component)]
struct Wanderer {
    radius: f32,
    angular_speed: f32,
}

fn setup_file_logging() -> std::io::Result<String> {
    let log_dir = PathBuf::from("logs");
    fs::create_dir_all(&log_dir)?;

    // Keep only the last 25 runs
    cleanup_old_logs(&log_dir, 25);

    let now = chrono::Local::now();
    let log_filename = format!("pathweaver_{}.log", now.format("%Y%m%d_%H%M%S"));
    let log_path_str = log_dir.join(&log_filename).to_string_lossy().to_string();

    let file_appender = RollingFileAppender::new(Rotation::NEVER, &log_dir, &log_filename);

    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false);

    let stdout_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(false);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("wgpu=error,bevy_render=info,bevy_ecs=info,pathweaver=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();

    Ok(log_path_str)
}

fn cleanup_old_logs(log_dir: &FsPath, keep_count: usize) {
    let Ok(entries) = fs::read_dir(log_dir) else { return };

    let mut log_files: Vec<_> = entries
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.file_name()
                .to_str()
                .is_some_and(|s| s.starts_with("pathweaver") && s.ends_with(".log"))
        })
        .collect();

    // Oldest first
    log_files.sort_by_key(|e| e.metadata().ok().and_then(|m| m.modified().ok()));

    if log_files.len() > keep_count {
        for file in log_files.iter().take(log_files.len() - keep_count) {
            let _ = fs::remove_file(file.path());
        }
    }
}

fn main() {
    match setup_file_logging() {
        Ok(log_file) => println!("pathweaver demo - logging to {}", log_file),
        Err(e) => eprintln!("pathweaver demo - file logging unavailable: {}", e),
    }

    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "pathweaver".into(),
                resolution: WindowResolution::new(1280, 720),
                resizable: true,
                ..default()
            }),
            ..default()
        }).build().disable::<LogPlugin>())
        .add_plugins(NavigationPlugin)
        .add_systems(Startup, setup_scene)
        .add_systems(Update, (move_wanderers, steer_seekers))
        .run();
}

fn setup_scene(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    info!("Demo scene setup started");

    commands.spawn((
        Mesh3d(meshes.add(Plane3d::default().mesh().size(60.0, 60.0))),
        MeshMaterial3d(materials.add(Color::srgb(0.3, 0.5, 0.3))),
    ));

    commands.spawn((
        PointLight {
            shadows_enabled: true,
            intensity: 10_000_000.0,
            range: 120.0,
            ..default()
        },
        Transform::from_xyz(8.0, 30.0, 8.0),
    ));

    commands.spawn((
        Camera3d::default(),
        Transform::from_xyz(0.0, 55.0, 40.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    let rock = materials.add(Color::srgb(0.5, 0.5, 0.5));
    for (x, z, radius) in [(-8.0, 4.0, 3.0), (6.0, -6.0, 2.5), (12.0, 10.0, 4.0)] {
        commands.spawn((
            Mesh3d(meshes.add(Cylinder::new(radius, 2.0))),
            MeshMaterial3d(rock.clone()),
            Transform::from_xyz(x, 1.0, z),
            NavObstacle::Circle { radius, layer: OBSTACLE_LAYER },
        ));
    }

    let wall_half = Vec2::new(1.0, 8.0);
    commands.spawn((
        Mesh3d(meshes.add(Cuboid::new(wall_half.x * 2.0, 2.0, wall_half.y * 2.0))),
        MeshMaterial3d(rock),
        Transform::from_xyz(0.0, 1.0, 0.0),
        NavObstacle::Rect { half_extents: wall_half, layer: OBSTACLE_LAYER },
    ));

    let mud_half = Vec2::new(6.0, 4.0);
    commands.spawn((
        Mesh3d(meshes.add(Plane3d::default().mesh().size(mud_half.x * 2.0, mud_half.y * 2.0))),
        MeshMaterial3d(materials.add(Color::srgb(0.35, 0.25, 0.15))),
        Transform::from_xyz(-14.0, 0.01, -12.0),
        NavTerrain { half_extents: mud_half, layer: MUD_LAYER },
    ));

    let target = commands
        .spawn((
            Mesh3d(meshes.add(Sphere::new(0.6))),
            MeshMaterial3d(materials.add(Color::srgb(1.0, 0.8, 0.1))),
            Transform::from_xyz(18.0, 0.6, 0.0),
            Wanderer { radius: 18.0, angular_speed: 0.25 },
        ))
        .id();

    let seeker_mesh = meshes.add(Cuboid::new(1.0, 1.0, 1.0));
    let seeker_material = materials.add(Color::srgb(0.2, 0.4, 1.0));
    for (x, z) in [(-22.0, -20.0), (-22.0, 20.0), (20.0, -22.0)] {
        commands.spawn((
            Mesh3d(seeker_mesh.clone()),
            MeshMaterial3d(seeker_material.clone()),
            Transform::from_xyz(x, 0.5, z),
            PathSeeker::new(target),
        ));
    }
}

fn move_wanderers(time: Res<Time>, mut wanderers: Query<(&mut Transform, &Wanderer)>) {
    let t = time.elapsed_secs();
    for (mut transform, wanderer) in wanderers.iter_mut() {
        let angle = t * wanderer.angular_speed;
        transform.translation.x = angle.cos() * wanderer.radius;
        transform.translation.z = angle.sin() * wanderer.radius;
    }
}

/// Minimal follower: turn towards the cursor's look point and move forward
/// at the cursor's speed.
fn steer_seekers(
    time: Res<Time>,
    mut seekers: Query<(&mut Transform, &ActivePath), With<PathSeeker>>,
) {
    let dt = time.delta_secs();

    for (mut transform, active) in seekers.iter_mut() {
        let Some(target) = active.cursor.target(&active.path) else {
            continue;
        };

        let flat_target = Vec3::new(target.x, transform.translation.y, target.z);
        if flat_target.distance_squared(transform.translation) > f32::EPSILON {
            let desired = transform.looking_at(flat_target, Vec3::Y).rotation;
            transform.rotation = transform.rotation.slerp(desired, (dt * SEEKER_TURN_SPEED).min(1.0));
        }

        let forward = transform.forward();
        transform.translation += forward * SEEKER_SPEED * active.cursor.current_speed() * dt;
    }
}
