//! Unit tests for search, post-processing and follower bookkeeping.
//!
//! Scenario tests that go through the dispatcher or a Bevy app live in
//! the crate's `tests/` directory.

use super::*;
use bevy::math::{Vec2, Vec3};
use crate::navigation::config::{GridConfig, NavigationConfig};
use crate::navigation::structures::{CellCoord, CostGrid};

/// Uniform walkable grid with one-unit cells centred on the origin.
fn uniform_grid(width: usize, height: usize) -> CostGrid {
    grid_with_blocked(width, height, |_| false)
}

fn grid_with_blocked(width: usize, height: usize, blocked: impl Fn(CellCoord) -> bool) -> CostGrid {
    let config = GridConfig {
        world_size: Vec2::new(width as f32, height as f32),
        cell_radius: 0.5,
        blur_size: 0,
        ..Default::default()
    };
    CostGrid::from_classification(&config, |coord, _| (!blocked(coord), 0)).unwrap()
}

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-4
}

// ============================================================================
// Heuristic
// ============================================================================

#[test]
fn test_octile_distance() {
    let origin = CellCoord::new(0, 0);
    assert_eq!(octile_distance(origin, origin), 0);
    assert_eq!(octile_distance(origin, CellCoord::new(3, 0)), 30);
    assert_eq!(octile_distance(origin, CellCoord::new(0, 2)), 20);
    assert_eq!(octile_distance(origin, CellCoord::new(4, 4)), 56);
    assert_eq!(octile_distance(CellCoord::new(5, 1), CellCoord::new(1, 3)), 2 * 14 + 2 * 10);
    // Symmetric
    assert_eq!(
        octile_distance(CellCoord::new(2, 7), CellCoord::new(6, 1)),
        octile_distance(CellCoord::new(6, 1), CellCoord::new(2, 7))
    );
}

// ============================================================================
// Search state machine
// ============================================================================

#[test]
fn test_search_state_transitions() {
    let grid = uniform_grid(5, 5);
    let mut astar = AStarSearch::new(&grid, CellCoord::new(0, 0), CellCoord::new(4, 4));
    assert_eq!(astar.state(), SearchState::Initialized);

    assert_eq!(astar.step(), SearchState::Expanding);
    assert_eq!(astar.expanded(), 0);

    let mut steps = 0;
    while astar.step() == SearchState::Expanding {
        steps += 1;
        assert!(steps < 100, "search did not terminate");
    }

    assert_eq!(astar.state(), SearchState::Succeeded);
    // Only the diagonal is expanded thanks to the h tie-break
    assert_eq!(astar.expanded(), 5);
    assert_eq!(astar.cost(), Some(56));

    // Terminal states are sticky
    assert_eq!(astar.step(), SearchState::Succeeded);
    assert_eq!(astar.expanded(), 5);
}

#[test]
fn test_retrace_runs_start_to_goal() {
    let grid = uniform_grid(6, 4);
    let mut astar = AStarSearch::new(&grid, CellCoord::new(5, 0), CellCoord::new(0, 3));
    astar.run();

    let chain = astar.retrace().expect("path should exist");
    assert_eq!(chain.first(), Some(&CellCoord::new(5, 0)));
    assert_eq!(chain.last(), Some(&CellCoord::new(0, 3)));
    for pair in chain.windows(2) {
        assert!(pair[0].x.abs_diff(pair[1].x) <= 1 && pair[0].y.abs_diff(pair[1].y) <= 1);
    }
    assert_eq!(astar.g_cost(CellCoord::new(5, 0)), Some(0));
}

#[test]
fn test_unwalkable_endpoint_expands_nothing() {
    let grid = grid_with_blocked(5, 5, |c| c == CellCoord::new(0, 0));
    let mut astar = AStarSearch::new(&grid, CellCoord::new(0, 0), CellCoord::new(4, 4));
    assert_eq!(astar.run(), SearchState::Exhausted(FailureReason::UnwalkableEndpoint));
    assert_eq!(astar.expanded(), 0);
    assert!(astar.retrace().is_none());

    let grid = grid_with_blocked(5, 5, |c| c == CellCoord::new(4, 4));
    let outcome = search(&grid, CellCoord::new(0, 0), CellCoord::new(4, 4));
    assert_eq!(
        outcome,
        SearchOutcome::Exhausted { reason: FailureReason::UnwalkableEndpoint, expanded: 0 }
    );
}

#[test]
fn test_enclosed_goal_is_unreachable() {
    let walls = [CellCoord::new(3, 3), CellCoord::new(3, 4), CellCoord::new(4, 3)];
    let grid = grid_with_blocked(5, 5, |c| walls.contains(&c));

    let outcome = search(&grid, CellCoord::new(0, 0), CellCoord::new(4, 4));
    match outcome {
        SearchOutcome::Exhausted { reason, expanded } => {
            assert_eq!(reason, FailureReason::UnreachableGoal);
            // Everything except the three walls and the goal
            assert_eq!(expanded, 21);
        }
        other => panic!("expected exhaustion, got {:?}", other),
    }
}

#[test]
fn test_penalties_steer_the_search() {
    // A costly band across the middle row, except at x = 4
    let config = GridConfig {
        world_size: Vec2::new(5.0, 5.0),
        cell_radius: 0.5,
        blur_size: 0,
        ..Default::default()
    };
    let grid = CostGrid::from_classification(&config, |coord, _| {
        let penalty = if coord.y == 2 && coord.x != 4 { 100 } else { 0 };
        (true, penalty)
    })
    .unwrap();

    match search(&grid, CellCoord::new(0, 0), CellCoord::new(0, 4)) {
        SearchOutcome::Succeeded { chain, cost, .. } => {
            assert!(chain.contains(&CellCoord::new(4, 2)), "path should use the free gap: {:?}", chain);
            assert!(cost < 40 + 100);
        }
        other => panic!("expected success, got {:?}", other),
    }
}

#[test]
fn test_find_path_start_equals_goal() {
    let grid = uniform_grid(5, 5);
    let point = Vec3::new(1.0, 0.0, 1.0);
    let result = find_path(&grid, point, point);
    assert!(result.success);
    assert_eq!(result.total_cost, 0);
    assert_eq!(result.waypoints, vec![grid.world_position(CellCoord::new(3, 3))]);
}

#[test]
fn test_find_path_clamps_outside_points() {
    let grid = uniform_grid(5, 5);
    let result = find_path(&grid, Vec3::new(-50.0, 0.0, -50.0), Vec3::new(50.0, 0.0, 50.0));
    assert!(result.success);
    assert_eq!(result.total_cost, 56);
    assert_eq!(result.waypoints, vec![Vec3::new(2.0, 0.0, 2.0)]);
}

// ============================================================================
// Simplification
// ============================================================================

#[test]
fn test_simplify_edge_cases() {
    let grid = uniform_grid(5, 5);
    assert!(simplify(&grid, &[]).is_empty());
    assert_eq!(
        simplify(&grid, &[CellCoord::new(1, 1)]),
        vec![grid.world_position(CellCoord::new(1, 1))]
    );
}

#[test]
fn test_simplify_keeps_run_ends() {
    let grid = uniform_grid(5, 5);

    let straight = [CellCoord::new(0, 0), CellCoord::new(1, 1), CellCoord::new(2, 2)];
    assert_eq!(simplify(&grid, &straight), vec![grid.world_position(CellCoord::new(2, 2))]);

    let elbow = [
        CellCoord::new(0, 0),
        CellCoord::new(1, 0),
        CellCoord::new(2, 0),
        CellCoord::new(2, 1),
        CellCoord::new(2, 2),
    ];
    assert_eq!(
        simplify(&grid, &elbow),
        vec![
            grid.world_position(CellCoord::new(2, 0)),
            grid.world_position(CellCoord::new(2, 2)),
        ]
    );
}

#[test]
fn test_simplify_zigzag_keeps_every_turn() {
    let grid = uniform_grid(5, 5);
    let zigzag = [
        CellCoord::new(0, 0),
        CellCoord::new(1, 1),
        CellCoord::new(2, 1),
        CellCoord::new(3, 2),
        CellCoord::new(4, 2),
    ];
    let expected: Vec<Vec3> = zigzag[1..].iter().map(|&c| grid.world_position(c)).collect();
    assert_eq!(simplify(&grid, &zigzag), expected);
}

// ============================================================================
// Turn boundaries
// ============================================================================

#[test]
fn test_turn_boundary_crossing() {
    let boundary = TurnBoundary::new(Vec2::new(0.0, 5.0), Vec2::new(0.0, 0.0));

    assert!(!boundary.has_crossed(Vec2::new(0.0, 0.0)));
    assert!(!boundary.has_crossed(Vec2::new(0.0, 4.0)));
    assert!(!boundary.has_crossed(Vec2::new(-3.0, 4.9)));
    assert!(boundary.has_crossed(Vec2::new(0.0, 5.0)));
    assert!(boundary.has_crossed(Vec2::new(3.0, 6.0)));
}

#[test]
fn test_turn_boundary_distance_and_projection() {
    let boundary = TurnBoundary::new(Vec2::new(0.0, 5.0), Vec2::new(0.0, 0.0));
    assert!(approx(boundary.distance_from_point(Vec2::new(2.0, 3.0)), 2.0));
    assert!(approx(boundary.distance_from_point(Vec2::new(-7.0, 8.0)), 3.0));
    assert_eq!(boundary.project(Vec2::new(2.0, 3.0)), Vec2::new(2.0, 5.0));

    // Diagonal travel: the line runs along (-1, 1)
    let boundary = TurnBoundary::new(Vec2::new(1.0, 1.0), Vec2::new(0.0, 0.0));
    assert!(approx(boundary.distance_from_point(Vec2::new(0.0, 0.0)), 2f32.sqrt()));
    assert!(approx(boundary.distance_from_point(Vec2::new(2.0, 0.0)), 0.0));
    assert!(boundary.has_crossed(Vec2::new(2.0, 2.0)));
}

#[test]
fn test_turn_boundary_coincident_points() {
    let boundary = TurnBoundary::new(Vec2::new(1.0, 1.0), Vec2::new(1.0, 1.0));
    assert_eq!(boundary.direction().y, 0.0);
    assert!(approx(boundary.distance_from_point(Vec2::new(4.0, 3.0)), 2.0));
}

#[test]
fn test_build_turn_boundaries() {
    let look_points = [Vec3::new(0.0, 0.0, 10.0), Vec3::new(10.0, 0.0, 10.0)];
    let (boundaries, finish) = build_turn_boundaries(&look_points, Vec3::ZERO, 2.0);

    assert_eq!(boundaries.len(), 2);
    assert_eq!(finish, 1);
    // Pulled back by the turn distance along the approach
    assert_eq!(boundaries[0].anchor(), Vec2::new(0.0, 8.0));
    assert!(boundaries[0].has_crossed(Vec2::new(0.0, 9.0)));
    assert!(!boundaries[0].has_crossed(Vec2::new(0.0, 7.0)));
    // The finish line passes through the goal
    assert_eq!(boundaries[1].anchor(), Vec2::new(10.0, 10.0));
}

// ============================================================================
// Slow-down index
// ============================================================================

#[test]
fn test_slow_down_index_on_long_path() {
    let look_points: Vec<Vec3> = (0..=20).map(|z| Vec3::new(0.0, 0.0, z as f32)).collect();
    let index = slow_down_index(&look_points, 5.0);
    assert_eq!(index, 15);
    assert!(look_points[index].distance(look_points[20]) >= 5.0);
}

#[test]
fn test_slow_down_index_on_short_path() {
    let look_points = [Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0), Vec3::new(2.0, 0.0, 0.0)];
    assert_eq!(slow_down_index(&look_points, 5.0), 0);
    assert_eq!(slow_down_index(&look_points[..1], 5.0), 0);
    assert_eq!(slow_down_index(&[], 5.0), 0);
}

#[test]
fn test_path_requires_points() {
    assert!(Path::new(Vec::new(), Vec3::ZERO, 1.0, 1.0).is_none());

    let path = Path::new(vec![Vec3::new(0.0, 0.0, 3.0)], Vec3::ZERO, 1.0, 1.0).unwrap();
    assert_eq!(path.finish_line_index(), 0);
    assert_eq!(path.goal(), Vec3::new(0.0, 0.0, 3.0));
    assert_eq!(path.turn_boundaries().len(), 1);
}

// ============================================================================
// Cursor
// ============================================================================

fn straight_path() -> Path {
    Path::new(
        vec![Vec3::new(0.0, 0.0, 5.0), Vec3::new(0.0, 0.0, 10.0)],
        Vec3::ZERO,
        1.0,
        3.0,
    )
    .unwrap()
}

#[test]
fn test_cursor_advances_past_boundaries() {
    let path = straight_path();
    assert_eq!(path.slow_down_index(), 1);

    let mut cursor = PathCursor::new();
    assert_eq!(cursor.advance(&path, Vec3::new(0.0, 0.0, 2.0)), CursorState::Following { index: 0 });
    assert_eq!(cursor.target(&path), Some(Vec3::new(0.0, 0.0, 5.0)));

    assert_eq!(cursor.advance(&path, Vec3::new(0.0, 0.0, 4.5)), CursorState::Following { index: 1 });
    assert_eq!(cursor.target(&path), Some(Vec3::new(0.0, 0.0, 10.0)));

    assert_eq!(cursor.advance(&path, Vec3::new(0.0, 0.0, 10.5)), CursorState::Finished);
    assert!(cursor.is_finished());
    assert_eq!(cursor.target(&path), None);
}

#[test]
fn test_cursor_skips_several_boundaries_at_once() {
    let path = straight_path();
    let mut cursor = PathCursor::new();
    assert_eq!(cursor.advance(&path, Vec3::new(0.0, 0.0, 11.0)), CursorState::Finished);
}

#[test]
fn test_cursor_speed_ramps_down() {
    let path = straight_path();
    let mut cursor = PathCursor::new();

    cursor.update(&path, Vec3::new(0.0, 0.0, 2.0), 3.0);
    assert_eq!(cursor.current_speed(), 1.0);

    cursor.update(&path, Vec3::new(0.0, 0.0, 4.5), 3.0);
    assert_eq!(cursor.index(), 1);
    assert_eq!(cursor.current_speed(), 1.0);

    cursor.update(&path, Vec3::new(0.0, 0.0, 8.5), 3.0);
    assert!(approx(cursor.current_speed(), 0.5));

    // Zero stopping distance disables the ramp
    assert_eq!(cursor.speed_percent(&path, Vec3::new(0.0, 0.0, 9.9), 0.0), 1.0);

    assert_eq!(cursor.update(&path, Vec3::new(0.0, 0.0, 9.99), 3.0), CursorState::Finished);
    assert_eq!(cursor.current_speed(), 0.0);
}

// ============================================================================
// Repath timer
// ============================================================================

#[test]
fn test_repath_waits_for_initial_delay() {
    let mut timer = RepathTimer::default();
    let target = Vec3::new(3.0, 0.0, 3.0);

    assert!(!timer.tick(0.1, target));
    assert!(!timer.tick(0.1, target));
    assert!(timer.tick(0.15, target));
    assert_eq!(timer.last_target(), Some(target));
}

#[test]
fn test_repath_needs_interval_and_displacement() {
    let mut timer = RepathTimer::default();
    let target = Vec3::ZERO;
    assert!(timer.tick(0.5, target));

    // Moved far, but the interval has not elapsed
    assert!(!timer.tick(0.1, Vec3::new(2.0, 0.0, 0.0)));
    // Interval elapsed and target moved beyond the threshold
    assert!(timer.tick(0.15, Vec3::new(2.0, 0.0, 0.0)));

    // Small move is ignored
    assert!(!timer.tick(0.25, Vec3::new(2.3, 0.0, 0.0)));
    // Drift accumulates against the last requested position
    assert!(timer.tick(0.25, Vec3::new(2.6, 0.0, 0.0)));
}

#[test]
fn test_repath_ignores_vertical_target_motion() {
    let mut timer = RepathTimer::default();
    assert!(timer.tick(0.5, Vec3::new(1.0, 0.0, 1.0)));

    // Bouncing straight up does not change the route
    assert!(!timer.tick(0.25, Vec3::new(1.0, 4.0, 1.0)));
    assert!(timer.tick(0.25, Vec3::new(1.0, 4.0, 2.0)));
}

#[test]
fn test_repath_policy_from_navigation_config() {
    let config = NavigationConfig {
        repath_initial_delay: 1.5,
        repath_interval: 0.75,
        repath_move_threshold: 2.0,
        ..Default::default()
    };
    let policy = RepathPolicy::from(&config);
    assert_eq!(policy, RepathPolicy { initial_delay: 1.5, interval: 0.75, move_threshold: 2.0 });
}

#[test]
fn test_repath_invalidate_forces_request() {
    let mut timer = RepathTimer::new(RepathPolicy { initial_delay: 1.0, interval: 1.0, move_threshold: 10.0 });
    assert!(timer.tick(1.0, Vec3::ZERO));
    assert!(!timer.tick(1.0, Vec3::ZERO));

    timer.invalidate();
    assert!(timer.tick(0.0, Vec3::ZERO));
}
