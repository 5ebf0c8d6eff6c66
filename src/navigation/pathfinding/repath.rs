use bevy::math::Vec3;

use crate::navigation::config::NavigationConfig;
use crate::navigation::math::plane_distance_squared;

/// When a seeker asks for a new path to a moving target.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RepathPolicy {
    /// Wait before the first request, so the scene can settle.
    pub initial_delay: f32,
    /// Minimum seconds between displacement checks.
    pub interval: f32,
    /// How far the target must move on the ground plane before a new
    /// request is sent.
    pub move_threshold: f32,
}

impl Default for RepathPolicy {
    fn default() -> Self {
        Self {
            initial_delay: 0.3,
            interval: 0.2,
            move_threshold: 0.5,
        }
    }
}

impl From<&NavigationConfig> for RepathPolicy {
    fn from(config: &NavigationConfig) -> Self {
        Self {
            initial_delay: config.repath_initial_delay,
            interval: config.repath_interval,
            move_threshold: config.repath_move_threshold,
        }
    }
}

/// Interval scheduler deciding when to resubmit a path request.
///
/// The first request fires once `initial_delay` has elapsed. After that the
/// target is checked every `interval` seconds, and a request fires only
/// when it has moved further than `move_threshold` since the last one.
#[derive(Clone, Debug, PartialEq)]
pub struct RepathTimer {
    policy: RepathPolicy,
    elapsed: f32,
    last_target: Option<Vec3>,
}

impl RepathTimer {
    pub fn new(policy: RepathPolicy) -> Self {
        Self {
            policy,
            elapsed: 0.0,
            last_target: None,
        }
    }

    pub fn policy(&self) -> &RepathPolicy {
        &self.policy
    }

    pub fn set_policy(&mut self, policy: RepathPolicy) {
        self.policy = policy;
    }

    /// Target position of the last request, if one has been sent.
    pub fn last_target(&self) -> Option<Vec3> {
        self.last_target
    }

    /// Request again on the next check regardless of displacement.
    pub fn invalidate(&mut self) {
        self.last_target = None;
        self.elapsed = self.policy.initial_delay;
    }

    /// Advance by `dt` seconds; true when a request should be sent now.
    pub fn tick(&mut self, dt: f32, target: Vec3) -> bool {
        self.elapsed += dt;

        let Some(previous) = self.last_target else {
            if self.elapsed < self.policy.initial_delay {
                return false;
            }
            self.elapsed = 0.0;
            self.last_target = Some(target);
            return true;
        };

        if self.elapsed < self.policy.interval {
            return false;
        }
        self.elapsed = 0.0;

        let threshold = self.policy.move_threshold * self.policy.move_threshold;
        if plane_distance_squared(target, previous) > threshold {
            self.last_target = Some(target);
            true
        } else {
            false
        }
    }
}

impl Default for RepathTimer {
    fn default() -> Self {
        Self::new(RepathPolicy::default())
    }
}
