//! # Launch Events
//!
//! A `LaunchEvent` is a scheduled, possibly network-distributed instruction
//! to spawn a riser at a specific time and position. Producers (the local
//! tap handler, the sync session) push events into a channel; the
//! simulation engine drains that channel once per tick and fires each event
//! exactly once when its instant has passed.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::math::Vec3;
use crate::shell::ShellDefinition;

/// Current wall-clock time as fractional seconds since the Unix epoch.
///
/// This is the time base all peers schedule against. There is no clock-skew
/// correction between devices; synchrony relies on their wall clocks
/// agreeing closely.
#[must_use]
pub fn epoch_seconds() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

/// A scheduled firework launch.
///
/// Transient: created on user input or message receipt, consumed exactly
/// once by the simulation engine when `now >= scheduled_at`.
#[derive(Clone, Debug, PartialEq)]
pub struct LaunchEvent {
    /// The shell to explode into, or `None` for the default firework.
    pub shell: Option<Arc<ShellDefinition>>,
    /// Launch origin, group-relative.
    pub origin: Vec3,
    /// Absolute fire instant, in epoch seconds.
    pub scheduled_at: f64,
}

impl LaunchEvent {
    /// Creates a launch event firing at `scheduled_at`.
    #[must_use]
    pub fn new(shell: Option<Arc<ShellDefinition>>, origin: Vec3, scheduled_at: f64) -> Self {
        Self {
            shell,
            origin,
            scheduled_at,
        }
    }

    /// Whether this event is due at time `now`.
    #[must_use]
    pub fn is_due(&self, now: f64) -> bool {
        now >= self.scheduled_at
    }
}
