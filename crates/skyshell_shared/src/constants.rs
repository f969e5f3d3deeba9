//! # Simulation & Protocol Constants
//!
//! Production configuration for the SKYSHELL core.
//!
//! **CRITICAL:** Every peer in a group must run with the same values.
//! Changes here require redeploying all devices.

use crate::math::{Color, Vec3};

// =============================================================================
// RISER CONFIGURATION
// =============================================================================

/// Height a riser reaches before its charge expires, in metres.
pub const LAUNCH_HEIGHT: f32 = 20.0;

/// Ascent time of a riser, in seconds. Also its lifetime.
pub const LAUNCH_DURATION: f32 = 5.0;

/// Fixed ascent velocity of a riser. Risers are propellant-driven and are
/// not affected by gravity during ascent.
pub const RISER_VELOCITY: Vec3 = Vec3::new(0.0, LAUNCH_HEIGHT / LAUNCH_DURATION, 0.0);

/// Render size of a riser quad, in metres.
pub const RISER_SIZE: f32 = 0.05;

/// Riser tint - a warm ember while ascending.
pub const RISER_COLOR: Color = Color::new(1.0, 0.85, 0.6, 1.0);

// =============================================================================
// STAR CONFIGURATION
// =============================================================================

/// Gravity applied to stars after the burst, in m/s^2.
pub const GRAVITY: Vec3 = Vec3::new(0.0, -9.8, 0.0);

/// Lifetime of a star after the burst, in seconds.
pub const STAR_LIFETIME: f32 = 2.0;

/// Speed of every star leaving the burst, in m/s.
pub const EXPLOSION_SPEED: f32 = 6.0;

/// Divisor that maps editor-canvas coordinates into the unit range.
/// The shell editor works in a +-100 point canvas.
pub const CANVAS_TO_UNIT: f32 = 100.0;

/// Half-range of the uniform random z offset mixed into each star
/// direction so a flat 2D layout gains visual depth.
pub const STAR_Z_JITTER: f32 = 0.2;

/// Conversion from editor-canvas star size (points) to world size (metres).
pub const STAR_SIZE_SCALE: f32 = 0.01;

// =============================================================================
// DEFAULT BURST (no custom shell available)
// =============================================================================

/// Particle count of the platform burst-emitter fallback.
pub const DEFAULT_BURST_COUNT: u32 = 800;

/// Speed of the fallback burst, in m/s.
pub const DEFAULT_BURST_SPEED: f32 = 8.0;

/// Speed variation of the fallback burst, in m/s.
pub const DEFAULT_BURST_SPEED_VARIATION: f32 = 2.0;

// =============================================================================
// SYNC CONFIGURATION
// =============================================================================

/// Lead time added to a launch timestamp before broadcast, in seconds.
///
/// Chosen to mask typical local-network delivery latency. This is a
/// heuristic, not a clock-synchronization protocol: peers whose wall
/// clocks disagree by more than this will visibly desynchronize.
pub const LAUNCH_LEAD_TIME: f64 = 0.010;

/// How long an unanswered join invitation is kept alive, in seconds.
pub const JOIN_TIMEOUT: f64 = 10.0;
