//! The live particle representation.

use std::sync::Arc;

use skyshell_shared::{Color, ShellDefinition, Vec3};

/// What a particle currently is.
#[derive(Clone, Debug)]
pub enum ParticleKind {
    /// An ascending shell before explosion. Carries the shell it will
    /// explode into; `None` means the default-firework fallback already
    /// handled the burst and this riser should never exist (see
    /// `SimulationEngine::spawn_riser`).
    Riser {
        /// Shell payload consumed at explosion time.
        shell: Option<Arc<ShellDefinition>>,
    },
    /// A burst fragment after explosion, subject to gravity.
    Star,
}

/// One live particle.
///
/// Invariants:
/// - `remaining_lifetime` never increases within a tick sequence.
/// - A riser converts to stars exactly once, at the tick its lifetime
///   first reaches zero.
/// - A star never carries a shell payload.
#[derive(Clone, Debug)]
pub struct Particle {
    /// World position, metres.
    pub position: Vec3,
    /// Velocity, metres per second.
    pub velocity: Vec3,
    /// Render tint.
    pub color: Color,
    /// Quad size, metres.
    pub size: f32,
    /// Seconds until removal (or explosion, for a riser).
    pub remaining_lifetime: f32,
    /// Riser or star.
    pub kind: ParticleKind,
}

impl Particle {
    /// Whether this particle survives the current tick.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.remaining_lifetime > 0.0
    }

    /// Whether this is a riser.
    #[must_use]
    pub fn is_riser(&self) -> bool {
        matches!(self.kind, ParticleKind::Riser { .. })
    }

    /// Whether this is a star.
    #[must_use]
    pub fn is_star(&self) -> bool {
        matches!(self.kind, ParticleKind::Star)
    }
}
