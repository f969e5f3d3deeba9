//! The simulation engine: owns the live particle set and advances it.

use std::sync::Arc;

use crossbeam_channel::{unbounded, Receiver, Sender};
use rand::rngs::StdRng;
use rand::SeedableRng;

use skyshell_shared::constants::{
    DEFAULT_BURST_COUNT, DEFAULT_BURST_SPEED, DEFAULT_BURST_SPEED_VARIATION, GRAVITY,
    LAUNCH_DURATION, RISER_COLOR, RISER_SIZE, RISER_VELOCITY,
};
use skyshell_shared::{LaunchEvent, ShellDefinition, Vec3};

use crate::burst::explode;
use crate::particle::{Particle, ParticleKind};

/// Engine configuration.
#[derive(Clone, Debug)]
pub struct SimConfig {
    /// Seed for the burst jitter source. Fixed seed, reproducible bursts.
    pub seed: u64,
    /// Initial capacity of the particle vector.
    pub particle_capacity: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 0x5359_5348,
            particle_capacity: 4096,
        }
    }
}

/// A request for the platform burst-emitter primitive.
///
/// Emitted instead of a tracked riser when a launch has no shell
/// definition. The render collaborator owns what happens with it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BurstEffect {
    /// Burst origin, world space.
    pub position: Vec3,
    /// Particle count of the emitter.
    pub count: u32,
    /// Mean particle speed, m/s.
    pub speed: f32,
    /// Speed variation, m/s.
    pub speed_variation: f32,
}

/// Counters kept by the engine.
#[derive(Clone, Copy, Debug, Default)]
pub struct SimStats {
    /// Live risers after the last tick.
    pub live_risers: u32,
    /// Live stars after the last tick.
    pub live_stars: u32,
    /// Risers spawned since construction.
    pub risers_spawned: u64,
    /// Explosions performed since construction.
    pub explosions: u64,
    /// Stars created since construction.
    pub stars_spawned: u64,
    /// Default-firework fallbacks requested since construction.
    pub fallback_bursts: u64,
}

/// The particle simulation engine.
///
/// Single-writer: exactly one thread owns this value and calls
/// [`step_frame`](Self::step_frame). Producers on other threads push
/// [`LaunchEvent`]s through the channel handed out by
/// [`launch_sender`](Self::launch_sender); the engine drains it once per
/// tick in arrival order and fires each event on the first tick where its
/// instant has passed.
pub struct SimulationEngine {
    /// Live particles. Rebuilt from scratch every tick.
    particles: Vec<Particle>,
    /// Launch events whose fire instant has not arrived yet.
    pending: Vec<LaunchEvent>,
    /// Producer side of the launch queue, cloned out to input and sync.
    launch_tx: Sender<LaunchEvent>,
    /// Engine side of the launch queue.
    launch_rx: Receiver<LaunchEvent>,
    /// Fallback burst requests awaiting the render collaborator.
    effects: Vec<BurstEffect>,
    /// Jitter source for bursts.
    rng: StdRng,
    /// Counters.
    stats: SimStats,
}

impl SimulationEngine {
    /// Creates an engine from a config.
    #[must_use]
    pub fn new(config: &SimConfig) -> Self {
        let (launch_tx, launch_rx) = unbounded();
        Self {
            particles: Vec::with_capacity(config.particle_capacity),
            pending: Vec::new(),
            launch_tx,
            launch_rx,
            effects: Vec::new(),
            rng: StdRng::seed_from_u64(config.seed),
            stats: SimStats::default(),
        }
    }

    /// A producer handle for the launch queue.
    ///
    /// Safe to clone and hand to any thread; events are consumed by the
    /// owner thread on its next tick.
    #[must_use]
    pub fn launch_sender(&self) -> Sender<LaunchEvent> {
        self.launch_tx.clone()
    }

    /// Spawns a riser at `origin` ascending toward its burst.
    ///
    /// With a shell, the riser carries it as payload and explodes when its
    /// charge expires. Without one, the engine instead requests the
    /// platform burst-emitter primitive - a deliberate simplification for
    /// the "no custom shell available" case - and tracks no particle.
    pub fn spawn_riser(&mut self, origin: Vec3, shell: Option<Arc<ShellDefinition>>) {
        match shell {
            Some(shell) => {
                tracing::debug!(shell = %shell.name, ?origin, "spawning riser");
                self.stats.risers_spawned += 1;
                self.particles.push(Particle {
                    position: origin,
                    velocity: RISER_VELOCITY,
                    color: RISER_COLOR,
                    size: RISER_SIZE,
                    remaining_lifetime: LAUNCH_DURATION,
                    kind: ParticleKind::Riser { shell: Some(shell) },
                });
            }
            None => {
                tracing::debug!(?origin, "no shell available, requesting default burst");
                self.stats.fallback_bursts += 1;
                self.effects.push(BurstEffect {
                    position: origin,
                    count: DEFAULT_BURST_COUNT,
                    speed: DEFAULT_BURST_SPEED,
                    speed_variation: DEFAULT_BURST_SPEED_VARIATION,
                });
            }
        }
    }

    /// Advances the simulation by `dt` seconds at wall-clock time `now`
    /// (epoch seconds).
    ///
    /// Order per tick: drain the launch queue, fire due events, then
    /// integrate. The next frame's particle set is built from scratch, so
    /// a riser whose lifetime crosses zero this tick explodes exactly once
    /// and an expired star is dropped the same tick it expired on.
    pub fn step_frame(&mut self, dt: f32, now: f64) {
        while let Ok(event) = self.launch_rx.try_recv() {
            self.pending.push(event);
        }

        let pending = std::mem::take(&mut self.pending);
        for event in pending {
            if event.is_due(now) {
                self.spawn_riser(event.origin, event.shell);
            } else {
                self.pending.push(event);
            }
        }

        let previous = std::mem::take(&mut self.particles);
        let mut next = Vec::with_capacity(previous.len());
        for mut particle in previous {
            particle.remaining_lifetime -= dt;
            if particle.is_alive() {
                // Stars fall; risers ascend at constant charge velocity.
                if particle.is_star() {
                    particle.velocity += GRAVITY * dt;
                }
                particle.position += particle.velocity * dt;
                next.push(particle);
            } else if let ParticleKind::Riser { shell: Some(shell) } = particle.kind {
                let stars = explode(particle.position, &shell, &mut self.rng);
                tracing::debug!(shell = %shell.name, stars = stars.len(), "riser exploded");
                self.stats.explosions += 1;
                self.stats.stars_spawned += stars.len() as u64;
                next.extend(stars);
            }
        }
        self.particles = next;

        self.stats.live_risers = 0;
        self.stats.live_stars = 0;
        for particle in &self.particles {
            if particle.is_riser() {
                self.stats.live_risers += 1;
            } else {
                self.stats.live_stars += 1;
            }
        }
    }

    /// The live particle set, read by the render pipeline.
    #[must_use]
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Whether anything is animating or scheduled.
    ///
    /// Drives the conditional-redraw policy: while this is false the
    /// render pipeline goes idle.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.particles.is_empty() || !self.pending.is_empty()
    }

    /// Takes all pending fallback burst requests.
    pub fn drain_effects(&mut self) -> Vec<BurstEffect> {
        std::mem::take(&mut self.effects)
    }

    /// Current counters.
    #[must_use]
    pub fn stats(&self) -> SimStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skyshell_shared::constants::{EXPLOSION_SPEED, STAR_LIFETIME};
    use skyshell_shared::{Color, StarLayout, StarShape, Vec2};

    fn shell(stars: usize) -> Arc<ShellDefinition> {
        Arc::new(ShellDefinition {
            name: "ring".to_string(),
            stars: (0..stars)
                .map(|i| {
                    #[allow(clippy::cast_precision_loss)]
                    let angle = i as f32 / stars as f32 * std::f32::consts::TAU;
                    StarLayout {
                        position: Vec2::new(angle.cos() * 80.0, angle.sin() * 80.0),
                        color: Color::WHITE,
                        shape: StarShape::Circle,
                        size: 4.0,
                    }
                })
                .collect(),
            shell_radius: 80.0,
        })
    }

    #[test]
    fn test_riser_explodes_exactly_once() {
        let mut engine = SimulationEngine::new(&SimConfig::default());
        engine.spawn_riser(Vec3::ZERO, Some(shell(8)));
        assert_eq!(engine.stats().live_risers, 0); // stats update on tick

        let dt = 0.75;
        let mut elapsed = 0.0;
        let mut exploded_at_tick = None;
        for tick in 1..20 {
            engine.step_frame(dt, 0.0);
            elapsed += dt;
            if engine.stats().explosions == 1 && exploded_at_tick.is_none() {
                exploded_at_tick = Some((tick, elapsed));
            }
        }

        let (_, at_elapsed) = exploded_at_tick.expect("riser never exploded");
        // First tick where cumulative elapsed time >= LAUNCH_DURATION.
        assert!(at_elapsed >= LAUNCH_DURATION);
        assert!(at_elapsed - dt < LAUNCH_DURATION);
        assert_eq!(engine.stats().explosions, 1);
        assert_eq!(engine.stats().stars_spawned, 8);
    }

    #[test]
    fn test_riser_ascends_without_gravity() {
        let mut engine = SimulationEngine::new(&SimConfig::default());
        engine.spawn_riser(Vec3::ZERO, Some(shell(1)));

        let dt = 0.1;
        for _ in 0..10 {
            engine.step_frame(dt, 0.0);
        }
        let riser = &engine.particles()[0];
        assert!(riser.is_riser());
        // Constant ascent velocity the whole way up.
        assert!((riser.velocity.y - RISER_VELOCITY.y).abs() < 1e-5);
        assert!((riser.position.y - RISER_VELOCITY.y).abs() < 1e-4);
    }

    #[test]
    fn test_star_semi_implicit_euler() {
        let mut engine = SimulationEngine::new(&SimConfig::default());
        engine.spawn_riser(Vec3::ZERO, Some(shell(1)));

        // Run the riser to its burst.
        let dt = 0.5;
        while engine.stats().explosions == 0 {
            engine.step_frame(dt, 0.0);
        }
        let vy0 = engine.particles()[0].velocity.y;
        assert!((engine.particles()[0].velocity.length() - EXPLOSION_SPEED).abs() < 1e-3);

        let k = 3;
        let dt = 0.05;
        for _ in 0..k {
            engine.step_frame(dt, 0.0);
        }
        #[allow(clippy::cast_precision_loss)]
        let expected = vy0 + k as f32 * dt * GRAVITY.y;
        assert!((engine.particles()[0].velocity.y - expected).abs() < 1e-4);
    }

    #[test]
    fn test_star_removed_at_expiry() {
        let mut engine = SimulationEngine::new(&SimConfig::default());
        engine.spawn_riser(Vec3::ZERO, Some(shell(4)));
        while engine.stats().explosions == 0 {
            engine.step_frame(0.5, 0.0);
        }
        // Stars live STAR_LIFETIME; a little past that they are all gone.
        let ticks = (STAR_LIFETIME / 0.5).ceil() as usize + 1;
        for _ in 0..ticks {
            engine.step_frame(0.5, 0.0);
        }
        assert!(engine.particles().is_empty());
        assert!(!engine.is_active());
    }

    #[test]
    fn test_fallback_burst_without_shell() {
        let mut engine = SimulationEngine::new(&SimConfig::default());
        engine.spawn_riser(Vec3::new(0.0, 1.0, 0.0), None);

        assert!(engine.particles().is_empty());
        let effects = engine.drain_effects();
        assert_eq!(effects.len(), 1);
        assert_eq!(effects[0].count, DEFAULT_BURST_COUNT);
        assert!(engine.drain_effects().is_empty());
    }

    #[test]
    fn test_future_launch_waits_for_its_instant() {
        let mut engine = SimulationEngine::new(&SimConfig::default());
        let tx = engine.launch_sender();
        tx.send(LaunchEvent::new(Some(shell(2)), Vec3::ZERO, 100.0))
            .unwrap();

        engine.step_frame(0.016, 99.99);
        assert!(engine.particles().is_empty());
        assert!(engine.is_active()); // still scheduled

        engine.step_frame(0.016, 100.0);
        assert_eq!(engine.stats().risers_spawned, 1);
    }

    #[test]
    fn test_launches_fire_in_arrival_order() {
        let mut engine = SimulationEngine::new(&SimConfig::default());
        let tx = engine.launch_sender();
        tx.send(LaunchEvent::new(
            Some(shell(1)),
            Vec3::new(1.0, 0.0, 0.0),
            0.0,
        ))
        .unwrap();
        tx.send(LaunchEvent::new(
            Some(shell(1)),
            Vec3::new(2.0, 0.0, 0.0),
            0.0,
        ))
        .unwrap();

        engine.step_frame(0.0, 1.0);
        let xs: Vec<f32> = engine.particles().iter().map(|p| p.position.x).collect();
        assert_eq!(xs, vec![1.0, 2.0]);
    }
}
