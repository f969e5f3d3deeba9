//! # SKYSHELL Simulation Engine
//!
//! Real-time pyrotechnic particle simulation.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   LaunchEvent    ┌─────────────────────────────┐
//! │ Tap handler  │─────channel─────>│     SimulationEngine        │
//! ├──────────────┤                  │                             │
//! │ Sync session │─────channel─────>│  pending ─> risers ─> stars │
//! └──────────────┘                  │        step_frame(dt, now)  │
//!                                   └──────────────┬──────────────┘
//!                                                  │ particles
//!                                                  ▼
//!                                            render pipeline
//! ```
//!
//! ## State machine
//!
//! ```text
//! Riser --(lifetime <= 0, has shell)--> { Star... }
//! Riser --(lifetime <= 0, no shell)---> removed (fallback burst effect)
//! Star  --(lifetime <= 0)-------------> removed
//! ```
//!
//! Each tick rebuilds the particle set from scratch, so a riser can never
//! explode twice. None of the operations here are fallible.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod burst;
pub mod engine;
pub mod particle;

pub use burst::explode;
pub use engine::{BurstEffect, SimConfig, SimStats, SimulationEngine};
pub use particle::{Particle, ParticleKind};
