//! # SKYSHELL Render Pipeline
//!
//! Turns the live particle set into camera-facing quads.
//!
//! ## Architecture
//!
//! ```text
//! camera feed ──> CameraState (by-value publish, one writer)
//!                      │
//! particle set ────────┼──> build_frame ──> RenderFrame (CPU)
//!                      │         │
//!                      ▼         ▼
//!               billboard mvp   ParticleRenderer (wgpu, one draw/quad)
//! ```
//!
//! ## Redraw policy
//!
//! Redraws are chained, not clocked: after each frame, another redraw is
//! requested only while particles remain. An idle scene costs nothing.
//!
//! ## Pipeline invariants
//!
//! - Blending: SrcAlpha / OneMinusSrcAlpha, color and alpha.
//! - Depth test Less, depth writes disabled.
//! - One draw call per particle, MVP as a per-draw uniform.
//!
//! Failure to acquire a device, queue, shader or pipeline at setup time is
//! fatal and aborts initialization. There is no per-frame failure path.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod billboard;
pub mod camera;
pub mod frame;
pub mod pipeline;
pub mod quad;

pub use billboard::{billboard_rotation, model_matrix, mvp_matrix};
pub use camera::{CameraMatrices, CameraState};
pub use frame::{build_frame, DrawCommand, FrameStats, RenderFrame};
pub use pipeline::{GpuContext, ParticleRenderer, RenderSetupError};
pub use quad::{particle_quad, ParticleVertex};
