//! # SKYSHELL Shared
//!
//! Common types used by the simulation, render and sync crates.
//!
//! ## CRITICAL RULE
//!
//! This crate must NEVER depend on:
//! - `wgpu`
//! - Any GPU or window-related crate
//!
//! If you need graphics types, put them in `skyshell_render`.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod constants;
pub mod events;
pub mod math;
pub mod protocol;
pub mod shell;

pub use events::{epoch_seconds, LaunchEvent};
pub use math::{Color, Mat4, Vec2, Vec3, Vec4};
pub use protocol::{decode_launch, encode_launch, ProtocolError, GROUP_NAME_KEY, SERVICE_TYPE};
pub use shell::{ShellDefinition, StarLayout, StarShape};
