//! # SKYSHELL
//!
//! Peer-synchronized AR firework shows. This crate is the thin waist of
//! the workspace: it owns one of everything and routes between them.
//!
//! ```text
//! camera pose ──> on_camera_update ─┐
//! user tap ─────> launch ───────────┤
//! sync events ──> on_sync_event ────┼──> FireworkSession
//!                                   │        │
//!                 render tick ──────┘        ├──> RenderFrame
//!                                            └──> SyncCommands (transport)
//! ```
//!
//! Threading follows the single-writer rule: the render-tick thread is
//! the only caller of [`FireworkSession::on_render_tick`] and therefore
//! the only particle writer. Camera updates and sync events may arrive
//! from any thread.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod input;
pub mod session;

pub use input::launch_position;
pub use session::{FireworkSession, SessionConfig};
