//! # SKYSHELL SYNC - Peer-Synchronized Launch Scheduling
//!
//! Lets nearby devices fire the same firework at the same instant. One
//! device hosts a named group and advertises it; others browse, join, and
//! from then on every launch any member performs is broadcast with an
//! absolute fire time a short lead into the future, so all simulations
//! spawn the riser together.
//!
//! ## Architecture
//!
//! ```text
//!   user input                    network
//!       |                            |
//!       v                            v
//!  +---------------+   commands   +------------------+
//!  |  SyncSession  | -----------> | transport driver |
//!  | (state machine|   events     |  (tokio: UDP     |
//!  |  no IO, no    | <----------- |   beacons + TCP  |
//!  |  async)       |              |   frames)        |
//!  +---------------+              +------------------+
//!       |
//!       | LaunchEvent (crossbeam)
//!       v
//!  simulation engine
//! ```
//!
//! The session is a pure state machine: it consumes [`SyncEvent`]s, emits
//! [`SyncCommand`]s, and pushes decoded launches into the engine's channel.
//! All IO lives in [`transport`], which can be replaced wholesale (or, in
//! tests, bypassed by wiring two sessions' commands and events together).
//!
//! ## Failure policy
//!
//! Network faults degrade to solo play. A malformed message is dropped and
//! logged; a lost peer is removed from the roster; a join that finds no
//! host within the timeout falls back to idle. None of these ever stall
//! the simulation.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod group;
pub mod session;
pub mod transport;

pub use error::SyncError;
pub use group::{ConnectionState, PeerGroup, PeerId};
pub use session::{SessionState, SyncCommand, SyncEvent, SyncSession};
pub use transport::{run_transport, TransportConfig};
