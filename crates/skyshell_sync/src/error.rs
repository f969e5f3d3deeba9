//! Sync error taxonomy.
//!
//! Deliberately small: almost every network fault is handled in place by
//! dropping the offending message or peer. Only faults the caller can act
//! on surface as errors.

use thiserror::Error;

use skyshell_shared::ProtocolError;

/// Errors surfaced to callers of the sync session.
#[derive(Error, Debug)]
pub enum SyncError {
    /// A launch failed to encode for broadcast. The local launch has
    /// already been scheduled when this is returned.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A channel endpoint was dropped; the named half of the system is
    /// gone and the session can no longer reach it.
    #[error("channel to {0} closed")]
    ChannelClosed(&'static str),
}
