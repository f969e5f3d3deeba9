//! The sync session state machine.
//!
//! ```text
//!                  create_group
//!        Idle ---------------------> Hosting
//!         |  ^                          |
//!         |  | timeout / leave_group    | leave_group
//!         v  |                          v
//!      Joining --beacon--> Connecting --peer up--> Joined
//!                                                   |  ^
//!                                     roster empty  |  | peer up
//!                                                   v  |
//!                                               Disconnected
//! ```
//!
//! The session owns no sockets and runs no tasks. It consumes
//! [`SyncEvent`]s (from the transport or from tests), emits
//! [`SyncCommand`]s, and pushes every accepted launch - local or remote -
//! into the engine's channel. That separation keeps the whole protocol
//! testable without a network.

use crossbeam_channel::Sender;
use tokio::sync::mpsc::UnboundedSender;

use std::sync::Arc;

use skyshell_shared::constants::{JOIN_TIMEOUT, LAUNCH_LEAD_TIME};
use skyshell_shared::{decode_launch, encode_launch, LaunchEvent, ShellDefinition, Vec3};

use crate::error::SyncError;
use crate::group::{PeerGroup, PeerId};

/// Instructions the session issues to the transport driver.
#[derive(Clone, Debug, PartialEq)]
pub enum SyncCommand {
    /// Start advertising a hosted group under its name.
    Advertise {
        /// The group name to put in the discovery metadata.
        group_name: String,
    },
    /// Stop advertising.
    StopAdvertising,
    /// Start listening for group beacons.
    Browse,
    /// Stop listening for beacons and forget discovered peers.
    StopBrowsing,
    /// Open a connection to a discovered peer.
    Connect {
        /// The peer to connect to.
        peer: PeerId,
    },
    /// Drop all peer connections.
    Disconnect,
    /// Send an encoded launch message to every connected peer.
    Broadcast {
        /// The wire payload.
        payload: Vec<u8>,
    },
}

/// Things that happen to the session, reported by the transport.
#[derive(Clone, Debug)]
pub enum SyncEvent {
    /// A beacon for a hosted group arrived.
    BeaconReceived {
        /// The advertising peer.
        peer: PeerId,
        /// The group name from the beacon's metadata.
        group_name: String,
    },
    /// A previously discovered peer stopped advertising.
    PeerLost {
        /// The silent peer.
        peer: PeerId,
    },
    /// A peer asked to connect. Always accepted.
    InviteReceived {
        /// The inviting peer.
        peer: PeerId,
    },
    /// A peer connection is up.
    PeerConnected {
        /// The connected peer.
        peer: PeerId,
    },
    /// A peer connection dropped.
    PeerDisconnected {
        /// The departed peer.
        peer: PeerId,
    },
    /// A launch message arrived from a peer.
    MessageReceived {
        /// The sending peer.
        peer: PeerId,
        /// The raw wire payload.
        payload: Vec<u8>,
    },
    /// Periodic heartbeat carrying the current time, epoch seconds.
    Tick {
        /// Current wall-clock time.
        now: f64,
    },
}

/// Where the session currently stands.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SessionState {
    /// Not in any group. Launches still fire locally.
    Idle,
    /// Hosting a group and advertising it.
    Hosting,
    /// Browsing for a named group, up to a deadline.
    Joining {
        /// Epoch seconds after which the join attempt is abandoned.
        deadline: f64,
    },
    /// Found the host, connection in flight, same deadline applies.
    Connecting {
        /// Epoch seconds after which the join attempt is abandoned.
        deadline: f64,
    },
    /// Member of a group; launches are broadcast.
    Joined,
    /// Still a member, but every peer connection has dropped. Launches
    /// fire locally only. There is no automatic reconnection; a peer
    /// connecting back in restores [`SessionState::Joined`].
    Disconnected,
}

/// Peer-synchronization session.
///
/// One per application. Launches accepted here - whether typed in locally
/// or decoded off the wire - all leave through the same channel into the
/// simulation engine, which enforces the scheduled fire instant.
pub struct SyncSession {
    state: SessionState,
    group: Option<PeerGroup>,
    /// Peers seen advertising, by group name. Cleared when browsing stops.
    discovered: Vec<(PeerId, String)>,
    commands: UnboundedSender<SyncCommand>,
    launches: Sender<LaunchEvent>,
}

impl SyncSession {
    /// Creates a session wired to a transport command channel and the
    /// engine's launch channel.
    #[must_use]
    pub fn new(commands: UnboundedSender<SyncCommand>, launches: Sender<LaunchEvent>) -> Self {
        Self {
            state: SessionState::Idle,
            group: None,
            discovered: Vec::new(),
            commands,
            launches,
        }
    }

    /// Current session state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The current group, if any.
    #[must_use]
    pub fn group(&self) -> Option<&PeerGroup> {
        self.group.as_ref()
    }

    /// Hosts currently advertising, as `(peer, group name)` pairs.
    ///
    /// This is the joinable list a UI renders. Entries appear on beacons
    /// and disappear on beacon timeout; the whole cache is cleared when
    /// browsing stops.
    #[must_use]
    pub fn available_groups(&self) -> &[(PeerId, String)] {
        &self.discovered
    }

    /// The group's shared world-space origin, if one has been agreed.
    #[must_use]
    pub fn group_origin(&self) -> Option<Vec3> {
        self.group.as_ref().and_then(PeerGroup::origin)
    }

    /// Records the shared world-space origin of the current group.
    ///
    /// No-op outside a group; the origin lives and dies with membership
    /// and is dropped by [`leave_group`](Self::leave_group).
    pub fn set_group_origin(&mut self, origin: Vec3) {
        if let Some(group) = &mut self.group {
            group.set_origin(origin);
        }
    }

    /// Hosts a new group and starts advertising it.
    ///
    /// Any previous group membership is torn down first.
    ///
    /// # Errors
    ///
    /// [`SyncError::ChannelClosed`] if the transport is gone.
    pub fn create_group(&mut self, name: &str) -> Result<(), SyncError> {
        self.leave_group();
        tracing::info!(group = name, "hosting group");
        self.command(SyncCommand::Advertise {
            group_name: name.to_string(),
        })?;
        self.group = Some(PeerGroup::hosting(name));
        self.state = SessionState::Hosting;
        Ok(())
    }

    /// Joins a named group.
    ///
    /// If a host advertising `name` is already in the discovered cache,
    /// the connection starts immediately; otherwise the session browses
    /// and connects on the first matching beacon. A join that has not
    /// connected within the join timeout falls back to
    /// [`SessionState::Idle`] on a later tick.
    ///
    /// # Errors
    ///
    /// [`SyncError::ChannelClosed`] if the transport is gone.
    pub fn join_group(&mut self, name: &str, now: f64) -> Result<(), SyncError> {
        let known_host = self
            .discovered
            .iter()
            .find(|(_, group)| group == name)
            .map(|(peer, _)| peer.clone());
        self.leave_group();
        tracing::info!(group = name, "joining group");
        self.command(SyncCommand::Browse)?;

        let mut group = PeerGroup::joining(name);
        let deadline = now + JOIN_TIMEOUT;
        if let Some(peer) = known_host {
            tracing::info!(%peer, group = name, "host already discovered, connecting");
            self.command(SyncCommand::Connect { peer: peer.clone() })?;
            group.peer_connecting(peer);
            self.state = SessionState::Connecting { deadline };
        } else {
            self.state = SessionState::Joining { deadline };
        }
        self.group = Some(group);
        Ok(())
    }

    /// Leaves the current group, if any.
    ///
    /// Stops advertising and browsing, drops peer connections and forgets
    /// discovered peers. Launches already handed to the engine are not
    /// recalled; a shell in flight still bursts.
    pub fn leave_group(&mut self) {
        if self.group.is_none() && self.state == SessionState::Idle {
            return;
        }
        if let Some(group) = &self.group {
            tracing::info!(group = group.name(), "leaving group");
        }
        // Best effort: a closed transport channel means there is nothing
        // left to stop.
        let _ = self.commands.send(SyncCommand::StopAdvertising);
        let _ = self.commands.send(SyncCommand::StopBrowsing);
        let _ = self.commands.send(SyncCommand::Disconnect);
        self.group = None;
        self.discovered.clear();
        self.state = SessionState::Idle;
    }

    /// Schedules a launch locally and broadcasts it to the group.
    ///
    /// The fire instant is `now` plus a fixed lead time, giving the
    /// message time to reach peers so everyone fires together. The local
    /// launch is scheduled first and survives any broadcast failure:
    /// solo play must never depend on the network.
    ///
    /// # Errors
    ///
    /// [`SyncError::ChannelClosed`] if the engine's launch channel is
    /// gone; [`SyncError::Protocol`] if the shell failed to encode (the
    /// local launch is already scheduled in that case).
    pub fn send_launch(
        &self,
        shell: Option<Arc<ShellDefinition>>,
        origin: Vec3,
        now: f64,
    ) -> Result<(), SyncError> {
        let event = LaunchEvent::new(shell, origin, now + LAUNCH_LEAD_TIME);
        self.launches
            .send(event.clone())
            .map_err(|_| SyncError::ChannelClosed("simulation engine"))?;

        let connected = self
            .group
            .as_ref()
            .map_or(0, PeerGroup::connected_count);
        if connected > 0 {
            let payload = encode_launch(&event)?;
            tracing::debug!(
                peers = connected,
                scheduled_at = event.scheduled_at,
                "broadcasting launch"
            );
            self.command(SyncCommand::Broadcast { payload })?;
        }
        Ok(())
    }

    /// Feeds one transport event into the state machine.
    pub fn handle_event(&mut self, event: SyncEvent) {
        match event {
            SyncEvent::BeaconReceived { peer, group_name } => {
                self.on_beacon(peer, group_name);
            }
            SyncEvent::PeerLost { peer } => {
                self.discovered.retain(|(p, _)| *p != peer);
            }
            SyncEvent::InviteReceived { peer } => {
                // Invitations are always accepted; the transport has
                // already let the connection through.
                tracing::info!(%peer, "peer invited, accepting");
            }
            SyncEvent::PeerConnected { peer } => self.on_peer_connected(peer),
            SyncEvent::PeerDisconnected { peer } => self.on_peer_disconnected(&peer),
            SyncEvent::MessageReceived { peer, payload } => {
                self.on_message(&peer, &payload);
            }
            SyncEvent::Tick { now } => self.on_tick(now),
        }
    }

    fn on_beacon(&mut self, peer: PeerId, group_name: String) {
        // A host that re-creates its group under a new name keeps the
        // same endpoint; the listing must follow the latest beacon.
        if let Some(entry) = self.discovered.iter_mut().find(|(p, _)| *p == peer) {
            if entry.1 != group_name {
                tracing::debug!(%peer, group = %group_name, was = %entry.1, "host renamed group");
                entry.1 = group_name.clone();
            }
        } else {
            tracing::debug!(%peer, group = %group_name, "discovered host");
            self.discovered.push((peer.clone(), group_name.clone()));
        }
        let SessionState::Joining { deadline } = self.state else {
            return;
        };
        let wanted = self.group.as_ref().map(PeerGroup::name);
        if wanted != Some(group_name.as_str()) {
            return;
        }
        tracing::info!(%peer, group = %group_name, "found host, connecting");
        if self.command(SyncCommand::Connect { peer: peer.clone() }).is_err() {
            return;
        }
        if let Some(group) = &mut self.group {
            group.peer_connecting(peer);
        }
        self.state = SessionState::Connecting { deadline };
    }

    fn on_peer_connected(&mut self, peer: PeerId) {
        let Some(group) = &mut self.group else {
            tracing::warn!(%peer, "peer connected outside any group, ignoring");
            return;
        };
        group.peer_connected(peer.clone());
        tracing::info!(%peer, group = group.name(), "peer connected");
        if matches!(
            self.state,
            SessionState::Connecting { .. } | SessionState::Disconnected
        ) {
            self.state = SessionState::Joined;
        }
    }

    fn on_peer_disconnected(&mut self, peer: &PeerId) {
        let Some(group) = &mut self.group else { return };
        if !group.peer_disconnected(peer) {
            return;
        }
        tracing::info!(%peer, "peer left group");
        // A joiner with an empty roster has no one left to sync with and
        // must not keep reporting itself joined. A host just has an empty
        // group, which is its normal starting condition.
        if !group.is_host()
            && group.connected_count() == 0
            && self.state == SessionState::Joined
        {
            tracing::warn!(group = group.name(), "all peers gone, group disconnected");
            self.state = SessionState::Disconnected;
        }
    }

    fn on_message(&mut self, peer: &PeerId, payload: &[u8]) {
        match decode_launch(payload) {
            Ok(event) => {
                tracing::debug!(%peer, scheduled_at = event.scheduled_at, "launch received");
                if self.launches.send(event).is_err() {
                    tracing::warn!("simulation engine gone, dropping remote launch");
                }
            }
            Err(err) => {
                // Drop and log; a bad peer must not take the show down.
                tracing::warn!(%peer, error = %err, "dropping malformed launch message");
            }
        }
    }

    fn on_tick(&mut self, now: f64) {
        let deadline = match self.state {
            SessionState::Joining { deadline } | SessionState::Connecting { deadline } => deadline,
            _ => return,
        };
        if now >= deadline {
            let group = self.group.as_ref().map_or("?", PeerGroup::name).to_string();
            tracing::warn!(group = %group, "join timed out, returning to idle");
            self.leave_group();
        }
    }

    fn command(&self, command: SyncCommand) -> Result<(), SyncError> {
        self.commands
            .send(command)
            .map_err(|_| SyncError::ChannelClosed("transport"))
    }
}
