//! Peer identity and group roster.
//!
//! A `PeerGroup` tracks one named launch group and the peers currently in
//! it. The roster is connection state only; what a peer *does* once
//! connected (send and receive launches) is the session's business.

use std::collections::HashMap;
use std::fmt;

use skyshell_shared::Vec3;

/// Opaque peer identity.
///
/// The transport uses the peer's reachable `ip:port` as the identity
/// string, so a `PeerId` received in a beacon can be handed straight back
/// in a connect command.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct PeerId(String);

impl PeerId {
    /// Wraps an identity string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identity string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Connection state of a peer within a group.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    /// An outbound connection is in flight.
    Connecting,
    /// The peer is reachable; launches flow both ways.
    Connected,
}

/// One named launch group and its member roster.
#[derive(Clone, Debug)]
pub struct PeerGroup {
    name: String,
    hosting: bool,
    peers: HashMap<PeerId, ConnectionState>,
    origin: Option<Vec3>,
}

impl PeerGroup {
    /// Creates a group this device hosts.
    #[must_use]
    pub fn hosting(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hosting: true,
            peers: HashMap::new(),
            origin: None,
        }
    }

    /// Creates a group this device is joining as a member.
    #[must_use]
    pub fn joining(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hosting: false,
            peers: HashMap::new(),
            origin: None,
        }
    }

    /// The shared world-space origin of the group, once agreed.
    ///
    /// Launch positions on the wire are relative to this point; input
    /// handling subtracts it from a local hit position before sending.
    #[must_use]
    pub fn origin(&self) -> Option<Vec3> {
        self.origin
    }

    /// Sets the shared origin.
    pub fn set_origin(&mut self, origin: Vec3) {
        self.origin = Some(origin);
    }

    /// The group's advertised name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this device hosts the group.
    #[must_use]
    pub fn is_host(&self) -> bool {
        self.hosting
    }

    /// Marks an outbound connection to `peer` as in flight.
    pub fn peer_connecting(&mut self, peer: PeerId) {
        self.peers.insert(peer, ConnectionState::Connecting);
    }

    /// Marks `peer` as connected.
    pub fn peer_connected(&mut self, peer: PeerId) {
        self.peers.insert(peer, ConnectionState::Connected);
    }

    /// Removes `peer` from the roster. Returns whether it was present.
    pub fn peer_disconnected(&mut self, peer: &PeerId) -> bool {
        self.peers.remove(peer).is_some()
    }

    /// Connection state of `peer`, if it is in the roster.
    #[must_use]
    pub fn state_of(&self, peer: &PeerId) -> Option<ConnectionState> {
        self.peers.get(peer).copied()
    }

    /// Number of fully connected peers.
    #[must_use]
    pub fn connected_count(&self) -> usize {
        self.peers
            .values()
            .filter(|s| **s == ConnectionState::Connected)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roster_lifecycle() {
        let mut group = PeerGroup::hosting("demo");
        assert!(group.is_host());
        assert_eq!(group.connected_count(), 0);

        let peer = PeerId::new("10.0.0.2:9000");
        group.peer_connecting(peer.clone());
        assert_eq!(group.state_of(&peer), Some(ConnectionState::Connecting));
        assert_eq!(group.connected_count(), 0);

        group.peer_connected(peer.clone());
        assert_eq!(group.connected_count(), 1);

        assert!(group.peer_disconnected(&peer));
        assert!(!group.peer_disconnected(&peer));
        assert_eq!(group.state_of(&peer), None);
    }

    #[test]
    fn test_joining_is_not_host() {
        assert!(!PeerGroup::joining("demo").is_host());
        assert_eq!(PeerGroup::joining("demo").name(), "demo");
    }

    #[test]
    fn test_origin_starts_unset() {
        let mut group = PeerGroup::joining("demo");
        assert_eq!(group.origin(), None);

        group.set_origin(Vec3::new(1.0, 0.0, -2.0));
        assert_eq!(group.origin(), Some(Vec3::new(1.0, 0.0, -2.0)));
    }
}
