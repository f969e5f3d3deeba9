//! Tokio transport driver: UDP discovery beacons + framed TCP.
//!
//! Discovery is a periodic UDP broadcast carrying the hosted group's name
//! under the shared metadata key. Launch messages travel over per-peer
//! TCP connections as length-prefixed frames (u32 little-endian length,
//! then the JSON payload).
//!
//! The driver is a single `select!` loop owning all sockets. It consumes
//! [`SyncCommand`]s and reports [`SyncEvent`]s; it holds no protocol
//! state beyond what the sockets require, so the session stays the only
//! authority on group membership.

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream, UdpSocket};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use std::collections::HashMap;
use std::io;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use skyshell_shared::SERVICE_TYPE;

use crate::group::PeerId;
use crate::session::{SyncCommand, SyncEvent};

/// Upper bound on a single frame. A launch message with a large shell is
/// a few kilobytes; anything bigger is a broken or hostile peer.
pub const MAX_FRAME_LEN: usize = 64 * 1024;

/// Transport tuning knobs.
#[derive(Clone, Debug)]
pub struct TransportConfig {
    /// UDP port beacons are broadcast to and received on.
    pub beacon_port: u16,
    /// TCP port this device accepts peer connections on. 0 picks one.
    pub listen_port: u16,
    /// How often an advertising host broadcasts its beacon.
    pub beacon_interval: Duration,
    /// A discovered peer silent for this long is reported lost.
    pub peer_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            beacon_port: 47_820,
            listen_port: 0,
            beacon_interval: Duration::from_secs(1),
            peer_timeout: Duration::from_secs(5),
        }
    }
}

/// The discovery beacon as it travels on the wire.
#[derive(Serialize, Deserialize)]
struct Beacon {
    /// Always [`SERVICE_TYPE`]; anything else is not ours.
    service: String,
    /// Hosted group name, under the shared discovery metadata key.
    #[serde(rename = "groupName")]
    group_name: String,
    /// TCP port the host accepts connections on.
    port: u16,
}

/// Runs the transport until the command channel closes.
///
/// # Errors
///
/// Only socket binding can fail here; everything after startup degrades
/// by dropping the affected peer or datagram.
pub async fn run_transport(
    config: TransportConfig,
    mut commands: UnboundedReceiver<SyncCommand>,
    events: UnboundedSender<SyncEvent>,
) -> io::Result<()> {
    let listener = TcpListener::bind(("0.0.0.0", config.listen_port)).await?;
    let listen_port = listener.local_addr()?.port();

    let beacon_rx = UdpSocket::bind(("0.0.0.0", config.beacon_port)).await?;
    beacon_rx.set_broadcast(true)?;
    let beacon_tx = UdpSocket::bind(("0.0.0.0", 0)).await?;
    beacon_tx.set_broadcast(true)?;
    let beacon_target = SocketAddr::from(([255, 255, 255, 255], config.beacon_port));

    tracing::info!(listen_port, beacon_port = config.beacon_port, "transport up");

    let mut advertised: Option<String> = None;
    let mut browsing = false;
    let mut last_seen: HashMap<PeerId, Instant> = HashMap::new();
    let mut writers: HashMap<PeerId, UnboundedSender<Vec<u8>>> = HashMap::new();

    let mut beacon_timer = tokio::time::interval(config.beacon_interval);
    let mut sweep_timer = tokio::time::interval(config.peer_timeout);
    let mut datagram = vec![0u8; 2048];

    loop {
        tokio::select! {
            command = commands.recv() => {
                let Some(command) = command else { break };
                match command {
                    SyncCommand::Advertise { group_name } => advertised = Some(group_name),
                    SyncCommand::StopAdvertising => advertised = None,
                    SyncCommand::Browse => browsing = true,
                    SyncCommand::StopBrowsing => {
                        browsing = false;
                        last_seen.clear();
                    }
                    SyncCommand::Connect { peer } => {
                        connect_peer(&peer, &events, &mut writers).await;
                    }
                    SyncCommand::Disconnect => {
                        // Dropping the senders ends every writer task,
                        // which closes the streams.
                        writers.clear();
                    }
                    SyncCommand::Broadcast { payload } => {
                        writers.retain(|peer, tx| {
                            let alive = tx.send(payload.clone()).is_ok();
                            if !alive {
                                tracing::debug!(%peer, "writer gone, dropping peer");
                            }
                            alive
                        });
                    }
                }
            }

            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, addr)) => {
                        // Incoming connections are always accepted.
                        let peer = PeerId::new(addr.to_string());
                        tracing::info!(%peer, "peer connected in");
                        let _ = events.send(SyncEvent::InviteReceived { peer: peer.clone() });
                        let writer = spawn_peer(stream, peer.clone(), &events);
                        writers.insert(peer.clone(), writer);
                        let _ = events.send(SyncEvent::PeerConnected { peer });
                    }
                    Err(err) => tracing::warn!(error = %err, "accept failed"),
                }
            }

            received = beacon_rx.recv_from(&mut datagram) => {
                if let Ok((len, from)) = received {
                    if browsing {
                        handle_beacon(&datagram[..len], from, &events, &mut last_seen);
                    }
                }
            }

            _ = beacon_timer.tick() => {
                if let Some(group_name) = &advertised {
                    let beacon = Beacon {
                        service: SERVICE_TYPE.to_string(),
                        group_name: group_name.clone(),
                        port: listen_port,
                    };
                    match serde_json::to_vec(&beacon) {
                        Ok(bytes) => {
                            if let Err(err) = beacon_tx.send_to(&bytes, beacon_target).await {
                                tracing::warn!(error = %err, "beacon send failed");
                            }
                        }
                        Err(err) => tracing::warn!(error = %err, "beacon encode failed"),
                    }
                }
            }

            _ = sweep_timer.tick() => {
                let timeout = config.peer_timeout;
                let mut lost = Vec::new();
                last_seen.retain(|peer, seen| {
                    let alive = seen.elapsed() < timeout;
                    if !alive {
                        lost.push(peer.clone());
                    }
                    alive
                });
                for peer in lost {
                    tracing::debug!(%peer, "peer beacon timed out");
                    let _ = events.send(SyncEvent::PeerLost { peer });
                }
            }
        }
    }

    tracing::info!("transport shutting down");
    Ok(())
}

fn handle_beacon(
    payload: &[u8],
    from: SocketAddr,
    events: &UnboundedSender<SyncEvent>,
    last_seen: &mut HashMap<PeerId, Instant>,
) {
    let Ok(beacon) = serde_json::from_slice::<Beacon>(payload) else {
        // Not ours; the beacon port may be shared with other traffic.
        return;
    };
    if beacon.service != SERVICE_TYPE {
        return;
    }
    // Identify the host by its reachable TCP endpoint, not the beacon's
    // ephemeral source port.
    let peer = PeerId::new(format!("{}:{}", from.ip(), beacon.port));
    last_seen.insert(peer.clone(), Instant::now());
    let _ = events.send(SyncEvent::BeaconReceived {
        peer,
        group_name: beacon.group_name,
    });
}

async fn connect_peer(
    peer: &PeerId,
    events: &UnboundedSender<SyncEvent>,
    writers: &mut HashMap<PeerId, UnboundedSender<Vec<u8>>>,
) {
    let Ok(addr) = peer.as_str().parse::<SocketAddr>() else {
        tracing::warn!(%peer, "unparseable peer address");
        return;
    };
    let attempt = tokio::time::timeout(Duration::from_secs(2), TcpStream::connect(addr));
    match attempt.await {
        Ok(Ok(stream)) => {
            tracing::info!(%peer, "peer connected out");
            let writer = spawn_peer(stream, peer.clone(), events);
            writers.insert(peer.clone(), writer);
            let _ = events.send(SyncEvent::PeerConnected { peer: peer.clone() });
        }
        Ok(Err(err)) => {
            tracing::warn!(%peer, error = %err, "connect failed");
            let _ = events.send(SyncEvent::PeerDisconnected { peer: peer.clone() });
        }
        Err(_) => {
            tracing::warn!(%peer, "connect timed out");
            let _ = events.send(SyncEvent::PeerDisconnected { peer: peer.clone() });
        }
    }
}

/// Spawns the reader and writer tasks for one peer connection.
fn spawn_peer(
    stream: TcpStream,
    peer: PeerId,
    events: &UnboundedSender<SyncEvent>,
) -> UnboundedSender<Vec<u8>> {
    let (read_half, write_half) = stream.into_split();
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(write_loop(write_half, rx, peer.clone()));
    tokio::spawn(read_loop(read_half, peer, events.clone()));
    tx
}

async fn write_loop(
    mut stream: OwnedWriteHalf,
    mut outgoing: UnboundedReceiver<Vec<u8>>,
    peer: PeerId,
) {
    while let Some(payload) = outgoing.recv().await {
        if let Err(err) = write_frame(&mut stream, &payload).await {
            tracing::warn!(%peer, error = %err, "peer write failed");
            break;
        }
    }
}

async fn read_loop(mut stream: OwnedReadHalf, peer: PeerId, events: UnboundedSender<SyncEvent>) {
    loop {
        match read_frame(&mut stream).await {
            Ok(payload) => {
                if events
                    .send(SyncEvent::MessageReceived {
                        peer: peer.clone(),
                        payload,
                    })
                    .is_err()
                {
                    break;
                }
            }
            Err(err) => {
                if err.kind() != io::ErrorKind::UnexpectedEof {
                    tracing::warn!(%peer, error = %err, "peer read failed");
                }
                let _ = events.send(SyncEvent::PeerDisconnected { peer });
                break;
            }
        }
    }
}

/// Reads one length-prefixed frame.
///
/// # Errors
///
/// Any IO error, or `InvalidData` for a frame larger than
/// [`MAX_FRAME_LEN`].
pub async fn read_frame<R: AsyncRead + Unpin>(stream: &mut R) -> io::Result<Vec<u8>> {
    let mut len_bytes = [0u8; 4];
    stream.read_exact(&mut len_bytes).await?;
    let len = u32::from_le_bytes(len_bytes) as usize;
    if len > MAX_FRAME_LEN {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("frame of {len} bytes exceeds limit"),
        ));
    }
    let mut payload = vec![0u8; len];
    stream.read_exact(&mut payload).await?;
    Ok(payload)
}

/// Writes one length-prefixed frame.
///
/// # Errors
///
/// Any IO error, or `InvalidData` for an oversized payload.
pub async fn write_frame<W: AsyncWrite + Unpin>(stream: &mut W, payload: &[u8]) -> io::Result<()> {
    if payload.len() > MAX_FRAME_LEN {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("frame of {} bytes exceeds limit", payload.len()),
        ));
    }
    #[allow(clippy::cast_possible_truncation)]
    let len = payload.len() as u32;
    stream.write_all(&len.to_le_bytes()).await?;
    stream.write_all(payload).await?;
    stream.flush().await
}
