//! Multicast server-discovery adapter.
//!
//! The collector announces itself by sending a fixed plaintext marker to a
//! multicast group every few seconds.  [`MulticastListener`] implements
//! [`DiscoveryPort`]: it binds the discovery port, joins the group and
//! hands out at most one datagram per poll without blocking.
//! [`DiscoveryBeacon`] is the sending side, used by the `beacon` bench
//! tool and by tests.
//!
//! Both use `std::net`, which maps to lwIP sockets on ESP-IDF, so there is
//! no cfg split here.
//!
//! Lifecycle is tied to the FindingServer state: armed on entry, released
//! on exit.

use std::io;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, UdpSocket};

use log::{debug, info, warn};

use crate::app::ports::{DISCOVERY_BUFFER_LEN, Datagram, DiscoveryPort};
use crate::error::CommsError;

/// Hop limit for beacon datagrams: the local segment plus one router.
pub const BEACON_TTL: u32 = 2;

// ───────────────────────────────────────────────────────────────
// Listener
// ───────────────────────────────────────────────────────────────

pub struct MulticastListener {
    group: Ipv4Addr,
    port: u16,
    socket: Option<UdpSocket>,
    joined: bool,
}

impl MulticastListener {
    /// `port` 0 binds an ephemeral port (tests).
    pub fn new(group: Ipv4Addr, port: u16) -> Self {
        Self {
            group,
            port,
            socket: None,
            joined: false,
        }
    }

    /// Whether the socket is currently bound.
    pub fn is_active(&self) -> bool {
        self.socket.is_some()
    }

    /// Port actually bound, if active.
    pub fn local_port(&self) -> Option<u16> {
        self.socket
            .as_ref()
            .and_then(|s| s.local_addr().ok())
            .map(|a| a.port())
    }

    /// Bind, join the group and switch to non-blocking.  Idempotent.
    ///
    /// A failed group join is logged and tolerated: the socket still
    /// receives datagrams addressed to it directly.
    pub fn start(&mut self) -> Result<(), CommsError> {
        if self.socket.is_some() {
            return Ok(());
        }

        let socket = UdpSocket::bind(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, self.port)).map_err(|e| {
            warn!("Discovery: bind :{} failed: {}", self.port, e);
            CommsError::DiscoveryBindFailed
        })?;
        socket.set_nonblocking(true).map_err(|e| {
            warn!("Discovery: set_nonblocking failed: {}", e);
            CommsError::DiscoveryBindFailed
        })?;

        self.joined = match socket.join_multicast_v4(&self.group, &Ipv4Addr::UNSPECIFIED) {
            Ok(()) => true,
            Err(e) => {
                warn!("Discovery: join {} failed: {}", self.group, e);
                false
            }
        };

        info!(
            "Discovery: listening on {}:{} (joined={})",
            self.group,
            socket.local_addr().map(|a| a.port()).unwrap_or(self.port),
            self.joined
        );
        self.socket = Some(socket);
        Ok(())
    }

    /// Leave the group and close the socket.  Idempotent.
    pub fn stop(&mut self) {
        let Some(socket) = self.socket.take() else {
            return;
        };
        if self.joined {
            if let Err(e) = socket.leave_multicast_v4(&self.group, &Ipv4Addr::UNSPECIFIED) {
                debug!("Discovery: leave {} failed: {}", self.group, e);
            }
            self.joined = false;
        }
        info!("Discovery: stopped");
    }

    /// Next pending datagram, if any.  Never blocks.
    pub fn poll(&mut self) -> Option<Datagram> {
        let socket = self.socket.as_ref()?;
        let mut buf = [0u8; DISCOVERY_BUFFER_LEN];
        match socket.recv_from(&mut buf) {
            Ok((len, SocketAddr::V4(src))) => Some(Datagram::new(*src.ip(), &buf[..len])),
            Ok((_, SocketAddr::V6(src))) => {
                debug!("Discovery: ignoring IPv6 sender {}", src);
                None
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => None,
            Err(e) => {
                debug!("Discovery: recv error: {}", e);
                None
            }
        }
    }
}

impl Drop for MulticastListener {
    fn drop(&mut self) {
        self.stop();
    }
}

impl DiscoveryPort for MulticastListener {
    fn begin_discovery(&mut self) -> Result<(), CommsError> {
        self.start()
    }

    fn poll_discovery(&mut self) -> Option<Datagram> {
        self.poll()
    }

    fn stop_discovery(&mut self) {
        self.stop();
    }
}

// ───────────────────────────────────────────────────────────────
// Beacon
// ───────────────────────────────────────────────────────────────

/// Sends the discovery marker to a fixed destination.
pub struct DiscoveryBeacon {
    socket: UdpSocket,
    dest: SocketAddrV4,
}

impl DiscoveryBeacon {
    pub fn new(dest: SocketAddrV4) -> io::Result<Self> {
        let socket = UdpSocket::bind(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 0))?;
        socket.set_multicast_ttl_v4(BEACON_TTL)?;
        Ok(Self { socket, dest })
    }

    pub fn dest(&self) -> SocketAddrV4 {
        self.dest
    }

    pub fn announce(&self, marker: &str) -> io::Result<usize> {
        self.socket.send_to(marker.as_bytes(), self.dest)
    }
}
