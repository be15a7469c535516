// Multicast UDP sender for telemetry packets
// One socket per run, bound to the local interface address and owned by the
// broadcast loop. Dropped (and closed) when the loop returns.

use std::io;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

use tokio::net::UdpSocket;
use tracing::{debug, info, warn};

use crate::constants::{MULTICAST_GROUP, MULTICAST_PORT, MULTICAST_TTL};
use crate::error::{Error, Result};

/// Public address used only to pick the outbound interface; nothing is sent to it.
const ROUTE_PROBE_ADDR: &str = "8.8.8.8:80";

/// Destination and socket options of the feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MulticastConfig {
    pub group: Ipv4Addr,
    pub port: u16,
    pub ttl: u32,
    /// Explicit local address; discovered when `None`.
    pub bind: Option<Ipv4Addr>,
}

impl Default for MulticastConfig {
    fn default() -> Self {
        MulticastConfig {
            group: MULTICAST_GROUP.parse().unwrap_or(Ipv4Addr::new(224, 0, 0, 1)),
            port: MULTICAST_PORT,
            ttl: MULTICAST_TTL,
            bind: None,
        }
    }
}

impl MulticastConfig {
    pub fn destination(&self) -> SocketAddr {
        SocketAddr::V4(SocketAddrV4::new(self.group, self.port))
    }

    pub fn validate(&self) -> Result<()> {
        if !self.group.is_multicast() {
            return Err(Error::NotMulticast(self.group));
        }
        if self.port == 0 {
            return Err(Error::Config("multicast port must be non-zero".to_string()));
        }
        Ok(())
    }
}

/// Destination for encoded packets.
pub trait PacketSink {
    /// Send one packet without blocking. Errors are transient for the caller.
    fn send_packet(&mut self, packet: &[u8]) -> io::Result<usize>;
}

/// Local address of the interface that routes to the outside world.
///
/// Connecting a UDP socket sends nothing; it only resolves the route. Falls
/// back to 0.0.0.0 when there is no route (offline host, sandbox).
pub async fn discover_local_ip() -> Ipv4Addr {
    match probe_local_ip().await {
        Ok(ip) => ip,
        Err(e) => {
            warn!("Could not determine local interface ({}), binding to 0.0.0.0", e);
            Ipv4Addr::UNSPECIFIED
        }
    }
}

async fn probe_local_ip() -> io::Result<Ipv4Addr> {
    let probe = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).await?;
    probe.connect(ROUTE_PROBE_ADDR).await?;
    match probe.local_addr()? {
        SocketAddr::V4(addr) => Ok(*addr.ip()),
        SocketAddr::V6(addr) => Err(io::Error::new(
            io::ErrorKind::AddrNotAvailable,
            format!("probe returned IPv6 address {}", addr),
        )),
    }
}

/// UDP socket sending to the configured multicast group.
#[derive(Debug)]
pub struct MulticastSender {
    socket: UdpSocket,
    destination: SocketAddr,
}

impl MulticastSender {
    /// Bind the socket and apply the multicast TTL. Any failure here is fatal.
    pub async fn open(config: &MulticastConfig) -> Result<Self> {
        config.validate()?;
        let local_ip = match config.bind {
            Some(ip) => ip,
            None => discover_local_ip().await,
        };

        let socket = UdpSocket::bind((local_ip, 0)).await?;
        socket.set_multicast_ttl_v4(config.ttl)?;

        let sender = MulticastSender {
            socket,
            destination: config.destination(),
        };
        info!(
            "Multicast sender bound to {} -> {} (ttl {})",
            sender.local_addr()?,
            sender.destination,
            config.ttl
        );
        Ok(sender)
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    pub fn destination(&self) -> SocketAddr {
        self.destination
    }
}

impl PacketSink for MulticastSender {
    fn send_packet(&mut self, packet: &[u8]) -> io::Result<usize> {
        let sent = self.socket.try_send_to(packet, self.destination)?;
        debug!("Sent {} bytes to {}", sent, self.destination);
        Ok(sent)
    }
}
