// Crate-level error type

use crate::airport::AirportError;
use crate::packet::PacketError;
use crate::route::RouteError;

/// Every fatal condition of a run. Transient send failures never reach this type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Airport(#[from] AirportError),
    #[error(transparent)]
    Route(#[from] RouteError),
    #[error("packet encoding failed: {0}")]
    Packet(#[from] PacketError),
    #[error("{0} is not an IPv4 multicast group")]
    NotMulticast(std::net::Ipv4Addr),
    #[error("socket error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
