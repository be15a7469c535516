// Network layer module
// UDP multicast transport for the telemetry feed

pub mod multicast;

pub use multicast::{discover_local_ip, MulticastConfig, MulticastSender, PacketSink};
