pub mod constants;
pub mod error;
pub mod geodesy;
pub mod airport;
pub mod route;
pub mod phase;
pub mod telemetry;
pub mod packet;
pub mod net;
pub mod progress;
pub mod broadcast;
pub mod config;

pub use error::{Error, Result};
