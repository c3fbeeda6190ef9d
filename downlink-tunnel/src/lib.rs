pub mod client;
pub mod config;
pub mod registry;

pub use client::{TunnelClient, TunnelState};
pub use config::{BackoffPolicy, TunnelConfig, TunnelKind};
pub use registry::{new_tunnel, TunnelManager};
