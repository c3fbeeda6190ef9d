pub mod constants;
pub mod device;
pub mod protocol;
pub mod route_log;
pub mod tsl;
pub mod wire;

pub use constants::{
    render_topic, DEFAULT_ENVELOPE_VERSION, METHOD_PROPERTY_SET, MSG_TYPE_PROPERTY_SET,
    PROPERTY_SET_TOPIC,
};
pub use device::{DeviceDetail, DeviceStatus, DeviceType, ProductDetail};
pub use protocol::TransportProtocol;
pub use route_log::{RouteInfo, RouteLogRecord};
pub use tsl::{Tsl, TslProperty, ValueKind};
pub use wire::{GatewayEnvelope, Identity, TunnelEnvelope};
