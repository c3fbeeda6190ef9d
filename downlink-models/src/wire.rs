use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Logical device a relayed command is ultimately meant for.
///
/// Carried inside the payload when delivery goes through a gateway;
/// created fresh per request and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub product_key: String,
    pub device_key: String,
}

/// Platform request envelope for publish/subscribe delivery.
///
/// The `identity` key is present on the wire iff the command is
/// relayed; key presence, not value, is the relay signal consumed by
/// gateways.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayEnvelope {
    pub id: String,
    pub version: String,
    pub params: Map<String, Value>,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<Identity>,
}

/// Wrapped tunnel payload, used only when relay disambiguation is
/// required. Non-relayed tunnel consumers receive bare params instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TunnelEnvelope {
    pub params: Map<String, Value>,
    pub identity: Identity,
}
