use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Logical-target vs. physical-channel divergence of one dispatch.
///
/// `target_*` fields describe the device the caller addressed;
/// `channel_*` fields describe the device the bytes were actually sent
/// to. Auditors query exactly this divergence to detect gateway relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteInfo {
    pub target_product_key: String,
    pub target_device_key: String,
    pub channel_product_key: String,
    pub channel_device_key: String,
    pub via_gateway: bool,
}

/// Immutable audit record for one downstream dispatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteLogRecord {
    pub payload: Value,
    pub route: RouteInfo,
    pub recorded_at: DateTime<Utc>,
}
