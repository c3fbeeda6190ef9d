use crate::protocol::TransportProtocol;
use crate::tsl::Tsl;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Device classification carried by the owning product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceType {
    /// Directly addressable device.
    Normal,
    /// Relay device that fronts one or more sub-devices.
    Gateway,
    /// Device reachable only through a bound gateway.
    Sub,
}

/// Live connectivity status as reported by the status cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceStatus {
    Online,
    Offline,
    /// Registered but never connected.
    Inactive,
}

/// Product definition shared by all devices of the product.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetail {
    pub key: String,
    #[serde(default)]
    pub name: String,
    pub device_type: DeviceType,
    pub transport_protocol: TransportProtocol,
    /// Thing specification (property schema); absent for products that
    /// never carry property commands.
    #[serde(default)]
    pub tsl: Option<Tsl>,
}

/// Read-only device snapshot handed to the routing core per request.
///
/// The directory owns the authoritative record; the core never mutates
/// a detail, it only reads it and may place fetched copies into the
/// detail cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceDetail {
    pub key: String,
    /// Denormalized product key column; may lag behind the resolved
    /// product entity after a product rename.
    pub product_key: String,
    pub status: DeviceStatus,
    #[serde(default)]
    pub product: Option<Arc<ProductDetail>>,
}

impl DeviceDetail {
    /// Product key to put on the wire.
    ///
    /// Prefers the resolved product entity key over the raw stored
    /// column, which protects relayed identities from stale
    /// denormalized data.
    pub fn effective_product_key(&self) -> &str {
        match &self.product {
            Some(p) if !p.key.is_empty() => &p.key,
            _ => &self.product_key,
        }
    }

    #[inline]
    pub fn device_key(&self) -> &str {
        &self.key
    }

    /// Device type from the resolved product, if any.
    #[inline]
    pub fn device_type(&self) -> Option<DeviceType> {
        self.product.as_ref().map(|p| p.device_type)
    }

    #[inline]
    pub fn is_online(&self) -> bool {
        self.status == DeviceStatus::Online
    }
}
