use async_trait::async_trait;
use bytes::Bytes;
use downlink_error::RouteResult;
use downlink_models::{DeviceDetail, RouteLogRecord};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Authoritative device lookup (persistence-backed, read-mostly).
#[async_trait]
pub trait DeviceDirectory: Send + Sync {
    /// Resolve a device key to its current detail, `None` when the
    /// device does not exist.
    async fn get(&self, key: &str) -> RouteResult<Option<Arc<DeviceDetail>>>;
}

/// Per-key cache in front of the directory.
///
/// Expected to provide read-your-writes consistency per key; it is not
/// transactionally linked to dispatch.
#[async_trait]
pub trait DeviceDetailCache: Send + Sync {
    async fn get(&self, key: &str) -> Option<Arc<DeviceDetail>>;
    async fn set(&self, key: &str, detail: Arc<DeviceDetail>);
}

/// Sub-device to gateway binding lookup.
///
/// A sub-device is bound to at most one gateway at a time.
#[async_trait]
pub trait GatewayBindingStore: Send + Sync {
    /// Gateway key bound to `sub_key`, `None` when unbound.
    async fn gateway_for(&self, sub_key: &str) -> RouteResult<Option<String>>;
}

/// Publish/subscribe transport used for `mqtt_server` devices.
///
/// Retry and backoff are the transport client's responsibility; a
/// publish failure here is fatal for the command being routed.
#[async_trait]
pub trait MessagePublisher: Send + Sync {
    async fn publish(&self, topic: &str, payload: Bytes) -> RouteResult<()>;
}

/// Writer side of the persistent tunnel transport (tcp/udp devices).
#[async_trait]
pub trait TunnelRegistry: Send + Sync {
    /// Write `payload` to the tunnel serving `device_key`. `channel`
    /// tags the logical stream multiplexed over the tunnel.
    async fn write_to(&self, device_key: &str, channel: &str, payload: Bytes) -> RouteResult<()>;
}

/// Time-series audit persistence for route records.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, kind: &str, device_key: &str, record: RouteLogRecord);
}

/// Northward notification hooks fired around a property-set dispatch.
#[async_trait]
pub trait EventNotifier: Send + Sync {
    /// A property-set command was accepted for delivery.
    async fn property_set(
        &self,
        product_key: &str,
        device_key: &str,
        properties: &Map<String, Value>,
    );

    /// The device replied to a property-set command.
    async fn property_set_reply(
        &self,
        product_key: &str,
        device_key: &str,
        code: i64,
        data: &Map<String, Value>,
    );
}

/// Notifier that drops all events. Useful for tests and deployments
/// without a northward integration.
pub struct NoopNotifier;

#[async_trait]
impl EventNotifier for NoopNotifier {
    async fn property_set(&self, _: &str, _: &str, _: &Map<String, Value>) {}

    async fn property_set_reply(&self, _: &str, _: &str, _: i64, _: &Map<String, Value>) {}
}
