use chrono::Utc;
use downlink_models::{DeviceDetail, Identity, RouteInfo, RouteLogRecord};
use serde_json::Value;

/// Build the audit record for one dispatch.
///
/// `target_*` fields reflect the logical device the caller addressed,
/// `channel_*` fields the physical device the bytes went to.
/// `via_gateway` is derived solely from identity presence.
pub fn build_route_log(
    request_device: Option<&DeviceDetail>,
    channel_device: Option<&DeviceDetail>,
    identity: Option<&Identity>,
    payload: Value,
) -> RouteLogRecord {
    RouteLogRecord {
        payload,
        route: RouteInfo {
            target_product_key: product_key_of(request_device),
            target_device_key: device_key_of(request_device),
            channel_product_key: product_key_of(channel_device),
            channel_device_key: device_key_of(channel_device),
            via_gateway: identity.is_some(),
        },
        recorded_at: Utc::now(),
    }
}

fn product_key_of(device: Option<&DeviceDetail>) -> String {
    device
        .map(|d| d.effective_product_key().to_string())
        .unwrap_or_default()
}

fn device_key_of(device: Option<&DeviceDetail>) -> String {
    device.map(|d| d.key.clone()).unwrap_or_default()
}
