use bytes::Bytes;
use downlink_error::{RouteError, RouteResult};
use downlink_models::{DeviceDetail, ProductDetail};
use std::sync::Arc;

/// One inbound downstream command as handed to the routing core.
#[derive(Debug, Clone)]
pub struct DownstreamRequest {
    /// Snapshot of the logical target device, including its resolved
    /// product. Requests without it fail resolution immediately.
    pub device: Option<Arc<DeviceDetail>>,
    /// Raw caller payload (a JSON object of property key/value pairs
    /// for property-set commands).
    pub payload: Option<Bytes>,
}

impl DownstreamRequest {
    pub fn new(device: Arc<DeviceDetail>, payload: impl Into<Bytes>) -> Self {
        Self {
            device: Some(device),
            payload: Some(payload.into()),
        }
    }

    /// The target device, or `MissingDeviceDetail` when absent.
    pub fn device(&self) -> RouteResult<&Arc<DeviceDetail>> {
        self.device.as_ref().ok_or(RouteError::MissingDeviceDetail)
    }

    /// The target device's product, or `MissingDeviceDetail` when the
    /// snapshot lacks it.
    pub fn product(&self) -> RouteResult<&Arc<ProductDetail>> {
        self.device()?
            .product
            .as_ref()
            .ok_or(RouteError::MissingDeviceDetail)
    }
}
