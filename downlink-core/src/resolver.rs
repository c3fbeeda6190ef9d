use crate::contracts::{DeviceDetailCache, DeviceDirectory, GatewayBindingStore};
use crate::request::DownstreamRequest;
use downlink_error::{RouteError, RouteResult};
use downlink_models::{DeviceDetail, DeviceType, Identity};
use std::sync::Arc;

/// Decides which physical device must receive the bytes of a
/// downstream command.
///
/// Normal and gateway devices are delivered directly. Sub-devices are
/// relayed through their bound gateway; the returned `Identity` names
/// the sub-device so the gateway can address it on its local bus.
pub struct TargetResolver {
    directory: Arc<dyn DeviceDirectory>,
    cache: Arc<dyn DeviceDetailCache>,
    bindings: Arc<dyn GatewayBindingStore>,
}

impl TargetResolver {
    pub fn new(
        directory: Arc<dyn DeviceDirectory>,
        cache: Arc<dyn DeviceDetailCache>,
        bindings: Arc<dyn GatewayBindingStore>,
    ) -> Self {
        Self {
            directory,
            cache,
            bindings,
        }
    }

    /// Resolve the physical delivery target for `request`.
    ///
    /// Returns the device the bytes must be sent to, plus an identity
    /// iff delivery is relayed through a gateway. The gateway-detail
    /// cache may be populated on a miss; there are no other side
    /// effects.
    pub async fn resolve(
        &self,
        request: &DownstreamRequest,
    ) -> RouteResult<(Arc<DeviceDetail>, Option<Identity>)> {
        let device = request.device()?;
        let product = request.product()?;

        if product.device_type != DeviceType::Sub {
            return Ok((Arc::clone(device), None));
        }

        // Binding lookup comes first; an unbound sub-device never
        // triggers a gateway fetch.
        let gateway_key = self
            .bindings
            .gateway_for(&device.key)
            .await?
            .filter(|k| !k.is_empty())
            .ok_or_else(|| RouteError::NoGatewayBinding {
                sub_key: device.key.clone(),
            })?;

        let gateway = self.fetch_gateway(&gateway_key).await?;

        if gateway.device_type() != Some(DeviceType::Gateway) {
            return Err(RouteError::InvalidGatewayType {
                gateway_key: gateway.key.clone(),
            });
        }
        if !gateway.is_online() {
            return Err(RouteError::GatewayOffline {
                gateway_key: gateway.key.clone(),
            });
        }

        let identity = Identity {
            product_key: device.effective_product_key().to_string(),
            device_key: device.key.clone(),
        };
        tracing::debug!(
            sub_key = %device.key,
            gateway_key = %gateway.key,
            "sub-device command relayed through gateway"
        );
        Ok((gateway, Some(identity)))
    }

    /// Cache-first gateway fetch with directory fallback.
    async fn fetch_gateway(&self, gateway_key: &str) -> RouteResult<Arc<DeviceDetail>> {
        if let Some(cached) = self.cache.get(gateway_key).await {
            return Ok(cached);
        }
        let fetched = self
            .directory
            .get(gateway_key)
            .await?
            .ok_or_else(|| RouteError::GatewayNotFound {
                gateway_key: gateway_key.to_string(),
            })?;
        self.cache.set(gateway_key, Arc::clone(&fetched)).await;
        Ok(fetched)
    }
}
