use crate::config::RouterConfig;
use crate::contracts::{AuditSink, EventNotifier, MessagePublisher, TunnelRegistry};
use crate::correlator::Correlator;
use crate::payload::{build_gateway_envelope, build_tunnel_envelope};
use crate::request::DownstreamRequest;
use crate::resolver::TargetResolver;
use crate::route_log::build_route_log;
use downlink_error::{RouteError, RouteResult};
use downlink_models::{
    render_topic, GatewayEnvelope, Tsl, TransportProtocol, METHOD_PROPERTY_SET,
    MSG_TYPE_PROPERTY_SET,
};
use serde_json::{Map, Value};
use std::sync::Arc;
use uuid::Uuid;

/// Channel tag for property traffic multiplexed over a tunnel.
const TUNNEL_CHANNEL_PROPERTY: &str = "property";

/// Downstream command facade: resolves the physical target, builds the
/// protocol payload, dispatches on the target's transport and bridges
/// the asynchronous reply back to the caller.
pub struct CommandRouter {
    resolver: TargetResolver,
    correlator: Arc<Correlator>,
    publisher: Arc<dyn MessagePublisher>,
    tunnels: Arc<dyn TunnelRegistry>,
    audit: Arc<dyn AuditSink>,
    notifier: Arc<dyn EventNotifier>,
    config: RouterConfig,
}

impl CommandRouter {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        resolver: TargetResolver,
        correlator: Arc<Correlator>,
        publisher: Arc<dyn MessagePublisher>,
        tunnels: Arc<dyn TunnelRegistry>,
        audit: Arc<dyn AuditSink>,
        notifier: Arc<dyn EventNotifier>,
        config: RouterConfig,
    ) -> Self {
        Self {
            resolver,
            correlator,
            publisher,
            tunnels,
            audit,
            notifier,
            config,
        }
    }

    /// Correlator handle for the inbound reply path.
    ///
    /// MQTT subscription handlers and tunnel readers call
    /// `resolve(id, reply)` on it after demultiplexing by id.
    pub fn correlator(&self) -> Arc<Correlator> {
        Arc::clone(&self.correlator)
    }

    /// Set properties on one logical device and wait for its reply.
    ///
    /// The reply is the device's JSON object response; its `code`
    /// field must be an integer. A non-object reply or a non-integer
    /// `code` is `MalformedResponse` rather than a silent default.
    pub async fn send_property_set(
        &self,
        request: DownstreamRequest,
    ) -> RouteResult<Map<String, Value>> {
        let device = Arc::clone(request.device()?);
        let product = Arc::clone(request.product()?);
        let tsl = product
            .tsl
            .as_ref()
            .ok_or_else(|| RouteError::MissingPropertySchema {
                device_key: device.key.clone(),
            })?;

        let params = coerce_properties(tsl, request.payload.as_deref())?;
        let id = Uuid::new_v4().simple().to_string();

        // Resolution happens before any payload is built or sent, so
        // relay failures (no binding, gateway offline) never reach the
        // wire.
        let (target, identity) = self.resolver.resolve(&request).await?;
        let target_product = target
            .product
            .as_ref()
            .ok_or(RouteError::MissingDeviceDetail)?;

        // Register before the network write: a reply cannot overtake
        // its waiter.
        let waiter = self.correlator.register(&id, "SetProperty")?;

        match target_product.transport_protocol {
            TransportProtocol::MqttServer => {
                let bytes = build_gateway_envelope(
                    &id,
                    &self.config.version,
                    METHOD_PROPERTY_SET,
                    params.clone(),
                    identity.clone(),
                )?;
                let topic = render_topic(
                    &self.config.topics.property_set,
                    target.effective_product_key(),
                    target.device_key(),
                );
                tracing::debug!(%id, %topic, "publishing property-set command");
                self.publisher
                    .publish(&topic, bytes.into())
                    .await
                    .map_err(|e| RouteError::PublishFailed {
                        topic: topic.clone(),
                        reason: e.to_string(),
                    })?;
            }
            TransportProtocol::Tcp | TransportProtocol::Udp => {
                // Tunnel consumers take the raw params, wrapped only
                // when relay disambiguation is needed.
                let bytes = build_tunnel_envelope(params.clone(), identity.clone())?;
                tracing::debug!(
                    %id,
                    target_key = %target.key,
                    protocol = %target_product.transport_protocol,
                    "writing property-set command to tunnel"
                );
                self.tunnels
                    .write_to(target.device_key(), TUNNEL_CHANNEL_PROPERTY, bytes.into())
                    .await?;
            }
        }

        // Audit payload mirrors the request envelope without identity,
        // which the route fields already encode.
        let log_payload = serde_json::to_value(GatewayEnvelope {
            id: id.clone(),
            version: self.config.version.clone(),
            params: params.clone(),
            method: METHOD_PROPERTY_SET.to_string(),
            identity: None,
        })?;
        self.audit
            .record(
                MSG_TYPE_PROPERTY_SET,
                device.device_key(),
                build_route_log(
                    Some(&device),
                    Some(&target),
                    identity.as_ref(),
                    log_payload,
                ),
            )
            .await;
        self.notifier
            .property_set(device.effective_product_key(), device.device_key(), &params)
            .await;

        let reply = waiter.wait(self.config.sync_timeout()).await?;
        let reply_map = reply
            .as_object()
            .cloned()
            .ok_or_else(|| RouteError::MalformedResponse {
                id: id.clone(),
                reason: "reply is not a JSON object".to_string(),
            })?;
        let code = reply_map
            .get("code")
            .and_then(Value::as_i64)
            .ok_or_else(|| RouteError::MalformedResponse {
                id: id.clone(),
                reason: "reply 'code' is not an integer".to_string(),
            })?;

        self.notifier
            .property_set_reply(
                device.effective_product_key(),
                device.device_key(),
                code,
                &reply_map,
            )
            .await;
        Ok(reply_map)
    }
}

/// Filter the caller's payload through the product TSL.
///
/// Keys without a declared property are dropped; declared keys are
/// type-coerced. An empty payload yields an empty parameter map.
fn coerce_properties(tsl: &Tsl, payload: Option<&[u8]>) -> RouteResult<Map<String, Value>> {
    let origin: Map<String, Value> = match payload {
        Some(bytes) if !bytes.is_empty() => serde_json::from_slice(bytes)?,
        _ => Map::new(),
    };
    let mut coerced = Map::new();
    for (key, value) in origin {
        if let Some(property) = tsl.property(&key) {
            coerced.insert(key, property.value_type.coerce(value));
        }
    }
    Ok(coerced)
}
