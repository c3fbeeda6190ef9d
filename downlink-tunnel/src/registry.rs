use crate::client::TunnelClient;
use crate::config::TunnelConfig;
use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use downlink_core::TunnelRegistry;
use downlink_error::{RouteError, RouteResult};
use std::sync::Arc;

/// Construct and start a supervised tunnel for `config`.
///
/// The returned instance is already connecting in the background;
/// callers that need an established connection first should wait on
/// `wait_connected`.
pub fn new_tunnel(config: TunnelConfig) -> Arc<TunnelClient> {
    let (client, reconnect_rx) = TunnelClient::new(config);
    tokio::spawn(Arc::clone(&client).run(reconnect_rx));
    client
}

/// Maps device keys to their serving tunnel instance.
#[derive(Default)]
pub struct TunnelManager {
    tunnels: DashMap<String, Arc<TunnelClient>>,
}

impl TunnelManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach `tunnel` as the channel serving `device_key`, replacing
    /// and shutting down any previous one.
    pub fn attach(&self, device_key: impl Into<String>, tunnel: Arc<TunnelClient>) {
        if let Some(previous) = self.tunnels.insert(device_key.into(), tunnel) {
            previous.shutdown();
        }
    }

    /// Detach and shut down the tunnel serving `device_key`.
    pub fn detach(&self, device_key: &str) {
        if let Some((_, tunnel)) = self.tunnels.remove(device_key) {
            tunnel.shutdown();
        }
    }

    pub fn get(&self, device_key: &str) -> Option<Arc<TunnelClient>> {
        self.tunnels.get(device_key).map(|t| Arc::clone(&t))
    }

    pub fn len(&self) -> usize {
        self.tunnels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tunnels.is_empty()
    }
}

#[async_trait]
impl TunnelRegistry for TunnelManager {
    async fn write_to(&self, device_key: &str, channel: &str, payload: Bytes) -> RouteResult<()> {
        let tunnel = self
            .get(device_key)
            .ok_or_else(|| RouteError::TunnelUnavailable {
                device_key: device_key.to_string(),
            })?;
        tunnel.write(channel, &payload).await
    }
}
