#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use downlink_core::{
    AuditSink, CommandRouter, Correlator, DeviceDetailCache, DeviceDirectory, EventNotifier,
    GatewayBindingStore, MessagePublisher, RouterConfig, TargetResolver, TunnelRegistry,
};
use downlink_error::RouteResult;
use downlink_models::{
    DeviceDetail, DeviceStatus, DeviceType, ProductDetail, RouteLogRecord, TransportProtocol, Tsl,
    TslProperty, ValueKind,
};
use serde_json::{Map, Value};
use std::sync::{Arc, Mutex, Once};

static INIT: Once = Once::new();

pub fn init_tracing() {
    INIT.call_once(|| {
        let dir = std::env::temp_dir().join(format!("downlink-core-test-{}", std::process::id()));
        let mut logger = downlink_common::Logger::new(Some(tracing::Level::DEBUG))
            .with_log_dir(dir.to_string_lossy());
        let _ = logger.initialize();
        // Keep the rolling-file guard alive for the whole test binary.
        std::mem::forget(logger);
    });
}

pub fn default_tsl() -> Tsl {
    Tsl {
        properties: vec![
            TslProperty {
                key: "switch".to_string(),
                name: String::new(),
                value_type: ValueKind::Bool,
            },
            TslProperty {
                key: "temperature".to_string(),
                name: String::new(),
                value_type: ValueKind::Int32,
            },
        ],
    }
}

pub fn device(
    key: &str,
    product_key: &str,
    device_type: DeviceType,
    transport: TransportProtocol,
    status: DeviceStatus,
) -> Arc<DeviceDetail> {
    Arc::new(DeviceDetail {
        key: key.to_string(),
        product_key: product_key.to_string(),
        status,
        product: Some(Arc::new(ProductDetail {
            key: product_key.to_string(),
            name: String::new(),
            device_type,
            transport_protocol: transport,
            tsl: Some(default_tsl()),
        })),
    })
}

#[derive(Default)]
pub struct MemoryDirectory {
    pub devices: DashMap<String, Arc<DeviceDetail>>,
}

#[async_trait]
impl DeviceDirectory for MemoryDirectory {
    async fn get(&self, key: &str) -> RouteResult<Option<Arc<DeviceDetail>>> {
        Ok(self.devices.get(key).map(|d| Arc::clone(&d)))
    }
}

#[derive(Default)]
pub struct MemoryCache {
    pub entries: DashMap<String, Arc<DeviceDetail>>,
}

#[async_trait]
impl DeviceDetailCache for MemoryCache {
    async fn get(&self, key: &str) -> Option<Arc<DeviceDetail>> {
        self.entries.get(key).map(|d| Arc::clone(&d))
    }

    async fn set(&self, key: &str, detail: Arc<DeviceDetail>) {
        self.entries.insert(key.to_string(), detail);
    }
}

#[derive(Default)]
pub struct MemoryBindings {
    pub bindings: DashMap<String, String>,
}

#[async_trait]
impl GatewayBindingStore for MemoryBindings {
    async fn gateway_for(&self, sub_key: &str) -> RouteResult<Option<String>> {
        Ok(self.bindings.get(sub_key).map(|g| g.clone()))
    }
}

/// Publisher that records publishes and, when given a reply, resolves
/// the pending request like a broker round trip would.
pub struct LoopbackPublisher {
    pub published: Mutex<Vec<(String, Bytes)>>,
    pub correlator: Arc<Correlator>,
    pub reply: Option<Value>,
}

#[async_trait]
impl MessagePublisher for LoopbackPublisher {
    async fn publish(&self, topic: &str, payload: Bytes) -> RouteResult<()> {
        self.published
            .lock()
            .unwrap()
            .push((topic.to_string(), payload.clone()));
        if let Some(reply) = &self.reply {
            let envelope: Value = serde_json::from_slice(&payload)?;
            let id = envelope["id"].as_str().unwrap_or_default().to_string();
            let correlator = Arc::clone(&self.correlator);
            let reply = reply.clone();
            tokio::spawn(async move {
                correlator.resolve(&id, reply);
            });
        }
        Ok(())
    }
}

/// Tunnel registry that records writes and auto-replies.
///
/// Tunnel payloads carry no correlation id (bare params by design), so
/// the fake resolves whatever request is pending at write time.
pub struct LoopbackTunnels {
    pub written: Mutex<Vec<(String, String, Bytes)>>,
    pub correlator: Arc<Correlator>,
    pub reply: Option<Value>,
}

#[async_trait]
impl TunnelRegistry for LoopbackTunnels {
    async fn write_to(&self, device_key: &str, channel: &str, payload: Bytes) -> RouteResult<()> {
        self.written.lock().unwrap().push((
            device_key.to_string(),
            channel.to_string(),
            payload.clone(),
        ));
        if let Some(reply) = &self.reply {
            let correlator = Arc::clone(&self.correlator);
            let ids = correlator.pending_ids();
            let reply = reply.clone();
            tokio::spawn(async move {
                for id in ids {
                    correlator.resolve(&id, reply.clone());
                }
            });
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingAudit {
    pub records: Mutex<Vec<(String, String, RouteLogRecord)>>,
}

#[async_trait]
impl AuditSink for RecordingAudit {
    async fn record(&self, kind: &str, device_key: &str, record: RouteLogRecord) {
        self.records
            .lock()
            .unwrap()
            .push((kind.to_string(), device_key.to_string(), record));
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub set_events: Mutex<Vec<(String, String, Map<String, Value>)>>,
    pub reply_events: Mutex<Vec<(String, String, i64)>>,
}

#[async_trait]
impl EventNotifier for RecordingNotifier {
    async fn property_set(
        &self,
        product_key: &str,
        device_key: &str,
        properties: &Map<String, Value>,
    ) {
        self.set_events.lock().unwrap().push((
            product_key.to_string(),
            device_key.to_string(),
            properties.clone(),
        ));
    }

    async fn property_set_reply(
        &self,
        product_key: &str,
        device_key: &str,
        code: i64,
        _data: &Map<String, Value>,
    ) {
        self.reply_events.lock().unwrap().push((
            product_key.to_string(),
            device_key.to_string(),
            code,
        ));
    }
}

/// Full routing harness over in-memory collaborators.
pub struct Harness {
    pub directory: Arc<MemoryDirectory>,
    pub cache: Arc<MemoryCache>,
    pub bindings: Arc<MemoryBindings>,
    pub publisher: Arc<LoopbackPublisher>,
    pub tunnels: Arc<LoopbackTunnels>,
    pub audit: Arc<RecordingAudit>,
    pub notifier: Arc<RecordingNotifier>,
    pub correlator: Arc<Correlator>,
    pub router: CommandRouter,
}

pub struct HarnessOptions {
    /// Reply the loopback publisher resolves with; `None` leaves the
    /// request to time out.
    pub publish_reply: Option<Value>,
    /// Reply the loopback tunnel resolves with.
    pub tunnel_reply: Option<Value>,
    pub config: RouterConfig,
}

impl Default for HarnessOptions {
    fn default() -> Self {
        Self {
            publish_reply: Some(serde_json::json!({"code": 200})),
            tunnel_reply: None,
            config: RouterConfig::default(),
        }
    }
}

pub fn harness(options: HarnessOptions) -> Harness {
    init_tracing();
    let directory = Arc::new(MemoryDirectory::default());
    let cache = Arc::new(MemoryCache::default());
    let bindings = Arc::new(MemoryBindings::default());
    let correlator = Arc::new(Correlator::new());
    let publisher = Arc::new(LoopbackPublisher {
        published: Mutex::new(Vec::new()),
        correlator: Arc::clone(&correlator),
        reply: options.publish_reply,
    });
    let tunnels = Arc::new(LoopbackTunnels {
        written: Mutex::new(Vec::new()),
        correlator: Arc::clone(&correlator),
        reply: options.tunnel_reply,
    });
    let audit = Arc::new(RecordingAudit::default());
    let notifier = Arc::new(RecordingNotifier::default());

    let resolver = TargetResolver::new(
        Arc::clone(&directory) as Arc<dyn DeviceDirectory>,
        Arc::clone(&cache) as Arc<dyn DeviceDetailCache>,
        Arc::clone(&bindings) as Arc<dyn GatewayBindingStore>,
    );
    let router = CommandRouter::new(
        resolver,
        Arc::clone(&correlator),
        Arc::clone(&publisher) as Arc<dyn MessagePublisher>,
        Arc::clone(&tunnels) as Arc<dyn TunnelRegistry>,
        Arc::clone(&audit) as Arc<dyn AuditSink>,
        Arc::clone(&notifier) as Arc<dyn EventNotifier>,
        options.config,
    );

    Harness {
        directory,
        cache,
        bindings,
        publisher,
        tunnels,
        audit,
        notifier,
        correlator,
        router,
    }
}
