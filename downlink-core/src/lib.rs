pub mod config;
pub mod contracts;
pub mod correlator;
pub mod payload;
pub mod request;
pub mod resolver;
pub mod route_log;
pub mod router;

pub use config::{RouterConfig, TopicTemplates};
pub use contracts::{
    AuditSink, DeviceDetailCache, DeviceDirectory, EventNotifier, GatewayBindingStore,
    MessagePublisher, NoopNotifier, TunnelRegistry,
};
pub use correlator::{Correlator, ReplyWaiter};
pub use payload::{build_gateway_envelope, build_tunnel_envelope};
pub use request::DownstreamRequest;
pub use resolver::TargetResolver;
pub use route_log::build_route_log;
pub use router::CommandRouter;
