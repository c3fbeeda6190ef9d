use downlink_tunnel::{BackoffPolicy, TunnelConfig, TunnelKind};
use std::sync::Once;

static INIT: Once = Once::new();

pub fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("downlink_tunnel=trace")
            .with_test_writer()
            .try_init();
    });
}

pub fn test_config(name: &str, kind: TunnelKind, port: u16) -> TunnelConfig {
    TunnelConfig {
        name: name.to_string(),
        kind,
        host: "127.0.0.1".to_string(),
        port,
        connect_timeout_ms: 2_000,
        write_timeout_ms: 2_000,
        backoff: BackoffPolicy {
            initial_interval_ms: 50,
            max_interval_ms: 200,
            randomization_factor: 0.0,
            multiplier: 2.0,
        },
    }
}
