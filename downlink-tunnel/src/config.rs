use backoff::ExponentialBackoff;
use downlink_error::RouteError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// Network family of a tunnel endpoint.
///
/// Configuration strings are converted once at load time; anything but
/// the two client kinds fails with `UnsupportedTunnelType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TunnelKind {
    #[serde(rename = "tcp-client")]
    TcpClient,
    #[serde(rename = "udp-client")]
    UdpClient,
}

impl FromStr for TunnelKind {
    type Err = RouteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tcp-client" => Ok(TunnelKind::TcpClient),
            "udp-client" => Ok(TunnelKind::UdpClient),
            other => Err(RouteError::UnsupportedTunnelType {
                kind: other.to_string(),
            }),
        }
    }
}

/// Reconnect backoff parameters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BackoffPolicy {
    pub initial_interval_ms: u64,
    pub max_interval_ms: u64,
    /// Jitter in [0.0, 1.0]; 0.2 means ±20%.
    pub randomization_factor: f64,
    pub multiplier: f64,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            initial_interval_ms: 1_000,
            max_interval_ms: 30_000,
            randomization_factor: 0.2,
            multiplier: 2.0,
        }
    }
}

impl BackoffPolicy {
    /// One-time builder per reconnect loop. Reconnection never gives
    /// up on its own; shutdown is the only way out.
    pub fn build(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            initial_interval: Duration::from_millis(self.initial_interval_ms.max(1)),
            max_interval: Duration::from_millis(
                self.max_interval_ms.max(self.initial_interval_ms),
            ),
            randomization_factor: self.randomization_factor.clamp(0.0, 1.0),
            multiplier: self.multiplier.max(1.0),
            max_elapsed_time: None,
            ..ExponentialBackoff::default()
        }
    }
}

/// Endpoint configuration of one long-lived tunnel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TunnelConfig {
    /// Operator-facing tunnel name, used in logs and errors.
    pub name: String,
    pub kind: TunnelKind,
    pub host: String,
    pub port: u16,
    #[serde(default = "TunnelConfig::default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    #[serde(default = "TunnelConfig::default_write_timeout_ms")]
    pub write_timeout_ms: u64,
    #[serde(default)]
    pub backoff: BackoffPolicy,
}

impl TunnelConfig {
    fn default_connect_timeout_ms() -> u64 {
        5_000
    }

    fn default_write_timeout_ms() -> u64 {
        5_000
    }

    #[inline]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    #[inline]
    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }

    #[inline]
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
