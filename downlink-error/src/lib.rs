use config::ConfigError;
use serde_json::Error as SerdeJsonError;
use std::io::Error as IoError;
use thiserror::Error;

pub type RouteResult<T, E = RouteError> = Result<T, E>;

/// Errors surfaced by the downstream routing core.
///
/// Resolution and dispatch errors are terminal for the command being
/// routed; the core never retries. `RequestTimeout` is kept distinct
/// from transport errors so callers can retry on timeout only.
#[derive(Error, Debug)]
pub enum RouteError {
    #[error("device detail is missing from the request")]
    MissingDeviceDetail,
    #[error("sub device '{sub_key}' has no gateway binding")]
    NoGatewayBinding { sub_key: String },
    #[error("gateway '{gateway_key}' not found")]
    GatewayNotFound { gateway_key: String },
    #[error("device '{gateway_key}' is not a gateway")]
    InvalidGatewayType { gateway_key: String },
    #[error("gateway '{gateway_key}' is offline")]
    GatewayOffline { gateway_key: String },
    #[error("transport protocol '{protocol}' is not supported")]
    UnsupportedTransport { protocol: String },
    #[error("tunnel type '{kind}' is not supported")]
    UnsupportedTunnelType { kind: String },
    #[error("request id '{id}' is already pending")]
    DuplicateRequestId { id: String },
    #[error("request '{id}' timed out waiting for a reply")]
    RequestTimeout { id: String },
    #[error("malformed response for request '{id}': {reason}")]
    MalformedResponse { id: String, reason: String },
    #[error("no tunnel registered for device '{device_key}'")]
    TunnelUnavailable { device_key: String },
    #[error("device '{device_key}' has no property schema")]
    MissingPropertySchema { device_key: String },
    #[error("publish to '{topic}' failed: {reason}")]
    PublishFailed { topic: String, reason: String },
    #[error("tunnel '{name}' is not connected")]
    TunnelNotConnected { name: String },
    #[error("{0}")]
    Transport(String),
    #[error("{0}")]
    Io(#[from] IoError),
    #[error("{0}")]
    Json(#[from] SerdeJsonError),
    #[error("{0}")]
    Config(#[from] ConfigError),
}

impl From<String> for RouteError {
    #[inline]
    fn from(e: String) -> Self {
        RouteError::Transport(e)
    }
}

impl From<&str> for RouteError {
    #[inline]
    fn from(e: &str) -> Self {
        RouteError::Transport(e.to_string())
    }
}

impl RouteError {
    /// Whether a caller-side retry is reasonable for this error.
    ///
    /// Only timeouts qualify; hard protocol and configuration errors
    /// require the underlying condition to change first.
    #[inline]
    pub fn is_retryable(&self) -> bool {
        matches!(self, RouteError::RequestTimeout { .. })
    }
}
