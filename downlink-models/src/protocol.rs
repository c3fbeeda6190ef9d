use downlink_error::RouteError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Transport used to reach a physical device.
///
/// Configuration strings are converted into this closed enum once at
/// load time; the dispatcher then matches exhaustively instead of
/// re-checking strings per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportProtocol {
    /// Publish/subscribe delivery through the platform broker.
    MqttServer,
    /// Persistent TCP stream tunnel.
    Tcp,
    /// Persistent UDP tunnel.
    Udp,
}

impl FromStr for TransportProtocol {
    type Err = RouteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mqtt_server" => Ok(TransportProtocol::MqttServer),
            "tcp" => Ok(TransportProtocol::Tcp),
            "udp" => Ok(TransportProtocol::Udp),
            other => Err(RouteError::UnsupportedTransport {
                protocol: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for TransportProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TransportProtocol::MqttServer => "mqtt_server",
            TransportProtocol::Tcp => "tcp",
            TransportProtocol::Udp => "udp",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_protocols() {
        assert_eq!(
            "mqtt_server".parse::<TransportProtocol>().unwrap(),
            TransportProtocol::MqttServer
        );
        assert_eq!(
            "tcp".parse::<TransportProtocol>().unwrap(),
            TransportProtocol::Tcp
        );
        assert_eq!(
            "udp".parse::<TransportProtocol>().unwrap(),
            TransportProtocol::Udp
        );
    }

    #[test]
    fn test_parse_unknown_protocol_fails() {
        let err = "coap".parse::<TransportProtocol>().unwrap_err();
        assert!(matches!(
            err,
            RouteError::UnsupportedTransport { protocol } if protocol == "coap"
        ));
    }

    #[test]
    fn test_display_round_trip() {
        for p in [
            TransportProtocol::MqttServer,
            TransportProtocol::Tcp,
            TransportProtocol::Udp,
        ] {
            assert_eq!(p.to_string().parse::<TransportProtocol>().unwrap(), p);
        }
    }
}
