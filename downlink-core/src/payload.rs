use downlink_error::RouteResult;
use downlink_models::{GatewayEnvelope, Identity, TunnelEnvelope};
use serde_json::{Map, Value};

/// Serialize the platform request envelope for publish/subscribe
/// delivery.
///
/// Always emits `{id, version, params, method}`; the `identity` key is
/// added only when relaying, so key presence alone signals relay to
/// the consuming gateway.
pub fn build_gateway_envelope(
    id: &str,
    version: &str,
    method: &str,
    params: Map<String, Value>,
    identity: Option<Identity>,
) -> RouteResult<Vec<u8>> {
    let envelope = GatewayEnvelope {
        id: id.to_string(),
        version: version.to_string(),
        params,
        method: method.to_string(),
        identity,
    };
    Ok(serde_json::to_vec(&envelope)?)
}

/// Serialize the tunnel payload.
///
/// Without an identity the params are emitted verbatim, keeping
/// backward compatibility with tunnel consumers that predate relay
/// support. With an identity the payload is wrapped as
/// `{params, identity}`.
pub fn build_tunnel_envelope(
    params: Map<String, Value>,
    identity: Option<Identity>,
) -> RouteResult<Vec<u8>> {
    match identity {
        None => Ok(serde_json::to_vec(&Value::Object(params))?),
        Some(identity) => Ok(serde_json::to_vec(&TunnelEnvelope { params, identity })?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params() -> Map<String, Value> {
        let mut m = Map::new();
        m.insert("switch".to_string(), json!(1));
        m
    }

    fn identity() -> Identity {
        Identity {
            product_key: "sub-pk".to_string(),
            device_key: "sub-dk".to_string(),
        }
    }

    #[test]
    fn test_gateway_envelope_round_trip() {
        let bytes = build_gateway_envelope(
            "id-1",
            "1.0.0",
            "thing.service.property.set",
            params(),
            None,
        )
        .unwrap();
        let decoded: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(decoded["id"], json!("id-1"));
        assert_eq!(decoded["version"], json!("1.0.0"));
        assert_eq!(decoded["method"], json!("thing.service.property.set"));
        assert_eq!(decoded["params"], json!({"switch": 1}));
        assert!(decoded.get("identity").is_none());
    }

    #[test]
    fn test_gateway_envelope_identity_present_iff_relayed() {
        let bytes = build_gateway_envelope(
            "id-2",
            "1.0.0",
            "thing.service.turn_on",
            params(),
            Some(identity()),
        )
        .unwrap();
        let decoded: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(decoded["identity"]["productKey"], json!("sub-pk"));
        assert_eq!(decoded["identity"]["deviceKey"], json!("sub-dk"));
    }

    #[test]
    fn test_tunnel_envelope_without_identity_is_bare_params() {
        let bytes = build_tunnel_envelope(params(), None).unwrap();
        let decoded: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(decoded, json!({"switch": 1}));
    }

    #[test]
    fn test_tunnel_envelope_with_identity_wraps_params() {
        let bytes = build_tunnel_envelope(params(), Some(identity())).unwrap();
        let decoded: Value = serde_json::from_slice(&bytes).unwrap();
        let obj = decoded.as_object().unwrap();
        assert_eq!(obj.len(), 2);
        assert_eq!(decoded["params"], json!({"switch": 1}));
        assert_eq!(decoded["identity"]["deviceKey"], json!("sub-dk"));
    }
}
