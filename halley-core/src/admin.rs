//! Client for the node's local JSON-RPC admin endpoint.
//!
//! After a successful start the tool pushes a single runtime configuration
//! update. Only the HTTP status matters: 200 is success, anything else
//! (including a refused connection) is an error the caller downgrades to a
//! warning, since the node itself is already running.

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::errors::{CoreError, Result};

/// The `{method, params, id}` request envelope.
#[derive(Debug, Serialize)]
struct RpcEnvelope<'a> {
    method: &'a str,
    params: &'a Value,
    id: u32,
}

#[derive(Debug, Clone)]
pub struct AdminClient {
    endpoint: String,
    http: reqwest::Client,
}

impl AdminClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            http: reqwest::Client::new(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// POST one configuration update to the admin endpoint.
    pub async fn push(&self, method: &str, params: Value) -> Result<()> {
        let envelope = RpcEnvelope {
            method,
            params: &params,
            id: 1,
        };

        debug!("Admin call {} -> {}", method, self.endpoint);
        let response = self
            .http
            .post(&self.endpoint)
            .json(&envelope)
            .send()
            .await
            .map_err(CoreError::Admin)?;

        let status = response.status();
        if status == reqwest::StatusCode::OK {
            Ok(())
        } else {
            Err(CoreError::AdminStatus {
                status: status.as_u16(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_shape() {
        let params = json!([{ "governanceProposerPayload": "0xabc" }]);
        let envelope = RpcEnvelope {
            method: "node_setConfig",
            params: &params,
            id: 1,
        };

        let encoded = serde_json::to_value(&envelope).unwrap();
        assert_eq!(
            encoded,
            json!({
                "method": "node_setConfig",
                "params": [{ "governanceProposerPayload": "0xabc" }],
                "id": 1,
            })
        );
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_an_error() {
        // Nothing listens here; the caller is expected to downgrade this
        // to a warning.
        let client = AdminClient::new("http://127.0.0.1:1/rpc");
        let err = client.push("node_setConfig", json!([])).await.unwrap_err();
        assert_eq!(err.kind(), crate::errors::ErrorKind::Process);
    }
}
