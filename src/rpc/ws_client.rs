//! WebSocket JSON-RPC 2.0 client for Substrate nodes
//!
//! Requests are sent one at a time; the reply is matched by id and any other
//! traffic in between (notifications for other subscriptions) is skipped.
//! No timeout is applied beyond what the transport does itself.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use super::{ChainRpc, RpcConnector, StorageChangeSet};
use crate::error::RpcError;

#[derive(Debug, Deserialize)]
struct JsonRpcErrorObject {
    code: i64,
    message: String,
}

/// Either a reply (has `id`) or a notification (has `method`)
#[derive(Debug, Deserialize)]
struct JsonRpcMessage {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<JsonRpcErrorObject>,
    #[serde(default)]
    method: Option<String>,
    #[serde(default)]
    params: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct SubscriptionParams {
    subscription: Value,
    result: Value,
}

fn subscription_id(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub struct WsRpcClient {
    url: String,
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    next_id: u64,
}

impl WsRpcClient {
    pub async fn connect(url: &str) -> Result<Self, RpcError> {
        log::debug!("Connecting to {}", url);
        let (stream, _) = connect_async(url).await.map_err(|e| RpcError::Connection {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            url: url.to_string(),
            stream,
            next_id: 1,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Read the next JSON-RPC message, answering pings along the way
    async fn read_message(&mut self) -> Result<JsonRpcMessage, RpcError> {
        loop {
            let frame = self
                .stream
                .next()
                .await
                .ok_or(RpcError::Closed)?
                .map_err(|e| RpcError::Transport(e.to_string()))?;

            let text = match frame {
                Message::Text(text) => text,
                Message::Binary(bytes) => String::from_utf8(bytes)
                    .map_err(|e| RpcError::InvalidResponse(e.to_string()))?,
                Message::Ping(payload) => {
                    self.stream
                        .send(Message::Pong(payload))
                        .await
                        .map_err(|e| RpcError::Transport(e.to_string()))?;
                    continue;
                }
                Message::Close(_) => return Err(RpcError::Closed),
                _ => continue,
            };

            return serde_json::from_str(&text)
                .map_err(|e| RpcError::InvalidResponse(format!("{}: {}", e, text)));
        }
    }

    /// Send a request and wait for its reply
    pub async fn request<T: DeserializeOwned>(
        &mut self,
        method: &str,
        params: Value,
    ) -> Result<T, RpcError> {
        let id = self.next_id;
        self.next_id += 1;

        let payload = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        log::debug!("→ {} {}", self.url, payload);
        self.stream
            .send(Message::Text(payload.to_string()))
            .await
            .map_err(|e| RpcError::Transport(e.to_string()))?;

        loop {
            let message = self.read_message().await?;
            if message.id.as_ref().and_then(Value::as_u64) != Some(id) {
                log::debug!("Skipping unrelated message while waiting for id {}", id);
                continue;
            }
            if let Some(error) = message.error {
                return Err(RpcError::Rpc {
                    code: error.code,
                    message: error.message,
                });
            }
            let result = message.result.unwrap_or(Value::Null);
            return serde_json::from_value(result)
                .map_err(|e| RpcError::InvalidResponse(e.to_string()));
        }
    }
}

#[async_trait]
impl ChainRpc for WsRpcClient {
    async fn storage(&mut self, key: &str) -> Result<Option<String>, RpcError> {
        self.request("state_getStorage", json!([key])).await
    }

    async fn subscribe_storage(&mut self, key: &str) -> Result<String, RpcError> {
        let id: Value = self.request("state_subscribeStorage", json!([[key]])).await?;
        Ok(subscription_id(&id))
    }

    async fn next_storage_change(
        &mut self,
        subscription: &str,
    ) -> Result<StorageChangeSet, RpcError> {
        loop {
            let message = self.read_message().await?;
            let (Some(method), Some(params)) = (message.method, message.params) else {
                continue;
            };
            if method != "state_storage" {
                continue;
            }
            let Ok(params) = serde_json::from_value::<SubscriptionParams>(params) else {
                continue;
            };
            if subscription_id(&params.subscription) != subscription {
                continue;
            }
            return serde_json::from_value(params.result)
                .map_err(|e| RpcError::InvalidResponse(e.to_string()));
        }
    }

    async fn close(&mut self) {
        if let Err(e) = self.stream.close(None).await {
            log::debug!("Error closing {}: {}", self.url, e);
        }
    }
}

/// Connector that opens a new WebSocket per call
#[derive(Clone, Default)]
pub struct WsConnector;

#[async_trait]
impl RpcConnector for WsConnector {
    async fn connect(&self, url: &str) -> Result<Box<dyn ChainRpc>, RpcError> {
        Ok(Box::new(WsRpcClient::connect(url).await?))
    }
}
