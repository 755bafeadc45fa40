//! etcd v3 store over the JSON gateway.
//!
//! etcd serves its KV API as JSON on `/v3/kv/*` next to gRPC. Keys and
//! values travel base64 encoded and 64-bit counters arrive as strings.
//! Endpoints are tried in order; a transport failure moves on to the next
//! one, an HTTP error status is returned as is.

use super::backend::{BackendType, KeyValue, KvStore};
use crate::{Error, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// User-Agent header sent with every request
const USER_AGENT: &str = concat!("etcd-configer/", env!("CARGO_PKG_VERSION"));

const RANGE_PATH: &str = "/v3/kv/range";
const PUT_PATH: &str = "/v3/kv/put";
const DELETE_RANGE_PATH: &str = "/v3/kv/deleterange";

#[derive(Debug, Serialize)]
struct RangeRequest {
    key: String,
    range_end: String,
}

#[derive(Debug, Deserialize)]
struct RangeResponse {
    #[serde(default)]
    kvs: Vec<GatewayKeyValue>,
}

#[derive(Debug, Deserialize)]
struct GatewayKeyValue {
    key: String,
    /// Omitted by the gateway when the value is empty.
    #[serde(default)]
    value: String,
}

#[derive(Debug, Serialize)]
struct PutRequest {
    key: String,
    value: String,
}

#[derive(Debug, Serialize)]
struct DeleteRangeRequest {
    key: String,
}

#[derive(Debug, Deserialize)]
struct DeleteRangeResponse {
    #[serde(default)]
    deleted: Option<serde_json::Value>,
}

/// Exclusive upper bound covering every key that starts with `prefix`.
///
/// An empty prefix, or one made only of `0xff` bytes, maps to `"\0"`,
/// which etcd reads as "to the end of the keyspace".
pub fn prefix_range_end(prefix: &[u8]) -> Vec<u8> {
    let mut end = prefix.to_vec();
    for i in (0..end.len()).rev() {
        if end[i] < 0xff {
            end[i] += 1;
            end.truncate(i + 1);
            return end;
        }
    }
    vec![0]
}

impl RangeRequest {
    /// Range over every key starting with `prefix`.
    ///
    /// etcd treats an empty `key` as a missing argument, so the empty prefix
    /// becomes the `"\0"`..`"\0"` range, which means the whole keyspace.
    fn prefix(prefix: &str) -> Self {
        let start: &[u8] = if prefix.is_empty() { &[0] } else { prefix.as_bytes() };
        Self {
            key: STANDARD.encode(start),
            range_end: STANDARD.encode(prefix_range_end(prefix.as_bytes())),
        }
    }
}

/// Turn `host:port` into a base URL; explicit schemes are kept.
pub fn normalize_endpoint(endpoint: &str) -> String {
    let trimmed = endpoint.trim().trim_end_matches('/');
    if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    }
}

fn decode(field: &str, encoded: &str) -> Result<Vec<u8>> {
    STANDARD
        .decode(encoded)
        .map_err(|e| Error::Store(format!("invalid base64 in {}: {}", field, e)))
}

fn parse_deleted(value: Option<serde_json::Value>) -> u64 {
    match value {
        Some(serde_json::Value::String(s)) => s.parse().unwrap_or(0),
        Some(serde_json::Value::Number(n)) => n.as_u64().unwrap_or(0),
        _ => 0,
    }
}

/// etcd client speaking the v3 JSON gateway.
pub struct EtcdStore {
    endpoints: Vec<String>,
    agent: ureq::Agent,
}

impl EtcdStore {
    /// Build a client for `endpoints`. No request is made until first use.
    pub fn connect(endpoints: &[String], dial_timeout: Duration) -> Result<Self> {
        let endpoints: Vec<String> = endpoints
            .iter()
            .filter(|e| !e.trim().is_empty())
            .map(|e| normalize_endpoint(e))
            .collect();
        if endpoints.is_empty() {
            return Err(Error::InvalidInput("no etcd endpoints configured".to_string()));
        }

        tracing::info!(endpoints = ?endpoints, "connecting to etcd endpoints");
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(dial_timeout)
            .user_agent(USER_AGENT)
            .build();

        Ok(Self { endpoints, agent })
    }

    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }

    fn call<Req, Resp>(&self, path: &str, body: &Req, deadline: Instant) -> Result<Resp>
    where
        Req: Serialize,
        Resp: DeserializeOwned,
    {
        let mut last_error = None;
        for endpoint in &self.endpoints {
            let remaining = deadline
                .checked_duration_since(Instant::now())
                .filter(|d| !d.is_zero())
                .ok_or_else(|| Error::Timeout(path.to_string()))?;
            let url = format!("{}{}", endpoint, path);

            match self.agent.post(&url).timeout(remaining).send_json(body) {
                Ok(response) => {
                    return response
                        .into_json::<Resp>()
                        .map_err(|e| Error::Store(format!("{}: bad response: {}", url, e)));
                }
                Err(ureq::Error::Status(code, response)) => {
                    let body = response.into_string().unwrap_or_default();
                    return Err(Error::Store(format!("{}: HTTP {}: {}", url, code, body)));
                }
                Err(e) => {
                    tracing::warn!(endpoint = %endpoint, error = %e, "etcd endpoint unreachable");
                    last_error = Some(Error::Http(e.to_string()));
                }
            }
        }
        Err(last_error.unwrap_or_else(|| Error::Store("no etcd endpoints configured".to_string())))
    }
}

impl KvStore for EtcdStore {
    fn scan_prefix(&self, prefix: &str, deadline: Instant) -> Result<Vec<KeyValue>> {
        let request = RangeRequest::prefix(prefix);
        let response: RangeResponse = self.call(RANGE_PATH, &request, deadline)?;
        response
            .kvs
            .into_iter()
            .map(|kv| Ok(KeyValue::new(decode("key", &kv.key)?, decode("value", &kv.value)?)))
            .collect()
    }

    fn put(&self, key: &str, value: &str, deadline: Instant) -> Result<()> {
        let request = PutRequest {
            key: STANDARD.encode(key),
            value: STANDARD.encode(value),
        };
        let _: serde::de::IgnoredAny = self.call(PUT_PATH, &request, deadline)?;
        Ok(())
    }

    fn delete(&self, key: &str, deadline: Instant) -> Result<u64> {
        let request = DeleteRangeRequest {
            key: STANDARD.encode(key),
        };
        let response: DeleteRangeResponse = self.call(DELETE_RANGE_PATH, &request, deadline)?;
        Ok(parse_deleted(response.deleted))
    }

    fn location(&self) -> String {
        self.endpoints.join(",")
    }

    fn backend_type(&self) -> BackendType {
        BackendType::Etcd
    }
}
