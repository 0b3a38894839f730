use chatbridge_core::api::{BackendError, TransportKind};
use serde_json::Value;

const BODY_PREVIEW_LIMIT: usize = 512;

fn from_reqwest(err: reqwest::Error, url: &str) -> BackendError {
    let kind = if err.is_timeout() {
        TransportKind::Timeout
    } else if err.is_connect() {
        TransportKind::Connect
    } else if err.is_request() {
        TransportKind::Request
    } else if err.is_body() || err.is_decode() {
        TransportKind::Body
    } else {
        TransportKind::Unknown
    };
    BackendError::Transport {
        kind,
        url: url.to_string(),
        message: err.to_string(),
    }
}

pub(crate) fn preview_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "<empty body>".to_string();
    }

    let mut out: String = trimmed.chars().take(BODY_PREVIEW_LIMIT).collect();
    if trimmed.chars().nth(BODY_PREVIEW_LIMIT).is_some() {
        out.push_str("...");
    }
    out
}

async fn parse_json_response(resp: reqwest::Response) -> Result<Value, BackendError> {
    let status = resp.status();
    let url = resp.url().to_string();
    let body = resp.text().await.map_err(|err| from_reqwest(err, &url))?;

    if !status.is_success() {
        return Err(BackendError::Status {
            status: status.as_u16(),
            url,
            body: preview_body(&body),
        });
    }

    if body.trim().is_empty() {
        return Ok(Value::Null);
    }

    serde_json::from_str::<Value>(&body).map_err(|err| BackendError::Decode {
        url,
        message: format!("{err} | body={}", preview_body(&body)),
    })
}

/// Thin JSON client for the chat gateway's REST surface.
#[derive(Clone)]
pub struct GatewayClient {
    api_key: String,
    http: reqwest::Client,
    base_url: String,
}

impl GatewayClient {
    pub fn new(base_url: &str, api_key: String, timeout_ms: u64) -> Result<Self, BackendError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(timeout_ms))
            .build()
            .map_err(|err| from_reqwest(err, base_url))?;
        Ok(Self {
            api_key,
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if self.api_key.trim().is_empty() {
            req
        } else {
            req.header("apikey", &self.api_key)
        }
    }

    pub async fn get(&self, path: &str) -> Result<Value, BackendError> {
        let url = self.url(path);
        tracing::debug!(target: "chatbridge.gateway", stage = "gateway.http.get", url = %url);
        let resp = self
            .auth(self.http.get(&url))
            .send()
            .await
            .map_err(|err| from_reqwest(err, &url))?;
        parse_json_response(resp).await
    }

    pub async fn post(&self, path: &str, payload: &Value) -> Result<Value, BackendError> {
        let url = self.url(path);
        tracing::debug!(target: "chatbridge.gateway", stage = "gateway.http.post", url = %url);
        let resp = self
            .auth(self.http.post(&url).json(payload))
            .send()
            .await
            .map_err(|err| from_reqwest(err, &url))?;
        parse_json_response(resp).await
    }
}
