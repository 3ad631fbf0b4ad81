use async_trait::async_trait;
use reqwest::{Client, header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE}};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::config::Config;
use crate::error::Error;
use crate::gateway::{DirectoryGateway, Request};
use crate::types::Result;

/// Gateway client speaking JSON over HTTP POST
pub struct HttpGateway {
    /// HTTP client
    client: Client,
    /// Gateway endpoint (base URL joined with basecgi)
    endpoint: Url,
}

impl HttpGateway {
    /// Create a client for the endpoint named in `config`
    pub fn new(config: &Config) -> Result<Self> {
        let endpoint = config.endpoint()?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let mut builder = Client::builder().default_headers(headers);
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| Error::HttpClient(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl DirectoryGateway for HttpGateway {
    async fn dispatch(&self, request: Request) -> Result<Value> {
        let verb = request.verb();
        debug!("POST {} verb={}", self.endpoint, verb);

        let response = self.client
            .post(self.endpoint.clone())
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::HttpClient(format!("Failed to send {} request: {}", verb, e)))?;

        let status = response.status();
        let body = response.bytes().await
            .map_err(|e| Error::HttpClient(format!("Failed to read {} response: {}", verb, e)))?;

        if !status.is_success() {
            let message = error_message(&body);
            warn!("Gateway rejected {} with {}: {}", verb, status, message);
            return Err(Error::Gateway {
                status: status.as_u16(),
                message,
            });
        }

        if !request.expects_body() || body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }

        serde_json::from_slice(&body)
            .map_err(|e| Error::Serialization(format!("Failed to parse {} response: {}", verb, e)))
    }
}

/// The gateway reports failures as `{"status": ..., "message": ...}`
fn error_message(body: &[u8]) -> String {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => match map.get("message") {
            Some(Value::String(message)) => message.clone(),
            _ => "Unknown error".to_string(),
        },
        _ => {
            let text = String::from_utf8_lossy(body).trim().to_string();
            if text.is_empty() { "Unknown error".to_string() } else { text }
        }
    }
}
