//! Transport layer for coordination service requests

use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use std::fmt;
use std::time::Duration;

use crate::error::Result;

/// HTTP method used by the coordination API
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => f.write_str("GET"),
            Method::Post => f.write_str("POST"),
        }
    }
}

/// Request body
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Payload {
    Empty,
    Json(String),
    Jpeg(Vec<u8>),
}

/// Raw reply: any status code, body as text
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reply {
    pub status: u16,
    pub body: String,
}

impl Reply {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// Single request/reply exchange with the coordination service.
///
/// Implementations perform exactly one attempt; retries live in the client.
/// `Err` means the exchange did not complete (refused, reset, timed out).
pub trait Transport: Send {
    fn send(
        &mut self,
        method: Method,
        endpoint: &str,
        payload: &Payload,
        timeout: Duration,
    ) -> Result<Reply>;
}

/// Blocking HTTP transport
pub struct HttpTransport {
    base_url: String,
    client: Client,
}

impl HttpTransport {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder().build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl Transport for HttpTransport {
    fn send(
        &mut self,
        method: Method,
        endpoint: &str,
        payload: &Payload,
        timeout: Duration,
    ) -> Result<Reply> {
        let url = format!("{}{}", self.base_url, endpoint);
        let request = match method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
        }
        .timeout(timeout);

        let request = match payload {
            Payload::Empty => request,
            Payload::Json(json) => request
                .header(CONTENT_TYPE, "application/json")
                .body(json.clone()),
            Payload::Jpeg(bytes) => request
                .header(CONTENT_TYPE, "image/jpeg")
                .body(bytes.clone()),
        };

        let response = request.send()?;
        let status = response.status().as_u16();
        let body = response.text()?;
        Ok(Reply { status, body })
    }
}
