//! Endpoint resolution and candidate fallback
//!
//! Decides which backend address to try first and how to demote across the
//! remaining candidates. Candidates are attempted strictly in sequence so
//! that "stop on definitive error" is well-defined; they are never raced.

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;

use crate::config::BackendConfig;
use crate::error::{AppError, AppResult};

/// Minimal HTTP reply as seen by the resolver
#[derive(Debug, Clone)]
pub struct HttpReply {
    pub status: u16,
    /// Parsed JSON body; `None` when the body was absent or unparseable
    pub body: Option<Value>,
}

/// Transport-level failure: no HTTP response was obtained at all
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct TransportError(pub String);

/// HTTP client seam; the production implementation wraps reqwest, tests
/// mock it
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(
        &self,
        method: Method,
        url: String,
        body: Option<Value>,
    ) -> Result<HttpReply, TransportError>;
}

/// reqwest-backed transport
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(
        &self,
        method: Method,
        url: String,
        body: Option<Value>,
    ) -> Result<HttpReply, TransportError> {
        let mut request = self.client.request(method, &url);
        if let Some(body) = &body {
            request = request.json(body);
        }
        let response = request
            .send()
            .await
            .map_err(|e| TransportError(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response.json::<Value>().await.ok();
        Ok(HttpReply { status, body })
    }
}

/// One backend address attempted in priority order
#[derive(Debug, Clone, PartialEq, Eq)]
enum Candidate {
    /// An absolute base address
    Base(String),
    /// The bare path against the client's own origin
    SameOrigin,
}

pub struct EndpointResolver {
    config: BackendConfig,
    transport: Box<dyn HttpTransport>,
}

impl EndpointResolver {
    pub fn new(config: BackendConfig, transport: Box<dyn HttpTransport>) -> Self {
        Self { config, transport }
    }

    /// Set or clear the manual override address at runtime
    pub fn set_manual_override(&mut self, address: Option<String>) {
        self.config.manual_override = address;
    }

    /// Candidate base addresses in priority order, deduplicated while
    /// preserving order: manual override, build-time default, then either
    /// the known remote (when the client origin is a loopback host with no
    /// backend of its own) or the same-origin bare path.
    fn candidates(&self) -> Vec<Candidate> {
        let mut out: Vec<Candidate> = Vec::new();
        let mut push = |c: Candidate, out: &mut Vec<Candidate>| {
            if !out.contains(&c) {
                out.push(c);
            }
        };
        if let Some(address) = &self.config.manual_override {
            push(Candidate::Base(normalize_base(address)), &mut out);
        }
        if let Some(address) = &self.config.default_address {
            push(Candidate::Base(normalize_base(address)), &mut out);
        }
        if is_loopback_origin(&self.config.origin) {
            push(
                Candidate::Base(normalize_base(&self.config.dev_fallback_address)),
                &mut out,
            );
        } else {
            push(Candidate::SameOrigin, &mut out);
        }
        out
    }

    fn url_for(&self, candidate: &Candidate, path: &str) -> String {
        match candidate {
            Candidate::Base(base) => format!("{}{}", base, path),
            Candidate::SameOrigin => format!("{}{}", normalize_base(&self.config.origin), path),
        }
    }

    /// Issue a request against the candidate sequence.
    ///
    /// A transport error moves to the next candidate. A 2xx returns its
    /// parsed body immediately. 404 and 5xx mean "this candidate's server
    /// lacks the route": remembered as the best-effort error, then on to
    /// the next candidate. Any other status is a definitive application
    /// failure and stops the sequence.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> AppResult<Value> {
        let mut remembered: Option<(u16, String)> = None;
        for candidate in self.candidates() {
            let url = self.url_for(&candidate, path);
            tracing::debug!(%url, "trying candidate endpoint");
            match self.transport.send(method.clone(), url.clone(), body.clone()).await {
                Err(e) => {
                    tracing::debug!(%url, error = %e, "candidate unreachable");
                }
                Ok(reply) if (200..300).contains(&reply.status) => {
                    return Ok(reply.body.unwrap_or(Value::Null));
                }
                Ok(reply) if reply.status == 404 || reply.status >= 500 => {
                    tracing::debug!(%url, status = reply.status, "candidate lacks route");
                    remembered = Some((reply.status, error_message(&reply)));
                }
                Ok(reply) => {
                    return Err(AppError::Application {
                        status: reply.status,
                        message: error_message(&reply),
                    });
                }
            }
        }
        match remembered {
            Some((status, message)) => Err(AppError::RouteMissing {
                status,
                message: if message.is_empty() {
                    "this backend build does not serve the route; redeploy or restart the backend"
                        .to_string()
                } else {
                    message
                },
            }),
            None => Err(AppError::Unreachable),
        }
    }

    pub async fn get(&self, path: &str) -> AppResult<Value> {
        self.request(Method::GET, path, None).await
    }

    pub async fn post(&self, path: &str, body: Value) -> AppResult<Value> {
        self.request(Method::POST, path, Some(body)).await
    }

    pub async fn patch(&self, path: &str, body: Value) -> AppResult<Value> {
        self.request(Method::PATCH, path, Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> AppResult<Value> {
        self.request(Method::DELETE, path, None).await
    }
}

fn normalize_base(address: &str) -> String {
    address.trim().trim_end_matches('/').to_string()
}

/// Error responses carry an `error` message string; anything else is
/// tolerated and treated as empty
fn error_message(reply: &HttpReply) -> String {
    reply
        .body
        .as_ref()
        .and_then(|b| b.get("error"))
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string()
}

/// Whether the client is being served from a loopback/developer host
fn is_loopback_origin(origin: &str) -> bool {
    let after_scheme = origin.split("://").nth(1).unwrap_or(origin);
    let authority = after_scheme.split('/').next().unwrap_or("");
    let host = if let Some(v6) = authority.strip_prefix('[') {
        v6.split(']').next().unwrap_or("")
    } else {
        authority.split(':').next().unwrap_or("")
    };
    matches!(host, "localhost" | "127.0.0.1" | "::1" | "0.0.0.0")
}
