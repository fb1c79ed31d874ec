// SimpliSafe HTTP client
//
// Wraps `reqwest::Client` with base-URL joining, form encoding and explicit
// cookie capture. The client does not interpret status codes or bodies:
// that is the controller's job once the completion is routed back to it.

use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::request::VendorRequest;
use crate::session::Cookie;
use crate::transport::TransportConfig;

/// A completed HTTP exchange, before any interpretation.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub cookies: Vec<Cookie>,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            cookies: Vec::new(),
            body: body.into(),
        }
    }

    pub fn with_cookies(mut self, cookies: Vec<Cookie>) -> Self {
        self.cookies = cookies;
        self
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }
}

/// Raw HTTP client for the SimpliSafe mobile API.
#[derive(Debug, Clone)]
pub struct SimpliSafeClient {
    http: reqwest::Client,
    base_url: Url,
}

impl SimpliSafeClient {
    /// Create a client from a `TransportConfig`.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self { http, base_url })
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    /// Execute a request and capture status, cookies and body.
    ///
    /// Non-2xx statuses are returned as responses, not errors. Only failures
    /// to reach the server or read the body surface as `Err`.
    pub async fn execute(&self, request: &VendorRequest) -> Result<HttpResponse, Error> {
        let url = self.base_url.join(&request.path)?;
        debug!(kind = %request.kind, "POST {}", url);

        let mut builder = self.http.post(url).form(&request.form);
        if let Some(cookies) = &request.cookie_header {
            builder = builder.header(reqwest::header::COOKIE, cookies);
        }

        let resp = builder.send().await?;
        let status = resp.status().as_u16();
        let cookies: Vec<Cookie> = resp
            .cookies()
            .map(|c| Cookie::new(c.name(), c.value()))
            .collect();
        let body = resp.text().await?;

        trace!(kind = %request.kind, status, cookies = cookies.len(), %body, "response received");

        Ok(HttpResponse {
            status,
            cookies,
            body,
        })
    }
}
