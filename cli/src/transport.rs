//! Executes core `HttpRequest`s over the network with ureq.
//!
//! Status codes are returned as data, never as transport errors, so
//! `logo_core` stays the single place that maps 404/401/5xx to `ApiError`.

use std::time::Duration;

use anyhow::Context;
use logo_core::{HttpMethod, HttpRequest, HttpResponse};
use ureq::{Agent, RequestBuilder};

pub struct Transport {
    agent: Agent,
}

impl Transport {
    pub fn new(timeout: Duration) -> Self {
        let agent = Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(timeout))
            .build()
            .new_agent();
        Self { agent }
    }

    pub fn execute(&self, req: HttpRequest) -> anyhow::Result<HttpResponse> {
        let HttpRequest {
            method,
            path,
            headers,
            body,
        } = req;
        tracing::debug!(%method, url = %path, "sending");

        let result = match method {
            HttpMethod::Get => with_headers(self.agent.get(&path), &headers).call(),
            HttpMethod::Delete => with_headers(self.agent.delete(&path), &headers).call(),
            HttpMethod::Post => send(with_headers(self.agent.post(&path), &headers), body),
            HttpMethod::Put => send(with_headers(self.agent.put(&path), &headers), body),
            HttpMethod::Patch => send(with_headers(self.agent.patch(&path), &headers), body),
        };
        let mut response = result.with_context(|| format!("{method} {path} failed"))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    value.to_str().unwrap_or_default().to_string(),
                )
            })
            .collect();
        let body = response
            .body_mut()
            .read_to_string()
            .with_context(|| format!("reading response of {method} {path}"))?;
        tracing::debug!(status, bytes = body.len(), "received");

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn with_headers<B>(mut builder: RequestBuilder<B>, headers: &[(String, String)]) -> RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

fn send(
    builder: RequestBuilder<ureq::typestate::WithBody>,
    body: Option<String>,
) -> Result<ureq::http::Response<ureq::Body>, ureq::Error> {
    match body {
        Some(body) => builder.send(body.as_bytes()),
        None => builder.send_empty(),
    }
}
