// Upstream HTTP forwarding for mounted sub-sites and shared assets
use crate::domain::proxy_route::{strip_prefix_path, upstream_url, AssetTarget, ProxyRoute};
use crate::domain::rewrite::{rewrite_html, RewriteRules};
use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderName, Method, Request, Response, StatusCode};
use axum::response::IntoResponse;
use bytes::Bytes;
use futures::StreamExt;
use std::time::Duration;

/// Largest request body forwarded upstream.
const MAX_FORWARD_BODY_BYTES: usize = 10 * 1024 * 1024;

const HOP_BY_HOP: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("failed to read request body: {0}")]
    Request(String),
    #[error("upstream fetch of {url} failed: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("upstream {url} answered {status} redirect to '{location}'")]
    Redirect {
        url: String,
        status: u16,
        location: String,
    },
    #[error("failed to read upstream body from {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> axum::response::Response {
        tracing::error!("Proxy error: {}", self);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            format!("Proxy error: {}", self),
        )
            .into_response()
    }
}

/// Method, path, query, headers and body of an incoming request, detached from axum.
pub struct ForwardRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl ForwardRequest {
    pub async fn from_request(request: Request<Body>) -> Result<Self, ProxyError> {
        let (parts, body) = request.into_parts();
        let body = if parts.method == Method::GET || parts.method == Method::HEAD {
            Bytes::new()
        } else {
            axum::body::to_bytes(body, MAX_FORWARD_BODY_BYTES)
                .await
                .map_err(|e| ProxyError::Request(e.to_string()))?
        };
        Ok(Self {
            method: parts.method,
            path: parts.uri.path().to_string(),
            query: parts.uri.query().map(str::to_string),
            headers: parts.headers,
            body,
        })
    }
}

/// Shared client; connection pooling is the only state it carries.
#[derive(Clone)]
pub struct UpstreamProxy {
    client: reqwest::Client,
}

impl UpstreamProxy {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }

    /// Forward under a mounted prefix. Redirects surface as errors; HTML is rewritten
    /// to stay under the prefix; everything else streams through.
    pub async fn proxy_request(
        &self,
        request: ForwardRequest,
        route: &ProxyRoute,
    ) -> Result<Response<Body>, ProxyError> {
        let path = strip_prefix_path(&request.path, &route.prefix);
        let url = upstream_url(&route.origin, &path, request.query.as_deref());
        tracing::debug!("Proxying {} {} -> {}", request.method, request.path, url);

        let response = self.send(&request, &url).await?;

        if response.status().is_redirection() {
            let location = response
                .headers()
                .get(header::LOCATION)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("")
                .to_string();
            return Err(ProxyError::Redirect {
                url,
                status: response.status().as_u16(),
                location,
            });
        }

        if is_html(response.headers()) {
            let status = response.status();
            let headers = response_headers(response.headers(), true);
            let text = response
                .text()
                .await
                .map_err(|source| ProxyError::Body { url, source })?;
            let body = rewrite_html(&text, &RewriteRules::for_prefix(&route.prefix));
            return Ok(build_response(status, headers, Body::from(body)));
        }

        Ok(passthrough(response, url))
    }

    /// Fetch a shared asset from the chosen origin, retrying once on the fallback
    /// origin when the primary answers 404.
    pub async fn fetch_asset(
        &self,
        request: ForwardRequest,
        target: AssetTarget<'_>,
    ) -> Result<Response<Body>, ProxyError> {
        let url = upstream_url(target.origin, &request.path, request.query.as_deref());
        let response = self.send(&request, &url).await?;

        if response.status() == StatusCode::NOT_FOUND {
            if let Some(fallback) = target.fallback {
                let fallback_url = upstream_url(fallback, &request.path, request.query.as_deref());
                tracing::info!("Asset not found at {}, trying {}", url, fallback_url);
                let retry = self.send(&request, &fallback_url).await?;
                if retry.status().is_success() {
                    return Ok(passthrough(retry, fallback_url));
                }
            }
        }

        Ok(passthrough(response, url))
    }

    async fn send(&self, request: &ForwardRequest, url: &str) -> Result<reqwest::Response, ProxyError> {
        let mut builder = self
            .client
            .request(request.method.clone(), url)
            .headers(request_headers(&request.headers));
        if !request.body.is_empty() {
            builder = builder.body(request.body.clone());
        }
        builder.send().await.map_err(|source| ProxyError::Fetch {
            url: url.to_string(),
            source,
        })
    }
}

fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP.contains(&name.as_str())
}

/// Incoming headers minus hop-by-hop ones and those the client recomputes.
/// `accept-encoding` is dropped so upstream bodies arrive uncompressed.
pub fn request_headers(incoming: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for (name, value) in incoming {
        if is_hop_by_hop(name)
            || name == header::HOST
            || name == header::CONTENT_LENGTH
            || name == header::ACCEPT_ENCODING
        {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }
    headers
}

/// Upstream headers minus hop-by-hop ones; a rewritten body also loses its length.
pub fn response_headers(upstream: &HeaderMap, body_rewritten: bool) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for (name, value) in upstream {
        if is_hop_by_hop(name) {
            continue;
        }
        if body_rewritten && (name == header::CONTENT_LENGTH || name == header::CONTENT_ENCODING) {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }
    headers
}

fn is_html(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.contains("text/html"))
}

fn build_response(status: StatusCode, headers: HeaderMap, body: Body) -> Response<Body> {
    let mut response = Response::new(body);
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}

fn passthrough(response: reqwest::Response, url: String) -> Response<Body> {
    let status = response.status();
    let headers = response_headers(response.headers(), false);
    let stream = response.bytes_stream().map(move |chunk| {
        if let Err(e) = &chunk {
            tracing::warn!("Upstream stream from {} failed: {}", url, e);
        }
        chunk
    });
    build_response(status, headers, Body::from_stream(stream))
}
