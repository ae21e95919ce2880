// HTTP handlers for mounted sub-sites and their shared assets
use crate::domain::proxy_route::{select_asset_origin, ProxyRoute};
use crate::infrastructure::upstream_proxy::{ForwardRequest, ProxyError};
use crate::presentation::app_state::AppState;
use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

/// Forward a request under `route.prefix` to the route's origin.
pub async fn proxy_mounted(state: Arc<AppState>, route: ProxyRoute, request: Request) -> Response {
    let result = async {
        let forward = ForwardRequest::from_request(request).await?;
        state.proxy.proxy_request(forward, &route).await
    }
    .await;

    result.unwrap_or_else(ProxyError::into_response)
}

fn referer(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(header::REFERER)?.to_str().ok()?;
    Some(
        urlencoding::decode(raw)
            .map(|d| d.into_owned())
            .unwrap_or_else(|_| raw.to_string()),
    )
}

/// `/_astro/*` and `/assets/*`, routed by the page that referenced them.
pub async fn asset_proxy(State(state): State<Arc<AppState>>, request: Request) -> Response {
    let referer = referer(request.headers());
    let target = select_asset_origin(referer.as_deref(), &state.asset_origins);
    tracing::debug!(
        "Asset request {} (referer {:?}) -> {}",
        request.uri().path(),
        referer,
        target.origin
    );

    let result = async {
        let forward = ForwardRequest::from_request(request).await?;
        state.proxy.fetch_asset(forward, target).await
    }
    .await;

    match result {
        Ok(response) => response,
        Err(e) => {
            tracing::error!("Error proxying asset: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, Body::from("Asset proxy error")).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_referer_is_decoded() {
        let mut headers = HeaderMap::new();
        assert_eq!(referer(&headers), None);

        headers.insert(
            header::REFERER,
            "https://site.test/curve%2Dviewer/x".parse().unwrap(),
        );
        assert_eq!(
            referer(&headers).as_deref(),
            Some("https://site.test/curve-viewer/x")
        );
    }
}
