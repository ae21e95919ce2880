// Mount-prefix and referer routing for proxied sub-sites
use super::rewrite::normalize_prefix;
use serde::Deserialize;

/// A sub-site mounted under `prefix` and served from `origin`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProxyRoute {
    pub prefix: String,
    pub origin: String,
}

impl ProxyRoute {
    pub fn new(prefix: impl AsRef<str>, origin: impl AsRef<str>) -> Self {
        Self {
            prefix: normalize_prefix(prefix.as_ref()),
            origin: origin.as_ref().trim_end_matches('/').to_string(),
        }
    }
}

/// Asset origin chosen when the `Referer` contains `referer_marker`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AssetRoute {
    pub referer_marker: String,
    pub origin: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AssetOrigins {
    #[serde(default)]
    pub routes: Vec<AssetRoute>,
    pub default_origin: String,
    #[serde(default)]
    pub fallback_origin: Option<String>,
}

/// Origin to try first and, for unmatched referers, the origin to try on a 404.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetTarget<'a> {
    pub origin: &'a str,
    pub fallback: Option<&'a str>,
}

/// Strip `prefix` from the start of `path`. The bare prefix maps to "/"; paths
/// outside the prefix pass through unchanged.
pub fn strip_prefix_path(path: &str, prefix: &str) -> String {
    let prefix = normalize_prefix(prefix);
    if prefix == "/" {
        return path.to_string();
    }
    match path.strip_prefix(prefix.as_str()) {
        Some("") => "/".to_string(),
        Some(rest) if rest.starts_with('/') => rest.to_string(),
        _ => path.to_string(),
    }
}

pub fn upstream_url(origin: &str, path: &str, query: Option<&str>) -> String {
    let origin = origin.trim_end_matches('/');
    match query.filter(|q| !q.is_empty()) {
        Some(q) => format!("{}{}?{}", origin, path, q),
        None => format!("{}{}", origin, path),
    }
}

/// First route whose marker appears in the referer wins; otherwise the default
/// origin with its fallback.
pub fn select_asset_origin<'a>(referer: Option<&str>, origins: &'a AssetOrigins) -> AssetTarget<'a> {
    let referer = referer.unwrap_or("");
    if let Some(route) = origins
        .routes
        .iter()
        .find(|r| !referer.is_empty() && referer.contains(r.referer_marker.as_str()))
    {
        return AssetTarget {
            origin: &route.origin,
            fallback: None,
        };
    }
    AssetTarget {
        origin: &origins.default_origin,
        fallback: origins.fallback_origin.as_deref(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_prefix_path() {
        assert_eq!(strip_prefix_path("/curve-viewer/reports", "/curve-viewer"), "/reports");
        assert_eq!(strip_prefix_path("/curve-viewer", "/curve-viewer"), "/");
        assert_eq!(strip_prefix_path("/curve-viewer/", "/curve-viewer"), "/");
        assert_eq!(strip_prefix_path("/dayzer/a/b", "dayzer/"), "/a/b");
        assert_eq!(strip_prefix_path("/other/x", "/dayzer"), "/other/x");
        assert_eq!(strip_prefix_path("/dayzerx", "/dayzer"), "/dayzerx");
    }

    #[test]
    fn test_upstream_url() {
        assert_eq!(
            upstream_url("https://example.test", "/reports", Some("x=1")),
            "https://example.test/reports?x=1"
        );
        assert_eq!(upstream_url("https://example.test/", "/", None), "https://example.test/");
        assert_eq!(upstream_url("https://example.test", "/a", Some("")), "https://example.test/a");
    }

    #[test]
    fn test_proxy_route_normalizes() {
        let route = ProxyRoute::new("dayzer/", "https://dayzer.test/");
        assert_eq!(route.prefix, "/dayzer");
        assert_eq!(route.origin, "https://dayzer.test");
    }

    fn origins() -> AssetOrigins {
        AssetOrigins {
            routes: vec![
                AssetRoute {
                    referer_marker: "/short-term-outlook".to_string(),
                    origin: "https://dayzer.test".to_string(),
                },
                AssetRoute {
                    referer_marker: "/curve-viewer".to_string(),
                    origin: "https://gridstor.test".to_string(),
                },
            ],
            default_origin: "https://dayzer.test".to_string(),
            fallback_origin: Some("https://gridstor.test".to_string()),
        }
    }

    #[test]
    fn test_select_asset_origin() {
        let origins = origins();

        let target = select_asset_origin(Some("https://site.test/curve-viewer/x"), &origins);
        assert_eq!(target.origin, "https://gridstor.test");
        assert_eq!(target.fallback, None);

        let target = select_asset_origin(Some("https://site.test/short-term-outlook"), &origins);
        assert_eq!(target.origin, "https://dayzer.test");
        assert_eq!(target.fallback, None);

        let target = select_asset_origin(None, &origins);
        assert_eq!(target.origin, "https://dayzer.test");
        assert_eq!(target.fallback, Some("https://gridstor.test"));
    }
}
