// Root-relative URL rewriting for HTML served under a path prefix
use regex::{Captures, Regex};
use std::sync::LazyLock;

/// Root-relative paths that are already relocated by the asset rules or must stay put.
const PROTECTED_PATHS: [&str; 3] = ["_astro/", "assets/", "favicon"];

const ASSET_ATTRS: [&str; 2] = ["href", "src"];
const ASSET_PATHS: [&str; 3] = ["/_astro/", "/assets/", "/favicon"];

static ATTR_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r##"(href|src|action)="/([^"#?\s]*)"##).expect("attribute pattern is valid")
});

static CSS_URL_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r##"url\((['"]?)/([^)'"#?\s]*)"##).expect("css url pattern is valid")
});

#[derive(Debug, Clone, PartialEq)]
pub enum RewriteRule {
    /// Replace every occurrence of `from` with `to`.
    Literal { from: String, to: String },
    /// Re-prefix root-relative `href`/`src`/`action` values not already handled.
    RootRelativeAttributes,
    /// Re-prefix root-relative CSS `url(...)` references.
    CssUrls,
}

/// Ordered rewrite rules for one mount prefix.
///
/// Order matters: asset rules run before the generic root-relative rules, which
/// skip anything already under the prefix or under an asset directory.
#[derive(Debug, Clone, PartialEq)]
pub struct RewriteRules {
    prefix: String,
    rules: Vec<RewriteRule>,
}

impl RewriteRules {
    pub fn for_prefix(prefix: &str) -> Self {
        let prefix = normalize_prefix(prefix);
        let mut rules = Vec::new();

        for path in ASSET_PATHS {
            for attr in ASSET_ATTRS {
                rules.push(RewriteRule::Literal {
                    from: format!("{}=\"{}", attr, path),
                    to: format!("{}=\"{}{}", attr, prefix, path),
                });
            }
        }
        rules.push(RewriteRule::Literal {
            from: "<base href=\"/\">".to_string(),
            to: format!("<base href=\"{}/\">", prefix),
        });
        rules.push(RewriteRule::Literal {
            from: "href=\"/\"".to_string(),
            to: format!("href=\"{}/\"", prefix),
        });
        rules.push(RewriteRule::RootRelativeAttributes);
        rules.push(RewriteRule::CssUrls);

        Self { prefix, rules }
    }

    #[cfg(test)]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    #[cfg(test)]
    pub fn rules(&self) -> &[RewriteRule] {
        &self.rules
    }

    /// Already under the prefix, or protocol-relative ("//host/...").
    fn is_mounted(&self, path: &str) -> bool {
        path.starts_with('/') || starts_with_segment(path, self.prefix.trim_start_matches('/'))
    }

    fn is_protected(&self, path: &str) -> bool {
        self.is_mounted(path) || PROTECTED_PATHS.iter().any(|p| path.starts_with(p))
    }
}

/// Apply `rules` in order to an HTML document. Purely textual; not DOM aware.
pub fn rewrite_html(body: &str, rules: &RewriteRules) -> String {
    let mut text = body.to_string();
    for rule in &rules.rules {
        text = match rule {
            RewriteRule::Literal { from, to } => text.replace(from.as_str(), to),
            RewriteRule::RootRelativeAttributes => ATTR_PATH
                .replace_all(&text, |caps: &Captures| {
                    let path = &caps[2];
                    if rules.is_protected(path) {
                        caps[0].to_string()
                    } else {
                        format!("{}=\"{}/{}", &caps[1], rules.prefix, path)
                    }
                })
                .into_owned(),
            RewriteRule::CssUrls => CSS_URL_PATH
                .replace_all(&text, |caps: &Captures| {
                    let path = &caps[2];
                    if rules.is_protected(path) {
                        caps[0].to_string()
                    } else {
                        format!("url({}{}/{}", &caps[1], rules.prefix, path)
                    }
                })
                .into_owned(),
        };
    }
    text
}

/// "/dayzer/" -> "/dayzer", "dayzer" -> "/dayzer".
pub fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_matches('/');
    format!("/{}", trimmed)
}

fn starts_with_segment(path: &str, segment: &str) -> bool {
    if segment.is_empty() {
        return false;
    }
    match path.strip_prefix(segment) {
        Some(rest) => rest
            .chars()
            .next()
            .is_none_or(|c| !(c.is_alphanumeric() || c == '_')),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rewrite(body: &str) -> String {
        rewrite_html(body, &RewriteRules::for_prefix("/curve-viewer"))
    }

    #[test]
    fn test_asset_paths_are_prefixed() {
        assert_eq!(
            rewrite(r#"<link href="/assets/app.css">"#),
            r#"<link href="/curve-viewer/assets/app.css">"#
        );
        assert_eq!(
            rewrite(r#"<script src="/_astro/index.js"></script>"#),
            r#"<script src="/curve-viewer/_astro/index.js"></script>"#
        );
        assert_eq!(
            rewrite(r#"<link href="/favicon.svg">"#),
            r#"<link href="/curve-viewer/favicon.svg">"#
        );
    }

    #[test]
    fn test_already_prefixed_paths_unchanged() {
        let html = r#"<a href="/curve-viewer/other">x</a><img src="/curve-viewer/_astro/a.png">"#;
        assert_eq!(rewrite(html), html);
    }

    #[test]
    fn test_generic_links_and_forms() {
        assert_eq!(
            rewrite(r#"<a href="/reports?x=1#top">"#),
            r#"<a href="/curve-viewer/reports?x=1#top">"#
        );
        assert_eq!(rewrite(r#"<a href="/">home</a>"#), r#"<a href="/curve-viewer/">home</a>"#);
        assert_eq!(
            rewrite(r#"<form action="/api/save">"#),
            r#"<form action="/curve-viewer/api/save">"#
        );
        assert_eq!(
            rewrite(r#"<img src="/images/logo.png">"#),
            r#"<img src="/curve-viewer/images/logo.png">"#
        );
    }

    #[test]
    fn test_absolute_and_relative_urls_untouched() {
        let html = r#"<a href="https://example.test/x"><a href="//cdn.test/a.js"><a href="page">"#;
        assert_eq!(rewrite(html), html);
    }

    #[test]
    fn test_similar_segment_is_still_prefixed() {
        assert_eq!(
            rewrite(r#"<a href="/curve-viewers">"#),
            r#"<a href="/curve-viewer/curve-viewers">"#
        );
    }

    #[test]
    fn test_base_tag() {
        assert_eq!(
            rewrite(r#"<head><base href="/"></head>"#),
            r#"<head><base href="/curve-viewer/"></head>"#
        );
    }

    #[test]
    fn test_css_urls() {
        assert_eq!(
            rewrite("background: url(/img/bg.png);"),
            "background: url(/curve-viewer/img/bg.png);"
        );
        assert_eq!(
            rewrite("src: url('/assets/font.woff2');"),
            "src: url('/assets/font.woff2');"
        );
        assert_eq!(
            rewrite("url(\"/curve-viewer/img/a.png\")"),
            "url(\"/curve-viewer/img/a.png\")"
        );
        assert_eq!(rewrite("url(data:image/png;base64,AAA)"), "url(data:image/png;base64,AAA)");
    }

    #[test]
    fn test_rewrite_is_idempotent() {
        let html = r#"<base href="/"><a href="/">h</a><a href="/x"><script src="/_astro/a.js"></script><form action="/f">"#;
        let once = rewrite(html);
        assert_eq!(rewrite(&once), once);
    }

    #[test]
    fn test_asset_rules_run_before_generic_rule() {
        let rules = RewriteRules::for_prefix("/dayzer/");
        assert_eq!(rules.prefix(), "/dayzer");
        let first_generic = rules
            .rules()
            .iter()
            .position(|r| *r == RewriteRule::RootRelativeAttributes)
            .unwrap();
        let last_literal = rules
            .rules()
            .iter()
            .rposition(|r| matches!(r, RewriteRule::Literal { .. }))
            .unwrap();
        assert!(last_literal < first_generic);
    }

    #[test]
    fn test_normalize_prefix() {
        assert_eq!(normalize_prefix("dayzer"), "/dayzer");
        assert_eq!(normalize_prefix("/dayzer/"), "/dayzer");
        assert_eq!(normalize_prefix("/a/b"), "/a/b");
    }
}
