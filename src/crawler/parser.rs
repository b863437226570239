//! Link extraction from raw page markup
//!
//! Anchors are found with a case-insensitive pattern over the raw markup
//! and resolved with deliberately literal rules against the base URL's
//! `scheme://host` origin. No path-aware resolution happens here: every
//! relative reference is taken from the host root, exactly as the visited
//! set later compares URLs byte-for-byte.

use regex::Regex;
use std::collections::HashSet;
use url::Url;

/// Extracts anchor references from page content
pub struct LinkExtractor {
    anchor_re: Regex,
}

impl LinkExtractor {
    pub fn new() -> Self {
        Self {
            anchor_re: Regex::new(r#"(?i)<a[^>]+href=["']([^"']+)["'][^>]*>"#).unwrap(),
        }
    }

    /// Scans `content` for anchor references and resolves each against
    /// `base_url`
    ///
    /// Resolution rules, applied in order to each reference:
    /// - leading `/`: rewritten to `scheme://host` + reference
    /// - leading `./`: rewritten to `scheme://host` + reference minus the dot
    /// - not starting with `http`: rewritten to `scheme://host/` + reference
    /// - otherwise passed through unchanged
    ///
    /// Only results beginning with `http` are kept, each at most once per
    /// page in first-seen order. A malformed or host-less base URL yields
    /// an empty list rather than an error; cross-page duplicates are the
    /// frontier's concern, not this module's.
    pub fn extract_links(&self, content: &str, base_url: &str) -> Vec<String> {
        let base = match Url::parse(base_url) {
            Ok(base) => base,
            Err(_) => return Vec::new(),
        };
        let host = match base.host_str() {
            Some(host) => host,
            None => return Vec::new(),
        };
        let origin = format!("{}://{}", base.scheme(), host);

        let mut links = Vec::new();
        let mut seen = HashSet::new();

        for captures in self.anchor_re.captures_iter(content) {
            let href = match captures.get(1) {
                Some(m) => m.as_str(),
                None => continue,
            };

            let resolved = if href.starts_with('/') {
                format!("{}{}", origin, href)
            } else if let Some(rest) = href.strip_prefix("./") {
                format!("{}/{}", origin, rest)
            } else if !href.starts_with("http") {
                format!("{}/{}", origin, href)
            } else {
                href.to_string()
            };

            if resolved.starts_with("http") && seen.insert(resolved.clone()) {
                links.push(resolved);
            }
        }

        links
    }
}

impl Default for LinkExtractor {
    fn default() -> Self {
        Self::new()
    }
}
