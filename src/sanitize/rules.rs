//! Volatile-content rules
//!
//! Each rule is a global find-and-replace. The order returned by
//! [`default_rules`] is the order they must be applied in.

use regex::{NoExpand, Regex};
use std::borrow::Cow;
use std::sync::LazyLock;

static PAGE_GENERATION_TIME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<!-- page generated in .+ -->").unwrap());

static PAGE_API_HASH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\?hash=[a-z0-9]+").unwrap());

static PASSPORT_SSID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"passport_ssid=[a-z0-9]+_[a-z0-9]+_[a-z0-9]+").unwrap()
});

static NONCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""nonce":"[a-z0-9]+_[a-z0-9]+_[a-z0-9]+"#).unwrap());

static PROXY_CONFIG_SUB_NET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+\.\d+:8888;").unwrap());

static TRANSLATE_SUGGESTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<div class="tr-value-suggestion">.*</div>"#).unwrap());

static SPARKLE_SIG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r";sig=(.*?);").unwrap());

static SPARKLE_SE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r";se=(.*?);").unwrap());

static ELEMENT_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"id=".*""#).unwrap());

/// Masked form of the proxy subnet; it carries no marker
const PROXY_CONFIG_SUB_NET_MASK: &str = "X.X:8888;";

/// A single pattern/replacement pair
#[derive(Debug, Clone)]
pub struct SanitizationRule {
    name: &'static str,
    pattern: Regex,
    replacement: String,
}

impl SanitizationRule {
    /// Creates a rule; the replacement is inserted literally (no `$` expansion)
    pub fn new(name: &'static str, pattern: Regex, replacement: impl Into<String>) -> Self {
        Self {
            name,
            pattern,
            replacement: replacement.into(),
        }
    }

    /// Short identifier used in logs and tests
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }

    pub fn replacement(&self) -> &str {
        &self.replacement
    }

    /// Replaces every match in `text`
    pub fn apply<'t>(&self, text: &'t str) -> Cow<'t, str> {
        self.pattern
            .replace_all(text, NoExpand(self.replacement.as_str()))
    }
}

/// Builds the ordered rule set for page content
///
/// 1. page-generation timestamp comments are stripped
/// 2. API cache-busting `?hash=` parameters
/// 3. passport session ids
/// 4. JSON `"nonce"` values
/// 5. proxy-config subnets
/// 6. inline translation suggestions are stripped
/// 7. update-feed `sig=` and `se=` fragments
pub fn default_rules(marker: &str) -> Vec<SanitizationRule> {
    vec![
        SanitizationRule::new("page-generation-time", PAGE_GENERATION_TIME.clone(), ""),
        SanitizationRule::new(
            "page-api-hash",
            PAGE_API_HASH.clone(),
            format!("?hash={}", marker),
        ),
        SanitizationRule::new(
            "passport-ssid",
            PASSPORT_SSID.clone(),
            format!("passport_ssid={}", marker),
        ),
        SanitizationRule::new("nonce", NONCE.clone(), format!("\"nonce\":\"{}", marker)),
        SanitizationRule::new(
            "proxy-config-subnet",
            PROXY_CONFIG_SUB_NET.clone(),
            PROXY_CONFIG_SUB_NET_MASK,
        ),
        SanitizationRule::new("translate-suggestion", TRANSLATE_SUGGESTION.clone(), ""),
        SanitizationRule::new(
            "sparkle-sig",
            SPARKLE_SIG.clone(),
            format!(";sig={};", marker),
        ),
        SanitizationRule::new("sparkle-se", SPARKLE_SE.clone(), format!(";se={};", marker)),
    ]
}

/// Rewrites every `id="..."` attribute to the marker
///
/// Only useful for resource files whose element ids are regenerated on each
/// build; page content keeps its ids.
pub fn element_id_rule(marker: &str) -> SanitizationRule {
    SanitizationRule::new("element-id", ELEMENT_ID.clone(), format!("id=\"{}\"", marker))
}
