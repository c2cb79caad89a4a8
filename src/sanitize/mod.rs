//! Content normalization
//!
//! Pages carry per-request noise (generation timestamps, cache-busting hashes,
//! session ids, signed download links). The [`Sanitizer`] replaces each of
//! these with a fixed marker so that two snapshots of an unchanged page are
//! byte-identical.
//!
//! # Example
//!
//! ```
//! use sumi_mirror::sanitize::Sanitizer;
//!
//! let sanitizer = Sanitizer::with_marker("fixed");
//! let page = r#"<script src="/app.js?hash=1a2b3c"></script><!-- page generated in 0.2s -->"#;
//! assert_eq!(
//!     sanitizer.sanitize(page),
//!     r#"<script src="/app.js?hash=fixed"></script>"#
//! );
//! ```

mod rules;

pub use rules::{default_rules, element_id_rule, SanitizationRule};

use crate::config::SanitizeConfig;
use std::borrow::Cow;
use std::sync::Arc;

/// Marker used when the configuration does not override it
pub const DEFAULT_MARKER: &str = "sumimirror";

/// Upper bound on full rule passes in [`Sanitizer::sanitize`]
const MAX_PASSES: usize = 16;

/// Applies an immutable, ordered list of rules
///
/// Cloning is cheap; clones share the rule list.
#[derive(Debug, Clone)]
pub struct Sanitizer {
    rules: Arc<[SanitizationRule]>,
}

impl Sanitizer {
    /// Creates a sanitizer from an explicit rule list, applied in order
    pub fn new(rules: Vec<SanitizationRule>) -> Self {
        Self {
            rules: rules.into(),
        }
    }

    /// The page rule set with the given marker
    pub fn with_marker(marker: &str) -> Self {
        Self::new(default_rules(marker))
    }

    /// Builds the sanitizer described by the configuration
    pub fn from_config(config: &SanitizeConfig) -> Self {
        let mut rules = default_rules(&config.marker);
        if config.scrub_element_ids {
            rules.push(element_id_rule(&config.marker));
        }
        Self::new(rules)
    }

    pub fn rules(&self) -> &[SanitizationRule] {
        &self.rules
    }

    /// Normalizes page text
    ///
    /// Pure and deterministic. The ordered rule list is applied repeatedly
    /// until a full pass changes nothing, so the result is a fixed point:
    /// sanitizing it again returns it unchanged. A later rule (a stripped
    /// suggestion block, say) can expose a match for an earlier one, and a
    /// value with extra `_` groups only shrinks one match per pass.
    pub fn sanitize(&self, text: &str) -> String {
        let mut content = text.to_string();
        for _ in 0..MAX_PASSES {
            match self.apply_rules(&content) {
                Some(next) => content = next,
                None => return content,
            }
        }

        tracing::warn!(
            "Sanitizer did not settle after {} passes; output may not be stable",
            MAX_PASSES
        );
        content
    }

    /// Runs every rule once, in order; `None` if nothing changed
    fn apply_rules(&self, text: &str) -> Option<String> {
        let mut content: Option<String> = None;
        for rule in self.rules.iter() {
            let current = content.as_deref().unwrap_or(text);
            let replaced = match rule.apply(current) {
                Cow::Owned(replaced) if replaced != current => Some(replaced),
                _ => None,
            };
            if replaced.is_some() {
                content = replaced;
            }
        }
        content
    }
}

impl Default for Sanitizer {
    fn default() -> Self {
        Self::with_marker(DEFAULT_MARKER)
    }
}
