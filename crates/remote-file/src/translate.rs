//! Virtual URI to remote URL translation
//!
//! Translation is a list of literal `(pattern, replacement)` prefix
//! substitutions evaluated in order. The first rule whose pattern starts the
//! URI wins; the rest of the URI is appended to its replacement.
//!
//! Two kinds of rules are installed by [`UrlTranslator`]:
//! - the default rule maps `scheme://` onto the base URL of original assets
//! - derivative rules map `scheme://<segment>/` onto the public URL that
//!   serves size variants; they are evaluated before the default rule

use crate::StreamError;

/// A single literal substitution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteRule {
    pub pattern: String,
    pub replacement: String,
}

impl RewriteRule {
    pub fn new(pattern: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            replacement: replacement.into(),
        }
    }

    /// Apply the rule, returning `None` when the URI does not start with the
    /// pattern
    pub fn apply(&self, uri: &str) -> Option<String> {
        if self.pattern.is_empty() {
            return None;
        }
        uri.strip_prefix(&self.pattern)
            .map(|rest| format!("{}{rest}", self.replacement))
    }
}

/// Ordered rewrite rules for one URI scheme
///
/// Immutable once built; share it between handles with an `Arc`.
#[derive(Debug, Clone)]
pub struct UrlTranslator {
    scheme: String,
    rules: Vec<RewriteRule>,
}

impl UrlTranslator {
    /// Create a translator with the default rule `scheme://` -> `base_url`
    pub fn new(scheme: impl Into<String>, base_url: &str) -> Self {
        let scheme = scheme.into();
        let default_rule = RewriteRule::new(scheme_prefix(&scheme), with_trailing_slash(base_url));
        Self {
            scheme,
            rules: vec![default_rule],
        }
    }

    /// Add a derivative rule `scheme://<segment>/` -> `public_url`
    ///
    /// Derivative rules are evaluated before the default rule, in the order
    /// they were added.
    pub fn with_derivative(mut self, segment: &str, public_url: &str) -> Self {
        let segment = segment.trim_matches('/');
        let rule = RewriteRule::new(
            format!("{}{segment}/", scheme_prefix(&self.scheme)),
            with_trailing_slash(public_url),
        );
        let default_index = self.rules.len().saturating_sub(1);
        self.rules.insert(default_index, rule);
        self
    }

    /// Build a translator from an explicit rule list
    pub fn from_rules(scheme: impl Into<String>, rules: Vec<RewriteRule>) -> Self {
        Self {
            scheme: scheme.into(),
            rules,
        }
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn rules(&self) -> &[RewriteRule] {
        &self.rules
    }

    /// Whether the URI is addressed to this translator's scheme
    pub fn owns(&self, uri: &str) -> bool {
        uri.starts_with(&scheme_prefix(&self.scheme))
    }

    /// Translate a virtual URI into the remote URL that serves it
    pub fn translate(&self, uri: &str) -> Result<String, StreamError> {
        self.rules
            .iter()
            .find_map(|rule| rule.apply(uri))
            .ok_or_else(|| StreamError::InvalidUri(uri.to_string()))
    }

    /// Build a virtual URI for a target path (leading `/` dropped)
    pub fn uri_for(&self, target: &str) -> String {
        format!("{}{}", scheme_prefix(&self.scheme), target.trim_start_matches('/'))
    }
}

fn scheme_prefix(scheme: &str) -> String {
    format!("{scheme}://")
}

fn with_trailing_slash(url: &str) -> String {
    if url.ends_with('/') {
        url.to_string()
    } else {
        format!("{url}/")
    }
}
