//! Small helpers shared across modules.

use regex::Regex;
use url::Url;

/// Compiles a regex at static init; panics on invalid pattern.
pub(crate) fn compile_static_regex(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid static regex '{pattern}': {e}"))
}

/// Parses a built-in URL; panics on an invalid literal.
pub(crate) fn parse_static_url(url: &str) -> Url {
    Url::parse(url).unwrap_or_else(|e| panic!("invalid static URL '{url}': {e}"))
}
