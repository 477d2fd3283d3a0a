//! Source URL canonicalization
//!
//! The canonical form lowercases the host, drops the query string and the
//! fragment, and leaves scheme and path (including its case) untouched.

use thiserror::Error;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CanonicalizeError {
    #[error("invalid URL '{url}': {reason}")]
    Invalid { url: String, reason: String },

    #[error("URL '{0}' has no host")]
    MissingHost(String),
}

/// URL canonicalizer seam
pub trait UrlCanonicalizer: Send + Sync {
    fn canonicalize(&self, url: &str) -> Result<Url, CanonicalizeError>;
}

/// Default canonicalizer built on the `url` crate
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardCanonicalizer;

impl UrlCanonicalizer for StandardCanonicalizer {
    fn canonicalize(&self, url: &str) -> Result<Url, CanonicalizeError> {
        let mut parsed = Url::parse(url.trim()).map_err(|e| CanonicalizeError::Invalid {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let host = parsed
            .host_str()
            .ok_or_else(|| CanonicalizeError::MissingHost(url.to_string()))?
            .to_ascii_lowercase();
        // Special schemes are already lowercased by the parser; this covers the rest.
        if parsed.host_str() != Some(host.as_str()) {
            parsed
                .set_host(Some(&host))
                .map_err(|e| CanonicalizeError::Invalid {
                    url: url.to_string(),
                    reason: e.to_string(),
                })?;
        }

        parsed.set_query(None);
        parsed.set_fragment(None);
        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canonical(url: &str) -> String {
        StandardCanonicalizer.canonicalize(url).unwrap().to_string()
    }

    #[test]
    fn test_lowercases_host_only() {
        assert_eq!(
            canonical("https://Docs.Example.COM/Guide/Intro"),
            "https://docs.example.com/Guide/Intro"
        );
    }

    #[test]
    fn test_strips_query_and_fragment() {
        assert_eq!(
            canonical("https://x.com/docs/api/login?lang=en#section-2"),
            "https://x.com/docs/api/login"
        );
    }

    #[test]
    fn test_preserves_scheme() {
        assert_eq!(canonical("http://x.com/a"), "http://x.com/a");
    }

    #[test]
    fn test_rejects_relative_url() {
        let err = StandardCanonicalizer.canonicalize("/docs/page").unwrap_err();
        assert!(matches!(err, CanonicalizeError::Invalid { .. }));
    }

    #[test]
    fn test_rejects_hostless_url() {
        let err = StandardCanonicalizer
            .canonicalize("mailto:someone@example.com")
            .unwrap_err();
        assert!(matches!(err, CanonicalizeError::MissingHost(_)));
    }
}
