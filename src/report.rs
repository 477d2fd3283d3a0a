//! Terminal failure and artifact reporting
//!
//! The pipeline hands exactly one record per page to an [`ObservabilitySink`].
//! Sinks are infallible and must tolerate concurrent calls; nothing they do
//! feeds back into extraction or normalization.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::error::{ClassifiedError, Severity};

/// Ordered `(key, value)` pairs attached to a record
pub type Attributes = Vec<(String, String)>;

/// A terminal page failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorRecord {
    pub timestamp: DateTime<Utc>,
    pub component: String,
    pub action: String,
    pub cause: String,
    pub details: String,
    pub severity: Severity,
    pub attributes: Attributes,
}

impl ErrorRecord {
    /// Record for `error`, raised while performing `action`
    pub fn from_error(
        error: &ClassifiedError,
        action: impl Into<String>,
        attributes: Attributes,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            component: error.component().as_str().to_string(),
            action: action.into(),
            cause: error.cause().as_str().to_string(),
            details: error.message().to_string(),
            severity: error.severity(),
            attributes,
        }
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        find_attribute(&self.attributes, key)
    }
}

/// A successfully produced artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRecord {
    pub kind: String,
    pub path: String,
    pub attributes: Attributes,
}

impl ArtifactRecord {
    pub fn new(kind: impl Into<String>, path: impl Into<String>, attributes: Attributes) -> Self {
        Self {
            kind: kind.into(),
            path: path.into(),
            attributes,
        }
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        find_attribute(&self.attributes, key)
    }
}

fn find_attribute<'a>(attributes: &'a [(String, String)], key: &str) -> Option<&'a str> {
    attributes
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

/// Destination for terminal records
pub trait ObservabilitySink: Send + Sync {
    fn record_error(&self, record: &ErrorRecord);
    fn record_artifact(&self, record: &ArtifactRecord);
}

/// Sink that emits `tracing` events
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl ObservabilitySink for TracingSink {
    fn record_error(&self, record: &ErrorRecord) {
        let attributes = DisplayAttributes(&record.attributes);
        match record.severity {
            Severity::Error => tracing::warn!(
                component = %record.component,
                action = %record.action,
                cause = %record.cause,
                attributes = %attributes,
                "{}",
                record.details
            ),
            Severity::Fatal => tracing::error!(
                component = %record.component,
                action = %record.action,
                cause = %record.cause,
                attributes = %attributes,
                "{}",
                record.details
            ),
        }
    }

    fn record_artifact(&self, record: &ArtifactRecord) {
        tracing::info!(
            kind = %record.kind,
            path = %record.path,
            attributes = %DisplayAttributes(&record.attributes),
            "artifact produced"
        );
    }
}

/// Sink that drops every record
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl ObservabilitySink for NoopSink {
    fn record_error(&self, _record: &ErrorRecord) {}

    fn record_artifact(&self, _record: &ArtifactRecord) {}
}

struct DisplayAttributes<'a>(&'a [(String, String)]);

impl fmt::Display for DisplayAttributes<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{key}={value}")?;
        }
        Ok(())
    }
}
