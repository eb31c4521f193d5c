//! Shard parts: one policy's outcome in one location.
//!
//! A part is identified by `(policy, location)`. Among parts with the same
//! identity, the one with the highest timestamp is the current one.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::clock::{Clock, SystemClock};

/// A matched cloud resource, kept as opaque JSON.
pub type Resource = serde_json::Value;

/// Kinds of policy execution failure carried in a part's error string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorType {
    /// The policy was not run (not applicable, disabled, out of license).
    Skipped,
    /// The cloud denied the API call.
    Access,
    /// Credentials were missing or expired.
    Credentials,
    /// The cloud API rejected the request.
    Client,
    /// Anything else that went wrong while executing the policy.
    Internal,
}

impl ErrorType {
    /// All error kinds, in declaration order.
    pub const ALL: [ErrorType; 5] = [
        ErrorType::Skipped,
        ErrorType::Access,
        ErrorType::Credentials,
        ErrorType::Client,
        ErrorType::Internal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorType::Skipped => "SKIPPED",
            ErrorType::Access => "ACCESS",
            ErrorType::Credentials => "CREDENTIALS",
            ErrorType::Client => "CLIENT",
            ErrorType::Internal => "INTERNAL",
        }
    }
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ErrorType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ErrorType::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown error type: {}", s))
    }
}

/// Split an error string into its kind and message.
///
/// Only the first `:` separates the two. An unrecognised kind yields no type
/// and keeps the whole string as the message.
fn parse_error(error: &str) -> (Option<ErrorType>, &str) {
    match error.split_once(':') {
        Some((kind, message)) => match kind.parse::<ErrorType>() {
            Ok(kind) => (Some(kind), message),
            Err(_) => (None, error),
        },
        None => match error.parse::<ErrorType>() {
            Ok(kind) => (Some(kind), ""),
            Err(_) => (None, error),
        },
    }
}

/// Identity of a part within a shard.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PartKey {
    pub policy: String,
    pub location: String,
}

impl PartKey {
    pub fn new(policy: impl Into<String>, location: impl Into<String>) -> Self {
        PartKey {
            policy: policy.into(),
            location: location.into(),
        }
    }
}

impl fmt::Display for PartKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.policy, self.location)
    }
}

/// The outcome of one policy executed in one location.
///
/// Parts are not mutated once built; the `with_*` methods return a new value.
/// The serialized form uses compact field names (`p`, `l`, `t`, `r`, `e`, `pt`)
/// and also accepts the long ones on read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShardPart {
    #[serde(rename = "p", alias = "policy")]
    policy: String,

    #[serde(rename = "l", alias = "location")]
    location: String,

    #[serde(rename = "t", alias = "timestamp")]
    timestamp: f64,

    #[serde(rename = "r", alias = "resources", default)]
    resources: Vec<Resource>,

    #[serde(
        rename = "e",
        alias = "error",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    error: Option<String>,

    #[serde(
        rename = "pt",
        alias = "previous_timestamp",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    previous_timestamp: Option<f64>,
}

impl ShardPart {
    /// Create an empty successful part stamped with the system clock.
    pub fn new(policy: impl Into<String>, location: impl Into<String>) -> Self {
        Self::stamped(&SystemClock, policy, location)
    }

    /// Create an empty successful part stamped by `clock`.
    pub fn stamped(clock: &dyn Clock, policy: impl Into<String>, location: impl Into<String>) -> Self {
        ShardPart {
            policy: policy.into(),
            location: location.into(),
            timestamp: clock.now(),
            resources: Vec::new(),
            error: None,
            previous_timestamp: None,
        }
    }

    /// Create a failed part with an error of the given kind.
    pub fn failed(
        policy: impl Into<String>,
        location: impl Into<String>,
        kind: ErrorType,
        message: impl AsRef<str>,
    ) -> Self {
        Self::new(policy, location).with_error(format!("{}:{}", kind, message.as_ref()))
    }

    pub fn with_resources(mut self, resources: Vec<Resource>) -> Self {
        self.resources = resources;
        self
    }

    /// Attach a raw error string, expected as `"<KIND>:<message>"`.
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp: f64) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_previous_timestamp(mut self, previous_timestamp: f64) -> Self {
        self.previous_timestamp = Some(previous_timestamp);
        self
    }

    pub fn policy(&self) -> &str {
        &self.policy
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    pub fn previous_timestamp(&self) -> Option<f64> {
        self.previous_timestamp
    }

    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }

    /// Raw error string, if the execution failed.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    /// True when the policy found nothing (whether or not it failed).
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Parsed error kind; `None` when there is no error or the kind is unknown.
    pub fn error_type(&self) -> Option<ErrorType> {
        self.error.as_deref().and_then(|e| parse_error(e).0)
    }

    /// Error text after the kind prefix; the whole string if the kind is unknown.
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref().map(|e| parse_error(e).1)
    }

    pub fn key(&self) -> PartKey {
        PartKey::new(&self.policy, &self.location)
    }

    pub fn into_resources(self) -> Vec<Resource> {
        self.resources
    }

    /// Same part with a different resource list; everything else is kept.
    pub(crate) fn derive_with_resources(&self, resources: Vec<Resource>) -> Self {
        ShardPart {
            policy: self.policy.clone(),
            location: self.location.clone(),
            timestamp: self.timestamp,
            resources,
            error: self.error.clone(),
            previous_timestamp: self.previous_timestamp,
        }
    }

    /// Record that a part with timestamp `timestamp` was superseded by this one.
    pub(crate) fn absorb_previous(&mut self, timestamp: Option<f64>) {
        if let Some(ts) = timestamp {
            self.previous_timestamp = Some(match self.previous_timestamp {
                Some(prev) if prev >= ts => prev,
                _ => ts,
            });
        }
    }
}
