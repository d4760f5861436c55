//! Metadata attached to listing responses, entitlements and grants.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RateLimitStatus {
    #[default]
    Unspecified,
    Ok,
    Overlimit,
    Error
}

/// Rate-limit state reported by the upstream API on a response.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RateLimitDescription {
    pub status: RateLimitStatus,
    pub limit: Option<u64>,
    pub remaining: Option<u64>,
    pub reset_at: Option<DateTime<Utc>>
}

impl RateLimitDescription {
    pub fn is_overlimit(&self) -> bool {
        self.status == RateLimitStatus::Overlimit
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Annotation {
    RateLimit(RateLimitDescription),
    /// Identifier that stays stable across syncs for the same upstream state.
    V1Identifier { id: String }
}

impl Annotation {
    pub fn v1_identifier(id: impl Into<String>) -> Self {
        Self::V1Identifier { id: id.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Annotations(Vec<Annotation>);

impl Annotations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, annotation: Annotation) {
        self.0.push(annotation);
    }

    /// Records a rate-limit descriptor, replacing any previous one.
    pub fn with_rate_limiting(&mut self, description: RateLimitDescription) {
        self.0.retain(|a| !matches!(a, Annotation::RateLimit(_)));
        self.0.push(Annotation::RateLimit(description));
    }

    pub fn rate_limit(&self) -> Option<&RateLimitDescription> {
        self.0.iter().find_map(|a| match a {
            Annotation::RateLimit(desc) => Some(desc),
            _ => None
        })
    }

    pub fn v1_identifier(&self) -> Option<&str> {
        self.0.iter().find_map(|a| match a {
            Annotation::V1Identifier { id } => Some(id.as_str()),
            _ => None
        })
    }

    /// Folds `other` into `self`. Rate-limit descriptors are last-write-wins,
    /// everything else is appended.
    pub fn merge(&mut self, other: Annotations) {
        for annotation in other.0 {
            match annotation {
                Annotation::RateLimit(desc) => self.with_rate_limiting(desc),
                other => self.0.push(other)
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Annotation> {
        self.0.iter()
    }
}

impl From<Vec<Annotation>> for Annotations {
    fn from(annotations: Vec<Annotation>) -> Self {
        Self(annotations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desc(remaining: u64) -> RateLimitDescription {
        RateLimitDescription {
            status: RateLimitStatus::Ok,
            limit: Some(100),
            remaining: Some(remaining),
            reset_at: None
        }
    }

    #[test]
    fn test_rate_limit_is_last_write_wins() {
        let mut annotations = Annotations::new();
        annotations.with_rate_limiting(desc(10));
        annotations.with_rate_limiting(desc(9));

        assert_eq!(annotations.len(), 1);
        assert_eq!(annotations.rate_limit().unwrap().remaining, Some(9));
    }

    #[test]
    fn test_merge_keeps_identifiers_and_replaces_rate_limit() {
        let mut left = Annotations::from(vec![Annotation::RateLimit(desc(5))]);
        let right = Annotations::from(vec![
            Annotation::v1_identifier("org-grant:o:m:admin"),
            Annotation::RateLimit(desc(4)),
        ]);

        left.merge(right);

        assert_eq!(left.len(), 2);
        assert_eq!(left.v1_identifier(), Some("org-grant:o:m:admin"));
        assert_eq!(left.rate_limit().unwrap().remaining, Some(4));
    }

    #[test]
    fn test_annotation_serialization() {
        let json = serde_json::to_string(&Annotation::v1_identifier("x")).unwrap();
        assert_eq!(json, r#"{"type":"v1_identifier","id":"x"}"#);
    }
}
