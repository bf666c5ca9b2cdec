//! The health document served by the endpoint

use super::Status;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Outcome of one test for one request. Serialized as an entry of `tests`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TestResult {
    pub name: String,
    #[serde(rename = "duration_ms", with = "duration_ms")]
    pub duration: Duration,
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TestResult {
    pub fn new(name: impl Into<String>, duration: Duration, status: Status) -> Self {
        Self {
            name: name.into(),
            duration,
            status,
            error: None,
        }
    }

    pub fn with_error(mut self, error: Option<String>) -> Self {
        self.error = error;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheck {
    pub checked_at: DateTime<Utc>,
    #[serde(rename = "duration_ms", with = "duration_ms")]
    pub duration: Duration,
    pub status: Status,
    pub tests: BTreeMap<String, TestResult>,
}

impl HealthCheck {
    /// An empty report stamped with `checked_at`. Status starts as Available
    /// until an evaluation fills it in.
    pub fn new(checked_at: DateTime<Utc>) -> Self {
        Self {
            checked_at,
            duration: Duration::ZERO,
            status: Status::Available,
            tests: BTreeMap::new(),
        }
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
