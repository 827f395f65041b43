//! eSocial integration: staging of government-format payroll events
//!
//! Finished payroll calculations feed S-series events grouped into submission
//! batches. Builders are pluggable strategies keyed by event code; only a
//! handful carry real field mappings today and the registry makes that
//! incompleteness explicit instead of hiding it behind a no-op default.

pub mod builders;
pub mod service;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default retry budget for a staged event
pub const DEFAULT_MAX_RETRIES: i32 = 3;

/// Lifecycle of one staged eSocial event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ESocialEventStatus {
    Pending,
    Sent,
    Accepted,
    Rejected,
    Error,
}

impl ESocialEventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Sent => "sent",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
            Self::Error => "error",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "sent" => Some(Self::Sent),
            "accepted" => Some(Self::Accepted),
            "rejected" => Some(Self::Rejected),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

/// Lifecycle of a submission batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ESocialBatchStatus {
    Pending,
    Sending,
    Sent,
    Accepted,
    Rejected,
    Error,
}

impl ESocialBatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Sending => "sending",
            Self::Sent => "sent",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
            Self::Error => "error",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "sending" => Some(Self::Sending),
            "sent" => Some(Self::Sent),
            "accepted" => Some(Self::Accepted),
            "rejected" => Some(Self::Rejected),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

/// One government-format event staged for transmission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ESocialEvent {
    pub id: Uuid,
    pub company_id: Uuid,
    pub employee_id: Uuid,
    pub batch_id: Uuid,
    pub event_type: String,
    pub period: String,
    pub event_data: serde_json::Value,
    pub status: ESocialEventStatus,
    pub sent_at: Option<DateTime<Utc>>,
    pub response_data: Option<serde_json::Value>,
    pub error_message: Option<String>,
    pub retry_count: i32,
    pub max_retries: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A submission batch aggregating per-status event counts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ESocialBatch {
    pub id: Uuid,
    pub company_id: Uuid,
    pub batch_number: String,
    pub period: String,
    pub total_events: i32,
    pub sent_events: i32,
    pub accepted_events: i32,
    pub rejected_events: i32,
    pub error_events: i32,
    pub status: ESocialBatchStatus,
    pub sent_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
