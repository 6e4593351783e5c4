//! Cognitive operations queued by the server and awaiting user confirmation.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::UnknownVariant;
use crate::record::Record;
use crate::wire::{self, RecordId, Timestamp};

/// Kind of server-side analysis work.
///
/// Types this client does not know yet decode as [`OperationType::Other`]
/// and render under their raw name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OperationType {
    Extract,
    ExtractDocs,
    Correlate,
    Synthesise,
    FullSweep,
    Other(String),
}

impl OperationType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Extract => "extract",
            Self::ExtractDocs => "extract_docs",
            Self::Correlate => "correlate",
            Self::Synthesise => "synthesise",
            Self::FullSweep => "full_sweep",
            Self::Other(raw) => raw,
        }
    }

    /// Human label shown on operation cards.
    pub fn label(&self) -> &str {
        match self {
            Self::Extract => "Extract Insights",
            Self::ExtractDocs => "Extract Documents",
            Self::Correlate => "Find Patterns",
            Self::Synthesise => "Synthesise",
            Self::FullSweep => "Full Sweep",
            Self::Other(raw) => raw,
        }
    }

    pub fn tier_label(&self) -> Option<&'static str> {
        match self {
            Self::Extract | Self::ExtractDocs => Some("Tier 1"),
            Self::Correlate => Some("Tier 2"),
            Self::Synthesise => Some("Tier 3"),
            Self::FullSweep => Some("All Tiers"),
            Self::Other(_) => None,
        }
    }
}

impl From<String> for OperationType {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "extract" => Self::Extract,
            "extract_docs" => Self::ExtractDocs,
            "correlate" => Self::Correlate,
            "synthesise" | "synthesize" => Self::Synthesise,
            "full_sweep" => Self::FullSweep,
            _ => Self::Other(raw),
        }
    }
}

impl From<OperationType> for String {
    fn from(kind: OperationType) -> Self {
        match kind {
            OperationType::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of an operation.
///
/// `pending --confirm--> ready --process--> processing --> done | failed`,
/// and `ready --cancel--> pending`. Terminal states are never retried.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationStatus {
    #[default]
    Pending,
    Ready,
    Processing,
    #[serde(alias = "complete", alias = "completed")]
    Done,
    Failed,
}

impl OperationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Ready => "ready",
            Self::Processing => "processing",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "ready" => Ok(Self::Ready),
            "processing" => Ok(Self::Processing),
            "done" | "complete" | "completed" => Ok(Self::Done),
            "failed" => Ok(Self::Failed),
            _ => Err(UnknownVariant::new("operation status", s)),
        }
    }
}

/// An operation awaiting confirmation or processing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub id: RecordId,
    pub operation_type: OperationType,
    #[serde(default)]
    pub status: OperationStatus,
    #[serde(default, deserialize_with = "wire::or_default")]
    pub estimated_mana: f64,
    #[serde(default)]
    pub estimated_tokens: Option<u64>,
    #[serde(default, deserialize_with = "wire::or_default")]
    pub source_count: u32,
    #[serde(default)]
    pub source_type: Option<String>,
    #[serde(default, deserialize_with = "wire::or_default")]
    pub description: String,
    #[serde(default, deserialize_with = "wire::opt_timestamp")]
    pub queued_at: Option<Timestamp>,
}

impl Record for Operation {
    fn id(&self) -> &RecordId {
        &self.id
    }
}

/// Per-operation outcome of a `process` batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessResult {
    #[serde(alias = "id")]
    pub operation_id: RecordId,
    #[serde(default)]
    pub operation_type: Option<OperationType>,
    pub success: bool,
    #[serde(default, deserialize_with = "wire::or_default")]
    pub insights_created: u32,
    #[serde(default, deserialize_with = "wire::or_default")]
    pub patterns_found: u32,
    #[serde(default, deserialize_with = "wire::or_default")]
    pub syntheses_generated: u32,
    #[serde(default, deserialize_with = "wire::or_default")]
    pub mana_spent: f64,
    #[serde(default, deserialize_with = "wire::or_default")]
    pub tokens_used: u64,
    #[serde(default)]
    pub error: Option<String>,
}

/// Health and queue counters from `GET /recog/status`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    #[serde(default)]
    pub llm_available: bool,
    #[serde(default, deserialize_with = "wire::or_default")]
    pub hot_sessions: u64,
    #[serde(default, deserialize_with = "wire::or_default")]
    pub pending_insights: u64,
    #[serde(default, deserialize_with = "wire::or_default")]
    pub patterns: u64,
    /// Queue rows grouped by server-side status.
    #[serde(default, deserialize_with = "wire::or_default")]
    pub queue: BTreeMap<String, u64>,
}

impl StatusSnapshot {
    /// Count shown on the header badge.
    pub fn pending_count(&self) -> u64 {
        self.queue.get("pending").copied().unwrap_or(0)
    }
}
