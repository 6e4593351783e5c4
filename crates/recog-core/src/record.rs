//! Insight, pattern and report records as served by the ReCog server.
//!
//! List endpoints return projections of the same shapes: every collection
//! field defaults to empty so a list row and a full detail decode into the
//! same type.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::UnknownVariant;
use crate::wire::{self, RecordId, Timestamp};

/// Anything addressable by a server id.
pub trait Record {
    fn id(&self) -> &RecordId;
}

/// The three record kinds the detail pane can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Insight,
    Pattern,
    Report,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Insight => "insight",
            Self::Pattern => "pattern",
            Self::Report => "report",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "insight" | "insights" | "i" => Ok(Self::Insight),
            "pattern" | "patterns" | "p" => Ok(Self::Pattern),
            "report" | "reports" | "r" => Ok(Self::Report),
            _ => Err(UnknownVariant::new("record kind", s)),
        }
    }
}

/// Ordinal significance bucket. Ordering is ascending: `Copper < ... < Mythic`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignificanceTier {
    Copper,
    Iron,
    Silver,
    Gold,
    Mythic,
}

impl SignificanceTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Copper => "copper",
            Self::Iron => "iron",
            Self::Silver => "silver",
            Self::Gold => "gold",
            Self::Mythic => "mythic",
        }
    }
}

impl fmt::Display for SignificanceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where an insight was smelted from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    #[serde(rename = "type", default, deserialize_with = "wire::or_default")]
    pub source_type: String,
    #[serde(default, deserialize_with = "wire::or_default")]
    pub title: String,
    #[serde(default)]
    pub excerpt: Option<String>,
}

/// Reference from an insight or report to a pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternRef {
    pub id: RecordId,
    #[serde(default)]
    pub pattern_type: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub strength: Option<f64>,
}

/// Reference from a pattern or report to an insight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightRef {
    pub id: RecordId,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub significance_tier: Option<SignificanceTier>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub id: RecordId,
    #[serde(default, deserialize_with = "wire::or_default")]
    pub summary: String,
    #[serde(default, deserialize_with = "wire::or_default")]
    pub significance: f64,
    /// Server-authoritative; never derived from `significance` on the client.
    #[serde(default)]
    pub significance_tier: Option<SignificanceTier>,
    #[serde(default, deserialize_with = "wire::or_default")]
    pub themes: Vec<String>,
    #[serde(default, deserialize_with = "wire::or_default")]
    pub sources: Vec<Source>,
    #[serde(default, deserialize_with = "wire::or_default")]
    pub flagged: bool,
    #[serde(default, deserialize_with = "wire::or_default")]
    pub reviewed: bool,
    #[serde(default, deserialize_with = "wire::opt_timestamp")]
    pub reviewed_at: Option<Timestamp>,
    #[serde(default)]
    pub user_context: Option<String>,
    #[serde(default, deserialize_with = "wire::or_default")]
    pub rejected: bool,
    #[serde(default, deserialize_with = "wire::or_default")]
    pub linked_patterns: Vec<PatternRef>,
    #[serde(default, deserialize_with = "wire::or_default")]
    pub pattern_count: u32,
    #[serde(default, deserialize_with = "wire::or_default")]
    pub source_count: u32,
    #[serde(default, deserialize_with = "wire::opt_timestamp")]
    pub created_at: Option<Timestamp>,
}

impl Record for Insight {
    fn id(&self) -> &RecordId {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    pub id: RecordId,
    #[serde(default, deserialize_with = "wire::or_default")]
    pub pattern_type: String,
    #[serde(default, deserialize_with = "wire::or_default")]
    pub summary: String,
    #[serde(default, deserialize_with = "wire::or_default")]
    pub strength: f64,
    #[serde(default, deserialize_with = "wire::or_default")]
    pub insights: Vec<InsightRef>,
}

impl Record for Pattern {
    fn id(&self) -> &RecordId {
        &self.id
    }
}

/// A concluding statement of a report. The server emits either bare strings
/// or `{text, confidence}` objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ConclusionWire")]
pub struct Conclusion {
    pub text: String,
    pub confidence: Option<f64>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ConclusionWire {
    Text(String),
    Full {
        #[serde(alias = "conclusion", alias = "summary")]
        text: String,
        #[serde(default)]
        confidence: Option<f64>,
    },
}

impl From<ConclusionWire> for Conclusion {
    fn from(wire: ConclusionWire) -> Self {
        match wire {
            ConclusionWire::Text(text) => Self {
                text,
                confidence: None,
            },
            ConclusionWire::Full { text, confidence } => Self { text, confidence },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Synthesis {
    #[serde(default)]
    pub id: Option<RecordId>,
    #[serde(default)]
    pub synthesis_type: Option<String>,
    #[serde(default, deserialize_with = "wire::or_default")]
    pub summary: String,
}

/// Immutable synthesis snapshot. References inside a report are not updated
/// when the referenced insight later changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: RecordId,
    #[serde(default, deserialize_with = "wire::or_default")]
    pub report_type: String,
    #[serde(default, deserialize_with = "wire::or_default")]
    pub summary: String,
    #[serde(default, deserialize_with = "wire::opt_timestamp")]
    pub created_at: Option<Timestamp>,
    #[serde(default, deserialize_with = "wire::or_default")]
    pub insights_count: u32,
    #[serde(default, deserialize_with = "wire::or_default")]
    pub patterns_count: u32,
    #[serde(default, deserialize_with = "wire::or_default")]
    pub syntheses_count: u32,
    #[serde(default, deserialize_with = "wire::or_default")]
    pub conclusions: Vec<Conclusion>,
    #[serde(default, deserialize_with = "wire::or_default")]
    pub syntheses: Vec<Synthesis>,
    #[serde(default, deserialize_with = "wire::or_default")]
    pub patterns: Vec<PatternRef>,
    #[serde(default, deserialize_with = "wire::or_default")]
    pub insights: Vec<InsightRef>,
}

impl Record for Report {
    fn id(&self) -> &RecordId {
        &self.id
    }
}
