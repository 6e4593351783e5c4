//! Six-pillar progression summary.
//!
//! The server returns raw pillar content; the client derives each pillar's
//! status from its item count with fixed thresholds:
//!
//! | items | status      |
//! |-------|-------------|
//! | 0     | `empty`     |
//! | 1-2   | `seeded`    |
//! | 3+    | `populated` |

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::UnknownVariant;
use crate::text::{capitalize, truncate_chars};
use crate::wire::{self, RecordId, Timestamp};

/// Soft cap for the first-item preview.
pub const PREVIEW_CHARS: usize = 60;

/// Minimum item count for a `populated` pillar.
pub const POPULATED_THRESHOLD: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PillarName {
    Web,
    Thread,
    Mirror,
    Compass,
    Anchor,
    Flame,
}

impl PillarName {
    /// Canonical display order.
    pub const ALL: [PillarName; 6] = [
        PillarName::Web,
        PillarName::Thread,
        PillarName::Mirror,
        PillarName::Compass,
        PillarName::Anchor,
        PillarName::Flame,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Web => "web",
            Self::Thread => "thread",
            Self::Mirror => "mirror",
            Self::Compass => "compass",
            Self::Anchor => "anchor",
            Self::Flame => "flame",
        }
    }

    pub fn title(&self) -> String {
        capitalize(self.as_str())
    }
}

impl fmt::Display for PillarName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PillarName {
    type Err = UnknownVariant;

    /// Accepts `web`, `Web` and `The Web`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let bare = lower.strip_prefix("the ").unwrap_or(&lower).trim();
        PillarName::ALL
            .into_iter()
            .find(|p| p.as_str() == bare)
            .ok_or_else(|| UnknownVariant::new("pillar", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PillarStatus {
    Empty,
    Seeded,
    Populated,
}

impl PillarStatus {
    pub fn from_count(items: usize) -> Self {
        match items {
            0 => Self::Empty,
            n if n < POPULATED_THRESHOLD => Self::Seeded,
            _ => Self::Populated,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Seeded => "seeded",
            Self::Populated => "populated",
        }
    }
}

impl fmt::Display for PillarStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PillarStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "empty" => Ok(Self::Empty),
            "seeded" => Ok(Self::Seeded),
            "populated" => Ok(Self::Populated),
            _ => Err(UnknownVariant::new("pillar status", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    #[serde(default)]
    pub id: Option<RecordId>,
    #[serde(
        default,
        alias = "summary",
        alias = "text",
        deserialize_with = "wire::or_default"
    )]
    pub content: String,
    #[serde(default, deserialize_with = "wire::opt_timestamp")]
    pub created_at: Option<Timestamp>,
}

/// Raw per-pillar payload.
///
/// Older servers report a precomputed status string instead of items; that
/// string is honoured as-is.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum PillarData {
    Items(Vec<ContentItem>),
    Detailed { items: Vec<ContentItem> },
    Status(String),
}

/// Body of `GET /recog/progression`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Progression {
    #[serde(default)]
    pub stage: Option<String>,
    #[serde(default, deserialize_with = "wire::opt_timestamp")]
    pub stage_entered_at: Option<Timestamp>,
    #[serde(default, deserialize_with = "wire::or_default")]
    pub pillars: HashMap<String, PillarData>,
    #[serde(default, deserialize_with = "wire::or_default")]
    pub core_memory_count: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PillarRow {
    pub name: PillarName,
    pub status: PillarStatus,
    pub item_count: usize,
    pub preview: Option<String>,
    /// Items beyond the previewed one.
    pub more: usize,
}

impl PillarRow {
    pub fn more_suffix(&self) -> Option<String> {
        (self.more > 0).then(|| format!("+{} more", self.more))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProgressionSummary {
    pub stage: String,
    pub stage_entered_at: Option<Timestamp>,
    pub core_memory_count: u64,
    pub rows: Vec<PillarRow>,
}

impl ProgressionSummary {
    pub fn count(&self, status: PillarStatus) -> usize {
        self.rows.iter().filter(|r| r.status == status).count()
    }

    pub fn row(&self, name: PillarName) -> Option<&PillarRow> {
        self.rows.iter().find(|r| r.name == name)
    }
}

/// Build one row per canonical pillar, in canonical order.
pub fn summarize(progression: &Progression) -> ProgressionSummary {
    let mut by_name: HashMap<PillarName, &PillarData> = HashMap::new();
    for (key, data) in &progression.pillars {
        if let Ok(name) = key.parse::<PillarName>() {
            by_name.insert(name, data);
        }
    }

    let rows = PillarName::ALL
        .into_iter()
        .map(|name| match by_name.get(&name) {
            Some(PillarData::Items(items)) | Some(PillarData::Detailed { items }) => {
                row_from_items(name, items)
            }
            Some(PillarData::Status(status)) => PillarRow {
                name,
                status: status.parse().unwrap_or(PillarStatus::Empty),
                item_count: 0,
                preview: None,
                more: 0,
            },
            None => row_from_items(name, &[]),
        })
        .collect();

    ProgressionSummary {
        stage: progression
            .stage
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| "nascent".to_string()),
        stage_entered_at: progression.stage_entered_at,
        core_memory_count: progression.core_memory_count,
        rows,
    }
}

fn row_from_items(name: PillarName, items: &[ContentItem]) -> PillarRow {
    let preview = items
        .first()
        .map(|item| truncate_chars(&item.content, PREVIEW_CHARS))
        .filter(|p| !p.is_empty());
    PillarRow {
        name,
        status: PillarStatus::from_count(items.len()),
        item_count: items.len(),
        preview,
        more: items.len().saturating_sub(1),
    }
}
