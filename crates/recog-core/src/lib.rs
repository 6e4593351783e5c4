pub mod nav;
pub mod operation;
pub mod progression;
pub mod record;
pub mod text;
pub mod wire;

use thiserror::Error;

pub use nav::{DetailRef, NavStep, Navigator, Tab};
pub use operation::{Operation, OperationStatus, OperationType, ProcessResult, StatusSnapshot};
pub use progression::{
    ContentItem, PillarData, PillarName, PillarRow, PillarStatus, Progression,
    ProgressionSummary, summarize,
};
pub use record::{
    Conclusion, EntityKind, Insight, InsightRef, Pattern, PatternRef, Record, Report,
    SignificanceTier, Source, Synthesis,
};
pub use wire::{RecordId, Timestamp};

/// A string that does not name any variant of a closed set (tab, pillar, ...).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind}: {value:?}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownVariant {
    pub fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}
