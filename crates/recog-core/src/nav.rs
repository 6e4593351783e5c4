//! Navigation stack for the shared detail pane.
//!
//! One pane shows one record at a time. Opening a record of the same kind
//! replaces the pane in place; opening a record of a different kind keeps the
//! previous pane as a breadcrumb so `back` can restore it exactly. The number
//! of breadcrumbs kept is bounded by `max_depth` (1 by default: single-level
//! back).

use std::fmt;
use std::str::FromStr;

use crate::UnknownVariant;
use crate::record::EntityKind;
use crate::wire::RecordId;

/// Top-level tabs of the ReCog drawer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Tab {
    #[default]
    Queue,
    Insights,
    Reports,
    Progression,
}

impl Tab {
    pub const ALL: [Tab; 4] = [Tab::Queue, Tab::Insights, Tab::Reports, Tab::Progression];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queue => "queue",
            Self::Insights => "insights",
            Self::Reports => "reports",
            Self::Progression => "progression",
        }
    }

    /// Tab that owns the primary list of records of `kind`.
    pub fn owning(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Insight | EntityKind::Pattern => Self::Insights,
            EntityKind::Report => Self::Reports,
        }
    }
}

impl fmt::Display for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tab {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "queue" | "ops" | "operations" => Ok(Self::Queue),
            "insights" | "insight" => Ok(Self::Insights),
            "reports" | "report" => Ok(Self::Reports),
            "progression" | "progress" | "pillars" => Ok(Self::Progression),
            _ => Err(UnknownVariant::new("tab", s)),
        }
    }
}

/// What the detail pane is showing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DetailRef {
    Insight(RecordId),
    Pattern(RecordId),
    Report(RecordId),
}

impl DetailRef {
    pub fn new(kind: EntityKind, id: RecordId) -> Self {
        match kind {
            EntityKind::Insight => Self::Insight(id),
            EntityKind::Pattern => Self::Pattern(id),
            EntityKind::Report => Self::Report(id),
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Insight(_) => EntityKind::Insight,
            Self::Pattern(_) => EntityKind::Pattern,
            Self::Report(_) => EntityKind::Report,
        }
    }

    pub fn id(&self) -> &RecordId {
        match self {
            Self::Insight(id) | Self::Pattern(id) | Self::Report(id) => id,
        }
    }

    pub fn owning_tab(&self) -> Tab {
        Tab::owning(self.kind())
    }
}

impl fmt::Display for DetailRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind(), self.id())
    }
}

/// Where the binder should go after a navigation intent: switch to `tab`,
/// then show `target`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavStep {
    pub tab: Tab,
    pub target: DetailRef,
}

impl NavStep {
    fn to(target: DetailRef) -> Self {
        Self {
            tab: target.owning_tab(),
            target,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Navigator {
    active: Option<DetailRef>,
    trail: Vec<DetailRef>,
    max_depth: usize,
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new()
    }
}

impl Navigator {
    /// Single-level back history.
    pub fn new() -> Self {
        Self::with_depth(1)
    }

    pub fn with_depth(max_depth: usize) -> Self {
        Self {
            active: None,
            trail: Vec::new(),
            max_depth,
        }
    }

    pub fn active(&self) -> Option<&DetailRef> {
        self.active.as_ref()
    }

    /// The pane `back` would restore, if any.
    pub fn back_target(&self) -> Option<&DetailRef> {
        self.trail.last()
    }

    pub fn depth(&self) -> usize {
        self.trail.len()
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Open `target` in the detail pane.
    pub fn open(&mut self, target: DetailRef) -> NavStep {
        match self.active.take() {
            Some(current) if current.kind() != target.kind() => self.push_trail(current),
            // Same kind (or same record): replaced in place, breadcrumbs untouched.
            _ => {}
        }
        self.active = Some(target.clone());
        NavStep::to(target)
    }

    /// Restore the previous pane. With no breadcrumb, closes the pane and
    /// returns `None`.
    pub fn back(&mut self) -> Option<NavStep> {
        match self.trail.pop() {
            Some(previous) => {
                self.active = Some(previous.clone());
                Some(NavStep::to(previous))
            }
            None => {
                self.active = None;
                None
            }
        }
    }

    pub fn close(&mut self) {
        self.active = None;
        self.trail.clear();
    }

    /// Drop every reference to `target` (e.g. a rejected insight). If it was
    /// the active pane, falls back like [`back`](Self::back). Returns the pane
    /// now showing.
    pub fn forget(&mut self, target: &DetailRef) -> Option<NavStep> {
        self.trail.retain(|r| r != target);
        if self.active.as_ref() == Some(target) {
            return self.back();
        }
        self.active.clone().map(NavStep::to)
    }

    fn push_trail(&mut self, previous: DetailRef) {
        if self.max_depth == 0 {
            return;
        }
        self.trail.retain(|r| *r != previous);
        self.trail.push(previous);
        while self.trail.len() > self.max_depth {
            self.trail.remove(0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn insight(id: &str) -> DetailRef {
        DetailRef::Insight(id.into())
    }

    fn pattern(id: &str) -> DetailRef {
        DetailRef::Pattern(id.into())
    }

    fn report(id: &str) -> DetailRef {
        DetailRef::Report(id.into())
    }

    #[test]
    fn insight_over_pattern_remembers_pattern() {
        let mut nav = Navigator::new();
        nav.open(pattern("p1"));
        let step = nav.open(insight("i1"));
        assert_eq!(step.tab, Tab::Insights);
        assert_eq!(nav.active(), Some(&insight("i1")));
        assert_eq!(nav.back_target(), Some(&pattern("p1")));

        let back = nav.back().unwrap();
        assert_eq!(back.target, pattern("p1"));
        assert_eq!(nav.active(), Some(&pattern("p1")));
        assert!(nav.back_target().is_none());
    }

    #[test]
    fn same_kind_replaces_without_breadcrumb() {
        let mut nav = Navigator::new();
        nav.open(insight("i1"));
        nav.open(insight("i2"));
        assert_eq!(nav.active(), Some(&insight("i2")));
        assert_eq!(nav.depth(), 0);
        assert!(nav.back().is_none());
        assert!(nav.active().is_none());
    }

    #[test]
    fn same_kind_keeps_existing_breadcrumb() {
        let mut nav = Navigator::new();
        nav.open(report("r1"));
        nav.open(insight("i1"));
        nav.open(insight("i2"));
        assert_eq!(nav.back_target(), Some(&report("r1")));
    }

    #[test]
    fn report_link_switches_to_insights_tab() {
        let mut nav = Navigator::new();
        let step = nav.open(report("r1"));
        assert_eq!(step.tab, Tab::Reports);
        let step = nav.open(insight("i9"));
        assert_eq!(step.tab, Tab::Insights);
        let back = nav.back().unwrap();
        assert_eq!(back.tab, Tab::Reports);
        assert_eq!(back.target, report("r1"));
    }

    #[test]
    fn single_level_drops_oldest_breadcrumb() {
        let mut nav = Navigator::new();
        nav.open(report("r1"));
        nav.open(pattern("p1"));
        nav.open(insight("i1"));
        assert_eq!(nav.depth(), 1);
        assert_eq!(nav.back().unwrap().target, pattern("p1"));
        assert!(nav.back().is_none());
    }

    #[test]
    fn deeper_history_walks_back_in_order() {
        let mut nav = Navigator::with_depth(4);
        nav.open(report("r1"));
        nav.open(pattern("p1"));
        nav.open(insight("i1"));
        assert_eq!(nav.back().unwrap().target, pattern("p1"));
        assert_eq!(nav.back().unwrap().target, report("r1"));
        assert!(nav.back().is_none());
    }

    #[test]
    fn reopening_active_is_noop() {
        let mut nav = Navigator::new();
        nav.open(pattern("p1"));
        nav.open(insight("i1"));
        nav.open(insight("i1"));
        assert_eq!(nav.back_target(), Some(&pattern("p1")));
    }

    #[test]
    fn forget_active_falls_back() {
        let mut nav = Navigator::new();
        nav.open(pattern("p1"));
        nav.open(insight("i1"));
        let now = nav.forget(&insight("i1")).unwrap();
        assert_eq!(now.target, pattern("p1"));
        assert!(nav.back_target().is_none());
    }

    #[test]
    fn forget_breadcrumb_keeps_active() {
        let mut nav = Navigator::new();
        nav.open(insight("i1"));
        nav.open(pattern("p1"));
        let now = nav.forget(&insight("i1")).unwrap();
        assert_eq!(now.target, pattern("p1"));
        assert_eq!(nav.depth(), 0);
    }

    #[test]
    fn close_clears_everything() {
        let mut nav = Navigator::new();
        nav.open(pattern("p1"));
        nav.open(insight("i1"));
        nav.close();
        assert!(nav.active().is_none());
        assert_eq!(nav.depth(), 0);
    }

    #[test]
    fn tab_parsing() {
        assert_eq!("Reports".parse::<Tab>().unwrap(), Tab::Reports);
        assert_eq!("ops".parse::<Tab>().unwrap(), Tab::Queue);
        assert!("settings".parse::<Tab>().is_err());
    }
}
