//! The workbench: one context's stores, navigation and notices.
//!
//! Every user intent the binder forwards lands here. Failures never escape as
//! errors; they become [`Notice`]s and the affected state stays as it was.
//! Stale responses are dropped silently.

use std::collections::VecDeque;
use std::sync::Arc;

use recog_client::{ClientError, InsightFilter, Page, RecogApi};
use recog_core::{
    DetailRef, Insight, NavStep, Navigator, Pattern, ProgressionSummary, RecordId, Report,
    StatusSnapshot, Tab, summarize,
};
use tracing::{debug, warn};

use crate::paged::PageTicket;
use crate::{InsightStore, OperationQueue, PatternStore, ProcessSummary, ReportStore, StoreError};

#[derive(Debug, Clone)]
pub struct WorkbenchConfig {
    pub page_size: u32,
    /// Breadcrumbs kept for `back`.
    pub nav_depth: usize,
}

impl Default for WorkbenchConfig {
    fn default() -> Self {
        Self {
            page_size: 20,
            nav_depth: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

/// A user-visible toast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

/// The record behind the active detail pane.
#[derive(Debug, Clone, Copy)]
pub enum ActiveDetail<'a> {
    Insight(&'a Insight),
    Pattern(&'a Pattern),
    Report(&'a Report),
}

pub struct Workbench {
    api: Arc<dyn RecogApi>,
    queue: OperationQueue,
    insights: InsightStore,
    patterns: PatternStore,
    reports: ReportStore,
    nav: Navigator,
    tab: Tab,
    status: Option<StatusSnapshot>,
    progression: Option<ProgressionSummary>,
    notices: VecDeque<Notice>,
}

impl Workbench {
    pub fn new(api: Arc<dyn RecogApi>, config: WorkbenchConfig) -> Self {
        Self {
            api,
            queue: OperationQueue::new(),
            insights: InsightStore::new(config.page_size),
            patterns: PatternStore::new(config.page_size),
            reports: ReportStore::new(),
            nav: Navigator::with_depth(config.nav_depth),
            tab: Tab::default(),
            status: None,
            progression: None,
            notices: VecDeque::new(),
        }
    }

    /// Shared handle for requests the binder runs on its own tasks.
    pub fn api(&self) -> Arc<dyn RecogApi> {
        Arc::clone(&self.api)
    }

    pub fn queue(&self) -> &OperationQueue {
        &self.queue
    }

    pub fn insights(&self) -> &InsightStore {
        &self.insights
    }

    pub fn insights_mut(&mut self) -> &mut InsightStore {
        &mut self.insights
    }

    pub fn patterns(&self) -> &PatternStore {
        &self.patterns
    }

    pub fn reports(&self) -> &ReportStore {
        &self.reports
    }

    pub fn navigator(&self) -> &Navigator {
        &self.nav
    }

    pub fn tab(&self) -> Tab {
        self.tab
    }

    pub fn status(&self) -> Option<&StatusSnapshot> {
        self.status.as_ref()
    }

    pub fn progression(&self) -> Option<&ProgressionSummary> {
        self.progression.as_ref()
    }

    // ── notices ──

    pub fn notify_success(&mut self, message: impl Into<String>) {
        self.notices.push_back(Notice {
            level: NoticeLevel::Success,
            message: message.into(),
        });
    }

    pub fn notify_error(&mut self, message: impl Into<String>) {
        self.notices.push_back(Notice {
            level: NoticeLevel::Error,
            message: message.into(),
        });
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        self.notices.drain(..).collect()
    }

    fn absorb<T>(&mut self, action: &str, result: Result<T, StoreError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) if e.is_stale() => {
                debug!(action, error = %e, "ignoring stale response");
                None
            }
            Err(e) => {
                warn!(action, error = %e, "request failed");
                self.notify_error(e.user_message());
                None
            }
        }
    }

    // ── tabs ──

    /// Switch tab without loading anything.
    pub fn set_tab(&mut self, tab: Tab) {
        self.tab = tab;
    }

    /// Switch tab and load what it shows.
    pub async fn show_tab(&mut self, tab: Tab) {
        self.tab = tab;
        match tab {
            Tab::Queue => {
                self.refresh_queue().await;
            }
            Tab::Insights => {
                self.refresh_insights().await;
            }
            Tab::Reports => {
                self.load_reports().await;
            }
            Tab::Progression => {
                self.load_progression().await;
            }
        }
    }

    pub async fn refresh_status(&mut self) -> bool {
        let result = self.api.status().await.map_err(StoreError::from);
        match self.absorb("status", result) {
            Some(status) => {
                self.status = Some(status);
                true
            }
            None => false,
        }
    }

    pub async fn load_progression(&mut self) -> bool {
        let result = self.api.progression().await.map_err(StoreError::from);
        match self.absorb("progression", result) {
            Some(progression) => {
                self.progression = Some(summarize(&progression));
                true
            }
            None => false,
        }
    }

    // ── queue ──

    pub async fn refresh_queue(&mut self) -> bool {
        let result = self.queue.list(&*self.api).await;
        self.absorb("list operations", result).is_some()
    }

    /// Scan for new work, report what was queued, then re-list. A failed
    /// re-list adds its own notice after the count.
    pub async fn check(&mut self) -> bool {
        let result = self.queue.check(&*self.api).await;
        match self.absorb("check", result) {
            Some(0) => self.notify_success("No new operations found"),
            Some(n) => self.notify_success(format!("Queued {n} new operation(s)")),
            None => return false,
        }
        self.refresh_queue().await
    }

    pub async fn confirm(&mut self, id: &RecordId) -> bool {
        let result = self.queue.confirm(&*self.api, id).await;
        if self.absorb("confirm", result).is_none() {
            return false;
        }
        self.notify_success("Operation confirmed");
        true
    }

    pub async fn cancel(&mut self, id: &RecordId) -> bool {
        let result = self.queue.cancel(&*self.api, id).await;
        if self.absorb("cancel", result).is_none() {
            return false;
        }
        self.notify_success("Operation returned to pending");
        true
    }

    pub async fn process(&mut self) -> Option<ProcessSummary> {
        let result = self.queue.process(&*self.api).await;
        let summary = self.absorb("process", result)?;
        if summary.failed == 0 {
            self.notify_success(summary.message());
        } else {
            self.notify_error(summary.message());
        }
        Some(summary)
    }

    // ── lists ──

    pub async fn query_insights(&mut self, search: Option<String>, filter: InsightFilter) -> bool {
        let result = self.insights.query(&*self.api, search, filter).await;
        self.absorb("list insights", result).is_some()
    }

    /// New search text under the current filter.
    pub async fn search(&mut self, text: Option<String>) -> bool {
        let filter = self.insights.filter();
        self.query_insights(text, filter).await
    }

    /// New filter under the current search text.
    pub async fn set_filter(&mut self, filter: InsightFilter) -> bool {
        let search = self.insights.search().map(str::to_string);
        self.query_insights(search, filter).await
    }

    pub async fn refresh_insights(&mut self) -> bool {
        let result = self.insights.refresh(&*self.api).await;
        self.absorb("list insights", result).is_some()
    }

    pub async fn load_more(&mut self) -> bool {
        let result = self.insights.load_more(&*self.api).await;
        self.absorb("load more insights", result).is_some()
    }

    /// Apply a page fetched off the binder's own task.
    pub fn apply_insight_page(
        &mut self,
        ticket: PageTicket,
        result: Result<Page<Insight>, ClientError>,
    ) -> bool {
        let result = self.insights.apply_page(ticket, result);
        self.absorb("search insights", result).is_some()
    }

    pub async fn load_patterns(&mut self, limit: Option<u32>) -> bool {
        let result = self.patterns.query(&*self.api, limit).await;
        self.absorb("list patterns", result).is_some()
    }

    pub async fn load_reports(&mut self) -> bool {
        let result = self.reports.query(&*self.api).await;
        self.absorb("list reports", result).is_some()
    }

    // ── navigation ──

    pub fn active(&self) -> Option<&DetailRef> {
        self.nav.active()
    }

    pub fn active_detail(&self) -> Option<ActiveDetail<'_>> {
        match self.nav.active()? {
            DetailRef::Insight(id) => self
                .insights
                .selected()
                .filter(|r| &r.id == id)
                .map(ActiveDetail::Insight),
            DetailRef::Pattern(id) => self
                .patterns
                .selected()
                .filter(|r| &r.id == id)
                .map(ActiveDetail::Pattern),
            DetailRef::Report(id) => self
                .reports
                .selected()
                .filter(|r| &r.id == id)
                .map(ActiveDetail::Report),
        }
    }

    /// Id of the open insight, if the active pane is one.
    pub fn active_insight(&self) -> Option<RecordId> {
        match self.nav.active()? {
            DetailRef::Insight(id) => Some(id.clone()),
            _ => None,
        }
    }

    /// Records the active pane links to, in display order.
    pub fn cross_refs(&self) -> Vec<DetailRef> {
        match self.active_detail() {
            Some(ActiveDetail::Insight(insight)) => insight
                .linked_patterns
                .iter()
                .map(|p| DetailRef::Pattern(p.id.clone()))
                .collect(),
            Some(ActiveDetail::Pattern(pattern)) => pattern
                .insights
                .iter()
                .map(|i| DetailRef::Insight(i.id.clone()))
                .collect(),
            Some(ActiveDetail::Report(report)) => report
                .patterns
                .iter()
                .map(|p| DetailRef::Pattern(p.id.clone()))
                .chain(report.insights.iter().map(|i| DetailRef::Insight(i.id.clone())))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Fetch and show `target`, switching to the tab that owns it. Navigation
    /// only moves once the record has arrived.
    pub async fn open(&mut self, target: DetailRef) -> bool {
        if !self.load_detail(&target, true).await {
            return false;
        }
        let step = self.nav.open(target);
        self.tab = step.tab;
        true
    }

    /// Follow the `index`-th cross reference (0-based) of the active pane.
    pub async fn follow(&mut self, index: usize) -> bool {
        match self.cross_refs().into_iter().nth(index) {
            Some(target) => self.open(target).await,
            None => {
                self.notify_error(format!("No link #{}", index + 1));
                false
            }
        }
    }

    /// Restore the previous pane; with none, the pane closes.
    pub async fn back(&mut self) -> bool {
        match self.nav.back() {
            Some(step) => self.arrive(step).await,
            None => false,
        }
    }

    pub fn close(&mut self) {
        self.nav.close();
    }

    async fn arrive(&mut self, step: NavStep) -> bool {
        self.tab = step.tab;
        self.load_detail(&step.target, false).await
    }

    async fn load_detail(&mut self, target: &DetailRef, force: bool) -> bool {
        let result = match target {
            DetailRef::Insight(id) => {
                if !force && self.insights.selected().is_some_and(|r| &r.id == id) {
                    return true;
                }
                self.insights.detail(&*self.api, id).await.map(|_| ())
            }
            DetailRef::Pattern(id) => {
                if !force && self.patterns.selected().is_some_and(|r| &r.id == id) {
                    return true;
                }
                self.patterns.detail(&*self.api, id).await.map(|_| ())
            }
            DetailRef::Report(id) => {
                if !force && self.reports.selected().is_some_and(|r| &r.id == id) {
                    return true;
                }
                self.reports.detail(&*self.api, id).await.map(|_| ())
            }
        };
        self.absorb("open detail", result).is_some()
    }

    // ── insight mutations ──

    pub async fn toggle_flag(&mut self, id: &RecordId) -> Option<bool> {
        let result = self.insights.toggle_flag(&*self.api, id).await;
        let flagged = self.absorb("flag insight", result)?;
        self.notify_success(if flagged { "Insight flagged" } else { "Flag removed" });
        Some(flagged)
    }

    pub async fn save_context(&mut self, id: &RecordId, text: &str) -> bool {
        let result = self.insights.save_context(&*self.api, id, text).await;
        match self.absorb("save context", result) {
            Some(Some(_)) => self.notify_success("Context saved"),
            Some(None) => self.notify_success("Context cleared"),
            None => return false,
        }
        true
    }

    /// Reject an insight. If its pane was open, the pane falls back to the
    /// breadcrumb, or closes.
    pub async fn reject(&mut self, id: &RecordId) -> bool {
        let result = self.insights.reject(&*self.api, id, true).await;
        if self.absorb("reject insight", result).is_none() {
            return false;
        }
        let was_active = self.active_insight().as_ref() == Some(id);
        let step = self.nav.forget(&DetailRef::Insight(id.clone()));
        if was_active && let Some(step) = step {
            self.arrive(step).await;
        }
        self.notify_success("Insight rejected");
        true
    }

    /// Un-reject an insight, then re-run the insight query and show it
    /// again. Once the server accepts, the restore counts as done; a failed
    /// follow-up read only adds its own notice.
    pub async fn restore(&mut self, id: &RecordId) -> bool {
        let result = self.insights.reject(&*self.api, id, false).await;
        if self.absorb("restore insight", result).is_none() {
            return false;
        }
        self.notify_success("Insight restored");
        if self.insights.filter() != InsightFilter::Rejected {
            self.refresh_insights().await;
        }
        self.open(DetailRef::Insight(id.clone())).await;
        true
    }
}
