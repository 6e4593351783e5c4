//! In-memory `RecogApi` for store tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use recog_client::{ClientError, InsightFilter, ListQuery, Page, RecogApi};
use recog_core::{
    Insight, Operation, OperationStatus, Pattern, ProcessResult, Progression, RecordId, Report,
    StatusSnapshot,
};
use serde_json::json;

pub fn op(id: u64, status: &str) -> Operation {
    serde_json::from_value(json!({
        "id": id, "operation_type": "extract", "status": status,
        "estimated_mana": 2, "source_count": 3,
        "description": format!("operation {id}")
    }))
    .unwrap()
}

pub fn insight(id: u64, summary: &str) -> Insight {
    serde_json::from_value(json!({
        "id": id, "summary": summary, "significance": 0.5, "significance_tier": "silver"
    }))
    .unwrap()
}

pub fn pattern(id: u64, insight_ids: &[u64]) -> Pattern {
    let insights: Vec<_> = insight_ids.iter().map(|i| json!({"id": i})).collect();
    serde_json::from_value(json!({
        "id": id, "pattern_type": "recurring", "summary": format!("pattern {id}"),
        "strength": 0.7, "insights": insights
    }))
    .unwrap()
}

pub fn report(id: u64, pattern_ids: &[u64], insight_ids: &[u64]) -> Report {
    let patterns: Vec<_> = pattern_ids.iter().map(|i| json!({"id": i})).collect();
    let insights: Vec<_> = insight_ids.iter().map(|i| json!({"id": i})).collect();
    serde_json::from_value(json!({
        "id": id, "report_type": "synthesis", "summary": format!("report {id}"),
        "patterns": patterns, "insights": insights
    }))
    .unwrap()
}

#[derive(Default)]
struct State {
    operations: Vec<Operation>,
    on_check: Vec<Operation>,
    failing: Vec<RecordId>,
    insights: Vec<Insight>,
    patterns: Vec<Pattern>,
    reports: Vec<Report>,
    progression: Option<Progression>,
    offline: bool,
    broken: HashSet<&'static str>,
    calls: HashMap<&'static str, usize>,
}

#[derive(Default)]
pub struct FakeApi {
    state: Mutex<State>,
}

impl FakeApi {
    pub fn with_operations(operations: Vec<Operation>) -> Self {
        let api = Self::default();
        api.state.lock().unwrap().operations = operations;
        api
    }

    pub fn with_insights(insights: Vec<Insight>) -> Self {
        let api = Self::default();
        api.state.lock().unwrap().insights = insights;
        api
    }

    pub fn set_patterns(&self, patterns: Vec<Pattern>) {
        self.state.lock().unwrap().patterns = patterns;
    }

    pub fn set_reports(&self, reports: Vec<Report>) {
        self.state.lock().unwrap().reports = reports;
    }

    pub fn set_progression(&self, progression: Progression) {
        self.state.lock().unwrap().progression = Some(progression);
    }

    pub fn queue_on_check(&self, operations: Vec<Operation>) {
        self.state.lock().unwrap().on_check = operations;
    }

    /// Processing this operation reports failure.
    pub fn fail_processing(&self, id: u64) {
        self.state.lock().unwrap().failing.push(id.into());
    }

    /// Every following request times out.
    pub fn go_offline(&self) {
        self.state.lock().unwrap().offline = true;
    }

    /// Every following call to `name` times out.
    pub fn fail_call(&self, name: &'static str) {
        self.state.lock().unwrap().broken.insert(name);
    }

    pub fn calls(&self, name: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .calls
            .get(name)
            .copied()
            .unwrap_or(0)
    }

    pub fn stored_insight(&self, id: u64) -> Insight {
        let id = RecordId::from(id);
        let state = self.state.lock().unwrap();
        state.insights.iter().find(|i| i.id == id).unwrap().clone()
    }

    fn enter(&self, name: &'static str) -> Result<std::sync::MutexGuard<'_, State>, ClientError> {
        let mut state = self.state.lock().unwrap();
        *state.calls.entry(name).or_default() += 1;
        if state.offline || state.broken.contains(name) {
            return Err(ClientError::Timeout);
        }
        Ok(state)
    }
}

fn not_found(what: &str) -> ClientError {
    ClientError::Application(format!("{what} not found"))
}

fn transition(
    state: &mut State,
    id: &RecordId,
    from: OperationStatus,
    to: OperationStatus,
) -> Result<(), ClientError> {
    match state
        .operations
        .iter_mut()
        .find(|op| &op.id == id && op.status == from)
    {
        Some(op) => {
            op.status = to;
            Ok(())
        }
        None => Err(ClientError::Application(format!(
            "Operation not found or not {from}"
        ))),
    }
}

#[async_trait]
impl RecogApi for FakeApi {
    async fn status(&self) -> Result<StatusSnapshot, ClientError> {
        let state = self.enter("status")?;
        let mut snapshot = StatusSnapshot {
            llm_available: true,
            ..Default::default()
        };
        for op in &state.operations {
            *snapshot.queue.entry(op.status.to_string()).or_default() += 1;
        }
        snapshot.patterns = state.patterns.len() as u64;
        Ok(snapshot)
    }

    async fn check(&self) -> Result<u32, ClientError> {
        let mut state = self.enter("check")?;
        let queued = std::mem::take(&mut state.on_check);
        let count = queued.len() as u32;
        state.operations.extend(queued);
        Ok(count)
    }

    async fn pending(&self) -> Result<Vec<Operation>, ClientError> {
        let state = self.enter("pending")?;
        Ok(state
            .operations
            .iter()
            .filter(|op| !op.status.is_terminal())
            .cloned()
            .collect())
    }

    async fn confirm(&self, id: &RecordId) -> Result<(), ClientError> {
        let mut state = self.enter("confirm")?;
        transition(&mut state, id, OperationStatus::Pending, OperationStatus::Ready)
    }

    async fn cancel(&self, id: &RecordId) -> Result<(), ClientError> {
        let mut state = self.enter("cancel")?;
        transition(&mut state, id, OperationStatus::Ready, OperationStatus::Pending)
    }

    async fn process(&self) -> Result<Vec<ProcessResult>, ClientError> {
        let mut state = self.enter("process")?;
        let failing = state.failing.clone();
        let mut results = Vec::new();
        for op in state
            .operations
            .iter_mut()
            .filter(|op| op.status == OperationStatus::Ready)
        {
            let success = !failing.contains(&op.id);
            op.status = if success {
                OperationStatus::Done
            } else {
                OperationStatus::Failed
            };
            results.push(
                serde_json::from_value(json!({
                    "operation_id": op.id.as_str(),
                    "operation_type": op.operation_type,
                    "success": success,
                    "insights_created": if success { 2 } else { 0 },
                    "error": if success { None } else { Some("LLM unavailable") },
                }))
                .map_err(ClientError::Json)?,
            );
        }
        Ok(results)
    }

    async fn insights(&self, query: &ListQuery) -> Result<Page<Insight>, ClientError> {
        let state = self.enter("insights")?;
        let needle = query
            .search
            .as_deref()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());
        let matching: Vec<&Insight> = state
            .insights
            .iter()
            .filter(|i| match query.filter {
                InsightFilter::Rejected => i.rejected,
                InsightFilter::All => !i.rejected,
                InsightFilter::Flagged => !i.rejected && i.flagged,
                InsightFilter::Reviewed => !i.rejected && i.reviewed,
                InsightFilter::Unreviewed => !i.rejected && !i.reviewed,
            })
            .filter(|i| {
                needle
                    .as_ref()
                    .is_none_or(|n| i.summary.to_lowercase().contains(n))
            })
            .collect();
        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(query.offset as usize)
            .take(query.limit as usize)
            .cloned()
            .collect();
        Ok(Page::new(items, Some(total)))
    }

    async fn insight(&self, id: &RecordId) -> Result<Insight, ClientError> {
        let state = self.enter("insight")?;
        state
            .insights
            .iter()
            .find(|i| &i.id == id)
            .cloned()
            .ok_or_else(|| not_found("Insight"))
    }

    async fn set_flag(&self, id: &RecordId, flagged: bool) -> Result<bool, ClientError> {
        let mut state = self.enter("set_flag")?;
        let insight = state
            .insights
            .iter_mut()
            .find(|i| &i.id == id)
            .ok_or_else(|| not_found("Insight"))?;
        insight.flagged = flagged;
        Ok(flagged)
    }

    async fn save_context(&self, id: &RecordId, text: &str) -> Result<(), ClientError> {
        let mut state = self.enter("save_context")?;
        let insight = state
            .insights
            .iter_mut()
            .find(|i| &i.id == id)
            .ok_or_else(|| not_found("Insight"))?;
        insight.user_context = (!text.is_empty()).then(|| text.to_string());
        Ok(())
    }

    async fn reject(&self, id: &RecordId, reject: bool) -> Result<(), ClientError> {
        let mut state = self.enter("reject")?;
        let insight = state
            .insights
            .iter_mut()
            .find(|i| &i.id == id)
            .ok_or_else(|| not_found("Insight"))?;
        insight.rejected = reject;
        Ok(())
    }

    async fn patterns(&self, limit: u32) -> Result<Page<Pattern>, ClientError> {
        let state = self.enter("patterns")?;
        let items = state.patterns.iter().take(limit as usize).cloned().collect();
        Ok(Page::new(items, None))
    }

    async fn pattern(&self, id: &RecordId) -> Result<Pattern, ClientError> {
        let state = self.enter("pattern")?;
        state
            .patterns
            .iter()
            .find(|p| &p.id == id)
            .cloned()
            .ok_or_else(|| not_found("Pattern"))
    }

    async fn reports(&self) -> Result<Page<Report>, ClientError> {
        let state = self.enter("reports")?;
        Ok(Page::new(state.reports.clone(), None))
    }

    async fn report(&self, id: &RecordId) -> Result<Report, ClientError> {
        let state = self.enter("report")?;
        state
            .reports
            .iter()
            .find(|r| &r.id == id)
            .cloned()
            .ok_or_else(|| not_found("Report"))
    }

    async fn progression(&self) -> Result<Progression, ClientError> {
        let state = self.enter("progression")?;
        Ok(state.progression.clone().unwrap_or_default())
    }
}
