//! Operation queue: cognitive operations through confirm-then-process.
//!
//! The server is authoritative for every status. The one local overlay is the
//! set of operations submitted in the current processing batch, which read as
//! `processing` until the batch response arrives and the list is re-fetched.

use std::collections::HashSet;

use recog_client::{ClientError, RecogApi};
use recog_core::{Operation, OperationStatus, ProcessResult, RecordId};
use tracing::{debug, info, warn};

use crate::StoreError;
use crate::seq::SequenceGuard;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListTicket(u64);

/// Handle for one submitted processing batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessTicket {
    pub submitted: Vec<RecordId>,
}

/// Outcome of one processing batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub results: Vec<ProcessResult>,
}

impl ProcessSummary {
    pub fn from_results(results: Vec<ProcessResult>) -> Self {
        let succeeded = results.iter().filter(|r| r.success).count();
        Self {
            succeeded,
            failed: results.len() - succeeded,
            results,
        }
    }

    pub fn message(&self) -> String {
        let mut msg = format!("Processed {} operation(s)", self.succeeded);
        if self.failed > 0 {
            msg.push_str(&format!(", {} failed", self.failed));
        }
        msg
    }
}

#[derive(Debug, Default)]
pub struct OperationQueue {
    operations: Vec<Operation>,
    list_seq: SequenceGuard,
    checking: bool,
    batch_in_flight: bool,
    submitting: HashSet<RecordId>,
}

impl OperationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn get(&self, id: &RecordId) -> Option<&Operation> {
        self.operations.iter().find(|op| &op.id == id)
    }

    /// Status as displayed: `processing` while the operation sits in the
    /// current batch, otherwise whatever the server last reported.
    pub fn effective_status(&self, op: &Operation) -> OperationStatus {
        if self.submitting.contains(&op.id) {
            OperationStatus::Processing
        } else {
            op.status
        }
    }

    pub fn ready_count(&self) -> usize {
        self.operations
            .iter()
            .filter(|op| self.effective_status(op) == OperationStatus::Ready)
            .count()
    }

    pub fn badge_count(&self) -> usize {
        self.operations.len()
    }

    pub fn is_checking(&self) -> bool {
        self.checking
    }

    pub fn is_processing(&self) -> bool {
        self.batch_in_flight
    }

    pub fn can_process(&self) -> bool {
        !self.batch_in_flight && self.ready_count() > 0
    }

    // ── list ──

    pub fn begin_list(&mut self) -> ListTicket {
        ListTicket(self.list_seq.issue())
    }

    /// Replace the collection wholesale. Returns the new length.
    pub fn apply_list(
        &mut self,
        ticket: ListTicket,
        result: Result<Vec<Operation>, ClientError>,
    ) -> Result<usize, StoreError> {
        if let Err(e) = self.list_seq.check(ticket.0) {
            debug!(seq = ticket.0, "discarding stale operation list");
            return Err(e);
        }
        self.operations = result?;
        Ok(self.operations.len())
    }

    pub async fn list(&mut self, api: &dyn RecogApi) -> Result<usize, StoreError> {
        let ticket = self.begin_list();
        let result = api.pending().await;
        self.apply_list(ticket, result)
    }

    // ── check ──

    pub fn begin_check(&mut self) -> Result<(), StoreError> {
        if self.checking {
            return Err(StoreError::CheckInFlight);
        }
        self.checking = true;
        Ok(())
    }

    pub fn finish_check(&mut self, result: Result<u32, ClientError>) -> Result<u32, StoreError> {
        self.checking = false;
        Ok(result?)
    }

    /// Ask the server to scan for new work. Returns how many operations it
    /// queued; the list is not refreshed here.
    pub async fn check(&mut self, api: &dyn RecogApi) -> Result<u32, StoreError> {
        self.begin_check()?;
        let result = api.check().await;
        self.finish_check(result)
    }

    // ── confirm / cancel ──

    /// Reject a transition the local copy already knows is impossible.
    /// Unknown ids pass through; the server decides.
    pub fn guard_transition(
        &self,
        id: &RecordId,
        from: OperationStatus,
        action: &'static str,
    ) -> Result<(), StoreError> {
        match self.get(id) {
            Some(op) if self.effective_status(op) != from => Err(StoreError::InvalidTransition {
                id: id.clone(),
                status: self.effective_status(op),
                action,
            }),
            _ => Ok(()),
        }
    }

    /// `pending -> ready`.
    pub async fn confirm(&mut self, api: &dyn RecogApi, id: &RecordId) -> Result<(), StoreError> {
        self.guard_transition(id, OperationStatus::Pending, "confirm")?;
        api.confirm(id).await?;
        info!(id = %id, "operation confirmed");
        self.list(api).await?;
        Ok(())
    }

    /// `ready -> pending`. Unconfirms; nothing is deleted.
    pub async fn cancel(&mut self, api: &dyn RecogApi, id: &RecordId) -> Result<(), StoreError> {
        self.guard_transition(id, OperationStatus::Ready, "cancel")?;
        api.cancel(id).await?;
        info!(id = %id, "operation returned to pending");
        self.list(api).await?;
        Ok(())
    }

    // ── process ──

    /// Mark every ready operation as submitted. Refused without a request
    /// when nothing is ready or a batch is already running.
    pub fn begin_process(&mut self) -> Result<ProcessTicket, StoreError> {
        if self.batch_in_flight {
            return Err(StoreError::BatchInFlight);
        }
        let submitted: Vec<RecordId> = self
            .operations
            .iter()
            .filter(|op| op.status == OperationStatus::Ready)
            .map(|op| op.id.clone())
            .collect();
        if submitted.is_empty() {
            return Err(StoreError::NothingReady);
        }
        self.batch_in_flight = true;
        self.submitting = submitted.iter().cloned().collect();
        info!(count = submitted.len(), "submitting processing batch");
        Ok(ProcessTicket { submitted })
    }

    /// Reconcile per-operation outcomes. On failure the submitted set is
    /// dropped and server statuses show through unchanged.
    pub fn finish_process(
        &mut self,
        ticket: ProcessTicket,
        result: Result<Vec<ProcessResult>, ClientError>,
    ) -> Result<ProcessSummary, StoreError> {
        self.batch_in_flight = false;
        self.submitting.clear();
        let results = match result {
            Ok(results) => results,
            Err(e) => {
                warn!(count = ticket.submitted.len(), error = %e, "processing batch failed");
                return Err(e.into());
            }
        };
        for r in &results {
            if let Some(op) = self.operations.iter_mut().find(|op| op.id == r.operation_id) {
                op.status = if r.success {
                    OperationStatus::Done
                } else {
                    OperationStatus::Failed
                };
            }
        }
        let summary = ProcessSummary::from_results(results);
        info!(
            succeeded = summary.succeeded,
            failed = summary.failed,
            "processing batch finished"
        );
        Ok(summary)
    }

    /// Run one batch and re-list. The list is fetched even when the batch
    /// response is unusable, since the server may have finished the work.
    pub async fn process(&mut self, api: &dyn RecogApi) -> Result<ProcessSummary, StoreError> {
        let ticket = self.begin_process()?;
        let result = api.process().await;
        let finished = self.finish_process(ticket, result);
        let listed = self.list(api).await;
        let summary = finished?;
        listed?;
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::{FakeApi, op};

    #[tokio::test]
    async fn process_enabled_tracks_ready_count() {
        let api = FakeApi::with_operations(vec![op(1, "pending"), op(2, "pending")]);
        let mut queue = OperationQueue::new();
        queue.list(&api).await.unwrap();
        assert!(!queue.can_process());

        queue.confirm(&api, &1u64.into()).await.unwrap();
        assert_eq!(queue.ready_count(), 1);
        assert!(queue.can_process());

        queue.cancel(&api, &1u64.into()).await.unwrap();
        assert_eq!(queue.ready_count(), 0);
        assert!(!queue.can_process());
    }

    #[tokio::test]
    async fn confirm_then_cancel_round_trips() {
        let api = FakeApi::with_operations(vec![op(1, "pending"), op(2, "ready")]);
        let mut queue = OperationQueue::new();
        queue.list(&api).await.unwrap();

        queue.confirm(&api, &1u64.into()).await.unwrap();
        queue.cancel(&api, &1u64.into()).await.unwrap();
        assert_eq!(queue.get(&1u64.into()).unwrap().status, OperationStatus::Pending);

        queue.cancel(&api, &2u64.into()).await.unwrap();
        queue.confirm(&api, &2u64.into()).await.unwrap();
        assert_eq!(queue.get(&2u64.into()).unwrap().status, OperationStatus::Ready);
    }

    #[tokio::test]
    async fn process_without_ready_sends_nothing() {
        let api = FakeApi::with_operations(vec![op(1, "pending")]);
        let mut queue = OperationQueue::new();
        queue.list(&api).await.unwrap();
        let err = queue.process(&api).await.unwrap_err();
        assert!(matches!(err, StoreError::NothingReady));
        assert_eq!(api.calls("process"), 0);
    }

    #[tokio::test]
    async fn confirm_then_process_single_operation() {
        let api = FakeApi::with_operations(vec![op(1, "pending"), op(2, "pending")]);
        let mut queue = OperationQueue::new();
        queue.list(&api).await.unwrap();
        queue.confirm(&api, &1u64.into()).await.unwrap();

        let summary = queue.process(&api).await.unwrap();
        assert_eq!(summary.results.len(), 1);
        assert_eq!(summary.results[0].operation_id.as_str(), "1");
        assert!(summary.results[0].success);
        assert_eq!(summary.message(), "Processed 1 operation(s)");

        assert!(queue.get(&1u64.into()).is_none());
        assert_eq!(queue.badge_count(), 1);
        assert_eq!(queue.get(&2u64.into()).unwrap().status, OperationStatus::Pending);
    }

    #[test]
    fn submitted_operations_read_as_processing() {
        let mut queue = OperationQueue::new();
        let t = queue.begin_list();
        queue
            .apply_list(t, Ok(vec![op(1, "ready"), op(2, "ready"), op(3, "pending")]))
            .unwrap();

        let ticket = queue.begin_process().unwrap();
        assert_eq!(ticket.submitted.len(), 2);
        let first = queue.get(&1u64.into()).unwrap().clone();
        assert_eq!(queue.effective_status(&first), OperationStatus::Processing);
        assert_eq!(first.status, OperationStatus::Ready);
        assert!(!queue.can_process());
        assert!(matches!(queue.begin_process(), Err(StoreError::BatchInFlight)));

        let results = vec![result(1, true), result(2, false)];
        let summary = queue.finish_process(ticket, Ok(results)).unwrap();
        assert_eq!(summary.message(), "Processed 1 operation(s), 1 failed");
        assert_eq!(queue.get(&1u64.into()).unwrap().status, OperationStatus::Done);
        assert_eq!(queue.get(&2u64.into()).unwrap().status, OperationStatus::Failed);
    }

    #[test]
    fn failed_batch_reverts_overlay() {
        let mut queue = OperationQueue::new();
        let t = queue.begin_list();
        queue.apply_list(t, Ok(vec![op(1, "ready")])).unwrap();
        let ticket = queue.begin_process().unwrap();
        assert!(queue.finish_process(ticket, Err(ClientError::Timeout)).is_err());

        let op1 = queue.get(&1u64.into()).unwrap();
        assert_eq!(queue.effective_status(op1), OperationStatus::Ready);
        assert!(queue.can_process());
    }

    #[tokio::test]
    async fn local_guard_blocks_impossible_transition() {
        let api = FakeApi::with_operations(vec![op(1, "ready")]);
        let mut queue = OperationQueue::new();
        queue.list(&api).await.unwrap();
        let err = queue.confirm(&api, &1u64.into()).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidTransition { action: "confirm", .. }));
        assert_eq!(api.calls("confirm"), 0);
    }

    #[tokio::test]
    async fn vanished_operation_fails_loudly() {
        let api = FakeApi::with_operations(vec![]);
        let mut queue = OperationQueue::new();
        let err = queue.confirm(&api, &42u64.into()).await.unwrap_err();
        assert!(matches!(err, StoreError::Client(ClientError::Application(_))));
    }

    #[tokio::test]
    async fn check_refuses_concurrent_scan() {
        let api = FakeApi::with_operations(vec![]);
        api.queue_on_check(vec![op(7, "pending")]);
        let mut queue = OperationQueue::new();

        queue.begin_check().unwrap();
        assert!(queue.is_checking());
        assert!(matches!(queue.begin_check(), Err(StoreError::CheckInFlight)));
        queue.finish_check(Ok(0)).unwrap();
        assert!(!queue.is_checking());

        assert_eq!(queue.check(&api).await.unwrap(), 1);
        assert_eq!(api.calls("pending"), 0);
        queue.list(&api).await.unwrap();
        assert_eq!(queue.badge_count(), 1);
    }

    #[tokio::test]
    async fn failed_batch_response_still_relists() {
        let api = FakeApi::with_operations(vec![op(1, "ready")]);
        let mut queue = OperationQueue::new();
        queue.list(&api).await.unwrap();
        api.fail_call("process");

        let err = queue.process(&api).await.unwrap_err();
        assert!(matches!(err, StoreError::Client(ClientError::Timeout)));
        assert_eq!(api.calls("pending"), 2);
        assert!(!queue.is_processing());
    }

    #[test]
    fn stale_list_is_discarded() {
        let mut queue = OperationQueue::new();
        let old = queue.begin_list();
        let new = queue.begin_list();
        queue.apply_list(new, Ok(vec![op(1, "pending")])).unwrap();
        assert!(queue.apply_list(old, Ok(vec![])).unwrap_err().is_stale());
        assert_eq!(queue.badge_count(), 1);
    }

    fn result(id: u64, success: bool) -> ProcessResult {
        serde_json::from_value(serde_json::json!({
            "operation_id": id, "success": success, "insights_created": 2
        }))
        .unwrap()
    }
}
