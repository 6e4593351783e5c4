//! The selected full record of one kind.

use recog_client::ClientError;
use recog_core::{Record, RecordId};
use tracing::debug;

use crate::StoreError;
use crate::seq::SequenceGuard;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailTicket {
    seq: u64,
    pub id: RecordId,
}

#[derive(Debug)]
pub struct DetailSlot<T> {
    selected: Option<T>,
    guard: SequenceGuard,
}

impl<T> Default for DetailSlot<T> {
    fn default() -> Self {
        Self {
            selected: None,
            guard: SequenceGuard::default(),
        }
    }
}

impl<T: Record> DetailSlot<T> {
    pub fn selected(&self) -> Option<&T> {
        self.selected.as_ref()
    }

    pub fn selected_mut(&mut self, id: &RecordId) -> Option<&mut T> {
        self.selected.as_mut().filter(|r| r.id() == id)
    }

    pub fn is_selected(&self, id: &RecordId) -> bool {
        self.selected.as_ref().is_some_and(|r| r.id() == id)
    }

    pub fn begin(&mut self, id: RecordId) -> DetailTicket {
        DetailTicket {
            seq: self.guard.issue(),
            id,
        }
    }

    /// A newer detail replaces the previous one; older responses are stale.
    pub fn apply(
        &mut self,
        ticket: DetailTicket,
        result: Result<T, ClientError>,
    ) -> Result<&T, StoreError> {
        if let Err(e) = self.guard.check(ticket.seq) {
            debug!(id = %ticket.id, "discarding stale detail");
            return Err(e);
        }
        let record = result?;
        Ok(self.selected.insert(record))
    }

    /// Clear the selection; any in-flight detail is invalidated.
    pub fn clear(&mut self) {
        self.selected = None;
        self.guard.issue();
    }
}
