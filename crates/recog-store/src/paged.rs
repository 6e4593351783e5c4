//! A server-ordered window of records with search/filter/offset paging.
//!
//! Requests are split in two: [`PagedList::begin`] / [`PagedList::begin_more`]
//! allocate a sequence number and hand back a [`PageTicket`] carrying the
//! query to send; [`PagedList::apply`] takes the ticket back with the
//! response. Only the latest ticket applies; anything older comes back as
//! [`StoreError::Stale`] and leaves the window untouched.

use recog_client::{ClientError, ListQuery, Page};
use recog_core::{Record, RecordId};
use tracing::debug;

use crate::StoreError;
use crate::seq::SequenceGuard;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageTicket {
    seq: u64,
    pub query: ListQuery,
    /// Replace the window (`true`) or append to it.
    pub reset: bool,
}

impl PageTicket {
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

#[derive(Debug)]
pub struct PagedList<T> {
    items: Vec<T>,
    total: u64,
    query: ListQuery,
    requested: ListQuery,
    guard: SequenceGuard,
    loading: bool,
}

impl<T: Record> PagedList<T> {
    pub fn new(limit: u32) -> Self {
        let query = ListQuery {
            limit,
            ..Default::default()
        };
        Self {
            items: Vec::new(),
            total: 0,
            requested: query.clone(),
            query,
            guard: SequenceGuard::default(),
            loading: false,
        }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    /// The query behind the window currently shown.
    pub fn query(&self) -> &ListQuery {
        &self.query
    }

    /// The latest query issued with [`PagedList::begin`], applied or not.
    /// New queries build on this so a response still in flight is not undone.
    pub fn requested(&self) -> &ListQuery {
        &self.requested
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Load-more is offered iff fewer records are loaded than the server has.
    pub fn has_more(&self) -> bool {
        (self.items.len() as u64) < self.total
    }

    pub fn get(&self, id: &RecordId) -> Option<&T> {
        self.items.iter().find(|r| r.id() == id)
    }

    pub fn get_mut(&mut self, id: &RecordId) -> Option<&mut T> {
        self.items.iter_mut().find(|r| r.id() == id)
    }

    /// Issue a fresh query from offset 0.
    pub fn begin(&mut self, mut query: ListQuery) -> PageTicket {
        query.offset = 0;
        if query.limit == 0 {
            query.limit = self.query.limit;
        }
        self.requested = query.clone();
        self.issue(query, true)
    }

    /// Issue the next page of the current query. `None` when everything is
    /// loaded or another request is still outstanding.
    pub fn begin_more(&mut self) -> Option<PageTicket> {
        if self.loading || !self.has_more() {
            return None;
        }
        let mut query = self.query.clone();
        query.offset = self.items.len() as u32;
        Some(self.issue(query, false))
    }

    fn issue(&mut self, query: ListQuery, reset: bool) -> PageTicket {
        self.loading = true;
        PageTicket {
            seq: self.guard.issue(),
            query,
            reset,
        }
    }

    /// Apply a response. Returns the number of records received.
    ///
    /// A failed read keeps the last good window.
    pub fn apply(
        &mut self,
        ticket: PageTicket,
        result: Result<Page<T>, ClientError>,
    ) -> Result<usize, StoreError> {
        if let Err(e) = self.guard.check(ticket.seq) {
            debug!(seq = ticket.seq, latest = self.guard.latest(), "discarding stale page");
            return Err(e);
        }
        self.loading = false;
        let page = result?;
        let received = page.items.len();
        if ticket.reset {
            self.items = page.items;
        } else {
            self.items.extend(page.items);
        }
        self.total = page.total.unwrap_or(self.items.len() as u64);
        self.query = ticket.query;
        Ok(received)
    }

    /// Drop a record from the window, keeping `total` in step.
    pub fn remove(&mut self, id: &RecordId) -> Option<T> {
        let pos = self.items.iter().position(|r| r.id() == id)?;
        self.total = self.total.saturating_sub(1);
        Some(self.items.remove(pos))
    }
}
