//! Client-held state for the ReCog forge: the operation queue, the insight,
//! pattern and report stores, and the [`Workbench`] that binds them to
//! navigation and user-visible notices.
//!
//! Stores never own the API. Async methods borrow a `&dyn RecogApi` for the
//! duration of one call; the split `begin_*` / `apply_*` methods let a binder
//! run the request on its own task.

mod debounce;
mod detail;
mod error;
mod insights;
mod paged;
mod patterns;
mod queue;
mod reports;
mod seq;
mod workbench;

#[cfg(test)]
mod fake;

pub use debounce::{DEFAULT_DEBOUNCE, Debouncer};
pub use detail::{DetailSlot, DetailTicket};
pub use error::StoreError;
pub use insights::InsightStore;
pub use paged::{PageTicket, PagedList};
pub use patterns::PatternStore;
pub use queue::{ListTicket, OperationQueue, ProcessSummary, ProcessTicket};
pub use reports::ReportStore;
pub use seq::SequenceGuard;
pub use workbench::{ActiveDetail, Notice, NoticeLevel, Workbench, WorkbenchConfig};
