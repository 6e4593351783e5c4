//! Insight store: the searchable, filterable insight list, the selected
//! insight, and the mutations a reviewer makes (flag, annotate, reject).
//!
//! Mutations touch local state only after the server accepts them.

use recog_client::{ClientError, InsightFilter, ListQuery, Page, RecogApi};
use recog_core::{Insight, RecordId};
use tracing::info;

use crate::StoreError;
use crate::detail::{DetailSlot, DetailTicket};
use crate::paged::{PageTicket, PagedList};

#[derive(Debug)]
pub struct InsightStore {
    list: PagedList<Insight>,
    detail: DetailSlot<Insight>,
}

impl InsightStore {
    pub fn new(page_size: u32) -> Self {
        Self {
            list: PagedList::new(page_size),
            detail: DetailSlot::default(),
        }
    }

    pub fn list(&self) -> &PagedList<Insight> {
        &self.list
    }

    pub fn selected(&self) -> Option<&Insight> {
        self.detail.selected()
    }

    /// Filter of the latest query, including one still in flight.
    pub fn filter(&self) -> InsightFilter {
        self.list.requested().filter
    }

    /// Search text of the latest query, including one still in flight.
    pub fn search(&self) -> Option<&str> {
        self.list.requested().search.as_deref()
    }

    /// The freshest local copy: the open detail, else the list row.
    pub fn get(&self, id: &RecordId) -> Option<&Insight> {
        self.detail
            .selected()
            .filter(|i| &i.id == id)
            .or_else(|| self.list.get(id))
    }

    // ── list ──

    pub fn begin_query(&mut self, search: Option<String>, filter: InsightFilter) -> PageTicket {
        self.list.begin(ListQuery {
            search,
            filter,
            ..Default::default()
        })
    }

    pub fn begin_more(&mut self) -> Option<PageTicket> {
        self.list.begin_more()
    }

    pub fn apply_page(
        &mut self,
        ticket: PageTicket,
        result: Result<Page<Insight>, ClientError>,
    ) -> Result<usize, StoreError> {
        self.list.apply(ticket, result)
    }

    /// Run a fresh query from offset 0.
    pub async fn query(
        &mut self,
        api: &dyn RecogApi,
        search: Option<String>,
        filter: InsightFilter,
    ) -> Result<usize, StoreError> {
        let ticket = self.begin_query(search, filter);
        let result = api.insights(&ticket.query).await;
        self.apply_page(ticket, result)
    }

    /// Re-run the latest query from offset 0.
    pub async fn refresh(&mut self, api: &dyn RecogApi) -> Result<usize, StoreError> {
        let query = self.list.requested().clone();
        self.query(api, query.search, query.filter).await
    }

    /// Append the next page. `Ok(0)` when there is nothing more to load.
    pub async fn load_more(&mut self, api: &dyn RecogApi) -> Result<usize, StoreError> {
        let Some(ticket) = self.begin_more() else {
            return Ok(0);
        };
        let result = api.insights(&ticket.query).await;
        self.apply_page(ticket, result)
    }

    // ── detail ──

    pub fn begin_detail(&mut self, id: RecordId) -> DetailTicket {
        self.detail.begin(id)
    }

    pub fn apply_detail(
        &mut self,
        ticket: DetailTicket,
        result: Result<Insight, ClientError>,
    ) -> Result<&Insight, StoreError> {
        self.detail.apply(ticket, result)
    }

    pub async fn detail(&mut self, api: &dyn RecogApi, id: &RecordId) -> Result<&Insight, StoreError> {
        let ticket = self.begin_detail(id.clone());
        let result = api.insight(id).await;
        self.apply_detail(ticket, result)
    }

    pub fn clear_selection(&mut self) {
        self.detail.clear();
    }

    // ── mutations ──

    /// Flip the flag of a loaded insight. Returns the stored state.
    pub async fn toggle_flag(&mut self, api: &dyn RecogApi, id: &RecordId) -> Result<bool, StoreError> {
        let current = self
            .get(id)
            .map(|i| i.flagged)
            .ok_or_else(|| StoreError::UnknownRecord(id.clone()))?;
        let flagged = api.set_flag(id, !current).await?;
        self.update(id, |i| i.flagged = flagged);
        info!(id = %id, flagged, "insight flag toggled");
        Ok(flagged)
    }

    /// Save reviewer context. Text is trimmed; an empty string clears it.
    pub async fn save_context(
        &mut self,
        api: &dyn RecogApi,
        id: &RecordId,
        text: &str,
    ) -> Result<Option<String>, StoreError> {
        let text = text.trim();
        api.save_context(id, text).await?;
        let context = (!text.is_empty()).then(|| text.to_string());
        self.update(id, |i| i.user_context = context.clone());
        info!(id = %id, cleared = context.is_none(), "insight context saved");
        Ok(context)
    }

    /// `reject = true` drops the insight from the list and the selection.
    /// `reject = false` only updates local copies: under the rejected filter
    /// the insight leaves the list. Re-reading it is left to the caller, so a
    /// failed read never hides that the server accepted the change.
    pub async fn reject(
        &mut self,
        api: &dyn RecogApi,
        id: &RecordId,
        reject: bool,
    ) -> Result<(), StoreError> {
        api.reject(id, reject).await?;
        info!(id = %id, reject, "insight reject state changed");
        let showing_rejected = self.list.query().filter == InsightFilter::Rejected;
        if reject {
            if showing_rejected {
                self.update(id, |i| i.rejected = true);
            } else {
                self.list.remove(id);
            }
            if self.detail.is_selected(id) {
                self.detail.clear();
            }
            return Ok(());
        }

        if showing_rejected {
            self.list.remove(id);
        } else {
            self.update(id, |i| i.rejected = false);
        }
        Ok(())
    }

    fn update(&mut self, id: &RecordId, mut apply: impl FnMut(&mut Insight)) {
        if let Some(insight) = self.list.get_mut(id) {
            apply(insight);
        }
        if let Some(insight) = self.detail.selected_mut(id) {
            apply(insight);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::{FakeApi, insight};

    fn corpus() -> FakeApi {
        let mut insights: Vec<Insight> = (1..=12)
            .map(|i| insight(i, &format!("grief entry {i}")))
            .collect();
        insights.extend((13..=20).map(|i| insight(i, &format!("joy entry {i}"))));
        FakeApi::with_insights(insights)
    }

    #[tokio::test]
    async fn search_then_load_more() {
        let api = corpus();
        let mut store = InsightStore::new(5);
        store
            .query(&api, Some("grief".into()), InsightFilter::All)
            .await
            .unwrap();
        assert_eq!(store.list().len(), 5);
        assert_eq!(store.list().total(), 12);
        assert!(store.list().has_more());

        assert_eq!(store.load_more(&api).await.unwrap(), 5);
        assert_eq!(store.list().len(), 10);
        assert!(store.list().has_more());

        assert_eq!(store.load_more(&api).await.unwrap(), 2);
        assert!(!store.list().has_more());
        assert_eq!(store.load_more(&api).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn overlapping_searches_keep_only_the_latest() {
        let api = corpus();
        let mut store = InsightStore::new(20);
        let first = store.begin_query(Some("entry".into()), InsightFilter::All);
        let second = store.begin_query(Some("joy".into()), InsightFilter::All);

        let second_result = api.insights(&second.query).await;
        let first_result = api.insights(&first.query).await;
        store.apply_page(second, second_result).unwrap();
        assert!(store.apply_page(first, first_result).unwrap_err().is_stale());

        assert_eq!(store.list().len(), 8);
        assert!(store.list().items().iter().all(|i| i.summary.starts_with("joy")));
        assert_eq!(store.search(), Some("joy"));
    }

    #[tokio::test]
    async fn flag_updates_list_and_detail_after_success() {
        let api = corpus();
        let mut store = InsightStore::new(20);
        store.query(&api, None, InsightFilter::All).await.unwrap();
        let id = RecordId::from(3u64);
        store.detail(&api, &id).await.unwrap();

        assert!(store.toggle_flag(&api, &id).await.unwrap());
        assert!(store.list().get(&id).unwrap().flagged);
        assert!(store.selected().unwrap().flagged);
        assert!(api.stored_insight(3).flagged);

        assert!(!store.toggle_flag(&api, &id).await.unwrap());
        assert!(!store.selected().unwrap().flagged);
    }

    #[tokio::test]
    async fn failed_flag_leaves_state_untouched() {
        let api = corpus();
        let mut store = InsightStore::new(20);
        store.query(&api, None, InsightFilter::All).await.unwrap();
        api.go_offline();
        let id = RecordId::from(3u64);
        let err = store.toggle_flag(&api, &id).await.unwrap_err();
        assert!(matches!(err, StoreError::Client(ClientError::Timeout)));
        assert!(!store.list().get(&id).unwrap().flagged);
    }

    #[tokio::test]
    async fn flag_unknown_insight_is_refused() {
        let api = corpus();
        let mut store = InsightStore::new(20);
        let err = store.toggle_flag(&api, &99u64.into()).await.unwrap_err();
        assert!(matches!(err, StoreError::UnknownRecord(_)));
        assert_eq!(api.calls("set_flag"), 0);
    }

    #[tokio::test]
    async fn context_is_trimmed_and_empty_clears() {
        let api = corpus();
        let mut store = InsightStore::new(20);
        let id = RecordId::from(1u64);
        store.detail(&api, &id).await.unwrap();

        let saved = store.save_context(&api, &id, "  after the funeral \n").await.unwrap();
        assert_eq!(saved.as_deref(), Some("after the funeral"));
        assert_eq!(
            store.selected().unwrap().user_context.as_deref(),
            Some("after the funeral")
        );

        assert_eq!(store.save_context(&api, &id, "   ").await.unwrap(), None);
        assert!(store.selected().unwrap().user_context.is_none());
        assert!(api.stored_insight(1).user_context.is_none());
    }

    #[tokio::test]
    async fn reject_removes_exactly_one_record() {
        let api = corpus();
        let mut store = InsightStore::new(20);
        store.query(&api, None, InsightFilter::All).await.unwrap();
        let before = store.list().len();
        let total = store.list().total();
        let id = RecordId::from(4u64);
        store.detail(&api, &id).await.unwrap();

        store.reject(&api, &id, true).await.unwrap();
        assert_eq!(store.list().len(), before - 1);
        assert_eq!(store.list().total(), total - 1);
        assert!(store.list().get(&id).is_none());
        assert!(store.selected().is_none());
    }

    #[tokio::test]
    async fn restore_leaves_reads_to_the_caller() {
        let api = corpus();
        let mut store = InsightStore::new(20);
        store.query(&api, None, InsightFilter::All).await.unwrap();
        let id = RecordId::from(4u64);
        store.reject(&api, &id, true).await.unwrap();
        let reads = api.calls("insight") + api.calls("insights");

        store.reject(&api, &id, false).await.unwrap();
        assert!(!api.stored_insight(4).rejected);
        assert_eq!(api.calls("insight") + api.calls("insights"), reads);
        assert!(store.list().get(&id).is_none());
    }

    #[tokio::test]
    async fn restore_from_rejected_view_leaves_the_list() {
        let api = corpus();
        let mut store = InsightStore::new(20);
        store.reject(&api, &RecordId::from(2u64), true).await.unwrap();
        store.query(&api, None, InsightFilter::Rejected).await.unwrap();
        assert_eq!(store.list().len(), 1);
        let queries = api.calls("insights");

        store.reject(&api, &RecordId::from(2u64), false).await.unwrap();
        assert!(store.list().is_empty());
        assert_eq!(api.calls("insights"), queries);
    }
}
