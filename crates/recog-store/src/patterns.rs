//! Pattern store. The pattern list is limited, never offset-paged.

use recog_client::{ClientError, ListQuery, Page, RecogApi};
use recog_core::{Pattern, RecordId};

use crate::StoreError;
use crate::detail::{DetailSlot, DetailTicket};
use crate::paged::{PageTicket, PagedList};

#[derive(Debug)]
pub struct PatternStore {
    list: PagedList<Pattern>,
    detail: DetailSlot<Pattern>,
}

impl PatternStore {
    pub fn new(limit: u32) -> Self {
        Self {
            list: PagedList::new(limit),
            detail: DetailSlot::default(),
        }
    }

    pub fn list(&self) -> &PagedList<Pattern> {
        &self.list
    }

    pub fn selected(&self) -> Option<&Pattern> {
        self.detail.selected()
    }

    /// `None` keeps the current limit.
    pub fn begin_list(&mut self, limit: Option<u32>) -> PageTicket {
        self.list.begin(ListQuery {
            limit: limit.unwrap_or(0),
            ..Default::default()
        })
    }

    pub fn apply_list(
        &mut self,
        ticket: PageTicket,
        result: Result<Page<Pattern>, ClientError>,
    ) -> Result<usize, StoreError> {
        self.list.apply(ticket, result)
    }

    pub async fn query(&mut self, api: &dyn RecogApi, limit: Option<u32>) -> Result<usize, StoreError> {
        let ticket = self.begin_list(limit);
        let result = api.patterns(ticket.query.limit).await;
        self.apply_list(ticket, result)
    }

    pub fn begin_detail(&mut self, id: RecordId) -> DetailTicket {
        self.detail.begin(id)
    }

    pub fn apply_detail(
        &mut self,
        ticket: DetailTicket,
        result: Result<Pattern, ClientError>,
    ) -> Result<&Pattern, StoreError> {
        self.detail.apply(ticket, result)
    }

    pub async fn detail(&mut self, api: &dyn RecogApi, id: &RecordId) -> Result<&Pattern, StoreError> {
        let ticket = self.begin_detail(id.clone());
        let result = api.pattern(id).await;
        self.apply_detail(ticket, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::{FakeApi, pattern};

    #[tokio::test]
    async fn limit_caps_list_and_total_falls_back_to_count() {
        let api = FakeApi::default();
        api.set_patterns((1..=8).map(|i| pattern(i, &[i])).collect());
        let mut store = PatternStore::new(20);

        store.query(&api, Some(3)).await.unwrap();
        assert_eq!(store.list().len(), 3);
        assert_eq!(store.list().total(), 3);
        assert!(!store.list().has_more());

        store.query(&api, None).await.unwrap();
        assert_eq!(store.list().len(), 3);
    }

    #[tokio::test]
    async fn detail_replaces_previous_pattern() {
        let api = FakeApi::default();
        api.set_patterns(vec![pattern(1, &[10]), pattern(2, &[11, 12])]);
        let mut store = PatternStore::new(20);

        store.detail(&api, &1u64.into()).await.unwrap();
        let shown = store.detail(&api, &2u64.into()).await.unwrap();
        assert_eq!(shown.insights.len(), 2);
        assert_eq!(store.selected().unwrap().id.as_str(), "2");
    }
}
