//! Report store. Reports are immutable snapshots; the list is unpaginated.

use recog_client::{ClientError, ListQuery, Page, RecogApi};
use recog_core::{RecordId, Report};

use crate::StoreError;
use crate::detail::{DetailSlot, DetailTicket};
use crate::paged::{PageTicket, PagedList};

#[derive(Debug)]
pub struct ReportStore {
    list: PagedList<Report>,
    detail: DetailSlot<Report>,
}

impl Default for ReportStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportStore {
    pub fn new() -> Self {
        Self {
            list: PagedList::new(0),
            detail: DetailSlot::default(),
        }
    }

    pub fn list(&self) -> &PagedList<Report> {
        &self.list
    }

    pub fn selected(&self) -> Option<&Report> {
        self.detail.selected()
    }

    pub fn begin_list(&mut self) -> PageTicket {
        self.list.begin(ListQuery::default())
    }

    pub fn apply_list(
        &mut self,
        ticket: PageTicket,
        result: Result<Page<Report>, ClientError>,
    ) -> Result<usize, StoreError> {
        self.list.apply(ticket, result)
    }

    pub async fn query(&mut self, api: &dyn RecogApi) -> Result<usize, StoreError> {
        let ticket = self.begin_list();
        let result = api.reports().await;
        self.apply_list(ticket, result)
    }

    pub fn begin_detail(&mut self, id: RecordId) -> DetailTicket {
        self.detail.begin(id)
    }

    pub fn apply_detail(
        &mut self,
        ticket: DetailTicket,
        result: Result<Report, ClientError>,
    ) -> Result<&Report, StoreError> {
        self.detail.apply(ticket, result)
    }

    pub async fn detail(&mut self, api: &dyn RecogApi, id: &RecordId) -> Result<&Report, StoreError> {
        let ticket = self.begin_detail(id.clone());
        let result = api.report(id).await;
        self.apply_detail(ticket, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::{FakeApi, report};

    #[tokio::test]
    async fn lists_every_report_and_opens_details() {
        let api = FakeApi::default();
        api.set_reports(vec![report(1, &[5], &[17, 18]), report(2, &[], &[])]);
        let mut store = ReportStore::new();

        assert_eq!(store.query(&api).await.unwrap(), 2);
        assert_eq!(store.list().total(), 2);
        assert!(!store.list().has_more());

        let shown = store.detail(&api, &1u64.into()).await.unwrap();
        assert_eq!(shown.patterns.len(), 1);
        assert_eq!(shown.insights.len(), 2);
    }

    #[tokio::test]
    async fn missing_report_keeps_previous_detail() {
        let api = FakeApi::default();
        api.set_reports(vec![report(1, &[], &[])]);
        let mut store = ReportStore::new();
        store.detail(&api, &1u64.into()).await.unwrap();
        let err = store.detail(&api, &9u64.into()).await.unwrap_err();
        assert!(matches!(err, StoreError::Client(ClientError::Application(_))));
        assert_eq!(store.selected().unwrap().id.as_str(), "1");
    }
}
