//! The request surface the stores depend on.
//!
//! [`RecogClient`](crate::RecogClient) implements it over HTTP; tests swap in
//! an in-memory fake.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use recog_core::{
    Insight, Operation, Pattern, ProcessResult, Progression, RecordId, Report, StatusSnapshot,
    UnknownVariant,
};

use crate::ClientError;

/// Server-side insight list filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum InsightFilter {
    #[default]
    All,
    Flagged,
    Reviewed,
    Unreviewed,
    Rejected,
}

impl InsightFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Flagged => "flagged",
            Self::Reviewed => "reviewed",
            Self::Unreviewed => "unreviewed",
            Self::Rejected => "rejected",
        }
    }

    /// Query-string flags for `GET /recog/insights`.
    pub fn query_pairs(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            Self::All => &[],
            Self::Flagged => &[("flagged", "true")],
            Self::Reviewed => &[("reviewed", "true")],
            Self::Unreviewed => &[("reviewed", "false")],
            Self::Rejected => &[("rejected", "true")],
        }
    }
}

impl fmt::Display for InsightFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InsightFilter {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" | "" => Ok(Self::All),
            "flagged" => Ok(Self::Flagged),
            "reviewed" => Ok(Self::Reviewed),
            "unreviewed" => Ok(Self::Unreviewed),
            "rejected" => Ok(Self::Rejected),
            _ => Err(UnknownVariant::new("insight filter", s)),
        }
    }
}

/// One page request against a list endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub search: Option<String>,
    pub filter: InsightFilter,
    pub offset: u32,
    pub limit: u32,
}

impl ListQuery {
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("limit".to_string(), self.limit.to_string()),
            ("offset".to_string(), self.offset.to_string()),
        ];
        if let Some(search) = self.search.as_deref().map(str::trim)
            && !search.is_empty()
        {
            pairs.push(("search".to_string(), search.to_string()));
        }
        for (k, v) in self.filter.query_pairs() {
            pairs.push((k.to_string(), v.to_string()));
        }
        pairs
    }
}

/// A window of records plus the server's total, when it reports one.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: Option<u64>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: Option<u64>) -> Self {
        Self { items, total }
    }
}

#[async_trait]
pub trait RecogApi: Send + Sync {
    async fn status(&self) -> Result<StatusSnapshot, ClientError>;

    /// Ask the server to scan for new work. Returns the number queued.
    async fn check(&self) -> Result<u32, ClientError>;

    async fn pending(&self) -> Result<Vec<Operation>, ClientError>;

    async fn confirm(&self, id: &RecordId) -> Result<(), ClientError>;

    async fn cancel(&self, id: &RecordId) -> Result<(), ClientError>;

    /// Process every `ready` operation as one batch.
    async fn process(&self) -> Result<Vec<ProcessResult>, ClientError>;

    async fn insights(&self, query: &ListQuery) -> Result<Page<Insight>, ClientError>;

    async fn insight(&self, id: &RecordId) -> Result<Insight, ClientError>;

    /// Returns the flag state the server stored.
    async fn set_flag(&self, id: &RecordId, flagged: bool) -> Result<bool, ClientError>;

    async fn save_context(&self, id: &RecordId, text: &str) -> Result<(), ClientError>;

    async fn reject(&self, id: &RecordId, reject: bool) -> Result<(), ClientError>;

    async fn patterns(&self, limit: u32) -> Result<Page<Pattern>, ClientError>;

    async fn pattern(&self, id: &RecordId) -> Result<Pattern, ClientError>;

    async fn reports(&self) -> Result<Page<Report>, ClientError>;

    async fn report(&self, id: &RecordId) -> Result<Report, ClientError>;

    async fn progression(&self) -> Result<Progression, ClientError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_pairs_skip_blank_search() {
        let q = ListQuery {
            search: Some("   ".into()),
            filter: InsightFilter::All,
            offset: 0,
            limit: 20,
        };
        let pairs = q.query_pairs();
        assert_eq!(pairs.len(), 2);
        assert!(pairs.iter().all(|(k, _)| k != "search"));
    }

    #[test]
    fn query_pairs_carry_filter_flags() {
        let q = ListQuery {
            search: Some(" grief ".into()),
            filter: InsightFilter::Unreviewed,
            offset: 5,
            limit: 20,
        };
        let pairs = q.query_pairs();
        assert!(pairs.contains(&("search".to_string(), "grief".to_string())));
        assert!(pairs.contains(&("offset".to_string(), "5".to_string())));
        assert!(pairs.contains(&("reviewed".to_string(), "false".to_string())));
    }

    #[test]
    fn filter_round_trips_through_str() {
        for f in [
            InsightFilter::All,
            InsightFilter::Flagged,
            InsightFilter::Reviewed,
            InsightFilter::Unreviewed,
            InsightFilter::Rejected,
        ] {
            assert_eq!(f.as_str().parse::<InsightFilter>().unwrap(), f);
        }
        assert!("starred".parse::<InsightFilter>().is_err());
    }
}
