use super::{
    IssueRecord, IssueSummary, PublisherRecord, PublisherSummary, SeriesRecord, SeriesSummary,
    ServiceAdapter, ServiceResult,
};
use crate::error::ServiceError;
use crate::schemas::Source;

/// Placeholder adapter, same contract as the Marvel one.
pub struct League;

impl League {
    pub fn new() -> Self {
        Self
    }
}

impl ServiceAdapter for League {
    fn source(&self) -> Source {
        Source::LeagueOfComicGeeks
    }

    fn search_publishers(&self, _name: &str) -> ServiceResult<Vec<PublisherSummary>> {
        Err(ServiceError::Unsupported("League of Comic Geeks"))
    }

    fn get_publisher(&self, _id: i64) -> ServiceResult<PublisherRecord> {
        Err(ServiceError::Unsupported("League of Comic Geeks"))
    }

    fn search_series(&self, _publisher_id: i64, _name: &str) -> ServiceResult<Vec<SeriesSummary>> {
        Err(ServiceError::Unsupported("League of Comic Geeks"))
    }

    fn get_series(&self, _id: i64) -> ServiceResult<SeriesRecord> {
        Err(ServiceError::Unsupported("League of Comic Geeks"))
    }

    fn search_issues(
        &self,
        _series_id: i64,
        _number: Option<&str>,
    ) -> ServiceResult<Vec<IssueSummary>> {
        Err(ServiceError::Unsupported("League of Comic Geeks"))
    }

    fn get_issue(&self, _id: i64) -> ServiceResult<IssueRecord> {
        Err(ServiceError::Unsupported("League of Comic Geeks"))
    }
}
