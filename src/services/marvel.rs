use super::{
    IssueRecord, IssueSummary, PublisherRecord, PublisherSummary, SeriesRecord, SeriesSummary,
    ServiceAdapter, ServiceResult,
};
use crate::error::ServiceError;
use crate::schemas::Source;

/// Placeholder adapter. Credentials are accepted in the config so ids
/// already stored in sidecars survive, but lookups always report the
/// service as unsupported and resolution moves on.
pub struct Marvel;

impl Marvel {
    pub fn new() -> Self {
        Self
    }
}

impl ServiceAdapter for Marvel {
    fn source(&self) -> Source {
        Source::Marvel
    }

    fn search_publishers(&self, _name: &str) -> ServiceResult<Vec<PublisherSummary>> {
        Err(ServiceError::Unsupported("Marvel"))
    }

    fn get_publisher(&self, _id: i64) -> ServiceResult<PublisherRecord> {
        Err(ServiceError::Unsupported("Marvel"))
    }

    fn search_series(&self, _publisher_id: i64, _name: &str) -> ServiceResult<Vec<SeriesSummary>> {
        Err(ServiceError::Unsupported("Marvel"))
    }

    fn get_series(&self, _id: i64) -> ServiceResult<SeriesRecord> {
        Err(ServiceError::Unsupported("Marvel"))
    }

    fn search_issues(
        &self,
        _series_id: i64,
        _number: Option<&str>,
    ) -> ServiceResult<Vec<IssueSummary>> {
        Err(ServiceError::Unsupported("Marvel"))
    }

    fn get_issue(&self, _id: i64) -> ServiceResult<IssueRecord> {
        Err(ServiceError::Unsupported("Marvel"))
    }
}
