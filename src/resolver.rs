use anyhow::Result;
use tracing::{debug, warn};

use crate::console::Prompter;
use crate::error::ServiceError;
use crate::schemas::{SchemaSet, Source};
use crate::services::{IssueRecord, IssueSummary, PublisherRecord, SeriesRecord, ServiceAdapter};

/// Walks one archive's metadata through Publisher, then Series, then
/// Issue against a single service, merging each confirmed entity back
/// into every loaded schema. A stored id for the service skips search
/// and menu entirely; otherwise the operator confirms a search hit or
/// types a better name. Declining to continue at any stage gives up on
/// the whole service, since the later entities cannot be anchored.
pub struct Resolver<'a> {
    prompter: &'a mut dyn Prompter,
}

enum Step<T> {
    Confirmed(T),
    GaveUp,
}

impl<'a> Resolver<'a> {
    pub fn new(prompter: &'a mut dyn Prompter) -> Self {
        Self { prompter }
    }

    /// Returns true when publisher, series and issue were all resolved
    /// and merged. Any service error is logged and treated as "nothing
    /// from this service".
    pub fn resolve(&mut self, adapter: &dyn ServiceAdapter, set: &mut SchemaSet) -> Result<bool> {
        let source = adapter.source();
        match self.resolve_inner(adapter, set) {
            Ok(resolved) => Ok(resolved),
            Err(StepError::Service(err)) => {
                warn!("{source}: {err}");
                Ok(false)
            }
            Err(StepError::Prompt(err)) => Err(err),
        }
    }

    fn resolve_inner(
        &mut self,
        adapter: &dyn ServiceAdapter,
        set: &mut SchemaSet,
    ) -> Result<bool, StepError> {
        let source = adapter.source();

        let publisher = match self.resolve_publisher(adapter, set)? {
            Step::Confirmed(publisher) => publisher,
            Step::GaveUp => return Ok(false),
        };
        set.apply_publisher(source, &publisher);

        let series = match self.resolve_series(adapter, set, &publisher)? {
            Step::Confirmed(series) => series,
            Step::GaveUp => return Ok(false),
        };
        set.apply_series(source, &series);

        let issue = match self.resolve_issue(adapter, set, &series)? {
            Step::Confirmed(issue) => issue,
            Step::GaveUp => return Ok(false),
        };
        set.apply_issue(source, &issue);
        Ok(true)
    }

    fn resolve_publisher(
        &mut self,
        adapter: &dyn ServiceAdapter,
        set: &SchemaSet,
    ) -> Result<Step<PublisherRecord>, StepError> {
        let source = adapter.source();
        if let Some(id) = set.publisher_id(source) {
            debug!("{source}: using stored publisher id {id}");
            return Ok(Step::Confirmed(adapter.get_publisher(id)?));
        }
        for (other, id) in set.publisher_cross_ids(source) {
            if let Some(record) = adapter.publisher_by_cross_reference(other, id)? {
                debug!("{source}: publisher found via {other} id {id}");
                return Ok(Step::Confirmed(record));
            }
        }

        let mut name = match set.publisher_hint() {
            Some(hint) if !hint.is_empty() => hint,
            _ => match self.prompter.prompt("Publisher name")? {
                Some(name) => name,
                None => return Ok(Step::GaveUp),
            },
        };
        loop {
            let summaries = dedup_by_id(adapter.search_publishers(&name)?, |s| s.id);
            if !summaries.is_empty() {
                let labels: Vec<String> = summaries.iter().map(|s| s.label()).collect();
                let pick = self
                    .prompter
                    .menu(&format!("Select Publisher [{source}]"), &labels)?;
                if pick > 0 {
                    let record = adapter.get_publisher(summaries[pick - 1].id)?;
                    return Ok(Step::Confirmed(record));
                }
            }
            if !self.prompter.confirm("Try a different name?")? {
                return Ok(Step::GaveUp);
            }
            name = match self.prompter.prompt("Publisher name")? {
                Some(name) => name,
                None => return Ok(Step::GaveUp),
            };
        }
    }

    fn resolve_series(
        &mut self,
        adapter: &dyn ServiceAdapter,
        set: &SchemaSet,
        publisher: &PublisherRecord,
    ) -> Result<Step<SeriesRecord>, StepError> {
        let source = adapter.source();
        if let Some(id) = set.series_id(source) {
            debug!("{source}: using stored series id {id}");
            return Ok(Step::Confirmed(adapter.get_series(id)?));
        }
        for (other, id) in set.series_cross_ids(source) {
            if let Some(record) = adapter.series_by_cross_reference(other, id)? {
                debug!("{source}: series found via {other} id {id}");
                return Ok(Step::Confirmed(record));
            }
        }

        let mut name = match set.series_hint() {
            Some(hint) if !hint.is_empty() => hint,
            _ => match self.prompter.prompt("Series name")? {
                Some(name) => name,
                None => return Ok(Step::GaveUp),
            },
        };
        loop {
            let summaries = dedup_by_id(adapter.search_series(publisher.id, &name)?, |s| s.id);
            if !summaries.is_empty() {
                let labels: Vec<String> = summaries.iter().map(|s| s.label()).collect();
                let pick = self
                    .prompter
                    .menu(&format!("Select Series [{source}]"), &labels)?;
                if pick > 0 {
                    let record = adapter.get_series(summaries[pick - 1].id)?;
                    return Ok(Step::Confirmed(record));
                }
            }
            if !self.prompter.confirm("Try a different name?")? {
                return Ok(Step::GaveUp);
            }
            name = match self.prompter.prompt("Series name")? {
                Some(name) => name,
                None => return Ok(Step::GaveUp),
            };
        }
    }

    fn resolve_issue(
        &mut self,
        adapter: &dyn ServiceAdapter,
        set: &SchemaSet,
        series: &SeriesRecord,
    ) -> Result<Step<IssueRecord>, StepError> {
        let source = adapter.source();
        if let Some(id) = set.issue_id(source) {
            debug!("{source}: using stored issue id {id}");
            return Ok(Step::Confirmed(adapter.get_issue(id)?));
        }
        for (other, id) in set.issue_cross_ids(source) {
            if let Some(record) = adapter.issue_by_cross_reference(other, id)? {
                debug!("{source}: issue found via {other} id {id}");
                return Ok(Step::Confirmed(record));
            }
        }

        let mut number = set.issue_number_hint();
        loop {
            let mut summaries =
                dedup_by_id(adapter.search_issues(series.id, number.as_deref())?, |s| s.id);
            if summaries.is_empty() && number.is_some() {
                // The stored number may use different formatting; fall
                // back to the whole series once before asking.
                debug!("{source}: no issues numbered {:?}, relaxing", number);
                number = None;
                summaries = dedup_by_id(adapter.search_issues(series.id, None)?, |s| s.id);
            }
            if !summaries.is_empty() {
                let labels: Vec<String> = summaries.iter().map(IssueSummary::label).collect();
                let pick = self
                    .prompter
                    .menu(&format!("Select Issue [{source}]"), &labels)?;
                if pick > 0 {
                    return Ok(Step::Confirmed(adapter.get_issue(summaries[pick - 1].id)?));
                }
            }
            if !self.prompter.confirm("Try a different number?")? {
                return Ok(Step::GaveUp);
            }
            number = match self.prompter.prompt("Issue number")? {
                Some(number) => Some(number),
                None => return Ok(Step::GaveUp),
            };
        }
    }
}

/// Keep the first occurrence of each id, preserving order.
fn dedup_by_id<T>(items: Vec<T>, id: impl Fn(&T) -> i64) -> Vec<T> {
    let mut seen = Vec::new();
    let mut out = Vec::new();
    for item in items {
        let key = id(&item);
        if !seen.contains(&key) {
            seen.push(key);
            out.push(item);
        }
    }
    out
}

enum StepError {
    Service(ServiceError),
    Prompt(anyhow::Error),
}

impl From<ServiceError> for StepError {
    fn from(err: ServiceError) -> Self {
        StepError::Service(err)
    }
}

impl From<anyhow::Error> for StepError {
    fn from(err: anyhow::Error) -> Self {
        StepError::Prompt(err)
    }
}
