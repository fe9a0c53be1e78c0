pub mod comicvine;
pub mod league;
pub mod marvel;
pub mod metron;

use chrono::NaiveDate;
use std::rc::Rc;
use tracing::warn;

use crate::cache::ResponseCache;
use crate::config::Settings;
use crate::error::ServiceError;
use crate::schemas::Source;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Id/name pair as returned inside service responses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedRef {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreditRecord {
    pub creator: NamedRef,
    pub roles: Vec<String>,
}

/// Full publisher entity, fetched by id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublisherRecord {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SeriesRecord {
    pub id: i64,
    pub name: String,
    pub start_year: Option<i32>,
    pub volume: Option<i32>,
    pub genres: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IssueRecord {
    pub id: i64,
    pub number: Option<String>,
    pub title: Option<String>,
    pub summary: Option<String>,
    pub cover_date: Option<NaiveDate>,
    pub store_date: Option<NaiveDate>,
    pub characters: Vec<NamedRef>,
    pub teams: Vec<NamedRef>,
    pub locations: Vec<NamedRef>,
    pub story_arcs: Vec<NamedRef>,
    pub credits: Vec<CreditRecord>,
    pub page_count: u32,
}

/// Search hit shown to the operator when picking a publisher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublisherSummary {
    pub id: i64,
    pub name: String,
}

impl PublisherSummary {
    pub fn label(&self) -> String {
        self.name.clone()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesSummary {
    pub id: i64,
    pub name: String,
    pub start_year: Option<i32>,
}

impl SeriesSummary {
    pub fn label(&self) -> String {
        match self.start_year {
            Some(year) => format!("{} ({year})", self.name),
            None => self.name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueSummary {
    pub id: i64,
    pub number: Option<String>,
    pub name: Option<String>,
    pub cover_date: Option<NaiveDate>,
}

impl IssueSummary {
    pub fn label(&self) -> String {
        let number = self.number.as_deref().unwrap_or("?");
        match (&self.name, self.cover_date) {
            (Some(name), _) => format!("#{number} - {name}"),
            (None, Some(date)) => format!("#{number} ({date})"),
            (None, None) => format!("#{number}"),
        }
    }
}

/// One catalog service. Searches return summaries for menus; gets
/// return full records for merge-back. Every error is soft: the caller
/// treats it as "nothing from this service".
pub trait ServiceAdapter {
    fn source(&self) -> Source;

    fn search_publishers(&self, name: &str) -> ServiceResult<Vec<PublisherSummary>>;
    fn get_publisher(&self, id: i64) -> ServiceResult<PublisherRecord>;

    /// Find this service's publisher via another service's id for it.
    /// Services without such an index return `Ok(None)`.
    fn publisher_by_cross_reference(
        &self,
        other: Source,
        id: i64,
    ) -> ServiceResult<Option<PublisherRecord>> {
        let _ = (other, id);
        Ok(None)
    }

    fn search_series(&self, publisher_id: i64, name: &str) -> ServiceResult<Vec<SeriesSummary>>;
    fn get_series(&self, id: i64) -> ServiceResult<SeriesRecord>;

    fn series_by_cross_reference(
        &self,
        other: Source,
        id: i64,
    ) -> ServiceResult<Option<SeriesRecord>> {
        let _ = (other, id);
        Ok(None)
    }

    fn issue_by_cross_reference(
        &self,
        other: Source,
        id: i64,
    ) -> ServiceResult<Option<IssueRecord>> {
        let _ = (other, id);
        Ok(None)
    }

    fn search_issues(
        &self,
        series_id: i64,
        number: Option<&str>,
    ) -> ServiceResult<Vec<IssueSummary>>;
    fn get_issue(&self, id: i64) -> ServiceResult<IssueRecord>;
}

/// Build adapters in the configured priority order, skipping services
/// whose credentials are missing.
pub fn build_adapters(
    settings: &Settings,
    cache: Rc<ResponseCache>,
) -> Vec<Box<dyn ServiceAdapter>> {
    let mut adapters: Vec<Box<dyn ServiceAdapter>> = Vec::new();
    for source in &settings.service_order {
        match source {
            Source::Comicvine => {
                if settings.comicvine.api_key.is_empty() {
                    warn!("skipping Comicvine: no api key configured");
                    continue;
                }
                adapters.push(Box::new(comicvine::Comicvine::new(
                    settings.comicvine.api_key.clone(),
                    Rc::clone(&cache),
                )));
            }
            Source::Metron => {
                if settings.metron.username.is_empty() || settings.metron.password.is_empty() {
                    warn!("skipping Metron: no credentials configured");
                    continue;
                }
                adapters.push(Box::new(metron::Metron::new(
                    settings.metron.username.clone(),
                    settings.metron.password.clone(),
                    Rc::clone(&cache),
                )));
            }
            Source::Marvel => {
                if settings.marvel.public_key.is_empty() || settings.marvel.private_key.is_empty() {
                    warn!("skipping Marvel: no keys configured");
                    continue;
                }
                adapters.push(Box::new(marvel::Marvel::new()));
            }
            Source::LeagueOfComicGeeks => {
                if settings.league.client_id.is_empty() || settings.league.client_secret.is_empty()
                {
                    warn!("skipping League of Comic Geeks: no client configured");
                    continue;
                }
                adapters.push(Box::new(league::League::new()));
            }
            Source::GrandComicsDatabase => {
                warn!("skipping Grand Comics Database: no API available");
            }
        }
    }
    adapters
}

/// Percent-encode and join query parameters in sorted key order so the
/// same request always produces the same URL. `redact` names a key
/// whose value is replaced in the returned display/cache URL.
pub(crate) fn encode_query(params: &[(String, String)], redact: Option<&str>) -> (String, String) {
    let mut sorted: Vec<&(String, String)> = params.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));
    let mut real = String::new();
    let mut display = String::new();
    for (key, value) in sorted {
        if !real.is_empty() {
            real.push('&');
            display.push('&');
        }
        let encoded = urlencoding::encode(value);
        real.push_str(&format!("{key}={encoded}"));
        if redact == Some(key.as_str()) {
            display.push_str(&format!("{key}=***"));
        } else {
            display.push_str(&format!("{key}={encoded}"));
        }
    }
    (real, display)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_query_sorts_and_redacts() {
        let params = vec![
            ("filter".to_string(), "name:Bone".to_string()),
            ("api_key".to_string(), "secret".to_string()),
            ("format".to_string(), "json".to_string()),
        ];
        let (real, display) = encode_query(&params, Some("api_key"));
        assert_eq!(real, "api_key=secret&filter=name%3ABone&format=json");
        assert_eq!(display, "api_key=***&filter=name%3ABone&format=json");
    }

    #[test]
    fn issue_summary_labels() {
        let summary = IssueSummary {
            id: 1,
            number: Some("1".to_string()),
            name: Some("Out from Boneville".to_string()),
            cover_date: None,
        };
        assert_eq!(summary.label(), "#1 - Out from Boneville");
        let bare = IssueSummary {
            id: 2,
            number: None,
            name: None,
            cover_date: None,
        };
        assert_eq!(bare.label(), "#?");
    }

    #[test]
    fn unconfigured_services_are_skipped() {
        let settings = Settings::default();
        let cache = Rc::new(ResponseCache::in_memory(14).expect("cache"));
        let adapters = build_adapters(&settings, cache);
        assert!(adapters.is_empty());
    }
}
