use chrono::NaiveDate;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::rc::Rc;
use tracing::debug;

use super::{
    CreditRecord, IssueRecord, IssueSummary, NamedRef, PublisherRecord, PublisherSummary,
    SeriesRecord, SeriesSummary, ServiceAdapter, ServiceResult,
};
use crate::cache::ResponseCache;
use crate::error::ServiceError;
use crate::schemas::Source;

const API_URL: &str = "https://comicvine.gamespot.com/api";
const PAGE_LIMIT: i64 = 100;

// Comicvine resource ids are namespaced by type.
const PUBLISHER_PREFIX: i64 = 4010;
const VOLUME_PREFIX: i64 = 4050;
const ISSUE_PREFIX: i64 = 4000;

pub struct Comicvine {
    client: reqwest::blocking::Client,
    api_key: String,
    cache: Rc<ResponseCache>,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    error: String,
    status_code: i32,
    #[serde(default)]
    number_of_total_results: i64,
    results: T,
}

#[derive(Debug, Deserialize)]
struct NamedEntry {
    id: i64,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PublisherEntry {
    id: i64,
    name: String,
}

#[derive(Debug, Deserialize)]
struct VolumeEntry {
    id: i64,
    name: String,
    start_year: Option<String>,
    publisher: Option<NamedEntry>,
}

#[derive(Debug, Deserialize)]
struct IssueEntry {
    id: i64,
    issue_number: Option<String>,
    name: Option<String>,
    cover_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IssueDetail {
    id: i64,
    issue_number: Option<String>,
    name: Option<String>,
    deck: Option<String>,
    cover_date: Option<String>,
    store_date: Option<String>,
    #[serde(default)]
    character_credits: Vec<NamedEntry>,
    #[serde(default)]
    team_credits: Vec<NamedEntry>,
    #[serde(default)]
    location_credits: Vec<NamedEntry>,
    #[serde(default)]
    story_arc_credits: Vec<NamedEntry>,
    #[serde(default)]
    person_credits: Vec<PersonEntry>,
}

#[derive(Debug, Deserialize)]
struct PersonEntry {
    id: i64,
    name: String,
    #[serde(default)]
    role: String,
}

fn parse_date(raw: &Option<String>) -> Option<NaiveDate> {
    raw.as_deref()
        .and_then(|value| NaiveDate::parse_from_str(value, "%Y-%m-%d").ok())
}

fn named_refs(entries: &[NamedEntry]) -> Vec<NamedRef> {
    entries
        .iter()
        .filter_map(|entry| {
            entry.name.as_ref().map(|name| NamedRef {
                id: entry.id,
                name: name.clone(),
            })
        })
        .collect()
}

/// Comicvine hands back roles as a lowercase comma-separated string.
fn split_roles(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|role| !role.is_empty())
        .map(|role| {
            let mut chars = role.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

impl Comicvine {
    pub fn new(api_key: String, cache: Rc<ResponseCache>) -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
            api_key,
            cache,
        }
    }

    /// One GET against the API. The cache key and every logged or
    /// reported URL carry `api_key=***` instead of the real key.
    fn fetch<T: DeserializeOwned>(
        &self,
        path: &str,
        mut params: Vec<(String, String)>,
    ) -> ServiceResult<Envelope<T>> {
        params.push(("format".to_string(), "json".to_string()));
        params.push(("api_key".to_string(), self.api_key.clone()));
        let (query, display_query) = super::encode_query(&params, Some("api_key"));
        let url = format!("{API_URL}{path}?{query}");
        let display_url = format!("{API_URL}{path}?{display_query}");

        let body = match self.cache.select(&display_url)? {
            Some(body) => body,
            None => {
                debug!("GET {display_url}");
                let response = self
                    .client
                    .get(&url)
                    .send()
                    .map_err(|source| ServiceError::Transport {
                        url: display_url.clone(),
                        source,
                    })?;
                let status = response.status();
                if status == reqwest::StatusCode::UNAUTHORIZED {
                    return Err(ServiceError::Auth("invalid Comicvine api key".to_string()));
                }
                if !status.is_success() {
                    return Err(ServiceError::Status {
                        url: display_url,
                        status: status.as_u16(),
                    });
                }
                let body = response.text().map_err(|source| ServiceError::Transport {
                    url: display_url.clone(),
                    source,
                })?;
                self.cache.insert(&display_url, &body)?;
                body
            }
        };

        let envelope: Envelope<T> = match serde_json::from_str(&body) {
            Ok(envelope) => envelope,
            Err(err) => {
                self.cache.delete(&display_url)?;
                return Err(ServiceError::Decode {
                    url: display_url,
                    message: err.to_string(),
                });
            }
        };
        if envelope.status_code != 1 {
            self.cache.delete(&display_url)?;
            if envelope.status_code == 100 {
                return Err(ServiceError::Auth(envelope.error));
            }
            return Err(ServiceError::Decode {
                url: display_url,
                message: envelope.error,
            });
        }
        Ok(envelope)
    }

    fn fetch_all<T: DeserializeOwned>(
        &self,
        path: &str,
        params: Vec<(String, String)>,
    ) -> ServiceResult<Vec<T>> {
        let mut out: Vec<T> = Vec::new();
        loop {
            let mut page_params = params.clone();
            page_params.push(("limit".to_string(), PAGE_LIMIT.to_string()));
            page_params.push(("offset".to_string(), out.len().to_string()));
            let envelope: Envelope<Vec<T>> = self.fetch(path, page_params)?;
            let count = envelope.results.len() as i64;
            out.extend(envelope.results);
            if count < PAGE_LIMIT || out.len() as i64 >= envelope.number_of_total_results {
                return Ok(out);
            }
        }
    }
}

impl ServiceAdapter for Comicvine {
    fn source(&self) -> Source {
        Source::Comicvine
    }

    fn search_publishers(&self, name: &str) -> ServiceResult<Vec<PublisherSummary>> {
        let params = vec![("filter".to_string(), format!("name:{name}"))];
        let entries: Vec<PublisherEntry> = self.fetch_all("/publishers/", params)?;
        let needle = name.to_lowercase();
        let mut summaries: Vec<PublisherSummary> = entries
            .into_iter()
            .filter(|entry| entry.name.to_lowercase().contains(&needle))
            .map(|entry| PublisherSummary {
                id: entry.id,
                name: entry.name,
            })
            .collect();
        summaries.sort_by_key(|summary| summary.name.to_lowercase());
        Ok(summaries)
    }

    fn get_publisher(&self, id: i64) -> ServiceResult<PublisherRecord> {
        let envelope: Envelope<PublisherEntry> =
            self.fetch(&format!("/publisher/{PUBLISHER_PREFIX}-{id}/"), Vec::new())?;
        Ok(PublisherRecord {
            id: envelope.results.id,
            name: envelope.results.name,
        })
    }

    fn search_series(&self, publisher_id: i64, name: &str) -> ServiceResult<Vec<SeriesSummary>> {
        let params = vec![("filter".to_string(), format!("name:{name}"))];
        let entries: Vec<VolumeEntry> = self.fetch_all("/volumes/", params)?;
        // The volumes endpoint cannot filter by publisher server-side.
        let mut summaries: Vec<SeriesSummary> = entries
            .into_iter()
            .filter(|entry| {
                entry
                    .publisher
                    .as_ref()
                    .is_some_and(|publisher| publisher.id == publisher_id)
            })
            .map(|entry| SeriesSummary {
                id: entry.id,
                start_year: entry.start_year.as_deref().and_then(|y| y.parse().ok()),
                name: entry.name,
            })
            .collect();
        summaries.sort_by(|a, b| {
            (a.name.to_lowercase(), a.start_year).cmp(&(b.name.to_lowercase(), b.start_year))
        });
        Ok(summaries)
    }

    fn get_series(&self, id: i64) -> ServiceResult<SeriesRecord> {
        let envelope: Envelope<VolumeEntry> =
            self.fetch(&format!("/volume/{VOLUME_PREFIX}-{id}/"), Vec::new())?;
        Ok(SeriesRecord {
            id: envelope.results.id,
            name: envelope.results.name,
            start_year: envelope
                .results
                .start_year
                .as_deref()
                .and_then(|y| y.parse().ok()),
            volume: None,
            genres: Vec::new(),
        })
    }

    fn search_issues(
        &self,
        series_id: i64,
        number: Option<&str>,
    ) -> ServiceResult<Vec<IssueSummary>> {
        let mut filter = format!("volume:{series_id}");
        if let Some(number) = number {
            filter.push_str(&format!(",issue_number:{number}"));
        }
        let params = vec![("filter".to_string(), filter)];
        let entries: Vec<IssueEntry> = self.fetch_all("/issues/", params)?;
        let mut summaries: Vec<IssueSummary> = entries
            .into_iter()
            .map(|entry| IssueSummary {
                id: entry.id,
                number: entry.issue_number,
                name: entry.name,
                cover_date: parse_date(&entry.cover_date),
            })
            .collect();
        summaries.sort_by(|a, b| (a.cover_date, &a.number).cmp(&(b.cover_date, &b.number)));
        Ok(summaries)
    }

    fn get_issue(&self, id: i64) -> ServiceResult<IssueRecord> {
        let envelope: Envelope<IssueDetail> =
            self.fetch(&format!("/issue/{ISSUE_PREFIX}-{id}/"), Vec::new())?;
        let detail = envelope.results;
        Ok(IssueRecord {
            id: detail.id,
            number: detail.issue_number,
            title: detail.name,
            summary: detail.deck,
            cover_date: parse_date(&detail.cover_date),
            store_date: parse_date(&detail.store_date),
            characters: named_refs(&detail.character_credits),
            teams: named_refs(&detail.team_credits),
            locations: named_refs(&detail.location_credits),
            story_arcs: named_refs(&detail.story_arc_credits),
            credits: detail
                .person_credits
                .iter()
                .map(|person| CreditRecord {
                    creator: NamedRef {
                        id: person.id,
                        name: person.name.clone(),
                    },
                    roles: split_roles(&person.role),
                })
                .collect(),
            page_count: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_roles_trims_and_capitalizes() {
        assert_eq!(split_roles("writer, cover"), vec!["Writer", "Cover"]);
        assert_eq!(split_roles(""), Vec::<String>::new());
    }

    #[test]
    fn envelope_decodes_issue_search_payload() {
        let body = r#"{
            "error": "OK",
            "status_code": 1,
            "number_of_total_results": 1,
            "results": [
                {"id": 105, "issue_number": "1", "name": "Out from Boneville", "cover_date": "1991-07-01"}
            ]
        }"#;
        let envelope: Envelope<Vec<IssueEntry>> = serde_json::from_str(body).expect("decode");
        assert_eq!(envelope.status_code, 1);
        let entry = &envelope.results[0];
        assert_eq!(entry.id, 105);
        assert_eq!(
            parse_date(&entry.cover_date),
            NaiveDate::from_ymd_opt(1991, 7, 1)
        );
    }

    #[test]
    fn envelope_tolerates_null_fields() {
        let body = r#"{
            "error": "OK",
            "status_code": 1,
            "number_of_total_results": 1,
            "results": {"id": 105, "issue_number": null, "name": null, "deck": null,
                        "cover_date": null, "store_date": null}
        }"#;
        let envelope: Envelope<IssueDetail> = serde_json::from_str(body).expect("decode");
        assert!(envelope.results.person_credits.is_empty());
    }
}
