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

const API_URL: &str = "https://metron.cloud/api";

pub struct Metron {
    client: reqwest::blocking::Client,
    username: String,
    password: String,
    cache: Rc<ResponseCache>,
}

#[derive(Debug, Deserialize)]
struct ResultPage<T> {
    next: Option<String>,
    results: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct NamedEntry {
    id: i64,
    name: String,
}

#[derive(Debug, Deserialize)]
struct SeriesEntry {
    id: i64,
    series: String,
    year_began: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct SeriesDetail {
    id: i64,
    name: String,
    volume: Option<i32>,
    year_began: Option<i32>,
    #[serde(default)]
    genres: Vec<NamedEntry>,
}

#[derive(Debug, Deserialize)]
struct IssueEntry {
    id: i64,
    number: Option<String>,
    issue: Option<String>,
    cover_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IssueDetail {
    id: i64,
    number: Option<String>,
    #[serde(default)]
    name: Vec<String>,
    desc: Option<String>,
    cover_date: Option<String>,
    store_date: Option<String>,
    page: Option<u32>,
    #[serde(default)]
    characters: Vec<NamedEntry>,
    #[serde(default)]
    teams: Vec<NamedEntry>,
    #[serde(default)]
    arcs: Vec<NamedEntry>,
    #[serde(default)]
    credits: Vec<CreditEntry>,
}

#[derive(Debug, Deserialize)]
struct CreditEntry {
    id: i64,
    creator: String,
    #[serde(default)]
    role: Vec<NamedEntry>,
}

fn parse_date(raw: &Option<String>) -> Option<NaiveDate> {
    raw.as_deref()
        .and_then(|value| NaiveDate::parse_from_str(value, "%Y-%m-%d").ok())
}

fn named_refs(entries: &[NamedEntry]) -> Vec<NamedRef> {
    entries
        .iter()
        .map(|entry| NamedRef {
            id: entry.id,
            name: entry.name.clone(),
        })
        .collect()
}

impl Metron {
    pub fn new(username: String, password: String, cache: Rc<ResponseCache>) -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
            username,
            password,
            cache,
        }
    }

    fn fetch<T: DeserializeOwned>(
        &self,
        path: &str,
        params: Vec<(String, String)>,
    ) -> ServiceResult<T> {
        let url = if params.is_empty() {
            format!("{API_URL}{path}")
        } else {
            let (query, _) = super::encode_query(&params, None);
            format!("{API_URL}{path}?{query}")
        };

        let body = match self.cache.select(&url)? {
            Some(body) => body,
            None => {
                debug!("GET {url}");
                let response = self
                    .client
                    .get(&url)
                    .basic_auth(&self.username, Some(&self.password))
                    .send()
                    .map_err(|source| ServiceError::Transport {
                        url: url.clone(),
                        source,
                    })?;
                let status = response.status();
                if status == reqwest::StatusCode::UNAUTHORIZED
                    || status == reqwest::StatusCode::FORBIDDEN
                {
                    return Err(ServiceError::Auth("invalid Metron credentials".to_string()));
                }
                if !status.is_success() {
                    return Err(ServiceError::Status {
                        url,
                        status: status.as_u16(),
                    });
                }
                let body = response.text().map_err(|source| ServiceError::Transport {
                    url: url.clone(),
                    source,
                })?;
                self.cache.insert(&url, &body)?;
                body
            }
        };

        match serde_json::from_str(&body) {
            Ok(value) => Ok(value),
            Err(err) => {
                self.cache.delete(&url)?;
                Err(ServiceError::Decode {
                    url,
                    message: err.to_string(),
                })
            }
        }
    }

    fn fetch_all<T: DeserializeOwned>(
        &self,
        path: &str,
        params: Vec<(String, String)>,
    ) -> ServiceResult<Vec<T>> {
        let mut out = Vec::new();
        let mut page = 1_u32;
        loop {
            let mut page_params = params.clone();
            if page > 1 {
                page_params.push(("page".to_string(), page.to_string()));
            }
            let result: ResultPage<T> = self.fetch(path, page_params)?;
            let has_next = result.next.is_some();
            out.extend(result.results);
            if !has_next {
                return Ok(out);
            }
            page += 1;
        }
    }
}

impl ServiceAdapter for Metron {
    fn source(&self) -> Source {
        Source::Metron
    }

    fn search_publishers(&self, name: &str) -> ServiceResult<Vec<PublisherSummary>> {
        let params = vec![("name".to_string(), name.to_string())];
        let entries: Vec<NamedEntry> = self.fetch_all("/publisher/", params)?;
        let mut summaries: Vec<PublisherSummary> = entries
            .into_iter()
            .map(|entry| PublisherSummary {
                id: entry.id,
                name: entry.name,
            })
            .collect();
        summaries.sort_by_key(|summary| summary.name.to_lowercase());
        Ok(summaries)
    }

    fn get_publisher(&self, id: i64) -> ServiceResult<PublisherRecord> {
        let entry: NamedEntry = self.fetch(&format!("/publisher/{id}/"), Vec::new())?;
        Ok(PublisherRecord {
            id: entry.id,
            name: entry.name,
        })
    }

    /// Metron indexes its publishers by their Comicvine id, which lets
    /// a Comicvine-tagged archive resolve here without a search.
    fn publisher_by_cross_reference(
        &self,
        other: Source,
        id: i64,
    ) -> ServiceResult<Option<PublisherRecord>> {
        if other != Source::Comicvine {
            return Ok(None);
        }
        let params = vec![("cv_id".to_string(), id.to_string())];
        let entries: Vec<NamedEntry> = self.fetch_all("/publisher/", params)?;
        Ok(entries.into_iter().next().map(|entry| PublisherRecord {
            id: entry.id,
            name: entry.name,
        }))
    }

    fn search_series(&self, publisher_id: i64, name: &str) -> ServiceResult<Vec<SeriesSummary>> {
        let params = vec![
            ("name".to_string(), name.to_string()),
            ("publisher_id".to_string(), publisher_id.to_string()),
        ];
        let entries: Vec<SeriesEntry> = self.fetch_all("/series/", params)?;
        let mut summaries: Vec<SeriesSummary> = entries
            .into_iter()
            .map(|entry| SeriesSummary {
                id: entry.id,
                name: entry.series,
                start_year: entry.year_began,
            })
            .collect();
        summaries.sort_by(|a, b| {
            (a.name.to_lowercase(), a.start_year).cmp(&(b.name.to_lowercase(), b.start_year))
        });
        Ok(summaries)
    }

    /// Series carry a cv_id index as well. More than one hit means the
    /// mapping is ambiguous, so fall back to a search.
    fn series_by_cross_reference(
        &self,
        other: Source,
        id: i64,
    ) -> ServiceResult<Option<SeriesRecord>> {
        if other != Source::Comicvine {
            return Ok(None);
        }
        let params = vec![("cv_id".to_string(), id.to_string())];
        let entries: Vec<SeriesEntry> = self.fetch_all("/series/", params)?;
        match entries.as_slice() {
            [entry] => Ok(Some(self.get_series(entry.id)?)),
            _ => Ok(None),
        }
    }

    fn issue_by_cross_reference(
        &self,
        other: Source,
        id: i64,
    ) -> ServiceResult<Option<IssueRecord>> {
        if other != Source::Comicvine {
            return Ok(None);
        }
        let params = vec![("cv_id".to_string(), id.to_string())];
        let entries: Vec<IssueEntry> = self.fetch_all("/issue/", params)?;
        match entries.as_slice() {
            [entry] => Ok(Some(self.get_issue(entry.id)?)),
            _ => Ok(None),
        }
    }

    fn get_series(&self, id: i64) -> ServiceResult<SeriesRecord> {
        let detail: SeriesDetail = self.fetch(&format!("/series/{id}/"), Vec::new())?;
        Ok(SeriesRecord {
            id: detail.id,
            name: detail.name,
            start_year: detail.year_began,
            volume: detail.volume,
            genres: detail.genres.into_iter().map(|genre| genre.name).collect(),
        })
    }

    fn search_issues(
        &self,
        series_id: i64,
        number: Option<&str>,
    ) -> ServiceResult<Vec<IssueSummary>> {
        let mut params = vec![("series_id".to_string(), series_id.to_string())];
        if let Some(number) = number {
            params.push(("number".to_string(), number.to_string()));
        }
        let entries: Vec<IssueEntry> = self.fetch_all("/issue/", params)?;
        let mut summaries: Vec<IssueSummary> = entries
            .into_iter()
            .map(|entry| IssueSummary {
                id: entry.id,
                number: entry.number,
                name: entry.issue,
                cover_date: parse_date(&entry.cover_date),
            })
            .collect();
        summaries.sort_by(|a, b| (a.cover_date, &a.number).cmp(&(b.cover_date, &b.number)));
        Ok(summaries)
    }

    fn get_issue(&self, id: i64) -> ServiceResult<IssueRecord> {
        let detail: IssueDetail = self.fetch(&format!("/issue/{id}/"), Vec::new())?;
        Ok(IssueRecord {
            id: detail.id,
            number: detail.number,
            title: detail.name.first().cloned(),
            summary: detail.desc,
            cover_date: parse_date(&detail.cover_date),
            store_date: parse_date(&detail.store_date),
            characters: named_refs(&detail.characters),
            teams: named_refs(&detail.teams),
            locations: Vec::new(),
            story_arcs: named_refs(&detail.arcs),
            credits: detail
                .credits
                .iter()
                .map(|credit| CreditRecord {
                    creator: NamedRef {
                        id: credit.id,
                        name: credit.creator.clone(),
                    },
                    roles: credit.role.iter().map(|role| role.name.clone()).collect(),
                })
                .collect(),
            page_count: detail.page.unwrap_or(0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_detail_decodes_metron_payload() {
        let body = r#"{
            "id": 9999,
            "number": "1",
            "name": ["Out from Boneville"],
            "desc": "The Bone cousins are run out of Boneville.",
            "cover_date": "1991-07-01",
            "store_date": null,
            "page": 28,
            "characters": [{"id": 1, "name": "Fone Bone"}],
            "teams": [],
            "arcs": [],
            "credits": [
                {"id": 2, "creator": "Jeff Smith", "role": [{"id": 1, "name": "Writer"}]}
            ]
        }"#;
        let detail: IssueDetail = serde_json::from_str(body).expect("decode");
        assert_eq!(detail.id, 9999);
        assert_eq!(detail.name.first().map(String::as_str), Some("Out from Boneville"));
        assert_eq!(detail.page, Some(28));
        assert_eq!(detail.credits[0].role[0].name, "Writer");
    }

    #[test]
    fn series_list_uses_display_names() {
        let body = r#"{
            "count": 1,
            "next": null,
            "previous": null,
            "results": [{"id": 42, "series": "Bone (1991)", "year_began": 1991}]
        }"#;
        let page: ResultPage<SeriesEntry> = serde_json::from_str(body).expect("decode");
        assert!(page.next.is_none());
        assert_eq!(page.results[0].series, "Bone (1991)");
    }
}
