use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::services::{IssueRecord, PublisherRecord, SeriesRecord};

/// Catalog services an issue can be attributed to. Serialized names
/// match the sidecar schema values exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Source {
    Comicvine,
    #[serde(rename = "Grand Comics Database")]
    GrandComicsDatabase,
    #[serde(rename = "League of Comic Geeks")]
    LeagueOfComicGeeks,
    Marvel,
    Metron,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Source::Comicvine => "Comicvine",
            Source::GrandComicsDatabase => "Grand Comics Database",
            Source::LeagueOfComicGeeks => "League of Comic Geeks",
            Source::Marvel => "Marvel",
            Source::Metron => "Metron",
        };
        f.write_str(label)
    }
}

/// One external id, tagged with the service it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    #[serde(rename = "@source")]
    pub source: Source,
    #[serde(rename = "$text")]
    pub value: i64,
}

/// Ordered set of external ids, at most one per service. Merging never
/// drops an id a schema already carried.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceList {
    #[serde(rename = "Resource", default)]
    pub entries: Vec<Resource>,
}

impl ResourceList {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, source: Source) -> Option<i64> {
        self.entries
            .iter()
            .find(|entry| entry.source == source)
            .map(|entry| entry.value)
    }

    /// Insert or replace the id for one service, keeping entries sorted
    /// by service name.
    pub fn set(&mut self, source: Source, value: i64) {
        match self.entries.iter_mut().find(|entry| entry.source == source) {
            Some(entry) => entry.value = value,
            None => {
                self.entries.push(Resource { source, value });
                self.entries.sort_by_key(|entry| entry.source);
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Resource> {
        self.entries.iter()
    }
}

/// A named thing (publisher, character, team, ...) plus the external
/// ids it is known by.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitledResource {
    #[serde(rename = "Resources", default, skip_serializing_if = "ResourceList::is_empty")]
    pub resources: ResourceList,
    #[serde(rename = "Title")]
    pub title: String,
}

impl TitledResource {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            resources: ResourceList::default(),
            title: title.into(),
        }
    }

    pub fn tagged(title: impl Into<String>, source: Source, id: i64) -> Self {
        let mut resource = Self::new(title);
        resource.resources.set(source, id);
        resource
    }

    fn sort_key(&self) -> String {
        self.title.to_lowercase()
    }
}

/// Named lists of TitledResource children. Each alias fixes the XML
/// element names; behaviour is shared.
macro_rules! titled_list {
    ($list:ident, $child:literal) => {
        #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
        pub struct $list {
            #[serde(rename = $child, default)]
            pub entries: Vec<TitledResource>,
        }

        impl $list {
            pub fn is_empty(&self) -> bool {
                self.entries.is_empty()
            }

            pub fn titles(&self) -> Vec<String> {
                self.entries.iter().map(|e| e.title.clone()).collect()
            }

            /// Replace contents, keeping ids already known for entries
            /// that survive under the same title.
            pub fn replace_merging(&mut self, incoming: Vec<TitledResource>) {
                let mut merged = incoming;
                for entry in &mut merged {
                    if let Some(existing) = self
                        .entries
                        .iter()
                        .find(|e| e.title.eq_ignore_ascii_case(&entry.title))
                    {
                        for resource in existing.resources.iter() {
                            if entry.resources.get(resource.source).is_none() {
                                entry.resources.set(resource.source, resource.value);
                            }
                        }
                    }
                }
                merged.sort_by_key(TitledResource::sort_key);
                merged.dedup_by(|a, b| a.title.eq_ignore_ascii_case(&b.title));
                self.entries = merged;
            }
        }
    };
}

titled_list!(CharacterList, "Character");
titled_list!(TeamList, "Team");
titled_list!(LocationList, "Location");
titled_list!(GenreList, "Genre");
titled_list!(RoleList, "Role");

/// A story arc with its position within the arc, when known.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryArc {
    #[serde(rename = "Resources", default, skip_serializing_if = "ResourceList::is_empty")]
    pub resources: ResourceList,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Number", skip_serializing_if = "Option::is_none")]
    pub number: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryArcList {
    #[serde(rename = "StoryArc", default)]
    pub entries: Vec<StoryArc>,
}

impl StoryArcList {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn titles(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.title.clone()).collect()
    }
}

/// A creator and the roles they held on the issue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credit {
    #[serde(rename = "Creator")]
    pub creator: TitledResource,
    #[serde(rename = "Roles", default, skip_serializing_if = "RoleList::is_empty")]
    pub roles: RoleList,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditList {
    #[serde(rename = "Credit", default)]
    pub entries: Vec<Credit>,
}

impl CreditList {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Creator name to sorted role names, for the flat schema's
    /// per-role columns.
    pub fn by_creator(&self) -> BTreeMap<String, Vec<String>> {
        let mut map = BTreeMap::new();
        for credit in &self.entries {
            let roles: &mut Vec<String> = map.entry(credit.creator.title.clone()).or_default();
            for role in &credit.roles.entries {
                if !roles.iter().any(|r| r.eq_ignore_ascii_case(&role.title)) {
                    roles.push(role.title.clone());
                }
            }
        }
        for roles in map.values_mut() {
            roles.sort_by_key(|r| r.to_lowercase());
        }
        map
    }
}

/// Publication format. Unrecognised values fall back to single issue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Format {
    Annual,
    #[serde(rename = "Digital Chapter")]
    DigitalChapter,
    #[serde(rename = "Graphic Novel")]
    GraphicNovel,
    Hardcover,
    Omnibus,
    #[default]
    #[serde(rename = "Single Issue")]
    SingleIssue,
    #[serde(rename = "Trade Paperback")]
    TradePaperback,
}

impl Format {
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "annual" => Format::Annual,
            "digital chapter" | "digital chapters" => Format::DigitalChapter,
            "graphic novel" => Format::GraphicNovel,
            "hardcover" | "hard cover" => Format::Hardcover,
            "omnibus" => Format::Omnibus,
            "trade paperback" | "trade paper back" => Format::TradePaperback,
            _ => Format::SingleIssue,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Format::Annual => "Annual",
            Format::DigitalChapter => "Digital Chapter",
            Format::GraphicNovel => "Graphic Novel",
            Format::Hardcover => "Hardcover",
            Format::Omnibus => "Omnibus",
            Format::SingleIssue => "Single Issue",
            Format::TradePaperback => "Trade Paperback",
        }
    }

    /// Filename suffix used when filing the issue, if the format gets
    /// one.
    pub fn filename_suffix(self) -> Option<&'static str> {
        match self {
            Format::Annual => Some("_Annual"),
            Format::DigitalChapter => Some("_Chapter"),
            Format::GraphicNovel => Some("_GN"),
            Format::Hardcover => Some("_HC"),
            Format::TradePaperback => Some("_TP"),
            Format::Omnibus | Format::SingleIssue => None,
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Series {
    #[serde(rename = "Genres", default, skip_serializing_if = "GenreList::is_empty")]
    pub genres: GenreList,
    #[serde(rename = "Publisher")]
    pub publisher: TitledResource,
    #[serde(rename = "Resources", default, skip_serializing_if = "ResourceList::is_empty")]
    pub resources: ResourceList,
    #[serde(rename = "StartYear", skip_serializing_if = "Option::is_none")]
    pub start_year: Option<i32>,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Volume", default = "default_volume")]
    pub volume: i32,
}

fn default_volume() -> i32 {
    1
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    #[serde(rename = "Characters", default, skip_serializing_if = "CharacterList::is_empty")]
    pub characters: CharacterList,
    #[serde(rename = "CoverDate", skip_serializing_if = "Option::is_none")]
    pub cover_date: Option<NaiveDate>,
    #[serde(rename = "Credits", default, skip_serializing_if = "CreditList::is_empty")]
    pub credits: CreditList,
    #[serde(rename = "Format", default)]
    pub format: Format,
    #[serde(rename = "Language", default = "default_language")]
    pub language: String,
    #[serde(rename = "Locations", default, skip_serializing_if = "LocationList::is_empty")]
    pub locations: LocationList,
    #[serde(rename = "Number", skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    #[serde(rename = "PageCount", default)]
    pub page_count: u32,
    #[serde(rename = "Resources", default, skip_serializing_if = "ResourceList::is_empty")]
    pub resources: ResourceList,
    #[serde(rename = "Series")]
    pub series: Series,
    #[serde(rename = "StoreDate", skip_serializing_if = "Option::is_none")]
    pub store_date: Option<NaiveDate>,
    #[serde(rename = "StoryArcs", default, skip_serializing_if = "StoryArcList::is_empty")]
    pub story_arcs: StoryArcList,
    #[serde(rename = "Summary", skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(rename = "Teams", default, skip_serializing_if = "TeamList::is_empty")]
    pub teams: TeamList,
    #[serde(rename = "Title", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

fn default_language() -> String {
    "en".to_string()
}

impl Default for Issue {
    fn default() -> Self {
        Self {
            characters: CharacterList::default(),
            cover_date: None,
            credits: CreditList::default(),
            format: Format::default(),
            language: default_language(),
            locations: LocationList::default(),
            number: None,
            page_count: 0,
            resources: ResourceList::default(),
            series: Series::default(),
            store_date: None,
            story_arcs: StoryArcList::default(),
            summary: None,
            teams: TeamList::default(),
            title: None,
        }
    }
}

/// Which tool stamped the metadata and when. Drives the freshness skip:
/// only entries this tool wrote recently are trusted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tool {
    #[serde(rename = "@version", default)]
    pub version: String,
    #[serde(rename = "$text")]
    pub value: String,
}

pub const TOOL_NAME: &str = "Longbox";

impl Default for Tool {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            value: TOOL_NAME.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meta {
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Tool", default)]
    pub tool: Tool,
}

impl Meta {
    pub fn stamped_today(tool: &str) -> Self {
        Self {
            date: Utc::now().date_naive(),
            tool: Tool {
                version: if tool == TOOL_NAME {
                    env!("CARGO_PKG_VERSION").to_string()
                } else {
                    String::new()
                },
                value: tool.to_string(),
            },
        }
    }
}

impl Default for Meta {
    fn default() -> Self {
        Self::stamped_today(TOOL_NAME)
    }
}

/// One page image inside the archive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    #[serde(rename = "@doublePage", default, skip_serializing_if = "std::ops::Not::not")]
    pub double_page: bool,
    #[serde(rename = "@filename")]
    pub filename: String,
    #[serde(rename = "@index")]
    pub index: u32,
    #[serde(rename = "@size", default)]
    pub size: u64,
    #[serde(rename = "@type", default)]
    pub kind: PageKind,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageKind {
    Advertisement,
    #[serde(rename = "Back Cover")]
    BackCover,
    Editorial,
    #[serde(rename = "Front Cover")]
    FrontCover,
    Letters,
    Other,
    Preview,
    Roundup,
    #[default]
    Story,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageList {
    #[serde(rename = "Page", default)]
    pub entries: Vec<Page>,
}

impl PageList {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn default_schema_instance() -> String {
    "http://www.w3.org/2001/XMLSchema-instance".to_string()
}

fn default_schema_location() -> String {
    "https://raw.githubusercontent.com/Buried-In-Code/Schemas/main/schemas/v1.0/Metadata.xsd"
        .to_string()
}

/// The canonical schema. Doubles as the `Metadata.xml` sidecar and as
/// the hub every other sidecar converts through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename = "Metadata")]
pub struct Metadata {
    #[serde(rename = "@xmlns:xsi", default = "default_schema_instance")]
    pub schema_instance: String,
    #[serde(rename = "@xsi:noNamespaceSchemaLocation", default = "default_schema_location")]
    pub schema_location: String,
    #[serde(rename = "Issue")]
    pub issue: Issue,
    #[serde(rename = "Meta", default)]
    pub meta: Meta,
    #[serde(rename = "Notes", skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(rename = "Pages", default, skip_serializing_if = "PageList::is_empty")]
    pub pages: PageList,
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            schema_instance: default_schema_instance(),
            schema_location: default_schema_location(),
            issue: Issue::default(),
            meta: Meta::default(),
            notes: None,
            pages: PageList::default(),
        }
    }
}

pub const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>";

impl Metadata {
    pub const FILENAME: &'static str = "Metadata.xml";

    pub fn from_xml(raw: &str) -> Result<Self> {
        quick_xml::de::from_str(raw).context("failed to parse Metadata.xml")
    }

    pub fn to_xml(&self) -> Result<String> {
        let mut out = String::from(XML_DECLARATION);
        out.push('\n');
        let mut serializer = quick_xml::se::Serializer::new(&mut out);
        serializer.indent(' ', 2);
        self.serialize(serializer)
            .context("failed to serialize Metadata.xml")?;
        out.push('\n');
        Ok(out)
    }

    /// True when this tool wrote the stamp and it is younger than the
    /// given window.
    pub fn is_fresh(&self, today: NaiveDate, max_age_days: i64) -> bool {
        self.meta.tool.value == TOOL_NAME
            && (today - self.meta.date).num_days() <= max_age_days
    }

    pub fn stamp(&mut self) {
        self.meta = Meta::stamped_today(TOOL_NAME);
    }

    pub fn to_comic_info(&self) -> crate::schemas::ComicInfo {
        crate::schemas::ComicInfo::from_canonical(self)
    }

    pub fn to_metron_info(&self) -> Option<crate::schemas::MetronInfo> {
        crate::schemas::MetronInfo::from_canonical(self)
    }

    pub fn apply_publisher(&mut self, source: Source, record: &PublisherRecord) {
        let publisher = &mut self.issue.series.publisher;
        publisher.resources.set(source, record.id);
        publisher.title = record.name.clone();
    }

    pub fn apply_series(&mut self, source: Source, record: &SeriesRecord) {
        let series = &mut self.issue.series;
        series.resources.set(source, record.id);
        series.title = record.name.clone();
        if let Some(year) = record.start_year {
            series.start_year = Some(year);
        }
        if let Some(volume) = record.volume {
            series.volume = volume;
        }
        if !record.genres.is_empty() {
            let incoming = record
                .genres
                .iter()
                .map(|g| TitledResource::new(g.clone()))
                .collect();
            series.genres.replace_merging(incoming);
        }
    }

    pub fn apply_issue(&mut self, source: Source, record: &IssueRecord) {
        let issue = &mut self.issue;
        issue.resources.set(source, record.id);
        if record.number.is_some() {
            issue.number = record.number.clone();
        }
        if record.title.is_some() {
            issue.title = record.title.clone();
        }
        if record.summary.is_some() {
            issue.summary = record.summary.clone();
        }
        if record.cover_date.is_some() {
            issue.cover_date = record.cover_date;
        }
        if record.store_date.is_some() {
            issue.store_date = record.store_date;
        }
        let tag = |named: &crate::services::NamedRef| {
            TitledResource::tagged(named.name.clone(), source, named.id)
        };
        if !record.characters.is_empty() {
            issue
                .characters
                .replace_merging(record.characters.iter().map(tag).collect());
        }
        if !record.teams.is_empty() {
            issue
                .teams
                .replace_merging(record.teams.iter().map(tag).collect());
        }
        if !record.locations.is_empty() {
            issue
                .locations
                .replace_merging(record.locations.iter().map(tag).collect());
        }
        if !record.story_arcs.is_empty() {
            let mut arcs: Vec<StoryArc> = record
                .story_arcs
                .iter()
                .map(|named| {
                    let mut arc = StoryArc {
                        resources: ResourceList::default(),
                        title: named.name.clone(),
                        number: None,
                    };
                    arc.resources.set(source, named.id);
                    if let Some(existing) = issue
                        .story_arcs
                        .entries
                        .iter()
                        .find(|a| a.title.eq_ignore_ascii_case(&named.name))
                    {
                        arc.number = existing.number;
                        for resource in existing.resources.iter() {
                            if arc.resources.get(resource.source).is_none() {
                                arc.resources.set(resource.source, resource.value);
                            }
                        }
                    }
                    arc
                })
                .collect();
            arcs.sort_by_key(|a| a.title.to_lowercase());
            issue.story_arcs.entries = arcs;
        }
        if !record.credits.is_empty() {
            let mut credits: Vec<Credit> = record
                .credits
                .iter()
                .map(|credit| {
                    let mut entry = Credit {
                        creator: TitledResource::tagged(
                            credit.creator.name.clone(),
                            source,
                            credit.creator.id,
                        ),
                        roles: RoleList::default(),
                    };
                    let mut roles: Vec<TitledResource> = credit
                        .roles
                        .iter()
                        .map(|r| TitledResource::new(r.clone()))
                        .collect();
                    roles.sort_by_key(TitledResource::sort_key);
                    roles.dedup_by(|a, b| a.title.eq_ignore_ascii_case(&b.title));
                    if let Some(existing) = issue
                        .credits
                        .entries
                        .iter()
                        .find(|c| c.creator.title.eq_ignore_ascii_case(&credit.creator.name))
                    {
                        for resource in existing.creator.resources.iter() {
                            if entry.creator.resources.get(resource.source).is_none() {
                                entry
                                    .creator
                                    .resources
                                    .set(resource.source, resource.value);
                            }
                        }
                    }
                    entry.roles.entries = roles;
                    entry
                })
                .collect();
            credits.sort_by_key(|c| c.creator.title.to_lowercase());
            issue.credits.entries = credits;
        }
        if record.page_count > 0 {
            issue.page_count = record.page_count;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{CreditRecord, NamedRef};

    fn bone_metadata() -> Metadata {
        let mut metadata = Metadata::default();
        metadata.issue.series.publisher = TitledResource::new("Cartoon Books");
        metadata.issue.series.title = "Bone".to_string();
        metadata.issue.series.start_year = Some(1991);
        metadata.issue.number = Some("1".to_string());
        metadata
    }

    #[test]
    fn resource_list_keeps_one_id_per_service() {
        let mut list = ResourceList::default();
        list.set(Source::Comicvine, 123);
        list.set(Source::Metron, 456);
        list.set(Source::Comicvine, 789);
        assert_eq!(list.entries.len(), 2);
        assert_eq!(list.get(Source::Comicvine), Some(789));
        assert_eq!(list.get(Source::Metron), Some(456));
    }

    #[test]
    fn apply_issue_unions_cross_references() {
        let mut metadata = bone_metadata();
        metadata.issue.resources.set(Source::Comicvine, 105);
        let record = IssueRecord {
            id: 9999,
            number: Some("1".to_string()),
            title: None,
            summary: Some("Out from Boneville".to_string()),
            cover_date: NaiveDate::from_ymd_opt(1991, 7, 1),
            store_date: None,
            characters: vec![NamedRef { id: 1, name: "Fone Bone".to_string() }],
            teams: Vec::new(),
            locations: Vec::new(),
            story_arcs: Vec::new(),
            credits: vec![CreditRecord {
                creator: NamedRef { id: 2, name: "Jeff Smith".to_string() },
                roles: vec!["Writer".to_string(), "Artist".to_string()],
            }],
            page_count: 28,
        };
        metadata.apply_issue(Source::Metron, &record);
        // Resolving against Metron must not lose the Comicvine id.
        assert_eq!(metadata.issue.resources.get(Source::Comicvine), Some(105));
        assert_eq!(metadata.issue.resources.get(Source::Metron), Some(9999));
        assert_eq!(metadata.issue.summary.as_deref(), Some("Out from Boneville"));
        assert_eq!(metadata.issue.page_count, 28);
        let credit = &metadata.issue.credits.entries[0];
        assert_eq!(credit.creator.title, "Jeff Smith");
        assert_eq!(credit.roles.entries.len(), 2);
    }

    #[test]
    fn replace_merging_preserves_known_ids() {
        let mut list = CharacterList::default();
        list.entries
            .push(TitledResource::tagged("Fone Bone", Source::Comicvine, 11));
        list.replace_merging(vec![
            TitledResource::tagged("Thorn", Source::Metron, 22),
            TitledResource::tagged("Fone Bone", Source::Metron, 33),
        ]);
        let fone = list
            .entries
            .iter()
            .find(|e| e.title == "Fone Bone")
            .expect("kept");
        assert_eq!(fone.resources.get(Source::Comicvine), Some(11));
        assert_eq!(fone.resources.get(Source::Metron), Some(33));
        assert_eq!(list.entries[0].title, "Fone Bone");
    }

    #[test]
    fn xml_round_trip_preserves_content() {
        let mut metadata = bone_metadata();
        metadata.issue.cover_date = NaiveDate::from_ymd_opt(1991, 7, 1);
        metadata.issue.resources.set(Source::Comicvine, 105);
        let xml = metadata.to_xml().expect("serialize");
        assert!(xml.starts_with(XML_DECLARATION));
        assert!(xml.contains("<Resource source=\"Comicvine\">105</Resource>"));
        let parsed = Metadata::from_xml(&xml).expect("parse");
        assert_eq!(parsed, metadata);
    }

    #[test]
    fn freshness_requires_our_stamp() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 1).expect("date");
        let mut metadata = bone_metadata();
        metadata.meta.date = today - chrono::Duration::days(10);
        assert!(metadata.is_fresh(today, 28));

        metadata.meta.date = today - chrono::Duration::days(40);
        assert!(!metadata.is_fresh(today, 28));

        metadata.meta = Meta::stamped_today("ComicInfo");
        metadata.meta.date = today;
        assert!(!metadata.is_fresh(today, 28));
    }

    #[test]
    fn format_labels_round_trip() {
        for format in [
            Format::Annual,
            Format::DigitalChapter,
            Format::GraphicNovel,
            Format::Hardcover,
            Format::Omnibus,
            Format::SingleIssue,
            Format::TradePaperback,
        ] {
            assert_eq!(Format::from_label(format.label()), format);
        }
        assert_eq!(Format::from_label("Comic"), Format::SingleIssue);
    }
}
