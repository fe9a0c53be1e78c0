use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::schemas::canonical::{
    Credit, Format, Meta, Metadata, RoleList, Source, TitledResource, XML_DECLARATION,
};
use crate::services::{IssueRecord, PublisherRecord, SeriesRecord};

/// Services this schema can name in its single id slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InformationSource {
    #[serde(rename = "Comic Vine")]
    ComicVine,
    #[serde(rename = "Grand Comics Database")]
    GrandComicsDatabase,
    #[serde(rename = "League of Comic Geeks")]
    LeagueOfComicGeeks,
    Marvel,
    Metron,
}

impl From<InformationSource> for Source {
    fn from(value: InformationSource) -> Self {
        match value {
            InformationSource::ComicVine => Source::Comicvine,
            InformationSource::GrandComicsDatabase => Source::GrandComicsDatabase,
            InformationSource::LeagueOfComicGeeks => Source::LeagueOfComicGeeks,
            InformationSource::Marvel => Source::Marvel,
            InformationSource::Metron => Source::Metron,
        }
    }
}

impl From<Source> for InformationSource {
    fn from(value: Source) -> Self {
        match value {
            Source::Comicvine => InformationSource::ComicVine,
            Source::GrandComicsDatabase => InformationSource::GrandComicsDatabase,
            Source::LeagueOfComicGeeks => InformationSource::LeagueOfComicGeeks,
            Source::Marvel => InformationSource::Marvel,
            Source::Metron => InformationSource::Metron,
        }
    }
}

/// The issue id under the service named by `source`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceId {
    #[serde(rename = "@source")]
    pub source: InformationSource,
    #[serde(rename = "$text")]
    pub value: i64,
}

/// A named element that may carry this service's own numeric id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetronResource {
    #[serde(rename = "@id", skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(rename = "$text")]
    pub value: String,
}

impl MetronResource {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            id: None,
            value: value.into(),
        }
    }

    pub fn with_id(id: i64, value: impl Into<String>) -> Self {
        Self {
            id: Some(id),
            value: value.into(),
        }
    }
}

macro_rules! metron_resource_list {
    ($list:ident, $child:literal) => {
        #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
        pub struct $list {
            #[serde(rename = $child, default)]
            pub entries: Vec<MetronResource>,
        }

        impl $list {
            pub fn is_empty(&self) -> bool {
                self.entries.is_empty()
            }
        }
    };
}

metron_resource_list!(CharacterList, "Character");
metron_resource_list!(TeamList, "Team");
metron_resource_list!(LocationList, "Location");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Genre {
    Adult,
    Crime,
    Espionage,
    Fantasy,
    Historical,
    Horror,
    Humor,
    Manga,
    Parody,
    Romance,
    #[serde(rename = "Science Fiction")]
    ScienceFiction,
    Sport,
    #[serde(rename = "Super-Hero")]
    SuperHero,
    War,
    Western,
}

impl Genre {
    /// Free-text genres that do not fit the closed vocabulary are
    /// dropped from this schema.
    pub fn from_label(label: &str) -> Option<Self> {
        let genre = match label.trim().to_lowercase().as_str() {
            "adult" => Genre::Adult,
            "crime" => Genre::Crime,
            "espionage" => Genre::Espionage,
            "fantasy" => Genre::Fantasy,
            "historical" => Genre::Historical,
            "horror" => Genre::Horror,
            "humor" | "humour" => Genre::Humor,
            "manga" => Genre::Manga,
            "parody" => Genre::Parody,
            "romance" => Genre::Romance,
            "science fiction" | "sci-fi" => Genre::ScienceFiction,
            "sport" | "sports" => Genre::Sport,
            "super-hero" | "superhero" | "super hero" => Genre::SuperHero,
            "war" => Genre::War,
            "western" => Genre::Western,
            _ => return None,
        };
        Some(genre)
    }

    pub fn label(self) -> &'static str {
        match self {
            Genre::Adult => "Adult",
            Genre::Crime => "Crime",
            Genre::Espionage => "Espionage",
            Genre::Fantasy => "Fantasy",
            Genre::Historical => "Historical",
            Genre::Horror => "Horror",
            Genre::Humor => "Humor",
            Genre::Manga => "Manga",
            Genre::Parody => "Parody",
            Genre::Romance => "Romance",
            Genre::ScienceFiction => "Science Fiction",
            Genre::Sport => "Sport",
            Genre::SuperHero => "Super-Hero",
            Genre::War => "War",
            Genre::Western => "Western",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenreResource {
    #[serde(rename = "@id", skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(rename = "$text")]
    pub value: Genre,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenreList {
    #[serde(rename = "Genre", default)]
    pub entries: Vec<GenreResource>,
}

impl GenreList {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Writer,
    Script,
    Story,
    Plot,
    Artist,
    Penciller,
    Breakdowns,
    Inker,
    Colorist,
    Letterer,
    Cover,
    Editor,
    Translator,
    Designer,
    Other,
}

impl Role {
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "writer" => Role::Writer,
            "script" => Role::Script,
            "story" => Role::Story,
            "plot" => Role::Plot,
            "artist" => Role::Artist,
            "penciller" | "penciler" => Role::Penciller,
            "breakdowns" => Role::Breakdowns,
            "inker" => Role::Inker,
            "colorist" | "colourist" => Role::Colorist,
            "letterer" => Role::Letterer,
            "cover" | "cover artist" => Role::Cover,
            "editor" => Role::Editor,
            "translator" => Role::Translator,
            "designer" => Role::Designer,
            _ => Role::Other,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Role::Writer => "Writer",
            Role::Script => "Script",
            Role::Story => "Story",
            Role::Plot => "Plot",
            Role::Artist => "Artist",
            Role::Penciller => "Penciller",
            Role::Breakdowns => "Breakdowns",
            Role::Inker => "Inker",
            Role::Colorist => "Colorist",
            Role::Letterer => "Letterer",
            Role::Cover => "Cover",
            Role::Editor => "Editor",
            Role::Translator => "Translator",
            Role::Designer => "Designer",
            Role::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleResource {
    #[serde(rename = "@id", skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(rename = "$text")]
    pub value: Role,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleResourceList {
    #[serde(rename = "Role", default)]
    pub entries: Vec<RoleResource>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetronCredit {
    #[serde(rename = "Creator")]
    pub creator: MetronResource,
    #[serde(rename = "Roles", default)]
    pub roles: RoleResourceList,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditList {
    #[serde(rename = "Credit", default)]
    pub entries: Vec<MetronCredit>,
}

impl CreditList {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Arc {
    #[serde(rename = "@id", skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Number", skip_serializing_if = "Option::is_none")]
    pub number: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArcList {
    #[serde(rename = "Arc", default)]
    pub entries: Vec<Arc>,
}

impl ArcList {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetronFormat {
    Annual,
    #[serde(rename = "Digital Chapter")]
    DigitalChapter,
    #[serde(rename = "Graphic Novel")]
    GraphicNovel,
    Hardcover,
    #[serde(rename = "Limited Series")]
    LimitedSeries,
    Omnibus,
    #[serde(rename = "One-Shot")]
    OneShot,
    #[default]
    #[serde(rename = "Single Issue")]
    SingleIssue,
    #[serde(rename = "Trade Paperback")]
    TradePaperback,
}

impl MetronFormat {
    fn to_canonical(self) -> Format {
        match self {
            MetronFormat::Annual => Format::Annual,
            MetronFormat::DigitalChapter => Format::DigitalChapter,
            MetronFormat::GraphicNovel => Format::GraphicNovel,
            MetronFormat::Hardcover => Format::Hardcover,
            MetronFormat::Omnibus => Format::Omnibus,
            MetronFormat::TradePaperback => Format::TradePaperback,
            MetronFormat::LimitedSeries | MetronFormat::OneShot | MetronFormat::SingleIssue => {
                Format::SingleIssue
            }
        }
    }

    fn from_canonical(format: Format) -> Self {
        match format {
            Format::Annual => MetronFormat::Annual,
            Format::DigitalChapter => MetronFormat::DigitalChapter,
            Format::GraphicNovel => MetronFormat::GraphicNovel,
            Format::Hardcover => MetronFormat::Hardcover,
            Format::Omnibus => MetronFormat::Omnibus,
            Format::SingleIssue => MetronFormat::SingleIssue,
            Format::TradePaperback => MetronFormat::TradePaperback,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetronSeries {
    #[serde(rename = "@id", skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(rename = "@lang", skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Volume", skip_serializing_if = "Option::is_none")]
    pub volume: Option<i32>,
    #[serde(rename = "Format", skip_serializing_if = "Option::is_none")]
    pub format: Option<MetronFormat>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetronAgeRating {
    #[default]
    Unknown,
    Everyone,
    Teen,
    #[serde(rename = "Teen Plus")]
    TeenPlus,
    Mature,
    Explicit,
    Adult,
}

impl MetronAgeRating {
    fn is_unknown(&self) -> bool {
        *self == MetronAgeRating::Unknown
    }
}

/// The sidecar with a single id slot: every element can carry the
/// owning service's id, and `id` names which service that is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename = "MetronInfo")]
pub struct MetronInfo {
    #[serde(rename = "ID", skip_serializing_if = "Option::is_none")]
    pub id: Option<SourceId>,
    #[serde(rename = "Publisher")]
    pub publisher: MetronResource,
    #[serde(rename = "Series")]
    pub series: MetronSeries,
    #[serde(rename = "CollectionTitle", skip_serializing_if = "Option::is_none")]
    pub collection_title: Option<String>,
    #[serde(rename = "Number", skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    #[serde(rename = "Summary", skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(rename = "Notes", skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(rename = "CoverDate")]
    pub cover_date: NaiveDate,
    #[serde(rename = "StoreDate", skip_serializing_if = "Option::is_none")]
    pub store_date: Option<NaiveDate>,
    #[serde(rename = "PageCount", default)]
    pub page_count: u32,
    #[serde(rename = "Genres", default, skip_serializing_if = "GenreList::is_empty")]
    pub genres: GenreList,
    #[serde(rename = "AgeRating", default, skip_serializing_if = "MetronAgeRating::is_unknown")]
    pub age_rating: MetronAgeRating,
    #[serde(rename = "Characters", default, skip_serializing_if = "CharacterList::is_empty")]
    pub characters: CharacterList,
    #[serde(rename = "Teams", default, skip_serializing_if = "TeamList::is_empty")]
    pub teams: TeamList,
    #[serde(rename = "Locations", default, skip_serializing_if = "LocationList::is_empty")]
    pub locations: LocationList,
    #[serde(rename = "Arcs", default, skip_serializing_if = "ArcList::is_empty")]
    pub arcs: ArcList,
    #[serde(rename = "Credits", default, skip_serializing_if = "CreditList::is_empty")]
    pub credits: CreditList,
    #[serde(rename = "URL", skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl MetronInfo {
    pub const FILENAME: &'static str = "MetronInfo.xml";

    pub fn from_xml(raw: &str) -> Result<Self> {
        quick_xml::de::from_str(raw).context("failed to parse MetronInfo.xml")
    }

    pub fn to_xml(&self) -> Result<String> {
        let mut out = String::from(XML_DECLARATION);
        out.push('\n');
        let mut serializer = quick_xml::se::Serializer::new(&mut out);
        serializer.indent(' ', 2);
        self.serialize(serializer)
            .context("failed to serialize MetronInfo.xml")?;
        out.push('\n');
        Ok(out)
    }

    /// The service the id slot is bound to, when set.
    pub fn information_source(&self) -> Option<Source> {
        self.id.map(|id| Source::from(id.source))
    }

    fn slot_matches(&self, source: Source) -> bool {
        match self.information_source() {
            Some(bound) => bound == source,
            None => true,
        }
    }

    pub fn to_canonical(&self) -> Metadata {
        let mut metadata = Metadata::default();
        metadata.meta = Meta::stamped_today("MetronInfo");
        let source = self.information_source();

        let tag = |id: Option<i64>, name: &str| -> TitledResource {
            match (source, id) {
                (Some(source), Some(id)) => TitledResource::tagged(name, source, id),
                _ => TitledResource::new(name),
            }
        };

        metadata.issue.series.publisher = tag(self.publisher.id, &self.publisher.value);
        metadata.issue.series.title = self.series.name.clone();
        if let (Some(source), Some(id)) = (source, self.series.id) {
            metadata.issue.series.resources.set(source, id);
        }
        if let Some(volume) = self.series.volume {
            metadata.issue.series.volume = volume;
        }
        if let Some(lang) = &self.series.lang {
            metadata.issue.language = lang.clone();
        }
        if let Some(format) = self.series.format {
            metadata.issue.format = format.to_canonical();
        }
        metadata.issue.series.genres.replace_merging(
            self.genres
                .entries
                .iter()
                .map(|genre| tag(genre.id, genre.value.label()))
                .collect(),
        );
        if let (Some(source), Some(id)) = (source, self.id.map(|id| id.value)) {
            metadata.issue.resources.set(source, id);
        }
        metadata.issue.number = self.number.clone();
        metadata.issue.title = self.collection_title.clone();
        metadata.issue.summary = self.summary.clone();
        metadata.notes = self.notes.clone();
        metadata.issue.cover_date = Some(self.cover_date);
        metadata.issue.store_date = self.store_date;
        metadata.issue.page_count = self.page_count;
        metadata.issue.characters.replace_merging(
            self.characters
                .entries
                .iter()
                .map(|c| tag(c.id, &c.value))
                .collect(),
        );
        metadata.issue.teams.replace_merging(
            self.teams.entries.iter().map(|t| tag(t.id, &t.value)).collect(),
        );
        metadata.issue.locations.replace_merging(
            self.locations
                .entries
                .iter()
                .map(|l| tag(l.id, &l.value))
                .collect(),
        );
        for arc in &self.arcs.entries {
            let mut entry = crate::schemas::canonical::StoryArc {
                resources: Default::default(),
                title: arc.name.clone(),
                number: arc.number,
            };
            if let (Some(source), Some(id)) = (source, arc.id) {
                entry.resources.set(source, id);
            }
            metadata.issue.story_arcs.entries.push(entry);
        }
        for credit in &self.credits.entries {
            let mut roles = RoleList::default();
            roles.entries = credit
                .roles
                .entries
                .iter()
                .map(|role| tag(role.id, role.value.label()))
                .collect();
            metadata.issue.credits.entries.push(Credit {
                creator: tag(credit.creator.id, &credit.creator.value),
                roles,
            });
        }
        metadata
    }

    /// Build from the canonical schema. The id slot prefers Metron and
    /// falls back to Comicvine; without a cover date this schema cannot
    /// be produced at all.
    pub fn from_canonical(metadata: &Metadata) -> Option<Self> {
        let issue = &metadata.issue;
        let cover_date = issue.cover_date?;
        let source = [Source::Metron, Source::Comicvine]
            .into_iter()
            .find(|s| issue.resources.get(*s).is_some())
            .or_else(|| {
                [Source::Metron, Source::Comicvine]
                    .into_iter()
                    .find(|s| issue.series.resources.get(*s).is_some())
            });

        let pick = |resources: &crate::schemas::canonical::ResourceList| -> Option<i64> {
            source.and_then(|s| resources.get(s))
        };
        let resource = |titled: &TitledResource| -> MetronResource {
            MetronResource {
                id: pick(&titled.resources),
                value: titled.title.clone(),
            }
        };

        let mut info = MetronInfo::default();
        info.id = source.and_then(|s| {
            issue.resources.get(s).map(|value| SourceId {
                source: InformationSource::from(s),
                value,
            })
        });
        info.publisher = resource(&issue.series.publisher);
        info.series = MetronSeries {
            id: pick(&issue.series.resources),
            lang: Some(issue.language.clone()),
            name: issue.series.title.clone(),
            volume: Some(issue.series.volume),
            format: Some(MetronFormat::from_canonical(issue.format)),
        };
        info.collection_title = issue.title.clone();
        info.number = issue.number.clone();
        info.summary = issue.summary.clone();
        info.notes = metadata.notes.clone();
        info.cover_date = cover_date;
        info.store_date = issue.store_date;
        info.page_count = issue.page_count;
        info.genres.entries = issue
            .series
            .genres
            .entries
            .iter()
            .filter_map(|genre| {
                Genre::from_label(&genre.title).map(|value| GenreResource {
                    id: pick(&genre.resources),
                    value,
                })
            })
            .collect();
        info.characters.entries = issue.characters.entries.iter().map(resource).collect();
        info.teams.entries = issue.teams.entries.iter().map(resource).collect();
        info.locations.entries = issue.locations.entries.iter().map(resource).collect();
        info.arcs.entries = issue
            .story_arcs
            .entries
            .iter()
            .map(|arc| Arc {
                id: pick(&arc.resources),
                name: arc.title.clone(),
                number: arc.number,
            })
            .collect();
        info.credits.entries = issue
            .credits
            .entries
            .iter()
            .map(|credit| MetronCredit {
                creator: resource(&credit.creator),
                roles: RoleResourceList {
                    entries: credit
                        .roles
                        .entries
                        .iter()
                        .map(|role| RoleResource {
                            id: pick(&role.resources),
                            value: Role::from_label(&role.title),
                        })
                        .collect(),
                },
            })
            .collect();
        Some(info)
    }

    pub fn apply_publisher(&mut self, source: Source, record: &PublisherRecord) {
        self.publisher.value = record.name.clone();
        if self.slot_matches(source) {
            self.publisher.id = Some(record.id);
        }
    }

    pub fn apply_series(&mut self, source: Source, record: &SeriesRecord) {
        self.series.name = record.name.clone();
        if let Some(volume) = record.volume {
            self.series.volume = Some(volume);
        }
        if self.slot_matches(source) {
            self.series.id = Some(record.id);
        }
        if !record.genres.is_empty() {
            self.genres.entries = record
                .genres
                .iter()
                .filter_map(|label| {
                    Genre::from_label(label).map(|value| GenreResource { id: None, value })
                })
                .collect();
        }
    }

    pub fn apply_issue(&mut self, source: Source, record: &IssueRecord) {
        let owns_slot = self.slot_matches(source);
        if owns_slot {
            self.id = Some(SourceId {
                source: InformationSource::from(source),
                value: record.id,
            });
        }
        if record.number.is_some() {
            self.number = record.number.clone();
        }
        if record.title.is_some() {
            self.collection_title = record.title.clone();
        }
        if record.summary.is_some() {
            self.summary = record.summary.clone();
        }
        if let Some(date) = record.cover_date {
            self.cover_date = date;
        }
        if record.store_date.is_some() {
            self.store_date = record.store_date;
        }
        if record.page_count > 0 {
            self.page_count = record.page_count;
        }
        let id_for = |id: i64| if owns_slot { Some(id) } else { None };
        if !record.characters.is_empty() {
            self.characters.entries = record
                .characters
                .iter()
                .map(|c| MetronResource {
                    id: id_for(c.id),
                    value: c.name.clone(),
                })
                .collect();
        }
        if !record.teams.is_empty() {
            self.teams.entries = record
                .teams
                .iter()
                .map(|t| MetronResource {
                    id: id_for(t.id),
                    value: t.name.clone(),
                })
                .collect();
        }
        if !record.locations.is_empty() {
            self.locations.entries = record
                .locations
                .iter()
                .map(|l| MetronResource {
                    id: id_for(l.id),
                    value: l.name.clone(),
                })
                .collect();
        }
        if !record.story_arcs.is_empty() {
            self.arcs.entries = record
                .story_arcs
                .iter()
                .map(|arc| Arc {
                    id: id_for(arc.id),
                    name: arc.name.clone(),
                    number: None,
                })
                .collect();
        }
        if !record.credits.is_empty() {
            self.credits.entries = record
                .credits
                .iter()
                .map(|credit| MetronCredit {
                    creator: MetronResource {
                        id: id_for(credit.creator.id),
                        value: credit.creator.name.clone(),
                    },
                    roles: RoleResourceList {
                        entries: credit
                            .roles
                            .iter()
                            .map(|role| RoleResource {
                                id: None,
                                value: Role::from_label(role),
                            })
                            .collect(),
                    },
                })
                .collect();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bone_info() -> MetronInfo {
        let mut info = MetronInfo::default();
        info.id = Some(SourceId {
            source: InformationSource::Metron,
            value: 9999,
        });
        info.publisher = MetronResource::with_id(7, "Cartoon Books");
        info.series = MetronSeries {
            id: Some(42),
            lang: Some("en".to_string()),
            name: "Bone".to_string(),
            volume: Some(1),
            format: Some(MetronFormat::SingleIssue),
        };
        info.number = Some("1".to_string());
        info.cover_date = NaiveDate::from_ymd_opt(1991, 7, 1).expect("date");
        info
    }

    #[test]
    fn canonical_conversion_tags_ids_with_the_bound_source() {
        let metadata = bone_info().to_canonical();
        assert_eq!(metadata.issue.resources.get(Source::Metron), Some(9999));
        assert_eq!(
            metadata.issue.series.publisher.resources.get(Source::Metron),
            Some(7)
        );
        assert_eq!(metadata.issue.series.resources.get(Source::Metron), Some(42));
        assert_eq!(metadata.issue.resources.get(Source::Comicvine), None);
    }

    #[test]
    fn from_canonical_requires_cover_date() {
        let mut metadata = bone_info().to_canonical();
        assert!(MetronInfo::from_canonical(&metadata).is_some());
        metadata.issue.cover_date = None;
        assert!(MetronInfo::from_canonical(&metadata).is_none());
    }

    #[test]
    fn id_slot_prefers_metron_over_comicvine() {
        let mut metadata = bone_info().to_canonical();
        metadata.issue.resources.set(Source::Comicvine, 105);
        let info = MetronInfo::from_canonical(&metadata).expect("info");
        let id = info.id.expect("id slot");
        assert_eq!(id.source, InformationSource::Metron);
        assert_eq!(id.value, 9999);
    }

    #[test]
    fn apply_issue_leaves_foreign_slot_ids_alone() {
        let mut info = bone_info();
        let record = crate::services::IssueRecord {
            id: 105,
            number: Some("1".to_string()),
            title: None,
            summary: None,
            cover_date: None,
            store_date: None,
            characters: vec![crate::services::NamedRef {
                id: 1,
                name: "Fone Bone".to_string(),
            }],
            teams: Vec::new(),
            locations: Vec::new(),
            story_arcs: Vec::new(),
            credits: Vec::new(),
            page_count: 0,
        };
        info.apply_issue(Source::Comicvine, &record);
        // The slot is bound to Metron, so the Comicvine resolution only
        // updates names and scalars.
        let id = info.id.expect("id slot");
        assert_eq!(id.source, InformationSource::Metron);
        assert_eq!(id.value, 9999);
        assert_eq!(info.characters.entries[0].value, "Fone Bone");
        assert_eq!(info.characters.entries[0].id, None);
    }

    #[test]
    fn canonical_conversion_stabilises_after_one_round() {
        let mut info = bone_info();
        info.characters.entries.push(MetronResource::with_id(1, "Fone Bone"));
        info.genres.entries.push(GenreResource {
            id: None,
            value: Genre::Fantasy,
        });
        let canonical = info.to_canonical();

        let first = MetronInfo::from_canonical(&canonical).expect("info");
        let second = MetronInfo::from_canonical(&first.to_canonical()).expect("info");
        assert_eq!(second, first);
        assert_eq!(first.characters.entries[0].value, "Fone Bone");
    }

    #[test]
    fn unmapped_genres_are_dropped() {
        assert_eq!(Genre::from_label("Super-Hero"), Some(Genre::SuperHero));
        assert_eq!(Genre::from_label("Slice of Life"), None);
    }

    #[test]
    fn xml_round_trip() {
        let info = bone_info();
        let xml = info.to_xml().expect("serialize");
        assert!(xml.contains("<ID source=\"Metron\">9999</ID>"));
        assert!(xml.contains("<CoverDate>1991-07-01</CoverDate>"));
        let parsed = MetronInfo::from_xml(&xml).expect("parse");
        assert_eq!(parsed, info);
    }
}
