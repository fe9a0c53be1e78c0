pub mod canonical;
pub mod comic_info;
pub mod metron_info;

pub use canonical::{Metadata, Source};
pub use comic_info::ComicInfo;
pub use metron_info::MetronInfo;

use crate::services::{IssueRecord, PublisherRecord, SeriesRecord};

/// One issue's metadata in up to three parallel shapes. Whichever
/// sidecars exist in the archive are loaded; the rest are derived from
/// the richest available one. Instances are mutated in place while a
/// service resolution is merged back.
#[derive(Debug, Clone, Default)]
pub struct SchemaSet {
    pub metadata: Option<Metadata>,
    pub metron_info: Option<MetronInfo>,
    pub comic_info: Option<ComicInfo>,
}

impl SchemaSet {
    /// Fill in absent schemas from whichever sibling is present, in
    /// priority order: Metadata, then MetronInfo, then ComicInfo.
    /// Returns false when no schema could be produced at all.
    pub fn derive_missing(&mut self) -> bool {
        if self.metadata.is_none() {
            self.metadata = self
                .metron_info
                .as_ref()
                .map(MetronInfo::to_canonical)
                .or_else(|| self.comic_info.as_ref().and_then(ComicInfo::to_canonical));
        }
        let Some(metadata) = self.metadata.as_ref() else {
            return false;
        };
        if self.metron_info.is_none() {
            self.metron_info = metadata.to_metron_info();
        }
        if self.comic_info.is_none() {
            self.comic_info = Some(metadata.to_comic_info());
        }
        true
    }

    pub fn publisher_hint(&self) -> Option<String> {
        if let Some(metadata) = &self.metadata {
            return Some(metadata.issue.series.publisher.title.clone());
        }
        if let Some(metron) = &self.metron_info {
            return Some(metron.publisher.value.clone());
        }
        self.comic_info.as_ref().and_then(|ci| ci.publisher.clone())
    }

    pub fn series_hint(&self) -> Option<String> {
        if let Some(metadata) = &self.metadata {
            return Some(metadata.issue.series.title.clone());
        }
        if let Some(metron) = &self.metron_info {
            return Some(metron.series.name.clone());
        }
        self.comic_info.as_ref().and_then(|ci| ci.series.clone())
    }

    pub fn issue_number_hint(&self) -> Option<String> {
        if let Some(metadata) = &self.metadata {
            if metadata.issue.number.is_some() {
                return metadata.issue.number.clone();
            }
        }
        if let Some(metron) = &self.metron_info {
            if metron.number.is_some() {
                return metron.number.clone();
            }
        }
        self.comic_info.as_ref().and_then(|ci| ci.number.clone())
    }

    /// Known external id of the publisher for `source`, from any schema
    /// that can carry one.
    pub fn publisher_id(&self, source: Source) -> Option<i64> {
        if let Some(metadata) = &self.metadata {
            if let Some(id) = metadata.issue.series.publisher.resources.get(source) {
                return Some(id);
            }
        }
        let metron = self.metron_info.as_ref()?;
        if metron.information_source() == Some(source) {
            return metron.publisher.id;
        }
        None
    }

    pub fn series_id(&self, source: Source) -> Option<i64> {
        if let Some(metadata) = &self.metadata {
            if let Some(id) = metadata.issue.series.resources.get(source) {
                return Some(id);
            }
        }
        let metron = self.metron_info.as_ref()?;
        if metron.information_source() == Some(source) {
            return metron.series.id;
        }
        None
    }

    pub fn issue_id(&self, source: Source) -> Option<i64> {
        if let Some(metadata) = &self.metadata {
            if let Some(id) = metadata.issue.resources.get(source) {
                return Some(id);
            }
        }
        let metron = self.metron_info.as_ref()?;
        let id = metron.id.as_ref()?;
        if Source::from(id.source) == source {
            return Some(id.value);
        }
        None
    }

    /// Cross-reference ids known for the publisher under services other
    /// than `target`, usable as lookup filters.
    pub fn publisher_cross_ids(&self, target: Source) -> Vec<(Source, i64)> {
        let mut out = Vec::new();
        if let Some(metadata) = &self.metadata {
            for entry in metadata.issue.series.publisher.resources.iter() {
                if entry.source != target {
                    out.push((entry.source, entry.value));
                }
            }
        }
        if let Some(metron) = &self.metron_info {
            if let Some(source) = metron.information_source() {
                if source != target {
                    if let Some(id) = metron.publisher.id {
                        if !out.iter().any(|(s, _)| *s == source) {
                            out.push((source, id));
                        }
                    }
                }
            }
        }
        out
    }

    pub fn series_cross_ids(&self, target: Source) -> Vec<(Source, i64)> {
        let mut out = Vec::new();
        if let Some(metadata) = &self.metadata {
            for entry in metadata.issue.series.resources.iter() {
                if entry.source != target {
                    out.push((entry.source, entry.value));
                }
            }
        }
        if let Some(metron) = &self.metron_info {
            if let Some(source) = metron.information_source() {
                if source != target {
                    if let Some(id) = metron.series.id {
                        if !out.iter().any(|(s, _)| *s == source) {
                            out.push((source, id));
                        }
                    }
                }
            }
        }
        out
    }

    pub fn issue_cross_ids(&self, target: Source) -> Vec<(Source, i64)> {
        let mut out = Vec::new();
        if let Some(metadata) = &self.metadata {
            for entry in metadata.issue.resources.iter() {
                if entry.source != target {
                    out.push((entry.source, entry.value));
                }
            }
        }
        if let Some(metron) = &self.metron_info {
            if let Some(id) = &metron.id {
                let source = Source::from(id.source);
                if source != target && !out.iter().any(|(s, _)| *s == source) {
                    out.push((source, id.value));
                }
            }
        }
        out
    }

    pub fn apply_publisher(&mut self, source: Source, record: &PublisherRecord) {
        if let Some(metadata) = &mut self.metadata {
            metadata.apply_publisher(source, record);
        }
        if let Some(metron) = &mut self.metron_info {
            metron.apply_publisher(source, record);
        }
        if let Some(comic) = &mut self.comic_info {
            comic.apply_publisher(record);
        }
    }

    pub fn apply_series(&mut self, source: Source, record: &SeriesRecord) {
        if let Some(metadata) = &mut self.metadata {
            metadata.apply_series(source, record);
        }
        if let Some(metron) = &mut self.metron_info {
            metron.apply_series(source, record);
        }
        if let Some(comic) = &mut self.comic_info {
            comic.apply_series(record);
        }
    }

    pub fn apply_issue(&mut self, source: Source, record: &IssueRecord) {
        if let Some(metadata) = &mut self.metadata {
            metadata.apply_issue(source, record);
        }
        if let Some(metron) = &mut self.metron_info {
            metron.apply_issue(source, record);
        }
        if let Some(comic) = &mut self.comic_info {
            comic.apply_issue(record);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schemas::canonical::{Issue, Meta, Series, TitledResource};

    fn minimal_metadata() -> Metadata {
        Metadata {
            issue: Issue {
                series: Series {
                    publisher: TitledResource::new("Cartoon Books"),
                    title: "Bone".to_string(),
                    volume: 1,
                    ..Series::default()
                },
                number: Some("1".to_string()),
                ..Issue::default()
            },
            meta: Meta::stamped_today("Manual"),
            ..Metadata::default()
        }
    }

    #[test]
    fn derive_missing_fills_all_three_from_metadata() {
        let mut set = SchemaSet {
            metadata: Some(minimal_metadata()),
            ..SchemaSet::default()
        };
        assert!(set.derive_missing());
        // MetronInfo requires a cover date, so it may stay absent, but
        // ComicInfo is always derivable.
        let comic = set.comic_info.expect("comic info derived");
        assert_eq!(comic.series.as_deref(), Some("Bone"));
        assert_eq!(comic.publisher.as_deref(), Some("Cartoon Books"));
    }

    #[test]
    fn derive_missing_reports_empty_set() {
        let mut set = SchemaSet::default();
        assert!(!set.derive_missing());
    }

    #[test]
    fn cross_ids_exclude_the_target_service() {
        let mut metadata = minimal_metadata();
        metadata.issue.series.resources.set(Source::Comicvine, 1702);
        metadata.issue.series.resources.set(Source::Metron, 42);
        metadata.issue.resources.set(Source::Comicvine, 1703);
        let set = SchemaSet {
            metadata: Some(metadata),
            ..SchemaSet::default()
        };
        assert_eq!(
            set.series_cross_ids(Source::Metron),
            vec![(Source::Comicvine, 1702)]
        );
        assert_eq!(
            set.issue_cross_ids(Source::Metron),
            vec![(Source::Comicvine, 1703)]
        );
        assert!(set.issue_cross_ids(Source::Comicvine).is_empty());
    }

    #[test]
    fn hints_fall_back_across_schemas() {
        let mut comic = ComicInfo::default();
        comic.publisher = Some("Cartoon Books".to_string());
        comic.series = Some("Bone".to_string());
        comic.number = Some("1".to_string());
        let set = SchemaSet {
            comic_info: Some(comic),
            ..SchemaSet::default()
        };
        assert_eq!(set.publisher_hint().as_deref(), Some("Cartoon Books"));
        assert_eq!(set.series_hint().as_deref(), Some("Bone"));
        assert_eq!(set.issue_number_hint().as_deref(), Some("1"));
        assert_eq!(set.publisher_id(Source::Metron), None);
    }
}
