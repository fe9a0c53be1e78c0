use anyhow::{Context, Result, bail};
use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::{debug, info, warn};

use crate::archive::{Archive, ArchiveFormat};
use crate::cache::ResponseCache;
use crate::config::Settings;
use crate::console::Prompter;
use crate::organize;
use crate::resolver::Resolver;
use crate::schemas::canonical::{Meta, Page, PageKind};
use crate::schemas::{ComicInfo, Metadata, MetronInfo, SchemaSet};
use crate::services::{ServiceAdapter, build_adapters};

/// Metadata stamped by us within this window is trusted as-is and not
/// re-resolved unless the run is forced.
const FRESH_DAYS: i64 = 28;

const IMAGE_EXTENSIONS: &[&str] = &["bmp", "gif", "jpeg", "jpg", "png", "webp"];

pub fn run(settings: &Settings, force: bool, prompter: &mut dyn Prompter) -> Result<()> {
    let cache = Rc::new(
        ResponseCache::open(&settings.cache.path, settings.cache.expiry_days)
            .context("failed to open response cache")?,
    );
    let adapters = build_adapters(settings, cache);
    if adapters.is_empty() {
        warn!("no catalog services configured; archives will not be resolved");
    }

    let archives = scan_archives(&settings.collection_folder)?;
    info!(
        "processing {} archive(s) under {}",
        archives.len(),
        settings.collection_folder.display()
    );
    for path in archives {
        if let Err(err) = process_archive(&path, settings, force, &adapters, prompter) {
            warn!("skipping {}: {err:#}", path.display());
        }
    }
    organize::sweep_empty_dirs(&settings.collection_folder)
}

/// Every recognisable comic archive under `root`, in stable order.
fn scan_archives(root: &Path) -> Result<Vec<PathBuf>> {
    fn walk(dir: &Path, out: &mut Vec<PathBuf>) -> std::io::Result<()> {
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.is_dir() {
                walk(&path, out)?;
            } else if ArchiveFormat::from_path(&path).is_ok() {
                out.push(path);
            }
        }
        Ok(())
    }

    let mut out = Vec::new();
    walk(root, &mut out)
        .with_context(|| format!("failed to scan {}", root.display()))?;
    out.sort();
    Ok(out)
}

fn process_archive(
    path: &Path,
    settings: &Settings,
    force: bool,
    adapters: &[Box<dyn ServiceAdapter>],
    prompter: &mut dyn Prompter,
) -> Result<()> {
    info!("processing {}", path.display());
    let archive = Archive::open(path)?;
    let scratch = tempfile::tempdir().context("failed to create scratch directory")?;
    archive.extract_to(scratch.path())?;

    let mut set = load_schemas(scratch.path());
    if !set.derive_missing() {
        match synthesize_metadata(scratch.path(), prompter)? {
            Some(metadata) => {
                set.metadata = Some(metadata);
                set.derive_missing();
            }
            None => {
                warn!("no metadata for {}; leaving it untouched", path.display());
                return Ok(());
            }
        }
    }

    let fresh = !force
        && set
            .metadata
            .as_ref()
            .is_some_and(|md| md.is_fresh(Utc::now().date_naive(), FRESH_DAYS));
    if fresh {
        debug!("metadata for {} is fresh; skipping lookup", path.display());
    } else {
        let mut resolved = false;
        for adapter in adapters {
            if Resolver::new(prompter).resolve(adapter.as_ref(), &mut set)? {
                resolved = true;
                break;
            }
        }
        if !resolved {
            warn!("unable to resolve {}; leaving it untouched", path.display());
            return Ok(());
        }
        if let Some(metadata) = &mut set.metadata {
            metadata.stamp();
        }
    }

    let Some(metadata) = set.metadata.as_mut() else {
        warn!("no canonical metadata for {}; leaving it untouched", path.display());
        return Ok(());
    };
    inventory_pages(scratch.path(), metadata)?;
    let page_count = metadata.issue.page_count;
    if let Some(comic) = &mut set.comic_info {
        if page_count > 0 {
            comic.page_count = page_count;
        }
    }
    if let Some(info) = &mut set.metron_info {
        if page_count > 0 {
            info.page_count = page_count;
        }
    }
    // A resolution can supply the cover date this schema needs.
    if set.metron_info.is_none() {
        set.metron_info = set.metadata.as_ref().and_then(Metadata::to_metron_info);
    }

    write_sidecars(scratch.path(), &set, settings)?;
    let packed = repack(path, scratch.path(), settings.output.format)?;

    let metadata = set.metadata.as_ref().context("metadata vanished")?;
    organize::relocate(&packed, &settings.collection_folder, metadata)?;
    Ok(())
}

/// Parse whichever sidecars the extracted tree contains. A malformed
/// sidecar is treated as absent.
fn load_schemas(dir: &Path) -> SchemaSet {
    let mut set = SchemaSet::default();
    if let Some(raw) = read_sidecar(dir, Metadata::FILENAME) {
        match Metadata::from_xml(&raw) {
            Ok(metadata) => set.metadata = Some(metadata),
            Err(err) => warn!("ignoring malformed {}: {err:#}", Metadata::FILENAME),
        }
    }
    if let Some(raw) = read_sidecar(dir, MetronInfo::FILENAME) {
        match MetronInfo::from_xml(&raw) {
            Ok(info) => set.metron_info = Some(info),
            Err(err) => warn!("ignoring malformed {}: {err:#}", MetronInfo::FILENAME),
        }
    }
    if let Some(raw) = read_sidecar(dir, ComicInfo::FILENAME) {
        match ComicInfo::from_xml(&raw) {
            Ok(info) => set.comic_info = Some(info),
            Err(err) => warn!("ignoring malformed {}: {err:#}", ComicInfo::FILENAME),
        }
    }
    set
}

/// Look for a sidecar at the archive root first, then anywhere below
/// it, matching the name case-insensitively.
fn read_sidecar(dir: &Path, name: &str) -> Option<String> {
    let direct = dir.join(name);
    if direct.is_file() {
        return fs::read_to_string(direct).ok();
    }
    find_named(dir, name).and_then(|path| fs::read_to_string(path).ok())
}

fn find_named(dir: &Path, name: &str) -> Option<PathBuf> {
    let entries = fs::read_dir(dir).ok()?;
    let mut subdirs = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            subdirs.push(path);
        } else if path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.eq_ignore_ascii_case(name))
        {
            return Some(path);
        }
    }
    subdirs.into_iter().find_map(|sub| find_named(&sub, name))
}

/// No usable sidecar at all: ask the operator for the bare minimum to
/// seed a resolution. Declining any answer skips the archive.
fn synthesize_metadata(dir: &Path, prompter: &mut dyn Prompter) -> Result<Option<Metadata>> {
    let Some(publisher) = prompter.prompt("Publisher name")? else {
        return Ok(None);
    };
    let Some(series) = prompter.prompt("Series name")? else {
        return Ok(None);
    };
    let number = prompter.prompt("Issue number")?;

    let mut metadata = Metadata::default();
    metadata.meta = Meta::stamped_today("Manual");
    metadata.issue.series.publisher.title = publisher;
    metadata.issue.series.title = series;
    metadata.issue.number = number;
    metadata.issue.page_count = image_files(dir)?.len() as u32;
    Ok(Some(metadata))
}

fn image_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut images: Vec<PathBuf> = crate::archive::relative_files(dir)
        .context("failed to list archive contents")?
        .into_iter()
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        })
        .collect();
    images.sort();
    Ok(images)
}

/// Keep the page table honest against the actual archive contents.
fn inventory_pages(dir: &Path, metadata: &mut Metadata) -> Result<()> {
    let images = image_files(dir)?;
    if images.is_empty() {
        return Ok(());
    }
    metadata.issue.page_count = images.len() as u32;
    if metadata.pages.is_empty() {
        metadata.pages.entries = images
            .iter()
            .enumerate()
            .map(|(index, path)| {
                let size = fs::metadata(dir.join(path)).map(|m| m.len()).unwrap_or(0);
                Page {
                    double_page: false,
                    filename: path.to_string_lossy().into_owned(),
                    index: index as u32,
                    size,
                    kind: if index == 0 {
                        PageKind::FrontCover
                    } else {
                        PageKind::Story
                    },
                }
            })
            .collect();
    }
    Ok(())
}

/// Write the enabled sidecars at the archive root and drop any stale
/// copies of disabled ones.
fn write_sidecars(dir: &Path, set: &SchemaSet, settings: &Settings) -> Result<()> {
    let output = &settings.output;
    if output.create_metadata {
        if let Some(metadata) = &set.metadata {
            fs::write(dir.join(Metadata::FILENAME), metadata.to_xml()?)?;
        }
    } else {
        remove_if_present(dir, Metadata::FILENAME)?;
    }
    if output.create_metron_info {
        if let Some(info) = &set.metron_info {
            fs::write(dir.join(MetronInfo::FILENAME), info.to_xml()?)?;
        }
    } else {
        remove_if_present(dir, MetronInfo::FILENAME)?;
    }
    if output.create_comic_info {
        if let Some(info) = &set.comic_info {
            fs::write(dir.join(ComicInfo::FILENAME), info.to_xml()?)?;
        }
    } else {
        remove_if_present(dir, ComicInfo::FILENAME)?;
    }
    Ok(())
}

fn remove_if_present(dir: &Path, name: &str) -> Result<()> {
    let path = dir.join(name);
    if path.is_file() {
        fs::remove_file(path)?;
    }
    Ok(())
}

/// Pack the scratch tree next to the original, then swap it in. The
/// original is only removed once the replacement is fully written.
fn repack(original: &Path, dir: &Path, format: ArchiveFormat) -> Result<PathBuf> {
    let parent = original.parent().context("archive has no parent directory")?;
    let stem = original
        .file_stem()
        .and_then(|s| s.to_str())
        .context("archive has no file name")?;
    let target = parent.join(format!("{stem}.{}", format.extension()));
    let staging = parent.join(format!("{stem}.{}.part", format.extension()));
    if original != target && target.exists() {
        bail!(
            "{} already exists; not converting {}",
            target.display(),
            original.display()
        );
    }

    Archive::pack(dir, &staging, format)?;
    if original != target {
        fs::remove_file(original)
            .with_context(|| format!("failed to remove {}", original.display()))?;
    }
    fs::rename(&staging, &target)
        .with_context(|| format!("failed to replace {}", target.display()))?;
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::Scripted;
    use std::fs::File;
    use std::io::Write;

    fn make_cbz(path: &Path, with_comic_info: bool) {
        let file = File::create(path).expect("create");
        let mut writer = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default();
        writer.start_file("page01.jpg", options).expect("entry");
        writer.write_all(b"fake jpeg").expect("write");
        writer.start_file("page02.jpg", options).expect("entry");
        writer.write_all(b"fake jpeg").expect("write");
        if with_comic_info {
            writer.start_file("ComicInfo.xml", options).expect("entry");
            let mut comic = ComicInfo::default();
            comic.publisher = Some("Cartoon Books".to_string());
            comic.series = Some("Bone".to_string());
            comic.number = Some("1".to_string());
            writer
                .write_all(comic.to_xml().expect("xml").as_bytes())
                .expect("write");
        }
        writer.finish().expect("finish");
    }

    #[test]
    fn scan_finds_archives_recursively() {
        let scratch = tempfile::tempdir().expect("tempdir");
        let nested = scratch.path().join("a/b");
        fs::create_dir_all(&nested).expect("mkdir");
        make_cbz(&nested.join("one.cbz"), false);
        make_cbz(&scratch.path().join("two.cbz"), false);
        fs::write(scratch.path().join("notes.txt"), b"ignored").expect("write");

        let found = scan_archives(scratch.path()).expect("scan");
        assert_eq!(found.len(), 2);
        assert!(found[0].ends_with("a/b/one.cbz"));
    }

    #[test]
    fn load_schemas_reads_comic_info_from_archive_root() {
        let scratch = tempfile::tempdir().expect("tempdir");
        make_cbz(&scratch.path().join("bone.cbz"), true);
        let out = scratch.path().join("out");
        Archive::open(&scratch.path().join("bone.cbz"))
            .expect("open")
            .extract_to(&out)
            .expect("extract");

        let set = load_schemas(&out);
        assert!(set.metadata.is_none());
        let comic = set.comic_info.expect("comic info");
        assert_eq!(comic.series.as_deref(), Some("Bone"));
    }

    #[test]
    fn inventory_pages_counts_and_labels_images() {
        let scratch = tempfile::tempdir().expect("tempdir");
        fs::write(scratch.path().join("p01.jpg"), b"one").expect("write");
        fs::write(scratch.path().join("p02.jpg"), b"two").expect("write");
        fs::write(scratch.path().join("ComicInfo.xml"), b"<ComicInfo/>").expect("write");

        let mut metadata = Metadata::default();
        inventory_pages(scratch.path(), &mut metadata).expect("inventory");
        assert_eq!(metadata.issue.page_count, 2);
        assert_eq!(metadata.pages.entries.len(), 2);
        assert_eq!(metadata.pages.entries[0].kind, PageKind::FrontCover);
        assert_eq!(metadata.pages.entries[1].kind, PageKind::Story);
    }

    #[test]
    fn synthesize_metadata_declined_returns_none() {
        let scratch = tempfile::tempdir().expect("tempdir");
        let mut prompter = Scripted::new();
        let result = synthesize_metadata(scratch.path(), &mut prompter).expect("synthesize");
        assert!(result.is_none());
    }

    #[test]
    fn repack_refuses_to_replace_an_existing_archive() {
        let scratch = tempfile::tempdir().expect("tempdir");
        let original = scratch.path().join("bone.cbz");
        make_cbz(&original, false);
        let occupied = scratch.path().join("bone.cbt");
        fs::write(&occupied, b"someone else's archive").expect("write");
        let content = scratch.path().join("content");
        Archive::open(&original)
            .expect("open")
            .extract_to(&content)
            .expect("extract");

        let result = repack(&original, &content, ArchiveFormat::Cbt);
        assert!(result.is_err());
        assert!(original.is_file());
        assert_eq!(fs::read(&occupied).expect("read"), b"someone else's archive");
    }

    #[test]
    fn repack_converts_between_formats() {
        let scratch = tempfile::tempdir().expect("tempdir");
        let original = scratch.path().join("bone.cbz");
        make_cbz(&original, false);
        let content = scratch.path().join("content");
        Archive::open(&original)
            .expect("open")
            .extract_to(&content)
            .expect("extract");

        let packed = repack(&original, &content, ArchiveFormat::Cbt).expect("repack");
        assert!(packed.ends_with("bone.cbt"));
        assert!(packed.is_file());
        assert!(!original.exists());
    }
}
