use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::schemas::Metadata;
use crate::schemas::canonical::Format;

/// Strip filesystem-hostile characters and collapse runs of
/// whitespace. Keeps letters, digits and a few common punctuation
/// marks seen in publisher and series names.
pub fn sanitize(name: &str) -> String {
    let kept: String = name
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || "&!'-. ".contains(ch) {
                ch
            } else {
                ' '
            }
        })
        .collect();
    kept.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn series_dirname(metadata: &Metadata) -> String {
    let series = &metadata.issue.series;
    let name = sanitize(&series.title);
    if series.volume > 1 {
        format!("{name}_v{}", series.volume)
    } else {
        name
    }
}

fn padded_number(metadata: &Metadata) -> String {
    // Numbers like "1/2" would otherwise nest a directory.
    let number = sanitize(metadata.issue.number.as_deref().unwrap_or("0"));
    let number = if number.is_empty() {
        "0".to_string()
    } else {
        number
    };
    // Single issues sit in long runs, so they get an extra digit.
    let width = match metadata.issue.format {
        Format::SingleIssue => 3,
        _ => 2,
    };
    format!("{number:0>width$}")
}

fn issue_stem(metadata: &Metadata) -> String {
    let series = series_dirname(metadata);
    let number = padded_number(metadata);
    match metadata.issue.format.filename_suffix() {
        Some(suffix) => format!("{series}{suffix}_#{number}"),
        None => format!("{series}_#{number}"),
    }
}

/// Where a resolved issue belongs:
/// `<root>/<publisher>/<series[_vN]>/<series[_vN]>[_suffix]_#<number>.<ext>`.
pub fn destination(root: &Path, metadata: &Metadata, extension: &str) -> PathBuf {
    let publisher = sanitize(&metadata.issue.series.publisher.title);
    root.join(publisher)
        .join(series_dirname(metadata))
        .join(format!("{}.{extension}", issue_stem(metadata)))
}

/// Move the archive to its computed location, creating directories as
/// needed. Returns the final path, which is unchanged when the archive
/// is already filed correctly. An archive already sitting at the
/// destination is never replaced; the new one stays where it is.
pub fn relocate(archive_path: &Path, root: &Path, metadata: &Metadata) -> Result<PathBuf> {
    let extension = archive_path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default();
    let target = destination(root, metadata, extension);
    if target == archive_path {
        return Ok(target);
    }
    if target.exists() {
        warn!(
            "not filing {}: {} already exists",
            archive_path.display(),
            target.display()
        );
        return Ok(archive_path.to_path_buf());
    }
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::rename(archive_path, &target).with_context(|| {
        format!(
            "failed to move {} to {}",
            archive_path.display(),
            target.display()
        )
    })?;
    info!("filed {}", target.display());
    Ok(target)
}

/// Remove directories left empty after relocation. The root itself is
/// kept.
pub fn sweep_empty_dirs(root: &Path) -> Result<()> {
    fn sweep(dir: &Path, root: &Path) -> std::io::Result<bool> {
        let mut empty = true;
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.is_dir() {
                if !sweep(&path, root)? {
                    empty = false;
                }
            } else {
                empty = false;
            }
        }
        if empty && dir != root {
            debug!("removing empty directory {}", dir.display());
            fs::remove_dir(dir)?;
        }
        Ok(empty)
    }

    sweep(root, root)
        .map(|_| ())
        .with_context(|| format!("failed to sweep {}", root.display()))
}
