mod cbt;
mod cbz;
mod rar;
mod sevenzip;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::ArchiveError;

/// Comic archive container formats. All are plain archives of page
/// images; only the compression differs. CBR can be read but never
/// written, since rar creation is proprietary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveFormat {
    Cb7,
    Cbr,
    Cbt,
    #[default]
    Cbz,
}

impl ArchiveFormat {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().trim_start_matches('.').to_lowercase().as_str() {
            "cb7" | "7z" => Some(ArchiveFormat::Cb7),
            "cbr" | "rar" => Some(ArchiveFormat::Cbr),
            "cbt" | "tar" => Some(ArchiveFormat::Cbt),
            "cbz" | "zip" => Some(ArchiveFormat::Cbz),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, ArchiveError> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::parse)
            .ok_or_else(|| ArchiveError::UnrecognisedExtension(path.display().to_string()))
    }

    pub fn extension(self) -> &'static str {
        match self {
            ArchiveFormat::Cb7 => "cb7",
            ArchiveFormat::Cbr => "cbr",
            ArchiveFormat::Cbt => "cbt",
            ArchiveFormat::Cbz => "cbz",
        }
    }

    pub fn writable(self) -> bool {
        !matches!(self, ArchiveFormat::Cbr)
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// An existing archive on disk. Mutation never happens in place: the
/// caller extracts into a scratch directory, edits there, and packs a
/// fresh archive.
#[derive(Debug, Clone)]
pub struct Archive {
    path: PathBuf,
    format: ArchiveFormat,
}

impl Archive {
    pub fn open(path: &Path) -> Result<Self, ArchiveError> {
        let format = ArchiveFormat::from_path(path)?;
        if !path.is_file() {
            return Err(ArchiveError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} does not exist", path.display()),
            )));
        }
        Ok(Self {
            path: path.to_path_buf(),
            format,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> ArchiveFormat {
        self.format
    }

    pub fn extract_to(&self, dir: &Path) -> Result<(), ArchiveError> {
        std::fs::create_dir_all(dir)?;
        match self.format {
            ArchiveFormat::Cb7 => sevenzip::extract(&self.path, dir),
            ArchiveFormat::Cbr => rar::extract(&self.path, dir),
            ArchiveFormat::Cbt => cbt::extract(&self.path, dir),
            ArchiveFormat::Cbz => cbz::extract(&self.path, dir),
        }
    }

    /// Pack the contents of `dir` into a new archive at `dest`.
    pub fn pack(dir: &Path, dest: &Path, format: ArchiveFormat) -> Result<(), ArchiveError> {
        if !format.writable() {
            return Err(ArchiveError::ReadOnlyFormat(format));
        }
        match format {
            ArchiveFormat::Cb7 => sevenzip::pack(dir, dest),
            ArchiveFormat::Cbt => cbt::pack(dir, dest),
            ArchiveFormat::Cbz => cbz::pack(dir, dest),
            ArchiveFormat::Cbr => unreachable!("rejected above"),
        }
    }
}

/// Files under `dir`, as paths relative to it, sorted for stable
/// archive entry order.
pub(crate) fn relative_files(dir: &Path) -> Result<Vec<PathBuf>, ArchiveError> {
    fn walk(root: &Path, current: &Path, out: &mut Vec<PathBuf>) -> std::io::Result<()> {
        for entry in std::fs::read_dir(current)? {
            let entry = entry?;
            let path = entry.path();
            if path.is_dir() {
                walk(root, &path, out)?;
            } else if let Ok(relative) = path.strip_prefix(root) {
                out.push(relative.to_path_buf());
            }
        }
        Ok(())
    }

    let mut out = Vec::new();
    walk(dir, dir, &mut out)?;
    out.sort();
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn seed_pages(dir: &Path) {
        fs::write(dir.join("page01.jpg"), b"fake jpeg one").expect("write");
        fs::write(dir.join("page02.jpg"), b"fake jpeg two").expect("write");
        fs::write(dir.join("ComicInfo.xml"), b"<ComicInfo/>").expect("write");
    }

    #[test]
    fn format_parse_accepts_extensions_and_aliases() {
        assert_eq!(ArchiveFormat::parse("cbz"), Some(ArchiveFormat::Cbz));
        assert_eq!(ArchiveFormat::parse(".CBR"), Some(ArchiveFormat::Cbr));
        assert_eq!(ArchiveFormat::parse("tar"), Some(ArchiveFormat::Cbt));
        assert_eq!(ArchiveFormat::parse("pdf"), None);
    }

    #[test]
    fn from_path_rejects_unknown_extensions() {
        let err = ArchiveFormat::from_path(Path::new("/tmp/comic.pdf"));
        assert!(err.is_err());
    }

    #[test]
    fn only_cbr_is_read_only() {
        assert!(ArchiveFormat::Cbz.writable());
        assert!(ArchiveFormat::Cbt.writable());
        assert!(ArchiveFormat::Cb7.writable());
        assert!(!ArchiveFormat::Cbr.writable());
    }

    #[test]
    fn cbz_pack_and_extract_round_trip() {
        let scratch = tempfile::tempdir().expect("tempdir");
        let content = scratch.path().join("content");
        fs::create_dir_all(&content).expect("mkdir");
        seed_pages(&content);

        let archive_path = scratch.path().join("bone.cbz");
        Archive::pack(&content, &archive_path, ArchiveFormat::Cbz).expect("pack");

        let out = scratch.path().join("out");
        let archive = Archive::open(&archive_path).expect("open");
        assert_eq!(archive.format(), ArchiveFormat::Cbz);
        archive.extract_to(&out).expect("extract");

        let files = relative_files(&out).expect("walk");
        let names: Vec<String> = files
            .iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["ComicInfo.xml", "page01.jpg", "page02.jpg"]);
        assert_eq!(
            fs::read(out.join("page01.jpg")).expect("read"),
            b"fake jpeg one"
        );
    }

    #[test]
    fn cbt_pack_and_extract_round_trip() {
        let scratch = tempfile::tempdir().expect("tempdir");
        let content = scratch.path().join("content");
        fs::create_dir_all(&content).expect("mkdir");
        seed_pages(&content);

        let archive_path = scratch.path().join("bone.cbt");
        Archive::pack(&content, &archive_path, ArchiveFormat::Cbt).expect("pack");

        let out = scratch.path().join("out");
        Archive::open(&archive_path)
            .expect("open")
            .extract_to(&out)
            .expect("extract");
        assert_eq!(
            fs::read(out.join("ComicInfo.xml")).expect("read"),
            b"<ComicInfo/>"
        );
    }

    #[test]
    fn packing_cbr_is_refused() {
        let scratch = tempfile::tempdir().expect("tempdir");
        let err = Archive::pack(
            scratch.path(),
            &scratch.path().join("bone.cbr"),
            ArchiveFormat::Cbr,
        );
        assert!(matches!(err, Err(ArchiveError::ReadOnlyFormat(_))));
    }
}
