use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::ArchiveError;

fn resolve_bin() -> Result<PathBuf, ArchiveError> {
    which::which("7z")
        .or_else(|_| which::which("7zz"))
        .map_err(|_| ArchiveError::MissingTool("7z"))
}

fn run(bin: &Path, args: &[&str]) -> Result<(), ArchiveError> {
    let out = Command::new(bin).args(args).output()?;
    if out.status.success() {
        return Ok(());
    }
    Err(ArchiveError::ToolFailed {
        tool: bin.display().to_string(),
        stderr: String::from_utf8_lossy(&out.stderr).trim().to_string(),
    })
}

pub fn extract(src: &Path, dest: &Path) -> Result<(), ArchiveError> {
    let bin = resolve_bin()?;
    let out_flag = format!("-o{}", dest.display());
    let src = src.display().to_string();
    run(&bin, &["x", "-y", &out_flag, &src])
}

pub fn pack(dir: &Path, dest: &Path) -> Result<(), ArchiveError> {
    let bin = resolve_bin()?;
    // 7z resolves the archive path before chdir, so it must be absolute.
    let dest = std::path::absolute(dest)?;
    let dest = dest.display().to_string();
    let out = Command::new(&bin)
        .current_dir(dir)
        .args(["a", "-y", &dest, "."])
        .output()?;
    if out.status.success() {
        return Ok(());
    }
    Err(ArchiveError::ToolFailed {
        tool: bin.display().to_string(),
        stderr: String::from_utf8_lossy(&out.stderr).trim().to_string(),
    })
}
