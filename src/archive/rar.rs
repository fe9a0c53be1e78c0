use std::path::Path;
use std::process::Command;

use crate::error::ArchiveError;

/// Extraction only. Creating rar archives needs the proprietary `rar`
/// tool, so cbr output is rejected long before reaching this module.
pub fn extract(src: &Path, dest: &Path) -> Result<(), ArchiveError> {
    let src_str = src.display().to_string();
    // unrar wants a trailing separator on the destination.
    let dest_str = format!("{}/", dest.display());

    if let Ok(bin) = which::which("unrar") {
        let out = Command::new(&bin)
            .args(["x", "-y", &src_str, &dest_str])
            .output()?;
        if out.status.success() {
            return Ok(());
        }
        return Err(ArchiveError::ToolFailed {
            tool: bin.display().to_string(),
            stderr: String::from_utf8_lossy(&out.stderr).trim().to_string(),
        });
    }

    // Most 7z builds can read rar archives.
    match super::sevenzip::extract(src, dest) {
        Ok(()) => Ok(()),
        Err(ArchiveError::MissingTool(_)) => Err(ArchiveError::MissingTool("unrar")),
        Err(err) => Err(err),
    }
}
