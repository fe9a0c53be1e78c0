use std::fs::File;
use std::path::Path;

use crate::error::ArchiveError;

pub fn extract(src: &Path, dest: &Path) -> Result<(), ArchiveError> {
    let file = File::open(src)?;
    let mut archive = tar::Archive::new(file);
    archive.unpack(dest)?;
    Ok(())
}

pub fn pack(dir: &Path, dest: &Path) -> Result<(), ArchiveError> {
    let file = File::create(dest)?;
    let mut builder = tar::Builder::new(file);
    for relative in super::relative_files(dir)? {
        builder.append_path_with_name(dir.join(&relative), &relative)?;
    }
    builder.finish()?;
    Ok(())
}
