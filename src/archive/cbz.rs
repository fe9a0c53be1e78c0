use std::fs::File;
use std::io;
use std::path::Path;

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::ArchiveError;

pub fn extract(src: &Path, dest: &Path) -> Result<(), ArchiveError> {
    let file = File::open(src)?;
    let mut archive = ZipArchive::new(file)?;
    archive.extract(dest)?;
    Ok(())
}

pub fn pack(dir: &Path, dest: &Path) -> Result<(), ArchiveError> {
    let file = File::create(dest)?;
    let mut writer = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for relative in super::relative_files(dir)? {
        let name = relative.to_string_lossy().replace('\\', "/");
        writer.start_file(name, options)?;
        let mut source = File::open(dir.join(&relative))?;
        io::copy(&mut source, &mut writer)?;
    }
    writer.finish()?;
    Ok(())
}
