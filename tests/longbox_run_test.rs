use chrono::Utc;
use predicates::prelude::*;
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::tempdir;

fn base_cmd(tmp: &Path, collection: &Path) -> assert_cmd::Command {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("longbox");
    cmd.current_dir(tmp)
        .env("LONGBOX_COLLECTION", collection)
        .env("LONGBOX_CACHE_PATH", tmp.join("cache.sqlite"))
        .env("LONGBOX_CONFIG_PATH", tmp.join("missing-config.toml"))
        .env("LONGBOX_LOG", "longbox=debug");
    cmd
}

fn write_cbz(path: &Path, metadata_xml: Option<&str>) {
    let file = fs::File::create(path).expect("create archive");
    let mut writer = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default();
    writer.start_file("page01.jpg", options).expect("entry");
    writer.write_all(b"fake jpeg one").expect("write page");
    writer.start_file("page02.jpg", options).expect("entry");
    writer.write_all(b"fake jpeg two").expect("write page");
    if let Some(xml) = metadata_xml {
        writer.start_file("Metadata.xml", options).expect("entry");
        writer.write_all(xml.as_bytes()).expect("write sidecar");
    }
    writer.finish().expect("finish archive");
}

fn fresh_metadata_xml() -> String {
    let today = Utc::now().date_naive();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<Metadata>
  <Issue>
    <CoverDate>1991-07-01</CoverDate>
    <Format>Single Issue</Format>
    <Language>en</Language>
    <Number>1</Number>
    <PageCount>2</PageCount>
    <Series>
      <Publisher>
        <Title>Cartoon Books</Title>
      </Publisher>
      <Title>Bone</Title>
      <Volume>1</Volume>
    </Series>
  </Issue>
  <Meta>
    <Date>{today}</Date>
    <Tool version="0.1.0">Longbox</Tool>
  </Meta>
</Metadata>
"#
    )
}

#[test]
fn empty_collection_runs_clean_without_services() {
    let tmp = tempdir().expect("tempdir");
    let collection = tmp.path().join("comics");
    fs::create_dir_all(&collection).expect("mkdir");

    base_cmd(tmp.path(), &collection)
        .assert()
        .success()
        .stderr(predicate::str::contains("no catalog services configured"));
}

#[test]
fn force_argument_is_accepted() {
    let tmp = tempdir().expect("tempdir");
    let collection = tmp.path().join("comics");
    fs::create_dir_all(&collection).expect("mkdir");

    base_cmd(tmp.path(), &collection)
        .arg("FORCE")
        .assert()
        .success();
}

#[test]
fn unknown_argument_is_rejected() {
    let tmp = tempdir().expect("tempdir");
    let collection = tmp.path().join("comics");
    fs::create_dir_all(&collection).expect("mkdir");

    base_cmd(tmp.path(), &collection)
        .arg("bogus")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognised argument"));
}

#[test]
fn archive_without_metadata_is_left_untouched() {
    let tmp = tempdir().expect("tempdir");
    let collection = tmp.path().join("comics");
    fs::create_dir_all(&collection).expect("mkdir");
    let archive = collection.join("mystery.cbz");
    write_cbz(&archive, None);

    // Stdin is empty, so the operator "declines" every prompt.
    base_cmd(tmp.path(), &collection)
        .write_stdin("")
        .assert()
        .success()
        .stderr(predicate::str::contains("leaving it untouched"));
    assert!(archive.is_file());
}

#[test]
fn fresh_archive_is_refiled_without_any_lookup() {
    let tmp = tempdir().expect("tempdir");
    let collection = tmp.path().join("comics");
    let inbox = collection.join("inbox");
    fs::create_dir_all(&inbox).expect("mkdir");
    let archive = inbox.join("bone 01.cbz");
    write_cbz(&archive, Some(&fresh_metadata_xml()));

    base_cmd(tmp.path(), &collection).assert().success();

    let filed = collection.join("Cartoon Books/Bone/Bone_#001.cbz");
    assert!(filed.is_file(), "expected {}", filed.display());
    assert!(!archive.exists());
    // The inbox directory is swept once it is empty.
    assert!(!inbox.exists());

    let file = fs::File::open(&filed).expect("open filed archive");
    let mut packed = zip::ZipArchive::new(file).expect("read zip");
    let names: Vec<String> = (0..packed.len())
        .map(|i| packed.by_index(i).expect("entry").name().to_string())
        .collect();
    assert!(names.iter().any(|n| n == "Metadata.xml"));
    assert!(names.iter().any(|n| n == "ComicInfo.xml"));
    assert!(names.iter().any(|n| n == "MetronInfo.xml"));
    assert!(names.iter().any(|n| n == "page01.jpg"));
}
