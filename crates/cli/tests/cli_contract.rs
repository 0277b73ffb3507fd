use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::Value;
use std::path::Path;

fn write_png(dir: &Path, name: &str, side: u32) {
    image::RgbaImage::new(side, side)
        .save(dir.join(name))
        .expect("fixture png should be written");
}

fn fixture_dir(count: usize) -> tempfile::TempDir {
    let dir = tempfile::tempdir().expect("temp dir should be created");
    for i in 0..count {
        write_png(dir.path(), &format!("img{i:02}.png"), 4 + i as u32);
    }
    dir
}

#[test]
fn scan_lists_images_in_sorted_order() {
    let dir = fixture_dir(3);
    write_png(dir.path(), "aaa.png", 4);

    let output = cargo_bin_cmd!("lightbox-cli")
        .arg("scan")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("4 images"))
        .get_output()
        .stdout
        .clone();

    let stdout = String::from_utf8(output).expect("stdout should be utf-8");
    let aaa = stdout.find("aaa.png").expect("aaa.png should be listed");
    let img00 = stdout.find("img00.png").expect("img00.png should be listed");
    assert!(aaa < img00, "listing should be sorted");
}

#[test]
fn scan_ignores_non_image_files() {
    let dir = fixture_dir(2);
    std::fs::write(dir.path().join("notes.txt"), b"not an image").unwrap();

    cargo_bin_cmd!("lightbox-cli")
        .arg("scan")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("2 images"))
        .stdout(predicate::str::contains("notes.txt").not());
}

#[test]
fn info_emits_json_contract() {
    let dir = fixture_dir(3);

    let output = cargo_bin_cmd!("lightbox-cli")
        .arg("info")
        .arg(dir.path())
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let value: Value = serde_json::from_slice(&output).expect("stdout should contain valid json");
    assert_eq!(value["image_count"], 3);
    assert_eq!(value["mode"], "bulk");
    assert_eq!(value["max_memory_bytes"], 3072u64 * 1024 * 1024);
    assert_eq!(value["resident_count"], 3);
    assert!(value["total_bytes"].as_u64().expect("total_bytes") > 0);
    assert_eq!(value["memory_used_bytes"], value["total_bytes"]);
}

#[test]
fn info_respects_memory_flag() {
    let dir = fixture_dir(1);

    let output = cargo_bin_cmd!("lightbox-cli")
        .arg("info")
        .arg(dir.path())
        .arg("--max-memory-mb")
        .arg("16")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let value: Value = serde_json::from_slice(&output).expect("stdout should contain valid json");
    assert_eq!(value["max_memory_bytes"], 16u64 * 1024 * 1024);
}

#[test]
fn browse_walks_the_whole_directory() {
    let dir = fixture_dir(3);

    cargo_bin_cmd!("lightbox-cli")
        .arg("browse")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Image 1/3"))
        .stdout(predicate::str::contains("Image 3/3"))
        .stdout(predicate::str::contains("4x4 px"))
        .stdout(predicate::str::contains("browsed 3 images (bulk mode)"));
}

#[test]
fn browse_fails_for_directory_without_images() {
    let dir = tempfile::tempdir().expect("temp dir should be created");

    cargo_bin_cmd!("lightbox-cli")
        .arg("browse")
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("no image files found"));
}

#[test]
fn scan_fails_for_missing_directory() {
    cargo_bin_cmd!("lightbox-cli")
        .arg("scan")
        .arg("/definitely/not/a/real/dir")
        .assert()
        .failure()
        .stderr(predicate::str::contains("directory does not exist"));
}
