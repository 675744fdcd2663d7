mod common;

use assert_cmd::Command;
use assert_fs::prelude::*;
use common::{gradient, save};
use image::ImageFormat;
use predicates::prelude::*;

#[test]
fn test_cli_help() {
    let mut cmd = Command::cargo_bin("budget-resize").unwrap();
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("--max-size-kb"));
}

#[test]
fn test_missing_args() {
    let mut cmd = Command::cargo_bin("budget-resize").unwrap();
    cmd.assert().failure();
}

#[test]
fn test_nonexistent_source() {
    let temp = assert_fs::TempDir::new().unwrap();
    let mut cmd = Command::cargo_bin("budget-resize").unwrap();
    cmd.arg(temp.path().join("nope"))
        .arg("-d")
        .arg(temp.path().join("out"))
        .arg("-o")
        .arg(temp.path().join("out.zip"));
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
    temp.child("out.zip").assert(predicate::path::missing());
}

#[test]
fn test_zero_max_size_rejected() {
    let temp = assert_fs::TempDir::new().unwrap();
    let mut cmd = Command::cargo_bin("budget-resize").unwrap();
    cmd.arg(temp.path()).args(["-d", "out", "-s", "0"]);
    cmd.assert().failure();
}

#[test]
fn test_zero_threads_rejected() {
    let temp = assert_fs::TempDir::new().unwrap();
    temp.child("src").create_dir_all().unwrap();
    let mut cmd = Command::cargo_bin("budget-resize").unwrap();
    cmd.arg(temp.child("src").path())
        .arg("-d")
        .arg(temp.child("out").path())
        .args(["-j", "0"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("worker count"));
}

#[test]
fn test_empty_directory() {
    let temp = assert_fs::TempDir::new().unwrap();
    temp.child("src").create_dir_all().unwrap();

    let mut cmd = Command::cargo_bin("budget-resize").unwrap();
    cmd.arg(temp.child("src").path())
        .arg("-d")
        .arg(temp.child("out").path())
        .arg("-o")
        .arg(temp.child("empty.zip").path())
        .arg("-q");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("List of modified images"));

    temp.child("empty.zip").assert(predicate::path::is_file());
    temp.child("out").assert(predicate::path::is_dir());
}

#[test]
fn test_resize_tree() {
    let temp = assert_fs::TempDir::new().unwrap();
    let photo = save(
        &gradient(300, 200),
        temp.child("src/trip/photo.bmp").path(),
        ImageFormat::Bmp,
    );
    temp.child("src/trip/itinerary.pdf").write_str("%PDF-1.4").unwrap();
    temp.child("src/broken.png").write_binary(b"garbage").unwrap();

    let mut cmd = Command::cargo_bin("budget-resize").unwrap();
    cmd.arg(temp.child("src").path())
        .arg("-d")
        .arg(temp.child("out").path())
        .arg("-o")
        .arg(temp.child("photos.zip").path())
        .args(["-s", "50", "-t", "60", "-j", "2", "-q"]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains(photo.display().to_string()))
        .stdout(predicate::str::contains("broken.png"))
        .stdout(predicate::str::contains("itinerary.pdf").not());

    temp.child("out/trip/photo.bmp").assert(predicate::path::is_file());
    temp.child("out/trip/itinerary.pdf").assert(predicate::path::missing());
    temp.child("out/broken.png").assert(predicate::path::missing());
    temp.child("photos.zip").assert(predicate::path::is_file());
}
