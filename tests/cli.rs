use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::io::Write;
use std::process::Command;

#[test]
fn missing_settings_file_fails_fast() {
    Command::cargo_bin("mandelzoom")
        .unwrap()
        .arg("--config")
        .arg("no-such-settings.yaml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("configuration error"));
}

#[test]
fn bad_thread_count_is_rejected_by_the_parser() {
    Command::cargo_bin("mandelzoom")
        .unwrap()
        .arg("--threads")
        .arg("0")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Thread count"));
}

#[test]
fn missing_colormap_is_reported_by_name() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("settings.yaml");
    let mut file = std::fs::File::create(&config).unwrap();
    writeln!(file, "colormap: aurora").unwrap();
    writeln!(file, "x_resolution: 8").unwrap();
    writeln!(file, "y_resolution: 8").unwrap();
    drop(file);

    Command::cargo_bin("mandelzoom")
        .unwrap()
        .arg("--config")
        .arg(&config)
        .current_dir(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("aurora"));
}

#[test]
fn still_image_run_writes_a_png() {
    let dir = tempfile::tempdir().unwrap();

    let colormaps = dir.path().join("colormaps");
    std::fs::create_dir(&colormaps).unwrap();
    let mut palette = std::fs::File::create(colormaps.join("gray.csv")).unwrap();
    writeln!(palette, "0.0,0.0,0.0").unwrap();
    writeln!(palette, "1.0,1.0,1.0").unwrap();
    drop(palette);

    let config = dir.path().join("settings.yaml");
    let mut file = std::fs::File::create(&config).unwrap();
    writeln!(file, "colormap: gray").unwrap();
    writeln!(file, "x_resolution: 16").unwrap();
    writeln!(file, "y_resolution: 16").unwrap();
    writeln!(file, "max_its: 100").unwrap();
    writeln!(file, "animate: false").unwrap();
    writeln!(file, "output_name: tiny").unwrap();
    drop(file);

    Command::cargo_bin("mandelzoom")
        .unwrap()
        .arg("--config")
        .arg(&config)
        .arg("--threads")
        .arg("1")
        .current_dir(dir.path())
        .assert()
        .success();

    assert!(dir.path().join("tiny.png").exists());
}
