use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("cfdoc-babel")
        .join("tests")
        .join("fixtures")
        .join(name)
}

#[test]
fn convert_storage_to_markdown_via_cli() {
    let fixture = fixture_path("kitchensink.xhtml");
    let mut cmd = cargo_bin_cmd!("cfdoc");
    cmd.arg("convert").arg(&fixture).arg("--to").arg("markdown");

    let output_pred = predicate::str::contains("# Release notes\n")
        .and(predicate::str::contains("Version **2.0** ships *today*"))
        .and(predicate::str::contains(":::info Heads up"))
        .and(predicate::str::contains("- Faster parser"))
        .and(predicate::str::contains("```rust"));

    cmd.assert().success().stdout(output_pred);
}

#[test]
fn convert_subcommand_is_optional() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("notes.md");
    fs::write(&input, "Hello **world**\n").unwrap();

    let mut cmd = cargo_bin_cmd!("cfdoc");
    cmd.arg(&input).arg("--to").arg("storage");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("<p>Hello <strong>world</strong></p>"));
}

#[test]
fn convert_writes_output_file() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("page.md");

    let mut cmd = cargo_bin_cmd!("cfdoc");
    cmd.arg("convert")
        .arg(fixture_path("kitchensink.xhtml"))
        .arg("--to")
        .arg("markdown")
        .arg("-o")
        .arg(&output);

    cmd.assert().success().stdout(predicate::str::is_empty());
    let written = fs::read_to_string(&output).unwrap();
    assert!(written.starts_with("# Release notes\n"));
}

#[test]
fn explicit_from_overrides_detection() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("page.txt");
    fs::write(&input, "<p>plain</p>").unwrap();

    let mut cmd = cargo_bin_cmd!("cfdoc");
    cmd.arg("convert")
        .arg(&input)
        .arg("--from")
        .arg("storage")
        .arg("--to")
        .arg("markdown");

    cmd.assert().success().stdout("plain\n");
}

#[test]
fn unknown_extension_requires_from() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("page.txt");
    fs::write(&input, "<p>plain</p>").unwrap();

    let mut cmd = cargo_bin_cmd!("cfdoc");
    cmd.arg("convert").arg(&input).arg("--to").arg("markdown");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Could not detect format"));
}

#[test]
fn json_cannot_be_a_source() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("dump.json");
    fs::write(&input, "{}").unwrap();

    let mut cmd = cargo_bin_cmd!("cfdoc");
    cmd.arg("convert").arg(&input).arg("--to").arg("markdown");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("does not support parsing"));
}

#[test]
fn unknown_target_format_fails() {
    let mut cmd = cargo_bin_cmd!("cfdoc");
    cmd.arg("convert")
        .arg(fixture_path("kitchensink.xhtml"))
        .arg("--to")
        .arg("pdf");

    cmd.assert().failure().stderr(predicate::str::contains("pdf"));
}

#[test]
fn convert_to_json_dumps_ast() {
    let mut cmd = cargo_bin_cmd!("cfdoc");
    cmd.arg(fixture_path("kitchensink.xhtml"))
        .arg("--to")
        .arg("json");

    let output = cmd.assert().success().get_output().stdout.clone();
    let value: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(value["children"][0]["type"], "Heading");
    assert!(value["original_source"].is_string());
}

#[test]
fn oversize_input_is_rejected() {
    let mut cmd = cargo_bin_cmd!("cfdoc");
    cmd.arg(fixture_path("kitchensink.xhtml"))
        .arg("--to")
        .arg("markdown")
        .arg("--extra-max-input-bytes")
        .arg("16");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Parse error"))
        .stderr(predicate::str::contains("byte limit"));
}

#[test]
fn list_formats_shows_directions() {
    let mut cmd = cargo_bin_cmd!("cfdoc");
    cmd.arg("--list-formats");

    cmd.assert().success().stdout(
        predicate::str::contains("storage")
            .and(predicate::str::contains("read/write"))
            .and(predicate::str::contains(".xhtml"))
            .and(predicate::str::contains("ast-treeviz")),
    );
}
