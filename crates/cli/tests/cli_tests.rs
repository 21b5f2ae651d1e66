//! CLI integration tests
use predicates::prelude::*;
use tempfile::TempDir;

fn cmd() -> assert_cmd::Command {
    assert_cmd::cargo::cargo_bin_cmd!("postscope")
}

fn get_fixture_path(name: &str) -> String {
    format!("../../tests/fixtures/{}", name)
}

fn get_feed_fixture_path(name: &str) -> String {
    format!("../../tests/fixtures/feeds/{}", name)
}

fn stdout_json(output: &std::process::Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

#[test]
fn test_cli_parse_file() {
    let output = cmd()
        .args(["parse", "--url", "https://notes.example.com/feed.xml", &get_feed_fixture_path("rss.xml")])
        .output()
        .unwrap();

    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json["data"]["type"], "feed");
    assert_eq!(json["url"], "https://notes.example.com/feed.xml");
    assert_eq!(json["source-format"], "xml");
    assert_eq!(json["code"], 200);
    assert_eq!(json["data"]["items"].as_array().unwrap().len(), 4);
}

#[test]
fn test_cli_parse_stdin() {
    let xml = std::fs::read_to_string(get_feed_fixture_path("atom.xml")).unwrap();
    let output = cmd()
        .args(["parse", "--url", "https://workshop.example.org/feed.atom", "-"])
        .write_stdin(xml)
        .output()
        .unwrap();

    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json["data"]["items"][0]["name"], "Sharpening chisels");
    assert_eq!(json["data"]["items"][0]["author"]["name"], "Sam Rivera");
}

#[test]
fn test_cli_parse_status() {
    let output = cmd()
        .args(["parse", "--status", "203", &get_feed_fixture_path("atom.xml")])
        .output()
        .unwrap();

    assert_eq!(stdout_json(&output)["code"], 203);
}

#[test]
fn test_cli_parse_without_url_uses_file_url() {
    let output = cmd().args(["parse", &get_feed_fixture_path("atom.xml")]).output().unwrap();

    let json = stdout_json(&output);
    assert!(json["url"].as_str().unwrap().starts_with("file://"));
}

#[test]
fn test_cli_parse_pretty() {
    cmd()
        .args(["parse", "--pretty", &get_feed_fixture_path("atom.xml")])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("{\n"));
}

#[test]
fn test_cli_parse_invalid_feed() {
    let output = cmd().args(["parse", &get_feed_fixture_path("not_a_feed.xml")]).output().unwrap();

    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json["error"], "invalid_xml");
    assert!(json.get("data").is_none());
}

#[test]
fn test_cli_parse_embeds() {
    let path = get_feed_fixture_path("rss.xml");

    cmd()
        .args(["parse", &path])
        .assert()
        .success()
        .stdout(predicate::str::contains("youtube.com/embed").not());

    cmd()
        .args(["parse", "--allow-embeds", &path])
        .assert()
        .success()
        .stdout(predicate::str::contains("https://www.youtube.com/embed/abc123"));

    cmd()
        .args(["parse", "--allow-embeds", "--embed-provider", "player.vimeo.com/video/", &path])
        .assert()
        .success()
        .stdout(predicate::str::contains("youtube.com/embed").not());
}

#[test]
fn test_cli_parse_output_file() {
    let tmp = TempDir::new().unwrap();
    let output = tmp.path().join("result.json");

    cmd()
        .args(["parse", "-o", output.to_str().unwrap(), &get_feed_fixture_path("rss.xml")])
        .assert()
        .success()
        .stderr(predicate::str::contains("Output written to"));

    let written = std::fs::read_to_string(&output).unwrap();
    let json: serde_json::Value = serde_json::from_str(&written).unwrap();
    assert_eq!(json["data"]["type"], "feed");
}

#[test]
fn test_cli_sanitize() {
    cmd()
        .args(["sanitize", &get_fixture_path("html/untrusted.html")])
        .assert()
        .success()
        .stdout(predicate::str::contains("<strong>bold</strong>"))
        .stdout(predicate::str::contains("<script").not())
        .stdout(predicate::str::contains("onclick").not())
        .stdout(predicate::str::contains("<iframe").not())
        .stdout(predicate::str::contains(r#"<img src="photo.png""#));
}

#[test]
fn test_cli_sanitize_base_url() {
    cmd()
        .args(["sanitize", "--base-url", "https://blog.example.com/post/", &get_fixture_path("html/untrusted.html")])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#"href="https://blog.example.com/relative/page""#));
}

#[test]
fn test_cli_sanitize_no_images() {
    cmd()
        .args(["sanitize", "--no-images", &get_fixture_path("html/untrusted.html")])
        .assert()
        .success()
        .stdout(predicate::str::contains("<img").not());
}

#[test]
fn test_cli_sanitize_allow_embeds() {
    cmd()
        .args(["sanitize", "--allow-embeds", &get_fixture_path("html/untrusted.html")])
        .assert()
        .success()
        .stdout(predicate::str::contains("https://player.vimeo.com/video/42"))
        .stdout(predicate::str::contains("evil.example").not());
}

#[test]
fn test_cli_sanitize_embed_provider() {
    cmd()
        .args([
            "sanitize",
            "--allow-embeds",
            "--embed-provider",
            "www.youtube.com/embed/",
            &get_fixture_path("html/untrusted.html"),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("player.vimeo.com").not())
        .stdout(predicate::str::contains("<iframe").not());
}

#[test]
fn test_cli_sanitize_text() {
    cmd()
        .args(["sanitize", "--text", &get_fixture_path("html/untrusted.html")])
        .assert()
        .success()
        .stdout(predicate::str::contains("Some bold text & more."))
        .stdout(predicate::str::contains("<p").not());
}

#[test]
fn test_cli_sanitize_stdin() {
    cmd()
        .args(["sanitize", "-"])
        .write_stdin(r#"<div class="h-entry extra"><b>Hi</b></div>"#)
        .assert()
        .success()
        .stdout(predicate::str::contains(r#"<p class="h-entry"><b>Hi</b></p>"#));
}

#[test]
fn test_cli_invalid_file() {
    cmd().args(["parse", "nonexistent.xml"]).assert().failure();
    cmd().args(["sanitize", "nonexistent.html"]).assert().failure();
}

#[test]
fn test_cli_missing_subcommand() {
    cmd().assert().failure();
}

#[test]
fn test_cli_verbose() {
    cmd()
        .args(["parse", "-v", &get_feed_fixture_path("rss.xml")])
        .assert()
        .success()
        .stderr(predicate::str::contains("Postscope"))
        .stderr(predicate::str::contains("Items:"));
}

#[test]
fn test_cli_help() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("parse"))
        .stdout(predicate::str::contains("sanitize"));
}
