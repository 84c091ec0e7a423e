use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn folio_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("folio");
    path
}

fn run_folio(dir: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = folio_binary();
    let output = Command::new(&binary)
        .current_dir(dir)
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run folio binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

fn write_labels(dir: &Path, lines: &str) -> PathBuf {
    let path = dir.join("labels.txt");
    fs::write(&path, lines).unwrap();
    path
}

#[test]
fn pagelist_from_labels_file() {
    let tmp = TempDir::new().unwrap();
    write_labels(tmp.path(), "–\n–\n–\n1\n2\n3\n4\n");

    let (stdout, stderr, ok) =
        run_folio(tmp.path(), &["pagelist", "--labels-file", "labels.txt"]);
    assert!(ok, "pagelist failed: {}", stderr);
    assert_eq!(stdout, "<pagelist\n1to3=\"–\"\n4=1\n/>\n");
}

#[test]
fn pagelist_clean_up_borrows_blank_pages() {
    let tmp = TempDir::new().unwrap();
    write_labels(tmp.path(), "–\n–\n3\n4\n5\n");

    let (stdout, _, ok) = run_folio(tmp.path(), &["pagelist", "--labels-file", "labels.txt"]);
    assert!(ok);
    // the blank run is fully absorbed into the numbered one
    assert_eq!(stdout, "<pagelist\n1=1\n/>\n");

    // --raw shows the ranges exactly as scanned
    let (stdout, _, ok) = run_folio(
        tmp.path(),
        &["pagelist", "--labels-file", "labels.txt", "--raw"],
    );
    assert!(ok);
    assert_eq!(stdout, "<pagelist\n1to2=\"–\"\n3=3\n/>\n");
}

#[test]
fn pagelist_exclude_strips_and_renumbers() {
    let tmp = TempDir::new().unwrap();
    write_labels(tmp.path(), "1\n2\n3\n4\n5\n6\n");

    let (stdout, _, ok) = run_folio(
        tmp.path(),
        &["pagelist", "--labels-file", "labels.txt", "--exclude", "3"],
    );
    assert!(ok);
    assert_eq!(stdout, "<pagelist\n1=1\n3=4\n/>\n");
}

#[test]
fn pagelist_offset_forwards_to_tag() {
    let tmp = TempDir::new().unwrap();
    write_labels(tmp.path(), "–\n–\n1\n2\n");

    let (stdout, _, ok) = run_folio(
        tmp.path(),
        &["pagelist", "--labels-file", "labels.txt", "--offset", "2", "--raw"],
    );
    assert!(ok);
    assert_eq!(stdout, "<pagelist\n1to1=\"–\"\n1=1\n/>\n");
}

#[test]
fn pagelist_without_input_fails() {
    let tmp = TempDir::new().unwrap();
    let (_, stderr, ok) = run_folio(tmp.path(), &["pagelist"]);
    assert!(!ok);
    assert!(stderr.contains("--labels-file"), "stderr: {}", stderr);
}

#[test]
fn select_expands_expressions() {
    let tmp = TempDir::new().unwrap();

    let (stdout, _, ok) = run_folio(
        tmp.path(),
        &["select", "1,2,4-5,6+2,22-end", "--last", "24"],
    );
    assert!(ok);
    assert_eq!(stdout.trim(), "1 2 4 5 6 7 8 22 23 24");
}

#[test]
fn select_end_without_last_fails() {
    let tmp = TempDir::new().unwrap();
    let (_, stderr, ok) = run_folio(tmp.path(), &["select", "22-end"]);
    assert!(!ok);
    assert!(stderr.contains("last page"), "stderr: {}", stderr);
}

#[test]
fn index_from_work_file_and_labels() {
    let tmp = TempDir::new().unwrap();
    write_labels(tmp.path(), "–\nTitle\n1\n2\n3\n");

    fs::write(
        tmp.path().join("work.toml"),
        r#"title = "The History of Things"
author = "A. N. Author"
year = "1870"
language = "en"
"#,
    )
    .unwrap();

    let (stdout, stderr, ok) = run_folio(
        tmp.path(),
        &[
            "index",
            "--work-file",
            "work.toml",
            "--labels-file",
            "labels.txt",
        ],
    );
    assert!(ok, "index failed: {}", stderr);
    assert!(stdout.contains("{{:MediaWiki:Proofreadpage_index_template"));
    assert!(stdout.contains("|Title=[[The History of Things]]"));
    assert!(stdout.contains("|Author=A. N. Author"));
    assert!(stdout.contains("|Key=History of Things, The"));
    // the cover image defaults to the Title page's position
    assert!(stdout.contains("|Image=2"));
    assert!(stdout.contains("|Pages=<pagelist\n"));
}

#[test]
fn index_without_title_fails() {
    let tmp = TempDir::new().unwrap();
    write_labels(tmp.path(), "1\n2\n");

    let (_, stderr, ok) = run_folio(tmp.path(), &["index", "--labels-file", "labels.txt"]);
    assert!(!ok);
    assert!(stderr.contains("title"), "stderr: {}", stderr);
}

#[test]
fn config_file_is_honored() {
    let tmp = TempDir::new().unwrap();
    fs::create_dir(tmp.path().join("config")).unwrap();
    fs::write(
        tmp.path().join("config/folio.toml"),
        r#"[index]
default_progress = "C"
"#,
    )
    .unwrap();
    write_labels(tmp.path(), "1\n2\n");

    let (stdout, _, ok) = run_folio(
        tmp.path(),
        &[
            "index",
            "--title",
            "Plain Work",
            "--labels-file",
            "labels.txt",
        ],
    );
    assert!(ok);
    assert!(stdout.contains("|Progress=C"));
}

#[test]
fn malformed_config_is_rejected() {
    let tmp = TempDir::new().unwrap();
    fs::create_dir(tmp.path().join("config")).unwrap();
    fs::write(
        tmp.path().join("config/folio.toml"),
        r#"[hathi]
image_size = 0
"#,
    )
    .unwrap();

    let (_, stderr, ok) = run_folio(tmp.path(), &["sources"]);
    assert!(!ok);
    assert!(stderr.contains("image_size"), "stderr: {}", stderr);
}

#[test]
fn sources_lists_endpoints() {
    let tmp = TempDir::new().unwrap();
    let (stdout, _, ok) = run_folio(tmp.path(), &["sources"]);
    assert!(ok);
    assert!(stdout.contains("SOURCE"));
    assert!(stdout.contains("ia"));
    assert!(stdout.contains("hathi"));
}
