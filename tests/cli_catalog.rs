use predicates::prelude::*;

const CATALOG: &str = r#"<!doctype html>
<html>
  <body>
    <ul class="chapter-list">
      <li class="chapter-item level-1"><a href="/book/DZ0336/chapter/1k1ro1v9">度人经卷之一</a></li>
      <li class="chapter-item" style="padding-left: 28px"><a href="/book/DZ0336/chapter/1k1rs4x5">开度品第一</a></li>
      <li class="chapter-item level-1"><a href="/book/DZ0336/chapter/1k1rq2z3">度人经卷之二</a></li>
    </ul>
  </body>
</html>
"#;

#[test]
fn catalog_prints_stubs_and_classification() {
    let dir = tempfile::tempdir().expect("tempdir");
    let html = dir.path().join("index.html");
    std::fs::write(&html, CATALOG).expect("write html");

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("catalogify");
    cmd.args([
        "catalog",
        "--html",
        html.to_str().expect("utf-8 path"),
        "--base-url",
        "http://site.test",
    ])
    .assert()
    .success()
    .stdout(predicate::str::contains(
        r#""url":"http://site.test/book/DZ0336/chapter/1k1rs4x5""#,
    ))
    .stdout(predicate::str::contains(r#""parentIdentifier":"1k1ro1v9""#))
    .stdout(predicate::str::contains(r#""patternType":"random_string""#))
    .stdout(predicate::str::contains(r#""recommendedStrategy":"structural_walk""#));
}

#[test]
fn catalog_without_tree_falls_back_to_links() {
    let dir = tempfile::tempdir().expect("tempdir");
    let html = dir.path().join("flat.html");
    std::fs::write(
        &html,
        r#"<p><a href="/book/B/chapter/1">第一章 起</a> <a href="/book/B/chapter/2">第二章 承</a></p>"#,
    )
    .expect("write html");

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("catalogify");
    cmd.args(["catalog", "--html", html.to_str().expect("utf-8 path")])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""identifier":"2""#))
        .stdout(predicate::str::contains(r#""patternType":"sequential_numeric""#))
        .stderr(predicate::str::contains("flat chapter-link extraction"));
}

#[test]
fn build_rejects_invalid_book_reference() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("catalogify");
    cmd.args([
        "build",
        "--book",
        "not/a/book",
        "--out",
        dir.path().join("out").to_str().expect("utf-8 path"),
    ])
    .assert()
    .failure()
    .stderr(predicate::str::contains("invalid book id"));
}

#[test]
fn rust_log_debug_emits_debug_line_to_stderr() {
    let dir = tempfile::tempdir().expect("tempdir");
    let html = dir.path().join("index.html");
    std::fs::write(&html, CATALOG).expect("write html");

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("catalogify");
    cmd.env("RUST_LOG", "debug")
        .args(["catalog", "--html", html.to_str().expect("utf-8 path")])
        .assert()
        .success()
        .stderr(predicate::str::contains("parsed cli"));
}
