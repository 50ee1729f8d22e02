use std::fs;
use std::path::Path;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use catalogify::formats::ChapterRecord;

const NUMERIC_INDEX: &str = r#"<!doctype html>
<html>
  <head><title>测试之书 - 识典古籍</title></head>
  <body>
    <h1>测试之书</h1>
    <div class="reader-catalog-tree">
      <div class="semi-tree-option semi-tree-option-level-1"><a href="/book/N1/chapter/1">第一章 起</a></div>
      <div class="semi-tree-option semi-tree-option-level-1"><a href="/book/N1/chapter/2">第二章 承</a></div>
      <div class="semi-tree-option semi-tree-option-level-1"><a href="/book/N1/chapter/5">第五章 合</a></div>
    </div>
  </body>
</html>
"#;

const OPAQUE_INDEX: &str = r#"<!doctype html>
<html>
  <head><title>南华真经 - 识典古籍</title></head>
  <body>
    <h1>南华真经</h1>
    <div class="reader-catalog-tree">
      <div class="semi-tree-option semi-tree-option-level-1"><a href="/book/DZ1/chapter/1k1ro1v9">南华真经卷之一</a></div>
      <div class="semi-tree-option semi-tree-option-level-1"><a href="/book/DZ1/chapter/1k1rq2z3">南华真经卷之二</a></div>
    </div>
  </body>
</html>
"#;

/// The first volume's page expands its own subtree in the catalog.
const OPAQUE_VOLUME_ONE: &str = r#"<!doctype html>
<html>
  <head><title>南华真经卷之一 - 识典古籍</title></head>
  <body>
    <aside>
      <div class="reader-catalog-tree">
        <div class="semi-tree-option semi-tree-option-level-1"><a href="/book/DZ1/chapter/1k1ro1v9">南华真经卷之一</a></div>
        <div class="semi-tree-option semi-tree-option-level-2"><a href="/book/DZ1/chapter/1k1rs4x5">内篇逍遥游</a></div>
        <div class="semi-tree-option semi-tree-option-level-1"><a href="/book/DZ1/chapter/1k1rq2z3">南华真经卷之二</a></div>
      </div>
    </aside>
    <main class="read-layout-main">
      <article class="chapter-reader">
        <h1>南华真经卷之一</h1>
        <p>内篇逍遥游</p>
        <p>北冥有鱼，其名为鲲。鲲之大，不知其几千里也。</p>
      </article>
    </main>
  </body>
</html>
"#;

const OPAQUE_CHILD: &str = r#"<!doctype html>
<html>
  <head><title>内篇逍遥游 - 识典古籍</title></head>
  <body>
    <main class="read-layout-main">
      <article class="chapter-reader">
        <h1>内篇逍遥游</h1>
        <p>北冥有鱼，其名为鲲。鲲之大，不知其几千里也。</p>
      </article>
    </main>
  </body>
</html>
"#;

fn opaque_volume_two() -> String {
    let preamble = "外物不可必，故龙逢诛，比干戮，箕子狂，恶来死，桀纣亡。".repeat(5);
    format!(
        r#"<!doctype html>
<html>
  <head><title>南华真经卷之二 - 识典古籍</title></head>
  <body>
    <main class="read-layout-main">
      <article class="chapter-reader">
        <h1>南华真经卷之二</h1>
        <p>{preamble}</p>
        <p>杂篇外物</p>
        <p>人主莫不欲其臣之忠，而忠未必信。</p>
      </article>
    </main>
  </body>
</html>
"#
    )
}

fn numeric_chapter(title: &str) -> String {
    format!(
        r#"<!doctype html>
<html>
  <head><title>{title} - 识典古籍</title></head>
  <body>
    <article>
      <h1>{title}</h1>
      <p>{title}的正文。</p>
    </article>
  </body>
</html>
"#
    )
}

fn page(path: &str) -> Option<String> {
    let body = match path {
        "/book/N1" => NUMERIC_INDEX.to_owned(),
        "/book/N1/chapter/1" => numeric_chapter("第一章 起"),
        "/book/N1/chapter/2" => numeric_chapter("第二章 承"),
        "/book/N1/chapter/3" => numeric_chapter("第三章 转"),
        "/book/N1/chapter/4" => numeric_chapter("第四章 续"),
        "/book/N1/chapter/5" => numeric_chapter("第五章 合"),
        "/book/DZ1" => OPAQUE_INDEX.to_owned(),
        "/book/DZ1/chapter/1k1ro1v9" => OPAQUE_VOLUME_ONE.to_owned(),
        "/book/DZ1/chapter/1k1rs4x5" => OPAQUE_CHILD.to_owned(),
        "/book/DZ1/chapter/1k1rq2z3" => opaque_volume_two(),
        _ => return None,
    };
    Some(body)
}

fn spawn_site() -> (String, mpsc::Sender<()>, thread::JoinHandle<()>) {
    let server = tiny_http::Server::http("127.0.0.1:0").expect("start tiny_http server");
    let base_url = format!("http://{}", server.server_addr());

    let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

    let handle = thread::spawn(move || {
        loop {
            if shutdown_rx.try_recv().is_ok() {
                break;
            }

            let request = match server.recv_timeout(Duration::from_millis(50)) {
                Ok(Some(req)) => req,
                Ok(None) => continue,
                Err(_) => break,
            };

            let url = request.url().to_string();
            let path = url.split('?').next().unwrap_or(&url).to_owned();
            let response = match page(&path) {
                Some(body) => tiny_http::Response::from_string(body)
                    .with_header(
                        tiny_http::Header::from_bytes(
                            &b"Content-Type"[..],
                            &b"text/html; charset=utf-8"[..],
                        )
                        .expect("content-type header"),
                    )
                    .with_status_code(200),
                None => tiny_http::Response::from_string("not found").with_status_code(404),
            };
            let _ = request.respond(response);
        }
    });

    (base_url, shutdown_tx, handle)
}

fn read_records(out: &Path) -> Vec<ChapterRecord> {
    fs::read_to_string(out.join("chapters.jsonl"))
        .expect("read chapters.jsonl")
        .lines()
        .map(|line| serde_json::from_str(line).expect("parse chapter record"))
        .collect()
}

fn build(book_url: &str, out: &Path) {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("catalogify");
    cmd.args([
        "build",
        "--book",
        book_url,
        "--out",
        out.to_str().expect("utf-8 path"),
        "--delay-ms",
        "0",
    ])
    .assert()
    .success();
}

#[test]
fn numeric_gaps_are_probed_and_renumbered() {
    let (base_url, shutdown, handle) = spawn_site();
    let dir = tempfile::tempdir().expect("tempdir");
    let out = dir.path().join("n1");

    build(&format!("{base_url}/book/N1"), &out);

    let records = read_records(&out);
    let ids: Vec<&str> = records.iter().map(|r| r.identifier.as_str()).collect();
    assert_eq!(ids, vec!["1", "2", "3", "4", "5"]);
    let sequences: Vec<usize> = records.iter().map(|r| r.sequence).collect();
    assert_eq!(sequences, vec![1, 2, 3, 4, 5]);

    assert!(!records[1].discovered);
    assert!(records[2].discovered);
    assert_eq!(records[2].title, "第三章 转");
    assert_eq!(records[2].resolved_title, "第三章 转");
    assert_eq!(records[2].text_path.as_deref(), Some("text/03_第三章 转.txt"));

    let text = fs::read_to_string(out.join("text/03_第三章 转.txt")).expect("chapter text");
    assert_eq!(text, "第三章 转\n第三章 转的正文。");

    let book: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.join("book.json")).expect("book.json"))
            .expect("parse book.json");
    assert_eq!(book["title"], "测试之书");
    assert_eq!(book["pattern"]["patternType"], "sequential_numeric");

    let _ = shutdown.send(());
    let _ = handle.join();
}

#[test]
fn opaque_ids_walk_the_volume_page_and_trim_volume_bodies() {
    let (base_url, shutdown, handle) = spawn_site();
    let dir = tempfile::tempdir().expect("tempdir");
    let out = dir.path().join("dz1");

    build(&format!("{base_url}/book/DZ1"), &out);

    let records = read_records(&out);
    let ids: Vec<&str> = records.iter().map(|r| r.identifier.as_str()).collect();
    assert_eq!(ids, vec!["1k1ro1v9", "1k1rs4x5", "1k1rq2z3"]);

    // Volume one only repeats its child: structural node, no text.
    let volume_one = &records[0];
    assert!(volume_one.is_volume);
    assert_eq!(volume_one.content_type, None);
    assert_eq!(volume_one.text_path, None);

    let child = &records[1];
    assert!(child.discovered);
    assert_eq!(child.level, 2);
    assert_eq!(child.parent_identifier.as_deref(), Some("1k1ro1v9"));
    assert_eq!(
        serde_json::to_value(child.discovery_method).expect("serialize method"),
        "structural_walk"
    );
    assert_eq!(child.resolved_title, "内篇逍遥游");

    let volume_two = &records[2];
    assert_eq!(
        serde_json::to_value(volume_two.content_type).expect("serialize content type"),
        "volume_summary"
    );
    let summary_path = volume_two.text_path.as_deref().expect("summary path");
    let summary = fs::read_to_string(out.join(summary_path)).expect("summary text");
    assert!(summary.starts_with("南华真经卷之二\n外物不可必"));
    assert!(!summary.contains("杂篇外物"));
    assert!(!summary.contains("人主莫不欲其臣之忠"));

    let _ = shutdown.send(());
    let _ = handle.join();
}
