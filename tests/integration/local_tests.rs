//! Filesystem seeds and the built-in static server

use linkprobe::{check, CheckOptions, LinkState};
use std::path::Path;
use tempfile::TempDir;

fn options(seed: &Path) -> CheckOptions {
    CheckOptions {
        path: vec![seed.to_string_lossy().into_owned()],
        ..Default::default()
    }
}

fn find<'a>(result: &'a linkprobe::CrawlResult, suffix: &str) -> &'a linkprobe::LinkResult {
    result
        .links
        .iter()
        .find(|l| l.url.ends_with(suffix))
        .unwrap_or_else(|| panic!("no link ending in {suffix}: {:?}", result.links))
}

/// Markdown fixture referencing one existing and one missing image
fn markdown_fixture() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("readme.md"),
        "# Readme\n\n![exists](./exists.png)\n![missing](./missing.png)\n",
    )
    .unwrap();
    std::fs::write(dir.path().join("exists.png"), b"\x89PNG\r\n").unwrap();
    dir
}

#[tokio::test]
async fn test_markdown_seed_with_missing_asset() {
    let dir = markdown_fixture();

    let result = check(CheckOptions {
        markdown: true,
        ..options(&dir.path().join("readme.md"))
    })
    .await
    .unwrap();

    assert!(!result.passed);
    // Seed plus its two referenced images
    assert_eq!(result.links.len(), 3);

    assert_eq!(find(&result, "/readme.md").state, LinkState::Ok);
    assert_eq!(find(&result, "/exists.png").state, LinkState::Ok);

    let missing = find(&result, "/missing.png");
    assert_eq!(missing.state, LinkState::Broken);
    assert_eq!(missing.status, Some(404));
    assert!(missing
        .parent
        .as_deref()
        .unwrap_or_default()
        .ends_with("/readme.md"));
}

#[tokio::test]
async fn test_markdown_not_extracted_without_option() {
    let dir = markdown_fixture();

    let result = check(options(&dir.path().join("readme.md"))).await.unwrap();

    // The seed is served and status-checked, but its body is not parsed
    assert!(result.passed);
    assert_eq!(result.links.len(), 1);
}

#[tokio::test]
async fn test_html_seed_with_relative_links() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("index.html"),
        r#"<a href="./other.html">other</a> <a href="./nope.html">nope</a>"#,
    )
    .unwrap();
    std::fs::write(dir.path().join("other.html"), "<p>here</p>").unwrap();

    let result = check(options(&dir.path().join("index.html"))).await.unwrap();

    assert!(!result.passed);
    assert_eq!(find(&result, "/other.html").state, LinkState::Ok);
    assert_eq!(find(&result, "/nope.html").status, Some(404));
}

#[tokio::test]
async fn test_directory_seed_with_listing() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a.html"), "<p>a</p>").unwrap();
    std::fs::write(dir.path().join("b.txt"), "b").unwrap();

    let result = check(CheckOptions {
        directory_listing: true,
        recurse: true,
        ..options(dir.path())
    })
    .await
    .unwrap();

    assert!(result.passed, "links: {:?}", result.links);
    // Listing page plus both entries
    assert_eq!(result.links.len(), 3);
    assert_eq!(find(&result, "/a.html").state, LinkState::Ok);
    assert_eq!(find(&result, "/b.txt").state, LinkState::Ok);
}

#[tokio::test]
async fn test_directory_seed_without_listing_is_broken() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a.html"), "<p>a</p>").unwrap();

    let result = check(options(dir.path())).await.unwrap();

    assert!(!result.passed);
    assert_eq!(result.links.len(), 1);
    assert_eq!(result.links[0].status, Some(404));
}

#[tokio::test]
async fn test_server_root_override() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("docs")).unwrap();
    std::fs::write(
        dir.path().join("docs/page.html"),
        r#"<a href="/top.txt">top</a>"#,
    )
    .unwrap();
    std::fs::write(dir.path().join("top.txt"), "top-level").unwrap();

    let result = check(CheckOptions {
        server_root: Some(dir.path().to_path_buf()),
        ..options(&dir.path().join("docs/page.html"))
    })
    .await
    .unwrap();

    assert!(result.passed, "links: {:?}", result.links);
    let seed = find(&result, "/docs/page.html");
    assert_eq!(seed.state, LinkState::Ok);
    assert_eq!(find(&result, "/top.txt").state, LinkState::Ok);
}

#[tokio::test]
async fn test_file_url_target_checked_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let present = dir.path().join("present.txt");
    std::fs::write(&present, "x").unwrap();
    let absent = dir.path().join("absent.txt");

    std::fs::write(
        dir.path().join("index.html"),
        format!(
            r#"<a href="file://{}">present</a> <a href="file://{}">absent</a>"#,
            present.display(),
            absent.display()
        ),
    )
    .unwrap();

    let result = check(options(&dir.path().join("index.html"))).await.unwrap();

    assert!(!result.passed);
    assert_eq!(find(&result, "/present.txt").state, LinkState::Ok);
    let broken = find(&result, "/absent.txt");
    assert_eq!(broken.state, LinkState::Broken);
    assert_eq!(broken.status, Some(404));
}

#[tokio::test]
async fn test_mixed_local_and_remote_seeds() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("page.html"), "<p>local</p>").unwrap();

    let remote = wiremock::MockServer::start().await;
    wiremock::Mock::given(wiremock::matchers::method("GET"))
        .respond_with(
            wiremock::ResponseTemplate::new(200).insert_header("content-type", "text/html"),
        )
        .mount(&remote)
        .await;

    let result = check(CheckOptions {
        path: vec![
            dir.path().join("page.html").to_string_lossy().into_owned(),
            format!("{}/", remote.uri()),
        ],
        ..Default::default()
    })
    .await
    .unwrap();

    assert!(result.passed);
    assert_eq!(result.links.len(), 2);
    assert!(result.links.iter().all(|l| l.state == LinkState::Ok));
}
