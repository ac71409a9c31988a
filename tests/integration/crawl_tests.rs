//! End-to-end crawl behavior over HTTP

use linkprobe::{check, CheckOptions, LinkState, LinksToSkip};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/html")
}

fn options(seed: String) -> CheckOptions {
    CheckOptions {
        path: vec![seed],
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

#[tokio::test]
async fn test_recursion_same_origin_only() {
    let site = MockServer::start().await;
    let other = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/a.html"))
        .respond_with(html(&format!(
            r#"<a href="/b.html">b</a> <a href="{}/c.html">c</a>"#,
            other.uri()
        )))
        .mount(&site)
        .await;
    Mock::given(method("GET"))
        .and(path("/b.html"))
        .respond_with(html("no links here"))
        .mount(&site)
        .await;

    // c is off-origin: it gets fetched once but never recursed into
    Mock::given(method("HEAD"))
        .and(path("/c.html"))
        .respond_with(ResponseTemplate::new(200).insert_header("content-type", "text/html"))
        .mount(&other)
        .await;
    Mock::given(method("GET"))
        .and(path("/d.html"))
        .respond_with(html(""))
        .expect(0)
        .mount(&other)
        .await;

    let result = check(CheckOptions {
        recurse: true,
        ..options(format!("{}/a.html", site.uri()))
    })
    .await
    .unwrap();

    assert!(result.passed);
    assert_eq!(result.links.len(), 3);
    assert_eq!(find(&result, "/a.html").state, LinkState::Ok);
    assert_eq!(find(&result, "/b.html").state, LinkState::Ok);
    assert_eq!(find(&result, "/c.html").state, LinkState::Ok);
}

#[tokio::test]
async fn test_broken_link_reported_with_details() {
    let site = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(r#"<a href="/missing">gone</a>"#))
        .mount(&site)
        .await;
    Mock::given(method("HEAD"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&site)
        .await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("nope"))
        .mount(&site)
        .await;

    let seed = format!("{}/", site.uri());
    let result = check(options(seed.clone())).await.unwrap();

    assert!(!result.passed);
    let broken = find(&result, "/missing");
    assert_eq!(broken.state, LinkState::Broken);
    assert_eq!(broken.status, Some(404));
    assert_eq!(broken.parent.as_deref(), Some(seed.as_str()));
    assert!(!broken.failure_details.is_empty());
    assert_eq!(broken.failure_details[0].status, Some(404));
}

#[tokio::test]
async fn test_depth_limited_without_recurse() {
    let site = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(r#"<a href="/child">child</a>"#))
        .mount(&site)
        .await;
    Mock::given(method("HEAD"))
        .and(path("/child"))
        .respond_with(ResponseTemplate::new(200).insert_header("content-type", "text/html"))
        .mount(&site)
        .await;
    // Without recursion the child document is status-checked, not parsed
    Mock::given(method("GET"))
        .and(path("/child"))
        .respond_with(html(r#"<a href="/grandchild">x</a>"#))
        .expect(0)
        .mount(&site)
        .await;

    let result = check(options(format!("{}/", site.uri()))).await.unwrap();

    assert!(result.passed);
    assert_eq!(result.links.len(), 2);
}

#[tokio::test]
async fn test_skip_by_regex_issues_no_request() {
    let site = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(r#"<a href="https://skip.example/foo">skipped</a>"#))
        .mount(&site)
        .await;

    let result = check(CheckOptions {
        links_to_skip: LinksToSkip::Patterns(vec![r"^https://skip\.".to_string()]),
        ..options(format!("{}/", site.uri()))
    })
    .await
    .unwrap();

    assert!(result.passed);
    let skipped = find(&result, "skip.example/foo");
    assert_eq!(skipped.state, LinkState::Skipped);
    assert_eq!(skipped.status, None);
}

#[tokio::test]
async fn test_special_schemes_always_skipped() {
    let site = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(
            r#"<a href="mailto:a@b.c">m</a>
               <a href="tel:+1555">t</a>
               <a href="javascript:void(0)">j</a>
               <a href="data:text/plain,x">d</a>
               <a href="/real">r</a>"#,
        ))
        .mount(&site)
        .await;
    Mock::given(method("HEAD"))
        .and(path("/real"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&site)
        .await;

    let result = check(options(format!("{}/", site.uri()))).await.unwrap();

    assert!(result.passed);
    let skipped: Vec<_> = result
        .links
        .iter()
        .filter(|l| l.state == LinkState::Skipped)
        .collect();
    assert_eq!(skipped.len(), 4);
    assert!(skipped.iter().all(|l| l.status.is_none()));
}

#[tokio::test]
async fn test_url_rewrite_applied_to_seed_and_links() {
    let site = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(r#"<a href="http://legacy/page1">p1</a>"#))
        .mount(&site)
        .await;
    Mock::given(method("HEAD"))
        .and(path("/page1"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&site)
        .await;

    let rewritten_base = format!("{}/", site.uri());
    let result = check(CheckOptions {
        url_rewrites: vec![linkprobe::UrlRewriteRule {
            pattern: regex::Regex::new("^http://legacy/").unwrap(),
            replacement: rewritten_base.clone(),
        }],
        // The seed itself goes through the rewrite rules
        ..options("http://legacy/".to_string())
    })
    .await
    .unwrap();

    assert!(result.passed, "links: {:?}", result.links);
    assert_eq!(result.links.len(), 2);
    assert!(result.links.iter().all(|l| !l.url.contains("legacy")));
    let page1 = find(&result, "/page1");
    assert_eq!(page1.state, LinkState::Ok);
}

#[tokio::test]
async fn test_duplicate_and_fragment_links_deduped() {
    let site = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(
            r#"<a href="/x">1</a> <a href="/x#top">2</a> <a href="/x">3</a>"#,
        ))
        .mount(&site)
        .await;
    Mock::given(method("HEAD"))
        .and(path("/x"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&site)
        .await;

    let result = check(options(format!("{}/", site.uri()))).await.unwrap();

    assert_eq!(result.links.len(), 2);

    // URLs are pairwise distinct after normalization
    let mut urls: Vec<&str> = result.links.iter().map(|l| l.url.as_str()).collect();
    urls.sort();
    urls.dedup();
    assert_eq!(urls.len(), result.links.len());
}

#[tokio::test]
async fn test_timeout_finalizes_as_broken() {
    let site = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(html("late").set_delay(std::time::Duration::from_secs(5)))
        .mount(&site)
        .await;

    let result = check(CheckOptions {
        timeout: 100,
        ..options(format!("{}/slow", site.uri()))
    })
    .await
    .unwrap();

    assert!(!result.passed);
    let slow = find(&result, "/slow");
    assert_eq!(slow.state, LinkState::Broken);
    assert_eq!(slow.status, None);
    assert!(slow.failure_details[0]
        .message
        .as_deref()
        .unwrap_or_default()
        .contains("timed out"));
}

#[tokio::test]
async fn test_head_rejected_falls_back_to_get() {
    let site = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(r#"<a href="/head-hostile">x</a>"#))
        .mount(&site)
        .await;
    Mock::given(method("HEAD"))
        .and(path("/head-hostile"))
        .respond_with(ResponseTemplate::new(405))
        .mount(&site)
        .await;
    Mock::given(method("GET"))
        .and(path("/head-hostile"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&site)
        .await;

    let result = check(options(format!("{}/", site.uri()))).await.unwrap();

    assert!(result.passed);
    assert_eq!(find(&result, "/head-hostile").status, Some(200));
}

#[tokio::test]
async fn test_srcset_and_asset_links_checked() {
    let site = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(
            r#"<img src="/logo.png" srcset="/small.png 1x, /big.png 2x">
               <script src="/app.js"></script>"#,
        ))
        .mount(&site)
        .await;
    for asset in ["/logo.png", "/small.png", "/big.png", "/app.js"] {
        Mock::given(method("HEAD"))
            .and(path(asset))
            .respond_with(ResponseTemplate::new(200))
            .mount(&site)
            .await;
    }

    let result = check(options(format!("{}/", site.uri()))).await.unwrap();

    assert!(result.passed);
    assert_eq!(result.links.len(), 5);
}

#[tokio::test]
async fn test_concurrency_one_still_covers_everything() {
    let site = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(
            r#"<a href="/a">a</a> <a href="/b">b</a> <a href="/c">c</a>"#,
        ))
        .mount(&site)
        .await;
    for p in ["/a", "/b", "/c"] {
        Mock::given(method("HEAD"))
            .and(path(p))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&site)
            .await;
    }

    let result = check(CheckOptions {
        concurrency: 1,
        ..options(format!("{}/", site.uri()))
    })
    .await
    .unwrap();

    assert!(result.passed);
    assert_eq!(result.links.len(), 4);
}

#[tokio::test]
async fn test_idempotent_against_deterministic_target() {
    let site = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(r#"<a href="/a">a</a> <a href="/b">b</a>"#))
        .mount(&site)
        .await;
    for p in ["/a", "/b"] {
        Mock::given(method("HEAD"))
            .and(path(p))
            .respond_with(ResponseTemplate::new(200))
            .mount(&site)
            .await;
    }

    let first = check(options(format!("{}/", site.uri()))).await.unwrap();
    let second = check(options(format!("{}/", site.uri()))).await.unwrap();

    let mut first_urls: Vec<(String, LinkState)> = first
        .links
        .iter()
        .map(|l| (l.url.clone(), l.state))
        .collect();
    let mut second_urls: Vec<(String, LinkState)> = second
        .links
        .iter()
        .map(|l| (l.url.clone(), l.state))
        .collect();
    first_urls.sort();
    second_urls.sort();
    assert_eq!(first_urls, second_urls);
}
