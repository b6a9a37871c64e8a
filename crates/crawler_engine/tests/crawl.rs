use std::fs;
use std::sync::Arc;
use std::time::Duration;

use crawler_engine::{derived_name, CrawlConfig, CrawlError, CrawlState, Crawler, FetchSettings};
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer, root: &TempDir) -> CrawlConfig {
    CrawlConfig {
        base_url: format!("{}/", server.uri()),
        output_root: root.path().to_path_buf(),
        period: Duration::from_millis(10),
        fetch: FetchSettings {
            attempt_timeout: Duration::from_millis(200),
            max_attempts: 2,
            max_concurrency: None,
        },
    }
}

fn listing_html(entries: &[(&str, &str)]) -> String {
    let mut html = String::from("<html><body><table>");
    for (id, url) in entries {
        html.push_str(&format!(
            "<tr class='athing' id='{id}'><td>\
             <a href=\"{url}\" class=\"storylink\">story {id}</a></td></tr>"
        ));
    }
    html.push_str("</table></body></html>");
    html
}

#[tokio::test]
async fn tick_downloads_story_and_comment_links() {
    let server = MockServer::start().await;
    let story_url = format!("{}/x", server.uri());
    let link_url = format!("{}/y", server.uri());

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(listing_html(&[("1", story_url.as_str())]), "text/html"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/x"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<html>story</html>", "text/html"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/item"))
        .and(query_param("id", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            format!(
                "<span class=\"commtext c00\">see \
                 <a href=\"{link_url}\" rel=\"nofollow\">this</a></span>"
            ),
            "text/html",
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/y"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<html>linked</html>", "text/html"))
        .mount(&server)
        .await;

    let root = TempDir::new().unwrap();
    let crawler = Arc::new(Crawler::new(config_for(&server, &root)).unwrap());

    let summary = crawler.run_tick(1).await.unwrap();
    assert_eq!(summary.job_id, 1);
    assert_eq!(summary.downloaded, 2);
    assert!(summary.errors.is_empty());

    // Both pages land in the folder derived from the story URL.
    let folder = root.path().join(derived_name(&story_url));
    assert!(folder.join(derived_name(&story_url)).is_file());
    assert!(folder.join(derived_name(&link_url)).is_file());
    assert_eq!(fs::read_dir(&folder).unwrap().count(), 2);

    // A second tick sees only known URLs and downloads nothing new.
    let summary = crawler.run_tick(2).await.unwrap();
    assert_eq!(summary.downloaded, 0);
    assert_eq!(fs::read_dir(&folder).unwrap().count(), 2);
}

#[tokio::test]
async fn unreachable_listing_fails_the_tick_only() {
    // No mocks: the listing request gets an empty 404 without a content
    // type, which cannot be parsed as a listing.
    let server = MockServer::start().await;
    let root = TempDir::new().unwrap();
    let crawler = Arc::new(Crawler::new(config_for(&server, &root)).unwrap());

    let err = crawler.run_tick(1).await.unwrap_err();
    assert!(matches!(err, CrawlError::Listing(_)));

    // The scheduler retries on the next period with a fresh job.
    let err = crawler.run_tick(2).await.unwrap_err();
    assert!(matches!(err, CrawlError::Listing(_)));
}

#[tokio::test]
async fn blacklisted_story_is_never_fetched_again() {
    let server = MockServer::start().await;
    let bad_url = format!("{}/bad", server.uri());

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(listing_html(&[("9", bad_url.as_str())]), "text/html"),
        )
        .mount(&server)
        .await;
    // Slower than the per-attempt timeout: every attempt times out.
    Mock::given(method("GET"))
        .and(path("/bad"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(500))
                .set_body_raw("<html>late</html>", "text/html"),
        )
        .mount(&server)
        .await;

    let root = TempDir::new().unwrap();
    let mut config = config_for(&server, &root);
    config.fetch.attempt_timeout = Duration::from_millis(50);
    let crawler = Arc::new(Crawler::new(config).unwrap());

    let summary = crawler.run_tick(1).await.unwrap();
    assert_eq!(summary.downloaded, 0);
    assert_eq!(summary.errors.len(), 1);
    assert_eq!(summary.errors[0].0, bad_url);
    assert!(crawler.state().is_blacklisted(&bad_url));

    let requests_after_first = requests_to(&server, "/bad").await;
    assert_eq!(requests_after_first, 2, "one per configured attempt");

    // The next tick lists the same story but must skip the blacklisted URL.
    let summary = crawler.run_tick(2).await.unwrap();
    assert_eq!(summary.downloaded, 0);
    assert_eq!(requests_to(&server, "/bad").await, requests_after_first);
}

async fn requests_to(server: &MockServer, path: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.url.path() == path)
        .count()
}

#[test]
#[should_panic(expected = "consumed twice")]
fn job_counter_is_one_shot() {
    let state = CrawlState::new();
    state.open_job(42);
    assert_eq!(state.take_job_count(42), 0);
    state.take_job_count(42);
}
