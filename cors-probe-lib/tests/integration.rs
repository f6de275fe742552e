// cors-probe-lib/tests/integration.rs

//! Probe behaviour against local mock servers.

use cors_probe_lib::{origin_candidates, CheckConfig, CorsChecker, Finding, DEFAULT_USER_AGENT};
use std::time::Duration;
use tokio::sync::mpsc;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

const DOMAIN: &str = "example.com";

fn checker() -> CorsChecker {
    CorsChecker::with_config(CheckConfig::default().with_domain(DOMAIN)).expect("checker")
}

fn reflecting(origin: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("Access-Control-Allow-Origin", origin)
        .set_body_string("{}")
}

fn sent_origins(requests: &[Request]) -> Vec<String> {
    requests
        .iter()
        .map(|r| {
            r.headers
                .get("origin")
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string()
        })
        .collect()
}

#[tokio::test]
async fn test_stops_after_first_reflected_candidate() {
    let mock_server = MockServer::start().await;
    let candidates = origin_candidates(DOMAIN);

    Mock::given(method("GET"))
        .and(header("Origin", candidates[0].as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_string("plain"))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(header("Origin", candidates[1].as_str()))
        .respond_with(reflecting(&candidates[1]))
        .expect(1)
        .mount(&mock_server)
        .await;

    // Anything else would be candidates 3-5.
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .with_priority(10)
        .expect(0)
        .mount(&mock_server)
        .await;

    let url = format!("{}/api/me", mock_server.uri());
    let finding = checker().check_url(&url).await.expect("valid url");

    assert_eq!(
        finding,
        Some(Finding {
            url: url.clone(),
            origin: "https://asdfexample.com".to_string(),
        })
    );
}

#[tokio::test]
async fn test_tries_all_candidates_in_order_without_reflection() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200).insert_header("Access-Control-Allow-Origin", "https://example.com"),
        )
        .expect(5)
        .mount(&mock_server)
        .await;

    let finding = checker().check_url(&mock_server.uri()).await.expect("valid url");
    assert_eq!(finding, None);

    let requests = mock_server.received_requests().await.expect("recording enabled");
    assert_eq!(
        sent_origins(&requests),
        vec![
            "https://asdf.com",
            "https://asdfexample.com",
            "https://example.comasdf.com",
            "null",
            "https://asdf.example.comasdf.com",
        ]
    );
}

#[tokio::test]
async fn test_wildcard_is_not_a_reflection() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).insert_header("Access-Control-Allow-Origin", "*"))
        .expect(5)
        .mount(&mock_server)
        .await;

    let finding = checker().check_url(&mock_server.uri()).await.expect("valid url");
    assert_eq!(finding, None);
}

#[tokio::test]
async fn test_null_origin_reflection() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(header("Origin", "null"))
        .respond_with(reflecting("null"))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403))
        .with_priority(10)
        .expect(3)
        .mount(&mock_server)
        .await;

    let finding = checker().check_url(&mock_server.uri()).await.expect("valid url");
    assert_eq!(finding.map(|f| f.origin), Some("null".to_string()));
}

#[tokio::test]
async fn test_cookie_and_user_agent_on_every_request() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(10)
        .mount(&mock_server)
        .await;

    let config = CheckConfig::default()
        .with_domain(DOMAIN)
        .with_cookies("session=abc; theme=dark");
    let checker = CorsChecker::with_config(config).expect("checker");

    for p in ["/one", "/two"] {
        let url = format!("{}{}", mock_server.uri(), p);
        assert_eq!(checker.check_url(&url).await.expect("valid url"), None);
    }

    let requests = mock_server.received_requests().await.expect("recording enabled");
    assert_eq!(requests.len(), 10);
    for request in &requests {
        assert_eq!(
            request.headers.get("cookie").and_then(|v| v.to_str().ok()),
            Some("session=abc; theme=dark")
        );
        assert_eq!(
            request.headers.get("user-agent").and_then(|v| v.to_str().ok()),
            Some(DEFAULT_USER_AGENT)
        );
    }
}

#[tokio::test]
async fn test_no_cookie_header_without_cookies() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    checker().check_url(&mock_server.uri()).await.expect("valid url");

    let requests = mock_server.received_requests().await.expect("recording enabled");
    assert_eq!(requests.len(), 5);
    assert!(requests.iter().all(|r| r.headers.get("cookie").is_none()));
}

#[tokio::test]
async fn test_timeout_skips_only_the_slow_candidate() {
    let mock_server = MockServer::start().await;
    let candidates = origin_candidates(DOMAIN);

    Mock::given(method("GET"))
        .and(header("Origin", candidates[0].as_str()))
        .respond_with(reflecting(&candidates[0]).set_delay(Duration::from_secs(3)))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(header("Origin", candidates[2].as_str()))
        .respond_with(reflecting(&candidates[2]))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .with_priority(10)
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = CheckConfig::default()
        .with_domain(DOMAIN)
        .with_timeout(Duration::from_millis(300));
    let checker = CorsChecker::with_config(config).expect("checker");

    let finding = checker.check_url(&mock_server.uri()).await.expect("valid url");
    assert_eq!(
        finding.map(|f| f.origin),
        Some("https://example.comasdf.com".to_string())
    );
}

#[tokio::test]
async fn test_unreachable_host_yields_no_finding() {
    // Port 9 on localhost is the discard service and is essentially never bound.
    let finding = checker()
        .check_url("http://127.0.0.1:9/")
        .await
        .expect("valid url");
    assert_eq!(finding, None);
}

#[tokio::test]
async fn test_scan_reports_each_vulnerable_url_once() {
    let mock_server = MockServer::start().await;
    let candidates = origin_candidates(DOMAIN);

    // /open reflects anything: reported with the first candidate.
    Mock::given(method("GET"))
        .and(path("/open"))
        .respond_with(|req: &Request| {
            let origin = req
                .headers
                .get("origin")
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string();
            ResponseTemplate::new(200).insert_header("Access-Control-Allow-Origin", origin.as_str())
        })
        .expect(1)
        .mount(&mock_server)
        .await;

    // /suffix trusts only the suffix trick.
    Mock::given(method("GET"))
        .and(path("/suffix"))
        .and(header("Origin", candidates[2].as_str()))
        .respond_with(reflecting(&candidates[2]))
        .expect(1)
        .mount(&mock_server)
        .await;

    // Everything else, including /suffix's other candidates, is locked down.
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .with_priority(10)
        .mount(&mock_server)
        .await;

    let mut input = String::new();
    for i in 0..20 {
        input.push_str(&format!("{}/safe/{}\n", mock_server.uri(), i));
    }
    input.push_str(&format!("{}/open\n", mock_server.uri()));
    input.push_str("not a url\n");
    input.push_str(&format!("{}/suffix\n", mock_server.uri()));

    let config = CheckConfig::default().with_domain(DOMAIN).with_concurrency(4);
    let checker = CorsChecker::with_config(config).expect("checker");

    let (tx, mut rx) = mpsc::unbounded_channel();
    let summary = checker.scan(std::io::Cursor::new(input.into_bytes()), tx).await;

    assert_eq!(summary.lines_read, 23);
    assert_eq!(summary.urls_processed, 23);
    assert_eq!(summary.findings, 2);
    assert_eq!(summary.workers, 4);

    let mut findings = Vec::new();
    while let Some(finding) = rx.recv().await {
        findings.push(finding.to_string());
    }
    findings.sort();
    assert_eq!(
        findings,
        vec![
            format!("{}/open https://asdf.com", mock_server.uri()),
            format!("{}/suffix https://example.comasdf.com", mock_server.uri()),
        ]
    );

    // 20 safe URLs x 5 candidates, /open x 1, /suffix x 3.
    let requests = mock_server.received_requests().await.expect("recording enabled");
    assert_eq!(requests.len(), 104);
}

#[tokio::test]
async fn test_malformed_lines_send_no_requests() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(reflecting("https://asdf.com"))
        .expect(0)
        .mount(&mock_server)
        .await;

    let address = mock_server.address();
    let input = format!("\nnot a url\n://{}/x\nhttp//{}/x\n", address, address);

    let (tx, mut rx) = mpsc::unbounded_channel();
    let summary = checker().scan(std::io::Cursor::new(input.into_bytes()), tx).await;

    assert_eq!(summary.lines_read, 4);
    assert_eq!(summary.urls_processed, 4);
    assert_eq!(summary.findings, 0);
    assert!(rx.recv().await.is_none());

    let requests = mock_server.received_requests().await.expect("recording enabled");
    assert!(requests.is_empty());
}

#[tokio::test]
async fn test_large_body_is_drained_before_next_candidate() {
    let mock_server = MockServer::start().await;
    let candidates = origin_candidates(DOMAIN);

    Mock::given(method("GET"))
        .and(header("Origin", candidates[0].as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![b'x'; 4 * 1024 * 1024]))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(header("Origin", candidates[1].as_str()))
        .respond_with(reflecting(&candidates[1]).set_body_bytes(vec![b'y'; 4 * 1024 * 1024]))
        .expect(1)
        .mount(&mock_server)
        .await;

    let url = format!("{}/download", mock_server.uri());
    let finding = checker().check_url(&url).await.unwrap();

    assert_eq!(
        finding,
        Some(Finding {
            url,
            origin: candidates[1].clone(),
        })
    );
}
