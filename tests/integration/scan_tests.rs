//! Integration tests for the scanner
//!
//! These tests use wiremock to stand in for the listing endpoint and drive
//! the real HTTP fetcher and scan loop end-to-end.

use magic_market_scanner::config::{ApiConfig, Config, ScanConfig};
use magic_market_scanner::output::read_snapshot;
use magic_market_scanner::scanner::{
    interrupt_channel, scan, Cursor, FetchError, HttpPageFetcher, Interrupt, PageSource, ScanLoop,
    Termination,
};
use magic_market_scanner::{KeywordSet, ResultStore};
use serde_json::{json, Value};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "SESSDATA=abc123";

/// API config pointing at the mock server
fn api_config(server: &MockServer) -> ApiConfig {
    ApiConfig {
        endpoint: format!("{}/list", server.uri()),
        detail_base_url: "https://mall.example.com/index.html".to_string(),
        request_timeout_secs: 5,
        connect_timeout_secs: 2,
    }
}

/// Pacing with no real waiting
fn instant_pacing() -> ScanConfig {
    ScanConfig {
        inter_page_delay_secs: 0,
        transient_retry_delay_secs: 0,
        rate_limit_cooldown_secs: 0,
    }
}

fn listing(next_id: Value, items: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "code": 0,
        "message": "success",
        "data": { "nextId": next_id, "data": items }
    }))
}

#[tokio::test]
async fn test_fetch_sends_cursor_and_headers() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/list"))
        .and(header("cookie", TOKEN))
        .and(header("content-type", "application/json"))
        .and(header("origin", "https://mall.bilibili.com"))
        .and(body_json(json!({"nextId": "p1"})))
        .respond_with(listing(
            json!("p2"),
            json!([{"c2cItemsId": 5, "c2cItemsName": "Sword", "showPrice": "9.90"}]),
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    let fetcher = HttpPageFetcher::new(&api_config(&mock_server), TOKEN).expect("client");
    let page = fetcher
        .fetch(Some(&Cursor::new("p1")))
        .await
        .expect("page");

    assert_eq!(page.next_cursor, Some(Cursor::new("p2")));
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].name, "Sword");
}

#[tokio::test]
async fn test_fetch_first_page_sends_null_cursor() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/list"))
        .and(body_json(json!({"nextId": null})))
        .respond_with(listing(Value::Null, json!([])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let fetcher = HttpPageFetcher::new(&api_config(&mock_server), TOKEN).expect("client");
    let page = fetcher.fetch(None).await.expect("page");

    assert!(page.next_cursor.is_none());
}

#[tokio::test]
async fn test_fetch_classifies_failures() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_json(json!({"nextId": "limited"})))
        .respond_with(ResponseTemplate::new(412).set_body_string("blocked"))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(body_json(json!({"nextId": "broken"})))
        .respond_with(ResponseTemplate::new(500).set_body_string("server exploded"))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(body_json(json!({"nextId": "garbage"})))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>captcha</html>"))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(body_json(json!({"nextId": "no-envelope"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"code": -101})))
        .mount(&mock_server)
        .await;

    let fetcher = HttpPageFetcher::new(&api_config(&mock_server), TOKEN).expect("client");

    let result = fetcher.fetch(Some(&Cursor::new("limited"))).await;
    assert_eq!(result, Err(FetchError::RateLimited));

    let result = fetcher.fetch(Some(&Cursor::new("broken"))).await;
    assert_eq!(
        result,
        Err(FetchError::HttpStatus {
            status: 500,
            body: "server exploded".to_string()
        })
    );

    let result = fetcher.fetch(Some(&Cursor::new("garbage"))).await;
    match result {
        Err(FetchError::MalformedResponse { body, .. }) => assert_eq!(body, "<html>captcha</html>"),
        other => panic!("expected MalformedResponse, got {:?}", other),
    }

    let result = fetcher.fetch(Some(&Cursor::new("no-envelope"))).await;
    assert!(matches!(result, Err(FetchError::MalformedResponse { .. })));
}

#[tokio::test]
async fn test_fetch_unreachable_server_is_transport_error() {
    let mock_server = MockServer::start().await;
    let config = api_config(&mock_server);
    drop(mock_server);

    let fetcher = HttpPageFetcher::new(&config, TOKEN).expect("client");
    let result = fetcher.fetch(None).await;

    assert!(matches!(result, Err(FetchError::Transport(_))));
}

#[tokio::test]
async fn test_full_scan_over_http() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/list"))
        .and(body_json(json!({"nextId": null})))
        .respond_with(listing(
            json!("p1"),
            json!([
                {"c2cItemsId": 1, "c2cItemsName": "初音未来 手办", "showPrice": "199.00"},
                {"c2cItemsId": 2, "c2cItemsName": "Wooden Shield", "showPrice": "5.00"}
            ]),
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/list"))
        .and(body_json(json!({"nextId": "p1"})))
        .respond_with(listing(
            json!("p2"),
            json!([
                {"c2cItemsId": 1, "c2cItemsName": "初音未来 手办", "showPrice": "199.00"},
                {"c2cItemsId": 3, "c2cItemsName": "MIKU keychain", "showPrice": "12.00"}
            ]),
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/list"))
        .and(body_json(json!({"nextId": "p2"})))
        .respond_with(listing(
            Value::Null,
            json!([{"c2cItemsId": 4, "c2cItemsName": "miku poster", "showPrice": "1.00"}]),
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = tempfile::TempDir::new().expect("tempdir");
    let mut config = Config::default();
    config.api = api_config(&mock_server);
    config.scan = instant_pacing();
    config.output.snapshot_path = dir.path().join("results.json").display().to_string();

    let mut store = ResultStore::new(config.api.detail_base_url.clone());
    let outcome = scan(
        &config,
        TOKEN,
        &KeywordSet::parse("初音，miku"),
        &mut store,
        &mut Interrupt::never(),
    )
    .await
    .expect("scan");

    assert_eq!(outcome.termination, Termination::Exhausted);
    assert_eq!(outcome.pages_requested, 3);
    assert_eq!(outcome.new_matches, 2);

    let records = read_snapshot(dir.path().join("results.json").as_path()).expect("snapshot");
    let ids: Vec<Value> = records.iter().map(|r| r.id.clone()).collect();
    assert_eq!(ids, vec![json!(1), json!(3)]);
    assert_eq!(
        records[1].url,
        "https://mall.example.com/index.html?page=magic-market_detail&itemsId=3"
    );
}

#[tokio::test]
async fn test_rate_limit_then_success_retries_same_cursor() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_json(json!({"nextId": null})))
        .respond_with(ResponseTemplate::new(412))
        .up_to_n_times(1)
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(body_json(json!({"nextId": null})))
        .respond_with(listing(
            json!("p1"),
            json!([{"c2cItemsId": "x1", "c2cItemsName": "sword", "showPrice": 3}]),
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(body_json(json!({"nextId": "p1"})))
        .respond_with(listing(Value::Null, json!([])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = tempfile::TempDir::new().expect("tempdir");
    let fetcher = HttpPageFetcher::new(&api_config(&mock_server), TOKEN).expect("client");
    let mut scan_loop = ScanLoop::new(fetcher, instant_pacing(), dir.path().join("results.json"));
    let mut store = ResultStore::new("https://mall.example.com/index.html");

    let outcome = scan_loop
        .run(
            &KeywordSet::parse("sword"),
            &mut store,
            &mut Interrupt::never(),
        )
        .await;

    assert_eq!(outcome.termination, Termination::Exhausted);
    assert_eq!(outcome.pages_requested, 3);
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn test_server_error_keeps_previous_matches() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_json(json!({"nextId": null})))
        .respond_with(listing(
            json!("p1"),
            json!([{"c2cItemsId": 10, "c2cItemsName": "Sword", "showPrice": "10"}]),
        ))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(body_json(json!({"nextId": "p1"})))
        .respond_with(ResponseTemplate::new(500).set_body_string("oops"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = tempfile::TempDir::new().expect("tempdir");
    let snapshot = dir.path().join("results.json");
    let fetcher = HttpPageFetcher::new(&api_config(&mock_server), TOKEN).expect("client");
    let mut scan_loop = ScanLoop::new(fetcher, instant_pacing(), &snapshot);
    let mut store = ResultStore::new("https://mall.example.com/index.html");

    let outcome = scan_loop
        .run(
            &KeywordSet::parse("sword"),
            &mut store,
            &mut Interrupt::never(),
        )
        .await;

    assert!(matches!(
        outcome.termination,
        Termination::Fatal(FetchError::HttpStatus { status: 500, .. })
    ));
    assert_eq!(store.len(), 1);
    assert_eq!(read_snapshot(&snapshot).expect("snapshot").len(), 1);
}

#[tokio::test]
async fn test_interrupt_stops_long_cooldown() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(412))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = tempfile::TempDir::new().expect("tempdir");
    let fetcher = HttpPageFetcher::new(&api_config(&mock_server), TOKEN).expect("client");
    let mut scan_loop = ScanLoop::new(
        fetcher,
        ScanConfig::default(),
        dir.path().join("results.json"),
    );
    let mut store = ResultStore::new("https://mall.example.com/index.html");
    let (handle, mut interrupt) = interrupt_channel();

    let interrupter = tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_millis(200)).await;
        handle.trigger();
    });

    // The real 300s cooldown must be cut short by the interrupt
    let outcome = tokio::time::timeout(
        std::time::Duration::from_secs(10),
        scan_loop.run(&KeywordSet::parse("sword"), &mut store, &mut interrupt),
    )
    .await
    .expect("scan should stop on interrupt");

    interrupter.await.expect("interrupter task");
    assert_eq!(outcome.termination, Termination::Interrupted);
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_invalid_token_is_rejected_before_scanning() {
    let mock_server = MockServer::start().await;
    let mut config = Config::default();
    config.api = api_config(&mock_server);

    let result = scan(
        &config,
        "bad\r\ntoken",
        &KeywordSet::parse("sword"),
        &mut ResultStore::new("https://mall.example.com/index.html"),
        &mut Interrupt::never(),
    )
    .await;

    assert!(result.is_err());
}
