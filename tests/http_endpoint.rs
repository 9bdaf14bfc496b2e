//! HTTP contract tests: a real listener on an ephemeral port, mock providers
//! behind it, and plain reqwest calls in front.

use serde_json::{Value, json};
use touchline::config::{
    HistoryBackend, HistoryConfig, IdentityConfig, IdentityProviderKind, ServerConfig,
};
use touchline::history::{HistoryTable, SqliteHistorySink};
use touchline::{GatewayConfig, Running};
use touchline_search::{SearchConfig, SearchProvider};
use wiremock::matchers::{any, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn ephemeral() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".into(),
        port: 0,
    }
}

fn search_only(search: &MockServer) -> GatewayConfig {
    GatewayConfig {
        server: ephemeral(),
        search: Some(SearchConfig::new(SearchProvider::Serper, "k").with_base_url(search.uri())),
        ..Default::default()
    }
}

async fn mount_results(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "organic": [{"title": "Chelsea 2-1 Arsenal", "link": "https://example.com/1", "snippet": "Match report"}]
        })))
        .mount(server)
        .await;
}

fn url(running: &Running, route: &str) -> String {
    format!("http://{}{route}", running.addr())
}

fn assert_cors(response: &reqwest::Response) {
    let headers = response.headers();
    assert_eq!(headers["access-control-allow-origin"], "*");
    assert_eq!(
        headers["access-control-allow-headers"],
        "authorization, x-client-info, apikey, content-type"
    );
    assert_eq!(headers["access-control-allow-methods"], "POST, GET, OPTIONS");
}

#[tokio::test]
async fn post_query_returns_envelope_with_cors() {
    let search = MockServer::start().await;
    mount_results(&search).await;
    let running = touchline::launch(&search_only(&search)).await.expect("launch");
    let http = reqwest::Client::new();

    for route in ["/", "/search-with-gemini"] {
        let response = http
            .post(url(&running, route))
            .json(&json!({"query": "Chelsea vs Arsenal"}))
            .send()
            .await
            .expect("request");
        assert_eq!(response.status(), 200);
        assert_cors(&response);

        let body: Value = response.json().await.expect("json");
        assert_eq!(body["query"], "Chelsea vs Arsenal");
        assert_eq!(body["summary"], "1. Chelsea 2-1 Arsenal: Match report");
        assert_eq!(body["sources"][0]["url"], "https://example.com/1");
    }
}

#[tokio::test]
async fn empty_query_is_400_without_upstream_calls() {
    let search = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&search)
        .await;
    let running = touchline::launch(&search_only(&search)).await.expect("launch");
    let http = reqwest::Client::new();

    let bodies = [
        r#"{"query":""}"#,
        r#"{"query":"   "}"#,
        r#"{}"#,
        r#"not json at all"#,
    ];
    for body in bodies {
        let response = http
            .post(url(&running, "/"))
            .header("content-type", "application/json")
            .body(body)
            .send()
            .await
            .expect("request");
        assert_eq!(response.status(), 400, "body {body:?}");
        assert_cors(&response);
        let body: Value = response.json().await.expect("json");
        assert_eq!(body, json!({"error": "Query is required"}));
    }
}

#[tokio::test]
async fn blank_query_with_bearer_skips_identity_lookup() {
    let search = MockServer::start().await;
    let supabase = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "user-1"})))
        .expect(0)
        .mount(&supabase)
        .await;

    let config = GatewayConfig {
        identity: IdentityConfig {
            provider: IdentityProviderKind::Supabase,
            url: Some(supabase.uri()),
            anon_key: "anon".into(),
        },
        ..search_only(&search)
    };
    let running = touchline::launch(&config).await.expect("launch");
    let http = reqwest::Client::new();

    let response = http
        .post(url(&running, "/"))
        .bearer_auth("jwt")
        .json(&json!({"query": "   "}))
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.expect("json");
    assert_eq!(body, json!({"error": "Query is required"}));
    assert!(supabase.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn preflight_is_empty_200() {
    let search = MockServer::start().await;
    let running = touchline::launch(&search_only(&search)).await.expect("launch");

    let response = reqwest::Client::new()
        .request(reqwest::Method::OPTIONS, url(&running, "/"))
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), 200);
    assert_cors(&response);
    assert!(response.bytes().await.expect("body").is_empty());
}

#[tokio::test]
async fn health_reports_mode() {
    let search = MockServer::start().await;
    let running = touchline::launch(&search_only(&search)).await.expect("launch");

    let response = reqwest::get(url(&running, "/health")).await.expect("request");
    assert_eq!(response.status(), 200);
    assert_cors(&response);
    let body: Value = response.json().await.expect("json");
    assert_eq!(body, json!({"status": "ok", "mode": "search_only"}));
}

#[tokio::test]
async fn upstream_failure_is_generic_500() {
    let search = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(502).set_body_string("upstream says: key sk-live-123 revoked"))
        .mount(&search)
        .await;
    let running = touchline::launch(&search_only(&search)).await.expect("launch");

    let response = reqwest::Client::new()
        .post(url(&running, "/"))
        .json(&json!({"query": "derby"}))
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), 500);
    assert_cors(&response);
    let text = response.text().await.expect("body");
    assert!(!text.contains("sk-live-123"));
    let body: Value = serde_json::from_str(&text).expect("json");
    assert_eq!(body["error"], "Failed to get a response from the search provider");
}

#[tokio::test]
async fn completed_requests_are_written_to_sqlite() {
    let search = MockServer::start().await;
    mount_results(&search).await;
    let dir = tempfile::tempdir().expect("tempdir");
    let db = dir.path().join("history.db");

    let config = GatewayConfig {
        history: HistoryConfig {
            backend: HistoryBackend::Sqlite,
            path: Some(db.clone()),
            ..Default::default()
        },
        ..search_only(&search)
    };
    let running = touchline::launch(&config).await.expect("launch");

    {
        let http = reqwest::Client::new();
        for query in ["Chelsea vs Arsenal", "Arsenal injuries"] {
            let response = http
                .post(url(&running, "/"))
                .header("user-agent", "touchline-test")
                .header("x-forwarded-for", "203.0.113.7")
                .json(&json!({"query": query}))
                .send()
                .await
                .expect("request");
            assert_eq!(response.status(), 200);
        }
        // A rejected query is never recorded.
        let response = http
            .post(url(&running, "/"))
            .json(&json!({"query": " "}))
            .send()
            .await
            .expect("request");
        assert_eq!(response.status(), 400);
    }

    assert_eq!(running.shutdown().await, 2);

    let sink = SqliteHistorySink::open(&db).expect("reopen");
    assert_eq!(sink.count(HistoryTable::Shared).expect("count"), 2);
    assert_eq!(sink.count(HistoryTable::PerUser).expect("count"), 0);
}

#[tokio::test]
async fn launch_without_providers_fails() {
    let config = GatewayConfig {
        server: ephemeral(),
        ..Default::default()
    };
    let err = touchline::launch(&config).await.err().expect("must fail");
    assert_eq!(err.code(), "CONFIG_INVALID");
}
