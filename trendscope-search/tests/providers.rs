use serde_json::json;
use trendscope_common::SearchConfig;
use trendscope_search::{RecencyWindow, SearchError, SearchProvider, ensure_search_ready};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn google_maps_items_and_sends_recency() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/customsearch/v1"))
        .and(query_param("key", "g-key"))
        .and(query_param("cx", "engine"))
        .and(query_param("dateRestrict", "d14"))
        .and(query_param("q", "open source llm"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                {"title": "A release", "link": "https://a.io/2025/03/release", "snippet": "s"},
                {"link": "https://b.io/no-title"}
            ]
        })))
        .mount(&server)
        .await;

    let provider = ensure_search_ready(&SearchConfig::Google {
        api_key: "g-key".into(),
        engine_id: "engine".into(),
        base_url: Some(server.uri()),
    })
    .unwrap();
    let hits = provider
        .search("open source llm", RecencyWindow::days(14))
        .await
        .unwrap();
    assert_eq!(provider.name(), "google");
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].link.as_deref(), Some("https://a.io/2025/03/release"));
    assert!(hits[1].title.is_none());
}

#[tokio::test]
async fn google_without_items_is_empty_not_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"kind": "customsearch#search"})),
        )
        .mount(&server)
        .await;

    let provider = ensure_search_ready(&SearchConfig::Google {
        api_key: "k".into(),
        engine_id: "cx".into(),
        base_url: Some(server.uri()),
    })
    .unwrap();
    let hits = provider.search("nothing", RecencyWindow::days(7)).await.unwrap();
    assert!(hits.is_empty());
}

#[tokio::test]
async fn brave_sends_token_header_and_surfaces_api_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/res/v1/web/search"))
        .and(header("x-subscription-token", "brave-token"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "error": {"detail": "Unable to validate request parameter(s)."}
        })))
        .mount(&server)
        .await;

    let provider = ensure_search_ready(&SearchConfig::Brave {
        token: "brave-token".into(),
        base_url: Some(server.uri()),
    })
    .unwrap();
    let err = provider
        .search("agents", RecencyWindow::days(14))
        .await
        .unwrap_err();
    assert!(matches!(err, SearchError::Http(_)));
    assert!(err.to_string().contains("Unable to validate"));
}
