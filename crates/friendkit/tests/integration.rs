//! Integration tests for FriendKit using wiremock

use friendkit::{
    export_friends, FriendsError, FriendsSource, JsonFraming, ReportFormat, SinkOptions,
    UserRecord, VkFriendsClient,
};
use serde_json::json;
use std::fs;
use std::time::{Duration, Instant};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> VkFriendsClient {
    VkFriendsClient::builder("test-token", "12345")
        .api_base(server.uri())
        .request_delay(Duration::ZERO)
        .build()
        .unwrap()
}

fn friend(id: i64, first: &str, last: &str, sex: i64) -> serde_json::Value {
    json!({
        "id": id,
        "first_name": first,
        "last_name": last,
        "sex": sex,
        "track_code": "6bb2ed2c4jguNZX_5N8a3NwkkkEQ",
        "city": {"id": 1, "title": "Москва"},
        "country": {"id": 1, "title": "Россия"}
    })
}

async fn mount_count(server: &MockServer, count: u64) {
    Mock::given(method("GET"))
        .and(path("/friends.get"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"response": {"count": count, "items": []}})),
        )
        .mount(server)
        .await;
}

async fn mount_page(server: &MockServer, offset: u64, items: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/friends.get"))
        .and(query_param("offset", offset.to_string()))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"response": {"count": 0, "items": items}})),
        )
        .with_priority(1)
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_fetch_count_sends_credentials() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/friends.get"))
        .and(query_param("user_id", "12345"))
        .and(query_param("access_token", "test-token"))
        .and(query_param("v", "5.81"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"response": {"count": 5000, "items": []}})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let count = client(&mock_server).fetch_count().await.unwrap();
    assert_eq!(count, 5000);
}

#[tokio::test]
async fn test_fetch_page_requests_fields() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/friends.get"))
        .and(query_param("user_id", "12345"))
        .and(query_param("order", "name"))
        .and(query_param("fields", "sex,bdate,city,country"))
        .and(query_param("offset", "200"))
        .and(query_param("count", "100"))
        .and(query_param("v", "5.81"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": {
                "count": 201,
                "items": [
                    friend(52158834389, "Αндрей", "Εвсекеев", 2),
                    {"id": 7, "first_name": "DELETED", "last_name": "", "deactivated": "deleted"}
                ]
            }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let items = client(&mock_server).fetch_page(200, 100).await.unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].first_name.as_deref(), Some("Αндрей"));
    assert_eq!(items[0].sex, Some(2));
    assert!(!items[0].is_deactivated());
    assert!(items[1].is_deactivated());
}

#[tokio::test]
async fn test_api_error_envelope() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/friends.get"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": {
                "error_code": 5,
                "error_msg": "User authorization failed: invalid access_token (4).",
                "request_params": [{"key": "method", "value": "friends.get"}]
            }
        })))
        .mount(&mock_server)
        .await;

    let err = client(&mock_server).fetch_count().await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "VK error 5: User authorization failed: invalid access_token (4)."
    );
}

#[tokio::test]
async fn test_http_error_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/friends.get"))
        .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
        .mount(&mock_server)
        .await;

    let err = client(&mock_server).fetch_page(0, 10).await.unwrap_err();
    assert!(matches!(err, FriendsError::HttpStatus(503)));
}

#[tokio::test]
async fn test_malformed_response() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/friends.get"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"response\": "))
        .mount(&mock_server)
        .await;

    let err = client(&mock_server).fetch_count().await.unwrap_err();
    assert!(matches!(err, FriendsError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_connect_error() {
    // Nothing listens on the discard port
    let client = VkFriendsClient::builder("test-token", "12345")
        .api_base("http://127.0.0.1:9/")
        .request_delay(Duration::ZERO)
        .build()
        .unwrap();

    let err = client.fetch_count().await.unwrap_err();
    assert!(matches!(
        err,
        FriendsError::ConnectError(_) | FriendsError::RequestError(_)
    ));
}

#[tokio::test]
async fn test_delay_between_requests() {
    let mock_server = MockServer::start().await;
    mount_count(&mock_server, 3).await;

    let delay = Duration::from_millis(300);
    let client = VkFriendsClient::builder("test-token", "12345")
        .api_base(mock_server.uri())
        .request_delay(delay)
        .build()
        .unwrap();

    let start = Instant::now();
    client.fetch_count().await.unwrap();
    client.fetch_count().await.unwrap();
    client.fetch_count().await.unwrap();
    assert!(start.elapsed() >= delay * 2);
}

#[tokio::test]
async fn test_export_exact_multiple_requests_empty_last_page() {
    let mock_server = MockServer::start().await;
    mount_count(&mock_server, 4).await;
    mount_page(
        &mock_server,
        0,
        json!([friend(1, "Αндрей", "Εвсекеев", 2), friend(2, "Денис", "Креев", 2)]),
    )
    .await;
    mount_page(
        &mock_server,
        2,
        json!([friend(3, "Ирина", "Григорьева", 1), friend(4, "Никита", "Никитин", 2)]),
    )
    .await;
    mount_page(&mock_server, 4, json!([])).await;

    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().join("report");
    let mut sink = ReportFormat::Csv
        .create_sink(&base, &SinkOptions::default())
        .unwrap();

    let summary = export_friends(&client(&mock_server), sink.as_mut(), 2)
        .await
        .unwrap();
    assert_eq!(summary.total, 4);
    assert_eq!(summary.pages, 3);
    assert_eq!(summary.written, 4);

    let content = fs::read_to_string(ReportFormat::Csv.report_path(&base)).unwrap();
    assert!(content.ends_with("Никита,Никитин,Россия,Москва,,Male\r\n"));
    let rows: Vec<&str> = content.lines().collect();
    assert_eq!(rows.len(), 5);
    assert_eq!(rows[0], UserRecord::FIELD_NAMES.join(","));
    assert_eq!(rows[3], "Ирина,Григорьева,Россия,Москва,,Female");
}

#[tokio::test]
async fn test_export_zero_friends_single_request() {
    let mock_server = MockServer::start().await;
    mount_count(&mock_server, 0).await;
    mount_page(&mock_server, 0, json!([])).await;

    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().join("empty");
    let mut sink = ReportFormat::Json
        .create_sink(&base, &SinkOptions::default())
        .unwrap();

    let summary = export_friends(&client(&mock_server), sink.as_mut(), 1000)
        .await
        .unwrap();
    assert_eq!(summary.pages, 1);
    assert_eq!(summary.written, 0);
    assert_eq!(
        fs::read_to_string(ReportFormat::Json.report_path(&base)).unwrap(),
        "[]"
    );
}

#[tokio::test]
async fn test_export_strict_json_parses() {
    let mock_server = MockServer::start().await;
    mount_count(&mock_server, 3).await;
    mount_page(
        &mock_server,
        0,
        json!([
            friend(1, "Αндрей", "Εвсекеев", 2),
            {"id": 2, "first_name": "DELETED", "last_name": "", "deactivated": "banned"},
            friend(3, "Ирина", "Григорьева", 1)
        ]),
    )
    .await;

    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().join("strict");
    let options = SinkOptions {
        json_framing: JsonFraming::Strict,
    };
    let mut sink = ReportFormat::Json.create_sink(&base, &options).unwrap();

    let summary = export_friends(&client(&mock_server), sink.as_mut(), 5)
        .await
        .unwrap();
    assert_eq!(summary.skipped, 1);

    let content = fs::read_to_string(ReportFormat::Json.report_path(&base)).unwrap();
    let records: Vec<UserRecord> = serde_json::from_str(&content).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[1].first_name(), "Ирина");
    assert_eq!(records[1].city(), Some("Москва"));
}

#[tokio::test]
async fn test_malformed_entry_is_normalize_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/friends.get"))
        .and(query_param("offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": {
                "count": 2,
                "items": [
                    friend(1, "Ирина", "Григорьева", 1),
                    {"id": 2, "first_name": "Денис", "last_name": "Креев", "sex": "2"}
                ]
            }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let err = client(&mock_server).fetch_page(0, 10).await.unwrap_err();
    assert!(matches!(err, FriendsError::Normalize(_)));
}

#[tokio::test]
async fn test_export_stops_on_api_error() {
    let mock_server = MockServer::start().await;
    mount_count(&mock_server, 10).await;

    Mock::given(method("GET"))
        .and(path("/friends.get"))
        .and(query_param("offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": {"error_code": 6, "error_msg": "Too many requests per second"}
        })))
        .with_priority(1)
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().join("partial");
    let mut sink = ReportFormat::Tsv
        .create_sink(&base, &SinkOptions::default())
        .unwrap();

    let err = export_friends(&client(&mock_server), sink.as_mut(), 5)
        .await
        .unwrap_err();
    assert!(matches!(err, FriendsError::Api { code: 6, .. }));

    // Header only, left on disk
    let content = fs::read_to_string(ReportFormat::Tsv.report_path(&base)).unwrap();
    assert_eq!(content.lines().count(), 1);
}
