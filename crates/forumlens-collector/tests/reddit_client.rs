//! Integration tests for `RedditClient` and the collection pipeline.
//!
//! Uses `wiremock` to stand in for both the OAuth token endpoint and the
//! API host, so no real network traffic is made.

use std::fs::File;

use arrow_array::{RecordBatch, StringArray};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::{json, Value};
use wiremock::matchers::{
    body_string_contains, header, method, path, query_param, query_param_is_missing,
};
use wiremock::{Mock, MockServer, ResponseTemplate};

use forumlens_collector::{
    collect_all, write_raw_comments, ClientOptions, CollectSettings, CollectorError, RedditClient,
};
use forumlens_core::RedditCredentials;

fn credentials() -> RedditCredentials {
    RedditCredentials {
        client_id: "test-id".to_string(),
        client_secret: "test-secret".to_string(),
        user_agent: "forumlens-test/0.1".to_string(),
    }
}

fn options(server: &MockServer, max_retries: u32) -> ClientOptions {
    ClientOptions {
        auth_url: format!("{}/api/v1/access_token", server.uri()),
        api_base: server.uri(),
        timeout_secs: 5,
        requests_per_minute: 60_000,
        max_retries,
        retry_backoff_base_secs: 0,
    }
}

async fn mount_token(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/v1/access_token"))
        .and(body_string_contains("grant_type=client_credentials"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "tok",
            "token_type": "bearer",
            "expires_in": 86400
        })))
        .mount(server)
        .await;
}

fn submission(id: &str, num_comments: u64) -> Value {
    json!({
        "kind": "t3",
        "data": {
            "id": id,
            "title": format!("Best pick {id}?"),
            "permalink": format!("/r/headphones/comments/{id}/best_pick/"),
            "num_comments": num_comments
        }
    })
}

fn listing(children: Vec<Value>, after: Option<&str>) -> Value {
    json!({"kind": "Listing", "data": {"children": children, "after": after}})
}

fn comment(id: &str, author: &str, replies: Value) -> Value {
    json!({
        "kind": "t1",
        "data": {
            "id": id,
            "body": format!("I recommend {id}"),
            "author": author,
            "score": 2,
            "created_utc": 1_700_000_000.0,
            "permalink": format!("/r/headphones/comments/s1/best_pick/{id}/"),
            "replies": replies
        }
    })
}

// ---------------------------------------------------------------------------
// Token exchange
// ---------------------------------------------------------------------------

#[tokio::test]
async fn connect_fails_with_auth_error_when_credentials_are_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/access_token"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let result = RedditClient::connect(&credentials(), options(&server, 0)).await;
    assert!(
        matches!(result, Err(CollectorError::Auth(_))),
        "expected Auth error"
    );
}

#[tokio::test]
async fn connect_reports_token_error_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/access_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"error": "invalid_grant"})))
        .mount(&server)
        .await;

    let result = RedditClient::connect(&credentials(), options(&server, 0)).await;
    assert!(matches!(result, Err(CollectorError::Auth(ref msg)) if msg == "invalid_grant"));
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

#[tokio::test]
async fn search_follows_after_cursor_and_sends_bearer_token() {
    let server = MockServer::start().await;
    mount_token(&server).await;

    Mock::given(method("GET"))
        .and(path("/r/headphones/search"))
        .and(header("authorization", "Bearer tok"))
        .and(query_param("sort", "top"))
        .and(query_param("restrict_sr", "true"))
        .and(query_param("q", "best OR recommendation OR favorites"))
        .and(query_param_is_missing("after"))
        .respond_with(ResponseTemplate::new(200).set_body_json(listing(
            vec![submission("a", 10), submission("b", 3)],
            Some("t3_b"),
        )))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/r/headphones/search"))
        .and(query_param("after", "t3_b"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(listing(vec![submission("c", 7)], None)),
        )
        .mount(&server)
        .await;

    let client = RedditClient::connect(&credentials(), options(&server, 0))
        .await
        .expect("connect");
    let found = client
        .search_community("headphones", "best OR recommendation OR favorites", 30)
        .await
        .expect("search");

    let ids: Vec<&str> = found.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b", "c"]);
    assert_eq!(found[1].num_comments, 3);
}

#[tokio::test]
async fn search_stops_at_limit() {
    let server = MockServer::start().await;
    mount_token(&server).await;

    Mock::given(method("GET"))
        .and(path("/r/gadgets/search"))
        .and(query_param("limit", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(listing(
            vec![submission("a", 10), submission("b", 10), submission("c", 10)],
            Some("t3_c"),
        )))
        .expect(1)
        .mount(&server)
        .await;

    let client = RedditClient::connect(&credentials(), options(&server, 0))
        .await
        .expect("connect");
    let found = client
        .search_community("gadgets", "best", 2)
        .await
        .expect("search");
    assert_eq!(found.len(), 2);
}

#[tokio::test]
async fn search_retries_after_rate_limit() {
    let server = MockServer::start().await;
    mount_token(&server).await;

    Mock::given(method("GET"))
        .and(path("/r/frugal/search"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/r/frugal/search"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(listing(vec![submission("a", 10)], None)),
        )
        .mount(&server)
        .await;

    let client = RedditClient::connect(&credentials(), options(&server, 2))
        .await
        .expect("connect");
    let found = client
        .search_community("frugal", "best", 30)
        .await
        .expect("search after retry");
    assert_eq!(found.len(), 1);
}

#[tokio::test]
async fn search_propagates_non_retriable_status() {
    let server = MockServer::start().await;
    mount_token(&server).await;

    Mock::given(method("GET"))
        .and(path("/r/private/search"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&server)
        .await;

    let client = RedditClient::connect(&credentials(), options(&server, 3))
        .await
        .expect("connect");
    let result = client.search_community("private", "best", 30).await;
    assert!(matches!(
        result,
        Err(CollectorError::UnexpectedStatus { status: 403, .. })
    ));
}

// ---------------------------------------------------------------------------
// Comment expansion
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fetch_comments_expands_more_and_continue_thread_stubs() {
    let server = MockServer::start().await;
    mount_token(&server).await;

    let c2_replies = listing(
        vec![json!({"kind": "more", "data": {"id": "_", "parent_id": "t1_c2", "children": [], "count": 0}})],
        None,
    );
    let c1_replies = listing(vec![comment("c2", "bob", c2_replies)], None);
    let forest = listing(
        vec![
            comment("c1", "alice", c1_replies),
            json!({"kind": "more", "data": {"id": "m1", "parent_id": "t3_s1", "children": ["c3", "c4"], "count": 2}}),
        ],
        None,
    );

    Mock::given(method("GET"))
        .and(path("/comments/s1"))
        .and(query_param_is_missing("comment"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([listing(vec![submission("s1", 5)], None), forest])),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/morechildren"))
        .and(query_param("link_id", "t3_s1"))
        .and(query_param("children", "c3,c4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "json": {"errors": [], "data": {"things": [
                comment("c3", "carol", json!("")),
                comment("c4", "dave", json!(""))
            ]}}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let thread = listing(
        vec![comment(
            "c2",
            "bob",
            listing(vec![comment("c5", "erin", json!(""))], None),
        )],
        None,
    );
    Mock::given(method("GET"))
        .and(path("/comments/s1"))
        .and(query_param("comment", "c2"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([listing(vec![submission("s1", 5)], None), thread])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = RedditClient::connect(&credentials(), options(&server, 0))
        .await
        .expect("connect");
    let sub = forumlens_collector::Submission {
        id: "s1".to_string(),
        title: "Best pick s1?".to_string(),
        permalink: "/r/headphones/comments/s1/best_pick/".to_string(),
        num_comments: 5,
    };
    let comments = client.fetch_comments(&sub).await.expect("comments");

    let mut ids: Vec<&str> = comments.iter().map(|c| c.id.as_str()).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec!["c1", "c2", "c3", "c4", "c5"]);
}

// ---------------------------------------------------------------------------
// End to end: search → expand → filter → Parquet
// ---------------------------------------------------------------------------

#[tokio::test]
async fn one_submission_with_six_comments_and_one_deleted_writes_five_rows() {
    let server = MockServer::start().await;
    mount_token(&server).await;

    Mock::given(method("GET"))
        .and(path("/r/headphones/search"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(listing(vec![submission("s1", 6)], None)),
        )
        .mount(&server)
        .await;

    let forest = listing(
        vec![
            comment("c1", "alice", json!("")),
            comment("c2", "bob", json!("")),
            comment("c3", "[deleted]", json!("")),
            comment("c4", "carol", json!("")),
            comment("c5", "dave", json!("")),
            comment("c6", "erin", json!("")),
        ],
        None,
    );
    Mock::given(method("GET"))
        .and(path("/comments/s1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([listing(vec![submission("s1", 6)], None), forest])),
        )
        .mount(&server)
        .await;

    let client = RedditClient::connect(&credentials(), options(&server, 0))
        .await
        .expect("connect");
    let settings = CollectSettings {
        search_query: "best OR recommendation OR favorites".to_string(),
        submissions_limit: 30,
        min_comments: 5,
    };
    let (rows, _) = collect_all(&client, &["headphones".to_string()], &settings)
        .await
        .expect("collect");
    assert_eq!(rows.len(), 5);

    let dir = tempfile::tempdir().expect("tempdir");
    let out = dir.path().join("raw_reddit_comments.parquet");
    write_raw_comments(&out, &rows).expect("write");

    let reader = ParquetRecordBatchReaderBuilder::try_new(File::open(&out).expect("open"))
        .expect("reader")
        .build()
        .expect("build");
    let batches: Vec<RecordBatch> = reader.map(|b| b.expect("batch")).collect();
    assert_eq!(batches.iter().map(RecordBatch::num_rows).sum::<usize>(), 5);

    let authors = batches[0]
        .column_by_name("author")
        .expect("author column")
        .as_any()
        .downcast_ref::<StringArray>()
        .expect("utf8");
    assert!(authors.iter().flatten().all(|a| a != "[deleted]"));
    let communities = batches[0]
        .column_by_name("subreddit")
        .expect("subreddit column")
        .as_any()
        .downcast_ref::<StringArray>()
        .expect("utf8");
    assert!(communities.iter().flatten().all(|c| c == "headphones"));
}
