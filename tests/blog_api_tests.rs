//! Blog API integration tests: article lifecycle, ownership scoping, and the
//! response cache.

use axum::http::StatusCode;
use axum_test::TestServer;
use inkpress::config::{AppConfig, GoogleConfig};
use inkpress::server::ApiServer;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

fn test_config() -> AppConfig {
    AppConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: "integration-test-signing-key-0123456789".to_string(),
        token_expiry_secs: 3600,
        cors_allow_origin: "http://localhost:3000".to_string(),
        google: GoogleConfig {
            client_id: None,
            client_secret: None,
            callback_url: "http://localhost:3000/auth/google/callback".to_string(),
        },
    }
}

async fn test_server() -> TestServer {
    let server = ApiServer::new(test_config()).await.unwrap();
    TestServer::new(server.router()).unwrap()
}

/// Register an account and return its bearer token.
async fn register(server: &TestServer, email: &str) -> String {
    let response = server
        .post("/auth/register")
        .json(&json!({
            "firstname": "John",
            "lastname": "Doe",
            "email": email,
            "password": "Password1"
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    let body: Value = response.json();
    body["access_token"].as_str().unwrap().to_string()
}

fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

async fn create_article(server: &TestServer, token: &str, title: &str, body: &str) -> Value {
    let response = server
        .post("/blogs")
        .add_header("Authorization", bearer(token))
        .json(&json!({"title": title, "body": body}))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    response.json()
}

async fn publish(server: &TestServer, token: &str, id: i64) {
    let response = server
        .patch(&format!("/blogs/{}/state", id))
        .add_header("Authorization", bearer(token))
        .json(&json!({"state": "published"}))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn test_create_requires_auth() {
    let server = test_server().await;
    let response = server
        .post("/blogs")
        .json(&json!({"title": "T", "body": "b"}))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_created_article_is_a_draft() {
    let server = test_server().await;
    let token = register(&server, "john@example.com").await;

    let article = create_article(&server, &token, "First", "one two three").await;
    assert_eq!(article["state"], "draft");
    assert_eq!(article["readCount"], 0);
    assert_eq!(article["readingTime"], 1);
}

#[tokio::test]
async fn test_create_rejects_empty_fields() {
    let server = test_server().await;
    let token = register(&server, "john@example.com").await;

    for payload in [
        json!({"title": "", "body": "content"}),
        json!({"title": "Title", "body": "   "}),
    ] {
        let response = server
            .post("/blogs")
            .add_header("Authorization", bearer(&token))
            .json(&payload)
            .await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn test_list_rejects_draft_state_even_for_owner() {
    let server = test_server().await;
    let token = register(&server, "john@example.com").await;
    create_article(&server, &token, "Mine", "body").await;

    // anonymous caller
    let response = server.get("/blogs").add_query_param("state", "draft").await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    // the owner is rejected identically
    let response = server
        .get("/blogs")
        .add_query_param("state", "draft")
        .add_header("Authorization", bearer(&token))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_rejects_bad_pagination() {
    let server = test_server().await;
    for (key, value) in [
        ("page", "0"),
        ("page", "abc"),
        ("per_page", "-1"),
        // overflows the offset computation against the default per_page
        ("page", "9223372036854775807"),
    ] {
        let response = server.get("/blogs").add_query_param(key, value).await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn test_draft_returns_404_until_published() {
    let server = test_server().await;
    let token = register(&server, "john@example.com").await;
    let article = create_article(&server, &token, "Hidden", "body").await;
    let id = article["id"].as_i64().unwrap();

    // a draft is invisible by id, even to its owner
    let response = server.get(&format!("/blogs/{}", id)).await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    let response = server
        .get(&format!("/blogs/{}", id))
        .add_header("Authorization", bearer(&token))
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    publish(&server, &token, id).await;

    let response = server.get(&format!("/blogs/{}", id)).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["readCount"], 1);
    assert_eq!(body["author"]["firstname"], "John");
}

#[tokio::test]
async fn test_missing_article_is_404() {
    let server = test_server().await;
    let response = server.get("/blogs/9999").await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_read_counter_advances_per_read() {
    let server = test_server().await;
    let token = register(&server, "john@example.com").await;
    let article = create_article(&server, &token, "Counted", "body").await;
    let id = article["id"].as_i64().unwrap();
    publish(&server, &token, id).await;

    for _ in 0..3 {
        server
            .get(&format!("/blogs/{}", id))
            .await
            .assert_status(StatusCode::OK);
    }

    // the owner view reads the store directly and sees every increment
    let response = server
        .get("/blogs/my-articles")
        .add_header("Authorization", bearer(&token))
        .await;
    let mine: Value = response.json();
    assert_eq!(mine[0]["readCount"], 3);
}

#[tokio::test]
async fn test_my_articles_includes_drafts() {
    let server = test_server().await;
    let token = register(&server, "john@example.com").await;
    let draft = create_article(&server, &token, "Draft", "body").await;
    let published = create_article(&server, &token, "Published", "body").await;
    publish(&server, &token, published["id"].as_i64().unwrap()).await;

    let response = server
        .get("/blogs/my-articles")
        .add_header("Authorization", bearer(&token))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let mine: Value = response.json();
    let states: Vec<&str> = mine
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["state"].as_str().unwrap())
        .collect();
    assert_eq!(states, vec!["draft", "published"]);
    assert_eq!(mine[0]["id"], draft["id"]);
}

#[tokio::test]
async fn test_edit_whitelisted_fields_only() {
    let server = test_server().await;
    let token = register(&server, "john@example.com").await;
    let article = create_article(&server, &token, "Editable", "short body").await;
    let id = article["id"].as_i64().unwrap();

    // a field outside the whitelist fails, even for the owner
    for payload in [json!({"state": "published"}), json!({"readCount": 10})] {
        let response = server
            .patch(&format!("/blogs/{}", id))
            .add_header("Authorization", bearer(&token))
            .json(&payload)
            .await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["message"], "invalid updates");
    }

    // a whitelisted update lands, and a body change recomputes reading time
    let long_body = vec!["word"; 201].join(" ");
    let response = server
        .patch(&format!("/blogs/{}", id))
        .add_header("Authorization", bearer(&token))
        .json(&json!({"title": "Renamed", "body": long_body}))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["title"], "Renamed");
    assert_eq!(body["readingTime"], 2);
}

#[tokio::test]
async fn test_update_state_rejects_invalid_values() {
    let server = test_server().await;
    let token = register(&server, "john@example.com").await;
    let article = create_article(&server, &token, "Stateful", "body").await;
    let id = article["id"].as_i64().unwrap();

    for state in ["draft", "archived"] {
        let response = server
            .patch(&format!("/blogs/{}/state", id))
            .add_header("Authorization", bearer(&token))
            .json(&json!({"state": state}))
            .await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["message"], "invalid state");
    }
}

#[tokio::test]
async fn test_non_owner_patch_404_but_delete_403() {
    let server = test_server().await;
    let owner = register(&server, "owner@example.com").await;
    let intruder = register(&server, "intruder@example.com").await;

    let article = create_article(&server, &owner, "Owned", "body").await;
    let id = article["id"].as_i64().unwrap();

    // PATCH masks non-ownership as 404
    let response = server
        .patch(&format!("/blogs/{}", id))
        .add_header("Authorization", bearer(&intruder))
        .json(&json!({"title": "Stolen"}))
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    // DELETE reveals existence with 403
    let response = server
        .delete(&format!("/blogs/{}", id))
        .add_header("Authorization", bearer(&intruder))
        .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);

    // the owner can delete
    let response = server
        .delete(&format!("/blogs/{}", id))
        .add_header("Authorization", bearer(&owner))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>(), json!({"status": true}));

    // deleting a missing article is 404
    let response = server
        .delete(&format!("/blogs/{}", id))
        .add_header("Authorization", bearer(&owner))
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_end_to_end_publish_flow() {
    let server = test_server().await;

    // register(john) -> create a 201-word article -> readingTime == 2
    let token = register(&server, "john@example.com").await;
    let body_text = vec!["word"; 201].join(" ");
    let article = create_article(&server, &token, "A", &body_text).await;
    assert_eq!(article["readingTime"], 2);
    let id = article["id"].as_i64().unwrap();

    // publish, then an unauthenticated read sees readCount go 0 -> 1
    publish(&server, &token, id).await;
    let response = server.get(&format!("/blogs/{}", id)).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let fetched: Value = response.json();
    assert_eq!(fetched["title"], "A");
    assert_eq!(fetched["readCount"], 1);
}

#[tokio::test]
async fn test_list_cache_not_stale_after_mutation() {
    let server = test_server().await;
    let token = register(&server, "john@example.com").await;

    let first = create_article(&server, &token, "First", "body").await;
    publish(&server, &token, first["id"].as_i64().unwrap()).await;

    // miss populates the cache
    let response = server.get("/blogs").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>().as_array().unwrap().len(), 1);

    // a new published article must show up on the next listing
    let second = create_article(&server, &token, "Second", "body").await;
    publish(&server, &token, second["id"].as_i64().unwrap()).await;

    let response = server.get("/blogs").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let titles: Vec<String> = response
        .json::<Value>()
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["title"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(titles, vec!["First".to_string(), "Second".to_string()]);
}

#[tokio::test]
async fn test_deleted_article_not_served_from_cache() {
    let server = test_server().await;
    let token = register(&server, "john@example.com").await;
    let article = create_article(&server, &token, "Ephemeral", "body").await;
    let id = article["id"].as_i64().unwrap();
    publish(&server, &token, id).await;

    // warm the per-article cache
    let response = server.get(&format!("/blogs/{}", id)).await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let response = server
        .delete(&format!("/blogs/{}", id))
        .add_header("Authorization", bearer(&token))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    // the cached copy must not outlive the row
    let response = server.get(&format!("/blogs/{}", id)).await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_filters() {
    let server = test_server().await;
    let token = register(&server, "john@example.com").await;

    let a = create_article(&server, &token, "Alpha", "body").await;
    publish(&server, &token, a["id"].as_i64().unwrap()).await;
    let b = create_article(&server, &token, "Beta", "body").await;
    publish(&server, &token, b["id"].as_i64().unwrap()).await;

    let response = server.get("/blogs").add_query_param("title", "Beta").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let listed: Value = response.json();
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["title"], "Beta");

    let response = server
        .get("/blogs")
        .add_query_param("per_page", "1")
        .add_query_param("page", "2")
        .await;
    let listed: Value = response.json();
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["title"], "Beta");
}
