use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

use teamboard::application::agile::AgileQueryService;
use teamboard::application::posts::PostGateway;
use teamboard::infra::db::PostgresRepositories;
use teamboard::infra::http::{ApiState, build_api_router};

fn router(pool: PgPool) -> Router {
    let repos = Arc::new(PostgresRepositories::new(pool));
    build_api_router(ApiState {
        posts: PostGateway::new(repos.clone(), repos.clone()),
        users: repos.clone(),
        agile: AgileQueryService::new(repos.clone(), repos.clone()),
        health: repos,
        profile_concurrency: 4,
    })
}

async fn seed_user(pool: &PgPool, name: &str) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO users (id, name, email) VALUES ($1, $2, $3)")
        .bind(id)
        .bind(name)
        .bind(format!("{}@example.com", name.to_lowercase()))
        .execute(pool)
        .await
        .expect("seed user");
    id
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router
        .clone()
        .oneshot(request)
        .await
        .expect("router response");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("read body")
        .to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, body)
}

fn json_request(method: &str, uri: &str, user: Option<Uuid>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(user) = user {
        builder = builder.header("x-user-id", user.to_string());
    }
    builder
        .body(Body::from(body.to_string()))
        .expect("request")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

#[sqlx::test(migrations = "./migrations")]
async fn health_is_no_content(pool: PgPool) {
    let router = router(pool);
    let (status, _) = send(&router, get("/health")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[sqlx::test(migrations = "./migrations")]
async fn feed_engagement_round_trip(pool: PgPool) {
    let alice = seed_user(&pool, "Alice").await;
    let router = router(pool);
    let team_id = Uuid::new_v4();
    let feed_uri = format!("/api/v1/teams/{team_id}/posts");

    let (status, first) = send(
        &router,
        json_request(
            "POST",
            &feed_uri,
            Some(alice),
            json!({ "title": "Sprint goals", "description": "<p>ship<script>x</script></p>" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(first["description"], "<p>ship</p>");
    assert_eq!(first["type"], "post");

    let (status, second) = send(
        &router,
        json_request(
            "POST",
            &feed_uri,
            Some(alice),
            json!({ "title": "Office closed", "type": "announcement" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(second["type"], "announcement");

    let second_id = second["id"].as_str().expect("id");
    let (status, _) = send(
        &router,
        json_request("POST", &format!("/api/v1/posts/{second_id}/pin"), None, json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let first_id = first["id"].as_str().expect("id");
    let (status, reactions) = send(
        &router,
        json_request(
            "POST",
            &format!("/api/v1/posts/{first_id}/reactions"),
            Some(alice),
            json!({ "emoji": "tada" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reactions, json!({ "tada": [alice.to_string()] }));

    let (status, feed) = send(&router, get(&feed_uri)).await;
    assert_eq!(status, StatusCode::OK);
    let titles: Vec<&str> = feed["posts"]
        .as_array()
        .expect("posts")
        .iter()
        .map(|post| post["title"].as_str().expect("title"))
        .collect();
    assert_eq!(titles, ["Office closed", "Sprint goals"]);
    assert_eq!(feed["authors"][0]["id"], alice.to_string());
}

#[sqlx::test(migrations = "./migrations")]
async fn anonymous_comment_is_rejected(pool: PgPool) {
    let alice = seed_user(&pool, "Alice").await;
    let router = router(pool);
    let feed_uri = format!("/api/v1/teams/{}/posts", Uuid::new_v4());

    let (_, post) = send(
        &router,
        json_request("POST", &feed_uri, Some(alice), json!({ "title": "Standup" })),
    )
    .await;
    let comments_uri = format!("/api/v1/posts/{}/comments", post["id"].as_str().expect("id"));

    let (status, body) = send(
        &router,
        json_request("POST", &comments_uri, None, json!({ "content": "hi" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "auth_required");

    let (status, comments) = send(
        &router,
        json_request("POST", &comments_uri, Some(alice), json!({ "content": "hi" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(comments[0]["author_id"], alice.to_string());
}

#[sqlx::test(migrations = "./migrations")]
async fn agile_endpoint_decodes_queries(pool: PgPool) {
    let team_id = Uuid::new_v4();
    let role_id = Uuid::new_v4();
    sqlx::query("INSERT INTO agile_role (id, team_id, name) VALUES ($1, $2, 'Product owner')")
        .bind(role_id)
        .bind(team_id)
        .execute(&pool)
        .await
        .expect("seed role");
    let router = router(pool);

    let (status, body) = send(&router, get(&format!("/api/v1/teams/agile?roleId={role_id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Product owner");

    let (status, body) = send(
        &router,
        get(&format!("/api/v1/teams/agile?teamId={team_id}&type=roles&roleId={role_id}")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().map(Vec::len), Some(1));

    let (status, body) = send(&router, get("/api/v1/teams/agile?type=roles")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Invalid request parameters" }));

    let (status, body) = send(&router, get("/api/v1/teams/agile?roleId=7")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().is_some());
}
