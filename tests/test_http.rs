use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use game_hub_be::{
    backend::memory::{MemoryBackend, MemoryOp},
    catalog::MemoryCatalog,
    config::{BackendKind, Config, RawgConfig},
    create_app,
    models::{Game, Screenshot},
    state::AppState,
};
use serde_json::{Value, json};
use tower::ServiceExt;

fn config() -> Config {
    Config {
        port: 0,
        allowed_origins: vec!["http://localhost:8081".into()],
        backend: BackendKind::Memory,
        parse: None,
        rawg: RawgConfig {
            base_url: "http://rawg.invalid".into(),
            api_key: "test".into(),
        },
        avatar_function: "atualizarAvatar".into(),
        rate_limit_per_minute: 10_000,
    }
}

fn game(id: u64, name: &str) -> Game {
    serde_json::from_value(json!({ "id": id, "name": name })).unwrap()
}

async fn app() -> (Router, MemoryBackend) {
    let backend = MemoryBackend::new();
    let catalog = MemoryCatalog::new();
    catalog
        .insert(
            game(3498, "Grand Theft Auto V"),
            vec![Screenshot {
                id: 1,
                image: "https://media.example/1.jpg".into(),
            }],
            vec![game(3070, "Grand Theft Auto IV")],
        )
        .await;

    let state = AppState::new(
        Arc::new(backend.clone()),
        Arc::new(backend.clone()),
        Arc::new(catalog),
        "atualizarAvatar",
    );
    (create_app(state, &config()), backend)
}

async fn call(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn sign_up(app: &Router, name: &str, email: &str) -> String {
    let (status, body) = call(
        app,
        "POST",
        "/auth/signup",
        None,
        Some(json!({
            "name": name,
            "email": email,
            "password": "hunter22",
            "confirmPassword": "hunter22",
            "avatar": "game-controller"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["sessionToken"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_game_detail_route() {
    let (app, _) = app().await;

    let (status, body) = call(&app, "GET", "/games/3498", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["game"]["name"], json!("Grand Theft Auto V"));
    assert_eq!(body["screenshots"].as_array().unwrap().len(), 1);
    assert_eq!(body["relatedGames"][0]["id"], json!(3070));

    let (status, _) = call(&app, "GET", "/games/1", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_review_flow() {
    let (app, backend) = app().await;
    let token = sign_up(&app, "Ana", "ana@example.com").await;

    let (status, _) = call(
        &app,
        "POST",
        "/games/3498/reviews",
        Some(&token),
        Some(json!({ "gameName": "Grand Theft Auto V", "score": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(backend.calls(MemoryOp::Create).await, 0);

    let (status, body) = call(
        &app,
        "POST",
        "/games/3498/reviews",
        Some(&token),
        Some(json!({ "gameName": "Grand Theft Auto V", "score": 5, "comment": "Huge map" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["stats"]["totalCount"], json!(1));
    assert_eq!(body["reviews"][0]["displayName"], json!("Ana"));
    assert_eq!(body["reviews"][0]["hasComment"], json!(true));

    let (_, body) = call(
        &app,
        "POST",
        "/games/3498/reviews",
        Some(&token),
        Some(json!({ "gameName": "Grand Theft Auto V", "score": 4 })),
    )
    .await;
    assert_eq!(body["displayAverage"], json!("4.5"));

    let (status, body) = call(&app, "GET", "/games/3498/reviews", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["stats"]["totalCount"], json!(2));
    assert_eq!(body["stats"]["commentedCount"], json!(1));
    assert_eq!(body["reviews"][0]["score"], json!(4));

    let (status, body) = call(&app, "GET", "/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["avatar"], json!("game-controller"));
    assert_eq!(body["stats"]["totalCount"], json!(2));

    let (_, mine) = call(&app, "GET", "/me/reviews", Some(&token), None).await;
    let id = mine["reviews"][0]["id"].as_str().unwrap().to_string();

    let (status, body) = call(&app, "DELETE", &format!("/reviews/{id}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["stats"]["totalCount"], json!(1));

    let (status, _) = call(&app, "DELETE", &format!("/reviews/{id}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, mine) = call(&app, "GET", "/me/reviews", Some(&token), None).await;
    assert_eq!(mine["stats"]["totalCount"], json!(1));
}

#[tokio::test]
async fn test_protected_routes_need_a_valid_token() {
    let (app, _) = app().await;

    let (status, _) = call(&app, "GET", "/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = call(&app, "GET", "/me", Some("r:forged"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let token = sign_up(&app, "Ana", "ana@example.com").await;
    let (status, _) = call(&app, "POST", "/auth/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = call(&app, "GET", "/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_profile_routes() {
    let (app, _) = app().await;
    let token = sign_up(&app, "Ana", "ana@example.com").await;

    let (status, body) = call(
        &app,
        "PUT",
        "/me/avatar",
        Some(&token),
        Some(json!({ "avatar": "skull" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], json!("committed"));
    assert_eq!(body["current"], json!("skull"));

    let (status, body) = call(
        &app,
        "PUT",
        "/me/email",
        Some(&token),
        Some(json!({ "email": "ana.new@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], json!("ana.new@example.com"));

    let (status, _) = call(
        &app,
        "PUT",
        "/me/password",
        Some(&token),
        Some(json!({
            "currentPassword": "wrong",
            "newPassword": "n3w-secret",
            "confirmPassword": "n3w-secret"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = call(
        &app,
        "PUT",
        "/me/password",
        Some(&token),
        Some(json!({
            "currentPassword": "hunter22",
            "newPassword": "n3w-secret",
            "confirmPassword": "n3w-secret"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let new_token = body["sessionToken"].as_str().unwrap();
    assert_ne!(new_token, token);

    let (status, body) = call(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": "ana@example.com", "password": "n3w-secret" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["account"]["avatar"], json!("skull"));
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let (app, _) = app().await;

    let (status, _) = call(&app, "GET", "/nope", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
