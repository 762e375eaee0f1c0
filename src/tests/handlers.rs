use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

use crate::{
    app,
    common::app_state::AppState,
    game::{memory::MemoryBackend, models::GameRules, store::SessionStore},
    mw::player_mw::PLAYER_HEADER,
    tests::fixtures::{seeded_backend, setup_logging},
};

fn setup() -> (Router, Arc<AppState<MemoryBackend>>) {
    setup_logging();
    let state = AppState::with_rules(seeded_backend(2), GameRules::default(), 20);
    (app(state.clone()), state)
}

fn request(method: &str, uri: &str, player: Option<Uuid>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(player) = player {
        builder = builder.header(PLAYER_HEADER, player.to_string());
    }

    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(router: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

async fn create(router: &Router, player: Uuid) -> Uuid {
    let (status, body) = send(router, request("POST", "/games", Some(player), None)).await;
    assert_eq!(status, StatusCode::CREATED);
    body["game"]["id"].as_str().unwrap().parse().unwrap()
}

#[tokio::test]
async fn rejects_requests_without_player() {
    let (router, _) = setup();

    let (status, body) = send(&router, request("POST", "/games", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());

    let req = Request::builder()
        .method("GET")
        .uri("/games")
        .header(PLAYER_HEADER, "not-a-uuid")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&router, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn create_then_existing() {
    let (router, _) = setup();
    let player = Uuid::new_v4();

    let (status, first) = send(&router, request("POST", "/games", Some(player), None)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(first["existing"], json!(false));
    assert_eq!(first["game"]["status"], json!("in_progress"));
    assert_eq!(first["game"]["current_level"], json!(0));
    assert_eq!(first["game"]["question"]["variants"].as_object().unwrap().len(), 4);

    let (status, second) = send(&router, request("POST", "/games", Some(player), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["existing"], json!(true));
    assert_eq!(second["game"]["id"], first["game"]["id"]);
}

#[tokio::test]
async fn view_never_reveals_correct_answer() {
    let (router, _) = setup();
    let player = Uuid::new_v4();
    let game_id = create(&router, player).await;

    let (status, body) = send(
        &router,
        request("GET", &format!("/games/{}", game_id), Some(player), None),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let question = body["question"].as_object().unwrap();
    assert!(question.get("mapping").is_none());
    assert!(question.get("correct").is_none());
    assert!(body.get("questions").is_none());
}

#[tokio::test]
async fn answering_correctly_advances() {
    let (router, state) = setup();
    let player = Uuid::new_v4();
    let game_id = create(&router, player).await;

    let session = state
        .get_backend()
        .find_active_by_player(player)
        .await
        .unwrap()
        .unwrap();
    let letter = session.current_game_question().unwrap().correct_answer_key();

    let (status, body) = send(
        &router,
        request(
            "PUT",
            &format!("/games/{}/answer", game_id),
            Some(player),
            Some(json!({ "letter": letter.as_str().to_uppercase() })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"]["result"], json!("correct"));
    assert_eq!(body["outcome"]["level"], json!(1));
    assert_eq!(body["game"]["current_level"], json!(1));
    assert_eq!(body["game"]["status"], json!("in_progress"));
}

#[tokio::test]
async fn invalid_letter_is_bad_request() {
    let (router, _) = setup();
    let player = Uuid::new_v4();
    let game_id = create(&router, player).await;

    let (status, body) = send(
        &router,
        request(
            "PUT",
            &format!("/games/{}/answer", game_id),
            Some(player),
            Some(json!({ "letter": "e" })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn take_money_on_first_question_is_unprocessable() {
    let (router, _) = setup();
    let player = Uuid::new_v4();
    let game_id = create(&router, player).await;

    let (status, _) = send(
        &router,
        request(
            "PUT",
            &format!("/games/{}/take-money", game_id),
            Some(player),
            None,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn unknown_and_foreign_games_are_not_found() {
    let (router, _) = setup();
    let owner = Uuid::new_v4();
    let game_id = create(&router, owner).await;

    let (status, _) = send(
        &router,
        request("GET", &format!("/games/{}", Uuid::new_v4()), Some(owner), None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &router,
        request("GET", &format!("/games/{}", game_id), Some(Uuid::new_v4()), None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn fifty_fifty_leaves_two_variants() {
    let (router, _) = setup();
    let player = Uuid::new_v4();
    let game_id = create(&router, player).await;
    let uri = format!("/games/{}/help", game_id);

    let (status, body) = send(
        &router,
        request("PUT", &uri, Some(player), Some(json!({ "help_type": "fifty_fifty" }))),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"]["result"], json!("applied"));
    assert_eq!(body["outcome"]["hint"]["fifty_fifty"].as_array().unwrap().len(), 2);
    assert_eq!(body["game"]["fifty_fifty_used"], json!(true));
    assert_eq!(
        body["game"]["question"]["hints"]["fifty_fifty"]
            .as_array()
            .unwrap()
            .len(),
        2
    );

    let (status, _) = send(
        &router,
        request("PUT", &uri, Some(player), Some(json!({ "help_type": "fifty_fifty" }))),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn lists_games_and_balance() {
    let (router, _) = setup();
    let player = Uuid::new_v4();
    create(&router, player).await;

    let (status, body) = send(&router, request("GET", "/games?page_num=0", Some(player), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"].as_array().unwrap().len(), 1);
    assert_eq!(body["has_next"], json!(false));

    let (status, body) = send(&router, request("GET", "/player/balance", Some(player), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["balance"], json!(0));
    assert_eq!(body["player_id"], json!(player.to_string()));
}

#[tokio::test]
async fn health_is_public() {
    let (router, _) = setup();

    let (status, _) = send(&router, request("GET", "/health", None, None)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&router, request("GET", "/health/detailed", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["database"], json!(true));
}
