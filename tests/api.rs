//! Router-level tests: requests go through `build_router` with `oneshot`,
//! backed by the in-memory store and a fake judge.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use writing_quest_backend::config::{AppConfig, UserCfg};
use writing_quest_backend::domain::RawScores;
use writing_quest_backend::judge::{Judge, JudgeError, UnavailableJudge};
use writing_quest_backend::quest::today_jst;
use writing_quest_backend::routes::build_router;
use writing_quest_backend::state::AppState;

struct FixedJudge;

#[async_trait]
impl Judge for FixedJudge {
    async fn score(&self, _: Option<&str>, _: &str, _: u32, _: u32) -> Result<RawScores, JudgeError> {
        Ok(RawScores { grammar: 20.0, logic: 18.0, context: 22.0, fluency: 19.0, feedback: "Clear structure.".into() })
    }
}

async fn app(judge: Arc<dyn Judge>) -> Router {
    let mut config = AppConfig::default();
    config.users.push(UserCfg { id: "amy".into(), display_name: "Amy".into(), email: String::new() });
    config.users.push(UserCfg { id: "ben".into(), display_name: "Ben".into(), email: String::new() });
    build_router(Arc::new(AppState::build(config, judge, true).await))
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let res = app.clone().oneshot(req).await.expect("response");
    let status = res.status();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.expect("body");
    let body = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).expect("json body") };
    (status, body)
}

fn get(uri: &str, user: Option<&str>) -> Request<Body> {
    let mut b = Request::builder().method("GET").uri(uri);
    if let Some(u) = user {
        b = b.header("x-user-id", u);
    }
    b.body(Body::empty()).unwrap()
}

fn post_json(method: &str, uri: &str, user: Option<&str>, body: Value) -> Request<Body> {
    let mut b = Request::builder().method(method).uri(uri).header("content-type", "application/json");
    if let Some(u) = user {
        b = b.header("x-user-id", u);
    }
    b.body(Body::from(body.to_string())).unwrap()
}

fn essay(words: usize) -> String {
    vec!["growth"; words].join(" ")
}

fn today_quest_id() -> String {
    format!("daily-{}", today_jst())
}

#[tokio::test]
async fn health_reports_judge() {
    let app = app(Arc::new(FixedJudge)).await;
    let (status, body) = send(&app, get("/api/v1/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "ok": true, "judge": true }));
}

#[tokio::test]
async fn today_quest_is_seeded() {
    let app = app(Arc::new(FixedJudge)).await;
    let (status, body) = send(&app, get("/api/v1/quests/today", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["questId"], today_quest_id());
    assert_eq!(body["wordCountMin"], 100);
    assert_eq!(body["isActive"], true);
}

#[tokio::test]
async fn submission_flow_feeds_reads_and_rankings() {
    let app = app(Arc::new(FixedJudge)).await;
    let quest_id = today_quest_id();

    let (status, created) = send(
        &app,
        post_json("POST", "/api/v1/submissions", Some("amy"), json!({ "questId": quest_id, "answer": essay(150) })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["status"], "completed");
    assert_eq!(created["scores"]["total"], 79);
    assert_eq!(created["scores"]["isCorrect"], true);
    assert_eq!(created["wordCount"], 150);
    assert_eq!(created["feedback"], "Clear structure.");
    let id = created["submissionId"].as_str().unwrap().to_string();

    let (status, fetched) = send(&app, get(&format!("/api/v1/submissions/{id}"), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["submissionId"], id);

    let (status, mine) = send(&app, get("/api/v1/submissions", Some("amy"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine["submissionId"], id);
    assert_eq!(mine["questTitle"], "Remote work policy");

    // Ben's essay is withheld: no rank, no average.
    let (status, _) = send(
        &app,
        post_json("POST", "/api/v1/submissions", Some("ben"), json!({ "questId": quest_id, "answer": essay(20) })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, board) = send(&app, get("/api/v1/leaderboard/daily", None)).await;
    assert_eq!(board["questId"], quest_id);
    assert_eq!(board["totalUsers"], 1);
    assert_eq!(board["ranking"][0]["displayName"], "Amy");
    assert_eq!(board["ranking"][0]["rank"], 1);

    let (_, stats) = send(&app, get("/api/v1/users/me/stats", Some("amy"))).await;
    assert_eq!(stats, json!({ "todayScore": 79, "rank": 1, "streak": 1, "totalScore": 79, "submissionCount": 1 }));

    let (_, ben_stats) = send(&app, get("/api/v1/users/me/stats", Some("ben"))).await;
    assert_eq!(ben_stats["todayScore"], Value::Null);
    assert_eq!(ben_stats["submissionCount"], 1);

    let (_, avg) = send(&app, get("/api/v1/users/me/average", Some("amy"))).await;
    assert_eq!(avg, json!({ "averageScore": 79.0, "counted": 1 }));

    let (_, history) = send(&app, get("/api/v1/users/me/submissions", Some("amy"))).await;
    assert_eq!(history["submissions"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn missing_answer_is_a_validation_error() {
    let app = app(Arc::new(FixedJudge)).await;
    let (status, body) = send(
        &app,
        post_json("POST", "/api/v1/submissions", Some("amy"), json!({ "questId": today_quest_id() })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert_eq!(body["message"], "answer is required");
    assert!(body.get("submissionId").is_none());
}

#[tokio::test]
async fn unknown_quest_is_not_found() {
    let app = app(Arc::new(FixedJudge)).await;
    let (status, body) = send(
        &app,
        post_json("POST", "/api/v1/submissions", None, json!({ "questId": "nope", "answer": essay(120) })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");

    let (status, _) = send(&app, get("/api/v1/submissions/does-not-exist", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn judge_failure_returns_submission_id_and_error_record() {
    let app = app(Arc::new(UnavailableJudge)).await;
    let (status, body) = send(
        &app,
        post_json("POST", "/api/v1/submissions", Some("amy"), json!({ "questId": today_quest_id(), "answer": essay(150) })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["code"], "SCORING_FAILED");

    let id = body["submissionId"].as_str().expect("submission id").to_string();
    let (status, record) = send(&app, get(&format!("/api/v1/submissions/{id}"), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(record["status"], "error");
    assert_eq!(record["scores"], Value::Null);
}

#[tokio::test]
async fn personal_endpoints_need_a_user() {
    let app = app(Arc::new(FixedJudge)).await;
    for uri in ["/api/v1/users/me/stats", "/api/v1/users/me/average", "/api/v1/users/me/submissions", "/api/v1/submissions"] {
        let (status, body) = send(&app, get(uri, None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(body["code"], "USER_REQUIRED");
    }
}

#[tokio::test]
async fn quest_and_user_admin() {
    let app = app(Arc::new(FixedJudge)).await;
    let date = today_jst().succ_opt().unwrap().to_string();

    let (status, quest) = send(
        &app,
        post_json(
            "PUT",
            "/api/v1/quests/tomorrow",
            None,
            json!({ "date": date, "title": "Budget cuts", "prompt": "Defend a line item.", "wordCountMin": 80, "wordCountMax": 160 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(quest["questId"], "tomorrow");
    assert_eq!(quest["difficulty"], "medium");

    let (status, _) = send(&app, get("/api/v1/quests/tomorrow", None)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        post_json(
            "PUT",
            "/api/v1/quests/broken",
            None,
            json!({ "date": date, "title": "Bad", "prompt": "x", "wordCountMin": 300, "wordCountMax": 100 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, user) = send(
        &app,
        post_json("POST", "/api/v1/users", None, json!({ "id": "cat", "displayName": "Cat", "email": "cat@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(user["userId"], "cat");
    assert_eq!(user["submissionCount"], 0);

    let (status, _) = send(&app, post_json("POST", "/api/v1/users", None, json!({ "displayName": "Nobody" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
