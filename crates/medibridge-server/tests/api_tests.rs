//! End-to-end API tests against an in-memory directory and a scripted model.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use medibridge_core::{DirectorySeed, MediBridgeCore};
use medibridge_llm::{ScriptedModel, EXTRACTION_SCHEMA_NAME, RANKING_SCHEMA_NAME};
use medibridge_server::{router, AppState, Orchestrator};

const SEED: &str = r#"{"hospitals": [
    {"name": "瑞金医院", "departments": [
        {"name": "心内科", "doctors": [
            {"name": "张伟", "title": "主任医师", "expertise": "胸痛 冠心病介入", "recommendationScore": 9.2,
             "profileUrl": "https://www.haodf.com/doctor/1.html"},
            {"name": "李娜", "expertise": "心律失常", "recommendationScore": 8.7}
        ]},
        {"name": "呼吸科", "doctors": [
            {"name": "王强", "expertise": "慢性咳嗽 哮喘", "recommendationScore": 8.1}
        ]}
    ]},
    {"name": "华山医院", "departments": [
        {"name": "神经内科", "doctors": [
            {"name": "陈静", "expertise": "头痛 癫痫"}
        ]}
    ]}
]}"#;

const GATHERING: &str = r#"{"keywords":[],"symptoms":"","duration":"","age":null,"readyForRecommendation":false}"#;
const CHEST_PAIN: &str = r#"{"keywords":["胸痛","心内科"],"symptoms":"persistent chest pain and shortness of breath","duration":"","age":null,"readyForRecommendation":true}"#;

struct TestApp {
    router: Router,
    model: Arc<ScriptedModel>,
}

fn app() -> TestApp {
    let core = MediBridgeCore::open_in_memory().unwrap();
    core.seed_if_empty(&DirectorySeed::from_json(SEED).unwrap()).unwrap();
    let model = Arc::new(ScriptedModel::new());
    let orchestrator = Orchestrator::new(core, model.clone(), Duration::from_secs(5));
    TestApp {
        router: router(AppState::new(orchestrator)),
        model,
    }
}

async fn send(router: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), 1 << 20)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

/// Search never matches doctor names, so list everyone via the hospital suffix.
async fn doctor_id(router: &Router, name: &str) -> i64 {
    let (_, results) = send(
        router,
        "POST",
        "/api/doctors/search",
        Some(json!({"keywords": ["医院"], "limit": 50})),
    )
    .await;
    results
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["doctor"]["name"] == name)
        .map(|r| r["doctor"]["id"].as_i64().unwrap())
        .unwrap()
}

#[tokio::test]
async fn test_health() {
    let app = app();
    let (status, body) = send(&app.router, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["search"], "keyword");
}

#[tokio::test]
async fn test_get_session_unknown_is_null() {
    let app = app();
    let (status, body) = send(&app.router, "GET", "/api/chat/sessions/nope", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_null());
}

#[tokio::test]
async fn test_history_grows_by_two_per_turn() {
    let app = app();
    app.model.push_reply("How long has it lasted?").push_reply("How old are you?");
    app.model.push_structured(EXTRACTION_SCHEMA_NAME, GATHERING);
    app.model.push_structured(EXTRACTION_SCHEMA_NAME, GATHERING);

    let (status, first) = send(
        &app.router,
        "POST",
        "/api/chat/messages",
        Some(json!({"message": "I have a cough"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["message"], "How long has it lasted?");
    assert_eq!(first["recommendedDoctors"], json!([]));
    let session_id = first["sessionId"].as_str().unwrap().to_string();

    let uri = format!("/api/chat/sessions/{session_id}");
    let (_, after_one) = send(&app.router, "GET", &uri, None).await;
    assert_eq!(after_one["chatHistory"].as_array().unwrap().len(), 2);
    assert_eq!(after_one["stage"], "gathering");

    send(
        &app.router,
        "POST",
        "/api/chat/messages",
        Some(json!({"sessionId": session_id, "message": "About two weeks"})),
    )
    .await;

    let (_, after_two) = send(&app.router, "GET", &uri, None).await;
    let history = after_two["chatHistory"].as_array().unwrap();
    assert_eq!(history.len(), 4);
    let roles: Vec<&str> = history.iter().map(|m| m["role"].as_str().unwrap()).collect();
    assert_eq!(roles, vec!["user", "assistant", "user", "assistant"]);
    assert_eq!(history[2]["content"], "About two weeks");
}

#[tokio::test]
async fn test_chest_pain_scenario_recommends_resolvable_doctors() {
    let app = app();
    let zhang = doctor_id(&app.router, "张伟").await;
    let li = doctor_id(&app.router, "李娜").await;

    app.model.push_reply("I recommend Dr. 张伟 at 瑞金医院. You can book an appointment for triage.");
    app.model.push_structured(EXTRACTION_SCHEMA_NAME, CHEST_PAIN);
    app.model.push_structured(
        RANKING_SCHEMA_NAME,
        json!({"selectedDoctors": [
            {"doctorId": zhang, "reason": "Interventional cardiology for chest pain"},
            {"doctorId": 99999, "reason": "Not a candidate"},
            {"doctorId": li, "reason": "Cardiology"}
        ]})
        .to_string(),
    );

    let (status, body) = send(
        &app.router,
        "POST",
        "/api/chat/messages",
        Some(json!({"message": "I have persistent chest pain and shortness of breath", "chatHistory": []})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let keywords = body["extraction"]["keywords"].as_array().unwrap();
    assert!(keywords.iter().any(|k| k == "心内科"));
    assert_eq!(body["extraction"]["readyForRecommendation"], true);

    let recommended = body["recommendedDoctors"].as_array().unwrap();
    assert!((1..=5).contains(&recommended.len()));
    let ids: Vec<i64> = recommended.iter().map(|r| r["doctorId"].as_i64().unwrap()).collect();
    assert_eq!(ids, vec![zhang, li]);

    for id in ids {
        let (status, listing) = send(&app.router, "GET", &format!("/api/doctors/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listing["doctor"]["id"], id);
        assert_eq!(listing["hospital"]["name"], "瑞金医院");
    }

    let session_id = body["sessionId"].as_str().unwrap();
    let (_, session) = send(&app.router, "GET", &format!("/api/chat/sessions/{session_id}"), None).await;
    assert_eq!(session["stage"], "recommending");
    assert_eq!(session["recommendedDoctors"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_malformed_extraction_fails_turn_and_persists_nothing() {
    let app = app();
    app.model.push_reply("Hello!");
    app.model.push_structured(EXTRACTION_SCHEMA_NAME, r#"{"keywords": "not-a-list"}"#);

    let (status, body) = send(
        &app.router,
        "POST",
        "/api/chat/messages",
        Some(json!({"sessionId": "s-broken", "message": "hello"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"]["code"], "TURN_FAILED");

    let (_, session) = send(&app.router, "GET", "/api/chat/sessions/s-broken", None).await;
    assert!(session.is_null());
}

#[tokio::test]
async fn test_empty_message_still_produces_turn() {
    let app = app();
    app.model.push_reply("Could you describe your symptoms?");
    app.model.push_structured(EXTRACTION_SCHEMA_NAME, GATHERING);

    let (status, body) = send(
        &app.router,
        "POST",
        "/api/chat/messages",
        Some(json!({"message": ""})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Could you describe your symptoms?");
    assert_eq!(body["extraction"]["keywords"], json!([]));
}

#[tokio::test]
async fn test_get_doctor_unknown_is_null_and_lookup_is_idempotent() {
    let app = app();
    let (status, body) = send(&app.router, "GET", "/api/doctors/424242", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_null());

    let id = doctor_id(&app.router, "王强").await;
    let (_, first) = send(&app.router, "GET", &format!("/api/doctors/{id}"), None).await;
    let (_, second) = send(&app.router, "GET", &format!("/api/doctors/{id}"), None).await;
    assert_eq!(first, second);
    assert_eq!(first["department"]["name"], "呼吸科");
}

#[tokio::test]
async fn test_search_ordering_and_limit() {
    let app = app();
    let (status, results) = send(
        &app.router,
        "POST",
        "/api/doctors/search",
        Some(json!({"keywords": ["瑞金"]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = results
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["doctor"]["name"].as_str().unwrap())
        .collect();
    // Linked profile first, then score descending.
    assert_eq!(names, vec!["张伟", "李娜", "王强"]);

    let (_, limited) = send(
        &app.router,
        "POST",
        "/api/doctors/search",
        Some(json!({"keywords": ["瑞金"], "limit": 1})),
    )
    .await;
    assert_eq!(limited.as_array().unwrap().len(), 1);

    let (status, body) = send(
        &app.router,
        "POST",
        "/api/doctors/search",
        Some(json!({"keywords": ["瑞金"], "limit": 100000})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_hospitals_departments_and_department_doctors() {
    let app = app();
    let (status, hospitals) = send(&app.router, "GET", "/api/hospitals", None).await;
    assert_eq!(status, StatusCode::OK);
    let hospitals = hospitals.as_array().unwrap();
    assert_eq!(hospitals.len(), 2);

    let ruijin = hospitals.iter().find(|h| h["name"] == "瑞金医院").unwrap();
    let hospital_id = ruijin["id"].as_i64().unwrap();

    let (_, departments) = send(
        &app.router,
        "GET",
        &format!("/api/hospitals/{hospital_id}/departments"),
        None,
    )
    .await;
    let departments = departments.as_array().unwrap();
    assert_eq!(departments.len(), 2);

    let cardiology = departments.iter().find(|d| d["name"] == "心内科").unwrap();
    let department_id = cardiology["id"].as_i64().unwrap();

    let (_, doctors) = send(
        &app.router,
        "GET",
        &format!("/api/departments/{department_id}/doctors?limit=1"),
        None,
    )
    .await;
    let doctors = doctors.as_array().unwrap();
    assert_eq!(doctors.len(), 1);
    assert_eq!(doctors[0]["doctor"]["name"], "张伟");
}

#[tokio::test]
async fn test_department_highlights() {
    let app = app();
    let (status, highlights) = send(
        &app.router,
        "GET",
        "/api/departments/highlights?departments=2&perDepartment=1",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let highlights = highlights.as_array().unwrap();
    assert_eq!(highlights.len(), 2);
    for highlight in highlights {
        assert!(highlight["doctors"].as_array().unwrap().len() <= 1);
    }
}
