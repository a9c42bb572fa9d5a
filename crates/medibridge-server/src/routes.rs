//! HTTP API router.
//!
//! Routes are nested under `/api/`. Lookups of unknown ids answer `200 null`
//! rather than 404, matching how clients look up sessions and doctors.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use medibridge_core::{
    ChatMessage, ConversationStage, Department, DepartmentHighlight, DoctorListing, Hospital,
    PatientSession, Recommendation, DEFAULT_DEPARTMENT_LIMIT, DEFAULT_SEARCH_LIMIT,
};
use medibridge_llm::Extraction;

use crate::error::ApiError;
use crate::orchestrator::{run_blocking, Orchestrator};

/// Upper bound on any caller-supplied result limit.
pub const MAX_RESULT_LIMIT: usize = 200;

pub const DEFAULT_HIGHLIGHT_DEPARTMENTS: usize = 24;
pub const DEFAULT_HIGHLIGHT_DOCTORS: usize = 2;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
}

impl AppState {
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
        }
    }
}

/// Build the API router with tracing and permissive CORS.
pub fn router(state: AppState) -> Router {
    // NOTE: Path params use `:param` syntax (axum 0.7).
    let api = Router::new()
        .route("/chat/messages", post(send_message))
        .route("/chat/sessions/:session_id", get(get_session))
        .route("/doctors/search", post(search_doctors))
        .route("/doctors/:id", get(get_doctor))
        .route("/departments/highlights", get(department_highlights))
        .route("/departments/:id/doctors", get(doctors_by_department))
        .route("/hospitals", get(list_hospitals))
        .route("/hospitals/:id/departments", get(departments_by_hospital));

    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

fn checked_limit(limit: Option<usize>, default: usize) -> Result<usize, ApiError> {
    match limit {
        None => Ok(default),
        Some(limit) if limit > MAX_RESULT_LIMIT => Err(ApiError::BadRequest(format!(
            "limit must be at most {MAX_RESULT_LIMIT}"
        ))),
        Some(limit) => Ok(limit),
    }
}

// =========================================================================
// Chat
// =========================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub session_id: Option<String>,
    pub message: String,
    #[serde(default)]
    pub chat_history: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageResponse {
    pub session_id: String,
    pub message: String,
    pub recommended_doctors: Vec<Recommendation>,
    pub extraction: Extraction,
}

async fn send_message(
    State(state): State<AppState>,
    Json(req): Json<SendMessageRequest>,
) -> Result<Json<SendMessageResponse>, ApiError> {
    let outcome = state
        .orchestrator
        .handle_turn(req.session_id, req.message, req.chat_history)
        .await?;

    Ok(Json(SendMessageResponse {
        session_id: outcome.session_id,
        message: outcome.reply,
        recommended_doctors: outcome.recommendations,
        extraction: outcome.extraction,
    }))
}

/// Stored session plus its derived conversation stage.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    #[serde(flatten)]
    pub session: PatientSession,
    pub stage: ConversationStage,
}

async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<Option<SessionView>>, ApiError> {
    let session = run_blocking(state.orchestrator.core(), move |core| {
        core.get_session(&session_id)
    })
    .await?;

    Ok(Json(session.map(|session| SessionView {
        stage: session.stage(),
        session,
    })))
}

// =========================================================================
// Doctors
// =========================================================================

async fn get_doctor(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Option<DoctorListing>>, ApiError> {
    let listing = run_blocking(state.orchestrator.core(), move |core| core.get_doctor(id)).await?;
    Ok(Json(listing))
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub keywords: Vec<String>,
    pub limit: Option<usize>,
}

async fn search_doctors(
    State(state): State<AppState>,
    Json(req): Json<SearchRequest>,
) -> Result<Json<Vec<DoctorListing>>, ApiError> {
    let limit = checked_limit(req.limit, DEFAULT_SEARCH_LIMIT)?;
    let keywords = req.keywords;
    let results = run_blocking(state.orchestrator.core(), move |core| {
        core.search_doctors(&keywords, limit)
    })
    .await?;
    Ok(Json(results))
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

async fn doctors_by_department(
    State(state): State<AppState>,
    Path(department_id): Path<i64>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<DoctorListing>>, ApiError> {
    let limit = checked_limit(query.limit, DEFAULT_DEPARTMENT_LIMIT)?;
    let results = run_blocking(state.orchestrator.core(), move |core| {
        core.doctors_by_department(department_id, limit)
    })
    .await?;
    Ok(Json(results))
}

// =========================================================================
// Hospitals and departments
// =========================================================================

async fn list_hospitals(State(state): State<AppState>) -> Result<Json<Vec<Hospital>>, ApiError> {
    let hospitals = run_blocking(state.orchestrator.core(), |core| core.list_hospitals()).await?;
    Ok(Json(hospitals))
}

async fn departments_by_hospital(
    State(state): State<AppState>,
    Path(hospital_id): Path<i64>,
) -> Result<Json<Vec<Department>>, ApiError> {
    let departments = run_blocking(state.orchestrator.core(), move |core| {
        core.departments_by_hospital(hospital_id)
    })
    .await?;
    Ok(Json(departments))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HighlightQuery {
    pub departments: Option<usize>,
    pub per_department: Option<usize>,
}

async fn department_highlights(
    State(state): State<AppState>,
    Query(query): Query<HighlightQuery>,
) -> Result<Json<Vec<DepartmentHighlight>>, ApiError> {
    let departments = checked_limit(query.departments, DEFAULT_HIGHLIGHT_DEPARTMENTS)?;
    let per_department = checked_limit(query.per_department, DEFAULT_HIGHLIGHT_DOCTORS)?;
    let highlights = run_blocking(state.orchestrator.core(), move |core| {
        core.department_highlights(departments, per_department)
    })
    .await?;
    Ok(Json(highlights))
}

// =========================================================================
// Health
// =========================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub search: &'static str,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        search: state.orchestrator.core().search_strategy(),
    })
}
