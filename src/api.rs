//! HTTP API for the Obra Engine.
//!
//! This module exposes the cost estimator and the PILA calculator over
//! a small JSON API built on [`axum`].  Templates come from the catalog
//! loaded at start-up; generated submissions are kept in an in-memory
//! [`SubmissionStore`].  Invalid input maps to `400`, unknown templates
//! and submissions to `404`, always with an `{"error": ...}` body.

use crate::catalog::{load_catalog, TemplateCatalog};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::estimate::estimate_from_catalog;
use crate::models::{
    ArlRiskClass, CalculationFactors, Employee, EstimationItem, SubmissionStatus, TemplateSummary,
};
use crate::personnel::{active_employees, PersonnelRecord};
use crate::pila::generate_pila_with_class;
use crate::store::SubmissionStore;
use anyhow::{Context, Result};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Application state shared across requests.
pub struct AppState {
    /// Templates and presets loaded at start-up.
    pub catalog: Arc<dyn TemplateCatalog>,
    /// PILA submissions generated through the API.
    pub submissions: SubmissionStore,
    /// ARL class used when a request does not name one.
    pub default_arl_class: ArlRiskClass,
}

impl AppState {
    pub fn new(catalog: Arc<dyn TemplateCatalog>, default_arl_class: ArlRiskClass) -> Self {
        Self {
            catalog,
            submissions: SubmissionStore::new(),
            default_arl_class,
        }
    }
}

/// Body of `POST /api/estimate`.
#[derive(Debug, Deserialize)]
pub struct EstimateRequest {
    /// Catalog id of the template to price against.
    pub template_id: String,
    /// Line items; an empty list yields a zero estimation.
    #[serde(default)]
    pub items: Vec<EstimationItem>,
    /// Project duration, must be positive.
    pub duration_days: f64,
    /// Apply the labor benefit factor.
    #[serde(default)]
    pub apply_benefits: bool,
    /// Overrides the template's factors when present.
    #[serde(default)]
    pub factors: Option<CalculationFactors>,
}

/// Body of `POST /api/pila`.
///
/// Employees may be sent already resolved, as directory records, or both.
#[derive(Debug, Deserialize)]
pub struct PilaRequest {
    /// Filing month, `YYYY-MM`.
    pub period: String,
    /// Employees with a resolved monthly salary.
    #[serde(default)]
    pub employees: Vec<Employee>,
    /// Directory records; inactive ones are skipped.
    #[serde(default)]
    pub personnel: Vec<PersonnelRecord>,
    /// Falls back to the server's default class.
    #[serde(default)]
    pub arl_class: Option<ArlRiskClass>,
}

/// Query string of `GET /api/pila/submissions`.
#[derive(Debug, Deserialize)]
pub struct SubmissionQuery {
    /// Only return submissions for this `YYYY-MM` month.
    pub period: Option<String>,
}

/// Body of `PATCH /api/pila/submissions/:id/status`.
#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    /// Target status; must be a forward move.
    pub status: SubmissionStatus,
}

/// Build the API router around `state`.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/templates", get(list_templates_handler))
        .route("/api/templates/:id", get(get_template_handler))
        .route("/api/templates/:id/presets", get(list_presets_handler))
        .route("/api/estimate", post(estimate_handler))
        .route("/api/pila", post(pila_handler))
        .route("/api/pila/submissions", get(list_submissions_handler))
        .route("/api/pila/submissions/:id/status", patch(update_status_handler))
        .with_state(state)
}

/// Load the catalog named by `config` and build the router.
pub fn build_app(config: &EngineConfig) -> Result<(Router, Arc<AppState>)> {
    let catalog = load_catalog(&config.template_dir).with_context(|| {
        format!("loading templates from {}", config.template_dir.display())
    })?;
    let state = Arc::new(AppState::new(Arc::new(catalog), config.default_arl_class));
    Ok((build_router(state.clone()), state))
}

pub async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

pub async fn list_templates_handler(
    State(state): State<Arc<AppState>>,
) -> Json<Vec<TemplateSummary>> {
    Json(state.catalog.templates().into_iter().map(|t| t.summary()).collect())
}

pub async fn get_template_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    match state.catalog.template(&id) {
        Some(template) => Json(template.clone()).into_response(),
        None => error_response(EngineError::TemplateNotFound(id)),
    }
}

pub async fn list_presets_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    if state.catalog.template(&id).is_none() {
        return error_response(EngineError::TemplateNotFound(id));
    }
    let presets: Vec<_> = state.catalog.presets(&id).into_iter().cloned().collect();
    Json(presets).into_response()
}

pub async fn estimate_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<EstimateRequest>,
) -> Response {
    match estimate_from_catalog(
        state.catalog.as_ref(),
        &req.template_id,
        &req.items,
        req.duration_days,
        req.apply_benefits,
        req.factors,
    ) {
        Ok(estimation) => {
            if estimation.has_warnings() {
                warn!(
                    template = %estimation.template_id,
                    unresolved = estimation.unresolved.len(),
                    "estimation returned with unpriced items"
                );
            }
            Json(estimation).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub async fn pila_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PilaRequest>,
) -> Response {
    // Directory records are resolved to monthly salaries first.
    let mut employees = req.employees;
    employees.extend(active_employees(&req.personnel));
    let arl_class = req.arl_class.unwrap_or(state.default_arl_class);
    match generate_pila_with_class(&req.period, &employees, arl_class) {
        Ok(submission) => {
            let stored = state.submissions.insert(submission).await;
            (StatusCode::CREATED, Json(stored)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub async fn list_submissions_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SubmissionQuery>,
) -> Response {
    let submissions = match query.period {
        Some(period) => state.submissions.by_period(&period).await,
        None => state.submissions.list().await,
    };
    Json(submissions).into_response()
}

pub async fn update_status_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(update): Json<StatusUpdate>,
) -> Response {
    match state.submissions.transition(&id, update.status).await {
        Ok(submission) => Json(submission).into_response(),
        Err(err) => error_response(err),
    }
}

fn error_response(err: EngineError) -> Response {
    let status = match &err {
        EngineError::InvalidInput(_) | EngineError::InvalidTransition { .. } => {
            StatusCode::BAD_REQUEST
        }
        EngineError::TemplateNotFound(_) | EngineError::SubmissionNotFound(_) => {
            StatusCode::NOT_FOUND
        }
        EngineError::Catalog(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        warn!(error = %err, "request failed");
    }
    let body = Json(serde_json::json!({"error": err.to_string()}));
    (status, body).into_response()
}

/// Launch the API server.  Blocks until the server terminates.
pub async fn serve(config: &EngineConfig) -> Result<()> {
    let (router, _state) = build_app(config)?;
    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.bind_addr))?;
    info!(addr = %config.bind_addr, "server listening");
    axum::serve(listener, router).await?;
    Ok(())
}
