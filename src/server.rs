//! HTTP evaluation service.
//!
//! Stateless: every request carries the subject masks it wants evaluated and
//! every response carries the resulting mask. Persisting masks stays with the
//! caller.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::engine::Engine;
use crate::error::{Error, PolicyError};
use crate::mask::Mask;
use crate::policy::{authorize_permission_update, Principal};
use crate::registry::Permission;
use crate::subject::Subject;

type AppState = Arc<Engine>;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SubjectRequest {
    pub subject: Subject,
}

#[derive(Debug, Deserialize)]
pub struct CheckRequest {
    pub subject: Subject,
    pub permissions: Vec<String>,
    #[serde(default)]
    pub match_any: bool,
}

#[derive(Debug, Deserialize)]
pub struct MutateRequest {
    pub subject: Subject,
    pub permission: String,
}

#[derive(Debug, Deserialize)]
pub struct NamesRequest {
    pub permissions: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ParseRequest {
    pub mask: String,
}

#[derive(Debug, Deserialize)]
pub struct PrincipalBody {
    pub id: String,
    pub subject: Subject,
}

#[derive(Debug, Deserialize)]
pub struct AuthorizeUpdateRequest {
    pub actor: PrincipalBody,
    pub target: PrincipalBody,
    /// Proposed own mask, decimal wire form
    pub permissions: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PermissionInfo {
    pub name: String,
    pub bit: u32,
    pub depends_on: Vec<String>,
    pub dependants: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MaskResponse {
    pub mask: Mask,
    pub permissions: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CheckResponse {
    pub allowed: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MutateResponse {
    pub mask: Mask,
    pub changed: bool,
    pub blocked_by: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Unauthorized(String),
    Forbidden(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m),
            ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m),
            ApiError::Unauthorized(m) => (StatusCode::UNAUTHORIZED, m),
            ApiError::Forbidden(m) => (StatusCode::FORBIDDEN, m),
        };
        (status, Json(ErrorResponse { error })).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        ApiError::BadRequest(e.to_string())
    }
}

impl From<PolicyError> for ApiError {
    fn from(e: PolicyError) -> Self {
        match e {
            PolicyError::Unauthorized { .. } => ApiError::Unauthorized(e.to_string()),
            PolicyError::Forbidden(_) => ApiError::Forbidden(e.to_string()),
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn lookup<'e>(engine: &'e Engine, name: &str) -> Result<&'e Permission, ApiError> {
    engine
        .get_permission(name)
        .ok_or_else(|| ApiError::NotFound(format!("unknown permission '{name}'")))
}

fn names(list: Vec<&str>) -> Vec<String> {
    list.into_iter().map(String::from).collect()
}

fn describe(engine: &Engine, mask: Mask) -> MaskResponse {
    MaskResponse {
        mask,
        permissions: names(engine.get_permission_list(&mask)),
    }
}

// ============================================================================
// Handlers
// ============================================================================

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
    })
}

async fn list_permissions(State(engine): State<AppState>) -> Json<Vec<PermissionInfo>> {
    let registry = engine.registry();
    Json(
        registry
            .iter()
            .map(|p| PermissionInfo {
                name: p.name().to_string(),
                bit: p.bit(),
                depends_on: p.depends_on().to_vec(),
                dependants: registry.permission_dependants(p).to_vec(),
            })
            .collect(),
    )
}

async fn effective(
    State(engine): State<AppState>,
    Json(req): Json<SubjectRequest>,
) -> Json<MaskResponse> {
    let mask = engine.get_permissions(&req.subject);
    Json(describe(&engine, mask))
}

async fn check(
    State(engine): State<AppState>,
    Json(req): Json<CheckRequest>,
) -> Result<Json<CheckResponse>, ApiError> {
    let mut perms = Vec::with_capacity(req.permissions.len());
    for name in &req.permissions {
        let p = engine
            .get_permission(name)
            .ok_or_else(|| ApiError::BadRequest(format!("unknown permission '{name}'")))?;
        perms.push(p);
    }
    let allowed = engine.has_permissions(&req.subject, &perms, req.match_any);
    Ok(Json(CheckResponse { allowed }))
}

async fn grant(
    State(engine): State<AppState>,
    Json(req): Json<MutateRequest>,
) -> Result<Json<MutateResponse>, ApiError> {
    let p = lookup(&engine, &req.permission)?;
    let mask = engine.add_permission(&req.subject, p);
    Ok(Json(MutateResponse {
        mask,
        changed: mask != req.subject.permissions,
        blocked_by: Vec::new(),
    }))
}

async fn revoke(
    State(engine): State<AppState>,
    Json(req): Json<MutateRequest>,
) -> Result<Json<MutateResponse>, ApiError> {
    let p = lookup(&engine, &req.permission)?;
    let blocked_by = names(engine.blocking_dependants(&req.subject, p));
    let mask = engine.remove_permission(&req.subject, p);
    Ok(Json(MutateResponse {
        mask,
        changed: mask != req.subject.permissions,
        blocked_by,
    }))
}

async fn mask_from_names(
    State(engine): State<AppState>,
    Json(req): Json<NamesRequest>,
) -> Json<MaskResponse> {
    let mask = engine.get_permissions_from_names(&req.permissions);
    Json(describe(&engine, mask))
}

async fn parse_mask(
    State(engine): State<AppState>,
    Json(req): Json<ParseRequest>,
) -> Result<Json<MaskResponse>, ApiError> {
    let mask = Mask::parse(&req.mask)?;
    Ok(Json(describe(&engine, mask)))
}

async fn authorize_update(
    State(engine): State<AppState>,
    Json(req): Json<AuthorizeUpdateRequest>,
) -> Result<StatusCode, ApiError> {
    let proposed = Mask::parse(&req.permissions)?;
    authorize_permission_update(
        &engine,
        Principal::new(&req.actor.id, &req.actor.subject),
        Principal::new(&req.target.id, &req.target.subject),
        proposed,
    )?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Router
// ============================================================================

pub fn router(engine: Arc<Engine>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/permissions", get(list_permissions))
        .route("/effective", post(effective))
        .route("/check", post(check))
        .route("/grant", post(grant))
        .route("/revoke", post(revoke))
        .route("/mask", post(mask_from_names))
        .route("/parse", post(parse_mask))
        .route("/authorize-update", post(authorize_update))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(engine)
}
