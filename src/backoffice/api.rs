use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
};
use mintdesk_common::executor::MintResult;
use mintdesk_common::{
    AllocationStore, MintError, MintExecutor, MintRequest, TokenGroupSummary, aggregate,
    filter_by_token_type,
};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use super::db::DbHandle;
#[cfg(test)]
use super::db::BackofficeDb;
use super::models::*;
use super::ws::{WsEnvelope, WsMessage, broadcast_message, ws_handler};
use crate::errors::BackofficeError;

// ── Shared application state ──────────────────────────────────────────

pub struct AppState {
    pub db: DbHandle,
    pub ws_tx: broadcast::Sender<WsEnvelope>,
    pub executor: Arc<MintExecutor>,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(db: DbHandle, executor: MintExecutor) -> Self {
        let (ws_tx, _) = broadcast::channel(256);
        Self {
            db,
            ws_tx,
            executor: Arc::new(executor),
        }
    }
}

// ── Request / response payload types ──────────────────────────────────

#[derive(Deserialize)]
pub struct UpdateSubscriptionRequest {
    pub confirmed: Option<bool>,
    pub allocated: Option<bool>,
}

#[derive(Deserialize)]
pub struct MintRequestBody {
    pub token_types: Vec<String>,
    #[serde(default)]
    pub confirmed: bool,
}

#[derive(Deserialize, Default)]
pub struct TokenQuery {
    pub search: Option<String>,
}

/// Token group summary as returned to the minting screen.
#[derive(Serialize)]
pub struct TokenGroupResponse {
    #[serde(flatten)]
    pub summary: TokenGroupSummary,
    pub confirmation_progress: u8,
}

impl From<TokenGroupSummary> for TokenGroupResponse {
    fn from(summary: TokenGroupSummary) -> Self {
        let confirmation_progress = summary.confirmation_progress();
        Self {
            summary,
            confirmation_progress,
        }
    }
}

// ── Error handling ────────────────────────────────────────────────────

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Internal(String),
    Mint(MintError),
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast_ref::<BackofficeError>() {
            Some(e) if e.is_not_found() => ApiError::NotFound(e.to_string()),
            Some(e) if e.is_invalid_input() => ApiError::BadRequest(e.to_string()),
            _ => {
                tracing::error!(error = ?err, "Request failed");
                ApiError::Internal(err.to_string())
            }
        }
    }
}

impl From<MintError> for ApiError {
    fn from(err: MintError) -> Self {
        ApiError::Mint(err)
    }
}

fn mint_status(err: &MintError) -> StatusCode {
    match err {
        MintError::ConfirmationRequired | MintError::EmptySelection => StatusCode::BAD_REQUEST,
        MintError::NotEligible { .. } | MintError::AlreadyMinted { .. } => StatusCode::CONFLICT,
        MintError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        MintError::PartialBatchFailure { .. } => StatusCode::MULTI_STATUS,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                serde_json::json!({"error": msg, "kind": "not_found"}),
            ),
            ApiError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                serde_json::json!({"error": msg, "kind": "bad_request"}),
            ),
            ApiError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                serde_json::json!({"error": msg, "kind": "internal"}),
            ),
            ApiError::Mint(err) => {
                let status = mint_status(&err);
                let mut body = serde_json::json!({
                    "error": err.to_string(),
                    "kind": err.kind(),
                    "retryable": err.is_retryable(),
                });
                match &err {
                    MintError::NotEligible { token_type } | MintError::AlreadyMinted { token_type } => {
                        body["token_type"] = serde_json::json!(token_type);
                    }
                    MintError::PartialBatchFailure { minted, failed, .. } => {
                        body["minted"] = serde_json::json!(minted);
                        body["failed"] = serde_json::json!(failed);
                    }
                    _ => {}
                }
                (status, body)
            }
        };
        (status, Json(body)).into_response()
    }
}

// ── Router ────────────────────────────────────────────────────────────

pub fn api_router() -> Router<SharedState> {
    Router::new()
        .route("/api/projects", get(list_projects).post(create_project))
        .route("/api/projects/{id}", get(get_project))
        .route("/api/investors", get(list_investors).post(create_investor))
        .route(
            "/api/projects/{id}/subscriptions",
            get(list_subscriptions).post(create_subscription),
        )
        .route("/api/subscriptions/{id}", patch(update_subscription))
        .route(
            "/api/projects/{id}/allocations",
            get(list_allocations).post(create_allocation),
        )
        .route("/api/projects/{id}/tokens", get(list_token_groups))
        .route("/api/projects/{id}/mint", post(mint_tokens))
        .route("/api/projects/{id}/audit", get(list_audit_entries))
        .route("/ws", get(ws_handler))
        .route("/health", get(health_check))
}

// ── Handlers ──────────────────────────────────────────────────────────

async fn health_check() -> &'static str {
    "ok"
}

async fn list_projects(State(state): State<SharedState>) -> Result<impl IntoResponse, ApiError> {
    let projects = state.db.call(|db| db.list_projects()).await?;
    Ok(Json(projects))
}

async fn create_project(
    State(state): State<SharedState>,
    Json(req): Json<NewProject>,
) -> Result<impl IntoResponse, ApiError> {
    let project = state.db.call(move |db| db.create_project(&req)).await?;
    broadcast_message(
        &state.ws_tx,
        &WsMessage::ProjectCreated {
            project: project.clone(),
        },
    );
    Ok((StatusCode::CREATED, Json(project)))
}

async fn get_project(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let project = state.db.call(move |db| db.require_project(&id)).await?;
    Ok(Json(project))
}

async fn list_investors(State(state): State<SharedState>) -> Result<impl IntoResponse, ApiError> {
    let investors = state.db.call(|db| db.list_investors()).await?;
    Ok(Json(investors))
}

async fn create_investor(
    State(state): State<SharedState>,
    Json(req): Json<NewInvestor>,
) -> Result<impl IntoResponse, ApiError> {
    let investor = state.db.call(move |db| db.create_investor(&req)).await?;
    broadcast_message(
        &state.ws_tx,
        &WsMessage::InvestorCreated {
            investor: investor.clone(),
        },
    );
    Ok((StatusCode::CREATED, Json(investor)))
}

async fn list_subscriptions(
    State(state): State<SharedState>,
    Path(project_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let subscriptions = state
        .db
        .call(move |db| {
            db.require_project(&project_id)?;
            db.list_subscriptions(&project_id)
        })
        .await?;
    Ok(Json(subscriptions))
}

async fn create_subscription(
    State(state): State<SharedState>,
    Path(project_id): Path<String>,
    Json(req): Json<NewSubscription>,
) -> Result<impl IntoResponse, ApiError> {
    let subscription = state
        .db
        .call(move |db| db.create_subscription(&project_id, &req))
        .await?;
    broadcast_message(
        &state.ws_tx,
        &WsMessage::SubscriptionCreated {
            subscription: subscription.clone(),
        },
    );
    Ok((StatusCode::CREATED, Json(subscription)))
}

async fn update_subscription(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateSubscriptionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.confirmed.is_none() && req.allocated.is_none() {
        return Err(ApiError::BadRequest(
            "Provide at least one of 'confirmed' or 'allocated'".into(),
        ));
    }
    let subscription = state
        .db
        .call(move |db| db.update_subscription_status(&id, req.confirmed, req.allocated))
        .await?;
    broadcast_message(
        &state.ws_tx,
        &WsMessage::SubscriptionUpdated {
            subscription: subscription.clone(),
        },
    );
    Ok(Json(subscription))
}

async fn list_allocations(
    State(state): State<SharedState>,
    Path(project_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let allocations = state
        .db
        .call(move |db| {
            db.require_project(&project_id)?;
            db.list_allocations(&project_id)
        })
        .await?;
    Ok(Json(allocations))
}

async fn create_allocation(
    State(state): State<SharedState>,
    Path(project_id): Path<String>,
    Json(req): Json<NewAllocation>,
) -> Result<impl IntoResponse, ApiError> {
    let allocation = state
        .db
        .call(move |db| db.create_allocation(&project_id, &req))
        .await?;
    broadcast_message(
        &state.ws_tx,
        &WsMessage::AllocationCreated {
            allocation: allocation.clone(),
        },
    );
    Ok((StatusCode::CREATED, Json(allocation)))
}

async fn list_token_groups(
    State(state): State<SharedState>,
    Path(project_id): Path<String>,
    Query(query): Query<TokenQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let records = state
        .db
        .call(move |db| {
            db.require_project(&project_id)?;
            AllocationStore::list_allocations(db, &project_id).map_err(anyhow::Error::from)
        })
        .await?;
    let groups = aggregate(&records);
    let groups = filter_by_token_type(groups, query.search.as_deref().unwrap_or(""));
    let body: Vec<TokenGroupResponse> = groups.into_iter().map(Into::into).collect();
    Ok(Json(body))
}

async fn mint_tokens(
    State(state): State<SharedState>,
    Path(project_id): Path<String>,
    Json(req): Json<MintRequestBody>,
) -> Result<impl IntoResponse, ApiError> {
    let request = MintRequest::new(project_id.clone(), req.token_types, req.confirmed);
    let executor = state.executor.clone();

    let outcome = state
        .db
        .call(move |db| {
            db.require_project(&request.project_id)?;
            Ok(executor.mint(db, &request))
        })
        .await?;

    match outcome {
        Ok(result) => {
            broadcast_message(
                &state.ws_tx,
                &WsMessage::TokensMinted {
                    result: result.clone(),
                },
            );
            Ok(Json(result))
        }
        Err(err) => {
            if let MintError::PartialBatchFailure {
                minted_at, minted, ..
            } = &err
            {
                if !minted.is_empty() {
                    broadcast_message(
                        &state.ws_tx,
                        &WsMessage::TokensMinted {
                            result: MintResult {
                                project_id,
                                minted_at: *minted_at,
                                mints: minted.clone(),
                            },
                        },
                    );
                }
            }
            Err(err.into())
        }
    }
}

async fn list_audit_entries(
    State(state): State<SharedState>,
    Path(project_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let entries = state
        .db
        .call(move |db| {
            db.require_project(&project_id)?;
            db.list_audit_entries(&project_id)
        })
        .await?;
    Ok(Json(entries))
}

// ── Tests ─────────────────────────────────────────────────────────────
