//! Batch endpoints: recording, listing and the review lifecycle.

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use tracing::{debug, info};

use aw_core::{
    BatchQuery, BatchSort, BatchStatus, NewBatch, Signer, TokenType, DEFAULT_REJECTION_REASON,
};

use crate::auth::CurrentUser;
use crate::dto::{
    BatchListQuery, BatchListResponse, BatchResponse, CertifyRequest, CreateBatchResponse,
    RejectRequest, TransactionResponse,
};
use crate::error::{ApiError, ErrorResponse};
use crate::extract::{ApiJson, OptionalJson};
use crate::state::AppState;

/// Creates batch routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_batches).post(create_batch))
        .route("/create", post(create_batch))
        .route("/:id", get(get_batch))
        .route("/:id/approve", post(approve_batch))
        .route("/:id/reject", post(reject_batch))
        .route("/:id/certify", post(certify_batch))
}

/// Records a new batch as the logged-in user.
#[utoipa::path(
    post,
    path = "/api/batches/create",
    responses(
        (status = 200, description = "Batch recorded", body = CreateBatchResponse),
        (status = 400, description = "Missing asset id or material", body = ErrorResponse),
        (status = 401, description = "Not logged in", body = ErrorResponse),
        (status = 503, description = "Ledger not ready", body = ErrorResponse)
    ),
    tag = "Batches"
)]
pub async fn create_batch(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(batch): ApiJson<NewBatch>,
) -> Result<Json<CreateBatchResponse>, ApiError> {
    let ledger = state.ready_ledger().await?;
    batch.validate()?;

    let token = TokenType::for_asset(&batch.physical_asset);
    let receipt = ledger.create_batch(&Signer::from(&user), batch).await?;
    state.metrics.record_batch_created(token.as_str());

    info!(
        batch_id = receipt.batch_id,
        user = %user.username,
        token = %token,
        tx = %receipt.transaction_hash,
        "Batch recorded"
    );

    Ok(Json(CreateBatchResponse {
        success: true,
        batch_id: receipt.batch_id,
        transaction_hash: receipt.transaction_hash,
    }))
}

/// Lists batches with optional search, status filter and ordering.
#[utoipa::path(
    get,
    path = "/api/batches",
    params(BatchListQuery),
    responses(
        (status = 200, description = "Matching batches", body = BatchListResponse),
        (status = 400, description = "Unknown status filter", body = ErrorResponse),
        (status = 503, description = "Ledger not ready", body = ErrorResponse)
    ),
    tag = "Batches"
)]
pub async fn list_batches(
    State(state): State<AppState>,
    Query(params): Query<BatchListQuery>,
) -> Result<Json<BatchListResponse>, ApiError> {
    let query = parse_query(params)?;
    let ledger = state.ready_ledger().await?;

    let batches = query.apply(ledger.list_batches().await?);

    Ok(Json(BatchListResponse {
        success: true,
        count: batches.len(),
        batches,
    }))
}

fn parse_query(params: BatchListQuery) -> Result<BatchQuery, ApiError> {
    let status = match params.status.as_deref().map(str::trim) {
        None | Some("") | Some("all") => None,
        Some(raw) => Some(
            BatchStatus::parse(raw)
                .ok_or_else(|| ApiError::BadRequest(format!("Unknown status: {}", raw)))?,
        ),
    };

    Ok(BatchQuery {
        search: params.search.filter(|s| !s.trim().is_empty()),
        status,
        sort: params
            .sort
            .as_deref()
            .map(BatchSort::parse)
            .unwrap_or_default(),
    })
}

/// Reads one batch.
#[utoipa::path(
    get,
    path = "/api/batches/{id}",
    params(("id" = u64, Path, description = "Batch ID")),
    responses(
        (status = 200, description = "Batch details", body = BatchResponse),
        (status = 404, description = "Batch not found", body = ErrorResponse),
        (status = 503, description = "Ledger not ready", body = ErrorResponse)
    ),
    tag = "Batches"
)]
pub async fn get_batch(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<BatchResponse>, ApiError> {
    let ledger = state.ready_ledger().await?;
    let batch = ledger.get_batch(id).await?;

    Ok(Json(BatchResponse {
        success: true,
        batch,
    }))
}

/// Approves a pending batch and credits its weight to the creator's wallet.
#[utoipa::path(
    post,
    path = "/api/batches/{id}/approve",
    params(("id" = u64, Path, description = "Batch ID")),
    responses(
        (status = 200, description = "Batch approved", body = TransactionResponse),
        (status = 403, description = "Role may not review", body = ErrorResponse),
        (status = 404, description = "Batch not found", body = ErrorResponse),
        (status = 409, description = "Not pending, or own batch", body = ErrorResponse)
    ),
    tag = "Batches"
)]
pub async fn approve_batch(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<u64>,
) -> Result<Json<TransactionResponse>, ApiError> {
    let ledger = state.ready_ledger().await?;
    // Creator and asset are fixed at creation, so they are read before the
    // transaction commits.
    let batch = ledger.get_batch(id).await?;
    let receipt = ledger.approve_batch(&Signer::from(&user), id).await?;
    state
        .metrics
        .record_batch_transition(BatchStatus::Approved.label());

    match state
        .wallets
        .credit(&batch.created_by_name, &batch.physical_asset)
        .await
    {
        Some(token) => info!(
            batch_id = id,
            reviewer = %user.username,
            creator = %batch.created_by_name,
            token = %token,
            "Batch approved, creator credited"
        ),
        None => debug!(
            batch_id = id,
            creator = %batch.created_by_name,
            "Batch approved, creator has no wallet or no weight"
        ),
    }

    Ok(Json(TransactionResponse {
        success: true,
        transaction_hash: receipt.transaction_hash,
    }))
}

/// Rejects a pending batch.
#[utoipa::path(
    post,
    path = "/api/batches/{id}/reject",
    params(("id" = u64, Path, description = "Batch ID")),
    request_body = RejectRequest,
    responses(
        (status = 200, description = "Batch rejected", body = TransactionResponse),
        (status = 403, description = "Role may not review", body = ErrorResponse),
        (status = 404, description = "Batch not found", body = ErrorResponse),
        (status = 409, description = "Not pending, or own batch", body = ErrorResponse)
    ),
    tag = "Batches"
)]
pub async fn reject_batch(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<u64>,
    OptionalJson(body): OptionalJson<RejectRequest>,
) -> Result<Json<TransactionResponse>, ApiError> {
    let ledger = state.ready_ledger().await?;
    let reason = body
        .and_then(|r| r.reason)
        .filter(|r| !r.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_REJECTION_REASON.to_string());

    let receipt = ledger
        .reject_batch(&Signer::from(&user), id, &reason)
        .await?;
    state
        .metrics
        .record_batch_transition(BatchStatus::Rejected.label());

    info!(batch_id = id, reviewer = %user.username, reason = %reason, "Batch rejected");

    Ok(Json(TransactionResponse {
        success: true,
        transaction_hash: receipt.transaction_hash,
    }))
}

/// Certifies an approved batch.
#[utoipa::path(
    post,
    path = "/api/batches/{id}/certify",
    params(("id" = u64, Path, description = "Batch ID")),
    request_body = CertifyRequest,
    responses(
        (status = 200, description = "Batch certified", body = TransactionResponse),
        (status = 403, description = "Role may not certify", body = ErrorResponse),
        (status = 404, description = "Batch not found", body = ErrorResponse),
        (status = 409, description = "Batch not approved", body = ErrorResponse)
    ),
    tag = "Batches"
)]
pub async fn certify_batch(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<u64>,
    OptionalJson(body): OptionalJson<CertifyRequest>,
) -> Result<Json<TransactionResponse>, ApiError> {
    let ledger = state.ready_ledger().await?;
    let certification_hash = body
        .and_then(|c| c.certification_hash)
        .unwrap_or_default();

    let receipt = ledger
        .certify_batch(&Signer::from(&user), id, &certification_hash)
        .await?;
    state
        .metrics
        .record_batch_transition(BatchStatus::Certified.label());

    info!(batch_id = id, certifier = %user.username, "Batch certified");

    Ok(Json(TransactionResponse {
        success: true,
        transaction_hash: receipt.transaction_hash,
    }))
}
