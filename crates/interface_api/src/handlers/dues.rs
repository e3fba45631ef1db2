//! Due calculation handlers

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use uuid::Uuid;

use core_kernel::ResidentId;

use crate::auth::Claims;
use crate::dto::dues::{BatchDueRequest, DueParams, DueResponse, ResidentDueResponse};
use crate::dto::ApiResponse;
use crate::error::ApiError;
use crate::handlers::{parse_period, require_admin, require_admin_or_self};
use crate::AppState;

/// Derives the due statement for one resident and month
pub async fn get_due(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(resident_id): Path<Uuid>,
    Query(params): Query<DueParams>,
) -> Result<Json<ApiResponse<DueResponse>>, ApiError> {
    require_admin_or_self(&claims, &state, resident_id)?;
    let period = parse_period(&params.month)?;

    let statement = state
        .dues
        .statement_for(ResidentId::from_uuid(resident_id), &period)
        .await?;
    Ok(Json(ApiResponse::ok(
        "Due calculated",
        DueResponse::from(statement),
    )))
}

/// Derives due statements for a list of residents against one month
pub async fn batch_dues(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(request): Json<BatchDueRequest>,
) -> Result<Json<ApiResponse<Vec<ResidentDueResponse>>>, ApiError> {
    require_admin(&claims, &state)?;
    let period = parse_period(&request.month)?;

    let resident_ids: Vec<ResidentId> = request
        .resident_ids
        .into_iter()
        .map(ResidentId::from_uuid)
        .collect();

    let rows = state.dues.batch_statements(&period, &resident_ids).await?;
    let rows: Vec<ResidentDueResponse> =
        rows.into_iter().map(ResidentDueResponse::from).collect();
    Ok(Json(ApiResponse::ok("Dues calculated", rows)))
}
