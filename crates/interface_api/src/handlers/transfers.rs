//! Room transfer handlers

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use uuid::Uuid;

use core_kernel::{ResidentId, RoomId};

use crate::auth::Claims;
use crate::dto::transfers::{ExecuteTransferRequest, RoomChangeResponse};
use crate::dto::ApiResponse;
use crate::error::ApiError;
use crate::handlers::{require_admin, require_admin_or_self};
use crate::AppState;

/// Executes a room reassignment
pub async fn execute_transfer(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(request): Json<ExecuteTransferRequest>,
) -> Result<Json<ApiResponse<RoomChangeResponse>>, ApiError> {
    require_admin(&claims, &state)?;

    let record = state
        .transfers
        .execute(
            ResidentId::from_uuid(request.resident_id),
            RoomId::from_uuid(request.target_room_id),
        )
        .await?;
    Ok(Json(ApiResponse::ok(
        "Room change completed",
        RoomChangeResponse::from(record),
    )))
}

/// Room change history for a resident
pub async fn transfer_history(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(resident_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<RoomChangeResponse>>>, ApiError> {
    require_admin_or_self(&claims, &state, resident_id)?;

    let history = state
        .transfers
        .history(ResidentId::from_uuid(resident_id))
        .await?;
    let history: Vec<RoomChangeResponse> =
        history.into_iter().map(RoomChangeResponse::from).collect();
    Ok(Json(ApiResponse::ok("Room change history fetched", history)))
}
