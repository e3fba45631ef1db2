//! Settlement handlers

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use uuid::Uuid;

use core_kernel::{Money, ResidentId};
use domain_billing::settlement::{NewSettlement, SettlementReason};

use crate::auth::Claims;
use crate::dto::settlements::{CreateSettlementRequest, SettlementResponse};
use crate::dto::ApiResponse;
use crate::error::ApiError;
use crate::handlers::{parse_period, require_admin, require_admin_or_self};
use crate::AppState;

/// Records a settlement against a resident's due
pub async fn create_settlement(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(request): Json<CreateSettlementRequest>,
) -> Result<Json<ApiResponse<SettlementResponse>>, ApiError> {
    require_admin(&claims, &state)?;

    let input = NewSettlement {
        resident_id: ResidentId::from_uuid(request.resident_id),
        period: parse_period(&request.month)?,
        amount: Money::inr(request.amount),
        reason: request.reason.parse::<SettlementReason>()?,
        remarks: request.remarks,
    };

    let outcome = state
        .settlements
        .record_settlement(input, claims.sub.clone())
        .await?;
    Ok(Json(ApiResponse::ok(
        "Settlement recorded",
        SettlementResponse::from(outcome),
    )))
}

/// Lists a resident's settlements
pub async fn list_settlements(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(resident_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<SettlementResponse>>>, ApiError> {
    require_admin_or_self(&claims, &state, resident_id)?;

    let settlements = state
        .settlements
        .list_settlements(ResidentId::from_uuid(resident_id))
        .await?;
    let settlements: Vec<SettlementResponse> = settlements
        .into_iter()
        .map(SettlementResponse::from)
        .collect();
    Ok(Json(ApiResponse::ok("Settlements fetched", settlements)))
}
