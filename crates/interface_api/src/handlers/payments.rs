//! Payment handlers

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use uuid::Uuid;

use core_kernel::{Money, PaymentId, ResidentId};
use domain_billing::payment::{NewPayment, PaymentMethod, PaymentStatus, PaymentUpdate};
use domain_billing::PaymentQuery;

use crate::auth::{caller_scope, Claims};
use crate::dto::payments::{
    CreatePaymentRequest, ListPaymentsParams, PaymentResponse, UpdatePaymentRequest,
};
use crate::dto::ApiResponse;
use crate::error::ApiError;
use crate::handlers::{parse_period, require_admin};
use crate::AppState;

/// Records a payment
pub async fn create_payment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(request): Json<CreatePaymentRequest>,
) -> Result<Json<ApiResponse<PaymentResponse>>, ApiError> {
    require_admin(&claims, &state)?;

    let periods = request
        .months
        .iter()
        .map(|m| parse_period(m))
        .collect::<Result<Vec<_>, _>>()?;
    let status = match request.status.as_deref() {
        Some(label) => label.parse::<PaymentStatus>()?,
        None => PaymentStatus::Paid,
    };

    let input = NewPayment {
        resident_id: ResidentId::from_uuid(request.resident_id),
        amount: Money::inr(request.amount),
        periods,
        due_date: request.due_date,
        status,
        method: request.method.parse::<PaymentMethod>()?,
        transaction_ref: request.transaction_ref,
        remarks: request.remarks,
        is_deposit: request.is_deposit,
    };

    let payment = state.payments.record_payment(input).await?;
    let message = format!("Payment recorded with receipt {}", payment.receipt_number);
    Ok(Json(ApiResponse::ok(message, PaymentResponse::from(payment))))
}

/// Updates a payment's status, remarks, or months
pub async fn update_payment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdatePaymentRequest>,
) -> Result<Json<ApiResponse<PaymentResponse>>, ApiError> {
    require_admin(&claims, &state)?;

    let periods = request
        .months
        .map(|months| {
            months
                .iter()
                .map(|m| parse_period(m))
                .collect::<Result<Vec<_>, _>>()
        })
        .transpose()?;
    let status = request
        .status
        .as_deref()
        .map(str::parse::<PaymentStatus>)
        .transpose()?;

    let update = PaymentUpdate {
        status,
        remarks: request.remarks,
        periods,
    };

    let payment = state
        .payments
        .update_payment(PaymentId::from_uuid(id), update)
        .await?;
    Ok(Json(ApiResponse::ok(
        "Payment updated",
        PaymentResponse::from(payment),
    )))
}

/// Deactivates a payment; its receipt number stays burned
pub async fn deactivate_payment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    require_admin(&claims, &state)?;
    state
        .payments
        .deactivate_payment(PaymentId::from_uuid(id))
        .await?;
    Ok(Json(ApiResponse::message("Payment deactivated")))
}

/// Lists payments, scoped by the caller's role
pub async fn list_payments(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<ListPaymentsParams>,
) -> Result<Json<ApiResponse<Vec<PaymentResponse>>>, ApiError> {
    let scope = caller_scope(&claims, &state.config.system_subject)
        .map_err(|_| ApiError::Unauthorized)?;

    let query = PaymentQuery {
        resident_id: params.resident_id.map(ResidentId::from_uuid),
        status: params
            .status
            .as_deref()
            .map(str::parse::<PaymentStatus>)
            .transpose()?,
        period: params.month.as_deref().map(parse_period).transpose()?,
        is_deposit: params.is_deposit,
        include_archived: false,
    };

    let payments = state.payments.list_payments(query, &scope).await?;
    let payments: Vec<PaymentResponse> =
        payments.into_iter().map(PaymentResponse::from).collect();
    Ok(Json(ApiResponse::ok("Payments fetched", payments)))
}
