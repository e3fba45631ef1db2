//! API error handling
//!
//! Maps the domain error taxonomy onto HTTP statuses. Transient failures
//! become 503 with a retryable hint; invariant violations become 500 and
//! have already been logged as bug signals at the point of detection.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use core_kernel::PortError;
use domain_billing::BillingError;
use domain_occupancy::OccupancyError;

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Temporarily unavailable: {0}")]
    Transient(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retryable: Option<bool>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, retryable, message) = match &self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", None, msg.clone()),
            ApiError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", None, msg.clone())
            }
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                None,
                "Unauthorized".to_string(),
            ),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", None, msg.clone()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", None, msg.clone()),
            ApiError::Validation(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation_error",
                None,
                msg.clone(),
            ),
            ApiError::Transient(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "transient_error",
                Some(true),
                msg.clone(),
            ),
            ApiError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                None,
                msg.clone(),
            ),
        };

        let body = ErrorResponse {
            success: false,
            error: error_type.to_string(),
            message,
            retryable,
        };

        (status, Json(body)).into_response()
    }
}

impl From<PortError> for ApiError {
    fn from(err: PortError) -> Self {
        match &err {
            PortError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            PortError::Validation { .. } => ApiError::Validation(err.to_string()),
            PortError::Conflict { .. } => ApiError::Conflict(err.to_string()),
            PortError::Unauthorized { .. } => ApiError::Unauthorized,
            PortError::Connection { .. } | PortError::Timeout { .. } => {
                ApiError::Transient(err.to_string())
            }
            PortError::Invariant { .. } | PortError::Internal { .. } => {
                ApiError::Internal(err.to_string())
            }
        }
    }
}

impl From<OccupancyError> for ApiError {
    fn from(err: OccupancyError) -> Self {
        match err {
            OccupancyError::Port(port) => port.into(),
            OccupancyError::Validation(_) => ApiError::Validation(err.to_string()),
            OccupancyError::IdentityCollision(_, _, _)
            | OccupancyError::RoomAtCapacity(_)
            | OccupancyError::CapacityBelowOccupancy { .. }
            | OccupancyError::RoomOccupied(_, _)
            | OccupancyError::ResidentAlreadyAssigned(_)
            | OccupancyError::SameRoom(_)
            | OccupancyError::RoomUnavailable(_) => ApiError::Conflict(err.to_string()),
            OccupancyError::ResidentUnassigned(_) => ApiError::Validation(err.to_string()),
        }
    }
}

impl From<BillingError> for ApiError {
    fn from(err: BillingError) -> Self {
        match err {
            BillingError::Port(port) => port.into(),
            BillingError::Validation(_) | BillingError::NoRoomAssigned(_) => {
                ApiError::Validation(err.to_string())
            }
            BillingError::PeriodsAlreadyCovered(_)
            | BillingError::NoDueAmount { .. }
            | BillingError::ExceedsDue { .. }
            | BillingError::DuplicateSettlement { .. } => ApiError::Conflict(err.to_string()),
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_port_errors_map_to_503() {
        let err: ApiError = PortError::connection("pool exhausted").into();
        assert!(matches!(err, ApiError::Transient(_)));
    }

    #[test]
    fn test_conflicts_map_to_409() {
        let err: ApiError = BillingError::PeriodsAlreadyCovered(vec![
            "March 2025".to_string(),
        ])
        .into();
        match err {
            ApiError::Conflict(message) => assert!(message.contains("March 2025")),
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[test]
    fn test_invariant_maps_to_500() {
        let err: ApiError = PortError::Invariant {
            message: "no free bed".to_string(),
        }
        .into();
        assert!(matches!(err, ApiError::Internal(_)));
    }
}
