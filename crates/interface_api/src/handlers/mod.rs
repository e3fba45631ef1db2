//! Request handlers

pub mod health;
pub mod rooms;
pub mod payments;
pub mod dues;
pub mod settlements;
pub mod transfers;

use core_kernel::{BillingPeriod, ResidentId};
use uuid::Uuid;

use crate::auth::{self, Claims};
use crate::error::ApiError;
use crate::AppState;

/// Rejects non-admin callers
pub(crate) fn require_admin(claims: &Claims, state: &AppState) -> Result<(), ApiError> {
    if auth::is_admin(claims, &state.config.system_subject) {
        Ok(())
    } else {
        Err(ApiError::Forbidden("Admin role required".to_string()))
    }
}

/// Allows admins and the resident themself
pub(crate) fn require_admin_or_self(
    claims: &Claims,
    state: &AppState,
    resident_id: Uuid,
) -> Result<(), ApiError> {
    if auth::is_admin(claims, &state.config.system_subject) {
        return Ok(());
    }
    let own = claims
        .sub
        .parse::<ResidentId>()
        .map(|id| *id.as_uuid() == resident_id)
        .unwrap_or(false);
    if own {
        Ok(())
    } else {
        Err(ApiError::Forbidden(
            "Not the owner of this resource".to_string(),
        ))
    }
}

/// Parses a `"Month Year"` label into a billing period
pub(crate) fn parse_period(label: &str) -> Result<BillingPeriod, ApiError> {
    label
        .parse::<BillingPeriod>()
        .map_err(|e| ApiError::Validation(e.to_string()))
}
