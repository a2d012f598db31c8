use crate::db::models::requests::{RequestAction, RequestEntity};
use crate::utils::error::{AppError, AppResult};

use RequestAction::*;

const CATALOG_ACTIONS: &[RequestAction] = &[Create, Update, Delete];
const ORDER_ACTIONS: &[RequestAction] =
    &[CancelOrder, RefundFull, RefundPartial, PriceAdjustment, ReassignStore];
const PAYMENT_ACTIONS: &[RequestAction] =
    &[EnableMethod, DisableMethod, UpdateCredentials, UpdateSettlement, UpdateFee];

/// Actions a change request may carry for `entity`.
pub fn allowed_actions(entity: RequestEntity) -> &'static [RequestAction] {
    match entity {
        RequestEntity::Product | RequestEntity::Category | RequestEntity::Topping => {
            CATALOG_ACTIONS
        }
        RequestEntity::Order => ORDER_ACTIONS,
        RequestEntity::Payment => PAYMENT_ACTIONS,
    }
}

pub fn is_allowed(entity: RequestEntity, action: RequestAction) -> bool {
    allowed_actions(entity).contains(&action)
}

/// Shared by submission and approval.
pub fn ensure_allowed(entity: RequestEntity, action: RequestAction) -> AppResult<()> {
    if is_allowed(entity, action) {
        Ok(())
    } else {
        Err(AppError::validation(format!(
            "Action '{}' is not supported for entity '{}'",
            action.as_str(),
            entity.as_str()
        )))
    }
}
