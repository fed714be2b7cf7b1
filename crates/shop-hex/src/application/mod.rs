pub mod auth_service;
pub mod inventory_service;
pub mod order_service;

use shop_types::domain::user::Principal;
use uuid::Uuid;

use crate::errors::AppError;

pub(crate) fn require_admin(actor: &Principal) -> Result<(), AppError> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(AppError::access_denied())
    }
}

pub(crate) fn parse_reference(raw: &str, what: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::InvalidReference(format!("Invalid {what} ID format")))
}
