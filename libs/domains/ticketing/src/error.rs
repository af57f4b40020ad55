use std::time::Duration;

use sea_orm::DbErr;
use serde::Serialize;
use strum::{Display, EnumString};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum TicketingError {
    #[error("Concert not found: {0}")]
    ConcertNotFound(Uuid),

    /// Also returned when the booking exists but belongs to someone else
    #[error("Booking not found: {0}")]
    BookingNotFound(Uuid),

    #[error("Payment not found: {0}")]
    PaymentNotFound(Uuid),

    #[error("Insufficient seats: requested {requested}, available {available}")]
    InsufficientInventory { requested: i32, available: i32 },

    #[error("Invalid state transition from {from} to {to}")]
    InvalidState { from: String, to: String },

    #[error("Invalid payment amount: {0}")]
    InvalidAmount(i64),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// A ledger invariant does not hold; never retried or clamped
    #[error("Seat ledger inconsistency: {0}")]
    Consistency(String),

    #[error("Database error: {0}")]
    Database(String),
}

pub type TicketingResult<T> = Result<T, TicketingError>;

/// Transport-agnostic error category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    InsufficientInventory,
    InvalidState,
    InvalidInput,
    Store,
    Consistency,
}

impl TicketingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TicketingError::ConcertNotFound(_)
            | TicketingError::BookingNotFound(_)
            | TicketingError::PaymentNotFound(_) => ErrorKind::NotFound,
            TicketingError::InsufficientInventory { .. } => ErrorKind::InsufficientInventory,
            TicketingError::InvalidState { .. } => ErrorKind::InvalidState,
            TicketingError::InvalidAmount(_) | TicketingError::Validation(_) => {
                ErrorKind::InvalidInput
            }
            TicketingError::Timeout(_) | TicketingError::Database(_) => ErrorKind::Store,
            TicketingError::Consistency(_) => ErrorKind::Consistency,
        }
    }

    pub(crate) fn invalid_state(from: impl ToString, to: impl ToString) -> Self {
        TicketingError::InvalidState {
            from: from.to_string(),
            to: to.to_string(),
        }
    }
}

impl From<DbErr> for TicketingError {
    fn from(err: DbErr) -> Self {
        TicketingError::Database(err.to_string())
    }
}

impl From<validator::ValidationErrors> for TicketingError {
    fn from(err: validator::ValidationErrors) -> Self {
        TicketingError::Validation(err.to_string())
    }
}
