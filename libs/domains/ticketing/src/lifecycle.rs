//! Booking state machine
//!
//! `pending -> confirmed | completed` and `pending -> cancelled`; every other
//! state is terminal. These functions work inside a caller-owned transaction
//! so the booking write and its seat movement commit or roll back together.

use tracing::debug;
use uuid::Uuid;

use crate::error::{TicketingError, TicketingResult};
use crate::ledger;
use crate::models::{Booking, BookingStatus, CreateBooking, now_micros};
use crate::repository::TicketingTransaction;

/// Reserve seats and insert a pending booking
pub async fn create<T: TicketingTransaction>(
    tx: &mut T,
    owner_id: Uuid,
    input: &CreateBooking,
) -> TicketingResult<Booking> {
    let total_price = input
        .total_price()
        .filter(|price| *price > 0)
        .ok_or_else(|| {
            TicketingError::Validation(format!(
                "total price of {} x {} is out of range",
                input.ticket_count, input.unit_price
            ))
        })?;

    ledger::reserve(tx, input.concert_id, input.ticket_count).await?;

    let booking = Booking::pending(owner_id, input, total_price);
    tx.insert_booking(&booking).await?;

    debug!(booking_id = %booking.id, concert_id = %booking.concert_id, "Booking staged");
    Ok(booking)
}

/// Cancel a pending booking and return its seats
pub async fn cancel<T: TicketingTransaction>(
    tx: &mut T,
    owner_id: Uuid,
    booking_id: Uuid,
) -> TicketingResult<Booking> {
    let booking = lock(tx, owner_id, booking_id).await?;
    ensure_transition(&booking, BookingStatus::Cancelled)?;

    ledger::release(tx, booking.concert_id, booking.ticket_count).await?;
    set_status(tx, booking, BookingStatus::Cancelled).await
}

/// Move a pending booking to `confirmed` or `completed`
pub async fn advance<T: TicketingTransaction>(
    tx: &mut T,
    owner_id: Uuid,
    booking_id: Uuid,
    to: BookingStatus,
) -> TicketingResult<Booking> {
    let booking = lock(tx, owner_id, booking_id).await?;
    advance_locked(tx, booking, to).await
}

/// [`advance`] for a booking the caller already holds locked
pub async fn advance_locked<T: TicketingTransaction>(
    tx: &mut T,
    booking: Booking,
    to: BookingStatus,
) -> TicketingResult<Booking> {
    if to == BookingStatus::Cancelled {
        return Err(TicketingError::Validation(
            "cancellation goes through cancel, which releases seats".to_string(),
        ));
    }

    ensure_transition(&booking, to)?;
    set_status(tx, booking, to).await
}

/// Lock a booking owned by `owner_id`; foreign bookings look missing
pub async fn lock<T: TicketingTransaction>(
    tx: &mut T,
    owner_id: Uuid,
    booking_id: Uuid,
) -> TicketingResult<Booking> {
    tx.lock_booking(booking_id, owner_id)
        .await?
        .ok_or(TicketingError::BookingNotFound(booking_id))
}

pub fn ensure_transition(booking: &Booking, to: BookingStatus) -> TicketingResult<()> {
    if booking.status.can_transition_to(to) {
        Ok(())
    } else {
        Err(TicketingError::invalid_state(booking.status, to))
    }
}

async fn set_status<T: TicketingTransaction>(
    tx: &mut T,
    mut booking: Booking,
    to: BookingStatus,
) -> TicketingResult<Booking> {
    let at = now_micros();
    tx.set_booking_status(booking.id, to, at).await?;

    debug!(booking_id = %booking.id, from = %booking.status, %to, "Booking transition staged");
    booking.status = to;
    booking.updated_at = at;
    Ok(booking)
}
