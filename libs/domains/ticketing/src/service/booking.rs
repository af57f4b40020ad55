use std::sync::Arc;
use std::time::Duration;

use core_cache::CacheAside;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use super::within;
use crate::cache_keys;
use crate::error::{TicketingError, TicketingResult};
use crate::lifecycle;
use crate::models::{Booking, BookingStatus, CreateBooking};
use crate::repository::{TicketingRepository, TicketingTransaction};

/// Booking lifecycle: reserve, cancel, advance, and owner-scoped reads
#[derive(Clone)]
pub struct BookingService<R: TicketingRepository> {
    repository: Arc<R>,
    cache: CacheAside,
    timeout: Option<Duration>,
}

impl<R: TicketingRepository> BookingService<R> {
    pub fn new(repository: R, cache: CacheAside) -> Self {
        Self {
            repository: Arc::new(repository),
            cache,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Reserve seats and create a pending booking in one transaction
    pub async fn create_booking(
        &self,
        owner_id: Uuid,
        input: CreateBooking,
    ) -> TicketingResult<Booking> {
        input.validate()?;

        let booking = within(self.timeout, async {
            let mut tx = self.repository.begin().await?;
            let booking = lifecycle::create(&mut tx, owner_id, &input).await?;
            tx.commit().await?;
            Ok(booking)
        })
        .await?;

        info!(
            booking_id = %booking.id,
            %owner_id,
            concert_id = %booking.concert_id,
            ticket_count = booking.ticket_count,
            "Created booking"
        );

        let stale = cache_keys::on_seats_moved(owner_id, booking.concert_id);
        self.cache.bump_namespaces(&stale).await;

        Ok(booking)
    }

    /// Cancel a pending booking and return its seats
    pub async fn cancel_booking(&self, owner_id: Uuid, booking_id: Uuid) -> TicketingResult<Booking> {
        let booking = within(self.timeout, async {
            let mut tx = self.repository.begin().await?;
            let booking = lifecycle::cancel(&mut tx, owner_id, booking_id).await?;
            tx.commit().await?;
            Ok(booking)
        })
        .await?;

        info!(
            %booking_id,
            %owner_id,
            concert_id = %booking.concert_id,
            released = booking.ticket_count,
            "Cancelled booking"
        );

        let stale = cache_keys::on_seats_moved(owner_id, booking.concert_id);
        self.cache.bump_namespaces(&stale).await;

        Ok(booking)
    }

    /// Move exactly one pending booking to `confirmed` or `completed`
    pub async fn advance_booking(
        &self,
        owner_id: Uuid,
        booking_id: Uuid,
        to: BookingStatus,
    ) -> TicketingResult<Booking> {
        let booking = within(self.timeout, async {
            let mut tx = self.repository.begin().await?;
            let booking = lifecycle::advance(&mut tx, owner_id, booking_id, to).await?;
            tx.commit().await?;
            Ok(booking)
        })
        .await?;

        info!(%booking_id, %owner_id, status = %booking.status, "Advanced booking");

        self.cache.bump_namespaces(&cache_keys::on_owner_records_changed(owner_id)).await;

        Ok(booking)
    }

    /// A booking owned by `owner_id`
    pub async fn get_booking(&self, owner_id: Uuid, booking_id: Uuid) -> TicketingResult<Booking> {
        let key = cache_keys::booking(owner_id, booking_id);

        within(
            self.timeout,
            self.cache
                .read_through_owned_namespaced(&key, owner_id, self.cache.entity_ttl(), || {
                    self.repository.find_booking(booking_id, owner_id)
                }),
        )
        .await?
        .ok_or(TicketingError::BookingNotFound(booking_id))
    }

    /// Pending bookings of `owner_id`, newest first
    pub async fn list_pending(&self, owner_id: Uuid) -> TicketingResult<Vec<Booking>> {
        let key = cache_keys::pending_bookings(owner_id);

        let bookings = within(
            self.timeout,
            self.cache.read_through_owned_namespaced(
                &key,
                owner_id,
                self.cache.entity_ttl(),
                || async {
                    self.repository
                        .list_bookings(owner_id, Some(BookingStatus::Pending))
                        .await
                        .map(Some)
                },
            ),
        )
        .await?;

        Ok(bookings.unwrap_or_default())
    }
}
