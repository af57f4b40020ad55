use std::sync::Arc;
use std::time::Duration;

use core_cache::CacheAside;
use tracing::info;
use uuid::Uuid;

use super::within;
use crate::cache_keys;
use crate::error::{TicketingError, TicketingResult};
use crate::lifecycle;
use crate::models::{
    BookingStatus, Payment, PaymentOutcome, PaymentStatus, RecordPayment, now_micros,
};
use crate::repository::{TicketingRepository, TicketingTransaction};

/// Couples payments to the booking lifecycle; never touches seats
#[derive(Clone)]
pub struct PaymentService<R: TicketingRepository> {
    repository: Arc<R>,
    cache: CacheAside,
    timeout: Option<Duration>,
}

impl<R: TicketingRepository> PaymentService<R> {
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

    /// Record a pending payment and confirm its booking atomically
    pub async fn record_payment(
        &self,
        owner_id: Uuid,
        input: RecordPayment,
    ) -> TicketingResult<Payment> {
        if input.amount <= 0 {
            return Err(TicketingError::InvalidAmount(input.amount));
        }

        let payment = within(self.timeout, async {
            let mut tx = self.repository.begin().await?;

            let booking = lifecycle::lock(&mut tx, owner_id, input.booking_id).await?;
            lifecycle::ensure_transition(&booking, BookingStatus::Confirmed)?;

            let payment = Payment::pending(owner_id, &input);
            tx.insert_payment(&payment).await?;
            lifecycle::advance_locked(&mut tx, booking, BookingStatus::Confirmed).await?;

            tx.commit().await?;
            Ok(payment)
        })
        .await?;

        info!(
            payment_id = %payment.id,
            booking_id = %payment.booking_id,
            %owner_id,
            amount = payment.amount,
            method = %payment.method,
            "Recorded payment"
        );

        self.cache.bump_namespaces(&cache_keys::on_owner_records_changed(owner_id)).await;

        Ok(payment)
    }

    /// A payment owned by `owner_id`
    pub async fn get_payment(&self, owner_id: Uuid, payment_id: Uuid) -> TicketingResult<Payment> {
        let key = cache_keys::payment(owner_id, payment_id);

        within(
            self.timeout,
            self.cache
                .read_through_owned_namespaced(&key, owner_id, self.cache.entity_ttl(), || {
                    self.repository.find_payment(payment_id, owner_id)
                }),
        )
        .await?
        .ok_or(TicketingError::PaymentNotFound(payment_id))
    }

    /// Apply the gateway verdict to a pending payment
    pub async fn settle_payment(
        &self,
        owner_id: Uuid,
        payment_id: Uuid,
        outcome: PaymentOutcome,
    ) -> TicketingResult<Payment> {
        let status = PaymentStatus::from(outcome);

        let payment = within(self.timeout, async {
            let mut tx = self.repository.begin().await?;

            let mut payment = tx
                .lock_payment(payment_id, owner_id)
                .await?
                .ok_or(TicketingError::PaymentNotFound(payment_id))?;

            if payment.status != PaymentStatus::Pending {
                return Err(TicketingError::invalid_state(payment.status, status));
            }

            let at = now_micros();
            tx.set_payment_status(payment_id, status, at).await?;
            tx.commit().await?;

            payment.status = status;
            payment.updated_at = at;
            Ok(payment)
        })
        .await?;

        info!(%payment_id, %owner_id, %status, "Settled payment");

        self.cache.bump_namespaces(&cache_keys::on_owner_records_changed(owner_id)).await;

        Ok(payment)
    }
}
