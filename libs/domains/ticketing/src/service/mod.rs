//! Transactional services over a [`TicketingRepository`] and a [`CacheAside`]
//!
//! Each write runs its store work inside one transaction, optionally bounded
//! by a deadline, then bumps the cache generations it made stale after commit
//! and before returning. Reads resolve their generation before loading, so a
//! value loaded before a commit is only ever put under a retired generation.

mod booking;
mod concert;
mod payment;

pub use booking::BookingService;
pub use concert::ConcertService;
pub use payment::PaymentService;

use std::future::Future;
use std::time::Duration;

use core_cache::CacheAside;

use crate::error::{TicketingError, TicketingResult};
use crate::repository::TicketingRepository;

/// Run `operation` under an optional deadline
///
/// On expiry the future is dropped, which drops any open transaction and
/// rolls it back.
pub(crate) async fn within<T, F>(deadline: Option<Duration>, operation: F) -> TicketingResult<T>
where
    F: Future<Output = TicketingResult<T>>,
{
    match deadline {
        Some(limit) => tokio::time::timeout(limit, operation)
            .await
            .map_err(|_| TicketingError::Timeout(limit))?,
        None => operation.await,
    }
}

/// The three services wired to one store and one cache
#[derive(Clone)]
pub struct TicketingServices<R: TicketingRepository + Clone> {
    pub concerts: ConcertService<R>,
    pub bookings: BookingService<R>,
    pub payments: PaymentService<R>,
}

impl<R: TicketingRepository + Clone> TicketingServices<R> {
    pub fn new(repository: R, cache: CacheAside) -> Self {
        Self {
            concerts: ConcertService::new(repository.clone(), cache.clone()),
            bookings: BookingService::new(repository.clone(), cache.clone()),
            payments: PaymentService::new(repository, cache),
        }
    }

    /// Bound every store operation by `timeout`
    pub fn with_timeout(self, timeout: Duration) -> Self {
        Self {
            concerts: self.concerts.with_timeout(timeout),
            bookings: self.bookings.with_timeout(timeout),
            payments: self.payments.with_timeout(timeout),
        }
    }
}
