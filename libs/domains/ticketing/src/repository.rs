use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::error::{TicketingError, TicketingResult};
use crate::ledger::SeatWrite;
use crate::models::{Booking, BookingStatus, Concert, Payment, PaymentStatus, SeatCounter};

/// Persistence for concerts, bookings and payments
///
/// Reads outside a transaction are plain snapshots. Everything that mutates a
/// seat counter or a status goes through [`TicketingTransaction`], where rows
/// are locked before they are checked.
#[async_trait]
pub trait TicketingRepository: Send + Sync + 'static {
    type Tx: TicketingTransaction;

    /// Open a transaction; dropping it without [`TicketingTransaction::commit`]
    /// rolls back
    async fn begin(&self) -> TicketingResult<Self::Tx>;

    async fn insert_concert(&self, concert: &Concert) -> TicketingResult<()>;

    async fn find_concert(&self, id: Uuid) -> TicketingResult<Option<Concert>>;

    /// Concerts ordered by date, optionally narrowed by a case-insensitive
    /// search over name/artist/venue and an exact city
    async fn list_concerts(
        &self,
        search: Option<&str>,
        city: Option<&str>,
    ) -> TicketingResult<Vec<Concert>>;

    /// Distinct concert cities, sorted
    async fn distinct_cities(&self) -> TicketingResult<Vec<String>>;

    /// Booking `id` if it belongs to `owner_id`
    async fn find_booking(&self, id: Uuid, owner_id: Uuid) -> TicketingResult<Option<Booking>>;

    /// Bookings of `owner_id`, newest first
    async fn list_bookings(
        &self,
        owner_id: Uuid,
        status: Option<BookingStatus>,
    ) -> TicketingResult<Vec<Booking>>;

    /// Payment `id` if it belongs to `owner_id`
    async fn find_payment(&self, id: Uuid, owner_id: Uuid) -> TicketingResult<Option<Payment>>;
}

/// Unit of work over the store
#[async_trait]
pub trait TicketingTransaction: Send {
    /// Lock the concert row and read its counter
    async fn lock_seats(&mut self, concert_id: Uuid) -> TicketingResult<Option<SeatCounter>>;

    /// Persist a counter value computed by the seat ledger
    async fn write_available_seats(&mut self, write: SeatWrite) -> TicketingResult<()>;

    async fn insert_booking(&mut self, booking: &Booking) -> TicketingResult<()>;

    /// Lock booking `id` if it belongs to `owner_id`
    async fn lock_booking(&mut self, id: Uuid, owner_id: Uuid) -> TicketingResult<Option<Booking>>;

    async fn set_booking_status(
        &mut self,
        id: Uuid,
        status: BookingStatus,
        at: DateTime<Utc>,
    ) -> TicketingResult<()>;

    async fn insert_payment(&mut self, payment: &Payment) -> TicketingResult<()>;

    /// Lock payment `id` if it belongs to `owner_id`
    async fn lock_payment(&mut self, id: Uuid, owner_id: Uuid) -> TicketingResult<Option<Payment>>;

    async fn set_payment_status(
        &mut self,
        id: Uuid,
        status: PaymentStatus,
        at: DateTime<Utc>,
    ) -> TicketingResult<()>;

    async fn commit(self) -> TicketingResult<()>;
}

#[derive(Debug, Default, Clone)]
struct State {
    concerts: HashMap<Uuid, Concert>,
    bookings: HashMap<Uuid, Booking>,
    payments: HashMap<Uuid, Payment>,
}

/// In-memory implementation of TicketingRepository (for development/testing)
///
/// A transaction holds the single state lock for its whole lifetime and works
/// on a staged copy, so transactions are serialized globally rather than per
/// concert row. Commit swaps the copy in; drop discards it.
#[derive(Debug, Default, Clone)]
pub struct InMemoryTicketingRepository {
    state: Arc<Mutex<State>>,
}

impl InMemoryTicketingRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite a counter without the ledger, to simulate corruption
    #[cfg(test)]
    pub(crate) async fn force_available_seats(&self, concert_id: Uuid, available_seats: i32) {
        let mut state = self.state.lock().await;
        if let Some(concert) = state.concerts.get_mut(&concert_id) {
            concert.available_seats = available_seats;
        }
    }
}

#[async_trait]
impl TicketingRepository for InMemoryTicketingRepository {
    type Tx = InMemoryTransaction;

    async fn begin(&self) -> TicketingResult<Self::Tx> {
        let guard = self.state.clone().lock_owned().await;
        let staged = guard.clone();
        Ok(InMemoryTransaction { guard, staged })
    }

    async fn insert_concert(&self, concert: &Concert) -> TicketingResult<()> {
        let mut state = self.state.lock().await;
        state.concerts.insert(concert.id, concert.clone());
        Ok(())
    }

    async fn find_concert(&self, id: Uuid) -> TicketingResult<Option<Concert>> {
        let state = self.state.lock().await;
        Ok(state.concerts.get(&id).cloned())
    }

    async fn list_concerts(
        &self,
        search: Option<&str>,
        city: Option<&str>,
    ) -> TicketingResult<Vec<Concert>> {
        let state = self.state.lock().await;

        let mut result: Vec<Concert> = state
            .concerts
            .values()
            .filter(|c| search.is_none_or(|needle| c.matches_search(needle)))
            .filter(|c| city.is_none_or(|city| c.city == city))
            .cloned()
            .collect();

        result.sort_by(|a, b| a.date.cmp(&b.date).then(a.id.cmp(&b.id)));
        Ok(result)
    }

    async fn distinct_cities(&self) -> TicketingResult<Vec<String>> {
        let state = self.state.lock().await;

        let mut cities: Vec<String> = state.concerts.values().map(|c| c.city.clone()).collect();
        cities.sort();
        cities.dedup();
        Ok(cities)
    }

    async fn find_booking(&self, id: Uuid, owner_id: Uuid) -> TicketingResult<Option<Booking>> {
        let state = self.state.lock().await;
        Ok(state
            .bookings
            .get(&id)
            .filter(|b| b.owner_id == owner_id)
            .cloned())
    }

    async fn list_bookings(
        &self,
        owner_id: Uuid,
        status: Option<BookingStatus>,
    ) -> TicketingResult<Vec<Booking>> {
        let state = self.state.lock().await;

        let mut result: Vec<Booking> = state
            .bookings
            .values()
            .filter(|b| b.owner_id == owner_id)
            .filter(|b| status.is_none_or(|s| b.status == s))
            .cloned()
            .collect();

        result.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(result)
    }

    async fn find_payment(&self, id: Uuid, owner_id: Uuid) -> TicketingResult<Option<Payment>> {
        let state = self.state.lock().await;
        Ok(state
            .payments
            .get(&id)
            .filter(|p| p.owner_id == owner_id)
            .cloned())
    }
}

pub struct InMemoryTransaction {
    guard: OwnedMutexGuard<State>,
    staged: State,
}

#[async_trait]
impl TicketingTransaction for InMemoryTransaction {
    async fn lock_seats(&mut self, concert_id: Uuid) -> TicketingResult<Option<SeatCounter>> {
        Ok(self.staged.concerts.get(&concert_id).map(|c| SeatCounter {
            concert_id: c.id,
            total_seats: c.total_seats,
            available_seats: c.available_seats,
        }))
    }

    async fn write_available_seats(&mut self, write: SeatWrite) -> TicketingResult<()> {
        let concert = self
            .staged
            .concerts
            .get_mut(&write.concert_id())
            .ok_or(TicketingError::ConcertNotFound(write.concert_id()))?;

        concert.available_seats = write.available_seats();
        concert.updated_at = write.at();
        Ok(())
    }

    async fn insert_booking(&mut self, booking: &Booking) -> TicketingResult<()> {
        if !self.staged.concerts.contains_key(&booking.concert_id) {
            return Err(TicketingError::ConcertNotFound(booking.concert_id));
        }
        self.staged.bookings.insert(booking.id, booking.clone());
        Ok(())
    }

    async fn lock_booking(&mut self, id: Uuid, owner_id: Uuid) -> TicketingResult<Option<Booking>> {
        Ok(self
            .staged
            .bookings
            .get(&id)
            .filter(|b| b.owner_id == owner_id)
            .cloned())
    }

    async fn set_booking_status(
        &mut self,
        id: Uuid,
        status: BookingStatus,
        at: DateTime<Utc>,
    ) -> TicketingResult<()> {
        let booking = self
            .staged
            .bookings
            .get_mut(&id)
            .ok_or(TicketingError::BookingNotFound(id))?;

        booking.status = status;
        booking.updated_at = at;
        Ok(())
    }

    async fn insert_payment(&mut self, payment: &Payment) -> TicketingResult<()> {
        if !self.staged.bookings.contains_key(&payment.booking_id) {
            return Err(TicketingError::BookingNotFound(payment.booking_id));
        }
        self.staged.payments.insert(payment.id, payment.clone());
        Ok(())
    }

    async fn lock_payment(&mut self, id: Uuid, owner_id: Uuid) -> TicketingResult<Option<Payment>> {
        Ok(self
            .staged
            .payments
            .get(&id)
            .filter(|p| p.owner_id == owner_id)
            .cloned())
    }

    async fn set_payment_status(
        &mut self,
        id: Uuid,
        status: PaymentStatus,
        at: DateTime<Utc>,
    ) -> TicketingResult<()> {
        let payment = self
            .staged
            .payments
            .get_mut(&id)
            .ok_or(TicketingError::PaymentNotFound(id))?;

        payment.status = status;
        payment.updated_at = at;
        Ok(())
    }

    async fn commit(self) -> TicketingResult<()> {
        let InMemoryTransaction { mut guard, staged } = self;
        *guard = staged;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CreateConcert;
    use chrono::Duration;

    fn concert(name: &str, city: &str, days_ahead: i64) -> Concert {
        Concert::new(CreateConcert {
            name: name.to_string(),
            artist: "Various".to_string(),
            venue: "Hall".to_string(),
            city: city.to_string(),
            date: Utc::now() + Duration::days(days_ahead),
            total_seats: 50,
            image_url: String::new(),
            description: String::new(),
        })
    }

    #[tokio::test]
    async fn test_dropped_transaction_discards_changes() {
        let repo = InMemoryTicketingRepository::new();
        let c = concert("Rollback", "Bandung", 2);
        repo.insert_concert(&c).await.unwrap();

        {
            let mut tx = repo.begin().await.unwrap();
            let counter = crate::ledger::reserve(&mut tx, c.id, 5).await.unwrap();
            assert_eq!(counter.available_seats, 45);
            assert_eq!(tx.lock_seats(c.id).await.unwrap().unwrap().available_seats, 45);
            // dropped without commit
        }

        let stored = repo.find_concert(c.id).await.unwrap().unwrap();
        assert_eq!(stored.available_seats, 50);
    }

    #[tokio::test]
    async fn test_list_concerts_filters_and_orders() {
        let repo = InMemoryTicketingRepository::new();
        let later = concert("Jazz Evening", "Jakarta", 20);
        let sooner = concert("Rock Night", "Jakarta", 5);
        let elsewhere = concert("Jazz Morning", "Surabaya", 1);
        for c in [&later, &sooner, &elsewhere] {
            repo.insert_concert(c).await.unwrap();
        }

        let jakarta = repo.list_concerts(None, Some("Jakarta")).await.unwrap();
        assert_eq!(
            jakarta.iter().map(|c| c.id).collect::<Vec<_>>(),
            vec![sooner.id, later.id]
        );

        let jazz = repo.list_concerts(Some("jazz"), None).await.unwrap();
        assert_eq!(jazz.len(), 2);

        let cities = repo.distinct_cities().await.unwrap();
        assert_eq!(cities, vec!["Jakarta".to_string(), "Surabaya".to_string()]);
    }

    #[tokio::test]
    async fn test_booking_lookups_are_owner_scoped() {
        let repo = InMemoryTicketingRepository::new();
        let c = concert("Owners", "Medan", 3);
        repo.insert_concert(&c).await.unwrap();

        let owner = Uuid::now_v7();
        let booking = Booking::pending(
            owner,
            &crate::models::CreateBooking {
                concert_id: c.id,
                ticket_count: 1,
                unit_price: 100,
            },
            100,
        );

        let mut tx = repo.begin().await.unwrap();
        tx.insert_booking(&booking).await.unwrap();
        assert!(tx.lock_booking(booking.id, Uuid::now_v7()).await.unwrap().is_none());
        tx.commit().await.unwrap();

        assert!(repo.find_booking(booking.id, owner).await.unwrap().is_some());
        assert!(repo.find_booking(booking.id, Uuid::now_v7()).await.unwrap().is_none());
        assert_eq!(repo.list_bookings(owner, Some(BookingStatus::Pending)).await.unwrap().len(), 1);
        assert!(repo.list_bookings(owner, Some(BookingStatus::Cancelled)).await.unwrap().is_empty());
    }
}
