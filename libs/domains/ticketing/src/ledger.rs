//! Seat ledger
//!
//! The only code allowed to change a concert's `available_seats`. Both
//! operations run inside the caller's transaction: the concert row is locked,
//! its invariant `0 <= available_seats <= total_seats` is re-checked, and the
//! new value is written through [`SeatWrite`], which cannot be built outside
//! this module. The ledger never reads or writes the cache.

use chrono::{DateTime, Utc};
use tracing::{debug, error};
use uuid::Uuid;

use crate::error::{TicketingError, TicketingResult};
use crate::models::{SeatCounter, now_micros};
use crate::repository::TicketingTransaction;

/// New counter value for one concert, issued only by the ledger
#[derive(Debug)]
pub struct SeatWrite {
    concert_id: Uuid,
    available_seats: i32,
    at: DateTime<Utc>,
}

impl SeatWrite {
    pub fn concert_id(&self) -> Uuid {
        self.concert_id
    }

    pub fn available_seats(&self) -> i32 {
        self.available_seats
    }

    pub fn at(&self) -> DateTime<Utc> {
        self.at
    }
}

/// Take `count` seats from `concert_id`
pub async fn reserve<T: TicketingTransaction>(
    tx: &mut T,
    concert_id: Uuid,
    count: i32,
) -> TicketingResult<SeatCounter> {
    ensure_positive(count)?;
    let counter = locked_counter(tx, concert_id).await?;

    if counter.available_seats < count {
        debug!(
            %concert_id,
            requested = count,
            available = counter.available_seats,
            "Not enough seats"
        );
        return Err(TicketingError::InsufficientInventory {
            requested: count,
            available: counter.available_seats,
        });
    }

    write(tx, counter, counter.available_seats - count).await
}

/// Return `count` seats to `concert_id`
///
/// A result above `total_seats` means seats are being returned twice; that is
/// reported as [`TicketingError::Consistency`] and nothing is written.
pub async fn release<T: TicketingTransaction>(
    tx: &mut T,
    concert_id: Uuid,
    count: i32,
) -> TicketingResult<SeatCounter> {
    ensure_positive(count)?;
    let counter = locked_counter(tx, concert_id).await?;

    match counter.available_seats.checked_add(count) {
        Some(restored) if restored <= counter.total_seats => write(tx, counter, restored).await,
        _ => {
            error!(
                %concert_id,
                released = count,
                available = counter.available_seats,
                total = counter.total_seats,
                "Seat release would exceed capacity"
            );
            Err(TicketingError::Consistency(format!(
                "releasing {count} seats on concert {concert_id} would exceed {} total (available {})",
                counter.total_seats, counter.available_seats
            )))
        }
    }
}

fn ensure_positive(count: i32) -> TicketingResult<()> {
    if count <= 0 {
        return Err(TicketingError::Validation(format!(
            "ticket count must be positive, got {count}"
        )));
    }
    Ok(())
}

async fn locked_counter<T: TicketingTransaction>(
    tx: &mut T,
    concert_id: Uuid,
) -> TicketingResult<SeatCounter> {
    let counter = tx
        .lock_seats(concert_id)
        .await?
        .ok_or(TicketingError::ConcertNotFound(concert_id))?;

    if !counter.is_consistent() {
        error!(
            %concert_id,
            available = counter.available_seats,
            total = counter.total_seats,
            "Seat counter out of bounds"
        );
        return Err(TicketingError::Consistency(format!(
            "concert {concert_id} has {} available of {} total",
            counter.available_seats, counter.total_seats
        )));
    }

    Ok(counter)
}

async fn write<T: TicketingTransaction>(
    tx: &mut T,
    counter: SeatCounter,
    available_seats: i32,
) -> TicketingResult<SeatCounter> {
    tx.write_available_seats(SeatWrite {
        concert_id: counter.concert_id,
        available_seats,
        at: now_micros(),
    })
    .await?;

    debug!(
        concert_id = %counter.concert_id,
        from = counter.available_seats,
        to = available_seats,
        "Seat counter written"
    );

    Ok(SeatCounter {
        available_seats,
        ..counter
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Concert, CreateConcert};
    use crate::repository::{InMemoryTicketingRepository, TicketingRepository};

    async fn seeded(total_seats: i32) -> (InMemoryTicketingRepository, Uuid) {
        let repo = InMemoryTicketingRepository::new();
        let concert = Concert::new(CreateConcert {
            name: "Ledger".to_string(),
            artist: "Quartet".to_string(),
            venue: "Hall".to_string(),
            city: "Yogyakarta".to_string(),
            date: Utc::now(),
            total_seats,
            image_url: String::new(),
            description: String::new(),
        });
        repo.insert_concert(&concert).await.unwrap();
        (repo, concert.id)
    }

    async fn available(repo: &InMemoryTicketingRepository, id: Uuid) -> i32 {
        repo.find_concert(id).await.unwrap().unwrap().available_seats
    }

    #[tokio::test]
    async fn test_reserve_and_release() {
        let (repo, id) = seeded(10).await;

        let mut tx = repo.begin().await.unwrap();
        assert_eq!(reserve(&mut tx, id, 4).await.unwrap().available_seats, 6);
        assert_eq!(release(&mut tx, id, 3).await.unwrap().available_seats, 9);
        tx.commit().await.unwrap();

        assert_eq!(available(&repo, id).await, 9);
    }

    #[tokio::test]
    async fn test_reserve_exact_remaining_then_nothing() {
        let (repo, id) = seeded(2).await;

        let mut tx = repo.begin().await.unwrap();
        assert_eq!(reserve(&mut tx, id, 2).await.unwrap().available_seats, 0);
        let err = reserve(&mut tx, id, 1).await.unwrap_err();
        assert!(matches!(
            err,
            TicketingError::InsufficientInventory { requested: 1, available: 0 }
        ));
    }

    #[tokio::test]
    async fn test_reserve_rejects_non_positive_count() {
        let (repo, id) = seeded(5).await;
        let mut tx = repo.begin().await.unwrap();

        for count in [0, -3] {
            let err = reserve(&mut tx, id, count).await.unwrap_err();
            assert!(matches!(err, TicketingError::Validation(_)));
        }
    }

    #[tokio::test]
    async fn test_unknown_concert() {
        let (repo, _) = seeded(5).await;
        let mut tx = repo.begin().await.unwrap();
        let missing = Uuid::now_v7();

        let err = reserve(&mut tx, missing, 1).await.unwrap_err();
        assert!(matches!(err, TicketingError::ConcertNotFound(id) if id == missing));
    }

    #[tokio::test]
    async fn test_double_release_is_a_consistency_error() {
        let (repo, id) = seeded(10).await;

        let mut tx = repo.begin().await.unwrap();
        let err = release(&mut tx, id, 1).await.unwrap_err();
        assert!(matches!(err, TicketingError::Consistency(_)));
        assert_eq!(tx.lock_seats(id).await.unwrap().unwrap().available_seats, 10);
    }

    #[tokio::test]
    async fn test_corrupted_counter_is_never_used() {
        let (repo, id) = seeded(10).await;
        repo.force_available_seats(id, 12).await;

        let mut tx = repo.begin().await.unwrap();
        let err = reserve(&mut tx, id, 1).await.unwrap_err();
        assert!(matches!(err, TicketingError::Consistency(_)));
    }
}
