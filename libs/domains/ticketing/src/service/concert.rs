use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use core_cache::CacheAside;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use super::within;
use crate::cache_keys;
use crate::error::{TicketingError, TicketingResult};
use crate::models::{Concert, ConcertFilter, CreateConcert};
use crate::repository::TicketingRepository;

/// Concert catalog with cached reads
///
/// Status is derived from the clock, so it is recomputed on every read and
/// status filtering happens after the cache.
#[derive(Clone)]
pub struct ConcertService<R: TicketingRepository> {
    repository: Arc<R>,
    cache: CacheAside,
    timeout: Option<Duration>,
}

impl<R: TicketingRepository> ConcertService<R> {
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

    /// Create a concert with every seat available
    pub async fn create_concert(&self, input: CreateConcert) -> TicketingResult<Concert> {
        input.validate()?;

        let concert = Concert::new(input);
        within(self.timeout, self.repository.insert_concert(&concert)).await?;

        info!(concert_id = %concert.id, city = %concert.city, seats = concert.total_seats, "Created concert");

        self.cache.bump_namespaces(&cache_keys::on_concert_created()).await;

        Ok(concert)
    }

    pub async fn get_concert(&self, id: Uuid) -> TicketingResult<Concert> {
        let key = cache_keys::concert(id);

        let concert = within(
            self.timeout,
            self.cache
                .read_through_optional_namespaced(&key, self.cache.entity_ttl(), || {
                    self.repository.find_concert(id)
                }),
        )
        .await?
        .ok_or(TicketingError::ConcertNotFound(id))?;

        Ok(concert.with_status_at(Utc::now()))
    }

    pub async fn list_concerts(&self, filter: ConcertFilter) -> TicketingResult<Vec<Concert>> {
        let filter = filter.normalized();
        let search = filter.search.as_deref();
        let city = filter.city.as_deref();

        let key = cache_keys::concert_list(search.unwrap_or_default(), city.unwrap_or_default());

        let concerts = within(
            self.timeout,
            self.cache
                .read_through_namespaced(&key, self.cache.entity_ttl(), || {
                    self.repository.list_concerts(search, city)
                }),
        )
        .await?;

        let now = Utc::now();
        Ok(concerts
            .into_iter()
            .map(|concert| concert.with_status_at(now))
            .filter(|concert| filter.status.is_none_or(|status| concert.status == status))
            .collect())
    }

    /// Distinct cities with concerts, sorted
    pub async fn available_cities(&self) -> TicketingResult<Vec<String>> {
        let key = cache_keys::available_cities();

        within(
            self.timeout,
            self.cache
                .read_through_namespaced(&key, self.cache.aggregate_ttl(), || {
                    self.repository.distinct_cities()
                }),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::models::ConcertStatus;
    use crate::repository::InMemoryTicketingRepository;
    use crate::service::BookingService;
    use crate::service::fixtures::{SlowReads, booking_input, cache_over, concert_input, stores};
    use chrono::Duration as ChronoDuration;

    fn services() -> (
        ConcertService<InMemoryTicketingRepository>,
        BookingService<InMemoryTicketingRepository>,
    ) {
        let (repo, cache) = stores();
        (
            ConcertService::new(repo.clone(), cache_over(&cache)),
            BookingService::new(repo, cache_over(&cache)),
        )
    }

    #[tokio::test]
    async fn test_create_concert_validates_input() {
        let (concerts, _) = services();

        let err = concerts
            .create_concert(CreateConcert {
                name: String::new(),
                ..concert_input("Jakarta", 10)
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        let err = concerts
            .create_concert(concert_input("Jakarta", -1))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn test_get_unknown_concert() {
        let (concerts, _) = services();
        let err = concerts.get_concert(Uuid::now_v7()).await.unwrap_err();
        assert!(matches!(err, TicketingError::ConcertNotFound(_)));
    }

    #[tokio::test]
    async fn test_cities_refresh_after_new_concert() {
        let (concerts, _) = services();
        concerts.create_concert(concert_input("Surabaya", 10)).await.unwrap();
        assert_eq!(concerts.available_cities().await.unwrap(), vec!["Surabaya"]);

        concerts.create_concert(concert_input("Bandung", 10)).await.unwrap();
        concerts.create_concert(concert_input("Surabaya", 5)).await.unwrap();
        assert_eq!(
            concerts.available_cities().await.unwrap(),
            vec!["Bandung", "Surabaya"]
        );
    }

    #[tokio::test]
    async fn test_list_filters_by_search_city_and_status() {
        let (concerts, bookings) = services();
        let soon = concerts.create_concert(concert_input("Jakarta", 2)).await.unwrap();
        let later = concerts
            .create_concert(CreateConcert {
                name: "Orchestra Gala".to_string(),
                artist: "City Philharmonic".to_string(),
                date: Utc::now() + ChronoDuration::days(30),
                ..concert_input("Jakarta", 50)
            })
            .await
            .unwrap();
        concerts.create_concert(concert_input("Bali", 20)).await.unwrap();

        let jakarta = concerts
            .list_concerts(ConcertFilter {
                city: Some("Jakarta".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(jakarta.iter().map(|c| c.id).collect::<Vec<_>>(), vec![soon.id, later.id]);

        let gala = concerts
            .list_concerts(ConcertFilter {
                search: Some("philharmonic".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(gala.len(), 1);
        assert_eq!(gala[0].status, ConcertStatus::Upcoming);

        // Selling out moves the concert between status lists
        bookings
            .create_booking(Uuid::now_v7(), booking_input(soon.id, 2))
            .await
            .unwrap();
        let sold_out = concerts
            .list_concerts(ConcertFilter {
                status: Some(ConcertStatus::SoldOut),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(sold_out.iter().map(|c| c.id).collect::<Vec<_>>(), vec![soon.id]);

        let on_sale = concerts
            .list_concerts(ConcertFilter {
                status: Some(ConcertStatus::OnSale),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(on_sale.len(), 1);
        assert_eq!(on_sale[0].city, "Bali");
    }

    #[tokio::test]
    async fn test_cached_list_reflects_cancellation() {
        let (concerts, bookings) = services();
        let owner = Uuid::now_v7();
        let concert = concerts.create_concert(concert_input("Lombok", 4)).await.unwrap();
        let filter = ConcertFilter {
            city: Some("Lombok".to_string()),
            ..Default::default()
        };

        let booking = bookings
            .create_booking(owner, booking_input(concert.id, 4))
            .await
            .unwrap();
        let listed = concerts.list_concerts(filter.clone()).await.unwrap();
        assert_eq!(listed[0].available_seats, 0);
        assert_eq!(listed[0].status, ConcertStatus::SoldOut);

        bookings.cancel_booking(owner, booking.id).await.unwrap();
        let listed = concerts.list_concerts(filter).await.unwrap();
        assert_eq!(listed[0].available_seats, 4);
        assert_eq!(listed[0].status, ConcertStatus::OnSale);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concert_loaded_before_a_booking_is_not_served_after() {
        let (repo, cache) = stores();
        let concerts = ConcertService::new(repo.clone(), cache_over(&cache));
        let bookings = BookingService::new(repo.clone(), cache_over(&cache));
        let lag = Duration::from_millis(100);
        let lagging = ConcertService::new(SlowReads::new(repo, lag), cache_over(&cache));

        let concert = concerts.create_concert(concert_input("Palu", 5)).await.unwrap();
        let concert_id = concert.id;
        let reader = tokio::spawn(async move { lagging.get_concert(concert_id).await });

        // The reader has its snapshot and is stalled when the booking commits
        tokio::time::sleep(lag / 10).await;
        bookings
            .create_booking(Uuid::now_v7(), booking_input(concert_id, 5))
            .await
            .unwrap();

        assert_eq!(reader.await.unwrap().unwrap().available_seats, 5);

        let fresh = concerts.get_concert(concert_id).await.unwrap();
        assert_eq!(fresh.available_seats, 0);
        assert_eq!(fresh.status, ConcertStatus::SoldOut);
    }
}
