//! Integration tests for domain_ticketing against real PostgreSQL and Redis
//!
//! Run with: cargo test -p domain_ticketing --test integration_test -- --ignored

use std::sync::Arc;

use chrono::{Duration, Utc};
use core_cache::{CacheAside, InMemoryCache, RedisCache};
use core_config::cache::CacheTtlConfig;
use domain_ticketing::{
    BookingStatus, CreateBooking, CreateConcert, ErrorKind, PaymentMethod, PaymentOutcome,
    PaymentStatus, PgTicketingRepository, RecordPayment, TicketingError, TicketingServices,
};
use sea_orm::ConnectionTrait;
use test_utils::{TestDataBuilder, TestDatabase, TestRedis, assertions::*};
use uuid::Uuid;

fn concert_input(builder: &TestDataBuilder, city: &str, total_seats: i32) -> CreateConcert {
    CreateConcert {
        name: builder.name("concert", "main"),
        artist: "The Harbour Lights".to_string(),
        venue: "Gelora Hall".to_string(),
        city: city.to_string(),
        date: Utc::now() + Duration::days(2),
        total_seats,
        image_url: "https://cdn.example.com/harbour.jpg".to_string(),
        description: "Farewell tour".to_string(),
    }
}

fn booking_input(concert_id: Uuid, ticket_count: i32) -> CreateBooking {
    CreateBooking {
        concert_id,
        ticket_count,
        unit_price: 150_000,
    }
}

fn services(db: &TestDatabase) -> TicketingServices<PgTicketingRepository> {
    let cache = CacheAside::new(Arc::new(InMemoryCache::new()), CacheTtlConfig::default());
    TicketingServices::new(PgTicketingRepository::new(db.connection()), cache)
}

#[tokio::test]
#[ignore] // Requires Docker
async fn test_concurrent_bookings_never_oversell() {
    let db = TestDatabase::new().await;
    let builder = TestDataBuilder::from_test_name("test_concurrent_bookings_never_oversell");
    let services = services(&db);

    let concert = services
        .concerts
        .create_concert(concert_input(&builder, "Jakarta", 5))
        .await
        .unwrap();
    let concert_id = concert.id;

    let handles: Vec<_> = (0..20)
        .map(|n| {
            let bookings = services.bookings.clone();
            let owner = builder.owner_id_n(n);
            tokio::spawn(async move {
                bookings
                    .create_booking(owner, booking_input(concert_id, 1))
                    .await
            })
        })
        .collect();

    let mut succeeded = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => succeeded += 1,
            Err(e) => assert_eq!(e.kind(), ErrorKind::InsufficientInventory),
        }
    }

    assert_eq!(succeeded, 5);
    let concert = services.concerts.get_concert(concert_id).await.unwrap();
    assert_eq!(concert.available_seats, 0);
}

#[tokio::test]
#[ignore] // Requires Docker
async fn test_cancel_refunds_seats_once() {
    let db = TestDatabase::new().await;
    let builder = TestDataBuilder::from_test_name("test_cancel_refunds_seats_once");
    let services = services(&db);
    let owner = builder.owner_id();

    let concert = services
        .concerts
        .create_concert(concert_input(&builder, "Bandung", 10))
        .await
        .unwrap();
    let booking = services
        .bookings
        .create_booking(owner, booking_input(concert.id, 4))
        .await
        .unwrap();

    let (first, second) = tokio::join!(
        services.bookings.cancel_booking(owner, booking.id),
        services.bookings.cancel_booking(owner, booking.id),
    );

    let outcomes = [first, second];
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(
        outcomes
            .iter()
            .any(|r| matches!(r, Err(TicketingError::InvalidState { .. })))
    );

    let concert = services.concerts.get_concert(concert.id).await.unwrap();
    assert_eq!(concert.available_seats, 10);
}

#[tokio::test]
#[ignore] // Requires Docker
async fn test_payment_confirms_booking_atomically() {
    let db = TestDatabase::new().await;
    let builder = TestDataBuilder::from_test_name("test_payment_confirms_booking_atomically");
    let services = services(&db);
    let owner = builder.owner_id();

    let concert = services
        .concerts
        .create_concert(concert_input(&builder, "Surabaya", 3))
        .await
        .unwrap();
    let booking = services
        .bookings
        .create_booking(owner, booking_input(concert.id, 2))
        .await
        .unwrap();

    let payment = services
        .payments
        .record_payment(
            owner,
            RecordPayment {
                booking_id: booking.id,
                amount: booking.total_price,
                method: PaymentMethod::EWallet,
            },
        )
        .await
        .unwrap();

    let booking = services.bookings.get_booking(owner, booking.id).await.unwrap();
    assert_eq!(booking.status, BookingStatus::Confirmed);
    assert!(services.bookings.list_pending(owner).await.unwrap().is_empty());

    let settled = services
        .payments
        .settle_payment(owner, payment.id, PaymentOutcome::Completed)
        .await
        .unwrap();
    assert_eq!(settled.status, PaymentStatus::Completed);

    let fetched = services.payments.get_payment(owner, payment.id).await.unwrap();
    assert_uuid_eq(fetched.booking_id, booking.id, "payment booking");
    assert_eq!(fetched.status, PaymentStatus::Completed);
}

#[tokio::test]
#[ignore] // Requires Docker
async fn test_records_are_invisible_to_other_owners() {
    let db = TestDatabase::new().await;
    let builder = TestDataBuilder::from_test_name("test_records_are_invisible_to_other_owners");
    let services = services(&db);
    let (owner, stranger) = (builder.owner_id_n(1), builder.owner_id_n(2));

    let concert = services
        .concerts
        .create_concert(concert_input(&builder, "Medan", 8))
        .await
        .unwrap();
    let booking = services
        .bookings
        .create_booking(owner, booking_input(concert.id, 1))
        .await
        .unwrap();

    let err = services
        .bookings
        .get_booking(stranger, booking.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = services
        .bookings
        .cancel_booking(stranger, booking.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let mine = assert_some(
        services.bookings.list_pending(owner).await.unwrap().into_iter().next(),
        "owner pending list",
    );
    assert_uuid_eq(mine.id, booking.id, "pending booking");
    assert!(services.bookings.list_pending(stranger).await.unwrap().is_empty());
}

#[tokio::test]
#[ignore] // Requires Docker
async fn test_search_and_city_filters() {
    let db = TestDatabase::new().await;
    let builder = TestDataBuilder::from_test_name("test_search_and_city_filters");
    let services = services(&db);

    let mut jazz = concert_input(&builder, "Yogyakarta", 50);
    jazz.name = "100% Jazz_Night".to_string();
    services.concerts.create_concert(jazz).await.unwrap();
    services
        .concerts
        .create_concert(concert_input(&builder, "Denpasar", 50))
        .await
        .unwrap();

    let literal = services
        .concerts
        .list_concerts(domain_ticketing::ConcertFilter {
            search: Some("0% jazz_".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(literal.len(), 1);

    let wildcard = services
        .concerts
        .list_concerts(domain_ticketing::ConcertFilter {
            search: Some("%".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(wildcard.len(), 1);

    let by_city = services
        .concerts
        .list_concerts(domain_ticketing::ConcertFilter {
            city: Some("Denpasar".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(by_city.len(), 1);

    let cities = services.concerts.available_cities().await.unwrap();
    assert_eq!(cities, vec!["Denpasar".to_string(), "Yogyakarta".to_string()]);
}

#[tokio::test]
#[ignore] // Requires Docker
async fn test_schema_rejects_negative_inventory() {
    let db = TestDatabase::new().await;
    let builder = TestDataBuilder::from_test_name("test_schema_rejects_negative_inventory");
    let services = services(&db);

    let concert = services
        .concerts
        .create_concert(concert_input(&builder, "Makassar", 2))
        .await
        .unwrap();

    let sql = format!(
        "UPDATE concerts SET available_seats = -1 WHERE id = '{}'",
        concert.id
    );
    assert!(db.connection.execute_unprepared(&sql).await.is_err());

    let sql = format!(
        "UPDATE concerts SET available_seats = 3 WHERE id = '{}'",
        concert.id
    );
    assert!(db.connection.execute_unprepared(&sql).await.is_err());
}

#[tokio::test]
#[ignore] // Requires Docker
async fn test_redis_cache_reflects_writes() {
    let db = TestDatabase::new().await;
    let redis = TestRedis::new().await;
    let builder = TestDataBuilder::from_test_name("test_redis_cache_reflects_writes");

    let cache = CacheAside::new(
        Arc::new(RedisCache::new(redis.connection())),
        CacheTtlConfig::default(),
    );
    let services = TicketingServices::new(PgTicketingRepository::new(db.connection()), cache);
    let owner = builder.owner_id();

    let concert = services
        .concerts
        .create_concert(concert_input(&builder, "Malang", 6))
        .await
        .unwrap();

    // Prime every read path
    assert_eq!(
        services.concerts.get_concert(concert.id).await.unwrap().available_seats,
        6
    );
    let before = services
        .concerts
        .list_concerts(Default::default())
        .await
        .unwrap();
    assert_eq!(before[0].available_seats, 6);
    assert!(services.bookings.list_pending(owner).await.unwrap().is_empty());

    let booking = services
        .bookings
        .create_booking(owner, booking_input(concert.id, 2))
        .await
        .unwrap();

    assert_eq!(
        services.concerts.get_concert(concert.id).await.unwrap().available_seats,
        4
    );
    let after = services
        .concerts
        .list_concerts(Default::default())
        .await
        .unwrap();
    assert_eq!(after[0].available_seats, 4);
    assert_eq!(services.bookings.list_pending(owner).await.unwrap().len(), 1);

    services.bookings.cancel_booking(owner, booking.id).await.unwrap();

    assert_eq!(
        services.concerts.get_concert(concert.id).await.unwrap().available_seats,
        6
    );
    assert_eq!(
        services.bookings.get_booking(owner, booking.id).await.unwrap().status,
        BookingStatus::Cancelled
    );
}
