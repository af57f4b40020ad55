//! Command dispatch: wire the store and cache, run one operation, return JSON

use std::sync::Arc;

use core_cache::{CacheAside, CacheBackend, InMemoryCache, RedisCache};
use database::{HealthStatus, RetryConfig, postgres, redis};
use domain_ticketing::{
    ConcertFilter, CreateBooking, CreateConcert, ErrorKind, PgTicketingRepository, RecordPayment,
    TicketingServices,
};
use eyre::{Result, WrapErr};
use migration::Migrator;
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::cli::{BookingCommand, Commands, ConcertCommand};
use crate::config::Config;

type Services = TicketingServices<PgTicketingRepository>;

pub async fn run(command: Commands, config: &Config) -> Result<Value> {
    match command {
        Commands::Migrate => migrate(config).await,
        Commands::Health => health(config).await,
        Commands::Concert { command } => concert(command, &connect(config).await?).await,
        Commands::Booking { command } => booking(command, &connect(config).await?).await,
        Commands::Book {
            caller,
            concert,
            tickets,
            unit_price,
        } => {
            let input = CreateBooking {
                concert_id: concert,
                ticket_count: tickets,
                unit_price,
            };
            let booking = connect(config)
                .await?
                .bookings
                .create_booking(caller.owner, input)
                .await?;
            Ok(serde_json::to_value(booking)?)
        }
        Commands::Cancel { caller, booking } => {
            let booking = connect(config)
                .await?
                .bookings
                .cancel_booking(caller.owner, booking)
                .await?;
            Ok(serde_json::to_value(booking)?)
        }
        Commands::Pay {
            caller,
            booking,
            amount,
            method,
        } => {
            let input = RecordPayment {
                booking_id: booking,
                amount,
                method,
            };
            let payment = connect(config)
                .await?
                .payments
                .record_payment(caller.owner, input)
                .await?;
            Ok(serde_json::to_value(payment)?)
        }
        Commands::Settle {
            caller,
            payment,
            outcome,
        } => {
            let payment = connect(config)
                .await?
                .payments
                .settle_payment(caller.owner, payment, outcome)
                .await?;
            Ok(serde_json::to_value(payment)?)
        }
    }
}

async fn concert(command: ConcertCommand, services: &Services) -> Result<Value> {
    let value = match command {
        ConcertCommand::Create {
            name,
            artist,
            venue,
            city,
            date,
            total_seats,
            image_url,
            description,
        } => {
            let input = CreateConcert {
                name,
                artist,
                venue,
                city,
                date,
                total_seats,
                image_url,
                description,
            };
            serde_json::to_value(services.concerts.create_concert(input).await?)?
        }
        ConcertCommand::List {
            search,
            city,
            status,
        } => {
            let filter = ConcertFilter {
                search,
                status,
                city,
            };
            serde_json::to_value(services.concerts.list_concerts(filter).await?)?
        }
        ConcertCommand::Show { id } => {
            serde_json::to_value(services.concerts.get_concert(id).await?)?
        }
        ConcertCommand::Cities => serde_json::to_value(services.concerts.available_cities().await?)?,
    };

    Ok(value)
}

async fn booking(command: BookingCommand, services: &Services) -> Result<Value> {
    let value = match command {
        BookingCommand::Show { caller, id } => {
            serde_json::to_value(services.bookings.get_booking(caller.owner, id).await?)?
        }
        BookingCommand::Pending { caller } => {
            serde_json::to_value(services.bookings.list_pending(caller.owner).await?)?
        }
        BookingCommand::Advance { caller, id, to } => {
            serde_json::to_value(services.bookings.advance_booking(caller.owner, id, to).await?)?
        }
    };

    Ok(value)
}

async fn migrate(config: &Config) -> Result<Value> {
    let db = postgres::connect_with_retry(config.database.clone(), None)
        .await
        .wrap_err("Database connection failed")?;

    postgres::run_migrations::<Migrator>(&db, "ticketing")
        .await
        .wrap_err("Migration failed")?;

    Ok(json!({ "migrated": true }))
}

async fn health(config: &Config) -> Result<Value> {
    let store = match postgres::connect(config.database.clone()).await {
        Ok(db) => postgres::check_health_detailed(&db).await,
        Err(e) => HealthStatus::unhealthy("postgres", e.to_string(), 0),
    };

    let cache = match redis::connect(config.redis.clone()).await {
        Ok(mut conn) => redis::check_health_detailed(&mut conn).await,
        Err(e) => HealthStatus::unhealthy("redis", e.to_string(), 0),
    };

    let healthy = store.healthy && cache.healthy;
    let report = json!({
        "healthy": healthy,
        "components": [health_json(&store), health_json(&cache)],
    });

    if !healthy {
        eyre::bail!("Unhealthy: {}", report);
    }

    Ok(report)
}

fn health_json(status: &HealthStatus) -> Value {
    json!({
        "component": status.component,
        "healthy": status.healthy,
        "message": status.message,
        "response_time_ms": status.response_time_ms,
    })
}

/// Open the store and cache and build the services
///
/// Without Redis the CLI still works against an in-process cache.
async fn connect(config: &Config) -> Result<Services> {
    let db = postgres::connect_with_retry(config.database.clone(), None)
        .await
        .wrap_err("Database connection failed")?;

    let backend: Arc<dyn CacheBackend> = match redis::connect_with_retry(
        config.redis.clone(),
        Some(RetryConfig::new().with_max_retries(1)),
    )
    .await
    {
        Ok(conn) => Arc::new(RedisCache::new(conn)),
        Err(e) => {
            warn!(error = %e, "Redis unavailable, caching in process memory only");
            Arc::new(InMemoryCache::new())
        }
    };

    let cache = CacheAside::new(backend, config.cache.clone());
    let services = TicketingServices::new(PgTicketingRepository::new(db), cache);

    Ok(match config.op_timeout {
        Some(timeout) => {
            info!(timeout_ms = timeout.as_millis() as u64, "Operation deadline enabled");
            services.with_timeout(timeout)
        }
        None => services,
    })
}

/// Process exit status for a domain error category
pub fn exit_code(kind: ErrorKind) -> u8 {
    match kind {
        ErrorKind::InvalidInput => 2,
        ErrorKind::NotFound => 3,
        ErrorKind::InsufficientInventory => 4,
        ErrorKind::InvalidState => 5,
        ErrorKind::Store => 6,
        ErrorKind::Consistency => 7,
    }
}
