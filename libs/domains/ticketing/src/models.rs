use chrono::{DateTime, Duration, SubsecRound, Utc};
use core_cache::OwnerScoped;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;
use validator::Validate;

/// Current time truncated to the store's microsecond precision, so values
/// returned by a write, read back from the store, or served from the cache
/// compare equal
pub(crate) fn now_micros() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Concerts further away than this are listed as upcoming
pub fn upcoming_threshold() -> Duration {
    Duration::days(7)
}

/// Sale status, derived from the seat counter and the date; never stored
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, Default,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ConcertStatus {
    #[default]
    OnSale,
    Upcoming,
    SoldOut,
}

impl ConcertStatus {
    pub fn derive(available_seats: i32, date: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        if available_seats == 0 {
            ConcertStatus::SoldOut
        } else if date - now > upcoming_threshold() {
            ConcertStatus::Upcoming
        } else {
            ConcertStatus::OnSale
        }
    }
}

/// A scheduled event with a finite seat pool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Concert {
    pub id: Uuid,
    pub name: String,
    pub artist: String,
    pub venue: String,
    pub city: String,
    pub date: DateTime<Utc>,
    /// Fixed at creation
    pub total_seats: i32,
    /// Written only by the seat ledger; `0 <= available_seats <= total_seats`
    pub available_seats: i32,
    pub image_url: String,
    pub description: String,
    /// Recomputed on every read
    #[serde(default)]
    pub status: ConcertStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Concert {
    pub fn new(input: CreateConcert) -> Self {
        let now = now_micros();
        let date = input.date.trunc_subsecs(6);

        Self {
            id: Uuid::now_v7(),
            name: input.name,
            artist: input.artist,
            venue: input.venue,
            city: input.city,
            date,
            total_seats: input.total_seats,
            available_seats: input.total_seats,
            image_url: input.image_url,
            description: input.description,
            status: ConcertStatus::derive(input.total_seats, date, now),
            created_at: now,
            updated_at: now,
        }
    }

    /// Refresh the derived status against `now`
    pub fn with_status_at(mut self, now: DateTime<Utc>) -> Self {
        self.status = ConcertStatus::derive(self.available_seats, self.date, now);
        self
    }

    /// Case-insensitive match on name, artist or venue
    pub fn matches_search(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        [&self.name, &self.artist, &self.venue]
            .iter()
            .any(|field| field.to_lowercase().contains(&needle))
    }
}

/// Input for creating a concert
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateConcert {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(length(min = 1, max = 255))]
    pub artist: String,
    #[validate(length(min = 1, max = 255))]
    pub venue: String,
    #[validate(length(min = 1, max = 100))]
    pub city: String,
    pub date: DateTime<Utc>,
    #[validate(range(min = 0))]
    pub total_seats: i32,
    #[validate(length(max = 2048))]
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub description: String,
}

/// Catalog filter; every field is optional
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ConcertFilter {
    /// Case-insensitive substring of name, artist or venue
    pub search: Option<String>,
    pub status: Option<ConcertStatus>,
    /// Exact city
    pub city: Option<String>,
}

impl ConcertFilter {
    /// Empty strings mean "no filter"
    pub fn normalized(self) -> Self {
        let non_empty = |value: Option<String>| {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        Self {
            search: non_empty(self.search),
            status: self.status,
            city: non_empty(self.city),
        }
    }
}

/// Snapshot of a concert's seat counter, read under its row lock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatCounter {
    pub concert_id: Uuid,
    pub total_seats: i32,
    pub available_seats: i32,
}

impl SeatCounter {
    pub fn is_consistent(&self) -> bool {
        self.total_seats >= 0 && (0..=self.total_seats).contains(&self.available_seats)
    }
}

/// Booking lifecycle state
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    Default,
    DeriveActiveEnum,
    EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "booking_status")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BookingStatus {
    /// Seats held, awaiting payment
    #[default]
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "confirmed")]
    Confirmed,
    #[sea_orm(string_value = "completed")]
    Completed,
    /// Seats returned to the pool
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl BookingStatus {
    /// Every status but `pending` is final
    pub fn is_terminal(&self) -> bool {
        !matches!(self, BookingStatus::Pending)
    }

    /// Only a pending booking moves, and only into a terminal status
    pub fn can_transition_to(&self, to: BookingStatus) -> bool {
        !self.is_terminal() && to.is_terminal()
    }
}

/// A reservation of `ticket_count` seats by one owner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub concert_id: Uuid,
    pub ticket_count: i32,
    pub status: BookingStatus,
    /// Minor currency units
    pub total_price: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    pub(crate) fn pending(owner_id: Uuid, input: &CreateBooking, total_price: i64) -> Self {
        let now = now_micros();

        Self {
            id: Uuid::now_v7(),
            owner_id,
            concert_id: input.concert_id,
            ticket_count: input.ticket_count,
            status: BookingStatus::Pending,
            total_price,
            created_at: now,
            updated_at: now,
        }
    }
}

impl OwnerScoped for Booking {
    fn owned_by(&self, owner: Uuid) -> bool {
        self.owner_id == owner
    }
}

/// Input for reserving seats
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateBooking {
    pub concert_id: Uuid,
    #[validate(range(min = 1))]
    pub ticket_count: i32,
    /// Price per ticket in minor currency units
    #[validate(range(min = 1))]
    pub unit_price: i64,
}

impl CreateBooking {
    /// `None` on overflow
    pub fn total_price(&self) -> Option<i64> {
        i64::from(self.ticket_count).checked_mul(self.unit_price)
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    DeriveActiveEnum,
    EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "payment_method")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PaymentMethod {
    #[sea_orm(string_value = "credit_card")]
    CreditCard,
    #[sea_orm(string_value = "bank_transfer")]
    BankTransfer,
    #[sea_orm(string_value = "e_wallet")]
    EWallet,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    Default,
    DeriveActiveEnum,
    EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "payment_status")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "failed")]
    Failed,
}

/// Gateway verdict for a pending payment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PaymentOutcome {
    Completed,
    Failed,
}

impl From<PaymentOutcome> for PaymentStatus {
    fn from(outcome: PaymentOutcome) -> Self {
        match outcome {
            PaymentOutcome::Completed => PaymentStatus::Completed,
            PaymentOutcome::Failed => PaymentStatus::Failed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    pub booking_id: Uuid,
    /// Copied from the booking
    pub owner_id: Uuid,
    /// Minor currency units
    pub amount: i64,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Payment {
    pub(crate) fn pending(owner_id: Uuid, input: &RecordPayment) -> Self {
        let now = now_micros();

        Self {
            id: Uuid::now_v7(),
            booking_id: input.booking_id,
            owner_id,
            amount: input.amount,
            method: input.method,
            status: PaymentStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }
}

impl OwnerScoped for Payment {
    fn owned_by(&self, owner: Uuid) -> bool {
        self.owner_id == owner
    }
}

/// Input for paying a booking
#[derive(Debug, Clone, Deserialize)]
pub struct RecordPayment {
    pub booking_id: Uuid,
    /// Minor currency units, must be positive
    pub amount: i64,
    pub method: PaymentMethod,
}
