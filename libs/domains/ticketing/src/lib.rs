//! Concert ticketing core
//!
//! Seat inventory, booking lifecycle, payment coupling and the catalog, kept
//! consistent under concurrent requests:
//!
//! - [`ledger`] is the only code that writes a concert's seat counter, always
//!   under a row lock inside the caller's transaction
//! - [`lifecycle`] moves bookings through `pending -> confirmed | completed`
//!   and `pending -> cancelled`, reserving or releasing seats in the same
//!   transaction
//! - [`service`] wraps both in transactions, applies deadlines, and keeps the
//!   cache-aside layer coherent after each commit
//!
//! Storage is behind [`TicketingRepository`]; [`PgTicketingRepository`] is the
//! PostgreSQL implementation and [`InMemoryTicketingRepository`] serves
//! development and tests.

pub mod cache_keys;
pub mod entity;
pub mod error;
pub mod ledger;
pub mod lifecycle;
pub mod models;
pub mod postgres;
pub mod repository;
pub mod service;

pub use error::{ErrorKind, TicketingError, TicketingResult};
pub use models::{
    Booking, BookingStatus, Concert, ConcertFilter, ConcertStatus, CreateBooking, CreateConcert,
    Payment, PaymentMethod, PaymentOutcome, PaymentStatus, RecordPayment, SeatCounter,
};
pub use postgres::PgTicketingRepository;
pub use repository::{InMemoryTicketingRepository, TicketingRepository, TicketingTransaction};
pub use service::{BookingService, ConcertService, PaymentService, TicketingServices};
