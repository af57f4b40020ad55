//! SeaORM entities for the `concerts`, `bookings` and `payments` tables

pub mod booking;
pub mod concert;
pub mod payment;
