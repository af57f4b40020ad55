use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use domain_ticketing::{BookingStatus, ConcertStatus, PaymentMethod, PaymentOutcome};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "ticketing")]
#[command(about = "Concert seat inventory, bookings and payments")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Apply pending database migrations
    Migrate,

    /// Probe PostgreSQL and Redis
    Health,

    /// Concert catalog
    Concert {
        #[command(subcommand)]
        command: ConcertCommand,
    },

    /// Reserve seats as a pending booking
    Book {
        #[command(flatten)]
        caller: Caller,

        #[arg(long)]
        concert: Uuid,

        #[arg(long, default_value_t = 1)]
        tickets: i32,

        /// Price per ticket in minor currency units
        #[arg(long)]
        unit_price: i64,
    },

    /// Cancel a pending booking and release its seats
    Cancel {
        #[command(flatten)]
        caller: Caller,

        #[arg(long)]
        booking: Uuid,
    },

    /// Record a payment, confirming its booking
    Pay {
        #[command(flatten)]
        caller: Caller,

        #[arg(long)]
        booking: Uuid,

        /// Minor currency units
        #[arg(long)]
        amount: i64,

        /// credit_card, bank_transfer or e_wallet
        #[arg(long, default_value = "credit_card")]
        method: PaymentMethod,
    },

    /// Apply a gateway verdict to a pending payment
    Settle {
        #[command(flatten)]
        caller: Caller,

        #[arg(long)]
        payment: Uuid,

        /// completed or failed
        #[arg(long)]
        outcome: PaymentOutcome,
    },

    /// Booking reads and transitions
    Booking {
        #[command(subcommand)]
        command: BookingCommand,
    },
}

/// Authenticated caller identity
#[derive(Args, Clone, Copy)]
pub struct Caller {
    #[arg(id = "caller", long = "caller")]
    pub owner: Uuid,
}

#[derive(Subcommand)]
pub enum ConcertCommand {
    /// Add a concert to the catalog
    Create {
        #[arg(long)]
        name: String,

        #[arg(long)]
        artist: String,

        #[arg(long)]
        venue: String,

        #[arg(long)]
        city: String,

        /// RFC 3339, e.g. 2026-12-31T20:00:00Z
        #[arg(long)]
        date: DateTime<Utc>,

        #[arg(long)]
        total_seats: i32,

        #[arg(long, default_value = "")]
        image_url: String,

        #[arg(long, default_value = "")]
        description: String,
    },

    /// List concerts, optionally filtered
    List {
        /// Substring of name, artist or venue
        #[arg(short, long)]
        search: Option<String>,

        #[arg(short, long)]
        city: Option<String>,

        /// on-sale, upcoming or sold-out
        #[arg(long)]
        status: Option<ConcertStatus>,
    },

    /// Show one concert
    Show {
        #[arg(long)]
        id: Uuid,
    },

    /// Cities with at least one concert
    Cities,
}

#[derive(Subcommand)]
pub enum BookingCommand {
    /// Show one of the caller's bookings
    Show {
        #[command(flatten)]
        caller: Caller,

        #[arg(long)]
        id: Uuid,
    },

    /// The caller's pending bookings, newest first
    Pending {
        #[command(flatten)]
        caller: Caller,
    },

    /// Move a pending booking to confirmed or completed
    Advance {
        #[command(flatten)]
        caller: Caller,

        #[arg(long)]
        id: Uuid,

        #[arg(long, default_value = "completed")]
        to: BookingStatus,
    },
}
