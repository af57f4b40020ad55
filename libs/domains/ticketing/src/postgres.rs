use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    entity::{booking, concert, payment},
    error::TicketingResult,
    ledger::SeatWrite,
    models::{Booking, BookingStatus, Concert, Payment, PaymentStatus, SeatCounter},
    repository::{TicketingRepository, TicketingTransaction},
};

/// PostgreSQL implementation; row locks use `SELECT ... FOR UPDATE`
#[derive(Clone)]
pub struct PgTicketingRepository {
    db: DatabaseConnection,
}

impl PgTicketingRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

/// `%` and `_` in user input match literally
fn like_pattern(search: &str) -> String {
    let escaped = search
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

#[async_trait]
impl TicketingRepository for PgTicketingRepository {
    type Tx = PgTransaction;

    async fn begin(&self) -> TicketingResult<Self::Tx> {
        let txn = self.db.begin().await?;
        Ok(PgTransaction { txn })
    }

    async fn insert_concert(&self, concert: &Concert) -> TicketingResult<()> {
        let model: concert::ActiveModel = concert.into();
        concert::Entity::insert(model).exec(&self.db).await?;

        tracing::info!(concert_id = %concert.id, "Inserted concert");
        Ok(())
    }

    async fn find_concert(&self, id: Uuid) -> TicketingResult<Option<Concert>> {
        let model = concert::Entity::find_by_id(id).one(&self.db).await?;
        Ok(model.map(Into::into))
    }

    async fn list_concerts(
        &self,
        search: Option<&str>,
        city: Option<&str>,
    ) -> TicketingResult<Vec<Concert>> {
        let mut query = concert::Entity::find();

        if let Some(search) = search {
            let pattern = like_pattern(search);
            query = query.filter(Expr::cust_with_values(
                "(name ILIKE $1 OR artist ILIKE $2 OR venue ILIKE $3)",
                [pattern.clone(), pattern.clone(), pattern],
            ));
        }

        if let Some(city) = city {
            query = query.filter(concert::Column::City.eq(city));
        }

        let models = query
            .order_by_asc(concert::Column::Date)
            .order_by_asc(concert::Column::Id)
            .all(&self.db)
            .await?;

        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn distinct_cities(&self) -> TicketingResult<Vec<String>> {
        let cities = concert::Entity::find()
            .select_only()
            .column(concert::Column::City)
            .distinct()
            .order_by_asc(concert::Column::City)
            .into_tuple::<String>()
            .all(&self.db)
            .await?;

        Ok(cities)
    }

    async fn find_booking(&self, id: Uuid, owner_id: Uuid) -> TicketingResult<Option<Booking>> {
        let model = booking::Entity::find_by_id(id)
            .filter(booking::Column::OwnerId.eq(owner_id))
            .one(&self.db)
            .await?;

        Ok(model.map(Into::into))
    }

    async fn list_bookings(
        &self,
        owner_id: Uuid,
        status: Option<BookingStatus>,
    ) -> TicketingResult<Vec<Booking>> {
        let mut query = booking::Entity::find().filter(booking::Column::OwnerId.eq(owner_id));

        if let Some(status) = status {
            query = query.filter(booking::Column::Status.eq(status));
        }

        let models = query
            .order_by_desc(booking::Column::CreatedAt)
            .order_by_desc(booking::Column::Id)
            .all(&self.db)
            .await?;

        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn find_payment(&self, id: Uuid, owner_id: Uuid) -> TicketingResult<Option<Payment>> {
        let model = payment::Entity::find_by_id(id)
            .filter(payment::Column::OwnerId.eq(owner_id))
            .one(&self.db)
            .await?;

        Ok(model.map(Into::into))
    }
}

/// Open database transaction; rolled back by SeaORM when dropped uncommitted
pub struct PgTransaction {
    txn: DatabaseTransaction,
}

#[async_trait]
impl TicketingTransaction for PgTransaction {
    async fn lock_seats(&mut self, concert_id: Uuid) -> TicketingResult<Option<SeatCounter>> {
        let model = concert::Entity::find_by_id(concert_id)
            .lock_exclusive()
            .one(&self.txn)
            .await?;

        Ok(model.map(|m| SeatCounter {
            concert_id: m.id,
            total_seats: m.total_seats,
            available_seats: m.available_seats,
        }))
    }

    async fn write_available_seats(&mut self, write: SeatWrite) -> TicketingResult<()> {
        concert::ActiveModel {
            id: Set(write.concert_id()),
            available_seats: Set(write.available_seats()),
            updated_at: Set(write.at().into()),
            ..Default::default()
        }
        .update(&self.txn)
        .await?;

        Ok(())
    }

    async fn insert_booking(&mut self, booking: &Booking) -> TicketingResult<()> {
        let model: booking::ActiveModel = booking.into();
        booking::Entity::insert(model).exec(&self.txn).await?;
        Ok(())
    }

    async fn lock_booking(&mut self, id: Uuid, owner_id: Uuid) -> TicketingResult<Option<Booking>> {
        let model = booking::Entity::find_by_id(id)
            .filter(booking::Column::OwnerId.eq(owner_id))
            .lock_exclusive()
            .one(&self.txn)
            .await?;

        Ok(model.map(Into::into))
    }

    async fn set_booking_status(
        &mut self,
        id: Uuid,
        status: BookingStatus,
        at: DateTime<Utc>,
    ) -> TicketingResult<()> {
        booking::ActiveModel {
            id: Set(id),
            status: Set(status),
            updated_at: Set(at.into()),
            ..Default::default()
        }
        .update(&self.txn)
        .await?;

        Ok(())
    }

    async fn insert_payment(&mut self, payment: &Payment) -> TicketingResult<()> {
        let model: payment::ActiveModel = payment.into();
        payment::Entity::insert(model).exec(&self.txn).await?;
        Ok(())
    }

    async fn lock_payment(&mut self, id: Uuid, owner_id: Uuid) -> TicketingResult<Option<Payment>> {
        let model = payment::Entity::find_by_id(id)
            .filter(payment::Column::OwnerId.eq(owner_id))
            .lock_exclusive()
            .one(&self.txn)
            .await?;

        Ok(model.map(Into::into))
    }

    async fn set_payment_status(
        &mut self,
        id: Uuid,
        status: PaymentStatus,
        at: DateTime<Utc>,
    ) -> TicketingResult<()> {
        payment::ActiveModel {
            id: Set(id),
            status: Set(status),
            updated_at: Set(at.into()),
            ..Default::default()
        }
        .update(&self.txn)
        .await?;

        Ok(())
    }

    async fn commit(self) -> TicketingResult<()> {
        self.txn.commit().await?;
        Ok(())
    }
}
