use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;

use crate::models::{Booking, BookingStatus};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "bookings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub owner_id: Uuid,
    pub concert_id: Uuid,
    pub ticket_count: i32,
    pub status: BookingStatus,
    pub total_price: i64,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::concert::Entity",
        from = "Column::ConcertId",
        to = "super::concert::Column::Id"
    )]
    Concert,
    #[sea_orm(has_many = "super::payment::Entity")]
    Payments,
}

impl Related<super::concert::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Concert.def()
    }
}

impl Related<super::payment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Booking {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            owner_id: model.owner_id,
            concert_id: model.concert_id,
            ticket_count: model.ticket_count,
            status: model.status,
            total_price: model.total_price,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }
}

impl From<&Booking> for ActiveModel {
    fn from(booking: &Booking) -> Self {
        ActiveModel {
            id: Set(booking.id),
            owner_id: Set(booking.owner_id),
            concert_id: Set(booking.concert_id),
            ticket_count: Set(booking.ticket_count),
            status: Set(booking.status),
            total_price: Set(booking.total_price),
            created_at: Set(booking.created_at.into()),
            updated_at: Set(booking.updated_at.into()),
        }
    }
}
