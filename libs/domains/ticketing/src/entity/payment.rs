use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;

use crate::models::{Payment, PaymentMethod, PaymentStatus};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "payments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub booking_id: Uuid,
    pub owner_id: Uuid,
    pub amount: i64,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::booking::Entity",
        from = "Column::BookingId",
        to = "super::booking::Column::Id"
    )]
    Booking,
}

impl Related<super::booking::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Booking.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Payment {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            booking_id: model.booking_id,
            owner_id: model.owner_id,
            amount: model.amount,
            method: model.method,
            status: model.status,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }
}

impl From<&Payment> for ActiveModel {
    fn from(payment: &Payment) -> Self {
        ActiveModel {
            id: Set(payment.id),
            booking_id: Set(payment.booking_id),
            owner_id: Set(payment.owner_id),
            amount: Set(payment.amount),
            method: Set(payment.method),
            status: Set(payment.status),
            created_at: Set(payment.created_at.into()),
            updated_at: Set(payment.updated_at.into()),
        }
    }
}
