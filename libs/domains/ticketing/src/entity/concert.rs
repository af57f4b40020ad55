use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;

use crate::models::{Concert, ConcertStatus};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "concerts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub artist: String,
    pub venue: String,
    pub city: String,
    pub date: DateTimeWithTimeZone,
    pub total_seats: i32,
    pub available_seats: i32,
    pub image_url: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::booking::Entity")]
    Bookings,
}

impl Related<super::booking::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bookings.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Concert {
    fn from(model: Model) -> Self {
        let date: chrono::DateTime<chrono::Utc> = model.date.into();

        Self {
            id: model.id,
            name: model.name,
            artist: model.artist,
            venue: model.venue,
            city: model.city,
            date,
            total_seats: model.total_seats,
            available_seats: model.available_seats,
            image_url: model.image_url,
            description: model.description,
            status: ConcertStatus::derive(model.available_seats, date, chrono::Utc::now()),
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }
}

impl From<&Concert> for ActiveModel {
    fn from(concert: &Concert) -> Self {
        ActiveModel {
            id: Set(concert.id),
            name: Set(concert.name.clone()),
            artist: Set(concert.artist.clone()),
            venue: Set(concert.venue.clone()),
            city: Set(concert.city.clone()),
            date: Set(concert.date.into()),
            total_seats: Set(concert.total_seats),
            available_seats: Set(concert.available_seats),
            image_url: Set(concert.image_url.clone()),
            description: Set(concert.description.clone()),
            created_at: Set(concert.created_at.into()),
            updated_at: Set(concert.updated_at.into()),
        }
    }
}
