use sea_orm_migration::sea_query::extension::postgres::Type;
use sea_orm_migration::{prelude::*, schema::*};

use crate::m20250301_000000_create_concerts::Concerts;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let statuses = [
            BookingStatus::Pending,
            BookingStatus::Confirmed,
            BookingStatus::Completed,
            BookingStatus::Cancelled,
        ];

        manager
            .create_type(
                Type::create()
                    .as_enum(BookingStatus::Enum)
                    .values(statuses.clone())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Bookings::Table)
                    .if_not_exists()
                    .col(pk_uuid(Bookings::Id))
                    .col(uuid(Bookings::OwnerId))
                    .col(uuid(Bookings::ConcertId))
                    .col(integer(Bookings::TicketCount))
                    .col(
                        ColumnDef::new(Bookings::Status)
                            .enumeration(BookingStatus::Enum, statuses)
                            .not_null()
                            .default("pending"),
                    )
                    .col(big_integer(Bookings::TotalPrice))
                    .col(
                        timestamp_with_time_zone(Bookings::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(Bookings::UpdatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_bookings_concert_id")
                            .from(Bookings::Table, Bookings::ConcertId)
                            .to(Concerts::Table, Concerts::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .get_connection()
            .execute_unprepared(
                r#"
                ALTER TABLE bookings
                    ADD CONSTRAINT bookings_ticket_count_positive CHECK (ticket_count > 0),
                    ADD CONSTRAINT bookings_total_price_positive CHECK (total_price > 0)
                "#,
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_bookings_owner_status")
                    .table(Bookings::Table)
                    .col(Bookings::OwnerId)
                    .col(Bookings::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_bookings_concert_id")
                    .table(Bookings::Table)
                    .col(Bookings::ConcertId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Bookings::Table).to_owned())
            .await?;

        manager
            .drop_type(Type::drop().name(BookingStatus::Enum).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Bookings {
    Table,
    Id,
    OwnerId,
    ConcertId,
    TicketCount,
    Status,
    TotalPrice,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden, Clone)]
enum BookingStatus {
    #[sea_orm(iden = "booking_status")]
    Enum,
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}
