use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Concerts::Table)
                    .if_not_exists()
                    .col(pk_uuid(Concerts::Id))
                    .col(string(Concerts::Name))
                    .col(string(Concerts::Artist))
                    .col(string(Concerts::Venue))
                    .col(string(Concerts::City))
                    .col(timestamp_with_time_zone(Concerts::Date))
                    .col(integer(Concerts::TotalSeats))
                    .col(integer(Concerts::AvailableSeats))
                    .col(string(Concerts::ImageUrl).default(""))
                    .col(text(Concerts::Description).default(""))
                    .col(
                        timestamp_with_time_zone(Concerts::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(Concerts::UpdatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // The seat counter can never leave [0, total_seats], whatever the writer
        manager
            .get_connection()
            .execute_unprepared(
                r#"
                ALTER TABLE concerts
                    ADD CONSTRAINT concerts_total_seats_non_negative
                        CHECK (total_seats >= 0),
                    ADD CONSTRAINT concerts_available_seats_bounded
                        CHECK (available_seats >= 0 AND available_seats <= total_seats)
                "#,
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_concerts_city")
                    .table(Concerts::Table)
                    .col(Concerts::City)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_concerts_date")
                    .table(Concerts::Table)
                    .col(Concerts::Date)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Concerts::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Concerts {
    Table,
    Id,
    Name,
    Artist,
    Venue,
    City,
    Date,
    TotalSeats,
    AvailableSeats,
    ImageUrl,
    Description,
    CreatedAt,
    UpdatedAt,
}
