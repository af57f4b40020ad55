use sea_orm_migration::sea_query::extension::postgres::Type;
use sea_orm_migration::{prelude::*, schema::*};

use crate::m20250301_000001_create_bookings::Bookings;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let methods = [
            PaymentMethod::CreditCard,
            PaymentMethod::BankTransfer,
            PaymentMethod::EWallet,
        ];
        let statuses = [
            PaymentStatus::Pending,
            PaymentStatus::Completed,
            PaymentStatus::Failed,
        ];

        manager
            .create_type(
                Type::create()
                    .as_enum(PaymentMethod::Enum)
                    .values(methods.clone())
                    .to_owned(),
            )
            .await?;

        manager
            .create_type(
                Type::create()
                    .as_enum(PaymentStatus::Enum)
                    .values(statuses.clone())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Payments::Table)
                    .if_not_exists()
                    .col(pk_uuid(Payments::Id))
                    .col(uuid(Payments::BookingId))
                    .col(uuid(Payments::OwnerId))
                    .col(big_integer(Payments::Amount))
                    .col(
                        ColumnDef::new(Payments::Method)
                            .enumeration(PaymentMethod::Enum, methods)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Payments::Status)
                            .enumeration(PaymentStatus::Enum, statuses)
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        timestamp_with_time_zone(Payments::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(Payments::UpdatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payments_booking_id")
                            .from(Payments::Table, Payments::BookingId)
                            .to(Bookings::Table, Bookings::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .get_connection()
            .execute_unprepared(
                "ALTER TABLE payments ADD CONSTRAINT payments_amount_positive CHECK (amount > 0)",
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_payments_owner_id")
                    .table(Payments::Table)
                    .col(Payments::OwnerId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_payments_booking_id")
                    .table(Payments::Table)
                    .col(Payments::BookingId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Payments::Table).to_owned())
            .await?;

        manager
            .drop_type(Type::drop().name(PaymentStatus::Enum).to_owned())
            .await?;

        manager
            .drop_type(Type::drop().name(PaymentMethod::Enum).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Payments {
    Table,
    Id,
    BookingId,
    OwnerId,
    Amount,
    Method,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden, Clone)]
enum PaymentMethod {
    #[sea_orm(iden = "payment_method")]
    Enum,
    CreditCard,
    BankTransfer,
    #[sea_orm(iden = "e_wallet")]
    EWallet,
}

#[derive(DeriveIden, Clone)]
enum PaymentStatus {
    #[sea_orm(iden = "payment_status")]
    Enum,
    Pending,
    Completed,
    Failed,
}
