//! Initial schema migration - creates all tables from scratch.
//!
//! It creates the complete schema for Bolletta:
//!
//! - `users`: mirrored user accounts forming a creator tree
//! - `receivers`: named payees, one set per owning user
//! - `locations`: named places, one set per owning user
//! - `consumers`: named people a bill is split over, one set per owning user
//! - `bills`: recorded expenses referencing one receiver, one location and
//!   a set of consumers
//! - `bill_consumers`: bill/consumer join table
//!
//! Reference names are unique per `(user_id, name)` across live and
//! soft-deleted rows, and user emails are unique across the whole table, so
//! get-or-create resolution can rely on the database instead of a
//! check-then-insert read.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Users {
    Table,
    Id,
    FirstName,
    LastName,
    Email,
    Password,
    Phone,
    Role,
    CreatedBy,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
}

#[derive(Iden)]
enum Receivers {
    Table,
    Id,
    Name,
    UserId,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
}

#[derive(Iden)]
enum Locations {
    Table,
    Id,
    Name,
    UserId,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
}

#[derive(Iden)]
enum Consumers {
    Table,
    Id,
    Name,
    UserId,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
}

#[derive(Iden)]
enum Bills {
    Table,
    Id,
    Amount,
    Description,
    Date,
    UserId,
    ReceiverId,
    LocationId,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
}

#[derive(Iden)]
enum BillConsumers {
    Table,
    BillId,
    ConsumerId,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Users
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        // Ids come from the upstream identity service, so no
                        // auto increment here.
                        ColumnDef::new(Users::Id)
                            .big_integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Users::FirstName).string_len(45).not_null())
                    .col(ColumnDef::new(Users::LastName).string_len(45).not_null())
                    .col(ColumnDef::new(Users::Email).string_len(256).not_null())
                    .col(ColumnDef::new(Users::Password).string_len(60).not_null())
                    .col(ColumnDef::new(Users::Phone).string_len(12).not_null())
                    .col(
                        ColumnDef::new(Users::Role)
                            .string_len(10)
                            .not_null()
                            .default("user"),
                    )
                    .col(ColumnDef::new(Users::CreatedBy).big_integer())
                    .col(ColumnDef::new(Users::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Users::UpdatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Users::DeletedAt).timestamp())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-users-created_by")
                            .from(Users::Table, Users::CreatedBy)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // Uniqueness spans soft-deleted rows as well: a deleted account still
        // reserves its email.
        manager
            .create_index(
                Index::create()
                    .name("idx-users-email-unique")
                    .table(Users::Table)
                    .col(Users::Email)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-users-created_by")
                    .table(Users::Table)
                    .col(Users::CreatedBy)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Receivers
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Receivers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Receivers::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Receivers::Name).string_len(100).not_null())
                    .col(ColumnDef::new(Receivers::UserId).big_integer().not_null())
                    .col(ColumnDef::new(Receivers::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Receivers::UpdatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Receivers::DeletedAt).timestamp())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-receivers-user_id")
                            .from(Receivers::Table, Receivers::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-receivers-user_id-name-unique")
                    .table(Receivers::Table)
                    .col(Receivers::UserId)
                    .col(Receivers::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Locations
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Locations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Locations::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Locations::Name).string_len(100).not_null())
                    .col(ColumnDef::new(Locations::UserId).big_integer().not_null())
                    .col(ColumnDef::new(Locations::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Locations::UpdatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Locations::DeletedAt).timestamp())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-locations-user_id")
                            .from(Locations::Table, Locations::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-locations-user_id-name-unique")
                    .table(Locations::Table)
                    .col(Locations::UserId)
                    .col(Locations::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Consumers
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Consumers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Consumers::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Consumers::Name).string_len(100).not_null())
                    .col(ColumnDef::new(Consumers::UserId).big_integer().not_null())
                    .col(ColumnDef::new(Consumers::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Consumers::UpdatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Consumers::DeletedAt).timestamp())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-consumers-user_id")
                            .from(Consumers::Table, Consumers::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-consumers-user_id-name-unique")
                    .table(Consumers::Table)
                    .col(Consumers::UserId)
                    .col(Consumers::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 5. Bills
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Bills::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Bills::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Bills::Amount).string_len(18).not_null())
                    .col(
                        ColumnDef::new(Bills::Description)
                            .string_len(500)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Bills::Date).timestamp())
                    .col(ColumnDef::new(Bills::UserId).big_integer().not_null())
                    .col(ColumnDef::new(Bills::ReceiverId).integer().not_null())
                    .col(ColumnDef::new(Bills::LocationId).integer().not_null())
                    .col(ColumnDef::new(Bills::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Bills::UpdatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Bills::DeletedAt).timestamp())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-bills-user_id")
                            .from(Bills::Table, Bills::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-bills-receiver_id")
                            .from(Bills::Table, Bills::ReceiverId)
                            .to(Receivers::Table, Receivers::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-bills-location_id")
                            .from(Bills::Table, Bills::LocationId)
                            .to(Locations::Table, Locations::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-bills-user_id")
                    .table(Bills::Table)
                    .col(Bills::UserId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 6. Bill Consumers
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(BillConsumers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BillConsumers::BillId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BillConsumers::ConsumerId)
                            .integer()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(BillConsumers::BillId)
                            .col(BillConsumers::ConsumerId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-bill_consumers-bill_id")
                            .from(BillConsumers::Table, BillConsumers::BillId)
                            .to(Bills::Table, Bills::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-bill_consumers-consumer_id")
                            .from(BillConsumers::Table, BillConsumers::ConsumerId)
                            .to(Consumers::Table, Consumers::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-bill_consumers-consumer_id")
                    .table(BillConsumers::Table)
                    .col(BillConsumers::ConsumerId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(BillConsumers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Bills::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Consumers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Locations::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Receivers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;

        Ok(())
    }
}
