//! Create `asset_record` table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AssetRecord::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AssetRecord::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(AssetRecord::TechnicianId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AssetRecord::StoreName)
                            .string_len(256)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AssetRecord::SubmissionDate)
                            .date()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AssetRecord::Equipment)
                            .json_binary()
                            .not_null(),
                    )
                    .col(ColumnDef::new(AssetRecord::Notes).text())
                    .col(
                        ColumnDef::new(AssetRecord::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_asset_record_technician")
                            .from(AssetRecord::Table, AssetRecord::TechnicianId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: technician (per-technician listings)
        manager
            .create_index(
                Index::create()
                    .name("idx_asset_record_technician_id")
                    .table(AssetRecord::Table)
                    .col(AssetRecord::TechnicianId)
                    .to_owned(),
            )
            .await?;

        // Index: submission date (visit-history range scans)
        manager
            .create_index(
                Index::create()
                    .name("idx_asset_record_submission_date")
                    .table(AssetRecord::Table)
                    .col(AssetRecord::SubmissionDate)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AssetRecord::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum AssetRecord {
    Table,
    Id,
    TechnicianId,
    StoreName,
    SubmissionDate,
    Equipment,
    Notes,
    CreatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
