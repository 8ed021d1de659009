//! Create `complaint` table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Complaint::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Complaint::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Complaint::ComplaintId)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Complaint::Title).string_len(256).not_null())
                    .col(ColumnDef::new(Complaint::Description).text().not_null())
                    .col(
                        ColumnDef::new(Complaint::Location)
                            .string_len(256)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Complaint::Priority)
                            .string_len(32)
                            .not_null()
                            .default("medium"),
                    )
                    .col(
                        ColumnDef::new(Complaint::Status)
                            .string_len(32)
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(Complaint::CreatorType)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Complaint::CreatorId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Complaint::AssignedTechnicianId).string_len(32))
                    .col(
                        ColumnDef::new(Complaint::Photos)
                            .json_binary()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Complaint::ResolutionPhotos)
                            .json_binary()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Complaint::TechnicianNotes).text())
                    .col(ColumnDef::new(Complaint::ResolutionNotes).text())
                    .col(ColumnDef::new(Complaint::MaterialsUsed).text())
                    .col(
                        ColumnDef::new(Complaint::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Complaint::AssignedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Complaint::StartedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Complaint::ResolvedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_complaint_creator")
                            .from(Complaint::Table, Complaint::CreatorId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: human-facing complaint number
        manager
            .create_index(
                Index::create()
                    .name("idx_complaint_complaint_id")
                    .table(Complaint::Table)
                    .col(Complaint::ComplaintId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: status (pending queues, active-work counts)
        manager
            .create_index(
                Index::create()
                    .name("idx_complaint_status")
                    .table(Complaint::Table)
                    .col(Complaint::Status)
                    .to_owned(),
            )
            .await?;

        // Index: assigned technician (workload queries)
        manager
            .create_index(
                Index::create()
                    .name("idx_complaint_assigned_technician_id")
                    .table(Complaint::Table)
                    .col(Complaint::AssignedTechnicianId)
                    .to_owned(),
            )
            .await?;

        // Index: creator (my-complaints listings)
        manager
            .create_index(
                Index::create()
                    .name("idx_complaint_creator_id")
                    .table(Complaint::Table)
                    .col(Complaint::CreatorId)
                    .to_owned(),
            )
            .await?;

        // Indexes: lifecycle timestamps (reporting range scans)
        manager
            .create_index(
                Index::create()
                    .name("idx_complaint_created_at")
                    .table(Complaint::Table)
                    .col(Complaint::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_complaint_assigned_at")
                    .table(Complaint::Table)
                    .col(Complaint::AssignedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_complaint_resolved_at")
                    .table(Complaint::Table)
                    .col(Complaint::ResolvedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Complaint::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Complaint {
    Table,
    Id,
    ComplaintId,
    Title,
    Description,
    Location,
    Priority,
    Status,
    CreatorType,
    CreatorId,
    AssignedTechnicianId,
    Photos,
    ResolutionPhotos,
    TechnicianNotes,
    ResolutionNotes,
    MaterialsUsed,
    CreatedAt,
    AssignedAt,
    StartedAt,
    ResolvedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
