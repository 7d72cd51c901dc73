//! Create `contact_messages` table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ContactMessages::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ContactMessages::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ContactMessages::Name).string_len(100).not_null())
                    .col(ColumnDef::new(ContactMessages::Email).string_len(255).not_null())
                    .col(ColumnDef::new(ContactMessages::Phone).string_len(50))
                    .col(ColumnDef::new(ContactMessages::Company).string_len(200))
                    .col(ColumnDef::new(ContactMessages::Subject).string_len(200).not_null())
                    .col(ColumnDef::new(ContactMessages::Message).text().not_null())
                    .col(
                        ColumnDef::new(ContactMessages::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: created_at
        manager
            .create_index(
                Index::create()
                    .name("idx_contact_messages_created_at")
                    .table(ContactMessages::Table)
                    .col(ContactMessages::CreatedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ContactMessages::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum ContactMessages {
    Table,
    Id,
    Name,
    Email,
    Phone,
    Company,
    Subject,
    Message,
    CreatedAt,
}
