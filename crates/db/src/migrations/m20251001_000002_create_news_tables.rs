//! Create `news` and `news_attachments` tables migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(News::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(News::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(News::Title).string_len(512).not_null())
                    .col(ColumnDef::new(News::TitleEn).string_len(512))
                    .col(ColumnDef::new(News::Content).text().not_null())
                    .col(ColumnDef::new(News::ContentEn).text())
                    .col(ColumnDef::new(News::Summary).text())
                    .col(ColumnDef::new(News::SummaryEn).text())
                    .col(ColumnDef::new(News::ImageUrl).string_len(1024))
                    .col(ColumnDef::new(News::Published).boolean().not_null().default(false))
                    .col(
                        ColumnDef::new(News::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(News::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (published, created_at) for the public list
        manager
            .create_index(
                Index::create()
                    .name("idx_news_published_created_at")
                    .table(News::Table)
                    .col(News::Published)
                    .col(News::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(NewsAttachments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(NewsAttachments::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(NewsAttachments::NewsId).string_len(32).not_null())
                    .col(ColumnDef::new(NewsAttachments::FileName).string_len(512).not_null())
                    .col(
                        ColumnDef::new(NewsAttachments::FilePath)
                            .string_len(1024)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(NewsAttachments::FileType).string_len(128).not_null())
                    .col(ColumnDef::new(NewsAttachments::FileSize).big_integer().not_null())
                    .col(
                        ColumnDef::new(NewsAttachments::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_news_attachments_news")
                            .from(NewsAttachments::Table, NewsAttachments::NewsId)
                            .to(News::Table, News::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: news_id
        manager
            .create_index(
                Index::create()
                    .name("idx_news_attachments_news_id")
                    .table(NewsAttachments::Table)
                    .col(NewsAttachments::NewsId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(NewsAttachments::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(News::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum News {
    Table,
    Id,
    Title,
    TitleEn,
    Content,
    ContentEn,
    Summary,
    SummaryEn,
    ImageUrl,
    Published,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum NewsAttachments {
    Table,
    Id,
    NewsId,
    FileName,
    FilePath,
    FileType,
    FileSize,
    CreatedAt,
}
