use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Generated content log
        manager
            .create_table(
                Table::create()
                    .table(AiOutputs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AiOutputs::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AiOutputs::UserId).string().not_null())
                    .col(ColumnDef::new(AiOutputs::Title).string().not_null())
                    .col(ColumnDef::new(AiOutputs::Description).text().not_null())
                    .col(ColumnDef::new(AiOutputs::TemplateUsed).string().not_null())
                    .col(
                        ColumnDef::new(AiOutputs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_ai_outputs_user_id")
                    .table(AiOutputs::Table)
                    .col(AiOutputs::UserId)
                    .to_owned(),
            )
            .await?;

        // Thumbnail polls
        manager
            .create_table(
                Table::create()
                    .table(Polls::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Polls::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Polls::UserId).string().not_null())
                    .col(ColumnDef::new(Polls::Title).string().not_null())
                    .col(ColumnDef::new(Polls::Description).text().null())
                    .col(
                        ColumnDef::new(Polls::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PollOptions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PollOptions::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PollOptions::PollId).uuid().not_null())
                    .col(ColumnDef::new(PollOptions::Text).string().not_null())
                    .col(ColumnDef::new(PollOptions::ImageUrl).string().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_poll_options_poll_id")
                            .from(PollOptions::Table, PollOptions::PollId)
                            .to(Polls::Table, Polls::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Votes::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Votes::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Votes::PollId).uuid().not_null())
                    .col(ColumnDef::new(Votes::OptionId).uuid().not_null())
                    .col(ColumnDef::new(Votes::UserId).string().not_null())
                    .col(
                        ColumnDef::new(Votes::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_votes_poll_id")
                            .from(Votes::Table, Votes::PollId)
                            .to(Polls::Table, Polls::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_votes_option_id")
                            .from(Votes::Table, Votes::OptionId)
                            .to(PollOptions::Table, PollOptions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One vote per user per poll
        manager
            .create_index(
                Index::create()
                    .name("idx_votes_poll_user")
                    .table(Votes::Table)
                    .col(Votes::PollId)
                    .col(Votes::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Votes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PollOptions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Polls::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AiOutputs::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum AiOutputs {
    Table,
    Id,
    UserId,
    Title,
    Description,
    TemplateUsed,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Polls {
    Table,
    Id,
    UserId,
    Title,
    Description,
    CreatedAt,
}

#[derive(DeriveIden)]
enum PollOptions {
    Table,
    Id,
    PollId,
    Text,
    ImageUrl,
}

#[derive(DeriveIden)]
enum Votes {
    Table,
    Id,
    PollId,
    OptionId,
    UserId,
    CreatedAt,
}
