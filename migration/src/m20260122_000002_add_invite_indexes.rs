use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum InviteHistories {
    Table,
    Inviter,
    Invitee,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_invite_histories_inviter")
                    .table(InviteHistories::Table)
                    .col(InviteHistories::Inviter)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_invite_histories_invitee")
                    .table(InviteHistories::Table)
                    .col(InviteHistories::Invitee)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_invite_histories_inviter")
                    .table(InviteHistories::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_invite_histories_invitee")
                    .table(InviteHistories::Table)
                    .to_owned(),
            )
            .await?;
        Ok(())
    }
}
