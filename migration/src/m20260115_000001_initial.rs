use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;
use sea_orm_migration::prelude::extension::postgres::Type;

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Username,
    Nickname,
    Email,
    Phone,
    PasswordHash,
    Status,
    Role,
    Gender,
    PayPassword,
    InviteCode,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum WechatOpenIds {
    Table,
    Id,
    Uid,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum LoginLogs {
    Table,
    Id,
    Uid,
    LoginType,
    Command,
    Client,
    LastIp,
    CreatedAt,
}

#[derive(DeriveIden)]
enum InviteHistories {
    Table,
    Id,
    Inviter,
    Invitee,
    Status,
    RewardSettled,
    CreatedAt,
    UpdatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Postgres ENUM types
        manager
            .create_type(
                Type::create()
                    .as_enum(Alias::new("user_status"))
                    .values(vec![
                        Alias::new("banned"),
                        Alias::new("inactivated"),
                        Alias::new("init"),
                        Alias::new("activated"),
                    ])
                    .to_owned(),
            )
            .await?;

        manager
            .create_type(
                Type::create()
                    .as_enum(Alias::new("user_gender"))
                    .values(vec![
                        Alias::new("unknown"),
                        Alias::new("male"),
                        Alias::new("female"),
                    ])
                    .to_owned(),
            )
            .await?;

        manager
            .create_type(
                Type::create()
                    .as_enum(Alias::new("login_type"))
                    .values(vec![
                        Alias::new("username"),
                        Alias::new("phone"),
                        Alias::new("email"),
                        Alias::new("wechat"),
                    ])
                    .to_owned(),
            )
            .await?;

        manager
            .create_type(
                Type::create()
                    .as_enum(Alias::new("login_command"))
                    .values(vec![
                        Alias::new("login_success"),
                        Alias::new("login_failure"),
                    ])
                    .to_owned(),
            )
            .await?;

        manager
            .create_type(
                Type::create()
                    .as_enum(Alias::new("invite_status"))
                    .values(vec![Alias::new("registered"), Alias::new("activated")])
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Users::Username).text().not_null())
                    .col(ColumnDef::new(Users::Nickname).text().null())
                    .col(ColumnDef::new(Users::Email).text().null())
                    .col(ColumnDef::new(Users::Phone).text().null())
                    .col(ColumnDef::new(Users::PasswordHash).text().not_null())
                    .col(
                        ColumnDef::new(Users::Status)
                            .custom(Alias::new("user_status"))
                            .not_null(),
                    )
                    .col(ColumnDef::new(Users::Role).json_binary().not_null())
                    .col(
                        ColumnDef::new(Users::Gender)
                            .custom(Alias::new("user_gender"))
                            .not_null(),
                    )
                    .col(ColumnDef::new(Users::PayPassword).text().null())
                    .col(ColumnDef::new(Users::InviteCode).text().null())
                    .col(
                        ColumnDef::new(Users::CreatedAt)
                            .timestamp_with_time_zone()
                            .default(Expr::cust("NOW()"))
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Users::UpdatedAt)
                            .timestamp_with_time_zone()
                            .default(Expr::cust("NOW()"))
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_users_username")
                    .table(Users::Table)
                    .col(Users::Username)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_users_email")
                    .table(Users::Table)
                    .col(Users::Email)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_users_phone")
                    .table(Users::Table)
                    .col(Users::Phone)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_users_invite_code")
                    .table(Users::Table)
                    .col(Users::InviteCode)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(WechatOpenIds::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(WechatOpenIds::Id).text().not_null().primary_key())
                    .col(ColumnDef::new(WechatOpenIds::Uid).big_integer().not_null())
                    .col(
                        ColumnDef::new(WechatOpenIds::CreatedAt)
                            .timestamp_with_time_zone()
                            .default(Expr::cust("NOW()"))
                            .null(),
                    )
                    .col(
                        ColumnDef::new(WechatOpenIds::UpdatedAt)
                            .timestamp_with_time_zone()
                            .default(Expr::cust("NOW()"))
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        // 一个用户只绑定一个 openid
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_wechat_open_ids_uid")
                    .table(WechatOpenIds::Table)
                    .col(WechatOpenIds::Uid)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(LoginLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LoginLogs::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(LoginLogs::Uid).big_integer().not_null())
                    .col(
                        ColumnDef::new(LoginLogs::LoginType)
                            .custom(Alias::new("login_type"))
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LoginLogs::Command)
                            .custom(Alias::new("login_command"))
                            .not_null(),
                    )
                    .col(ColumnDef::new(LoginLogs::Client).text().not_null())
                    .col(ColumnDef::new(LoginLogs::LastIp).text().not_null())
                    .col(
                        ColumnDef::new(LoginLogs::CreatedAt)
                            .timestamp_with_time_zone()
                            .default(Expr::cust("NOW()"))
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_login_logs_uid")
                    .table(LoginLogs::Table)
                    .col(LoginLogs::Uid)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(InviteHistories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(InviteHistories::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(InviteHistories::Inviter).big_integer().not_null())
                    .col(ColumnDef::new(InviteHistories::Invitee).big_integer().not_null())
                    .col(
                        ColumnDef::new(InviteHistories::Status)
                            .custom(Alias::new("invite_status"))
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InviteHistories::RewardSettled)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(InviteHistories::CreatedAt)
                            .timestamp_with_time_zone()
                            .default(Expr::cust("NOW()"))
                            .null(),
                    )
                    .col(
                        ColumnDef::new(InviteHistories::UpdatedAt)
                            .timestamp_with_time_zone()
                            .default(Expr::cust("NOW()"))
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(InviteHistories::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(LoginLogs::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(WechatOpenIds::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}
