// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Webhooks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Webhooks::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Webhooks::RepoId)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Webhooks::OwnerId)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Webhooks::IsSystemWebhook)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Webhooks::Url).text().not_null())
                    .col(
                        ColumnDef::new(Webhooks::HttpMethod)
                            .string()
                            .not_null()
                            .default("POST"),
                    )
                    .col(
                        ColumnDef::new(Webhooks::ContentType)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(ColumnDef::new(Webhooks::Secret).text().not_null().default(""))
                    .col(ColumnDef::new(Webhooks::Events).text().not_null())
                    .col(
                        ColumnDef::new(Webhooks::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Webhooks::HookType)
                            .string()
                            .not_null()
                            .default("gitea"),
                    )
                    .col(ColumnDef::new(Webhooks::Meta).text().not_null().default(""))
                    .col(
                        ColumnDef::new(Webhooks::LastStatus)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Webhooks::AuthorizationHeader).text().null())
                    .col(
                        ColumnDef::new(Webhooks::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Webhooks::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_webhooks_repo_active")
                    .table(Webhooks::Table)
                    .col(Webhooks::RepoId)
                    .col(Webhooks::IsActive)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_webhooks_owner_active")
                    .table(Webhooks::Table)
                    .col(Webhooks::OwnerId)
                    .col(Webhooks::IsActive)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Webhooks::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub(crate) enum Webhooks {
    Table,
    Id,
    RepoId,
    OwnerId,
    IsSystemWebhook,
    Url,
    HttpMethod,
    ContentType,
    Secret,
    Events,
    IsActive,
    HookType,
    Meta,
    LastStatus,
    AuthorizationHeader,
    CreatedAt,
    UpdatedAt,
}
