// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::m20250101_000001_create_webhooks::Webhooks;
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(HookTasks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(HookTasks::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(HookTasks::RepoId)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(HookTasks::HookId).big_integer().not_null())
                    .col(
                        ColumnDef::new(HookTasks::Uuid)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(HookTasks::PayloadContent).text().not_null())
                    .col(ColumnDef::new(HookTasks::EventType).string().not_null())
                    .col(
                        ColumnDef::new(HookTasks::IsDelivered)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    // Unix nanoseconds, set once the attempt is terminal
                    .col(ColumnDef::new(HookTasks::Delivered).big_integer().null())
                    .col(
                        ColumnDef::new(HookTasks::IsSucceed)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(HookTasks::RequestContent).text().null())
                    .col(ColumnDef::new(HookTasks::ResponseContent).text().null())
                    .col(
                        ColumnDef::new(HookTasks::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_hook_tasks_hook_id")
                            .from(HookTasks::Table, HookTasks::HookId)
                            .to(Webhooks::Table, Webhooks::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_hook_tasks_hook_id")
                    .table(HookTasks::Table)
                    .col(HookTasks::HookId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_hook_tasks_delivered")
                    .table(HookTasks::Table)
                    .col(HookTasks::IsDelivered)
                    .col(HookTasks::Delivered)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(HookTasks::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum HookTasks {
    Table,
    Id,
    RepoId,
    HookId,
    Uuid,
    PayloadContent,
    EventType,
    IsDelivered,
    Delivered,
    IsSucceed,
    RequestContent,
    ResponseContent,
    CreatedAt,
}
