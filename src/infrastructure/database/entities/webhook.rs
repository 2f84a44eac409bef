// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "webhooks")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub repo_id: i64,
    pub owner_id: i64,
    pub is_system_webhook: bool,
    #[sea_orm(column_type = "Text")]
    pub url: String,
    pub http_method: String,
    pub content_type: i32,
    #[sea_orm(column_type = "Text")]
    pub secret: String,
    #[sea_orm(column_type = "Text")]
    pub events: String,
    pub is_active: bool,
    pub hook_type: String,
    #[sea_orm(column_type = "Text")]
    pub meta: String,
    pub last_status: i32,
    #[sea_orm(column_type = "Text", nullable)]
    pub authorization_header: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::hook_task::Entity")]
    HookTask,
}

impl Related<super::hook_task::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::HookTask.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
