// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "hook_tasks")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub repo_id: i64,
    pub hook_id: i64,
    #[sea_orm(unique)]
    pub uuid: String,
    #[sea_orm(column_type = "Text")]
    pub payload_content: String,
    pub event_type: String,
    pub is_delivered: bool,
    /// Unix nanoseconds
    pub delivered: Option<i64>,
    pub is_succeed: bool,
    #[sea_orm(column_type = "Text", nullable)]
    pub request_content: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub response_content: Option<String>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::webhook::Entity",
        from = "Column::HookId",
        to = "super::webhook::Column::Id",
        on_delete = "Cascade"
    )]
    Webhook,
}

impl Related<super::webhook::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Webhook.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
