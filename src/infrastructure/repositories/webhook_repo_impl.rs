// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::webhook::{
    HookContentType, HookEvent, HookStatus, Webhook, WebhookScope,
};
use crate::domain::repositories::webhook_repository::{RepositoryError, WebhookRepository};
use crate::infrastructure::database::entities::{hook_task, webhook};
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::*;
use std::sync::Arc;
use tracing::info;

/// Webhook仓库实现
#[derive(Clone)]
pub struct WebhookRepoImpl {
    db: Arc<DatabaseConnection>,
}

impl WebhookRepoImpl {
    /// 创建新的Webhook仓库实现
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    fn to_active_model(webhook: &Webhook) -> Result<webhook::ActiveModel, RepositoryError> {
        webhook.validate()?;
        let (repo_id, owner_id, is_system_webhook) = webhook.scope.to_columns();
        let id = if webhook.id > 0 {
            Set(webhook.id)
        } else {
            NotSet
        };

        Ok(webhook::ActiveModel {
            id,
            repo_id: Set(repo_id),
            owner_id: Set(owner_id),
            is_system_webhook: Set(is_system_webhook),
            url: Set(webhook.url.clone()),
            http_method: Set(webhook.http_method.to_uppercase()),
            content_type: Set(webhook.content_type as i32),
            secret: Set(webhook.secret.clone()),
            events: Set(webhook.hook_event.to_json()?),
            is_active: Set(webhook.is_active),
            hook_type: Set(webhook.hook_type.as_str().to_string()),
            meta: Set(webhook.meta.clone()),
            last_status: Set(webhook.last_status as i32),
            authorization_header: Set(webhook.authorization_header.clone()),
            created_at: Set(webhook.created_at.into()),
            updated_at: Set(Utc::now().into()),
        })
    }
}

#[async_trait]
impl WebhookRepository for WebhookRepoImpl {
    async fn create(&self, webhook: &Webhook) -> Result<Webhook, RepositoryError> {
        let mut model = Self::to_active_model(webhook)?;
        model.id = NotSet;

        let created = model.insert(self.db.as_ref()).await?;
        Webhook::try_from(created)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Webhook>, RepositoryError> {
        webhook::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .map(Webhook::try_from)
            .transpose()
    }

    async fn list_by_scope(
        &self,
        scope: WebhookScope,
        active_only: bool,
    ) -> Result<Vec<Webhook>, RepositoryError> {
        let (repo_id, owner_id, is_system_webhook) = scope.to_columns();
        let mut query = webhook::Entity::find()
            .filter(webhook::Column::RepoId.eq(repo_id))
            .filter(webhook::Column::OwnerId.eq(owner_id))
            .filter(webhook::Column::IsSystemWebhook.eq(is_system_webhook));

        if active_only {
            query = query.filter(webhook::Column::IsActive.eq(true));
        }

        query
            .order_by_asc(webhook::Column::Id)
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .map(Webhook::try_from)
            .collect()
    }

    async fn update(&self, webhook: &Webhook) -> Result<Webhook, RepositoryError> {
        if webhook.id <= 0 {
            return Err(RepositoryError::NotFound);
        }
        let model = Self::to_active_model(webhook)?;
        let updated = model.update(self.db.as_ref()).await?;
        Webhook::try_from(updated)
    }

    async fn update_last_status(&self, id: i64, status: HookStatus) -> Result<(), RepositoryError> {
        let result = webhook::Entity::update_many()
            .col_expr(webhook::Column::LastStatus, Expr::value(status as i32))
            .filter(webhook::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await?;

        if result.rows_affected == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<(), RepositoryError> {
        let txn = self.db.begin().await?;

        let tasks = hook_task::Entity::delete_many()
            .filter(hook_task::Column::HookId.eq(id))
            .exec(&txn)
            .await?;

        let result = webhook::Entity::delete_by_id(id).exec(&txn).await?;
        if result.rows_affected == 0 {
            txn.rollback().await?;
            return Err(RepositoryError::NotFound);
        }

        txn.commit().await?;
        info!(
            "Deleted webhook {} with {} hook tasks",
            id, tasks.rows_affected
        );
        Ok(())
    }

    async fn copy_default_webhooks(&self, repo_id: i64) -> Result<Vec<Webhook>, RepositoryError> {
        let defaults = self.list_by_scope(WebhookScope::SystemDefault, false).await?;

        let mut copied = Vec::with_capacity(defaults.len());
        for template in defaults {
            let mut webhook = template.clone();
            webhook.id = 0;
            webhook.scope = WebhookScope::Repository(repo_id);
            webhook.last_status = HookStatus::None;
            webhook.created_at = Utc::now();
            copied.push(self.create(&webhook).await?);
        }
        Ok(copied)
    }
}

impl TryFrom<webhook::Model> for Webhook {
    type Error = RepositoryError;

    fn try_from(model: webhook::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            scope: WebhookScope::from_columns(
                model.repo_id,
                model.owner_id,
                model.is_system_webhook,
            )?,
            url: model.url,
            http_method: model.http_method,
            content_type: HookContentType::from_i32(model.content_type)?,
            secret: model.secret,
            hook_event: HookEvent::from_json(&model.events)?,
            is_active: model.is_active,
            hook_type: model.hook_type.parse()?,
            meta: model.meta,
            last_status: HookStatus::from(model.last_status),
            authorization_header: model.authorization_header,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        })
    }
}
