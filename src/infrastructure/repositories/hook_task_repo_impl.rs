// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::hook_task::{HookRequest, HookResponse, HookTask};
use crate::domain::repositories::hook_task_repository::HookTaskRepository;
use crate::domain::repositories::webhook_repository::RepositoryError;
use crate::infrastructure::database::entities::hook_task;
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use sea_orm::*;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

/// 投递任务仓库实现
#[derive(Clone)]
pub struct HookTaskRepoImpl {
    db: Arc<DatabaseConnection>,
}

impl HookTaskRepoImpl {
    /// 创建新的投递任务仓库实现
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

fn to_nanos(at: DateTime<Utc>) -> Result<i64, RepositoryError> {
    at.timestamp_nanos_opt()
        .ok_or_else(|| RepositoryError::InvalidData(format!("timestamp out of range: {}", at)))
}

fn encode<T: Serialize>(value: &Option<T>) -> Result<Option<String>, RepositoryError> {
    value
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .map_err(|e| RepositoryError::InvalidData(e.to_string()))
}

fn decode<T: DeserializeOwned>(raw: Option<String>) -> Result<Option<T>, RepositoryError> {
    match raw {
        Some(raw) if !raw.is_empty() => serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| RepositoryError::InvalidData(e.to_string())),
        _ => Ok(None),
    }
}

#[async_trait]
impl HookTaskRepository for HookTaskRepoImpl {
    async fn create(&self, task: &HookTask) -> Result<HookTask, RepositoryError> {
        let model = hook_task::ActiveModel {
            id: NotSet,
            repo_id: Set(task.repo_id),
            hook_id: Set(task.hook_id),
            uuid: Set(task.uuid.clone()),
            payload_content: Set(task.payload_content.clone()),
            event_type: Set(task.event_type.as_str().to_string()),
            is_delivered: Set(task.is_delivered),
            delivered: Set(task.delivered_at.map(to_nanos).transpose()?),
            is_succeed: Set(task.is_succeed),
            request_content: Set(encode(&task.request_info)?),
            response_content: Set(encode(&task.response_info)?),
            created_at: Set(task.created_at.into()),
        };

        let created = model.insert(self.db.as_ref()).await?;
        HookTask::try_from(created)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<HookTask>, RepositoryError> {
        hook_task::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .map(HookTask::try_from)
            .transpose()
    }

    async fn update(&self, task: &HookTask) -> Result<(), RepositoryError> {
        let model = hook_task::ActiveModel {
            id: Unchanged(task.id),
            is_delivered: Set(task.is_delivered),
            delivered: Set(task.delivered_at.map(to_nanos).transpose()?),
            is_succeed: Set(task.is_succeed),
            request_content: Set(encode(&task.request_info)?),
            response_content: Set(encode(&task.response_info)?),
            ..Default::default()
        };

        model.update(self.db.as_ref()).await?;
        Ok(())
    }

    async fn find_undelivered(&self) -> Result<Vec<HookTask>, RepositoryError> {
        hook_task::Entity::find()
            .filter(hook_task::Column::IsDelivered.eq(false))
            .order_by_asc(hook_task::Column::Id)
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .map(HookTask::try_from)
            .collect()
    }

    async fn list_by_hook(
        &self,
        hook_id: i64,
        page: u64,
        page_size: u64,
    ) -> Result<Vec<HookTask>, RepositoryError> {
        let page = page.max(1);
        hook_task::Entity::find()
            .filter(hook_task::Column::HookId.eq(hook_id))
            .order_by_desc(hook_task::Column::Id)
            .offset((page - 1) * page_size)
            .limit(page_size)
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .map(HookTask::try_from)
            .collect()
    }

    async fn replay(&self, hook_id: i64, uuid: &str) -> Result<HookTask, RepositoryError> {
        let source = hook_task::Entity::find()
            .filter(hook_task::Column::HookId.eq(hook_id))
            .filter(hook_task::Column::Uuid.eq(uuid))
            .one(self.db.as_ref())
            .await?
            .ok_or(RepositoryError::NotFound)?;

        let source = HookTask::try_from(source)?;
        self.create(&source.replay()).await
    }

    async fn delete_succeeded_before(&self, cutoff: DateTime<Utc>) -> Result<u64, RepositoryError> {
        let result = hook_task::Entity::delete_many()
            .filter(hook_task::Column::IsDelivered.eq(true))
            .filter(hook_task::Column::IsSucceed.eq(true))
            .filter(hook_task::Column::Delivered.lt(to_nanos(cutoff)?))
            .exec(self.db.as_ref())
            .await?;

        Ok(result.rows_affected)
    }

    async fn delivered_hook_ids(&self) -> Result<Vec<i64>, RepositoryError> {
        let ids = hook_task::Entity::find()
            .select_only()
            .column(hook_task::Column::HookId)
            .distinct()
            .filter(hook_task::Column::IsDelivered.eq(true))
            .order_by_asc(hook_task::Column::HookId)
            .into_tuple::<i64>()
            .all(self.db.as_ref())
            .await?;

        Ok(ids)
    }

    async fn prune_succeeded(&self, hook_id: i64, keep: u64) -> Result<u64, RepositoryError> {
        let ids = hook_task::Entity::find()
            .select_only()
            .column(hook_task::Column::Id)
            .filter(hook_task::Column::HookId.eq(hook_id))
            .filter(hook_task::Column::IsDelivered.eq(true))
            .filter(hook_task::Column::IsSucceed.eq(true))
            .order_by_desc(hook_task::Column::Delivered)
            .order_by_desc(hook_task::Column::Id)
            .into_tuple::<i64>()
            .all(self.db.as_ref())
            .await?;

        let stale: Vec<i64> = ids.into_iter().skip(keep as usize).collect();
        if stale.is_empty() {
            return Ok(0);
        }

        let result = hook_task::Entity::delete_many()
            .filter(hook_task::Column::Id.is_in(stale))
            .exec(self.db.as_ref())
            .await?;

        Ok(result.rows_affected)
    }
}

impl TryFrom<hook_task::Model> for HookTask {
    type Error = RepositoryError;

    fn try_from(model: hook_task::Model) -> Result<Self, Self::Error> {
        let event_type = model
            .event_type
            .parse()
            .map_err(|e: crate::domain::models::event::UnknownEventType| {
                RepositoryError::InvalidData(e.to_string())
            })?;

        Ok(Self {
            id: model.id,
            repo_id: model.repo_id,
            hook_id: model.hook_id,
            uuid: model.uuid,
            payload_content: model.payload_content,
            event_type,
            is_delivered: model.is_delivered,
            delivered_at: model.delivered.map(|nanos| Utc.timestamp_nanos(nanos)),
            is_succeed: model.is_succeed,
            request_info: decode::<HookRequest>(model.request_content)?,
            response_info: decode::<HookResponse>(model.response_content)?,
            created_at: model.created_at.into(),
        })
    }
}
