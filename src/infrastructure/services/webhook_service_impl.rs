// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::event::HookEventType;
use crate::domain::models::hook_task::HookTask;
use crate::domain::models::payload::{Payload, PushPayload};
use crate::domain::models::webhook::WebhookScope;
use crate::domain::repositories::hook_task_repository::HookTaskRepository;
use crate::domain::repositories::webhook_repository::WebhookRepository;
use crate::domain::services::webhook_selector::{EventSource, WebhookSelector};
use crate::domain::services::webhook_service::{ServiceError, WebhookService};
use crate::queue::task_queue::TaskQueue;
use async_trait::async_trait;
use metrics::counter;
use std::sync::Arc;
use tracing::{debug, info};

/// Webhook通知服务实现
///
/// 选择目标、持久化任务并把任务ID放入投递队列
pub struct WebhookServiceImpl {
    selector: WebhookSelector,
    webhooks: Arc<dyn WebhookRepository>,
    tasks: Arc<dyn HookTaskRepository>,
    queue: Arc<dyn TaskQueue>,
}

impl WebhookServiceImpl {
    /// 创建新的通知服务实现
    pub fn new(
        webhooks: Arc<dyn WebhookRepository>,
        tasks: Arc<dyn HookTaskRepository>,
        queue: Arc<dyn TaskQueue>,
    ) -> Self {
        Self {
            selector: WebhookSelector::new(webhooks.clone()),
            webhooks,
            tasks,
            queue,
        }
    }

    /// 持久化任务后入队
    async fn create_and_enqueue(&self, task: HookTask) -> Result<HookTask, ServiceError> {
        let task = self.tasks.create(&task).await?;
        counter!("webhook_tasks_created_total").increment(1);

        if !self.queue.enqueue(task.id).await? {
            debug!(task_id = task.id, "Hook task already queued");
        }
        Ok(task)
    }
}

#[async_trait]
impl WebhookService for WebhookServiceImpl {
    async fn prepare_webhooks(
        &self,
        source: &EventSource,
        event: HookEventType,
        payload: &Payload,
    ) -> Result<Vec<HookTask>, ServiceError> {
        let webhooks = self.selector.select(source, event, payload).await?;
        if webhooks.is_empty() {
            return Ok(Vec::new());
        }

        let content = payload.to_json()?;
        let mut created = Vec::with_capacity(webhooks.len());
        for webhook in &webhooks {
            let task = HookTask::new(webhook.id, source.repo_id(), event, content.clone());
            created.push(self.create_and_enqueue(task).await?);
        }

        info!(
            event = event.as_str(),
            repo_id = source.repo_id(),
            tasks = created.len(),
            "Prepared webhook tasks"
        );
        Ok(created)
    }

    async fn prepare_test_webhook(
        &self,
        webhook_id: i64,
        payload: &PushPayload,
    ) -> Result<HookTask, ServiceError> {
        let webhook = self
            .webhooks
            .find_by_id(webhook_id)
            .await?
            .ok_or(ServiceError::WebhookNotFound(webhook_id))?;

        let repo_id = match webhook.scope {
            WebhookScope::Repository(id) => id,
            _ => payload.repository.id,
        };
        let content = serde_json::to_string(payload)?;
        let task = HookTask::new(webhook.id, repo_id, HookEventType::Push, content);
        let task = self.create_and_enqueue(task).await?;

        info!(webhook_id, task_id = task.id, "Prepared test webhook task");
        Ok(task)
    }

    async fn replay_hook_task(&self, hook_id: i64, uuid: &str) -> Result<HookTask, ServiceError> {
        let task = self.tasks.replay(hook_id, uuid).await?;
        counter!("webhook_tasks_created_total").increment(1);
        self.queue.enqueue(task.id).await?;

        info!(hook_id, source_uuid = uuid, task_id = task.id, "Replayed hook task");
        Ok(task)
    }
}
