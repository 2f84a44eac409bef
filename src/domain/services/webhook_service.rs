// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::event::HookEventType;
use crate::domain::models::hook_task::HookTask;
use crate::domain::models::payload::{Payload, PushPayload};
use crate::domain::repositories::webhook_repository::RepositoryError;
use crate::domain::services::webhook_selector::EventSource;
use crate::queue::task_queue::QueueError;
use async_trait::async_trait;
use thiserror::Error;

/// 通知服务错误
#[derive(Error, Debug)]
pub enum ServiceError {
    /// 仓库错误
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
    /// 负载序列化失败
    #[error("Payload serialization failed: {0}")]
    Payload(#[from] serde_json::Error),
    /// 入队失败
    #[error("Enqueue failed: {0}")]
    Queue(#[from] QueueError),
    /// Webhook不存在
    #[error("Webhook {0} not found")]
    WebhookNotFound(i64),
}

/// Webhook通知服务特质
///
/// 事件生产者只调用该接口，创建任务并入队后立即返回，不等待投递完成
#[async_trait]
pub trait WebhookService: Send + Sync {
    /// 为事件创建投递任务
    ///
    /// # 参数
    ///
    /// * `source` - 事件来源（仓库和所有者）
    /// * `event` - 事件类型
    /// * `payload` - 通用负载
    ///
    /// # 返回值
    ///
    /// * `Ok(Vec<HookTask>)` - 为每个匹配的Webhook创建的任务
    /// * `Err(ServiceError)` - 选择或创建任务失败
    async fn prepare_webhooks(
        &self,
        source: &EventSource,
        event: HookEventType,
        payload: &Payload,
    ) -> Result<Vec<HookTask>, ServiceError>;

    /// 向单个Webhook发送测试推送，不经过事件和分支过滤
    ///
    /// # 参数
    ///
    /// * `webhook_id` - Webhook ID
    /// * `payload` - 推送负载
    async fn prepare_test_webhook(
        &self,
        webhook_id: i64,
        payload: &PushPayload,
    ) -> Result<HookTask, ServiceError>;

    /// 重放历史任务
    ///
    /// # 参数
    ///
    /// * `hook_id` - 所属Webhook ID
    /// * `uuid` - 源任务的投递UUID
    ///
    /// # 返回值
    ///
    /// * `Ok(HookTask)` - 新建的待投递任务
    /// * `Err(ServiceError)` - 源任务不存在或入队失败
    async fn replay_hook_task(&self, hook_id: i64, uuid: &str) -> Result<HookTask, ServiceError>;
}
