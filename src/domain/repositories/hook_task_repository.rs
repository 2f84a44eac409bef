// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::webhook_repository::RepositoryError;
use crate::domain::models::hook_task::HookTask;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// 投递任务仓库特质
///
/// 定义投递任务的数据访问接口
#[async_trait]
pub trait HookTaskRepository: Send + Sync {
    /// 创建投递任务
    async fn create(&self, task: &HookTask) -> Result<HookTask, RepositoryError>;
    /// 根据ID查找任务
    async fn find_by_id(&self, id: i64) -> Result<Option<HookTask>, RepositoryError>;
    /// 更新任务的投递状态与请求/响应记录
    async fn update(&self, task: &HookTask) -> Result<(), RepositoryError>;
    /// 查找所有尚未尝试投递的任务
    async fn find_undelivered(&self) -> Result<Vec<HookTask>, RepositoryError>;
    /// 分页列出某个Webhook的投递历史，按ID倒序
    async fn list_by_hook(
        &self,
        hook_id: i64,
        page: u64,
        page_size: u64,
    ) -> Result<Vec<HookTask>, RepositoryError>;
    /// 复制指定任务为新的待投递任务
    async fn replay(&self, hook_id: i64, uuid: &str) -> Result<HookTask, RepositoryError>;
    /// 删除投递时间早于截止时间的成功任务
    async fn delete_succeeded_before(&self, cutoff: DateTime<Utc>) -> Result<u64, RepositoryError>;
    /// 列出存在已投递任务的Webhook ID
    async fn delivered_hook_ids(&self) -> Result<Vec<i64>, RepositoryError>;
    /// 仅保留某个Webhook最新的 `keep` 个成功任务
    async fn prune_succeeded(&self, hook_id: i64, keep: u64) -> Result<u64, RepositoryError>;
}
