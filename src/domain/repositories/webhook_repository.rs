// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::webhook::{HookStatus, Webhook, WebhookScope, WebhookValidationError};
use async_trait::async_trait;
use sea_orm::DbErr;
use thiserror::Error;

/// 仓库错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// 数据库错误
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
    /// 记录未找到
    #[error("Record not found")]
    NotFound,
    /// 持久化数据无法还原为领域对象
    #[error("Invalid data: {0}")]
    InvalidData(String),
    /// 配置校验失败
    #[error("Validation error: {0}")]
    Validation(#[from] WebhookValidationError),
}

/// Webhook仓库特质
///
/// 定义Webhook配置的数据访问接口
#[async_trait]
pub trait WebhookRepository: Send + Sync {
    /// 创建Webhook，校验作用域与分支过滤器后分配ID
    async fn create(&self, webhook: &Webhook) -> Result<Webhook, RepositoryError>;
    /// 根据ID查找Webhook
    async fn find_by_id(&self, id: i64) -> Result<Option<Webhook>, RepositoryError>;
    /// 按作用域列出Webhook
    async fn list_by_scope(
        &self,
        scope: WebhookScope,
        active_only: bool,
    ) -> Result<Vec<Webhook>, RepositoryError>;
    /// 更新Webhook，事件订阅配置在此重新序列化
    async fn update(&self, webhook: &Webhook) -> Result<Webhook, RepositoryError>;
    /// 更新最近一次投递状态
    async fn update_last_status(&self, id: i64, status: HookStatus) -> Result<(), RepositoryError>;
    /// 删除Webhook及其全部投递任务
    async fn delete(&self, id: i64) -> Result<(), RepositoryError>;
    /// 将所有系统默认Webhook复制到新仓库
    async fn copy_default_webhooks(&self, repo_id: i64) -> Result<Vec<Webhook>, RepositoryError>;
}
