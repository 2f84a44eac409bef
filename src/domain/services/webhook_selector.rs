// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::event::HookEventType;
use crate::domain::models::payload::Payload;
use crate::domain::models::webhook::{Webhook, WebhookScope};
use crate::domain::repositories::webhook_repository::{RepositoryError, WebhookRepository};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// 事件所属仓库
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepoRef {
    pub id: i64,
    pub owner_id: i64,
}

/// 事件所属用户或组织
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OwnerRef {
    pub id: i64,
    pub is_organization: bool,
}

/// 事件来源
///
/// 仓库事件同时携带仓库和所有者，包事件只携带所有者
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventSource {
    pub repository: Option<RepoRef>,
    pub owner: Option<OwnerRef>,
}

impl EventSource {
    /// 仓库事件来源
    pub fn repository(repo: RepoRef, owner: OwnerRef) -> Self {
        Self {
            repository: Some(repo),
            owner: Some(owner),
        }
    }

    /// 仅所有者的事件来源
    pub fn owner(owner: OwnerRef) -> Self {
        Self {
            repository: None,
            owner: Some(owner),
        }
    }

    /// 事件所属仓库ID，非仓库事件为 0
    pub fn repo_id(&self) -> i64 {
        self.repository.map(|repo| repo.id).unwrap_or_default()
    }
}

/// Webhook选择器
///
/// 收集仓库、组织和系统强制Webhook，按启用状态、事件订阅和分支过滤器筛选
#[derive(Clone)]
pub struct WebhookSelector {
    webhooks: Arc<dyn WebhookRepository>,
}

impl WebhookSelector {
    /// 创建新的选择器
    pub fn new(webhooks: Arc<dyn WebhookRepository>) -> Self {
        Self { webhooks }
    }

    /// 选择需要接收事件的Webhook
    ///
    /// # 参数
    ///
    /// * `source` - 事件来源
    /// * `event` - 事件类型
    /// * `payload` - 事件负载，用于分支过滤和空推送判断
    ///
    /// # 返回值
    ///
    /// * `Ok(Vec<Webhook>)` - 按ID去重后的目标列表
    /// * `Err(RepositoryError)` - 加载Webhook失败
    pub async fn select(
        &self,
        source: &EventSource,
        event: HookEventType,
        payload: &Payload,
    ) -> Result<Vec<Webhook>, RepositoryError> {
        let candidates = self.candidates(source).await?;

        let mut seen = HashSet::new();
        let selected = candidates
            .into_iter()
            .filter(|webhook| seen.insert(webhook.id))
            .filter(|webhook| should_deliver(webhook, event, payload))
            .collect::<Vec<_>>();

        debug!(
            event = event.as_str(),
            repo_id = source.repo_id(),
            selected = selected.len(),
            "Selected webhooks for event"
        );
        Ok(selected)
    }

    async fn candidates(&self, source: &EventSource) -> Result<Vec<Webhook>, RepositoryError> {
        let mut candidates = Vec::new();

        if let Some(repo) = source.repository {
            candidates.extend(
                self.webhooks
                    .list_by_scope(WebhookScope::Repository(repo.id), true)
                    .await?,
            );
        }

        // Only organization owners carry hooks of their own
        if let Some(owner) = source.owner.filter(|owner| owner.is_organization) {
            candidates.extend(
                self.webhooks
                    .list_by_scope(WebhookScope::Owner(owner.id), true)
                    .await?,
            );
        }

        candidates.extend(
            self.webhooks
                .list_by_scope(WebhookScope::SystemForced, true)
                .await?,
        );

        Ok(candidates)
    }
}

/// 判断单个Webhook是否应该接收事件
///
/// 依次检查启用状态、事件订阅、分支过滤器以及非原生目标的空推送
pub fn should_deliver(webhook: &Webhook, event: HookEventType, payload: &Payload) -> bool {
    if !webhook.is_active || !webhook.has_event(event) {
        return false;
    }

    if let Some(branch) = payload.branch() {
        match webhook.branch_matcher() {
            Ok(Some(matcher)) if !matcher.matches(branch) => {
                debug!(
                    webhook_id = webhook.id,
                    branch, "Branch does not match webhook filter"
                );
                return false;
            }
            Ok(_) => {}
            Err(e) => {
                warn!(
                    webhook_id = webhook.id,
                    filter = %webhook.hook_event.branch_filter,
                    "Skipping webhook with invalid branch filter: {}",
                    e
                );
                return false;
            }
        }
    }

    if event == HookEventType::Push && payload.is_empty_push() && !webhook.hook_type.is_native() {
        debug!(
            webhook_id = webhook.id,
            hook_type = %webhook.hook_type,
            "Suppressing push without commits"
        );
        return false;
    }

    true
}
