// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::event::HookEventType;
use crate::utils::glob::{GlobError, GlobSet};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Webhook配置校验错误
#[derive(Error, Debug)]
pub enum WebhookValidationError {
    /// 作用域冲突
    #[error("Invalid webhook scope: repo_id={repo_id}, owner_id={owner_id}, system={is_system}")]
    InvalidScope {
        repo_id: i64,
        owner_id: i64,
        is_system: bool,
    },
    /// 分支过滤器语法错误
    #[error("Invalid branch filter: {0}")]
    InvalidBranchFilter(#[from] GlobError),
    /// 目标URL无效
    #[error("Invalid target url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// 未知目标类型
    #[error("Unknown hook type: {0}")]
    UnknownHookType(String),
    /// 未知内容类型
    #[error("Unknown content type: {0}")]
    UnknownContentType(i32),
    /// 事件配置无法解析
    #[error("Invalid events: {0}")]
    InvalidEvents(#[from] serde_json::Error),
}

/// Webhook作用域
///
/// 一个Webhook只能属于其中一种作用域
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WebhookScope {
    /// 仓库级
    Repository(i64),
    /// 用户或组织级
    Owner(i64),
    /// 系统默认模板，在新仓库创建时被复制，不会直接触发
    SystemDefault,
    /// 系统强制，所有仓库的事件都会触发
    SystemForced,
}

impl WebhookScope {
    /// 从持久化列恢复作用域
    ///
    /// # 参数
    ///
    /// * `repo_id` - 仓库ID，0 表示无
    /// * `owner_id` - 所有者ID，0 表示无
    /// * `is_system` - 是否为系统强制Webhook
    pub fn from_columns(
        repo_id: i64,
        owner_id: i64,
        is_system: bool,
    ) -> Result<Self, WebhookValidationError> {
        match (repo_id, owner_id, is_system) {
            (r, 0, false) if r > 0 => Ok(WebhookScope::Repository(r)),
            (0, o, false) if o > 0 => Ok(WebhookScope::Owner(o)),
            (0, 0, false) => Ok(WebhookScope::SystemDefault),
            (0, 0, true) => Ok(WebhookScope::SystemForced),
            _ => Err(WebhookValidationError::InvalidScope {
                repo_id,
                owner_id,
                is_system,
            }),
        }
    }

    /// 转换为持久化列 `(repo_id, owner_id, is_system_webhook)`
    pub fn to_columns(&self) -> (i64, i64, bool) {
        match self {
            WebhookScope::Repository(id) => (*id, 0, false),
            WebhookScope::Owner(id) => (0, *id, false),
            WebhookScope::SystemDefault => (0, 0, false),
            WebhookScope::SystemForced => (0, 0, true),
        }
    }
}

/// 内容类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HookContentType {
    Json = 1,
    Form = 2,
}

impl HookContentType {
    pub fn from_i32(value: i32) -> Result<Self, WebhookValidationError> {
        match value {
            1 => Ok(HookContentType::Json),
            2 => Ok(HookContentType::Form),
            other => Err(WebhookValidationError::UnknownContentType(other)),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            HookContentType::Json => "json",
            HookContentType::Form => "form",
        }
    }
}

/// 最近一次投递状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HookStatus {
    #[default]
    None = 0,
    Succeed = 1,
    Fail = 2,
}

impl From<i32> for HookStatus {
    fn from(value: i32) -> Self {
        match value {
            1 => HookStatus::Succeed,
            2 => HookStatus::Fail,
            _ => HookStatus::None,
        }
    }
}

/// 目标类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HookType {
    Gitea,
    Gogs,
    Slack,
    Discord,
    Dingtalk,
    Telegram,
    MsTeams,
    Feishu,
    Matrix,
    WechatWork,
    Packagist,
    Bark,
    CustomScript,
}

impl HookType {
    pub fn as_str(&self) -> &'static str {
        match self {
            HookType::Gitea => "gitea",
            HookType::Gogs => "gogs",
            HookType::Slack => "slack",
            HookType::Discord => "discord",
            HookType::Dingtalk => "dingtalk",
            HookType::Telegram => "telegram",
            HookType::MsTeams => "msteams",
            HookType::Feishu => "feishu",
            HookType::Matrix => "matrix",
            HookType::WechatWork => "wechatwork",
            HookType::Packagist => "packagist",
            HookType::Bark => "bark",
            HookType::CustomScript => "custom-script",
        }
    }

    /// 是否为原生格式目标
    ///
    /// 原生目标直接接收通用负载，不经过转换器
    pub fn is_native(&self) -> bool {
        matches!(
            self,
            HookType::Gitea | HookType::Gogs | HookType::CustomScript
        )
    }
}

impl fmt::Display for HookType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HookType {
    type Err = WebhookValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s {
            "gitea" => HookType::Gitea,
            "gogs" => HookType::Gogs,
            "slack" => HookType::Slack,
            "discord" => HookType::Discord,
            "dingtalk" => HookType::Dingtalk,
            "telegram" => HookType::Telegram,
            "msteams" => HookType::MsTeams,
            "feishu" => HookType::Feishu,
            "matrix" => HookType::Matrix,
            "wechatwork" => HookType::WechatWork,
            "packagist" => HookType::Packagist,
            "bark" => HookType::Bark,
            "custom-script" => HookType::CustomScript,
            other => return Err(WebhookValidationError::UnknownHookType(other.to_string())),
        };
        Ok(kind)
    }
}

/// 细粒度事件订阅开关
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HookEvents {
    pub create: bool,
    pub delete: bool,
    pub fork: bool,
    pub issues: bool,
    pub issue_assign: bool,
    pub issue_label: bool,
    pub issue_milestone: bool,
    pub issue_comment: bool,
    pub push: bool,
    pub pull_request: bool,
    pub pull_request_assign: bool,
    pub pull_request_label: bool,
    pub pull_request_milestone: bool,
    pub pull_request_comment: bool,
    pub pull_request_review: bool,
    pub pull_request_sync: bool,
    pub pull_request_review_request: bool,
    pub wiki: bool,
    pub repository: bool,
    pub release: bool,
    pub package: bool,
    pub status: bool,
    pub workflow_run: bool,
    pub workflow_job: bool,
}

/// 事件订阅配置
///
/// 持久化为单个JSON文本列，三种粗粒度模式：仅推送、全部事件、自选事件
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HookEvent {
    pub push_only: bool,
    pub send_everything: bool,
    pub choose_events: bool,
    pub branch_filter: String,
    pub events: HookEvents,
}

impl HookEvent {
    /// 仅订阅推送事件
    pub fn push_only() -> Self {
        Self {
            push_only: true,
            ..Default::default()
        }
    }

    /// 订阅所有事件
    pub fn everything() -> Self {
        Self {
            send_everything: true,
            ..Default::default()
        }
    }

    /// 订阅指定事件
    pub fn choose(events: HookEvents) -> Self {
        Self {
            choose_events: true,
            events,
            ..Default::default()
        }
    }

    /// 设置分支过滤器
    pub fn with_branch_filter(mut self, filter: impl Into<String>) -> Self {
        self.branch_filter = filter.into();
        self
    }

    /// 从持久化文本恢复
    pub fn from_json(raw: &str) -> Result<Self, WebhookValidationError> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(raw)?)
    }

    /// 序列化为持久化文本
    pub fn to_json(&self) -> Result<String, WebhookValidationError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Webhook实体
///
/// 表示一个订阅配置：目标地址、事件过滤器以及目标格式
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Webhook {
    /// Webhook唯一标识符，创建前为 0
    pub id: i64,
    /// 作用域
    pub scope: WebhookScope,
    /// 目标URL
    pub url: String,
    /// HTTP方法，POST / GET / PUT
    pub http_method: String,
    /// 内容类型
    pub content_type: HookContentType,
    /// 共享密钥，为空时不签名
    pub secret: String,
    /// 事件订阅配置
    pub hook_event: HookEvent,
    /// 是否启用
    pub is_active: bool,
    /// 目标类型
    pub hook_type: HookType,
    /// 目标相关的元数据（JSON文本）
    pub meta: String,
    /// 最近一次投递状态
    pub last_status: HookStatus,
    /// 可选的静态 Authorization 请求头
    pub authorization_header: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Webhook {
    /// 创建一个新的Webhook配置
    ///
    /// # 参数
    ///
    /// * `scope` - 作用域
    /// * `hook_type` - 目标类型
    /// * `url` - 目标URL
    /// * `hook_event` - 事件订阅配置
    ///
    /// # 返回值
    ///
    /// 返回启用状态、POST + JSON 的Webhook，ID 在持久化后分配
    pub fn new(scope: WebhookScope, hook_type: HookType, url: String, hook_event: HookEvent) -> Self {
        let http_method = match hook_type {
            HookType::Matrix => "PUT",
            _ => "POST",
        };
        Self {
            id: 0,
            scope,
            url,
            http_method: http_method.to_string(),
            content_type: HookContentType::Json,
            secret: String::new(),
            hook_event,
            is_active: true,
            hook_type,
            meta: String::new(),
            last_status: HookStatus::None,
            authorization_header: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    /// 校验会影响投递的配置项：目标URL和分支过滤器语法
    pub fn validate(&self) -> Result<(), WebhookValidationError> {
        url::Url::parse(&self.url)?;
        self.branch_matcher()?;
        Ok(())
    }

    /// 编译分支过滤器
    ///
    /// 空字符串或 `*` 表示匹配所有分支，返回 `None`
    pub fn branch_matcher(&self) -> Result<Option<GlobSet>, GlobError> {
        let filter = self.hook_event.branch_filter.trim();
        if filter.is_empty() || filter == "*" {
            return Ok(None);
        }
        GlobSet::compile(filter).map(Some)
    }

    /// 判断是否订阅了某个事件
    pub fn has_event(&self, event: HookEventType) -> bool {
        let hook_event = &self.hook_event;
        if hook_event.send_everything {
            return true;
        }
        if hook_event.push_only && event == HookEventType::Push {
            return true;
        }
        hook_event.choose_events && event.is_flagged(&hook_event.events)
    }

    /// 返回所有已订阅的事件类型
    pub fn subscribed_events(&self) -> Vec<HookEventType> {
        HookEventType::ALL
            .iter()
            .copied()
            .filter(|event| self.has_event(*event))
            .collect()
    }
}
