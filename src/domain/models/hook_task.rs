// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::event::HookEventType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// 投递请求记录
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookRequest {
    pub url: String,
    pub http_method: String,
    pub headers: BTreeMap<String, String>,
}

/// 投递响应记录
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookResponse {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

/// 投递任务
///
/// 一次 (webhook, 事件) 投递尝试的记录。状态机只有一步：
/// pending → attempted{succeeded|failed}，重放会创建一个新的 pending 任务。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HookTask {
    /// 任务ID，创建前为 0
    pub id: i64,
    /// 事件所属仓库ID，非仓库事件为 0
    pub repo_id: i64,
    /// 所属Webhook ID
    pub hook_id: i64,
    /// 投递唯一标识，重放时重新生成
    pub uuid: String,
    /// 序列化后的通用负载
    pub payload_content: String,
    /// 事件类型
    pub event_type: HookEventType,
    /// 是否已尝试投递
    pub is_delivered: bool,
    /// 投递完成时间（纳秒精度）
    pub delivered_at: Option<DateTime<Utc>>,
    /// 是否投递成功
    pub is_succeed: bool,
    /// 发出的请求
    pub request_info: Option<HookRequest>,
    /// 收到的响应
    pub response_info: Option<HookResponse>,
    pub created_at: DateTime<Utc>,
}

impl HookTask {
    /// 创建新的待投递任务
    ///
    /// # 参数
    ///
    /// * `hook_id` - 所属Webhook ID
    /// * `repo_id` - 事件所属仓库ID
    /// * `event_type` - 事件类型
    /// * `payload_content` - 序列化后的通用负载
    pub fn new(
        hook_id: i64,
        repo_id: i64,
        event_type: HookEventType,
        payload_content: String,
    ) -> Self {
        Self {
            id: 0,
            repo_id,
            hook_id,
            uuid: Uuid::new_v4().to_string(),
            payload_content,
            event_type,
            is_delivered: false,
            delivered_at: None,
            is_succeed: false,
            request_info: None,
            response_info: None,
            created_at: Utc::now(),
        }
    }

    /// 复制为一个新的待投递任务，用于重放
    ///
    /// 保留负载和事件类型，重新生成 UUID 并重置投递状态
    pub fn replay(&self) -> Self {
        Self::new(
            self.hook_id,
            self.repo_id,
            self.event_type,
            self.payload_content.clone(),
        )
    }

    /// 标记为已尝试投递
    pub fn mark_attempted(&mut self, succeeded: bool) {
        self.is_delivered = true;
        self.is_succeed = succeeded;
        self.delivered_at = Some(Utc::now());
    }

    /// 以错误文本标记为失败
    pub fn mark_failed_with(&mut self, error: impl Into<String>) {
        let response = self.response_info.get_or_insert_with(HookResponse::default);
        response.body = error.into();
        self.mark_attempted(false);
    }
}
