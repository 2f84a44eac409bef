// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 负载转换器注册表
//!
//! 每种目标类型实现 [`PayloadConvertor`]，把通用负载转换为目标自己的格式。
//! 原生目标（gitea、gogs）直接转发通用负载，自定义脚本目标使用模板渲染。

pub mod bark;
pub mod custom;
pub mod dingtalk;
pub mod discord;
pub mod feishu;
pub mod general;
pub mod matrix;
pub mod msteams;
pub mod packagist;
pub mod slack;
pub mod telegram;
pub mod wechatwork;

use crate::domain::models::event::HookEventType;
use crate::domain::models::payload::{
    CommitStatusPayload, CreatePayload, DeletePayload, ForkPayload, IssueCommentPayload,
    IssuePayload, PackagePayload, Payload, PullRequestPayload, PushPayload, ReleasePayload,
    RepositoryPayload, WikiPayload, WorkflowJobPayload, WorkflowRunPayload,
};
use crate::domain::models::webhook::HookType;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// 转换错误
#[derive(Error, Debug)]
pub enum ConvertError {
    /// 目标元数据不是合法JSON
    #[error("Invalid {hook_type} meta: {source}")]
    InvalidMeta {
        hook_type: HookType,
        #[source]
        source: serde_json::Error,
    },
    /// 通用负载无法解析或目标负载无法序列化
    #[error("Invalid payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),
    /// 模板渲染失败
    #[error("Template error: {0}")]
    Template(String),
}

/// 转换结果：`None` 表示该目标对此事件没有需要发送的内容
pub type ConvertResult = Result<Option<Value>, ConvertError>;

/// 负载转换器特质
///
/// 每个粗粒度事件一个方法，默认实现返回 `Ok(None)`
pub trait PayloadConvertor {
    fn create(&self, _p: &CreatePayload) -> ConvertResult {
        Ok(None)
    }
    fn delete(&self, _p: &DeletePayload) -> ConvertResult {
        Ok(None)
    }
    fn fork(&self, _p: &ForkPayload) -> ConvertResult {
        Ok(None)
    }
    fn push(&self, _p: &PushPayload) -> ConvertResult {
        Ok(None)
    }
    fn issue(&self, _p: &IssuePayload) -> ConvertResult {
        Ok(None)
    }
    fn issue_comment(&self, _p: &IssueCommentPayload) -> ConvertResult {
        Ok(None)
    }
    fn pull_request(&self, _p: &PullRequestPayload) -> ConvertResult {
        Ok(None)
    }
    fn review(&self, _p: &PullRequestPayload, _event: HookEventType) -> ConvertResult {
        Ok(None)
    }
    fn repository(&self, _p: &RepositoryPayload) -> ConvertResult {
        Ok(None)
    }
    fn wiki(&self, _p: &WikiPayload) -> ConvertResult {
        Ok(None)
    }
    fn release(&self, _p: &ReleasePayload) -> ConvertResult {
        Ok(None)
    }
    fn package(&self, _p: &PackagePayload) -> ConvertResult {
        Ok(None)
    }
    fn status(&self, _p: &CommitStatusPayload) -> ConvertResult {
        Ok(None)
    }
    fn workflow_run(&self, _p: &WorkflowRunPayload) -> ConvertResult {
        Ok(None)
    }
    fn workflow_job(&self, _p: &WorkflowJobPayload) -> ConvertResult {
        Ok(None)
    }
}

/// 按事件类型调用转换器对应的方法
pub fn dispatch(
    convertor: &dyn PayloadConvertor,
    event: HookEventType,
    payload: &Payload,
) -> ConvertResult {
    match payload {
        Payload::Create(p) => convertor.create(p),
        Payload::Delete(p) => convertor.delete(p),
        Payload::Fork(p) => convertor.fork(p),
        Payload::Push(p) => convertor.push(p),
        Payload::Issue(p) => convertor.issue(p),
        Payload::IssueComment(p) => convertor.issue_comment(p),
        Payload::PullRequest(p) if event.is_review() => convertor.review(p, event),
        Payload::PullRequest(p) => convertor.pull_request(p),
        Payload::Repository(p) => convertor.repository(p),
        Payload::Wiki(p) => convertor.wiki(p),
        Payload::Release(p) => convertor.release(p),
        Payload::Package(p) => convertor.package(p),
        Payload::Status(p) => convertor.status(p),
        Payload::WorkflowRun(p) => convertor.workflow_run(p),
        Payload::WorkflowJob(p) => convertor.workflow_job(p),
    }
}

/// 把通用负载转换为目标请求体
///
/// # 参数
///
/// * `hook_type` - 目标类型
/// * `meta` - 目标元数据（JSON文本，可为空）
/// * `event` - 事件类型
/// * `payload_content` - 任务中保存的通用负载JSON
///
/// # 返回值
///
/// * `Ok(Some(String))` - 请求体
/// * `Ok(None)` - 目标对此事件没有需要发送的内容
/// * `Err(ConvertError)` - 元数据或负载有误
pub fn convert(
    hook_type: HookType,
    meta: &str,
    event: HookEventType,
    payload_content: &str,
) -> Result<Option<String>, ConvertError> {
    let convertor: Box<dyn PayloadConvertor> = match hook_type {
        HookType::Gitea | HookType::Gogs => return Ok(Some(payload_content.to_string())),
        HookType::CustomScript => return custom::render(meta, payload_content).map(Some),
        HookType::Slack => Box::new(slack::SlackConvertor::new(meta)?),
        HookType::Discord => Box::new(discord::DiscordConvertor::new(meta)?),
        HookType::Telegram => Box::new(telegram::TelegramConvertor::new(meta)?),
        HookType::Matrix => Box::new(matrix::MatrixConvertor::new(meta)?),
        HookType::MsTeams => Box::new(msteams::MsTeamsConvertor),
        HookType::Feishu => Box::new(feishu::FeishuConvertor),
        HookType::Dingtalk => Box::new(dingtalk::DingtalkConvertor),
        HookType::WechatWork => Box::new(wechatwork::WechatWorkConvertor),
        HookType::Bark => Box::new(bark::BarkConvertor::new(meta)?),
        HookType::Packagist => Box::new(packagist::PackagistConvertor::new(meta)?),
    };

    let payload = Payload::from_json(event, payload_content)?;
    dispatch(convertor.as_ref(), event, &payload)?
        .map(|value| serde_json::to_string(&value))
        .transpose()
        .map_err(ConvertError::from)
}

/// 解析目标元数据，空文本使用默认值
pub(crate) fn parse_meta<T: DeserializeOwned + Default>(
    hook_type: HookType,
    meta: &str,
) -> Result<T, ConvertError> {
    if meta.trim().is_empty() {
        return Ok(T::default());
    }
    serde_json::from_str(meta).map_err(|source| ConvertError::InvalidMeta { hook_type, source })
}

/// 序列化目标负载
pub(crate) fn to_value<T: Serialize>(payload: T) -> ConvertResult {
    Ok(Some(serde_json::to_value(payload)?))
}
