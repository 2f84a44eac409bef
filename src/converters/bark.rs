// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::general::{self, none_link_formatter, EventText};
use super::{parse_meta, to_value, ConvertError, ConvertResult, PayloadConvertor};
use crate::domain::models::event::HookEventType;
use crate::domain::models::payload::*;
use crate::domain::models::webhook::HookType;
use serde::{Deserialize, Serialize};

/// 推送通知正文的最大字符数
const BODY_LIMIT: usize = 256;

/// Bark 目标元数据
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BarkMeta {
    pub sound: String,
    pub group: String,
}

#[derive(Debug, Serialize)]
pub struct BarkPayload {
    pub title: String,
    pub body: String,
    pub url: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub group: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub sound: String,
}

pub struct BarkConvertor {
    meta: BarkMeta,
}

impl BarkConvertor {
    pub fn new(meta: &str) -> Result<Self, ConvertError> {
        Ok(Self {
            meta: parse_meta(HookType::Bark, meta)?,
        })
    }

    /// 标题为仓库名，没有正文时使用事件摘要
    fn notify(&self, title: &str, event: EventText) -> ConvertResult {
        let body = if event.body.is_empty() {
            event.text
        } else {
            format!("{}\n{}", event.text, event.body)
        };
        to_value(BarkPayload {
            title: title.to_string(),
            body: general::truncate(&body, BODY_LIMIT),
            url: event.link,
            group: self.meta.group.clone(),
            sound: self.meta.sound.clone(),
        })
    }
}

impl PayloadConvertor for BarkConvertor {
    fn create(&self, p: &CreatePayload) -> ConvertResult {
        self.notify(
            &p.repository.full_name,
            general::create_text(p, none_link_formatter),
        )
    }

    fn delete(&self, p: &DeletePayload) -> ConvertResult {
        self.notify(
            &p.repository.full_name,
            general::delete_text(p, none_link_formatter),
        )
    }

    fn fork(&self, p: &ForkPayload) -> ConvertResult {
        self.notify(
            &p.repository.full_name,
            general::fork_text(p, none_link_formatter),
        )
    }

    fn push(&self, p: &PushPayload) -> ConvertResult {
        self.notify(
            &p.repository.full_name,
            general::push_text(p, none_link_formatter),
        )
    }

    fn issue(&self, p: &IssuePayload) -> ConvertResult {
        self.notify(
            &p.repository.full_name,
            general::issue_text(p, none_link_formatter, true),
        )
    }

    fn issue_comment(&self, p: &IssueCommentPayload) -> ConvertResult {
        self.notify(
            &p.repository.full_name,
            general::issue_comment_text(p, none_link_formatter, true),
        )
    }

    fn pull_request(&self, p: &PullRequestPayload) -> ConvertResult {
        self.notify(
            &p.repository.full_name,
            general::pull_request_text(p, none_link_formatter, true),
        )
    }

    fn review(&self, p: &PullRequestPayload, event: HookEventType) -> ConvertResult {
        self.notify(
            &p.repository.full_name,
            general::review_text(p, event, none_link_formatter, true),
        )
    }

    fn repository(&self, p: &RepositoryPayload) -> ConvertResult {
        self.notify(
            &p.repository.full_name,
            general::repository_text(p, none_link_formatter, true),
        )
    }

    fn wiki(&self, p: &WikiPayload) -> ConvertResult {
        self.notify(
            &p.repository.full_name,
            general::wiki_text(p, none_link_formatter, true),
        )
    }

    fn release(&self, p: &ReleasePayload) -> ConvertResult {
        self.notify(
            &p.repository.full_name,
            general::release_text(p, none_link_formatter, true),
        )
    }

    fn package(&self, p: &PackagePayload) -> ConvertResult {
        self.notify(
            &p.package.owner.login,
            general::package_text(p, none_link_formatter, true),
        )
    }

    fn status(&self, p: &CommitStatusPayload) -> ConvertResult {
        self.notify(
            &p.repository.full_name,
            general::status_text(p, none_link_formatter, true),
        )
    }

    fn workflow_run(&self, p: &WorkflowRunPayload) -> ConvertResult {
        self.notify(
            &p.repository.full_name,
            general::workflow_run_text(p, none_link_formatter, true),
        )
    }

    fn workflow_job(&self, p: &WorkflowJobPayload) -> ConvertResult {
        self.notify(
            &p.repository.full_name,
            general::workflow_job_text(p, none_link_formatter, true),
        )
    }
}
