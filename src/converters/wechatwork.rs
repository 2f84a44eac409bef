// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::general::{self, markdown_link_formatter, EventText};
use super::{to_value, ConvertResult, PayloadConvertor};
use crate::domain::models::event::HookEventType;
use crate::domain::models::payload::*;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct WechatWorkMarkdown {
    pub content: String,
}

/// 企业微信 markdown 消息
#[derive(Debug, Serialize)]
pub struct WechatWorkPayload {
    pub msgtype: &'static str,
    pub markdown: WechatWorkMarkdown,
}

pub struct WechatWorkConvertor;

fn markdown(content: String) -> ConvertResult {
    to_value(WechatWorkPayload {
        msgtype: "markdown",
        markdown: WechatWorkMarkdown { content },
    })
}

/// 标题行加引用块形式的正文
fn with_quote(event: EventText) -> ConvertResult {
    if event.body.is_empty() {
        return markdown(format!("# {}", event.text));
    }
    let quoted = event
        .body
        .lines()
        .map(|line| format!("> {}", line))
        .collect::<Vec<_>>()
        .join("\r\n");
    markdown(format!("# {}\r\n\r\n{}", event.text, quoted))
}

impl PayloadConvertor for WechatWorkConvertor {
    fn create(&self, p: &CreatePayload) -> ConvertResult {
        with_quote(general::create_text(p, markdown_link_formatter))
    }

    fn delete(&self, p: &DeletePayload) -> ConvertResult {
        with_quote(general::delete_text(p, markdown_link_formatter))
    }

    fn fork(&self, p: &ForkPayload) -> ConvertResult {
        with_quote(general::fork_text(p, markdown_link_formatter))
    }

    fn push(&self, p: &PushPayload) -> ConvertResult {
        let event = general::push_text(p, markdown_link_formatter);
        let lines = p
            .commits
            .iter()
            .map(|commit| general::commit_line(commit, markdown_link_formatter))
            .collect::<Vec<_>>()
            .join("\r\n");
        markdown(
            format!("# {}\r\n{}", event.text, lines)
                .trim_end()
                .to_string(),
        )
    }

    fn issue(&self, p: &IssuePayload) -> ConvertResult {
        with_quote(general::issue_text(p, markdown_link_formatter, true))
    }

    fn issue_comment(&self, p: &IssueCommentPayload) -> ConvertResult {
        with_quote(general::issue_comment_text(p, markdown_link_formatter, true))
    }

    fn pull_request(&self, p: &PullRequestPayload) -> ConvertResult {
        with_quote(general::pull_request_text(p, markdown_link_formatter, true))
    }

    fn review(&self, p: &PullRequestPayload, event: HookEventType) -> ConvertResult {
        with_quote(general::review_text(p, event, markdown_link_formatter, true))
    }

    fn repository(&self, p: &RepositoryPayload) -> ConvertResult {
        with_quote(general::repository_text(p, markdown_link_formatter, true))
    }

    fn wiki(&self, p: &WikiPayload) -> ConvertResult {
        with_quote(general::wiki_text(p, markdown_link_formatter, true))
    }

    fn release(&self, p: &ReleasePayload) -> ConvertResult {
        with_quote(general::release_text(p, markdown_link_formatter, true))
    }

    fn package(&self, p: &PackagePayload) -> ConvertResult {
        with_quote(general::package_text(p, markdown_link_formatter, true))
    }

    fn status(&self, p: &CommitStatusPayload) -> ConvertResult {
        with_quote(general::status_text(p, markdown_link_formatter, true))
    }

    fn workflow_run(&self, p: &WorkflowRunPayload) -> ConvertResult {
        with_quote(general::workflow_run_text(p, markdown_link_formatter, true))
    }

    fn workflow_job(&self, p: &WorkflowJobPayload) -> ConvertResult {
        with_quote(general::workflow_job_text(p, markdown_link_formatter, true))
    }
}
