// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::general::{self, none_link_formatter, EventText};
use super::{to_value, ConvertResult, PayloadConvertor};
use crate::domain::models::event::HookEventType;
use crate::domain::models::payload::*;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct FeishuContent {
    pub text: String,
}

/// 飞书文本消息
#[derive(Debug, Serialize)]
pub struct FeishuPayload {
    pub msg_type: &'static str,
    pub content: FeishuContent,
}

pub struct FeishuConvertor;

fn text_message(text: String) -> ConvertResult {
    to_value(FeishuPayload {
        msg_type: "text",
        content: FeishuContent { text },
    })
}

fn with_body(event: EventText) -> ConvertResult {
    if event.body.is_empty() {
        return text_message(event.text);
    }
    text_message(format!("{}\r\n\r\n{}", event.text, event.body))
}

impl PayloadConvertor for FeishuConvertor {
    fn create(&self, p: &CreatePayload) -> ConvertResult {
        text_message(general::create_text(p, none_link_formatter).text)
    }

    fn delete(&self, p: &DeletePayload) -> ConvertResult {
        text_message(general::delete_text(p, none_link_formatter).text)
    }

    fn fork(&self, p: &ForkPayload) -> ConvertResult {
        text_message(general::fork_text(p, none_link_formatter).text)
    }

    fn push(&self, p: &PushPayload) -> ConvertResult {
        let event = general::push_text(p, none_link_formatter);
        let lines = p
            .commits
            .iter()
            .map(|commit| {
                format!(
                    "{}: {} - {}",
                    general::short_sha(&commit.id),
                    general::first_line(&commit.message),
                    commit.author.name
                )
            })
            .collect::<Vec<_>>()
            .join("\r\n");
        text_message(format!("{}\r\n{}", event.text, lines).trim_end().to_string())
    }

    fn issue(&self, p: &IssuePayload) -> ConvertResult {
        with_body(general::issue_text(p, none_link_formatter, true))
    }

    fn issue_comment(&self, p: &IssueCommentPayload) -> ConvertResult {
        with_body(general::issue_comment_text(p, none_link_formatter, true))
    }

    fn pull_request(&self, p: &PullRequestPayload) -> ConvertResult {
        with_body(general::pull_request_text(p, none_link_formatter, true))
    }

    fn review(&self, p: &PullRequestPayload, event: HookEventType) -> ConvertResult {
        with_body(general::review_text(p, event, none_link_formatter, true))
    }

    fn repository(&self, p: &RepositoryPayload) -> ConvertResult {
        text_message(general::repository_text(p, none_link_formatter, true).text)
    }

    fn wiki(&self, p: &WikiPayload) -> ConvertResult {
        text_message(general::wiki_text(p, none_link_formatter, true).text)
    }

    fn release(&self, p: &ReleasePayload) -> ConvertResult {
        text_message(general::release_text(p, none_link_formatter, true).text)
    }

    fn package(&self, p: &PackagePayload) -> ConvertResult {
        text_message(general::package_text(p, none_link_formatter, true).text)
    }

    fn status(&self, p: &CommitStatusPayload) -> ConvertResult {
        text_message(general::status_text(p, none_link_formatter, true).text)
    }

    fn workflow_run(&self, p: &WorkflowRunPayload) -> ConvertResult {
        text_message(general::workflow_run_text(p, none_link_formatter, true).text)
    }

    fn workflow_job(&self, p: &WorkflowJobPayload) -> ConvertResult {
        text_message(general::workflow_job_text(p, none_link_formatter, true).text)
    }
}
