// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::general::{self, markdown_link_formatter, none_link_formatter, EventText};
use super::{to_value, ConvertResult, PayloadConvertor};
use crate::domain::models::event::HookEventType;
use crate::domain::models::payload::*;
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DingtalkActionCard {
    pub text: String,
    pub title: String,
    pub hide_avatar: &'static str,
    #[serde(rename = "singleTitle")]
    pub single_title: String,
    #[serde(rename = "singleURL")]
    pub single_url: String,
}

/// 钉钉 actionCard 消息
#[derive(Debug, Serialize)]
pub struct DingtalkPayload {
    pub msgtype: &'static str,
    #[serde(rename = "actionCard")]
    pub action_card: DingtalkActionCard,
}

pub struct DingtalkConvertor;

/// 生成 actionCard，`view` 是按钮文字中的对象名称
fn action_card(event: EventText, view: &str) -> ConvertResult {
    let text = if event.body.is_empty() {
        event.text.clone()
    } else {
        format!("{}\r\n\r\n{}", event.text, event.body)
    };
    to_value(DingtalkPayload {
        msgtype: "actionCard",
        action_card: DingtalkActionCard {
            text,
            title: event.text,
            hide_avatar: "0",
            single_title: format!("view {}", view),
            single_url: event.link,
        },
    })
}

impl PayloadConvertor for DingtalkConvertor {
    fn create(&self, p: &CreatePayload) -> ConvertResult {
        let event = general::create_text(p, none_link_formatter);
        let view = format!("ref {}", event.title);
        action_card(event, &view)
    }

    fn delete(&self, p: &DeletePayload) -> ConvertResult {
        let event = general::delete_text(p, none_link_formatter);
        let view = format!("ref {}", event.title);
        action_card(event, &view)
    }

    fn fork(&self, p: &ForkPayload) -> ConvertResult {
        action_card(general::fork_text(p, none_link_formatter), "forked repo")
    }

    fn push(&self, p: &PushPayload) -> ConvertResult {
        let mut event = general::push_text(p, none_link_formatter);
        event.body = p
            .commits
            .iter()
            .map(|commit| general::commit_line(commit, markdown_link_formatter))
            .collect::<Vec<_>>()
            .join("\r\n");
        let view = if p.commits.len() == 1 {
            "commit"
        } else {
            "commits"
        };
        action_card(event, view)
    }

    fn issue(&self, p: &IssuePayload) -> ConvertResult {
        action_card(general::issue_text(p, none_link_formatter, true), "issue")
    }

    fn issue_comment(&self, p: &IssueCommentPayload) -> ConvertResult {
        action_card(
            general::issue_comment_text(p, none_link_formatter, true),
            "issue comment",
        )
    }

    fn pull_request(&self, p: &PullRequestPayload) -> ConvertResult {
        action_card(
            general::pull_request_text(p, none_link_formatter, true),
            "pull request",
        )
    }

    fn review(&self, p: &PullRequestPayload, event: HookEventType) -> ConvertResult {
        action_card(
            general::review_text(p, event, none_link_formatter, true),
            "pull request",
        )
    }

    fn repository(&self, p: &RepositoryPayload) -> ConvertResult {
        action_card(
            general::repository_text(p, none_link_formatter, true),
            "repository",
        )
    }

    fn wiki(&self, p: &WikiPayload) -> ConvertResult {
        action_card(general::wiki_text(p, none_link_formatter, true), "wiki")
    }

    fn release(&self, p: &ReleasePayload) -> ConvertResult {
        let mut event = general::release_text(p, none_link_formatter, true);
        event.body = String::new();
        action_card(event, "release")
    }

    fn package(&self, p: &PackagePayload) -> ConvertResult {
        action_card(general::package_text(p, none_link_formatter, true), "package")
    }

    fn status(&self, p: &CommitStatusPayload) -> ConvertResult {
        action_card(general::status_text(p, none_link_formatter, true), "status")
    }

    fn workflow_run(&self, p: &WorkflowRunPayload) -> ConvertResult {
        action_card(
            general::workflow_run_text(p, none_link_formatter, true),
            "workflow run",
        )
    }

    fn workflow_job(&self, p: &WorkflowJobPayload) -> ConvertResult {
        action_card(
            general::workflow_job_text(p, none_link_formatter, true),
            "workflow job",
        )
    }
}
