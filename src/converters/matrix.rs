// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::general::{self, html_link_formatter, markdown_link_formatter, EventText, LinkFormatter};
use super::{parse_meta, to_value, ConvertError, ConvertResult, PayloadConvertor};
use crate::domain::models::event::HookEventType;
use crate::domain::models::payload::*;
use crate::domain::models::webhook::HookType;
use serde::{Deserialize, Serialize};

/// Matrix 目标元数据
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MatrixMeta {
    pub homeserver_url: String,
    pub room_id: String,
    /// 1 为 `m.notice`，2 为 `m.text`
    pub message_type: i32,
}

impl MatrixMeta {
    fn msgtype(&self) -> &'static str {
        match self.message_type {
            2 => "m.text",
            _ => "m.notice",
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MatrixPayload {
    pub body: String,
    pub msgtype: &'static str,
    pub format: &'static str,
    pub formatted_body: String,
    #[serde(rename = "io.hookrs.commits", skip_serializing_if = "Vec::is_empty")]
    pub commits: Vec<PayloadCommit>,
}

pub struct MatrixConvertor {
    meta: MatrixMeta,
}

impl MatrixConvertor {
    pub fn new(meta: &str) -> Result<Self, ConvertError> {
        Ok(Self {
            meta: parse_meta(HookType::Matrix, meta)?,
        })
    }

    /// 同一事件分别以 Markdown 和 HTML 链接渲染一次
    fn message<F>(&self, render: F) -> ConvertResult
    where
        F: Fn(LinkFormatter) -> EventText,
    {
        let plain = render(markdown_link_formatter);
        let html = render(html_link_formatter);
        to_value(MatrixPayload {
            body: plain.text,
            msgtype: self.meta.msgtype(),
            format: "org.matrix.custom.html",
            formatted_body: html.text,
            commits: Vec::new(),
        })
    }
}

impl PayloadConvertor for MatrixConvertor {
    fn create(&self, p: &CreatePayload) -> ConvertResult {
        self.message(|lf| general::create_text(p, lf))
    }

    fn delete(&self, p: &DeletePayload) -> ConvertResult {
        self.message(|lf| general::delete_text(p, lf))
    }

    fn fork(&self, p: &ForkPayload) -> ConvertResult {
        self.message(|lf| general::fork_text(p, lf))
    }

    fn push(&self, p: &PushPayload) -> ConvertResult {
        let render = |lf: LinkFormatter, separator: &str| {
            let event = general::push_text(p, lf);
            let lines = p
                .commits
                .iter()
                .map(|commit| general::commit_line(commit, lf))
                .collect::<Vec<_>>()
                .join(separator);
            format!("{} by {}{}{}", event.text, p.pusher.login, separator, lines)
        };

        to_value(MatrixPayload {
            body: render(markdown_link_formatter, "\r\n"),
            msgtype: self.meta.msgtype(),
            format: "org.matrix.custom.html",
            formatted_body: render(html_link_formatter, "<br>"),
            commits: p.commits.clone(),
        })
    }

    fn issue(&self, p: &IssuePayload) -> ConvertResult {
        self.message(|lf| general::issue_text(p, lf, true))
    }

    fn issue_comment(&self, p: &IssueCommentPayload) -> ConvertResult {
        self.message(|lf| general::issue_comment_text(p, lf, true))
    }

    fn pull_request(&self, p: &PullRequestPayload) -> ConvertResult {
        self.message(|lf| general::pull_request_text(p, lf, true))
    }

    fn review(&self, p: &PullRequestPayload, event: HookEventType) -> ConvertResult {
        self.message(|lf| general::review_text(p, event, lf, true))
    }

    fn repository(&self, p: &RepositoryPayload) -> ConvertResult {
        self.message(|lf| general::repository_text(p, lf, true))
    }

    fn wiki(&self, p: &WikiPayload) -> ConvertResult {
        self.message(|lf| general::wiki_text(p, lf, true))
    }

    fn release(&self, p: &ReleasePayload) -> ConvertResult {
        self.message(|lf| general::release_text(p, lf, true))
    }

    fn package(&self, p: &PackagePayload) -> ConvertResult {
        self.message(|lf| general::package_text(p, lf, true))
    }

    fn status(&self, p: &CommitStatusPayload) -> ConvertResult {
        self.message(|lf| general::status_text(p, lf, true))
    }

    fn workflow_run(&self, p: &WorkflowRunPayload) -> ConvertResult {
        self.message(|lf| general::workflow_run_text(p, lf, true))
    }

    fn workflow_job(&self, p: &WorkflowJobPayload) -> ConvertResult {
        self.message(|lf| general::workflow_job_text(p, lf, true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converters::fixtures;

    #[test]
    fn test_notice_with_html_body() {
        let value = MatrixConvertor::new(r#"{"room_id":"!abc:matrix.org","message_type":1}"#)
            .unwrap()
            .repository(&fixtures::repository())
            .unwrap()
            .unwrap();

        assert_eq!(value["msgtype"], "m.notice");
        assert_eq!(value["format"], "org.matrix.custom.html");
        assert_eq!(
            value["body"],
            "[[test/repo](http://localhost:3000/test/repo)] Repository created by [user1](http://localhost:3000/user1)"
        );
        assert_eq!(
            value["formatted_body"],
            "[<a href=\"http://localhost:3000/test/repo\">test/repo</a>] Repository created by \
             <a href=\"http://localhost:3000/user1\">user1</a>"
        );
    }

    #[test]
    fn test_push_carries_commits() {
        let value = MatrixConvertor::new(r#"{"message_type":2}"#)
            .unwrap()
            .push(&fixtures::push())
            .unwrap()
            .unwrap();

        assert_eq!(value["msgtype"], "m.text");
        assert_eq!(value["io.hookrs.commits"].as_array().unwrap().len(), 2);
        assert!(value["formatted_body"].as_str().unwrap().contains("<br>"));
    }
}
