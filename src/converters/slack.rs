// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::general::{self, slack_link_formatter, slack_text_formatter, EventText};
use super::{parse_meta, to_value, ConvertError, ConvertResult, PayloadConvertor};
use crate::domain::models::event::HookEventType;
use crate::domain::models::payload::*;
use crate::domain::models::webhook::HookType;
use serde::{Deserialize, Serialize};

/// Slack 目标元数据
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SlackMeta {
    pub channel: String,
    pub username: String,
    pub icon_url: String,
    pub color: String,
}

#[derive(Debug, Serialize)]
pub struct SlackPayload {
    pub channel: String,
    pub text: String,
    pub username: String,
    pub icon_url: String,
    pub unfurl_links: i32,
    pub link_names: i32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<SlackAttachment>,
}

#[derive(Debug, Serialize)]
pub struct SlackAttachment {
    pub fallback: String,
    pub color: String,
    pub title: String,
    pub title_link: String,
    pub text: String,
}

pub struct SlackConvertor {
    meta: SlackMeta,
}

impl SlackConvertor {
    pub fn new(meta: &str) -> Result<Self, ConvertError> {
        Ok(Self {
            meta: parse_meta(HookType::Slack, meta)?,
        })
    }

    fn payload(&self, text: String, attachments: Vec<SlackAttachment>) -> ConvertResult {
        to_value(SlackPayload {
            channel: self.meta.channel.clone(),
            text,
            username: self.meta.username.clone(),
            icon_url: self.meta.icon_url.clone(),
            unfurl_links: 0,
            link_names: 0,
            attachments,
        })
    }

    fn attachment(&self, title: &str, title_link: &str, text: &str) -> SlackAttachment {
        SlackAttachment {
            fallback: String::new(),
            color: self.meta.color.clone(),
            title: slack_text_formatter(title),
            title_link: title_link.to_string(),
            text: slack_text_formatter(text),
        }
    }

    /// 摘要加一个可选的正文附件
    fn with_body(&self, event: EventText) -> ConvertResult {
        let attachments = if event.body.is_empty() {
            Vec::new()
        } else {
            vec![self.attachment(&event.title, &event.link, &event.body)]
        };
        self.payload(event.text, attachments)
    }
}

impl PayloadConvertor for SlackConvertor {
    fn create(&self, p: &CreatePayload) -> ConvertResult {
        let text = general::create_text(p, slack_link_formatter).text;
        self.payload(format!("{} by {}", text, p.sender.login), Vec::new())
    }

    fn delete(&self, p: &DeletePayload) -> ConvertResult {
        let text = general::delete_text(p, slack_link_formatter).text;
        self.payload(format!("{} by {}", text, p.sender.login), Vec::new())
    }

    fn fork(&self, p: &ForkPayload) -> ConvertResult {
        self.payload(general::fork_text(p, slack_link_formatter).text, Vec::new())
    }

    fn push(&self, p: &PushPayload) -> ConvertResult {
        if p.commits.is_empty() {
            return Ok(None);
        }
        let event = general::push_text(p, slack_link_formatter);
        let text = format!("{} pushed by {}", event.text, p.pusher.login);

        let lines = p
            .commits
            .iter()
            .map(|commit| {
                format!(
                    "{}: {} - {}",
                    slack_link_formatter(&commit.url, general::short_sha(&commit.id)),
                    slack_text_formatter(general::first_line(&commit.message)),
                    slack_text_formatter(&commit.author.name)
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        let attachment = SlackAttachment {
            fallback: String::new(),
            color: self.meta.color.clone(),
            title: p.repository.html_url.clone(),
            title_link: p.repository.html_url.clone(),
            text: lines,
        };
        self.payload(text, vec![attachment])
    }

    fn issue(&self, p: &IssuePayload) -> ConvertResult {
        self.with_body(general::issue_text(p, slack_link_formatter, true))
    }

    fn issue_comment(&self, p: &IssueCommentPayload) -> ConvertResult {
        let event = general::issue_comment_text(p, slack_link_formatter, true);
        let attachment = self.attachment(&event.title, &event.link, &event.body);
        self.payload(event.text, vec![attachment])
    }

    fn pull_request(&self, p: &PullRequestPayload) -> ConvertResult {
        self.with_body(general::pull_request_text(p, slack_link_formatter, true))
    }

    fn review(&self, p: &PullRequestPayload, event: HookEventType) -> ConvertResult {
        self.with_body(general::review_text(p, event, slack_link_formatter, true))
    }

    fn repository(&self, p: &RepositoryPayload) -> ConvertResult {
        self.payload(
            general::repository_text(p, slack_link_formatter, true).text,
            Vec::new(),
        )
    }

    fn wiki(&self, p: &WikiPayload) -> ConvertResult {
        self.payload(
            general::wiki_text(p, slack_link_formatter, true).text,
            Vec::new(),
        )
    }

    fn release(&self, p: &ReleasePayload) -> ConvertResult {
        self.payload(
            general::release_text(p, slack_link_formatter, true).text,
            Vec::new(),
        )
    }

    fn package(&self, p: &PackagePayload) -> ConvertResult {
        self.payload(
            general::package_text(p, slack_link_formatter, true).text,
            Vec::new(),
        )
    }

    fn status(&self, p: &CommitStatusPayload) -> ConvertResult {
        self.payload(
            general::status_text(p, slack_link_formatter, true).text,
            Vec::new(),
        )
    }

    fn workflow_run(&self, p: &WorkflowRunPayload) -> ConvertResult {
        self.payload(
            general::workflow_run_text(p, slack_link_formatter, true).text,
            Vec::new(),
        )
    }

    fn workflow_job(&self, p: &WorkflowJobPayload) -> ConvertResult {
        self.payload(
            general::workflow_job_text(p, slack_link_formatter, true).text,
            Vec::new(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converters::fixtures;

    fn convertor() -> SlackConvertor {
        SlackConvertor::new(r##"{"channel":"#dev","username":"bot","color":"good"}"##).unwrap()
    }

    #[test]
    fn test_push_payload() {
        let value = convertor().push(&fixtures::push()).unwrap().unwrap();
        assert_eq!(value["channel"], "#dev");
        assert_eq!(
            value["text"],
            "[<http://localhost:3000/test/repo|test/repo>:<http://localhost:3000/test/repo/src/branch/test|test>] \
             <http://localhost:3000/test/repo/compare/2020558...2020558|2 new commits> pushed by user1"
        );
        let text = value["attachments"][0]["text"].as_str().unwrap();
        assert!(text.starts_with(
            "<http://localhost:3000/test/repo/commit/2020558fe2e34debb818a514715839cabd25e778|2020558>: commit message - user1"
        ));
    }

    #[test]
    fn test_push_without_commits_sends_nothing() {
        let mut push = fixtures::push();
        push.commits.clear();
        assert!(convertor().push(&push).unwrap().is_none());
    }

    #[test]
    fn test_issue_body_is_escaped() {
        let mut issue = fixtures::issue();
        issue.issue.body = "a < b & c".to_string();
        let value = convertor().issue(&issue).unwrap().unwrap();
        assert_eq!(value["attachments"][0]["text"], "a &lt; b &amp; c");
        assert_eq!(value["attachments"][0]["color"], "good");
    }

    #[test]
    fn test_closed_issue_has_no_attachment() {
        let mut issue = fixtures::issue();
        issue.action = HookIssueAction::Closed;
        let value = convertor().issue(&issue).unwrap().unwrap();
        assert!(value.get("attachments").is_none());
        assert!(value["text"]
            .as_str()
            .unwrap()
            .contains("Issue closed"));
    }
}
