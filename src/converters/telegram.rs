// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::general::{self, html_link_formatter, EventText};
use super::{parse_meta, to_value, ConvertError, ConvertResult, PayloadConvertor};
use crate::domain::models::event::HookEventType;
use crate::domain::models::payload::*;
use crate::domain::models::webhook::HookType;
use serde::{Deserialize, Serialize};

/// Telegram 目标元数据
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TelegramMeta {
    pub bot_token: String,
    pub chat_id: String,
    pub thread_id: String,
}

#[derive(Debug, Serialize)]
pub struct TelegramPayload {
    #[serde(rename = "text")]
    pub message: String,
    pub parse_mode: &'static str,
    pub disable_web_page_preview: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_thread_id: Option<String>,
}

pub struct TelegramConvertor {
    meta: TelegramMeta,
}

impl TelegramConvertor {
    pub fn new(meta: &str) -> Result<Self, ConvertError> {
        Ok(Self {
            meta: parse_meta(HookType::Telegram, meta)?,
        })
    }

    fn message(&self, message: String) -> ConvertResult {
        let thread_id = Some(self.meta.thread_id.trim())
            .filter(|id| !id.is_empty())
            .map(str::to_string);
        to_value(TelegramPayload {
            message: message.trim().to_string(),
            parse_mode: "HTML",
            disable_web_page_preview: true,
            message_thread_id: thread_id,
        })
    }

    fn text_with_body(&self, event: EventText) -> ConvertResult {
        if event.body.is_empty() {
            return self.message(event.text);
        }
        self.message(format!(
            "{}\n\n{}",
            event.text,
            html_escape::encode_text(&event.body)
        ))
    }
}

impl PayloadConvertor for TelegramConvertor {
    fn create(&self, p: &CreatePayload) -> ConvertResult {
        self.message(general::create_text(p, html_link_formatter).text)
    }

    fn delete(&self, p: &DeletePayload) -> ConvertResult {
        self.message(general::delete_text(p, html_link_formatter).text)
    }

    fn fork(&self, p: &ForkPayload) -> ConvertResult {
        self.message(general::fork_text(p, html_link_formatter).text)
    }

    fn push(&self, p: &PushPayload) -> ConvertResult {
        let event = general::push_text(p, html_link_formatter);
        self.message(format!("{}\n{}", event.text, event.body))
    }

    fn issue(&self, p: &IssuePayload) -> ConvertResult {
        self.text_with_body(general::issue_text(p, html_link_formatter, true))
    }

    fn issue_comment(&self, p: &IssueCommentPayload) -> ConvertResult {
        self.text_with_body(general::issue_comment_text(p, html_link_formatter, true))
    }

    fn pull_request(&self, p: &PullRequestPayload) -> ConvertResult {
        self.text_with_body(general::pull_request_text(p, html_link_formatter, true))
    }

    fn review(&self, p: &PullRequestPayload, event: HookEventType) -> ConvertResult {
        self.text_with_body(general::review_text(p, event, html_link_formatter, true))
    }

    fn repository(&self, p: &RepositoryPayload) -> ConvertResult {
        self.message(general::repository_text(p, html_link_formatter, true).text)
    }

    fn wiki(&self, p: &WikiPayload) -> ConvertResult {
        self.message(general::wiki_text(p, html_link_formatter, true).text)
    }

    fn release(&self, p: &ReleasePayload) -> ConvertResult {
        self.message(general::release_text(p, html_link_formatter, true).text)
    }

    fn package(&self, p: &PackagePayload) -> ConvertResult {
        self.message(general::package_text(p, html_link_formatter, true).text)
    }

    fn status(&self, p: &CommitStatusPayload) -> ConvertResult {
        self.message(general::status_text(p, html_link_formatter, true).text)
    }

    fn workflow_run(&self, p: &WorkflowRunPayload) -> ConvertResult {
        self.message(general::workflow_run_text(p, html_link_formatter, true).text)
    }

    fn workflow_job(&self, p: &WorkflowJobPayload) -> ConvertResult {
        self.message(general::workflow_job_text(p, html_link_formatter, true).text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converters::fixtures;

    #[test]
    fn test_issue_message_is_html() {
        let value = TelegramConvertor::new("")
            .unwrap()
            .issue(&fixtures::issue())
            .unwrap()
            .unwrap();

        assert_eq!(value["parse_mode"], "HTML");
        assert!(value.get("message_thread_id").is_none());
        assert_eq!(
            value["text"],
            "[<a href=\"http://localhost:3000/test/repo\">test/repo</a>] Issue opened: \
             <a href=\"http://localhost:3000/test/repo/issues/2\">#2 crash</a> by \
             <a href=\"http://localhost:3000/user1\">user1</a>\n\nissue body"
        );
    }

    #[test]
    fn test_thread_id_from_meta() {
        let value = TelegramConvertor::new(r#"{"chat_id":"-1","thread_id":"42"}"#)
            .unwrap()
            .release(&fixtures::release())
            .unwrap()
            .unwrap();
        assert_eq!(value["message_thread_id"], "42");
    }
}
