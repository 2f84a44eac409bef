// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::general::{self, markdown_link_formatter, none_link_formatter, EventText};
use super::{parse_meta, to_value, ConvertError, ConvertResult, PayloadConvertor};
use crate::domain::models::event::HookEventType;
use crate::domain::models::payload::*;
use crate::domain::models::webhook::HookType;
use serde::{Deserialize, Serialize};

/// Discord 单个 embed 描述的最大字符数
const DESCRIPTION_LIMIT: usize = 500;

/// Discord 目标元数据
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DiscordMeta {
    pub username: String,
    pub icon_url: String,
}

#[derive(Debug, Serialize)]
pub struct DiscordPayload {
    pub wait: bool,
    pub content: String,
    pub username: String,
    pub avatar_url: String,
    pub tts: bool,
    pub embeds: Vec<DiscordEmbed>,
}

#[derive(Debug, Serialize)]
pub struct DiscordEmbed {
    pub title: String,
    pub description: String,
    pub url: String,
    pub color: u32,
    pub author: DiscordEmbedAuthor,
}

#[derive(Debug, Serialize)]
pub struct DiscordEmbedAuthor {
    pub name: String,
    pub url: String,
    pub icon_url: String,
}

pub struct DiscordConvertor {
    meta: DiscordMeta,
}

impl DiscordConvertor {
    pub fn new(meta: &str) -> Result<Self, ConvertError> {
        Ok(Self {
            meta: parse_meta(HookType::Discord, meta)?,
        })
    }

    fn embed(&self, event: EventText, sender: &User) -> ConvertResult {
        to_value(DiscordPayload {
            wait: false,
            content: String::new(),
            username: self.meta.username.clone(),
            avatar_url: self.meta.icon_url.clone(),
            tts: false,
            embeds: vec![DiscordEmbed {
                title: event.text,
                description: general::truncate(&event.body, DESCRIPTION_LIMIT),
                url: event.link,
                color: event.color,
                author: DiscordEmbedAuthor {
                    name: sender.login.clone(),
                    url: sender.html_url.clone(),
                    icon_url: sender.avatar_url.clone(),
                },
            }],
        })
    }
}

impl PayloadConvertor for DiscordConvertor {
    fn create(&self, p: &CreatePayload) -> ConvertResult {
        self.embed(general::create_text(p, none_link_formatter), &p.sender)
    }

    fn delete(&self, p: &DeletePayload) -> ConvertResult {
        self.embed(general::delete_text(p, none_link_formatter), &p.sender)
    }

    fn fork(&self, p: &ForkPayload) -> ConvertResult {
        self.embed(general::fork_text(p, none_link_formatter), &p.sender)
    }

    fn push(&self, p: &PushPayload) -> ConvertResult {
        let mut event = general::push_text(p, none_link_formatter);
        event.body = p
            .commits
            .iter()
            .map(|commit| general::commit_line(commit, markdown_link_formatter))
            .collect::<Vec<_>>()
            .join("\n");
        if p.commits.len() == 1 {
            event.link = p.commits[0].url.clone();
        }
        self.embed(event, &p.sender)
    }

    fn issue(&self, p: &IssuePayload) -> ConvertResult {
        self.embed(general::issue_text(p, none_link_formatter, false), &p.sender)
    }

    fn issue_comment(&self, p: &IssueCommentPayload) -> ConvertResult {
        self.embed(
            general::issue_comment_text(p, none_link_formatter, false),
            &p.sender,
        )
    }

    fn pull_request(&self, p: &PullRequestPayload) -> ConvertResult {
        self.embed(
            general::pull_request_text(p, none_link_formatter, false),
            &p.sender,
        )
    }

    fn review(&self, p: &PullRequestPayload, event: HookEventType) -> ConvertResult {
        self.embed(
            general::review_text(p, event, none_link_formatter, false),
            &p.sender,
        )
    }

    fn repository(&self, p: &RepositoryPayload) -> ConvertResult {
        self.embed(
            general::repository_text(p, none_link_formatter, false),
            &p.sender,
        )
    }

    fn wiki(&self, p: &WikiPayload) -> ConvertResult {
        self.embed(general::wiki_text(p, none_link_formatter, false), &p.sender)
    }

    fn release(&self, p: &ReleasePayload) -> ConvertResult {
        self.embed(general::release_text(p, none_link_formatter, false), &p.sender)
    }

    fn package(&self, p: &PackagePayload) -> ConvertResult {
        self.embed(general::package_text(p, none_link_formatter, false), &p.sender)
    }

    fn status(&self, p: &CommitStatusPayload) -> ConvertResult {
        self.embed(general::status_text(p, none_link_formatter, false), &p.sender)
    }

    fn workflow_run(&self, p: &WorkflowRunPayload) -> ConvertResult {
        self.embed(
            general::workflow_run_text(p, none_link_formatter, false),
            &p.sender,
        )
    }

    fn workflow_job(&self, p: &WorkflowJobPayload) -> ConvertResult {
        self.embed(
            general::workflow_job_text(p, none_link_formatter, false),
            &p.sender,
        )
    }
}
