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
pub struct MsTeamsFact {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MsTeamsSection {
    pub activity_title: String,
    pub activity_subtitle: String,
    pub activity_image: String,
    pub facts: Vec<MsTeamsFact>,
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct MsTeamsActionTarget {
    pub os: String,
    pub uri: String,
}

#[derive(Debug, Serialize)]
pub struct MsTeamsAction {
    #[serde(rename = "@type")]
    pub action_type: String,
    pub name: String,
    pub targets: Vec<MsTeamsActionTarget>,
}

/// MessageCard 负载
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MsTeamsPayload {
    #[serde(rename = "@type")]
    pub card_type: String,
    #[serde(rename = "@context")]
    pub context: String,
    pub theme_color: String,
    pub title: String,
    pub summary: String,
    pub sections: Vec<MsTeamsSection>,
    pub potential_action: Vec<MsTeamsAction>,
}

/// MS Teams 转换器，没有目标元数据
pub struct MsTeamsConvertor;

fn fact(name: impl Into<String>, value: impl Into<String>) -> MsTeamsFact {
    MsTeamsFact {
        name: name.into(),
        value: value.into(),
    }
}

fn card(
    repo: &Repository,
    event: EventText,
    sender: &User,
    extra: Option<MsTeamsFact>,
    uri: String,
) -> ConvertResult {
    let mut facts = vec![fact("Repository:", repo.full_name.clone())];
    facts.extend(extra);

    to_value(MsTeamsPayload {
        card_type: "MessageCard".to_string(),
        context: "https://schema.org/extensions".to_string(),
        theme_color: format!("{:x}", event.color),
        title: event.text.clone(),
        summary: event.text,
        sections: vec![MsTeamsSection {
            activity_title: sender.full_name.clone(),
            activity_subtitle: sender.login.clone(),
            activity_image: sender.avatar_url.clone(),
            facts,
            text: event.body,
        }],
        potential_action: vec![MsTeamsAction {
            action_type: "OpenUri".to_string(),
            name: "View in browser".to_string(),
            targets: vec![MsTeamsActionTarget {
                os: "default".to_string(),
                uri,
            }],
        }],
    })
}

fn src_uri(repo: &Repository, ref_name: &str) -> String {
    format!("{}/src/{}", repo.html_url, general::short_ref(ref_name))
}

impl PayloadConvertor for MsTeamsConvertor {
    fn create(&self, p: &CreatePayload) -> ConvertResult {
        let event = general::create_text(p, none_link_formatter);
        let extra = fact(format!("{}:", p.ref_type), event.title.clone());
        card(
            &p.repository,
            event,
            &p.sender,
            Some(extra),
            src_uri(&p.repository, &p.ref_name),
        )
    }

    fn delete(&self, p: &DeletePayload) -> ConvertResult {
        let event = general::delete_text(p, none_link_formatter);
        let extra = fact(format!("{}:", p.ref_type), event.title.clone());
        card(
            &p.repository,
            event,
            &p.sender,
            Some(extra),
            src_uri(&p.repository, &p.ref_name),
        )
    }

    fn fork(&self, p: &ForkPayload) -> ConvertResult {
        card(
            &p.repository,
            general::fork_text(p, none_link_formatter),
            &p.sender,
            Some(fact("Forkee:", p.forkee.full_name.clone())),
            p.repository.html_url.clone(),
        )
    }

    fn push(&self, p: &PushPayload) -> ConvertResult {
        let mut event = general::push_text(p, none_link_formatter);
        event.body = p
            .commits
            .iter()
            .map(|commit| general::commit_line(commit, markdown_link_formatter))
            .collect::<Vec<_>>()
            .join("\n\n");
        card(
            &p.repository,
            event,
            &p.sender,
            Some(fact("Commit count:", p.commits.len().to_string())),
            src_uri(&p.repository, &p.ref_name),
        )
    }

    fn issue(&self, p: &IssuePayload) -> ConvertResult {
        let event = general::issue_text(p, none_link_formatter, false);
        let uri = event.link.clone();
        card(
            &p.repository,
            event,
            &p.sender,
            Some(fact("Issue #:", p.number.to_string())),
            uri,
        )
    }

    fn issue_comment(&self, p: &IssueCommentPayload) -> ConvertResult {
        let event = general::issue_comment_text(p, none_link_formatter, false);
        let uri = event.link.clone();
        let name = if p.is_pull { "Pull request #:" } else { "Issue #:" };
        card(
            &p.repository,
            event,
            &p.sender,
            Some(fact(name, p.issue.number.to_string())),
            uri,
        )
    }

    fn pull_request(&self, p: &PullRequestPayload) -> ConvertResult {
        let event = general::pull_request_text(p, none_link_formatter, false);
        let uri = event.link.clone();
        card(
            &p.repository,
            event,
            &p.sender,
            Some(fact("Pull request #:", p.number.to_string())),
            uri,
        )
    }

    fn review(&self, p: &PullRequestPayload, event: HookEventType) -> ConvertResult {
        let event = general::review_text(p, event, none_link_formatter, false);
        let uri = event.link.clone();
        card(
            &p.repository,
            event,
            &p.sender,
            Some(fact("Pull request #:", p.number.to_string())),
            uri,
        )
    }

    fn repository(&self, p: &RepositoryPayload) -> ConvertResult {
        card(
            &p.repository,
            general::repository_text(p, none_link_formatter, false),
            &p.sender,
            None,
            p.repository.html_url.clone(),
        )
    }

    fn wiki(&self, p: &WikiPayload) -> ConvertResult {
        let event = general::wiki_text(p, none_link_formatter, false);
        let uri = event.link.clone();
        card(
            &p.repository,
            event,
            &p.sender,
            Some(fact("Wiki page:", p.page.clone())),
            uri,
        )
    }

    fn release(&self, p: &ReleasePayload) -> ConvertResult {
        let mut event = general::release_text(p, none_link_formatter, false);
        event.body = String::new();
        let uri = event.link.clone();
        card(
            &p.repository,
            event,
            &p.sender,
            Some(fact("Tag:", p.release.tag_name.clone())),
            uri,
        )
    }

    fn package(&self, p: &PackagePayload) -> ConvertResult {
        let event = general::package_text(p, none_link_formatter, false);
        let uri = event.link.clone();
        let repo = p.package.repository.clone().unwrap_or_else(|| Repository {
            full_name: p.package.owner.login.clone(),
            ..Default::default()
        });
        card(
            &repo,
            event,
            &p.sender,
            Some(fact("Package:", p.package.name.clone())),
            uri,
        )
    }

    fn status(&self, p: &CommitStatusPayload) -> ConvertResult {
        let event = general::status_text(p, none_link_formatter, false);
        let uri = event.link.clone();
        card(
            &p.repository,
            event,
            &p.sender,
            Some(fact("Commit:", general::short_sha(&p.sha).to_string())),
            uri,
        )
    }

    fn workflow_run(&self, p: &WorkflowRunPayload) -> ConvertResult {
        let event = general::workflow_run_text(p, none_link_formatter, false);
        let uri = event.link.clone();
        card(
            &p.repository,
            event,
            &p.sender,
            Some(fact("Workflow:", p.workflow.name.clone())),
            uri,
        )
    }

    fn workflow_job(&self, p: &WorkflowJobPayload) -> ConvertResult {
        let event = general::workflow_job_text(p, none_link_formatter, false);
        let uri = event.link.clone();
        card(
            &p.repository,
            event,
            &p.sender,
            Some(fact("Job:", p.workflow_job.name.clone())),
            uri,
        )
    }
}
