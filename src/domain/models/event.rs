// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::webhook::HookEvents;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// 未知事件类型错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown hook event type: {0}")]
pub struct UnknownEventType(pub String);

/// Webhook事件类型
///
/// 细粒度的内部事件类型，每一种都映射到唯一的粗粒度事件名称
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookEventType {
    Create,
    Delete,
    Fork,
    Push,
    Issues,
    IssueAssign,
    IssueLabel,
    IssueMilestone,
    IssueComment,
    PullRequest,
    PullRequestAssign,
    PullRequestLabel,
    PullRequestMilestone,
    PullRequestComment,
    PullRequestReviewApproved,
    PullRequestReviewRejected,
    PullRequestReviewComment,
    PullRequestSync,
    PullRequestReviewRequest,
    Wiki,
    Repository,
    Release,
    Package,
    Status,
    WorkflowRun,
    WorkflowJob,
}

/// 事件描述符
///
/// 静态表中的一行：原始名称、粗粒度名称以及对应的订阅开关
pub struct EventDescriptor {
    /// 原始事件名称
    pub name: &'static str,
    /// 粗粒度事件名称，用于请求头
    pub coarse: &'static str,
    /// 订阅开关访问器
    pub flag: fn(&HookEvents) -> bool,
}

fn row(
    name: &'static str,
    coarse: &'static str,
    flag: fn(&HookEvents) -> bool,
) -> EventDescriptor {
    EventDescriptor { name, coarse, flag }
}

static EVENT_TABLE: Lazy<HashMap<HookEventType, EventDescriptor>> = Lazy::new(|| {
    use HookEventType::*;
    HashMap::from([
        (Create, row("create", "create", |e| e.create)),
        (Delete, row("delete", "delete", |e| e.delete)),
        (Fork, row("fork", "fork", |e| e.fork)),
        (Push, row("push", "push", |e| e.push)),
        (Issues, row("issues", "issues", |e| e.issues)),
        (IssueAssign, row("issue_assign", "issues", |e| e.issue_assign)),
        (IssueLabel, row("issue_label", "issues", |e| e.issue_label)),
        (
            IssueMilestone,
            row("issue_milestone", "issues", |e| e.issue_milestone),
        ),
        (
            IssueComment,
            row("issue_comment", "issue_comment", |e| e.issue_comment),
        ),
        (PullRequest, row("pull_request", "pull_request", |e| e.pull_request)),
        (
            PullRequestAssign,
            row("pull_request_assign", "pull_request", |e| {
                e.pull_request_assign
            }),
        ),
        (
            PullRequestLabel,
            row("pull_request_label", "pull_request", |e| e.pull_request_label),
        ),
        (
            PullRequestMilestone,
            row("pull_request_milestone", "pull_request", |e| {
                e.pull_request_milestone
            }),
        ),
        (
            PullRequestComment,
            row("pull_request_comment", "issue_comment", |e| {
                e.pull_request_comment
            }),
        ),
        (
            PullRequestReviewApproved,
            row("pull_request_review_approved", "pull_request_approved", |e| {
                e.pull_request_review
            }),
        ),
        (
            PullRequestReviewRejected,
            row("pull_request_review_rejected", "pull_request_rejected", |e| {
                e.pull_request_review
            }),
        ),
        (
            PullRequestReviewComment,
            row("pull_request_review_comment", "pull_request_comment", |e| {
                e.pull_request_review
            }),
        ),
        (
            PullRequestSync,
            row("pull_request_sync", "pull_request", |e| e.pull_request_sync),
        ),
        (
            PullRequestReviewRequest,
            row("pull_request_review_request", "pull_request", |e| {
                e.pull_request_review_request
            }),
        ),
        (Wiki, row("wiki", "wiki", |e| e.wiki)),
        (Repository, row("repository", "repository", |e| e.repository)),
        (Release, row("release", "release", |e| e.release)),
        (Package, row("package", "package", |e| e.package)),
        (Status, row("status", "status", |e| e.status)),
        (WorkflowRun, row("workflow_run", "workflow_run", |e| e.workflow_run)),
        (WorkflowJob, row("workflow_job", "workflow_job", |e| e.workflow_job)),
    ])
});

impl HookEventType {
    /// 所有事件类型
    pub const ALL: [HookEventType; 26] = [
        HookEventType::Create,
        HookEventType::Delete,
        HookEventType::Fork,
        HookEventType::Push,
        HookEventType::Issues,
        HookEventType::IssueAssign,
        HookEventType::IssueLabel,
        HookEventType::IssueMilestone,
        HookEventType::IssueComment,
        HookEventType::PullRequest,
        HookEventType::PullRequestAssign,
        HookEventType::PullRequestLabel,
        HookEventType::PullRequestMilestone,
        HookEventType::PullRequestComment,
        HookEventType::PullRequestReviewApproved,
        HookEventType::PullRequestReviewRejected,
        HookEventType::PullRequestReviewComment,
        HookEventType::PullRequestSync,
        HookEventType::PullRequestReviewRequest,
        HookEventType::Wiki,
        HookEventType::Repository,
        HookEventType::Release,
        HookEventType::Package,
        HookEventType::Status,
        HookEventType::WorkflowRun,
        HookEventType::WorkflowJob,
    ];

    fn descriptor(&self) -> &'static EventDescriptor {
        // Every variant is registered in the table above
        &EVENT_TABLE[self]
    }

    /// 原始事件名称
    pub fn as_str(&self) -> &'static str {
        self.descriptor().name
    }

    /// 粗粒度事件名称
    ///
    /// 多个细粒度事件会折叠为同一个名称，例如所有 issue 子类型都对应 `issues`
    pub fn coarse_event(&self) -> &'static str {
        self.descriptor().coarse
    }

    /// 判断事件开关集合是否订阅了该事件
    pub fn is_flagged(&self, events: &HookEvents) -> bool {
        (self.descriptor().flag)(events)
    }

    /// 是否为 pull request 评审事件
    pub fn is_review(&self) -> bool {
        matches!(
            self,
            HookEventType::PullRequestReviewApproved
                | HookEventType::PullRequestReviewRejected
                | HookEventType::PullRequestReviewComment
        )
    }
}

impl fmt::Display for HookEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HookEventType {
    type Err = UnknownEventType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HookEventType::ALL
            .iter()
            .copied()
            .find(|event| event.as_str() == s)
            .ok_or_else(|| UnknownEventType(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_event_is_registered() {
        for event in HookEventType::ALL {
            assert_eq!(event.as_str().parse::<HookEventType>().unwrap(), event);
        }
    }

    #[test]
    fn test_coarse_event_collapsing() {
        assert_eq!(HookEventType::IssueAssign.coarse_event(), "issues");
        assert_eq!(HookEventType::IssueMilestone.coarse_event(), "issues");
        assert_eq!(HookEventType::PullRequestSync.coarse_event(), "pull_request");
        assert_eq!(
            HookEventType::PullRequestComment.coarse_event(),
            "issue_comment"
        );
        assert_eq!(
            HookEventType::PullRequestReviewApproved.coarse_event(),
            "pull_request_approved"
        );
        assert_eq!(
            HookEventType::PullRequestReviewComment.coarse_event(),
            "pull_request_comment"
        );
        assert_eq!(HookEventType::WorkflowJob.coarse_event(), "workflow_job");
    }

    #[test]
    fn test_unknown_event_type() {
        assert!("issue_closed".parse::<HookEventType>().is_err());
    }

    #[test]
    fn test_review_events_share_flag() {
        let events = HookEvents {
            pull_request_review: true,
            ..Default::default()
        };
        assert!(HookEventType::PullRequestReviewApproved.is_flagged(&events));
        assert!(HookEventType::PullRequestReviewRejected.is_flagged(&events));
        assert!(HookEventType::PullRequestReviewComment.is_flagged(&events));
        assert!(!HookEventType::PullRequestComment.is_flagged(&events));
    }
}
