// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 通用事件负载
//!
//! 事件生产者触发的负载结构，原生目标直接接收其JSON，
//! 其他目标由转换器基于这些结构生成各自的格式。

use crate::domain::models::event::HookEventType;
use serde::{Deserialize, Serialize};

/// 分支引用前缀
pub const BRANCH_PREFIX: &str = "refs/heads/";
/// 标签引用前缀
pub const TAG_PREFIX: &str = "refs/tags/";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    pub id: i64,
    pub login: String,
    pub full_name: String,
    pub email: String,
    pub avatar_url: String,
    pub html_url: String,
}

impl User {
    /// 展示名称，优先使用全名
    pub fn display_name(&self) -> &str {
        if self.full_name.is_empty() {
            &self.login
        } else {
            &self.full_name
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Repository {
    pub id: i64,
    pub owner: User,
    pub name: String,
    pub full_name: String,
    pub description: String,
    pub private: bool,
    pub html_url: String,
    pub clone_url: String,
    pub default_branch: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Organization {
    pub id: i64,
    pub name: String,
    pub full_name: String,
    pub avatar_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PayloadUser {
    pub name: String,
    pub email: String,
    pub username: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PayloadCommit {
    pub id: String,
    pub message: String,
    pub url: String,
    pub author: PayloadUser,
    pub committer: PayloadUser,
    pub timestamp: Option<String>,
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub modified: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreatePayload {
    pub sha: String,
    #[serde(rename = "ref")]
    pub ref_name: String,
    pub ref_type: String,
    pub repository: Repository,
    pub sender: User,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeletePayload {
    #[serde(rename = "ref")]
    pub ref_name: String,
    pub ref_type: String,
    pub pusher_type: String,
    pub repository: Repository,
    pub sender: User,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForkPayload {
    pub forkee: Repository,
    pub repository: Repository,
    pub sender: User,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PushPayload {
    #[serde(rename = "ref")]
    pub ref_name: String,
    pub before: String,
    pub after: String,
    pub compare_url: String,
    pub commits: Vec<PayloadCommit>,
    pub total_commits: usize,
    pub head_commit: Option<PayloadCommit>,
    pub repository: Repository,
    pub pusher: User,
    pub sender: User,
}

impl PushPayload {
    /// 推送的分支名称，标签推送返回 `None`
    pub fn branch(&self) -> Option<&str> {
        self.ref_name.strip_prefix(BRANCH_PREFIX)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Label {
    pub id: i64,
    pub name: String,
    pub color: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Milestone {
    pub id: i64,
    pub title: String,
    pub html_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Issue {
    pub id: i64,
    pub html_url: String,
    pub number: i64,
    pub user: User,
    pub title: String,
    pub body: String,
    pub labels: Vec<Label>,
    pub milestone: Option<Milestone>,
    pub assignees: Vec<User>,
    pub state: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookIssueAction {
    #[default]
    Opened,
    Closed,
    Reopened,
    Edited,
    Assigned,
    Unassigned,
    LabelUpdated,
    LabelCleared,
    Synchronized,
    Milestoned,
    Demilestoned,
    ReviewRequested,
    ReviewRequestRemoved,
    Reviewed,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IssuePayload {
    pub action: HookIssueAction,
    pub number: i64,
    pub issue: Issue,
    pub repository: Repository,
    pub sender: User,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Comment {
    pub id: i64,
    pub html_url: String,
    pub user: User,
    pub body: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookCommentAction {
    #[default]
    Created,
    Edited,
    Deleted,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IssueCommentPayload {
    pub action: HookCommentAction,
    pub issue: Issue,
    pub pull_request: Option<PullRequest>,
    pub comment: Comment,
    pub repository: Repository,
    pub sender: User,
    pub is_pull: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrBranchInfo {
    pub label: String,
    #[serde(rename = "ref")]
    pub ref_name: String,
    pub sha: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PullRequest {
    pub id: i64,
    pub number: i64,
    pub html_url: String,
    pub user: User,
    pub title: String,
    pub body: String,
    pub labels: Vec<Label>,
    pub milestone: Option<Milestone>,
    pub assignees: Vec<User>,
    pub state: String,
    pub merged: bool,
    pub head: PrBranchInfo,
    pub base: PrBranchInfo,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewPayload {
    #[serde(rename = "type")]
    pub review_type: String,
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PullRequestPayload {
    pub action: HookIssueAction,
    pub number: i64,
    pub pull_request: PullRequest,
    pub requested_reviewer: Option<User>,
    pub repository: Repository,
    pub sender: User,
    pub commit_id: String,
    pub review: Option<ReviewPayload>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookRepoAction {
    #[default]
    Created,
    Deleted,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryPayload {
    pub action: HookRepoAction,
    pub repository: Repository,
    pub organization: Option<Organization>,
    pub sender: User,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Release {
    pub id: i64,
    pub tag_name: String,
    pub target_commitish: String,
    pub name: String,
    pub body: String,
    pub html_url: String,
    pub draft: bool,
    pub prerelease: bool,
    pub author: User,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookReleaseAction {
    #[default]
    Published,
    Updated,
    Deleted,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReleasePayload {
    pub action: HookReleaseAction,
    pub release: Release,
    pub repository: Repository,
    pub sender: User,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookWikiAction {
    #[default]
    Created,
    Edited,
    Deleted,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WikiPayload {
    pub action: HookWikiAction,
    pub repository: Repository,
    pub sender: User,
    pub page: String,
    pub comment: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Package {
    pub id: i64,
    pub owner: User,
    pub repository: Option<Repository>,
    pub creator: User,
    #[serde(rename = "type")]
    pub package_type: String,
    pub name: String,
    pub version: String,
    pub html_url: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookPackageAction {
    #[default]
    Created,
    Deleted,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackagePayload {
    pub action: HookPackageAction,
    pub package: Package,
    pub organization: Option<Organization>,
    pub sender: User,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommitStatusPayload {
    pub commit: Option<PayloadCommit>,
    pub context: String,
    pub description: String,
    pub id: i64,
    pub repository: Repository,
    pub sender: User,
    pub sha: String,
    pub state: String,
    pub target_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionWorkflow {
    pub id: String,
    pub name: String,
    pub path: String,
    pub html_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionWorkflowRun {
    pub id: i64,
    pub run_number: i64,
    pub display_title: String,
    pub head_branch: String,
    pub head_sha: String,
    pub status: String,
    pub conclusion: String,
    pub html_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowRunPayload {
    pub action: String,
    pub workflow: ActionWorkflow,
    pub workflow_run: ActionWorkflowRun,
    pub organization: Option<Organization>,
    pub repository: Repository,
    pub sender: User,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionWorkflowJob {
    pub id: i64,
    pub run_id: i64,
    pub name: String,
    pub head_branch: String,
    pub head_sha: String,
    pub status: String,
    pub conclusion: String,
    pub html_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowJobPayload {
    pub action: String,
    pub workflow_job: ActionWorkflowJob,
    pub organization: Option<Organization>,
    pub repository: Repository,
    pub sender: User,
}

/// 通用事件负载
///
/// 按事件类型区分的具体负载，序列化时不带外层标签
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    Create(CreatePayload),
    Delete(DeletePayload),
    Fork(ForkPayload),
    Push(PushPayload),
    Issue(IssuePayload),
    IssueComment(IssueCommentPayload),
    PullRequest(PullRequestPayload),
    Repository(RepositoryPayload),
    Release(ReleasePayload),
    Wiki(WikiPayload),
    Package(PackagePayload),
    Status(CommitStatusPayload),
    WorkflowRun(WorkflowRunPayload),
    WorkflowJob(WorkflowJobPayload),
}

impl Payload {
    /// 按事件类型解析持久化的负载JSON
    ///
    /// # 参数
    ///
    /// * `event` - 事件类型，决定负载结构
    /// * `raw` - 负载JSON文本
    pub fn from_json(event: HookEventType, raw: &str) -> Result<Self, serde_json::Error> {
        use HookEventType::*;
        let payload = match event {
            Create => Payload::Create(serde_json::from_str(raw)?),
            Delete => Payload::Delete(serde_json::from_str(raw)?),
            Fork => Payload::Fork(serde_json::from_str(raw)?),
            Push => Payload::Push(serde_json::from_str(raw)?),
            Issues | IssueAssign | IssueLabel | IssueMilestone => {
                Payload::Issue(serde_json::from_str(raw)?)
            }
            IssueComment | PullRequestComment => Payload::IssueComment(serde_json::from_str(raw)?),
            PullRequest
            | PullRequestAssign
            | PullRequestLabel
            | PullRequestMilestone
            | PullRequestSync
            | PullRequestReviewRequest
            | PullRequestReviewApproved
            | PullRequestReviewRejected
            | PullRequestReviewComment => Payload::PullRequest(serde_json::from_str(raw)?),
            Wiki => Payload::Wiki(serde_json::from_str(raw)?),
            Repository => Payload::Repository(serde_json::from_str(raw)?),
            Release => Payload::Release(serde_json::from_str(raw)?),
            Package => Payload::Package(serde_json::from_str(raw)?),
            Status => Payload::Status(serde_json::from_str(raw)?),
            WorkflowRun => Payload::WorkflowRun(serde_json::from_str(raw)?),
            WorkflowJob => Payload::WorkflowJob(serde_json::from_str(raw)?),
        };
        Ok(payload)
    }

    /// 序列化为JSON文本
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// 负载关联的分支名称
    ///
    /// 只有分支推送、分支创建和分支删除会返回分支，其他事件不参与分支过滤
    pub fn branch(&self) -> Option<&str> {
        match self {
            Payload::Push(p) => p.branch(),
            Payload::Create(p) if p.ref_type == "branch" => Some(short_ref(&p.ref_name)),
            Payload::Delete(p) if p.ref_type == "branch" => Some(short_ref(&p.ref_name)),
            _ => None,
        }
    }

    /// 是否为不含提交的推送
    pub fn is_empty_push(&self) -> bool {
        matches!(self, Payload::Push(p) if p.commits.is_empty())
    }
}

fn short_ref(ref_name: &str) -> &str {
    ref_name
        .strip_prefix(BRANCH_PREFIX)
        .unwrap_or(ref_name)
}

impl From<PushPayload> for Payload {
    fn from(p: PushPayload) -> Self {
        Payload::Push(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_branch() {
        let push = PushPayload {
            ref_name: "refs/heads/feature/7791".to_string(),
            ..Default::default()
        };
        assert_eq!(Payload::Push(push).branch(), Some("feature/7791"));

        let tag = PushPayload {
            ref_name: "refs/tags/v1.0".to_string(),
            ..Default::default()
        };
        assert_eq!(Payload::Push(tag).branch(), None);
    }

    #[test]
    fn test_create_branch_only_for_branch_refs() {
        let branch = CreatePayload {
            ref_name: "main".to_string(),
            ref_type: "branch".to_string(),
            ..Default::default()
        };
        assert_eq!(Payload::Create(branch).branch(), Some("main"));

        let tag = CreatePayload {
            ref_name: "v1".to_string(),
            ref_type: "tag".to_string(),
            ..Default::default()
        };
        assert_eq!(Payload::Create(tag).branch(), None);
    }

    #[test]
    fn test_from_json_by_event_type() {
        let raw = r#"{"action":"label_updated","number":2,"issue":{"number":2,"title":"crash"}}"#;
        match Payload::from_json(HookEventType::IssueLabel, raw).unwrap() {
            Payload::Issue(p) => {
                assert_eq!(p.action, HookIssueAction::LabelUpdated);
                assert_eq!(p.issue.title, "crash");
            }
            other => panic!("unexpected payload: {:?}", other),
        }

        let raw = r#"{"action":"reviewed","number":12,"review":{"type":"pull_request_review_approved","content":"good job"}}"#;
        match Payload::from_json(HookEventType::PullRequestReviewApproved, raw).unwrap() {
            Payload::PullRequest(p) => {
                assert_eq!(p.action, HookIssueAction::Reviewed);
                assert_eq!(p.review.unwrap().content, "good job");
            }
            other => panic!("unexpected payload: {:?}", other),
        }
    }

    #[test]
    fn test_serialized_payload_is_untagged() {
        let push = Payload::Push(PushPayload {
            ref_name: "refs/heads/main".to_string(),
            ..Default::default()
        });
        let value: serde_json::Value = serde_json::from_str(&push.to_json().unwrap()).unwrap();
        assert_eq!(value["ref"], "refs/heads/main");
    }
}
