// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 各目标共享的文本构建工具
//!
//! 目标格式只负责布局，事件文本、链接、颜色都在这里生成。

use crate::domain::models::event::HookEventType;
use crate::domain::models::payload::{
    CommitStatusPayload, CreatePayload, DeletePayload, ForkPayload, HookCommentAction,
    HookIssueAction, HookPackageAction, HookReleaseAction, HookRepoAction, HookWikiAction,
    IssueCommentPayload, IssuePayload, Milestone, PackagePayload, PayloadCommit,
    PullRequestPayload, PushPayload, ReleasePayload, RepositoryPayload, User, WikiPayload,
    WorkflowJobPayload, WorkflowRunPayload, BRANCH_PREFIX, TAG_PREFIX,
};

pub const GREEN: u32 = 0x1ac600;
pub const GREEN_LIGHT: u32 = 0xbfe5bf;
pub const YELLOW: u32 = 0xffd930;
pub const GREY: u32 = 0x4f545c;
pub const PURPLE: u32 = 0x7289da;
pub const ORANGE: u32 = 0xeb6420;
pub const ORANGE_LIGHT: u32 = 0xe68d60;
pub const RED: u32 = 0xff3232;

/// 链接格式化函数：`(url, text) -> 链接文本`
pub type LinkFormatter = fn(&str, &str) -> String;

/// HTML 链接
pub fn html_link_formatter(url: &str, text: &str) -> String {
    format!(
        "<a href=\"{}\">{}</a>",
        html_escape::encode_double_quoted_attribute(url),
        html_escape::encode_text(text)
    )
}

/// Markdown 链接
pub fn markdown_link_formatter(url: &str, text: &str) -> String {
    format!("[{}]({})", text, url)
}

/// 纯文本，丢弃链接
pub fn none_link_formatter(_url: &str, text: &str) -> String {
    text.to_string()
}

/// Slack 链接，`<url|text>`
pub fn slack_link_formatter(url: &str, text: &str) -> String {
    format!("<{}|{}>", url, slack_text_formatter(text))
}

/// 转义 Slack 保留字符 `&`、`<`、`>`
pub fn slack_text_formatter(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// 去掉 `refs/heads/` 或 `refs/tags/` 前缀
pub fn short_ref(ref_name: &str) -> &str {
    ref_name
        .strip_prefix(BRANCH_PREFIX)
        .or_else(|| ref_name.strip_prefix(TAG_PREFIX))
        .unwrap_or(ref_name)
}

/// 引用在仓库页面中的地址
pub fn ref_url(repo_url: &str, ref_name: &str) -> String {
    let name = short_ref(ref_name);
    if ref_name.starts_with(BRANCH_PREFIX) {
        format!("{}/src/branch/{}", repo_url, name)
    } else if ref_name.starts_with(TAG_PREFIX) {
        format!("{}/src/tag/{}", repo_url, name)
    } else {
        format!("{}/src/commit/{}", repo_url, name)
    }
}

/// "N new commits"，单个提交时使用单数
pub fn commits_desc(count: usize) -> String {
    if count == 1 {
        "1 new commit".to_string()
    } else {
        format!("{} new commits", count)
    }
}

/// 第一行文本
pub fn first_line(s: &str) -> &str {
    s.lines().next().unwrap_or_default().trim_end_matches('\r')
}

/// 按字符截断，超出部分以 `…` 结尾
pub fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let mut truncated: String = s.chars().take(max_chars.saturating_sub(1)).collect();
    truncated.push('…');
    truncated
}

/// 提交短ID
pub fn short_sha(sha: &str) -> &str {
    match sha.char_indices().nth(7) {
        Some((idx, _)) => &sha[..idx],
        None => sha,
    }
}

/// 单条提交描述：`短ID链接 首行消息 - 作者`
pub fn commit_line(commit: &PayloadCommit, lf: LinkFormatter) -> String {
    format!(
        "{} {} - {}",
        lf(&commit.url, short_sha(&commit.id)),
        first_line(&commit.message),
        commit.author.name
    )
}

/// 用户链接，没有主页地址时只显示登录名
pub fn user_link(user: &User, lf: LinkFormatter) -> String {
    if user.html_url.is_empty() {
        user.login.clone()
    } else {
        lf(&user.html_url, &user.login)
    }
}

/// 事件文本
///
/// `text` 是一行摘要，`title` 是条目标题（如 `#2 crash`），
/// `link` 指向事件对象，`body` 是可选的正文
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventText {
    pub text: String,
    pub title: String,
    pub link: String,
    pub body: String,
    pub color: u32,
}

impl EventText {
    fn with_sender(mut self, sender: &User, lf: LinkFormatter, enabled: bool) -> Self {
        if enabled {
            self.text = format!("{} by {}", self.text, user_link(sender, lf));
        }
        self
    }
}

pub fn create_text(p: &CreatePayload, lf: LinkFormatter) -> EventText {
    let repo_link = lf(&p.repository.html_url, &p.repository.full_name);
    let name = short_ref(&p.ref_name);
    let link = ref_url(&p.repository.html_url, &p.ref_name);
    EventText {
        text: format!("[{}] {} {} created", repo_link, p.ref_type, lf(&link, name)),
        title: name.to_string(),
        link,
        body: String::new(),
        color: GREEN,
    }
}

pub fn delete_text(p: &DeletePayload, lf: LinkFormatter) -> EventText {
    let repo_link = lf(&p.repository.html_url, &p.repository.full_name);
    let name = short_ref(&p.ref_name);
    EventText {
        text: format!("[{}] {} {} deleted", repo_link, p.ref_type, name),
        title: name.to_string(),
        link: p.repository.html_url.clone(),
        body: String::new(),
        color: RED,
    }
}

pub fn fork_text(p: &ForkPayload, lf: LinkFormatter) -> EventText {
    let base_link = lf(&p.forkee.html_url, &p.forkee.full_name);
    let fork_link = lf(&p.repository.html_url, &p.repository.full_name);
    EventText {
        text: format!("{} is forked to {}", base_link, fork_link),
        title: p.repository.full_name.clone(),
        link: p.repository.html_url.clone(),
        body: String::new(),
        color: GREY,
    }
}

/// 推送文本，正文为每个提交一行
pub fn push_text(p: &PushPayload, lf: LinkFormatter) -> EventText {
    let repo_link = lf(&p.repository.html_url, &p.repository.full_name);
    let branch = short_ref(&p.ref_name);
    let branch_link = lf(&ref_url(&p.repository.html_url, &p.ref_name), branch);
    let desc = commits_desc(p.commits.len());
    let commits = if p.compare_url.is_empty() {
        desc.clone()
    } else {
        lf(&p.compare_url, &desc)
    };
    let link = if p.compare_url.is_empty() {
        p.repository.html_url.clone()
    } else {
        p.compare_url.clone()
    };

    EventText {
        text: format!("[{}:{}] {}", repo_link, branch_link, commits),
        title: desc,
        link,
        body: p
            .commits
            .iter()
            .map(|commit| commit_line(commit, lf))
            .collect::<Vec<_>>()
            .join("\n"),
        color: GREEN,
    }
}

fn milestone_link(repo_url: &str, milestone: Option<&Milestone>, lf: LinkFormatter) -> String {
    match milestone {
        Some(m) => lf(&format!("{}/milestone/{}", repo_url, m.id), &m.title),
        None => String::new(),
    }
}

fn assignee_list(assignees: &[User], lf: LinkFormatter) -> String {
    assignees
        .iter()
        .map(|user| user_link(user, lf))
        .collect::<Vec<_>>()
        .join(", ")
}

/// issue 和 pull request 共用的动作短语与颜色
struct ActionContext<'a> {
    kind: &'a str,
    repo_url: &'a str,
    assignees: &'a [User],
    milestone: Option<&'a Milestone>,
    requested_reviewer: Option<&'a User>,
    merged: bool,
}

fn action_phrase(
    action: HookIssueAction,
    ctx: &ActionContext<'_>,
    lf: LinkFormatter,
) -> (String, u32) {
    let kind = ctx.kind;
    let reviewer = ctx
        .requested_reviewer
        .map(|user| user_link(user, lf))
        .unwrap_or_default();
    match action {
        HookIssueAction::Opened if kind == "Issue" => (format!("{} opened", kind), ORANGE),
        HookIssueAction::Opened => (format!("{} opened", kind), GREEN),
        HookIssueAction::Closed if ctx.merged => (format!("{} merged", kind), PURPLE),
        HookIssueAction::Closed => (format!("{} closed", kind), RED),
        HookIssueAction::Reopened => (format!("{} re-opened", kind), YELLOW),
        HookIssueAction::Edited => (format!("{} edited", kind), YELLOW),
        HookIssueAction::Assigned => (
            format!("{} assigned to {}", kind, assignee_list(ctx.assignees, lf)),
            GREEN,
        ),
        HookIssueAction::Unassigned => (format!("{} unassigned", kind), YELLOW),
        HookIssueAction::LabelUpdated => (format!("{} labels updated", kind), YELLOW),
        HookIssueAction::LabelCleared => (format!("{} labels cleared", kind), YELLOW),
        HookIssueAction::Synchronized => (format!("{} synchronized", kind), YELLOW),
        HookIssueAction::Milestoned => (
            format!(
                "{} milestoned to {}",
                kind,
                milestone_link(ctx.repo_url, ctx.milestone, lf)
            ),
            YELLOW,
        ),
        HookIssueAction::Demilestoned => (format!("{} milestone cleared", kind), YELLOW),
        HookIssueAction::ReviewRequested => {
            (format!("{} review requested to {}", kind, reviewer), YELLOW)
        }
        HookIssueAction::ReviewRequestRemoved => (
            format!("Removed {} review request for {}", kind.to_lowercase(), reviewer),
            YELLOW,
        ),
        HookIssueAction::Reviewed => (format!("{} reviewed", kind), YELLOW),
    }
}

pub fn issue_text(p: &IssuePayload, lf: LinkFormatter, with_sender: bool) -> EventText {
    let repo = &p.repository;
    let title = format!("#{} {}", p.number, p.issue.title);
    let link = format!("{}/issues/{}", repo.html_url, p.number);
    let ctx = ActionContext {
        kind: "Issue",
        repo_url: &repo.html_url,
        assignees: &p.issue.assignees,
        milestone: p.issue.milestone.as_ref(),
        requested_reviewer: None,
        merged: false,
    };
    let (phrase, color) = action_phrase(p.action, &ctx, lf);
    let body = match p.action {
        HookIssueAction::Opened | HookIssueAction::Edited => p.issue.body.clone(),
        _ => String::new(),
    };

    EventText {
        text: format!(
            "[{}] {}: {}",
            lf(&repo.html_url, &repo.full_name),
            phrase,
            lf(&link, &title)
        ),
        title,
        link,
        body,
        color,
    }
    .with_sender(&p.sender, lf, with_sender)
}

pub fn pull_request_text(p: &PullRequestPayload, lf: LinkFormatter, with_sender: bool) -> EventText {
    let repo = &p.repository;
    let pr = &p.pull_request;
    let title = format!("#{} {}", p.number, pr.title);
    let link = format!("{}/pulls/{}", repo.html_url, p.number);
    let ctx = ActionContext {
        kind: "Pull request",
        repo_url: &repo.html_url,
        assignees: &pr.assignees,
        milestone: pr.milestone.as_ref(),
        requested_reviewer: p.requested_reviewer.as_ref(),
        merged: pr.merged,
    };
    let (phrase, color) = action_phrase(p.action, &ctx, lf);
    let body = match p.action {
        HookIssueAction::Opened | HookIssueAction::Edited => pr.body.clone(),
        _ => String::new(),
    };

    EventText {
        text: format!(
            "[{}] {}: {}",
            lf(&repo.html_url, &repo.full_name),
            phrase,
            lf(&link, &title)
        ),
        title,
        link,
        body,
        color,
    }
    .with_sender(&p.sender, lf, with_sender)
}

/// 评审动作名称，非评审事件返回 `None`
pub fn review_action(event: HookEventType) -> Option<&'static str> {
    match event {
        HookEventType::PullRequestReviewApproved => Some("approved"),
        HookEventType::PullRequestReviewRejected => Some("rejected"),
        HookEventType::PullRequestReviewComment => Some("comment"),
        _ => None,
    }
}

pub fn review_text(
    p: &PullRequestPayload,
    event: HookEventType,
    lf: LinkFormatter,
    with_sender: bool,
) -> EventText {
    let repo = &p.repository;
    let title = format!("#{} {}", p.number, p.pull_request.title);
    let link = format!("{}/pulls/{}", repo.html_url, p.number);
    let action = review_action(event).unwrap_or("comment");
    let color = match event {
        HookEventType::PullRequestReviewApproved => GREEN,
        HookEventType::PullRequestReviewRejected => RED,
        _ => GREY,
    };

    EventText {
        text: format!(
            "[{}] Pull request review {}: {}",
            lf(&repo.html_url, &repo.full_name),
            action,
            lf(&link, &title)
        ),
        title,
        link,
        body: p
            .review
            .as_ref()
            .map(|review| review.content.clone())
            .unwrap_or_default(),
        color,
    }
    .with_sender(&p.sender, lf, with_sender)
}

pub fn issue_comment_text(
    p: &IssueCommentPayload,
    lf: LinkFormatter,
    with_sender: bool,
) -> EventText {
    let repo = &p.repository;
    let (kind, path) = if p.is_pull {
        ("pull request", "pulls")
    } else {
        ("issue", "issues")
    };
    let title = format!("#{} {}", p.issue.number, p.issue.title);
    let item_link = format!("{}/{}/{}", repo.html_url, path, p.issue.number);
    let link = match p.action {
        HookCommentAction::Deleted => item_link,
        _ if !p.comment.html_url.is_empty() => p.comment.html_url.clone(),
        _ => format!("{}#issuecomment-{}", item_link, p.comment.id),
    };
    let title_link = lf(&link, &title);
    let repo_link = lf(&repo.html_url, &repo.full_name);

    let (text, color) = match p.action {
        HookCommentAction::Created => (
            format!("[{}] New comment on {} {}", repo_link, kind, title_link),
            if p.is_pull { GREEN_LIGHT } else { ORANGE_LIGHT },
        ),
        HookCommentAction::Edited => (
            format!("[{}] Comment edited on {} {}", repo_link, kind, title_link),
            YELLOW,
        ),
        HookCommentAction::Deleted => (
            format!("[{}] Comment on {} {} was deleted", repo_link, kind, title_link),
            RED,
        ),
    };

    EventText {
        text,
        title,
        link,
        body: p.comment.body.clone(),
        color,
    }
    .with_sender(&p.sender, lf, with_sender)
}

pub fn release_text(p: &ReleasePayload, lf: LinkFormatter, with_sender: bool) -> EventText {
    let repo_link = lf(&p.repository.html_url, &p.repository.full_name);
    let tag = &p.release.tag_name;
    let ref_link = lf(&p.release.html_url, tag);
    let (verb, color) = match p.action {
        HookReleaseAction::Published => ("created", GREEN),
        HookReleaseAction::Updated => ("updated", YELLOW),
        HookReleaseAction::Deleted => ("deleted", RED),
    };

    EventText {
        text: format!("[{}] Release {}: {}", repo_link, verb, ref_link),
        title: tag.clone(),
        link: p.release.html_url.clone(),
        body: p.release.body.clone(),
        color,
    }
    .with_sender(&p.sender, lf, with_sender)
}

pub fn wiki_text(p: &WikiPayload, lf: LinkFormatter, with_sender: bool) -> EventText {
    let repo_link = lf(&p.repository.html_url, &p.repository.full_name);
    let link = format!(
        "{}/wiki/{}",
        p.repository.html_url,
        urlencoding::encode(&p.page)
    );
    let page_link = lf(&link, &p.page);
    let comment = if p.comment.is_empty() {
        String::new()
    } else {
        format!(" ({})", p.comment)
    };

    let (text, color) = match p.action {
        HookWikiAction::Created => (
            format!("[{}] New wiki page '{}'{}", repo_link, page_link, comment),
            GREEN,
        ),
        HookWikiAction::Edited => (
            format!("[{}] Wiki page '{}' edited{}", repo_link, page_link, comment),
            YELLOW,
        ),
        HookWikiAction::Deleted => (
            format!("[{}] Wiki page '{}' deleted", repo_link, page_link),
            RED,
        ),
    };

    EventText {
        text,
        title: p.page.clone(),
        link,
        body: String::new(),
        color,
    }
    .with_sender(&p.sender, lf, with_sender)
}

pub fn repository_text(p: &RepositoryPayload, lf: LinkFormatter, with_sender: bool) -> EventText {
    let repo_link = lf(&p.repository.html_url, &p.repository.full_name);
    let (verb, color) = match p.action {
        HookRepoAction::Created => ("created", GREEN),
        HookRepoAction::Deleted => ("deleted", RED),
    };

    EventText {
        text: format!("[{}] Repository {}", repo_link, verb),
        title: p.repository.full_name.clone(),
        link: p.repository.html_url.clone(),
        body: String::new(),
        color,
    }
    .with_sender(&p.sender, lf, with_sender)
}

pub fn package_text(p: &PackagePayload, lf: LinkFormatter, with_sender: bool) -> EventText {
    let pkg = &p.package;
    let name = format!("{}:{}", pkg.name, pkg.version);
    let (verb, color) = match p.action {
        HookPackageAction::Created => ("created", GREEN),
        HookPackageAction::Deleted => ("deleted", RED),
    };

    EventText {
        text: format!(
            "[{}] Package {}: {}",
            pkg.owner.login,
            verb,
            lf(&pkg.html_url, &name)
        ),
        title: name,
        link: pkg.html_url.clone(),
        body: String::new(),
        color,
    }
    .with_sender(&p.sender, lf, with_sender)
}

fn state_color(state: &str) -> u32 {
    match state {
        "success" => GREEN,
        "failure" | "error" => RED,
        "pending" | "running" | "waiting" | "in_progress" | "queued" => YELLOW,
        _ => GREY,
    }
}

pub fn status_text(p: &CommitStatusPayload, lf: LinkFormatter, with_sender: bool) -> EventText {
    let repo_link = lf(&p.repository.html_url, &p.repository.full_name);
    let target = if p.target_url.is_empty() {
        p.context.clone()
    } else {
        lf(&p.target_url, &p.context)
    };
    let mut text = format!(
        "[{}] Commit status of {} is {}: {}",
        repo_link,
        short_sha(&p.sha),
        p.state,
        target
    );
    if !p.description.is_empty() {
        text = format!("{} - {}", text, p.description);
    }

    EventText {
        text,
        title: format!("{} {}", p.context, p.state),
        link: p.target_url.clone(),
        body: String::new(),
        color: state_color(&p.state),
    }
    .with_sender(&p.sender, lf, with_sender)
}

fn run_state(status: &str, conclusion: &str) -> String {
    if conclusion.is_empty() {
        status.to_string()
    } else {
        conclusion.to_string()
    }
}

pub fn workflow_run_text(p: &WorkflowRunPayload, lf: LinkFormatter, with_sender: bool) -> EventText {
    let repo_link = lf(&p.repository.html_url, &p.repository.full_name);
    let run = &p.workflow_run;
    let title = format!("#{} {}", run.run_number, run.display_title);
    let state = run_state(&run.status, &run.conclusion);

    EventText {
        text: format!(
            "[{}] Workflow {} run {}: {}",
            repo_link,
            p.workflow.name,
            lf(&run.html_url, &title),
            state
        ),
        title,
        link: run.html_url.clone(),
        body: String::new(),
        color: state_color(&state),
    }
    .with_sender(&p.sender, lf, with_sender)
}

pub fn workflow_job_text(p: &WorkflowJobPayload, lf: LinkFormatter, with_sender: bool) -> EventText {
    let repo_link = lf(&p.repository.html_url, &p.repository.full_name);
    let job = &p.workflow_job;
    let state = run_state(&job.status, &job.conclusion);

    EventText {
        text: format!(
            "[{}] Workflow job {}: {}",
            repo_link,
            lf(&job.html_url, &job.name),
            state
        ),
        title: job.name.clone(),
        link: job.html_url.clone(),
        body: String::new(),
        color: state_color(&state),
    }
    .with_sender(&p.sender, lf, with_sender)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converters::fixtures;

    #[test]
    fn test_link_formatters() {
        assert_eq!(
            html_link_formatter("http://a/?x=1&y=2", "a<b"),
            "<a href=\"http://a/?x=1&amp;y=2\">a&lt;b</a>"
        );
        assert_eq!(markdown_link_formatter("http://a", "t"), "[t](http://a)");
        assert_eq!(none_link_formatter("http://a", "t"), "t");
        assert_eq!(slack_link_formatter("http://a", "a&b"), "<http://a|a&amp;b>");
    }

    #[test]
    fn test_ref_helpers() {
        assert_eq!(short_ref("refs/heads/feature/x"), "feature/x");
        assert_eq!(short_ref("refs/tags/v1.0"), "v1.0");
        assert_eq!(short_ref("abc"), "abc");
        assert_eq!(ref_url("http://r", "refs/heads/main"), "http://r/src/branch/main");
        assert_eq!(ref_url("http://r", "refs/tags/v1"), "http://r/src/tag/v1");
        assert_eq!(commits_desc(1), "1 new commit");
        assert_eq!(commits_desc(0), "0 new commits");
    }

    #[test]
    fn test_truncate_is_char_safe() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("héllo wörld", 5), "héll…");
        assert_eq!(short_sha("2020558fe2e3"), "2020558");
        assert_eq!(short_sha("abc"), "abc");
    }

    #[test]
    fn test_event_texts() {
        assert_eq!(
            create_text(&fixtures::create(), none_link_formatter).text,
            "[test/repo] branch test created"
        );
        assert_eq!(
            delete_text(&fixtures::delete(), none_link_formatter).text,
            "[test/repo] branch test deleted"
        );
        assert_eq!(
            fork_text(&fixtures::fork(), none_link_formatter).text,
            "test/repo2 is forked to test/repo"
        );
        assert_eq!(
            push_text(&fixtures::push(), none_link_formatter).text,
            "[test/repo:test] 2 new commits"
        );
        assert_eq!(
            issue_text(&fixtures::issue(), none_link_formatter, false).text,
            "[test/repo] Issue opened: #2 crash"
        );
        assert_eq!(
            issue_comment_text(&fixtures::issue_comment(), none_link_formatter, false).text,
            "[test/repo] New comment on issue #2 crash"
        );
        assert_eq!(
            pull_request_text(&fixtures::pull_request(), none_link_formatter, false).text,
            "[test/repo] Pull request opened: #12 Fix bug"
        );
        assert_eq!(
            review_text(
                &fixtures::review(),
                HookEventType::PullRequestReviewApproved,
                none_link_formatter,
                false
            )
            .text,
            "[test/repo] Pull request review approved: #12 Fix bug"
        );
        assert_eq!(
            repository_text(&fixtures::repository(), none_link_formatter, false).text,
            "[test/repo] Repository created"
        );
        assert_eq!(
            wiki_text(&fixtures::wiki(), none_link_formatter, false).text,
            "[test/repo] New wiki page 'index' (Wiki change comment)"
        );
        assert_eq!(
            release_text(&fixtures::release(), none_link_formatter, false).text,
            "[test/repo] Release created: v1.0"
        );
    }

    #[test]
    fn test_sender_and_merge() {
        let mut pr = fixtures::pull_request();
        pr.action = HookIssueAction::Closed;
        pr.pull_request.merged = true;
        let text = pull_request_text(&pr, markdown_link_formatter, true);
        assert_eq!(text.color, PURPLE);
        assert_eq!(
            text.text,
            "[[test/repo](http://localhost:3000/test/repo)] Pull request merged: \
             [#12 Fix bug](http://localhost:3000/test/repo/pulls/12) by \
             [user1](http://localhost:3000/user1)"
        );
        assert!(text.body.is_empty());
    }

    #[test]
    fn test_commit_lines() {
        let text = push_text(&fixtures::push(), markdown_link_formatter);
        assert_eq!(
            text.body.lines().next(),
            Some(
                "[2020558](http://localhost:3000/test/repo/commit/2020558fe2e34debb818a514715839cabd25e778) commit message - user1"
            )
        );
        assert_eq!(text.body.lines().count(), 2);
    }
}
