// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::helpers::*;
use hookrs::domain::models::event::HookEventType;
use hookrs::domain::models::payload::Payload;
use hookrs::domain::models::webhook::{HookEvent, HookType, WebhookScope};
use hookrs::domain::repositories::hook_task_repository::HookTaskRepository;
use hookrs::domain::repositories::webhook_repository::WebhookRepository;
use hookrs::domain::services::webhook_selector::{EventSource, OwnerRef, RepoRef};
use hookrs::domain::services::webhook_service::WebhookService;
use hookrs::infrastructure::services::webhook_service_impl::WebhookServiceImpl;
use hookrs::queue::task_queue::{DedupTaskQueue, TaskQueue};
use std::sync::Arc;

fn service(app: &TestApp, queue: Arc<DedupTaskQueue>) -> WebhookServiceImpl {
    WebhookServiceImpl::new(app.webhooks.clone(), app.tasks.clone(), queue)
}

/// 分支过滤测试
#[tokio::test]
async fn branch_filter_limits_targets() {
    let app = setup().await;
    let queue = Arc::new(DedupTaskQueue::new(16));
    let main_only = create_webhook(
        &app,
        WebhookScope::Repository(REPO_ID),
        HookType::Gitea,
        "http://example.com/main".to_string(),
        HookEvent::push_only().with_branch_filter("main"),
    )
    .await;
    create_webhook(
        &app,
        WebhookScope::Repository(REPO_ID),
        HookType::Gitea,
        "http://example.com/release".to_string(),
        HookEvent::push_only().with_branch_filter("release/*"),
    )
    .await;

    let tasks = service(&app, queue.clone())
        .prepare_webhooks(
            &repo_source(),
            HookEventType::Push,
            &Payload::Push(push_payload("refs/heads/main", 1)),
        )
        .await
        .unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].hook_id, main_only.id);

    let tasks = service(&app, queue)
        .prepare_webhooks(
            &repo_source(),
            HookEventType::Push,
            &Payload::Push(push_payload("refs/heads/release/1.0", 1)),
        )
        .await
        .unwrap();
    assert_eq!(tasks.len(), 1);
    assert_ne!(tasks[0].hook_id, main_only.id);
}

/// 系统Webhook测试
///
/// 强制系统Webhook对所有仓库生效，默认系统Webhook只作为模板
#[tokio::test]
async fn forced_hooks_fire_and_default_hooks_are_templates() {
    let app = setup().await;
    let queue = Arc::new(DedupTaskQueue::new(16));
    let forced = create_webhook(
        &app,
        WebhookScope::SystemForced,
        HookType::Gitea,
        "http://example.com/forced".to_string(),
        HookEvent::push_only(),
    )
    .await;
    let default = create_webhook(
        &app,
        WebhookScope::SystemDefault,
        HookType::Gitea,
        "http://example.com/default".to_string(),
        HookEvent::push_only(),
    )
    .await;

    let tasks = service(&app, queue.clone())
        .prepare_webhooks(
            &repo_source(),
            HookEventType::Push,
            &Payload::Push(push_payload("refs/heads/main", 1)),
        )
        .await
        .unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].hook_id, forced.id);

    let copies = app.webhooks.copy_default_webhooks(42).await.unwrap();
    assert_eq!(copies.len(), 1);
    assert_ne!(copies[0].id, default.id);
    assert_eq!(copies[0].scope, WebhookScope::Repository(42));
    assert_eq!(copies[0].url, default.url);
}

/// 组织Webhook测试
///
/// 组织所有者的Webhook接收仓库事件和包事件
#[tokio::test]
async fn organization_hooks_receive_owner_events() {
    let app = setup().await;
    let queue = Arc::new(DedupTaskQueue::new(16));
    let org_hook = create_webhook(
        &app,
        WebhookScope::Owner(OWNER_ID),
        HookType::Gitea,
        "http://example.com/org".to_string(),
        HookEvent::push_only(),
    )
    .await;
    let org = OwnerRef {
        id: OWNER_ID,
        is_organization: true,
    };

    let source = EventSource::repository(
        RepoRef {
            id: REPO_ID,
            owner_id: OWNER_ID,
        },
        org,
    );
    let tasks = service(&app, queue.clone())
        .prepare_webhooks(
            &source,
            HookEventType::Push,
            &Payload::Push(push_payload("refs/heads/main", 1)),
        )
        .await
        .unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].hook_id, org_hook.id);

    // A user owner never carries owner-scoped hooks
    let tasks = service(&app, queue)
        .prepare_webhooks(
            &repo_source(),
            HookEventType::Push,
            &Payload::Push(push_payload("refs/heads/main", 1)),
        )
        .await
        .unwrap();
    assert!(tasks.is_empty());
}

/// 去重测试
///
/// 排队中的任务不会被重复入队，处理完成后可以再次入队
#[tokio::test]
async fn queued_task_is_not_enqueued_twice() {
    let app = setup().await;
    let queue = Arc::new(DedupTaskQueue::new(16));
    create_webhook(
        &app,
        WebhookScope::Repository(REPO_ID),
        HookType::Gitea,
        "http://example.com/hook".to_string(),
        HookEvent::push_only(),
    )
    .await;

    let tasks = service(&app, queue.clone())
        .prepare_webhooks(
            &repo_source(),
            HookEventType::Push,
            &Payload::Push(push_payload("refs/heads/main", 1)),
        )
        .await
        .unwrap();
    let task_id = tasks[0].id;

    assert!(!queue.enqueue(task_id).await.unwrap());
    assert_eq!(queue.in_flight(), 1);

    assert_eq!(queue.try_dequeue().await, Some(task_id));
    assert_eq!(queue.try_dequeue().await, None);
    queue.complete(task_id);
    assert!(queue.enqueue(task_id).await.unwrap());
}

/// 删除Webhook会级联删除投递历史
#[tokio::test]
async fn deleting_webhook_removes_history() {
    let app = setup().await;
    let queue = Arc::new(DedupTaskQueue::new(16));
    let webhook = create_webhook(
        &app,
        WebhookScope::Repository(REPO_ID),
        HookType::Gitea,
        "http://example.com/hook".to_string(),
        HookEvent::push_only(),
    )
    .await;
    let task = service(&app, queue)
        .prepare_test_webhook(webhook.id, &push_payload("refs/heads/main", 1))
        .await
        .unwrap();

    app.webhooks.delete(webhook.id).await.unwrap();

    assert!(app.webhooks.find_by_id(webhook.id).await.unwrap().is_none());
    assert!(app.tasks.find_by_id(task.id).await.unwrap().is_none());
}
