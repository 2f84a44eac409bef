// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::helpers::*;
use chrono::Utc;
use hookrs::config::settings::CleanupSettings;
use hookrs::domain::models::event::HookEventType;
use hookrs::domain::models::hook_task::HookTask;
use hookrs::domain::models::webhook::{HookEvent, HookType, WebhookScope};
use hookrs::domain::repositories::hook_task_repository::HookTaskRepository;
use hookrs::workers::cleanup_worker::{CleanupMode, CleanupWorker};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

async fn delivered(app: &TestApp, hook_id: i64, succeeded: bool, days_ago: i64) -> i64 {
    let mut task = app
        .tasks
        .create(&HookTask::new(hook_id, REPO_ID, HookEventType::Push, "{}".to_string()))
        .await
        .unwrap();
    task.mark_attempted(succeeded);
    task.delivered_at = Some(Utc::now() - chrono::Duration::days(days_ago));
    app.tasks.update(&task).await.unwrap();
    task.id
}

/// 按时间清理只删除过期的成功任务
#[tokio::test]
async fn older_than_keeps_failures_for_diagnosis() {
    let app = setup().await;
    let hook = create_webhook(
        &app,
        WebhookScope::Repository(REPO_ID),
        HookType::Gitea,
        "http://example.com/hook".to_string(),
        HookEvent::push_only(),
    )
    .await;
    let stale = delivered(&app, hook.id, true, 30).await;
    let failed = delivered(&app, hook.id, false, 30).await;
    let fresh = delivered(&app, hook.id, true, 0).await;

    let worker = CleanupWorker::new(app.tasks.clone(), &CleanupSettings::default());
    let deleted = worker
        .cleanup(
            &CancellationToken::new(),
            CleanupMode::OlderThan(Duration::from_secs(7 * 24 * 60 * 60)),
        )
        .await
        .unwrap();

    assert_eq!(deleted, 1);
    assert!(app.tasks.find_by_id(stale).await.unwrap().is_none());
    assert!(app.tasks.find_by_id(failed).await.unwrap().is_some());
    assert!(app.tasks.find_by_id(fresh).await.unwrap().is_some());
}

/// 按Webhook清理保留每个Webhook最新的成功任务
#[tokio::test]
async fn per_webhook_keeps_newest_successes() {
    let app = setup().await;
    let busy = create_webhook(
        &app,
        WebhookScope::Repository(REPO_ID),
        HookType::Gitea,
        "http://example.com/busy".to_string(),
        HookEvent::push_only(),
    )
    .await;
    let quiet = create_webhook(
        &app,
        WebhookScope::Repository(REPO_ID),
        HookType::Gitea,
        "http://example.com/quiet".to_string(),
        HookEvent::push_only(),
    )
    .await;

    for days_ago in 0..4 {
        delivered(&app, busy.id, true, days_ago).await;
    }
    let quiet_task = delivered(&app, quiet.id, true, 10).await;

    let worker = CleanupWorker::new(app.tasks.clone(), &CleanupSettings::default());
    let deleted = worker
        .cleanup(&CancellationToken::new(), CleanupMode::PerWebhook(1))
        .await
        .unwrap();

    assert_eq!(deleted, 3);
    assert_eq!(app.tasks.list_by_hook(busy.id, 1, 10).await.unwrap().len(), 1);
    assert!(app.tasks.find_by_id(quiet_task).await.unwrap().is_some());
}
