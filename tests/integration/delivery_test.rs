// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::helpers::*;
use hookrs::domain::models::event::HookEventType;
use hookrs::domain::models::payload::Payload;
use hookrs::domain::models::webhook::{HookEvent, HookStatus, HookType, Webhook, WebhookScope};
use hookrs::domain::repositories::hook_task_repository::HookTaskRepository;
use hookrs::domain::repositories::webhook_repository::WebhookRepository;
use hookrs::domain::services::webhook_service::WebhookService;
use hookrs::utils::signature::{sign_sha1, sign_sha256};
use hookrs::workers::DeliverySubsystem;
use wiremock::matchers::{header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// 端到端推送投递测试
///
/// 验证签名、事件头和投递记录
#[tokio::test]
async fn push_is_signed_and_delivered() {
    let app = setup().await;
    let receiver = spawn_receiver().await;

    let mut webhook = Webhook::new(
        WebhookScope::Repository(REPO_ID),
        HookType::Gitea,
        receiver.url.clone(),
        HookEvent::push_only(),
    );
    webhook.secret = "s3cr3t".to_string();
    let webhook = app.webhooks.create(&webhook).await.unwrap();

    let mut subsystem = DeliverySubsystem::new(
        app.webhooks.clone(),
        app.tasks.clone(),
        &loopback_settings(),
        &no_cleanup(),
    )
    .unwrap();
    subsystem.start().await.unwrap();

    let tasks = subsystem
        .service()
        .prepare_webhooks(
            &repo_source(),
            HookEventType::Push,
            &Payload::Push(push_payload("refs/heads/main", 1)),
        )
        .await
        .unwrap();
    assert_eq!(tasks.len(), 1);

    wait_until_drained(&subsystem.queue()).await;
    subsystem.shutdown().await;

    let received = receiver.received.lock().await;
    assert_eq!(received.len(), 1);
    let request = &received[0];
    let header = |name: &str| request.headers[name].to_str().unwrap().to_string();

    let body: serde_json::Value = serde_json::from_str(&request.body).unwrap();
    assert_eq!(body["ref"], "refs/heads/main");
    assert_eq!(header("x-gitea-event"), "push");
    assert_eq!(header("x-github-event-type"), "push");
    assert_eq!(header("x-gitea-delivery"), tasks[0].uuid);
    assert_eq!(header("user-agent"), "Hookrs-Webhook");

    let sha256 = sign_sha256(b"s3cr3t", request.body.as_bytes());
    assert_eq!(header("x-hookrs-signature"), sha256);
    assert_eq!(header("x-hub-signature-256"), format!("sha256={}", sha256));
    assert_eq!(
        header("x-hub-signature"),
        format!("sha1={}", sign_sha1(b"s3cr3t", request.body.as_bytes()))
    );

    let stored = app.tasks.find_by_id(tasks[0].id).await.unwrap().unwrap();
    assert!(stored.is_delivered);
    assert!(stored.is_succeed);
    let hook = app.webhooks.find_by_id(webhook.id).await.unwrap().unwrap();
    assert_eq!(hook.last_status, HookStatus::Succeed);
}

/// 空推送测试
///
/// 非原生目标不接收零提交推送，原生目标照常接收
#[tokio::test]
async fn empty_push_skips_slack_but_reaches_gitea() {
    let app = setup().await;
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/gitea"))
        .and(header_exists("X-Gitea-Delivery"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/slack"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let gitea = create_webhook(
        &app,
        WebhookScope::Repository(REPO_ID),
        HookType::Gitea,
        format!("{}/gitea", server.uri()),
        HookEvent::push_only(),
    )
    .await;
    create_webhook(
        &app,
        WebhookScope::Repository(REPO_ID),
        HookType::Slack,
        format!("{}/slack", server.uri()),
        HookEvent::push_only(),
    )
    .await;

    let mut subsystem = DeliverySubsystem::new(
        app.webhooks.clone(),
        app.tasks.clone(),
        &loopback_settings(),
        &no_cleanup(),
    )
    .unwrap();
    subsystem.start().await.unwrap();

    let tasks = subsystem
        .service()
        .prepare_webhooks(
            &repo_source(),
            HookEventType::Push,
            &Payload::Push(push_payload("refs/heads/main", 0)),
        )
        .await
        .unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].hook_id, gitea.id);

    wait_until_drained(&subsystem.queue()).await;
    subsystem.shutdown().await;
}

/// 重放测试
///
/// 重放生成新的任务和投递ID，两次投递都会到达目标
#[tokio::test]
async fn replay_delivers_again_with_fresh_uuid() {
    let app = setup().await;
    let receiver = spawn_receiver().await;
    let webhook = create_webhook(
        &app,
        WebhookScope::Repository(REPO_ID),
        HookType::Gitea,
        receiver.url.clone(),
        HookEvent::push_only(),
    )
    .await;

    let mut subsystem = DeliverySubsystem::new(
        app.webhooks.clone(),
        app.tasks.clone(),
        &loopback_settings(),
        &no_cleanup(),
    )
    .unwrap();
    subsystem.start().await.unwrap();
    let service = subsystem.service();

    let original = service
        .prepare_test_webhook(webhook.id, &push_payload("refs/heads/main", 1))
        .await
        .unwrap();
    wait_until_drained(&subsystem.queue()).await;

    let replayed = service
        .replay_hook_task(webhook.id, &original.uuid)
        .await
        .unwrap();
    wait_until_drained(&subsystem.queue()).await;
    subsystem.shutdown().await;

    assert_ne!(replayed.id, original.id);
    assert_ne!(replayed.uuid, original.uuid);

    let received = receiver.received.lock().await;
    assert_eq!(received.len(), 2);
    assert_eq!(received[0].body, received[1].body);
    assert_eq!(received[0].headers["x-gitea-delivery"], original.uuid.as_str());
    assert_eq!(received[1].headers["x-gitea-delivery"], replayed.uuid.as_str());

    let history = app.tasks.list_by_hook(webhook.id, 1, 10).await.unwrap();
    assert_eq!(history.len(), 2);
    assert!(history.iter().all(|task| task.is_succeed));
}

/// 允许列表测试
///
/// 默认只允许外部地址，本机接收端不会收到请求
#[tokio::test]
async fn default_allow_list_blocks_loopback() {
    let app = setup().await;
    let receiver = spawn_receiver().await;
    let webhook = create_webhook(
        &app,
        WebhookScope::Repository(REPO_ID),
        HookType::Gitea,
        receiver.url.clone(),
        HookEvent::push_only(),
    )
    .await;

    let settings = hookrs::config::settings::WebhookSettings::default();
    let mut subsystem =
        DeliverySubsystem::new(app.webhooks.clone(), app.tasks.clone(), &settings, &no_cleanup())
            .unwrap();
    subsystem.start().await.unwrap();

    let task = subsystem
        .service()
        .prepare_test_webhook(webhook.id, &push_payload("refs/heads/main", 1))
        .await
        .unwrap();
    wait_until_drained(&subsystem.queue()).await;
    subsystem.shutdown().await;

    assert!(receiver.received.lock().await.is_empty());
    let stored = app.tasks.find_by_id(task.id).await.unwrap().unwrap();
    assert!(stored.is_delivered);
    assert!(!stored.is_succeed);
    let hook = app.webhooks.find_by_id(webhook.id).await.unwrap().unwrap();
    assert_eq!(hook.last_status, HookStatus::Fail);
}
