// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
    Router,
};
use hookrs::config::settings::{CleanupSettings, WebhookSettings};
use hookrs::domain::models::payload::{PayloadCommit, PayloadUser, PushPayload, Repository, User};
use hookrs::domain::models::webhook::{HookEvent, HookType, Webhook, WebhookScope};
use hookrs::domain::repositories::webhook_repository::WebhookRepository;
use hookrs::domain::services::webhook_selector::{EventSource, OwnerRef, RepoRef};
use hookrs::infrastructure::repositories::hook_task_repo_impl::HookTaskRepoImpl;
use hookrs::infrastructure::repositories::webhook_repo_impl::WebhookRepoImpl;
use hookrs::queue::task_queue::DedupTaskQueue;
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::Mutex;

pub const REPO_ID: i64 = 1;
pub const OWNER_ID: i64 = 2;

#[allow(dead_code)]
pub struct TestApp {
    pub db: Arc<DatabaseConnection>,
    pub webhooks: Arc<WebhookRepoImpl>,
    pub tasks: Arc<HookTaskRepoImpl>,
}

/// 使用内存 SQLite 创建测试环境
pub async fn setup() -> TestApp {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1);
    let db = Arc::new(Database::connect(options).await.unwrap());
    Migrator::up(db.as_ref(), None).await.unwrap();

    TestApp {
        webhooks: Arc::new(WebhookRepoImpl::new(db.clone())),
        tasks: Arc::new(HookTaskRepoImpl::new(db.clone())),
        db,
    }
}

/// 允许投递到本机接收端的配置
pub fn loopback_settings() -> WebhookSettings {
    WebhookSettings {
        allowed_host_list: "loopback".to_string(),
        workers: 2,
        ..Default::default()
    }
}

pub fn no_cleanup() -> CleanupSettings {
    CleanupSettings {
        enabled: false,
        ..Default::default()
    }
}

pub fn repo_source() -> EventSource {
    EventSource::repository(
        RepoRef {
            id: REPO_ID,
            owner_id: OWNER_ID,
        },
        OwnerRef {
            id: OWNER_ID,
            is_organization: false,
        },
    )
}

pub fn push_payload(ref_name: &str, commits: usize) -> PushPayload {
    let author = PayloadUser {
        name: "user1".to_string(),
        email: "user1@example.com".to_string(),
        username: "user1".to_string(),
    };
    let commit = PayloadCommit {
        id: "2020558fe2e34debb818a514715839cabd25e778".to_string(),
        message: "commit message".to_string(),
        url: "http://localhost:3000/test/repo/commit/2020558fe2e34debb818a514715839cabd25e778"
            .to_string(),
        author: author.clone(),
        committer: author,
        ..Default::default()
    };
    let user = User {
        id: OWNER_ID,
        login: "user1".to_string(),
        ..Default::default()
    };
    PushPayload {
        ref_name: ref_name.to_string(),
        commits: vec![commit; commits],
        total_commits: commits,
        repository: Repository {
            id: REPO_ID,
            owner: user.clone(),
            name: "repo".to_string(),
            full_name: "test/repo".to_string(),
            html_url: "http://localhost:3000/test/repo".to_string(),
            ..Default::default()
        },
        pusher: user.clone(),
        sender: user,
        ..Default::default()
    }
}

pub async fn create_webhook(
    app: &TestApp,
    scope: WebhookScope,
    hook_type: HookType,
    url: String,
    hook_event: HookEvent,
) -> Webhook {
    app.webhooks
        .create(&Webhook::new(scope, hook_type, url, hook_event))
        .await
        .unwrap()
}

/// 等待队列中的任务全部处理完成
pub async fn wait_until_drained(queue: &DedupTaskQueue) {
    for _ in 0..250 {
        if queue.in_flight() == 0 {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("delivery queue did not drain");
}

/// 收到的投递请求
#[derive(Debug, Clone)]
pub struct Received {
    pub headers: HeaderMap,
    pub body: String,
}

/// 本机 axum 接收端，记录每一个收到的请求
pub struct Receiver {
    pub url: String,
    pub received: Arc<Mutex<Vec<Received>>>,
}

async fn record(
    State(received): State<Arc<Mutex<Vec<Received>>>>,
    headers: HeaderMap,
    body: String,
) -> StatusCode {
    received.lock().await.push(Received { headers, body });
    StatusCode::OK
}

pub async fn spawn_receiver() -> Receiver {
    let received = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
        .route("/hook", post(record))
        .with_state(received.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    Receiver {
        url: format!("http://{}/hook", addr),
        received,
    }
}
