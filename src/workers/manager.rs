// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::{CleanupSettings, WebhookSettings};
use crate::domain::repositories::hook_task_repository::HookTaskRepository;
use crate::domain::repositories::webhook_repository::WebhookRepository;
use crate::domain::services::webhook_service::{ServiceError, WebhookService};
use crate::infrastructure::http_client::build_client;
use crate::infrastructure::services::webhook_service_impl::WebhookServiceImpl;
use crate::queue::task_queue::{DedupTaskQueue, TaskQueue};
use crate::utils::host_matcher::HostMatchList;
use crate::workers::cleanup_worker::CleanupWorker;
use crate::workers::webhook_worker::{DeliveryError, WebhookDeliverer};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// 投递子系统
///
/// 持有进程共享的HTTP客户端、允许列表快照和去重队列，
/// 负责启动投递worker与清理worker，并在关闭时排空队列
pub struct DeliverySubsystem {
    tasks: Arc<dyn HookTaskRepository>,
    queue: Arc<DedupTaskQueue>,
    deliverer: Arc<WebhookDeliverer>,
    service: Arc<WebhookServiceImpl>,
    cleanup: Option<CleanupWorker>,
    workers: usize,
    cancel: CancellationToken,
    handles: Vec<JoinHandle<()>>,
}

impl DeliverySubsystem {
    /// 创建投递子系统
    ///
    /// # 参数
    ///
    /// * `webhooks` - Webhook仓库
    /// * `tasks` - 投递任务仓库
    /// * `settings` - Webhook 投递配置
    /// * `cleanup` - 投递历史清理配置
    ///
    /// # 返回值
    ///
    /// * `Ok(DeliverySubsystem)` - 尚未启动的子系统
    /// * `Err(reqwest::Error)` - HTTP客户端构建失败
    pub fn new(
        webhooks: Arc<dyn WebhookRepository>,
        tasks: Arc<dyn HookTaskRepository>,
        settings: &WebhookSettings,
        cleanup: &CleanupSettings,
    ) -> Result<Self, reqwest::Error> {
        let allow_list = Arc::new(HostMatchList::parse(
            "webhook.allowed_host_list",
            &settings.allowed_host_list,
        ));
        if allow_list.is_empty() {
            warn!("Webhook allow list is empty, every delivery will be blocked");
        }

        let client = build_client(settings, allow_list.clone())?;
        let queue = Arc::new(DedupTaskQueue::new(settings.queue_length));
        let deliverer = Arc::new(WebhookDeliverer::new(
            webhooks.clone(),
            tasks.clone(),
            client,
            allow_list,
            settings,
        ));
        let service = Arc::new(WebhookServiceImpl::new(
            webhooks,
            tasks.clone(),
            queue.clone(),
        ));
        let cleanup = cleanup
            .enabled
            .then(|| CleanupWorker::new(tasks.clone(), cleanup));

        Ok(Self {
            tasks,
            queue,
            deliverer,
            service,
            cleanup,
            workers: settings.workers.max(1),
            cancel: CancellationToken::new(),
            handles: Vec::new(),
        })
    }

    /// 启动子系统
    ///
    /// 先把上次运行遗留的待投递任务重新入队，再启动投递worker和清理worker
    ///
    /// # 返回值
    ///
    /// 重新入队的任务数
    pub async fn start(&mut self) -> Result<usize, ServiceError> {
        let pending = self.tasks.find_undelivered().await?;
        let mut requeued = 0;
        for task in &pending {
            if self.queue.enqueue(task.id).await? {
                requeued += 1;
            }
        }
        if requeued > 0 {
            info!(count = requeued, "Re-enqueued pending hook tasks");
        }

        for id in 0..self.workers {
            let queue = self.queue.clone();
            let deliverer = self.deliverer.clone();
            let cancel = self.cancel.clone();
            self.handles.push(tokio::spawn(async move {
                run_worker(id, queue, deliverer, cancel).await;
            }));
        }

        if let Some(cleanup) = self.cleanup.take() {
            self.handles.push(cleanup.start(self.cancel.clone()));
        }

        info!(workers = self.workers, "Webhook delivery subsystem started");
        Ok(requeued)
    }

    /// 通知服务
    pub fn service(&self) -> Arc<dyn WebhookService> {
        self.service.clone()
    }

    pub fn queue(&self) -> Arc<DedupTaskQueue> {
        self.queue.clone()
    }

    pub fn deliverer(&self) -> Arc<WebhookDeliverer> {
        self.deliverer.clone()
    }

    /// 关闭子系统
    ///
    /// 队列不再接受新任务，worker 处理完已缓冲的任务后退出
    pub async fn shutdown(mut self) {
        info!("Shutting down webhook delivery subsystem...");
        self.queue.close();
        self.cancel.cancel();

        for handle in self.handles.drain(..) {
            if let Err(e) = handle.await {
                error!("Delivery worker terminated abnormally: {}", e);
            }
        }

        info!("Webhook delivery subsystem shut down");
    }
}

/// 单个投递worker的循环
async fn run_worker(
    id: usize,
    queue: Arc<DedupTaskQueue>,
    deliverer: Arc<WebhookDeliverer>,
    cancel: CancellationToken,
) {
    debug!(worker = id, "Delivery worker started");

    while let Some(task_id) = queue.dequeue(&cancel).await {
        process(&queue, &deliverer, task_id).await;
    }

    // Drain ids that were buffered before shutdown
    while let Some(task_id) = queue.try_dequeue().await {
        process(&queue, &deliverer, task_id).await;
    }

    debug!(worker = id, "Delivery worker stopped");
}

async fn process(queue: &DedupTaskQueue, deliverer: &WebhookDeliverer, task_id: i64) {
    let result = AssertUnwindSafe(deliverer.deliver_by_id(task_id))
        .catch_unwind()
        .await;

    match result {
        Ok(Ok(())) => {}
        Ok(Err(DeliveryError::Disabled)) => {
            debug!(task_id, "Hook task left pending, delivery disabled");
        }
        Ok(Err(e)) => {
            error!(task_id, error = %e, "Hook task delivery failed");
        }
        Err(panic) => {
            let message = panic_message(panic.as_ref());
            error!(task_id, panic = %message, "Hook task delivery panicked");
            if let Err(e) = deliverer.record_panic(task_id, &message).await {
                error!(task_id, error = %e, "Failed to record panicked delivery");
            }
        }
    }

    queue.complete(task_id);
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::event::HookEventType;
    use crate::domain::models::hook_task::HookTask;
    use crate::domain::models::webhook::{HookEvent, HookType, Webhook, WebhookScope};
    use crate::domain::repositories::webhook_repository::RepositoryError;
    use crate::infrastructure::repositories::hook_task_repo_impl::HookTaskRepoImpl;
    use crate::infrastructure::repositories::webhook_repo_impl::WebhookRepoImpl;
    use migration::{Migrator, MigratorTrait};
    use sea_orm::{ConnectOptions, Database};
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_restart_redelivers_pending_tasks() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(2)
            .mount(&server)
            .await;

        let mut options = ConnectOptions::new("sqlite::memory:");
        options.max_connections(1);
        let db = Arc::new(Database::connect(options).await.unwrap());
        Migrator::up(db.as_ref(), None).await.unwrap();
        let webhooks = Arc::new(WebhookRepoImpl::new(db.clone()));
        let tasks = Arc::new(HookTaskRepoImpl::new(db));

        let hook = webhooks
            .create(&Webhook::new(
                WebhookScope::Repository(1),
                HookType::Gitea,
                format!("{}/hook", server.uri()),
                HookEvent::push_only(),
            ))
            .await
            .unwrap();
        let mut ids = Vec::new();
        for _ in 0..2 {
            let task = tasks
                .create(&HookTask::new(hook.id, 1, HookEventType::Push, "{}".to_string()))
                .await
                .unwrap();
            ids.push(task.id);
        }

        let settings = WebhookSettings {
            allowed_host_list: "loopback".to_string(),
            workers: 2,
            ..Default::default()
        };
        let cleanup = CleanupSettings {
            enabled: false,
            ..Default::default()
        };
        let mut subsystem =
            DeliverySubsystem::new(webhooks, tasks.clone(), &settings, &cleanup).unwrap();
        assert_eq!(subsystem.start().await.unwrap(), 2);

        for _ in 0..100 {
            if subsystem.queue().in_flight() == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        subsystem.shutdown().await;

        for id in ids {
            let task = tasks.find_by_id(id).await.unwrap().unwrap();
            assert!(task.is_delivered);
            assert!(task.is_succeed);
        }
    }

    /// 第一次读取指定任务时panic，其余调用交给内层仓库
    struct PanickingTasks {
        inner: Arc<HookTaskRepoImpl>,
        panic_on: i64,
        fired: AtomicBool,
    }

    #[async_trait]
    impl HookTaskRepository for PanickingTasks {
        async fn create(&self, task: &HookTask) -> Result<HookTask, RepositoryError> {
            self.inner.create(task).await
        }

        async fn find_by_id(&self, id: i64) -> Result<Option<HookTask>, RepositoryError> {
            if id == self.panic_on && !self.fired.swap(true, Ordering::SeqCst) {
                panic!("task store exploded");
            }
            self.inner.find_by_id(id).await
        }

        async fn update(&self, task: &HookTask) -> Result<(), RepositoryError> {
            self.inner.update(task).await
        }

        async fn find_undelivered(&self) -> Result<Vec<HookTask>, RepositoryError> {
            self.inner.find_undelivered().await
        }

        async fn list_by_hook(
            &self,
            hook_id: i64,
            page: u64,
            page_size: u64,
        ) -> Result<Vec<HookTask>, RepositoryError> {
            self.inner.list_by_hook(hook_id, page, page_size).await
        }

        async fn replay(&self, hook_id: i64, uuid: &str) -> Result<HookTask, RepositoryError> {
            self.inner.replay(hook_id, uuid).await
        }

        async fn delete_succeeded_before(
            &self,
            cutoff: DateTime<Utc>,
        ) -> Result<u64, RepositoryError> {
            self.inner.delete_succeeded_before(cutoff).await
        }

        async fn delivered_hook_ids(&self) -> Result<Vec<i64>, RepositoryError> {
            self.inner.delivered_hook_ids().await
        }

        async fn prune_succeeded(&self, hook_id: i64, keep: u64) -> Result<u64, RepositoryError> {
            self.inner.prune_succeeded(hook_id, keep).await
        }
    }

    #[tokio::test]
    async fn test_worker_survives_panicking_delivery() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let mut options = ConnectOptions::new("sqlite::memory:");
        options.max_connections(1);
        let db = Arc::new(Database::connect(options).await.unwrap());
        Migrator::up(db.as_ref(), None).await.unwrap();
        let webhooks = Arc::new(WebhookRepoImpl::new(db.clone()));
        let inner = Arc::new(HookTaskRepoImpl::new(db));

        let hook = webhooks
            .create(&Webhook::new(
                WebhookScope::Repository(1),
                HookType::Gitea,
                format!("{}/hook", server.uri()),
                HookEvent::push_only(),
            ))
            .await
            .unwrap();
        let mut ids = Vec::new();
        for _ in 0..2 {
            let task = inner
                .create(&HookTask::new(hook.id, 1, HookEventType::Push, "{}".to_string()))
                .await
                .unwrap();
            ids.push(task.id);
        }
        let tasks = Arc::new(PanickingTasks {
            inner: inner.clone(),
            panic_on: ids[0],
            fired: AtomicBool::new(false),
        });

        // A single worker has to handle both ids in turn
        let settings = WebhookSettings {
            allowed_host_list: "loopback".to_string(),
            workers: 1,
            ..Default::default()
        };
        let cleanup = CleanupSettings {
            enabled: false,
            ..Default::default()
        };
        let mut subsystem = DeliverySubsystem::new(webhooks, tasks, &settings, &cleanup).unwrap();
        subsystem.start().await.unwrap();

        for _ in 0..100 {
            if subsystem.queue().in_flight() == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        subsystem.shutdown().await;

        let panicked = inner.find_by_id(ids[0]).await.unwrap().unwrap();
        assert!(panicked.is_delivered);
        assert!(!panicked.is_succeed);
        assert!(panicked
            .response_info
            .unwrap()
            .body
            .contains("task store exploded"));

        let next = inner.find_by_id(ids[1]).await.unwrap().unwrap();
        assert!(next.is_delivered);
        assert!(next.is_succeed);
    }

    #[test]
    fn test_panic_message() {
        let boxed: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(boxed.as_ref()), "boom");
        let boxed: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(boxed.as_ref()), "bang");
        let boxed: Box<dyn Any + Send> = Box::new(7u8);
        assert_eq!(panic_message(boxed.as_ref()), "unknown panic");
    }
}
