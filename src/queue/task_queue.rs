// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use dashmap::DashSet;
use metrics::{counter, gauge};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// 队列错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    /// 队列已关闭，不再接受新任务
    #[error("Queue closed")]
    Closed,
}

/// 投递任务队列特质
///
/// 队列中只保存任务ID，任务内容由工作器在出队后从仓库加载
#[async_trait]
pub trait TaskQueue: Send + Sync {
    /// 入队任务
    ///
    /// # 参数
    ///
    /// * `task_id` - 投递任务ID
    ///
    /// # 返回值
    ///
    /// * `Ok(true)` - 已入队
    /// * `Ok(false)` - 任务已在队列中或正在处理，本次请求被合并
    /// * `Err(QueueError)` - 队列已关闭
    async fn enqueue(&self, task_id: i64) -> Result<bool, QueueError>;

    /// 出队任务，队列为空时等待，取消后返回 `None`
    async fn dequeue(&self, cancel: &CancellationToken) -> Option<i64>;

    /// 非阻塞出队，用于关闭时排空缓冲区
    async fn try_dequeue(&self) -> Option<i64>;

    /// 任务处理完成，释放其去重占位
    fn complete(&self, task_id: i64);

    /// 关闭队列
    fn close(&self);
}

/// 去重投递队列
///
/// 通道加一个在途ID集合：同一个任务ID从入队到处理完成之间只会出现一次，
/// 所以积压量不会超过待投递任务数。生产者从不等待worker
pub struct DedupTaskQueue {
    sender: mpsc::UnboundedSender<i64>,
    receiver: Mutex<mpsc::UnboundedReceiver<i64>>,
    in_flight: DashSet<i64>,
    /// 在途任务数超过该值时告警
    backlog_warn: usize,
    closed: AtomicBool,
}

impl DedupTaskQueue {
    /// 创建新的去重队列
    ///
    /// # 参数
    ///
    /// * `backlog_warn` - 积压告警阈值，至少为 1
    pub fn new(backlog_warn: usize) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            sender,
            receiver: Mutex::new(receiver),
            in_flight: DashSet::new(),
            backlog_warn: backlog_warn.max(1),
            closed: AtomicBool::new(false),
        }
    }

    /// 当前在途（排队或处理中）的任务数
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// 判断任务是否在途
    pub fn contains(&self, task_id: i64) -> bool {
        self.in_flight.contains(&task_id)
    }

    /// 队列是否已关闭
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

#[async_trait]
impl TaskQueue for DedupTaskQueue {
    async fn enqueue(&self, task_id: i64) -> Result<bool, QueueError> {
        if self.is_closed() {
            return Err(QueueError::Closed);
        }

        if !self.in_flight.insert(task_id) {
            counter!("webhook_queue_deduplicated_total").increment(1);
            debug!(task_id, "Task already queued, skipping");
            return Ok(false);
        }

        if self.sender.send(task_id).is_err() {
            self.in_flight.remove(&task_id);
            return Err(QueueError::Closed);
        }

        let in_flight = self.in_flight.len();
        if in_flight > self.backlog_warn {
            warn!(
                in_flight,
                limit = self.backlog_warn,
                "Delivery queue backlog above configured length"
            );
        }
        gauge!("webhook_queue_in_flight").set(in_flight as f64);
        Ok(true)
    }

    async fn dequeue(&self, cancel: &CancellationToken) -> Option<i64> {
        let mut receiver = tokio::select! {
            guard = self.receiver.lock() => guard,
            _ = cancel.cancelled() => return None,
        };

        tokio::select! {
            task_id = receiver.recv() => task_id,
            _ = cancel.cancelled() => None,
        }
    }

    async fn try_dequeue(&self) -> Option<i64> {
        self.receiver.lock().await.try_recv().ok()
    }

    fn complete(&self, task_id: i64) {
        self.in_flight.remove(&task_id);
        gauge!("webhook_queue_in_flight").set(self.in_flight.len() as f64);
    }

    fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }
}

#[async_trait]
impl<T: TaskQueue + ?Sized> TaskQueue for Arc<T> {
    async fn enqueue(&self, task_id: i64) -> Result<bool, QueueError> {
        (**self).enqueue(task_id).await
    }

    async fn dequeue(&self, cancel: &CancellationToken) -> Option<i64> {
        (**self).dequeue(cancel).await
    }

    async fn try_dequeue(&self) -> Option<i64> {
        (**self).try_dequeue().await
    }

    fn complete(&self, task_id: i64) {
        (**self).complete(task_id)
    }

    fn close(&self) {
        (**self).close()
    }
}
