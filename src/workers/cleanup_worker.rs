// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::{CleanupSettings, CleanupType};
use crate::domain::repositories::hook_task_repository::HookTaskRepository;
use crate::domain::repositories::webhook_repository::RepositoryError;
use chrono::Utc;
use metrics::counter;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// 清理方式及其参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupMode {
    /// 删除投递时间早于该时长的成功任务
    OlderThan(Duration),
    /// 每个Webhook只保留最新的若干条成功任务
    PerWebhook(u64),
}

impl CleanupMode {
    pub fn from_settings(settings: &CleanupSettings) -> Self {
        match settings.cleanup_type {
            CleanupType::OlderThan => CleanupMode::OlderThan(settings.older_than()),
            CleanupType::PerWebhook => CleanupMode::PerWebhook(settings.number_to_keep),
        }
    }
}

/// 清理错误
#[derive(Error, Debug)]
pub enum CleanupError {
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Cleanup cancelled after deleting {deleted} tasks")]
    Cancelled { deleted: u64 },
}

/// 投递历史清理工作器
///
/// 失败的任务不会被清理，留给运维排查
pub struct CleanupWorker {
    tasks: Arc<dyn HookTaskRepository>,
    mode: CleanupMode,
    interval: Duration,
}

impl CleanupWorker {
    pub fn new(tasks: Arc<dyn HookTaskRepository>, settings: &CleanupSettings) -> Self {
        Self {
            tasks,
            mode: CleanupMode::from_settings(settings),
            interval: settings.interval(),
        }
    }

    /// 执行一次清理
    ///
    /// # 参数
    ///
    /// * `cancel` - 取消令牌，在两个Webhook之间检查
    /// * `mode` - 清理方式
    ///
    /// # 返回值
    ///
    /// * `Ok(u64)` - 删除的任务数
    /// * `Err(CleanupError)` - 存储错误或被取消
    pub async fn cleanup(
        &self,
        cancel: &CancellationToken,
        mode: CleanupMode,
    ) -> Result<u64, CleanupError> {
        if cancel.is_cancelled() {
            return Err(CleanupError::Cancelled { deleted: 0 });
        }

        let deleted = match mode {
            CleanupMode::OlderThan(age) => {
                // Stored timestamps are nanoseconds, nothing predates a cutoff outside that range
                let cutoff = chrono::Duration::from_std(age)
                    .ok()
                    .and_then(|age| Utc::now().checked_sub_signed(age))
                    .filter(|cutoff| cutoff.timestamp_nanos_opt().is_some());
                match cutoff {
                    Some(cutoff) => self.tasks.delete_succeeded_before(cutoff).await?,
                    None => 0,
                }
            }
            CleanupMode::PerWebhook(keep) => {
                let mut deleted = 0;
                for hook_id in self.tasks.delivered_hook_ids().await? {
                    if cancel.is_cancelled() {
                        counter!("webhook_cleanup_deleted_total").increment(deleted);
                        return Err(CleanupError::Cancelled { deleted });
                    }
                    match self.tasks.prune_succeeded(hook_id, keep).await {
                        Ok(count) => deleted += count,
                        Err(e) => {
                            warn!(hook_id, error = %e, "Failed to prune hook tasks, continuing");
                        }
                    }
                }
                deleted
            }
        };

        counter!("webhook_cleanup_deleted_total").increment(deleted);
        Ok(deleted)
    }

    /// 运行工作器，直到被取消
    pub async fn run(&self, cancel: CancellationToken) {
        info!(mode = ?self.mode, "Hook task cleanup worker started");

        let mut interval = tokio::time::interval(self.interval);

        loop {
            tokio::select! {
                _ = interval.tick() => {}
                _ = cancel.cancelled() => break,
            }

            match self.cleanup(&cancel, self.mode).await {
                Ok(count) => {
                    if count > 0 {
                        info!("Cleaned up {} delivered hook tasks", count);
                    }
                }
                Err(CleanupError::Cancelled { deleted }) => {
                    info!(deleted, "Hook task cleanup cancelled");
                    break;
                }
                Err(e) => {
                    error!("Failed to cleanup hook tasks: {}", e);
                }
            }
        }

        info!("Hook task cleanup worker stopped");
    }

    /// 启动后台运行
    pub fn start(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            self.run(cancel).await;
        })
    }
}

#[cfg(test)]
#[path = "cleanup_worker_test.rs"]
mod tests;
