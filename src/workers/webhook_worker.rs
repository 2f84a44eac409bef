// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::config::settings::WebhookSettings;
use crate::converters::{self, ConvertError};
use crate::domain::models::hook_task::{HookRequest, HookResponse, HookTask};
use crate::domain::models::webhook::{HookContentType, HookStatus, HookType, Webhook};
use crate::domain::repositories::hook_task_repository::HookTaskRepository;
use crate::domain::repositories::webhook_repository::{RepositoryError, WebhookRepository};
use crate::utils::host_matcher::{HostMatchError, HostMatchList};
use crate::utils::signature::PayloadSignatures;
use metrics::{counter, histogram};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, Url};
use sha1::{Digest, Sha1};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, error, info, warn};

const USER_AGENT: &str = "Hookrs-Webhook";
const MASKED: &str = "******";

/// 投递错误
#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("Hook task {0} not found")]
    TaskNotFound(i64),

    #[error("Webhook {0} not found")]
    WebhookNotFound(i64),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Convert error: {0}")]
    Convert(#[from] ConvertError),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Webhook delivery is disabled")]
    Disabled,

    #[error(transparent)]
    Blocked(#[from] HostMatchError),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Delivery panicked: {0}")]
    Panicked(String),
}

/// 构建完成、尚未发送的请求
struct OutboundRequest {
    method: Method,
    url: Url,
    content_type: Option<&'static str>,
    body: Option<String>,
    /// 签名使用的原始负载
    payload: String,
}

/// Webhook投递执行器
///
/// 为单个任务构建、签名并发送请求，再把结果写回任务和Webhook
#[derive(Clone)]
pub struct WebhookDeliverer {
    webhooks: Arc<dyn WebhookRepository>,
    tasks: Arc<dyn HookTaskRepository>,
    /// 进程共享的HTTP客户端
    client: Client,
    allow_list: Arc<HostMatchList>,
    disabled: bool,
    max_response_body: usize,
}

impl WebhookDeliverer {
    /// 创建新的投递执行器实例
    ///
    /// # 参数
    ///
    /// * `webhooks` - Webhook仓库
    /// * `tasks` - 投递任务仓库
    /// * `client` - 已配置允许列表解析器的HTTP客户端
    /// * `allow_list` - 出站允许列表，用于IP字面量地址
    /// * `settings` - Webhook 投递配置
    ///
    /// # 返回值
    ///
    /// 返回新的投递执行器实例
    pub fn new(
        webhooks: Arc<dyn WebhookRepository>,
        tasks: Arc<dyn HookTaskRepository>,
        client: Client,
        allow_list: Arc<HostMatchList>,
        settings: &WebhookSettings,
    ) -> Self {
        Self {
            webhooks,
            tasks,
            client,
            allow_list,
            disabled: settings.disabled,
            max_response_body: settings.max_response_body,
        }
    }

    /// 按任务ID投递，已投递过的任务直接跳过
    pub async fn deliver_by_id(&self, task_id: i64) -> Result<(), DeliveryError> {
        let task = self
            .tasks
            .find_by_id(task_id)
            .await?
            .ok_or(DeliveryError::TaskNotFound(task_id))?;

        if task.is_delivered {
            debug!(task_id, "Hook task already delivered, skipping");
            return Ok(());
        }
        self.deliver(task).await
    }

    /// 投递单个任务
    ///
    /// # 参数
    ///
    /// * `task` - 待投递任务
    ///
    /// # 返回值
    ///
    /// * `Ok(())` - 已发送（包括非2xx响应）或按配置跳过
    /// * `Err(DeliveryError)` - 任务无法投递
    pub async fn deliver(&self, mut task: HookTask) -> Result<(), DeliveryError> {
        let webhook = self
            .webhooks
            .find_by_id(task.hook_id)
            .await?
            .ok_or(DeliveryError::WebhookNotFound(task.hook_id))?;

        let body = match converters::convert(
            webhook.hook_type,
            &webhook.meta,
            task.event_type,
            &task.payload_content,
        ) {
            Ok(Some(body)) => body,
            Ok(None) => {
                task.mark_attempted(true);
                self.tasks.update(&task).await?;
                counter!("webhook_delivery_skipped_total", "reason" => "no_content").increment(1);
                info!(
                    task_id = task.id,
                    hook_id = webhook.id,
                    hook_type = %webhook.hook_type,
                    event = task.event_type.as_str(),
                    "Nothing to deliver for event, skipping"
                );
                return Ok(());
            }
            Err(e) => return Err(self.fail(&mut task, "convert", e.into()).await),
        };

        let request = match build_request(&webhook, body) {
            Ok(request) => request,
            Err(e) => return Err(self.fail(&mut task, "invalid_request", e).await),
        };
        let (headers, recorded) = match build_headers(&webhook, &task, &request) {
            Ok(headers) => headers,
            Err(e) => return Err(self.fail(&mut task, "invalid_request", e).await),
        };
        task.request_info = Some(HookRequest {
            url: request.url.to_string(),
            http_method: request.method.to_string(),
            headers: recorded,
        });

        if self.disabled {
            self.tasks.update(&task).await?;
            counter!("webhook_delivery_skipped_total", "reason" => "disabled").increment(1);
            warn!(task_id = task.id, hook_id = webhook.id, "Webhook delivery is disabled");
            return Err(DeliveryError::Disabled);
        }
        if !webhook.is_active {
            task.mark_attempted(false);
            self.tasks.update(&task).await?;
            counter!("webhook_delivery_skipped_total", "reason" => "inactive").increment(1);
            info!(task_id = task.id, hook_id = webhook.id, "Webhook is inactive, skipping");
            return Ok(());
        }

        if let Err(e) = self.allow_list.check_url(&request.url) {
            return Err(self.fail(&mut task, "blocked", e.into()).await);
        }

        info!(
            task_id = task.id,
            hook_id = webhook.id,
            url = %request.url,
            event = task.event_type.as_str(),
            "Delivering webhook"
        );
        counter!("webhook_delivery_attempts_total").increment(1);

        let start = Instant::now();
        let mut builder = self
            .client
            .request(request.method, request.url)
            .headers(headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }
        let response = builder.send().await;

        let duration = start.elapsed();
        histogram!("webhook_delivery_duration_seconds").record(duration.as_secs_f64());

        let response = match response {
            Ok(response) => response,
            Err(e) => {
                let err = match find_blocked(&e) {
                    Some(blocked) => DeliveryError::Blocked(blocked),
                    None => DeliveryError::Transport(error_chain(&e)),
                };
                let reason = match err {
                    DeliveryError::Blocked(_) => "blocked",
                    _ => "network_error",
                };
                return Err(self.fail(&mut task, reason, err).await);
            }
        };

        let status = response.status();
        let response_headers: BTreeMap<String, String> = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let response_body = match read_body(response, self.max_response_body).await {
            Ok(body) => body,
            Err(e) => {
                warn!(task_id = task.id, error = %e, "Failed to read webhook response body");
                error_chain(&e)
            }
        };
        task.response_info = Some(HookResponse {
            status: status.as_u16(),
            headers: response_headers,
            body: response_body,
        });

        let succeeded = status.is_success();
        task.mark_attempted(succeeded);
        self.tasks.update(&task).await?;

        if succeeded {
            counter!("webhook_delivery_success_total").increment(1);
            info!(
                task_id = task.id,
                hook_id = webhook.id,
                status = status.as_u16(),
                elapsed_ms = duration.as_millis() as u64,
                "Webhook delivered"
            );
            self.record_status(webhook.id, HookStatus::Succeed).await;
        } else {
            counter!("webhook_delivery_failed_total", "reason" => "http_error").increment(1);
            warn!(
                task_id = task.id,
                hook_id = webhook.id,
                status = status.as_u16(),
                "Webhook delivery failed with non-success status"
            );
            self.record_status(webhook.id, HookStatus::Fail).await;
        }
        Ok(())
    }

    /// 把发生 panic 的投递标记为失败
    pub async fn record_panic(&self, task_id: i64, message: &str) -> Result<(), DeliveryError> {
        let mut task = self
            .tasks
            .find_by_id(task_id)
            .await?
            .ok_or(DeliveryError::TaskNotFound(task_id))?;
        let hook_id = task.hook_id;
        self.fail(&mut task, "panic", DeliveryError::Panicked(message.to_string()))
            .await;
        debug!(task_id, hook_id, "Recorded panicked delivery");
        Ok(())
    }

    /// 标记任务失败并持久化，返回原错误
    async fn fail(
        &self,
        task: &mut HookTask,
        reason: &'static str,
        err: DeliveryError,
    ) -> DeliveryError {
        task.mark_failed_with(err.to_string());
        counter!("webhook_delivery_failed_total", "reason" => reason).increment(1);
        error!(
            task_id = task.id,
            hook_id = task.hook_id,
            reason,
            error = %err,
            "Webhook delivery failed"
        );

        if let Err(e) = self.tasks.update(task).await {
            error!(task_id = task.id, error = %e, "Failed to persist failed hook task");
        }
        self.record_status(task.hook_id, HookStatus::Fail).await;
        err
    }

    async fn record_status(&self, hook_id: i64, status: HookStatus) {
        if let Err(e) = self.webhooks.update_last_status(hook_id, status).await {
            error!(hook_id, error = %e, "Failed to update webhook last status");
        }
    }
}

/// 按Webhook的方法和内容类型构建请求
fn build_request(webhook: &Webhook, body: String) -> Result<OutboundRequest, DeliveryError> {
    let mut url = Url::parse(&webhook.url)
        .map_err(|e| DeliveryError::InvalidRequest(format!("invalid url {}: {}", webhook.url, e)))?;

    let method = webhook.http_method.trim().to_uppercase();
    match method.as_str() {
        "" | "POST" => match webhook.content_type {
            HookContentType::Json => Ok(OutboundRequest {
                method: Method::POST,
                url,
                content_type: Some("application/json"),
                body: Some(body.clone()),
                payload: body,
            }),
            HookContentType::Form => {
                let form = serde_urlencoded::to_string([("payload", body.as_str())])
                    .map_err(|e| DeliveryError::InvalidRequest(e.to_string()))?;
                Ok(OutboundRequest {
                    method: Method::POST,
                    url,
                    content_type: Some("application/x-www-form-urlencoded"),
                    body: Some(form),
                    payload: body,
                })
            }
        },
        "GET" => {
            url.query_pairs_mut().append_pair("payload", &body);
            Ok(OutboundRequest {
                method: Method::GET,
                url,
                content_type: None,
                body: None,
                payload: body,
            })
        }
        "PUT" if webhook.hook_type == HookType::Matrix => {
            // Transaction id derived from the body keeps retries idempotent
            let txn_id = hex::encode(Sha1::digest(body.as_bytes()));
            let url = Url::parse(&format!(
                "{}/{}",
                webhook.url.trim_end_matches('/'),
                txn_id
            ))
            .map_err(|e| DeliveryError::InvalidRequest(e.to_string()))?;
            Ok(OutboundRequest {
                method: Method::PUT,
                url,
                content_type: Some("application/json"),
                body: Some(body.clone()),
                payload: body,
            })
        }
        "PUT" => Err(DeliveryError::InvalidRequest(format!(
            "PUT is not supported for {} webhooks",
            webhook.hook_type
        ))),
        other => Err(DeliveryError::InvalidRequest(format!(
            "unsupported http method {}",
            other
        ))),
    }
}

/// 构建发送用的请求头和写入任务的请求头记录
fn build_headers(
    webhook: &Webhook,
    task: &HookTask,
    request: &OutboundRequest,
) -> Result<(HeaderMap, BTreeMap<String, String>), DeliveryError> {
    let event = task.event_type.coarse_event();
    let event_type = task.event_type.as_str();

    let mut pairs: Vec<(String, String)> =
        vec![("User-Agent".to_string(), USER_AGENT.to_string())];
    if let Some(content_type) = request.content_type {
        pairs.push(("Content-Type".to_string(), content_type.to_string()));
    }
    for brand in ["Hookrs", "Gitea", "Gogs", "GitHub"] {
        pairs.push((format!("X-{}-Delivery", brand), task.uuid.clone()));
        pairs.push((format!("X-{}-Event", brand), event.to_string()));
        pairs.push((format!("X-{}-Event-Type", brand), event_type.to_string()));
    }

    let signatures = PayloadSignatures::compute(&webhook.secret, request.payload.as_bytes());
    if let Some(signatures) = signatures {
        for brand in ["Hookrs", "Gitea", "Gogs"] {
            pairs.push((format!("X-{}-Signature", brand), signatures.sha256.clone()));
        }
        pairs.push(("X-Hub-Signature".to_string(), format!("sha1={}", signatures.sha1)));
        pairs.push((
            "X-Hub-Signature-256".to_string(),
            format!("sha256={}", signatures.sha256),
        ));
    }

    let mut headers = HeaderMap::new();
    let mut recorded = BTreeMap::new();
    for (name, value) in pairs {
        insert_header(&mut headers, &name, &value)?;
        recorded.insert(name, value);
    }

    if let Some(authorization) = webhook
        .authorization_header
        .as_deref()
        .filter(|value| !value.is_empty())
    {
        insert_header(&mut headers, "Authorization", authorization)?;
        recorded.insert("Authorization".to_string(), MASKED.to_string());
    }

    Ok((headers, recorded))
}

fn insert_header(headers: &mut HeaderMap, name: &str, value: &str) -> Result<(), DeliveryError> {
    let name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|e| DeliveryError::InvalidRequest(format!("invalid header name {}: {}", name, e)))?;
    let value = HeaderValue::from_str(value)
        .map_err(|e| DeliveryError::InvalidRequest(format!("invalid value for {}: {}", name, e)))?;
    headers.insert(name, value);
    Ok(())
}

/// 读取响应体，最多保留 `limit` 字节
async fn read_body(mut response: reqwest::Response, limit: usize) -> Result<String, reqwest::Error> {
    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        let remaining = limit.saturating_sub(body.len());
        if chunk.len() >= remaining {
            body.extend_from_slice(&chunk[..remaining]);
            break;
        }
        body.extend_from_slice(&chunk);
    }
    Ok(String::from_utf8_lossy(&body).into_owned())
}

/// 允许列表在DNS解析阶段拒绝时，错误藏在来源链里
fn find_blocked(err: &reqwest::Error) -> Option<HostMatchError> {
    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(current) = source {
        if let Some(blocked) = current.downcast_ref::<HostMatchError>() {
            return Some(blocked.clone());
        }
        source = current.source();
    }
    None
}

fn error_chain(err: &reqwest::Error) -> String {
    let mut text = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(current) = source {
        text.push_str(": ");
        text.push_str(&current.to_string());
        source = current.source();
    }
    text
}
