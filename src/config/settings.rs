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

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;

/// 应用程序配置设置
///
/// 包含服务器、数据库、Webhook投递、历史清理和指标导出等配置项
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// 服务器配置
    pub server: ServerSettings,
    /// 数据库配置
    pub database: DatabaseSettings,
    /// Webhook 投递配置
    pub webhook: WebhookSettings,
    /// 投递历史清理配置
    pub cleanup: CleanupSettings,
    /// 指标导出配置
    pub metrics: MetricsSettings,
}

/// 数据库配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// 数据库连接URL
    pub url: String,
    /// 最大连接数
    pub max_connections: Option<u32>,
    /// 最小连接数
    pub min_connections: Option<u32>,
    /// 连接超时时间（秒）
    pub connect_timeout: Option<u64>,
    /// 空闲连接超时时间（秒）
    pub idle_timeout: Option<u64>,
    /// 连接最长存活时间（秒）
    pub max_lifetime: Option<u64>,
    /// 是否输出SQL语句日志
    #[serde(default)]
    pub sqlx_logging: bool,
}

/// 服务器配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    /// 服务器监听主机地址
    pub host: String,
    /// 服务器监听端口
    pub port: u16,
}

/// Webhook 投递配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookSettings {
    /// 全局禁用投递
    pub disabled: bool,
    /// 单次投递超时时间（秒）
    pub deliver_timeout: u64,
    /// 跳过TLS证书校验
    pub skip_tls_verify: bool,
    /// 代理地址
    pub proxy_url: Option<String>,
    /// 走代理的主机通配符，逗号分隔
    pub proxy_hosts: String,
    /// 出站允许列表
    pub allowed_host_list: String,
    /// 投递队列积压告警阈值
    pub queue_length: usize,
    /// 投递worker数量
    pub workers: usize,
    /// 历史分页大小
    pub paging_num: u64,
    /// 响应体最多保存的字节数
    pub max_response_body: usize,
}

impl WebhookSettings {
    pub fn deliver_timeout(&self) -> Duration {
        Duration::from_secs(self.deliver_timeout)
    }
}

impl Default for WebhookSettings {
    fn default() -> Self {
        Self {
            disabled: false,
            deliver_timeout: 5,
            skip_tls_verify: false,
            proxy_url: None,
            proxy_hosts: String::new(),
            allowed_host_list: "external".to_string(),
            queue_length: 1000,
            workers: 4,
            paging_num: 10,
            max_response_body: 1024 * 1024,
        }
    }
}

/// 清理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum CleanupType {
    /// 删除早于截止时间的成功投递
    OlderThan,
    /// 每个Webhook只保留最近若干条
    PerWebhook,
}

/// 投递历史清理配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct CleanupSettings {
    /// 是否运行清理
    pub enabled: bool,
    /// 清理方式
    pub cleanup_type: CleanupType,
    /// 保留天数
    pub older_than_days: u64,
    /// 每个Webhook保留条数
    pub number_to_keep: u64,
    /// 清理间隔（秒）
    pub interval_secs: u64,
}

impl CleanupSettings {
    /// 清理间隔，至少一秒
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }

    /// 保留时长，超大的天数按上限饱和
    pub fn older_than(&self) -> Duration {
        Duration::from_secs(self.older_than_days.saturating_mul(24 * 60 * 60))
    }
}

impl Default for CleanupSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            cleanup_type: CleanupType::OlderThan,
            older_than_days: 7,
            number_to_keep: 10,
            interval_secs: 24 * 60 * 60,
        }
    }
}

/// 指标导出配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsSettings {
    /// 是否启用Prometheus导出
    pub enabled: bool,
    /// 导出监听地址
    pub listen_addr: String,
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 依次叠加代码默认值、`config/default`、`config/{APP_ENVIRONMENT}` 和 `HOOKRS__*` 环境变量
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        Self::builder()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                Environment::with_prefix("HOOKRS")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// 只包含代码默认值的配置构建器
    pub fn builder() -> Result<config::builder::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        let webhook = WebhookSettings::default();
        let cleanup = CleanupSettings::default();
        Config::builder()
            // Start with default settings
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            // Default DB pool settings
            .set_default("database.url", "sqlite://hookrs.db?mode=rwc")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 1)?
            .set_default("database.connect_timeout", 10)?
            .set_default("database.idle_timeout", 300)?
            .set_default("database.max_lifetime", 3600)?
            .set_default("database.sqlx_logging", false)?
            // Default Webhook settings
            .set_default("webhook.disabled", webhook.disabled)?
            .set_default("webhook.deliver_timeout", webhook.deliver_timeout)?
            .set_default("webhook.skip_tls_verify", webhook.skip_tls_verify)?
            .set_default("webhook.proxy_hosts", webhook.proxy_hosts)?
            .set_default("webhook.allowed_host_list", webhook.allowed_host_list)?
            .set_default("webhook.queue_length", webhook.queue_length as u64)?
            .set_default("webhook.workers", webhook.workers as u64)?
            .set_default("webhook.paging_num", webhook.paging_num)?
            .set_default("webhook.max_response_body", webhook.max_response_body as u64)?
            // Default Cleanup settings
            .set_default("cleanup.enabled", cleanup.enabled)?
            .set_default("cleanup.cleanup_type", "OlderThan")?
            .set_default("cleanup.older_than_days", cleanup.older_than_days)?
            .set_default("cleanup.number_to_keep", cleanup.number_to_keep)?
            .set_default("cleanup.interval_secs", cleanup.interval_secs)?
            // Default Metrics settings
            .set_default("metrics.enabled", true)?
            .set_default("metrics.listen_addr", "0.0.0.0:9000")
    }
}
