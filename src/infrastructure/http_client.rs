// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 进程共享的出站HTTP客户端
//!
//! 允许列表在DNS解析阶段生效：解析结果中不被允许的地址会被丢弃，
//! 全部被丢弃时连接失败。重定向目标若是IP字面量，不经过解析器，
//! 由重定向策略单独检查。

use crate::config::settings::WebhookSettings;
use crate::utils::host_matcher::{HostMatchError, HostMatchList};
use reqwest::dns::{Addrs, Name, Resolve, Resolving};
use reqwest::redirect::{Attempt, Policy};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, warn};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

const MAX_REDIRECTS: usize = 10;

/// 按允许列表过滤解析结果的DNS解析器
#[derive(Debug, Clone)]
pub struct AllowListResolver {
    allow_list: Arc<HostMatchList>,
}

impl AllowListResolver {
    pub fn new(allow_list: Arc<HostMatchList>) -> Self {
        Self { allow_list }
    }
}

impl Resolve for AllowListResolver {
    fn resolve(&self, name: Name) -> Resolving {
        let allow_list = self.allow_list.clone();
        let host = name.as_str().to_string();
        Box::pin(async move {
            let allowed = resolve_allowed(&allow_list, &host).await?;
            Ok(Box::new(allowed.into_iter()) as Addrs)
        })
    }
}

/// 解析主机并只保留允许列表接受的地址
async fn resolve_allowed(
    allow_list: &HostMatchList,
    host: &str,
) -> Result<Vec<SocketAddr>, BoxError> {
    let resolved = tokio::net::lookup_host((host, 0)).await?;
    let allowed: Vec<SocketAddr> = resolved
        .filter(|addr| allow_list.match_host_or_ip(host, addr.ip()))
        .collect();
    if allowed.is_empty() {
        warn!(host = %host, "Webhook host blocked by allow list");
        return Err(Box::new(HostMatchError::Blocked {
            host: host.to_string(),
        }));
    }

    debug!(host = %host, addresses = allowed.len(), "Resolved webhook host");
    Ok(allowed)
}

/// 重定向策略：限制跳数，并对每一跳的IP字面量执行允许列表检查
fn redirect_policy(allow_list: Arc<HostMatchList>) -> Policy {
    Policy::custom(move |attempt: Attempt| {
        if attempt.previous().len() > MAX_REDIRECTS {
            return attempt.error("too many redirects");
        }
        match allow_list.check_url(attempt.url()) {
            Ok(()) => attempt.follow(),
            Err(e) => {
                warn!(url = %attempt.url(), "Webhook redirect blocked by allow list");
                attempt.error(e)
            }
        }
    })
}

/// 构建投递使用的HTTP客户端
///
/// # 参数
///
/// * `settings` - Webhook 投递配置
/// * `allow_list` - 出站允许列表
///
/// # 返回值
///
/// 配置了超时、TLS、代理和允许列表解析器的客户端
pub fn build_client(
    settings: &WebhookSettings,
    allow_list: Arc<HostMatchList>,
) -> Result<reqwest::Client, reqwest::Error> {
    let mut builder = reqwest::Client::builder()
        .timeout(settings.deliver_timeout())
        .danger_accept_invalid_certs(settings.skip_tls_verify)
        .redirect(redirect_policy(allow_list.clone()))
        .dns_resolver(Arc::new(AllowListResolver::new(allow_list)));

    // Without an explicit proxy the environment proxies apply.
    if let Some(proxy_url) = settings.proxy_url.as_deref().filter(|url| !url.is_empty()) {
        match reqwest::Url::parse(proxy_url) {
            Ok(proxy_url) => {
                let proxy_hosts =
                    HostMatchList::parse("webhook.proxy_hosts", &settings.proxy_hosts);
                builder = builder.no_proxy().proxy(reqwest::Proxy::custom(move |url| {
                    let host = url.host_str()?;
                    proxy_hosts
                        .match_host_name(host)
                        .then(|| proxy_url.clone())
                }));
            }
            Err(e) => warn!(error = %e, "Ignoring invalid webhook proxy url"),
        }
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_resolver_blocks_loopback() {
        let allow_list = HostMatchList::parse("allowed_host_list", "external");
        let err = resolve_allowed(&allow_list, "localhost").await.unwrap_err();
        assert!(err.to_string().contains("localhost"));
    }

    #[tokio::test]
    async fn test_resolver_allows_loopback_when_listed() {
        let allow_list = HostMatchList::parse("allowed_host_list", "loopback");
        let addrs = resolve_allowed(&allow_list, "localhost").await.unwrap();
        assert!(!addrs.is_empty());
        assert!(addrs.iter().all(|addr| addr.ip().is_loopback()));
    }

    #[test]
    fn test_build_client_with_proxy() {
        let settings = WebhookSettings {
            proxy_url: Some("http://127.0.0.1:8080".to_string()),
            proxy_hosts: "*.example.com".to_string(),
            ..Default::default()
        };
        let allow_list = Arc::new(HostMatchList::parse("allowed_host_list", "*"));
        assert!(build_client(&settings, allow_list).is_ok());
    }
}
