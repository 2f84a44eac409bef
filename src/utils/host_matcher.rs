// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 出站主机允许列表
//!
//! 列表项以逗号分隔，不区分大小写，可以是内置关键字、CIDR 或主机名通配符：
//!
//! - `loopback`：环回地址
//! - `private`：RFC1918 私有地址和 fc00::/7
//! - `external` / `global`：全局单播且非私有地址
//! - `*` / `all`：任意主机

use crate::utils::glob::GlobSet;
use ipnet::IpNet;
use std::net::IpAddr;
use thiserror::Error;
use tracing::warn;
use url::{Host, Url};

/// 主机被允许列表拒绝
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostMatchError {
    #[error("host {host} is not allowed by the webhook allow list")]
    Blocked { host: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Builtin {
    All,
    Loopback,
    Private,
    External,
}

impl Builtin {
    fn parse(entry: &str) -> Option<Self> {
        match entry {
            "*" | "all" => Some(Builtin::All),
            "loopback" => Some(Builtin::Loopback),
            "private" => Some(Builtin::Private),
            "external" | "global" => Some(Builtin::External),
            _ => None,
        }
    }

    fn matches(self, ip: IpAddr) -> bool {
        match self {
            Builtin::All => true,
            Builtin::Loopback => ip.is_loopback(),
            Builtin::Private => is_private(ip),
            Builtin::External => is_global_unicast(ip) && !is_private(ip),
        }
    }
}

/// 主机允许列表
#[derive(Debug, Clone, Default)]
pub struct HostMatchList {
    builtins: Vec<Builtin>,
    nets: Vec<IpNet>,
    hosts: Vec<GlobSet>,
}

impl HostMatchList {
    /// 解析允许列表，无法识别的项记录警告后忽略
    ///
    /// # 参数
    ///
    /// * `setting` - 配置项名称，用于日志
    /// * `list` - 逗号分隔的列表
    pub fn parse(setting: &str, list: &str) -> Self {
        let mut matcher = Self::default();
        for entry in split_entries(list) {
            let entry = entry.trim().to_lowercase();
            if entry.is_empty() {
                continue;
            }
            if let Some(builtin) = Builtin::parse(&entry) {
                matcher.builtins.push(builtin);
            } else if let Ok(net) = entry.parse::<IpNet>() {
                matcher.nets.push(net);
            } else {
                match GlobSet::compile(&entry) {
                    Ok(glob) => matcher.hosts.push(glob),
                    Err(e) => warn!(setting, entry = %entry, error = %e, "Ignoring invalid host pattern"),
                }
            }
        }
        matcher
    }

    /// 列表是否为空，空列表不匹配任何主机
    pub fn is_empty(&self) -> bool {
        self.builtins.is_empty() && self.nets.is_empty() && self.hosts.is_empty()
    }

    /// 按主机名匹配，只检查 `*`/`all` 和通配符
    pub fn match_host_name(&self, host: &str) -> bool {
        if self.builtins.contains(&Builtin::All) {
            return true;
        }
        let host = host.trim_end_matches('.').to_lowercase();
        self.hosts.iter().any(|glob| glob.matches(&host))
    }

    /// 按IP地址匹配内置关键字和CIDR
    pub fn match_ip(&self, ip: IpAddr) -> bool {
        let ip = canonical(ip);
        self.builtins.iter().any(|builtin| builtin.matches(ip))
            || self.nets.iter().any(|net| net.contains(&ip))
            || self.hosts.iter().any(|glob| glob.matches(&ip.to_string()))
    }

    /// 主机名或解析出的IP任一匹配即允许
    pub fn match_host_or_ip(&self, host: &str, ip: IpAddr) -> bool {
        self.match_host_name(host) || self.match_ip(ip)
    }

    /// 检查主机，不允许时返回 [`HostMatchError::Blocked`]
    pub fn check(&self, host: &str, ip: IpAddr) -> Result<(), HostMatchError> {
        if self.match_host_or_ip(host, ip) {
            Ok(())
        } else {
            Err(HostMatchError::Blocked {
                host: host.to_string(),
            })
        }
    }

    /// 检查URL中的IP字面量主机
    ///
    /// 连接IP字面量时不会经过DNS解析器，首跳和每次重定向都要在这里检查；
    /// 主机名交给解析器处理
    pub fn check_url(&self, url: &Url) -> Result<(), HostMatchError> {
        let ip = match url.host() {
            Some(Host::Ipv4(v4)) => IpAddr::V4(v4),
            Some(Host::Ipv6(v6)) => IpAddr::V6(v6),
            _ => return Ok(()),
        };
        self.check(&ip.to_string(), ip)
    }
}

/// 按逗号切分，`{}` 内的逗号属于通配符备选
fn split_entries(list: &str) -> Vec<&str> {
    let mut entries = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (idx, ch) in list.char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                entries.push(&list[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    entries.push(&list[start..]);
    entries
}

/// IPv4 映射的 IPv6 地址按 IPv4 处理
fn canonical(ip: IpAddr) -> IpAddr {
    match ip {
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => IpAddr::V4(v4),
            None => IpAddr::V6(v6),
        },
        v4 => v4,
    }
}

fn is_private(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => v4.is_private(),
        // fc00::/7
        IpAddr::V6(v6) => (v6.segments()[0] & 0xfe00) == 0xfc00,
    }
}

fn is_global_unicast(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            !(v4.is_unspecified()
                || v4.is_loopback()
                || v4.is_link_local()
                || v4.is_multicast()
                || v4.is_broadcast())
        }
        IpAddr::V6(v6) => {
            !(v6.is_unspecified()
                || v6.is_loopback()
                || v6.is_multicast()
                // fe80::/10
                || (v6.segments()[0] & 0xffc0) == 0xfe80)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[test]
    fn test_check_url_only_vets_ip_literals() {
        let list = HostMatchList::parse("allowed_host_list", "localhost");
        let url = |s: &str| Url::parse(s).unwrap();

        assert!(list.check_url(&url("http://localhost:8080/hook")).is_ok());
        assert_eq!(
            list.check_url(&url("http://127.0.0.1:8080/secret")),
            Err(HostMatchError::Blocked {
                host: "127.0.0.1".to_string()
            })
        );
        assert!(list
            .check_url(&url("http://[::1]/secret"))
            .is_err());
        assert!(list
            .check_url(&url("http://169.254.169.254/latest/meta-data"))
            .is_err());

        let loopback = HostMatchList::parse("allowed_host_list", "loopback");
        assert!(loopback.check_url(&url("http://127.0.0.1:8080/hook")).is_ok());
    }

    #[test]
    fn test_private_and_global() {
        let list = HostMatchList::parse("allowed_host_list", "private, global");
        assert!(!list.match_ip(ip("127.0.0.1")));
        assert!(list.match_ip(ip("10.0.0.5")));
        assert!(list.match_ip(ip("8.8.8.8")));
        assert!(list.match_ip(ip("fd00::1")));
        assert!(!list.match_ip(ip("::1")));
    }

    #[test]
    fn test_external_excludes_private() {
        let list = HostMatchList::parse("allowed_host_list", "external");
        assert!(list.match_ip(ip("8.8.8.8")));
        assert!(!list.match_ip(ip("192.168.1.1")));
        assert!(!list.match_ip(ip("169.254.0.1")));
        assert!(!list.match_ip(ip("::ffff:127.0.0.1")));
    }

    #[test]
    fn test_loopback_and_cidr() {
        let list = HostMatchList::parse("allowed_host_list", "Loopback, 203.0.113.0/24");
        assert!(list.match_ip(ip("127.0.0.1")));
        assert!(list.match_ip(ip("203.0.113.9")));
        assert!(!list.match_ip(ip("203.0.114.9")));
    }

    #[test]
    fn test_host_globs() {
        let list = HostMatchList::parse("allowed_host_list", "*.example.com, {a,b}.test");
        assert!(list.match_host_name("hooks.example.com"));
        assert!(list.match_host_name("HOOKS.Example.com."));
        assert!(list.match_host_name("b.test"));
        assert!(!list.match_host_name("c.test"));
        assert!(!list.match_ip(ip("8.8.8.8")));
    }

    #[test]
    fn test_empty_list_matches_nothing() {
        let list = HostMatchList::parse("allowed_host_list", " , ");
        assert!(list.is_empty());
        assert!(!list.match_host_or_ip("localhost", ip("127.0.0.1")));
        assert!(!list.match_host_or_ip("example.com", ip("8.8.8.8")));
    }

    #[test]
    fn test_all_matches_everything() {
        let list = HostMatchList::parse("allowed_host_list", "*");
        assert!(list.match_host_or_ip("anything", ip("127.0.0.1")));
        assert_eq!(
            HostMatchList::parse("allowed_host_list", "private")
                .check("localhost", ip("127.0.0.1")),
            Err(HostMatchError::Blocked {
                host: "localhost".to_string()
            })
        );
    }
}
