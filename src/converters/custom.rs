// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 自定义脚本目标
//!
//! 元数据中的 `template` 以 `{{ path.to.field }}` 引用通用负载中的字段，
//! 没有模板时原样转发通用负载。

use super::{parse_meta, ConvertError};
use crate::domain::models::webhook::HookType;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::Deserialize;
use serde_json::Value;

static PLACEHOLDER: Lazy<Result<Regex, regex::Error>> =
    Lazy::new(|| Regex::new(r"\{\{\s*([A-Za-z0-9_\-]+(?:\.[A-Za-z0-9_\-]+)*)\s*\}\}"));

/// 自定义脚本目标元数据
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CustomScriptMeta {
    pub template: Option<String>,
}

/// 渲染自定义脚本目标的请求体
///
/// # 参数
///
/// * `meta` - 目标元数据
/// * `payload_content` - 通用负载JSON
///
/// # 返回值
///
/// 渲染后的请求体，字段不存在时返回 `ConvertError::Template`
pub fn render(meta: &str, payload_content: &str) -> Result<String, ConvertError> {
    let meta: CustomScriptMeta = parse_meta(HookType::CustomScript, meta)?;
    let template = match meta.template {
        Some(template) if !template.trim().is_empty() => template,
        _ => return Ok(payload_content.to_string()),
    };

    let placeholder = PLACEHOLDER
        .as_ref()
        .map_err(|e| ConvertError::Template(e.to_string()))?;
    let payload: Value = serde_json::from_str(payload_content)?;
    let mut missing = None;
    let rendered = placeholder.replace_all(&template, |caps: &Captures<'_>| {
        let path = &caps[1];
        match lookup(&payload, path) {
            Some(Value::String(s)) => s.clone(),
            Some(value) => value.to_string(),
            None => {
                missing.get_or_insert_with(|| path.to_string());
                String::new()
            }
        }
    });

    match missing {
        Some(path) => Err(ConvertError::Template(format!(
            "field '{}' not found in payload",
            path
        ))),
        None => Ok(rendered.into_owned()),
    }
}

/// 按点分路径取值，数字段用于数组下标
fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(value, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAYLOAD: &str = r#"{"ref":"refs/heads/main","commits":[{"id":"abc","message":"fix"}],"repository":{"full_name":"test/repo","id":7},"pusher":{"login":"user1"}}"#;

    #[test]
    fn test_without_template_forwards_payload() {
        assert_eq!(render("", PAYLOAD).unwrap(), PAYLOAD);
        assert_eq!(render(r#"{"template":"  "}"#, PAYLOAD).unwrap(), PAYLOAD);
    }

    #[test]
    fn test_placeholders_are_substituted() {
        let meta = serde_json::json!({
            "template": "{\"text\":\"{{ pusher.login }} pushed {{commits.0.id}} to {{ repository.full_name }} ({{repository.id}})\"}"
        })
        .to_string();
        assert_eq!(
            render(&meta, PAYLOAD).unwrap(),
            r#"{"text":"user1 pushed abc to test/repo (7)"}"#
        );
    }

    #[test]
    fn test_missing_field_is_an_error() {
        let meta = r#"{"template":"{{ repository.owner.login }}"}"#;
        match render(meta, PAYLOAD) {
            Err(ConvertError::Template(message)) => {
                assert!(message.contains("repository.owner.login"))
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_invalid_meta() {
        assert!(matches!(
            render("{not json", PAYLOAD),
            Err(ConvertError::InvalidMeta { .. })
        ));
    }
}
