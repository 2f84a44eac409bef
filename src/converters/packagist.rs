// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::{parse_meta, to_value, ConvertError, ConvertResult, PayloadConvertor};
use crate::domain::models::payload::{PushPayload, ReleasePayload};
use crate::domain::models::webhook::HookType;
use serde::{Deserialize, Serialize};

/// Packagist 目标元数据
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PackagistMeta {
    pub username: String,
    pub api_token: String,
    pub package_url: String,
}

#[derive(Debug, Serialize)]
pub struct PackagistRepository {
    pub url: String,
}

/// Packagist 更新通知，只关心包地址
#[derive(Debug, Serialize)]
pub struct PackagistPayload {
    #[serde(rename = "repository")]
    pub package_repository: PackagistRepository,
}

/// 只在推送和发布时通知 Packagist 刷新包
pub struct PackagistConvertor {
    meta: PackagistMeta,
}

impl PackagistConvertor {
    pub fn new(meta: &str) -> Result<Self, ConvertError> {
        Ok(Self {
            meta: parse_meta(HookType::Packagist, meta)?,
        })
    }

    fn update(&self) -> ConvertResult {
        to_value(PackagistPayload {
            package_repository: PackagistRepository {
                url: self.meta.package_url.clone(),
            },
        })
    }
}

impl PayloadConvertor for PackagistConvertor {
    fn push(&self, _p: &PushPayload) -> ConvertResult {
        self.update()
    }

    fn release(&self, _p: &ReleasePayload) -> ConvertResult {
        self.update()
    }
}
