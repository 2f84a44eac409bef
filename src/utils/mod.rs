// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 工具模块
///
/// 提供分支与主机通配符、出站允许列表、负载签名和日志初始化
pub mod glob;
pub mod host_matcher;
pub mod signature;
pub mod telemetry;
