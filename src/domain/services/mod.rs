// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域服务模块
///
/// 包含的服务：
/// - Webhook选择器（webhook_selector）：按作用域、事件订阅和分支过滤器选择目标
/// - 通知服务（webhook_service）：事件生产者使用的入口，创建投递任务并入队
pub mod webhook_selector;
pub mod webhook_service;
