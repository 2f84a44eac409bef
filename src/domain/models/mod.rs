// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// 该模块定义了系统的核心业务实体，包括：
/// - 事件类型（event）：细粒度事件与粗粒度事件名称的映射
/// - 通用负载（payload）：事件生产者触发的负载结构
/// - 网络钩子（webhook）：订阅配置，包括作用域、事件开关和目标类型
/// - 投递任务（hook_task）：一次 (webhook, 事件) 的投递记录
pub mod event;
pub mod hook_task;
pub mod payload;
pub mod webhook;
