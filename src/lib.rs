// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 配置模块
///
/// 处理应用程序的配置设置和环境变量
pub mod config;

/// 负载转换模块
///
/// 把通用事件负载转换为各类目标平台的请求体
pub mod converters;

/// 领域模块
///
/// 包含核心业务实体、服务和仓库接口
pub mod domain;

/// 基础设施模块
///
/// 提供外部服务集成，如数据库、HTTP客户端、指标等
pub mod infrastructure;

/// 表示层模块
///
/// 健康检查和版本路由
pub mod presentation;

/// 队列模块
///
/// 实现去重投递队列
pub mod queue;

/// 工具模块
///
/// 提供通用的工具函数和辅助功能
pub mod utils;

/// 工作器模块
///
/// 实现投递worker、清理worker和子系统生命周期管理
pub mod workers;
