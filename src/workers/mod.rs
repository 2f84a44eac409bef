// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 工作器模块
///
/// 提供Webhook投递执行、投递worker池生命周期管理和投递历史清理
pub mod cleanup_worker;
pub mod manager;
pub mod webhook_worker;

pub use manager::DeliverySubsystem;
