// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 应用程序模块
///
/// 编排领域服务、浏览器会话和线索仓库，完成一次完整的线索采集
pub mod dto;
pub mod use_cases;
