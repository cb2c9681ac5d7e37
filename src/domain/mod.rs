// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域层模块
///
/// 该模块包含系统的核心业务逻辑，包括：
/// - 领域模型（models）：线索、候选记录和采集任务摘要
/// - 仓库接口（repositories）：线索存储的抽象接口
/// - 服务（services）：查询规范化、列表解析、去重和优先级分类
///
/// 领域层不依赖于任何外部实现，浏览器和数据库都通过特质接入。
pub mod models;
pub mod repositories;
pub mod services;
