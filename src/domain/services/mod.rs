// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域服务模块
///
/// 包含的服务：
/// - 查询规范化（query_normalizer）：原始查询文本到搜索地址
/// - 列表解析（listing_extractor）：渲染后的页面到候选记录
/// - 去重过滤（deduplication）：对照已入库线索剔除重复
/// - 优先级分类（priority_classifier）：按是否有网站标记优先级
pub mod deduplication;
pub mod listing_extractor;
pub mod priority_classifier;
pub mod query_normalizer;
