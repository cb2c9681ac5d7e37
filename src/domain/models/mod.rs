// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// - 线索（lead）：已入库的商家记录及其未入库的候选形态
/// - 采集任务（scrape_job）：一次流水线执行的摘要
pub mod lead;
pub mod scrape_job;
