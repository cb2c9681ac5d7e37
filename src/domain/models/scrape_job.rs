// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::lead::Lead;
use std::time::Duration;

/// 单次抓取任务诊断信息
///
/// 被吸收的局部失败只在这里计数，不影响成功计数
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobDiagnostics {
    /// 页面上识别到的商家条目数
    pub listings_seen: usize,
    /// 因缺少名称等原因被跳过的条目数
    pub listings_skipped: usize,
    /// 因超过 max_results 被截断的条目数
    pub listings_truncated: usize,
    /// 与已入库线索重复的条目数
    pub known_duplicates: usize,
    /// 同批次内重复的条目数
    pub batch_duplicates: usize,
    /// 入库失败的条目数
    pub commit_failures: usize,
    /// 滚动加载的轮数
    pub expand_iterations: u32,
}

/// 抓取任务结果
#[derive(Debug, Clone)]
pub struct ScrapeJob {
    /// 规范化查询
    pub query: String,
    /// 本次新增的线索
    pub leads: Vec<Lead>,
    /// 新增线索数
    pub leads_added: usize,
    /// 新增线索中的高优先级数
    pub high_priority: usize,
    pub diagnostics: JobDiagnostics,
    pub elapsed: Duration,
}

impl ScrapeJob {
    pub fn new(
        query: String,
        leads: Vec<Lead>,
        diagnostics: JobDiagnostics,
        elapsed: Duration,
    ) -> Self {
        let leads_added = leads.len();
        let high_priority = leads.iter().filter(|lead| !lead.has_website).count();
        Self {
            query,
            leads,
            leads_added,
            high_priority,
            diagnostics,
            elapsed,
        }
    }

    /// 高优先级占比，仅在有新增线索时有意义
    pub fn high_priority_ratio(&self) -> Option<f64> {
        if self.leads_added == 0 {
            return None;
        }
        Some(self.high_priority as f64 / self.leads_added as f64)
    }
}
