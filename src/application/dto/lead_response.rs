// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::lead::{Lead, LeadPriority};
use crate::domain::models::scrape_job::ScrapeJob;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 线索采集响应
///
/// 失败时 `success` 为 false、计数为 0，并携带错误信息和类别，
/// 以便调用方区分"没有结果"和"采集失败"
#[derive(Debug, Deserialize, Serialize)]
pub struct ScrapeLeadsResponseDto {
    pub success: bool,
    pub leads_added: usize,
    pub high_priority: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl ScrapeLeadsResponseDto {
    pub fn failure(error: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            success: false,
            leads_added: 0,
            high_priority: 0,
            error: Some(error.into()),
            kind: Some(kind.into()),
        }
    }
}

impl From<&ScrapeJob> for ScrapeLeadsResponseDto {
    fn from(job: &ScrapeJob) -> Self {
        Self {
            success: true,
            leads_added: job.leads_added,
            high_priority: job.high_priority,
            error: None,
            kind: None,
        }
    }
}

/// 线索
#[derive(Debug, Deserialize, Serialize)]
pub struct LeadResponseDto {
    pub id: i32,
    pub name: String,
    pub category: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub has_website: bool,
    pub rating: Option<f64>,
    pub review_count: Option<i32>,
    pub priority: LeadPriority,
    pub source: String,
    pub query: String,
    pub created_at: DateTime<Utc>,
}

impl From<Lead> for LeadResponseDto {
    fn from(lead: Lead) -> Self {
        let priority = lead.priority();
        Self {
            id: lead.id,
            name: lead.name,
            category: lead.category,
            address: lead.address,
            phone: lead.phone,
            website: lead.website,
            has_website: lead.has_website,
            rating: lead.rating,
            review_count: lead.review_count,
            priority,
            source: lead.source,
            query: lead.query,
            created_at: lead.created_at,
        }
    }
}
