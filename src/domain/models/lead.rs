// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use deunicode::deunicode;
use serde::{Deserialize, Serialize};

/// 线索来源标识
pub const SOURCE_GOOGLE_MAPS: &str = "google_maps";

/// 线索优先级
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadPriority {
    /// 没有有效网站的商家
    High,
    /// 已有网站的商家
    Low,
}

/// 候选线索
///
/// 从页面中提取、尚未去重和入库的商家记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// 商家名称
    pub name: String,
    /// 商家类别
    pub category: Option<String>,
    /// 地址
    pub address: Option<String>,
    /// 电话
    pub phone: Option<String>,
    /// 网站 (规范化后的 http(s) URL)
    pub website: Option<String>,
    /// 是否拥有网站
    pub has_website: bool,
    /// 评分 (0-5)
    pub rating: Option<f64>,
    /// 评论数量
    pub review_count: Option<i32>,
    /// 来源标识
    pub source: String,
    /// 产生该线索的规范化查询
    pub query: String,
}

impl Candidate {
    /// 创建只有名称的候选线索
    pub fn new(name: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: None,
            address: None,
            phone: None,
            website: None,
            has_website: false,
            rating: None,
            review_count: None,
            source: SOURCE_GOOGLE_MAPS.to_string(),
            query: query.into(),
        }
    }

    /// 去重身份键
    pub fn identity(&self) -> LeadIdentity {
        LeadIdentity::new(&self.name, self.address.as_deref())
    }

    pub fn priority(&self) -> LeadPriority {
        if self.has_website {
            LeadPriority::Low
        } else {
            LeadPriority::High
        }
    }
}

/// 已入库的线索
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    pub id: i32,
    pub name: String,
    pub category: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub has_website: bool,
    pub rating: Option<f64>,
    pub review_count: Option<i32>,
    pub source: String,
    pub query: String,
    pub created_at: DateTime<Utc>,
}

impl Lead {
    pub fn priority(&self) -> LeadPriority {
        if self.has_website {
            LeadPriority::Low
        } else {
            LeadPriority::High
        }
    }
}

/// 线索身份键
///
/// 由规范化后的名称和地址组成，跨查询全局唯一
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LeadIdentity {
    pub name_key: String,
    pub address_key: String,
}

impl LeadIdentity {
    pub fn new(name: &str, address: Option<&str>) -> Self {
        Self {
            name_key: normalize_identity(name),
            address_key: address.map(normalize_identity).unwrap_or_default(),
        }
    }
}

/// 规范化身份字段
///
/// 转写为 ASCII、转小写，并去掉所有标点和空白
pub fn normalize_identity(value: &str) -> String {
    deunicode(value)
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}
