// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// 请求体中原始查询的字符数上限
///
/// 规范化后的长度限制由查询规范化器负责，这里只拒绝明显异常的请求体
pub const MAX_RAW_QUERY_CHARS: u64 = 4096;

/// 线索采集请求
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct ScrapeLeadsRequestDto {
    /// 自由文本查询，例如 "plumbers in Manchester"
    #[validate(length(max = MAX_RAW_QUERY_CHARS))]
    pub query: String,
}

/// 线索列表查询参数
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ListLeadsQueryDto {
    /// 只返回没有网站的线索
    #[serde(default)]
    pub high_priority_only: bool,
}
