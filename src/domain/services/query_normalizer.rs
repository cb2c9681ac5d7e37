// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::utils::errors::InvalidQueryError;

/// 查询最大长度
pub const MAX_QUERY_LENGTH: usize = 256;

/// 规范化后的搜索请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    /// 规范化查询文本（保留大小写）
    pub text: String,
    /// 搜索目标页面
    pub locator: String,
}

/// 查询规范化器
#[derive(Debug, Clone)]
pub struct QueryNormalizer {
    maps_base_url: String,
    language: Option<String>,
}

impl QueryNormalizer {
    /// 创建规范化器
    ///
    /// # 参数
    ///
    /// * `maps_base_url` - 地图站点根地址，例如 `https://www.google.com/maps`
    /// * `language` - 结果语言（`hl` 参数），为空时不指定
    pub fn new(maps_base_url: impl Into<String>, language: Option<String>) -> Self {
        Self {
            maps_base_url: maps_base_url.into().trim_end_matches('/').to_string(),
            language: language.filter(|l| !l.trim().is_empty()),
        }
    }

    /// 规范化原始查询
    ///
    /// 去掉首尾空白并把内部连续空白折叠成单个空格，然后生成搜索目标地址。
    pub fn normalize(&self, raw: &str) -> Result<SearchQuery, InvalidQueryError> {
        let text = raw.split_whitespace().collect::<Vec<_>>().join(" ");

        if text.is_empty() {
            return Err(InvalidQueryError::Empty);
        }

        let length = text.chars().count();
        if length > MAX_QUERY_LENGTH {
            return Err(InvalidQueryError::TooLong {
                length,
                max: MAX_QUERY_LENGTH,
            });
        }

        let mut locator = format!("{}/search/{}", self.maps_base_url, urlencoding::encode(&text));
        if let Some(language) = &self.language {
            locator.push_str("?hl=");
            locator.push_str(&urlencoding::encode(language));
        }

        Ok(SearchQuery { text, locator })
    }
}

impl Default for QueryNormalizer {
    fn default() -> Self {
        Self::new("https://www.google.com/maps", Some("en".to_string()))
    }
}
