// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::repositories::lead_repository::RepositoryError;
use crate::engines::traits::SessionError;
use std::time::Duration;
use thiserror::Error;

/// 查询无效错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidQueryError {
    #[error("query cannot be empty")]
    Empty,
    #[error("query is too long: {length} characters (max {max})")]
    TooLong { length: usize, max: usize },
}

/// 单个商家条目的提取错误
///
/// 只会被记录和计数，不会中止其他条目的提取
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("listing #{index} has no name")]
    MissingName { index: usize },
}

/// 抓取任务错误
///
/// 这里的每一种错误都会让整个任务失败并返回零新增
#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("invalid query: {0}")]
    InvalidQuery(#[from] InvalidQueryError),

    #[error("navigation timed out: {0}")]
    NavigationTimeout(String),

    #[error("blocked by source: {0}")]
    Blocked(String),

    #[error("browser session unavailable: {0}")]
    SessionUnavailable(String),

    #[error("browser error: {0}")]
    Browser(String),

    #[error("scrape job exceeded {0:?}")]
    JobTimeout(Duration),

    #[error("another scrape job is already running")]
    Busy,

    #[error("lead store error: {0}")]
    Store(#[from] RepositoryError),
}

impl ScrapeError {
    /// 错误类别，供 API 调用方区分失败原因
    pub fn kind(&self) -> &'static str {
        match self {
            ScrapeError::InvalidQuery(_) => "invalid_query",
            ScrapeError::NavigationTimeout(_) => "navigation_timeout",
            ScrapeError::Blocked(_) => "blocked",
            ScrapeError::SessionUnavailable(_) | ScrapeError::Browser(_) => "browser",
            ScrapeError::JobTimeout(_) => "job_timeout",
            ScrapeError::Busy => "busy",
            ScrapeError::Store(_) => "store",
        }
    }
}

impl From<SessionError> for ScrapeError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Timeout(msg) => ScrapeError::NavigationTimeout(msg),
            SessionError::Blocked(reason) => ScrapeError::Blocked(reason),
            SessionError::Launch(msg) => ScrapeError::SessionUnavailable(msg),
            SessionError::Transient(msg) | SessionError::Cdp(msg) => ScrapeError::Browser(msg),
        }
    }
}
