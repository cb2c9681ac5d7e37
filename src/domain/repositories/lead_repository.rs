// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::lead::{Candidate, Lead};
use async_trait::async_trait;
use sea_orm::DbErr;
use thiserror::Error;

/// 仓库错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// 数据库错误
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// 线索仓库特质
///
/// 定义线索数据访问接口。去重查询使用规范化后的身份键，
/// 见 [`crate::domain::models::lead::LeadIdentity`]。
#[async_trait]
pub trait LeadRepository: Send + Sync {
    /// 是否已存在相同身份的线索
    async fn exists(
        &self,
        normalized_name: &str,
        normalized_address: &str,
    ) -> Result<bool, RepositoryError>;
    /// 创建线索，分配 id 和 created_at
    async fn create(&self, candidate: &Candidate) -> Result<Lead, RepositoryError>;
    /// 列出线索
    async fn list(&self, high_priority_only: bool) -> Result<Vec<Lead>, RepositoryError>;
}
