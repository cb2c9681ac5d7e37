// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::lead::{Candidate, LeadIdentity};
use crate::domain::repositories::lead_repository::{LeadRepository, RepositoryError};
use std::collections::HashSet;
use tracing::debug;

/// 去重结果
#[derive(Debug, Default)]
pub struct DeduplicationOutcome {
    /// 未入库且批次内首次出现的候选线索（保持提取顺序）
    pub fresh: Vec<Candidate>,
    /// 与已入库线索重复的数量
    pub known_duplicates: usize,
    /// 同批次内重复的数量
    pub batch_duplicates: usize,
}

/// 线索去重过滤器
///
/// 以规范化后的 (名称, 地址) 作为身份键，先在批次内折叠重复项
/// （保留先出现的一条），再向线索仓库确认是否已存在。
pub struct DeduplicationFilter {
    seen: HashSet<LeadIdentity>,
}

impl DeduplicationFilter {
    pub fn new() -> Self {
        Self {
            seen: HashSet::new(),
        }
    }

    /// 过滤重复候选线索
    ///
    /// # 参数
    ///
    /// * `candidates` - 按提取顺序排列的候选线索
    /// * `repository` - 线索仓库
    ///
    /// # 返回值
    ///
    /// * `Ok(DeduplicationOutcome)` - 去重结果
    /// * `Err(RepositoryError)` - 仓库查询失败
    pub async fn filter<R>(
        &mut self,
        candidates: Vec<Candidate>,
        repository: &R,
    ) -> Result<DeduplicationOutcome, RepositoryError>
    where
        R: LeadRepository + ?Sized,
    {
        let mut outcome = DeduplicationOutcome::default();

        for candidate in candidates {
            let identity = candidate.identity();

            if !self.seen.insert(identity.clone()) {
                debug!(name = %candidate.name, "Dropping in-batch duplicate");
                outcome.batch_duplicates += 1;
                continue;
            }

            if repository
                .exists(&identity.name_key, &identity.address_key)
                .await?
            {
                debug!(name = %candidate.name, "Dropping already known lead");
                outcome.known_duplicates += 1;
                continue;
            }

            outcome.fresh.push(candidate);
        }

        Ok(outcome)
    }
}

impl Default for DeduplicationFilter {
    fn default() -> Self {
        Self::new()
    }
}
