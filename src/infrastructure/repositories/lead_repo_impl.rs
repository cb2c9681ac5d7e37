// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::domain::models::lead::{Candidate, Lead};
use crate::domain::repositories::lead_repository::{LeadRepository, RepositoryError};
use crate::infrastructure::database::entities::lead as lead_entity;
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::*;
use std::sync::Arc;

/// 线索仓库实现
pub struct LeadRepositoryImpl {
    /// 数据库连接
    db: Arc<DatabaseConnection>,
}

impl LeadRepositoryImpl {
    /// 创建新的线索仓库实例
    ///
    /// # 参数
    ///
    /// * `db` - 数据库连接
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl LeadRepository for LeadRepositoryImpl {
    async fn exists(
        &self,
        normalized_name: &str,
        normalized_address: &str,
    ) -> Result<bool, RepositoryError> {
        let count = lead_entity::Entity::find()
            .filter(lead_entity::Column::NameKey.eq(normalized_name))
            .filter(lead_entity::Column::AddressKey.eq(normalized_address))
            .count(self.db.as_ref())
            .await?;

        Ok(count > 0)
    }

    async fn create(&self, candidate: &Candidate) -> Result<Lead, RepositoryError> {
        let identity = candidate.identity();
        let active_model = lead_entity::ActiveModel {
            id: NotSet,
            name: Set(candidate.name.clone()),
            name_key: Set(identity.name_key),
            category: Set(candidate.category.clone()),
            address: Set(candidate.address.clone()),
            address_key: Set(identity.address_key),
            phone: Set(candidate.phone.clone()),
            website: Set(candidate.website.clone()),
            has_website: Set(candidate.has_website),
            rating: Set(candidate.rating),
            review_count: Set(candidate.review_count),
            source: Set(candidate.source.clone()),
            query: Set(candidate.query.clone()),
            created_at: Set(Utc::now()),
        };

        let model = active_model.insert(self.db.as_ref()).await?;
        Ok(model.into())
    }

    async fn list(&self, high_priority_only: bool) -> Result<Vec<Lead>, RepositoryError> {
        let mut query = lead_entity::Entity::find().order_by_asc(lead_entity::Column::Id);
        if high_priority_only {
            query = query.filter(lead_entity::Column::HasWebsite.eq(false));
        }

        let models = query.all(self.db.as_ref()).await?;
        Ok(models.into_iter().map(Lead::from).collect())
    }
}
