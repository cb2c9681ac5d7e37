// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::lead::Lead;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "leads")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub name_key: String,
    pub category: Option<String>,
    pub address: Option<String>,
    pub address_key: String,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub has_website: bool,
    #[sea_orm(column_type = "Double", nullable)]
    pub rating: Option<f64>,
    pub review_count: Option<i32>,
    pub source: String,
    pub query: String,
    pub created_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Lead {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            category: model.category,
            address: model.address,
            phone: model.phone,
            website: model.website,
            has_website: model.has_website,
            rating: model.rating,
            review_count: model.review_count,
            source: model.source,
            query: model.query,
            created_at: model.created_at,
        }
    }
}
