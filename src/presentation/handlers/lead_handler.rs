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

use axum::{
    extract::{Extension, Query},
    Json,
};
use std::sync::Arc;
use tracing::info;
use validator::Validate;

use crate::{
    application::{
        dto::{
            lead_request::{ListLeadsQueryDto, ScrapeLeadsRequestDto, MAX_RAW_QUERY_CHARS},
            lead_response::{LeadResponseDto, ScrapeLeadsResponseDto},
        },
        use_cases::ingest_leads::IngestionPipeline,
    },
    domain::repositories::lead_repository::LeadRepository,
    presentation::errors::AppError,
    utils::errors::{InvalidQueryError, ScrapeError},
};

/// 根据查询采集线索
///
/// 同步执行一次完整的采集任务。请求体只做原始长度上限检查，
/// 空查询和规范化后超长的查询由流水线拒绝
pub async fn scrape_leads<R>(
    Extension(pipeline): Extension<Arc<IngestionPipeline<R>>>,
    Json(payload): Json<ScrapeLeadsRequestDto>,
) -> Result<Json<ScrapeLeadsResponseDto>, AppError>
where
    R: LeadRepository + 'static,
{
    info!("Received scrape request for query: {}", payload.query);

    if payload.validate().is_err() {
        let error = InvalidQueryError::TooLong {
            length: payload.query.chars().count(),
            max: MAX_RAW_QUERY_CHARS as usize,
        };
        return Err(ScrapeError::from(error).into());
    }

    let job = pipeline.run(&payload.query).await?;
    Ok(Json(ScrapeLeadsResponseDto::from(&job)))
}

/// 列出已入库线索，可只返回高优先级线索
pub async fn list_leads<R>(
    Extension(pipeline): Extension<Arc<IngestionPipeline<R>>>,
    Query(params): Query<ListLeadsQueryDto>,
) -> Result<Json<Vec<LeadResponseDto>>, AppError>
where
    R: LeadRepository + 'static,
{
    let leads = pipeline.list_leads(params.high_priority_only).await?;
    Ok(Json(leads.into_iter().map(LeadResponseDto::from).collect()))
}
