// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::use_cases::ingest_leads::IngestionPipeline;
use crate::domain::repositories::lead_repository::LeadRepository;
use crate::presentation::handlers::lead_handler;
use axum::{
    routing::{get, post},
    Extension, Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// 创建应用路由
///
/// 处理器通过 `Extension<Arc<IngestionPipeline<R>>>` 获取流水线，
/// 由调用方在外层挂载
///
/// # 返回值
///
/// 返回配置好的路由
pub fn routes<R>() -> Router
where
    R: LeadRepository + 'static,
{
    let public_routes = Router::new()
        .route("/", get(welcome))
        .route("/health", get(health_check))
        .route("/v1/version", get(version));

    let lead_routes = Router::new()
        .route("/scrape-leads", post(lead_handler::scrape_leads::<R>))
        .route("/leads", get(lead_handler::list_leads::<R>));

    Router::new().merge(public_routes).merge(lead_routes)
}

/// 创建完整应用：路由、流水线扩展、CORS 和请求追踪
pub fn app<R>(pipeline: Arc<IngestionPipeline<R>>) -> Router
where
    R: LeadRepository + 'static,
{
    routes::<R>().layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
            .layer(Extension(pipeline)),
    )
}

/// 欢迎信息
pub async fn welcome() -> Json<Value> {
    Json(json!({ "message": "Welcome to the Lead Finder API" }))
}

/// 健康检查端点
///
/// # 返回值
///
/// 返回"OK"字符串
pub async fn health_check() -> &'static str {
    "OK"
}

/// 版本信息端点
///
/// # 返回值
///
/// 返回应用版本号
pub async fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
