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

use leadrs::application::use_cases::ingest_leads::IngestionPipeline;
use leadrs::config::settings::Settings;
use leadrs::engines::chromium_driver::ChromiumDriver;
use leadrs::engines::traits::BrowserDriver;
use leadrs::infrastructure::database::connection;
use leadrs::infrastructure::metrics;
use leadrs::infrastructure::repositories::lead_repo_impl::LeadRepositoryImpl;
use leadrs::presentation::routes;
use leadrs::queue::job_gate::JobGate;
use leadrs::utils::telemetry;
use migration::{Migrator, MigratorTrait};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

/// 主函数
///
/// 应用程序入口点，负责初始化所有组件并启动服务
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize logging
    telemetry::init_telemetry()?;
    info!("Starting leadrs...");

    // 2. Load configuration
    let settings = Settings::new()?;
    info!("Configuration loaded");

    if settings.metrics.enabled {
        metrics::init_metrics(&settings.metrics.listen_addr)?;
    }

    // 3. Connect to database
    let db = Arc::new(connection::create_pool(&settings.database).await?);

    // Run database migrations
    info!("Running database migrations...");
    Migrator::up(db.as_ref(), None).await?;
    info!("Database migrations applied");

    // 4. Assemble the ingestion pipeline
    let repository = Arc::new(LeadRepositoryImpl::new(db.clone()));
    let driver: Arc<dyn BrowserDriver> = Arc::new(ChromiumDriver::new(settings.browser.clone()));
    let gate = JobGate::new(settings.scraper.busy_policy, settings.min_job_interval());
    let pipeline = Arc::new(IngestionPipeline::new(
        repository,
        driver,
        gate,
        settings.pipeline_config(),
    ));

    // 5. Start HTTP server
    let app = routes::app(pipeline);

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
