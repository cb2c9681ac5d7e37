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

use crate::{
    domain::{
        models::{
            lead::Lead,
            scrape_job::{JobDiagnostics, ScrapeJob},
        },
        repositories::lead_repository::{LeadRepository, RepositoryError},
        services::{
            deduplication::DeduplicationFilter,
            listing_extractor::ListingExtractor,
            priority_classifier,
            query_normalizer::{QueryNormalizer, SearchQuery},
        },
    },
    engines::{
        browser_session::{BrowserSession, ExpandOutcome, SessionConfig},
        traits::{BrowserDriver, SessionError},
    },
    infrastructure::metrics,
    queue::job_gate::JobGate,
    utils::errors::ScrapeError,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, instrument, warn};
use url::Url;

/// 采集流水线配置
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub normalizer: QueryNormalizer,
    pub session: SessionConfig,
    /// 浏览器阶段（打开、导航、滚动、快照）的总时限
    pub job_timeout: Duration,
    /// 单个任务最多处理的候选数，0 表示不限制
    pub max_results: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            normalizer: QueryNormalizer::default(),
            session: SessionConfig::default(),
            job_timeout: Duration::from_secs(120),
            max_results: 20,
        }
    }
}

/// 浏览器阶段的产物
struct RenderedResults {
    html: String,
    expand: ExpandOutcome,
}

/// 线索采集流水线
///
/// 依次执行：查询规范化 → 获取任务闸门 → 浏览器阶段 → 提取 → 去重 → 分类 → 入库。
/// 浏览器阶段的任何失败都会让任务以零新增结束；入库阶段单条失败只计数。
pub struct IngestionPipeline<R> {
    repository: Arc<R>,
    driver: Arc<dyn BrowserDriver>,
    gate: JobGate,
    config: PipelineConfig,
}

impl<R> IngestionPipeline<R>
where
    R: LeadRepository + 'static,
{
    pub fn new(
        repository: Arc<R>,
        driver: Arc<dyn BrowserDriver>,
        gate: JobGate,
        config: PipelineConfig,
    ) -> Self {
        Self {
            repository,
            driver,
            gate,
            config,
        }
    }

    /// 执行一次采集任务
    ///
    /// # 参数
    ///
    /// * `raw_query` - 原始查询文本
    ///
    /// # 返回值
    ///
    /// * `Ok(ScrapeJob)` - 任务摘要
    /// * `Err(ScrapeError)` - 任务级失败，此时没有任何线索被写入
    #[instrument(name = "scrape_job", skip_all, fields(query = %raw_query))]
    pub async fn run(&self, raw_query: &str) -> Result<ScrapeJob, ScrapeError> {
        let result = self.execute(raw_query).await;

        match &result {
            Ok(job) => {
                metrics::record_job("success");
                metrics::record_leads_added(job.leads_added);
                info!(
                    leads_added = job.leads_added,
                    high_priority = job.high_priority,
                    listings_seen = job.diagnostics.listings_seen,
                    known_duplicates = job.diagnostics.known_duplicates,
                    batch_duplicates = job.diagnostics.batch_duplicates,
                    commit_failures = job.diagnostics.commit_failures,
                    elapsed_ms = job.elapsed.as_millis() as u64,
                    "Scrape job finished"
                );
            }
            Err(e) => {
                metrics::record_job(e.kind());
                error!(kind = e.kind(), error = %e, "Scrape job failed");
            }
        }

        result
    }

    /// 列出已入库线索
    pub async fn list_leads(&self, high_priority_only: bool) -> Result<Vec<Lead>, RepositoryError> {
        self.repository.list(high_priority_only).await
    }

    pub fn gate(&self) -> &JobGate {
        &self.gate
    }

    async fn execute(&self, raw_query: &str) -> Result<ScrapeJob, ScrapeError> {
        let started = Instant::now();

        // Invalid input must fail before any browser work
        let query = self.config.normalizer.normalize(raw_query)?;
        let base_url = Url::parse(&query.locator)
            .map_err(|e| ScrapeError::Browser(format!("invalid search locator: {}", e)))?;

        let _permit = self.gate.acquire().await?;

        let rendered = self.browse(&query).await?;
        let mut diagnostics = JobDiagnostics {
            expand_iterations: rendered.expand.iterations,
            ..Default::default()
        };

        let extractor = ListingExtractor::new(base_url, query.text.clone());
        let mut report = extractor.extract(&rendered.html);
        diagnostics.listings_seen = report.listings_seen;
        diagnostics.listings_skipped = report.skipped.len();
        metrics::record_listings_skipped(report.skipped.len());

        if self.config.max_results > 0 && report.candidates.len() > self.config.max_results {
            diagnostics.listings_truncated = report.candidates.len() - self.config.max_results;
            report.candidates.truncate(self.config.max_results);
        }

        let outcome = DeduplicationFilter::new()
            .filter(report.candidates, self.repository.as_ref())
            .await?;
        diagnostics.known_duplicates = outcome.known_duplicates;
        diagnostics.batch_duplicates = outcome.batch_duplicates;

        let mut leads = Vec::with_capacity(outcome.fresh.len());
        for candidate in outcome.fresh.into_iter().map(priority_classifier::classify) {
            match self.repository.create(&candidate).await {
                Ok(lead) => leads.push(lead),
                Err(e) => {
                    diagnostics.commit_failures += 1;
                    metrics::record_commit_failure();
                    warn!(name = %candidate.name, error = %e, "Failed to commit lead");
                }
            }
        }

        Ok(ScrapeJob::new(query.text, leads, diagnostics, started.elapsed()))
    }

    /// 浏览器阶段：在任务时限内打开会话、导航、滚动、检查拦截并获取快照
    ///
    /// 无论成功、失败还是超时，会话都会在返回前关闭
    async fn browse(&self, query: &SearchQuery) -> Result<RenderedResults, ScrapeError> {
        let ceiling = self.config.job_timeout;
        let mut slot: Option<BrowserSession> = None;

        let stage = tokio::time::timeout(ceiling, async {
            let session = slot.insert(
                BrowserSession::open(self.driver.as_ref(), self.config.session.clone()).await?,
            );
            session.navigate(&query.locator).await?;
            let expand = session.expand_results().await?;
            session.detect_block().await?;
            let html = session.snapshot().await?;
            Ok::<_, SessionError>(RenderedResults { html, expand })
        })
        .await;

        if let Some(mut session) = slot.take() {
            if let Err(e) = session.close().await {
                warn!(error = %e, "Failed to close browser session cleanly");
            }
        }

        match stage {
            Ok(result) => Ok(result?),
            Err(_) => Err(ScrapeError::JobTimeout(ceiling)),
        }
    }
}
