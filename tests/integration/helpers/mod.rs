// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use leadrs::application::use_cases::ingest_leads::{IngestionPipeline, PipelineConfig};
use leadrs::config::settings::DatabaseSettings;
use leadrs::domain::models::lead::{Candidate, Lead};
use leadrs::domain::repositories::lead_repository::{LeadRepository, RepositoryError};
use leadrs::engines::browser_session::SessionConfig;
use leadrs::engines::traits::{BrowserDriver, PageHandle, SessionError};
use leadrs::infrastructure::database::connection;
use leadrs::infrastructure::repositories::lead_repo_impl::LeadRepositoryImpl;
use leadrs::queue::job_gate::{BusyPolicy, JobGate};
use leadrs::utils::retry_policy::RetryPolicy;
use migration::{Migrator, MigratorTrait};
use scraper::{Html, Selector};
use sea_orm::{DatabaseConnection, DbErr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const QUERY: &str = "plumbers in Manchester";

/// 内存 SQLite 数据库，已执行迁移
pub async fn setup_db() -> Arc<DatabaseConnection> {
    let settings = DatabaseSettings {
        url: "sqlite::memory:".to_string(),
        max_connections: Some(1),
        min_connections: Some(1),
        connect_timeout: None,
        idle_timeout: None,
    };

    let db = connection::create_pool(&settings)
        .await
        .expect("Failed to open in-memory database");
    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");
    Arc::new(db)
}

pub async fn setup_repository() -> Arc<LeadRepositoryImpl> {
    Arc::new(LeadRepositoryImpl::new(setup_db().await))
}

/// 毫秒级的会话配置，测试中不做真实等待
pub fn fast_session_config() -> SessionConfig {
    SessionConfig {
        navigation_timeout: Duration::from_millis(100),
        poll_interval: Duration::from_millis(5),
        max_expand_iterations: 6,
        stale_rounds: 2,
        action_delay: Duration::ZERO,
        action_jitter: Duration::ZERO,
        retry: RetryPolicy {
            max_retries: 2,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(2),
            enable_jitter: false,
            ..RetryPolicy::default()
        },
        ..SessionConfig::default()
    }
}

pub fn fast_pipeline_config() -> PipelineConfig {
    PipelineConfig {
        session: fast_session_config(),
        job_timeout: Duration::from_secs(5),
        max_results: 20,
        ..PipelineConfig::default()
    }
}

pub fn pipeline<R>(repository: Arc<R>, driver: &FakeDriver) -> IngestionPipeline<R>
where
    R: LeadRepository + 'static,
{
    pipeline_with(repository, driver, fast_pipeline_config())
}

pub fn pipeline_with<R>(
    repository: Arc<R>,
    driver: &FakeDriver,
    config: PipelineConfig,
) -> IngestionPipeline<R>
where
    R: LeadRepository + 'static,
{
    IngestionPipeline::new(
        repository,
        Arc::new(driver.clone()),
        JobGate::new(BusyPolicy::Queue, Duration::ZERO),
        config,
    )
}

// === Section: Page fixtures ===

/// 结果列表中的一个商家
#[derive(Debug, Clone)]
pub struct Listing {
    pub name: String,
    pub address: Option<String>,
    pub website: Option<String>,
}

impl Listing {
    pub fn new(name: &str, address: &str) -> Self {
        Self {
            name: name.to_string(),
            address: Some(address.to_string()),
            website: None,
        }
    }

    pub fn with_website(mut self, website: &str) -> Self {
        self.website = Some(website.to_string());
        self
    }

    fn card(&self) -> String {
        let address = self
            .address
            .as_ref()
            .map(|a| format!(r#"<span> · </span><span>{}</span>"#, a))
            .unwrap_or_default();
        let website = self
            .website
            .as_ref()
            .map(|w| format!(r#"<a data-value="Website" href="{}">Website</a>"#, w))
            .unwrap_or_default();

        format!(
            r#"<div class="Nv2PK"><a class="hfpxzc" aria-label="{name}" href="/maps/place/{slug}"></a>
               <div class="qBF1Pd fontHeadlineSmall">{name}</div>
               <div class="W4Efsd"><span>Plumber</span>{address}</div>{website}</div>"#,
            name = self.name,
            slug = self.name.replace(' ', "+"),
            address = address,
            website = website,
        )
    }
}

/// 渲染一个结果列表页面
pub fn results_page(listings: &[Listing], end_of_list: bool) -> String {
    let cards: String = listings.iter().map(Listing::card).collect();
    let end_marker = if end_of_list {
        r#"<div class="m6QErb"><span class="HlvSq">You've reached the end of the list.</span></div>"#
    } else {
        ""
    };
    format!(
        r#"<html><body><div role="main"><div role="feed" aria-label="Results for plumbers">{}{}</div></div></body></html>"#,
        cards, end_marker
    )
}

pub fn blocked_page() -> String {
    r#"<html><body><div id="infoDiv">Our systems have detected unusual traffic from your computer network.</div>
       <form id="captcha-form" action="index"><div class="g-recaptcha" data-sitekey="x"></div></form></body></html>"#
        .to_string()
}

/// Scenario A: three listings, two without a website
pub fn manchester_plumbers() -> Vec<Listing> {
    vec![
        Listing::new("Ace Plumbing", "12 High St, Manchester"),
        Listing::new("Bolt Heating", "4 Mill Lane, Salford"),
        Listing::new("Crane Drains", "88 Deansgate, Manchester")
            .with_website("https://cranedrains.co.uk"),
    ]
}

// === Section: Fake browser ===

/// 驱动调用统计
#[derive(Debug, Default)]
pub struct DriverStats {
    pub opened: AtomicUsize,
    pub closed: AtomicUsize,
    pub gotos: AtomicUsize,
    pub scrolls: AtomicUsize,
}

impl DriverStats {
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }
    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
    pub fn gotos(&self) -> usize {
        self.gotos.load(Ordering::SeqCst)
    }
    pub fn scrolls(&self) -> usize {
        self.scrolls.load(Ordering::SeqCst)
    }
}

/// 按脚本返回页面的假浏览器驱动
///
/// 每次滚动前进到下一个快照，停在最后一个
#[derive(Clone)]
pub struct FakeDriver {
    snapshots: Arc<Vec<String>>,
    url_override: Option<String>,
    goto_failures: Arc<AtomicUsize>,
    goto_delay: Duration,
    fail_launch: bool,
    pub stats: Arc<DriverStats>,
}

impl FakeDriver {
    pub fn new(snapshots: Vec<String>) -> Self {
        Self {
            snapshots: Arc::new(snapshots),
            url_override: None,
            goto_failures: Arc::new(AtomicUsize::new(0)),
            goto_delay: Duration::ZERO,
            fail_launch: false,
            stats: Arc::new(DriverStats::default()),
        }
    }

    pub fn serving(listings: &[Listing]) -> Self {
        Self::new(vec![results_page(listings, true)])
    }

    /// 前 `count` 次导航以超时失败
    pub fn with_goto_failures(self, count: usize) -> Self {
        self.goto_failures.store(count, Ordering::SeqCst);
        self
    }

    pub fn with_goto_delay(mut self, delay: Duration) -> Self {
        self.goto_delay = delay;
        self
    }

    pub fn with_url(mut self, url: &str) -> Self {
        self.url_override = Some(url.to_string());
        self
    }

    pub fn failing_launch() -> Self {
        Self {
            fail_launch: true,
            ..Self::new(Vec::new())
        }
    }
}

#[async_trait]
impl BrowserDriver for FakeDriver {
    async fn open(&self) -> Result<Box<dyn PageHandle>, SessionError> {
        if self.fail_launch {
            return Err(SessionError::Launch("chrome executable not found".to_string()));
        }
        self.stats.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakePage {
            driver: self.clone(),
            position: 0,
            url: None,
        }))
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

pub struct FakePage {
    driver: FakeDriver,
    position: usize,
    url: Option<String>,
}

impl FakePage {
    fn current_html(&self) -> String {
        if self.url.is_none() {
            return "<html><head></head><body></body></html>".to_string();
        }
        self.driver
            .snapshots
            .get(self.position)
            .cloned()
            .unwrap_or_default()
    }
}

fn count_matches(html: &str, css: &str) -> Result<usize, SessionError> {
    let selector =
        Selector::parse(css).map_err(|e| SessionError::Cdp(format!("bad selector: {:?}", e)))?;
    Ok(Html::parse_document(html).select(&selector).count())
}

#[async_trait]
impl PageHandle for FakePage {
    async fn goto(&mut self, url: &str) -> Result<(), SessionError> {
        self.driver.stats.gotos.fetch_add(1, Ordering::SeqCst);
        if !self.driver.goto_delay.is_zero() {
            tokio::time::sleep(self.driver.goto_delay).await;
        }

        let failures = &self.driver.goto_failures;
        if failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(SessionError::Timeout("Request timed out.".to_string()));
        }

        self.url = Some(url.to_string());
        self.position = 0;
        Ok(())
    }

    async fn count(&mut self, selector: &str) -> Result<usize, SessionError> {
        let html = self.current_html();
        count_matches(&html, selector)
    }

    async fn scroll_to_end(&mut self, _selector: &str) -> Result<(), SessionError> {
        self.driver.stats.scrolls.fetch_add(1, Ordering::SeqCst);
        let last = self.driver.snapshots.len().saturating_sub(1);
        self.position = (self.position + 1).min(last);
        Ok(())
    }

    async fn content(&mut self) -> Result<String, SessionError> {
        Ok(self.current_html())
    }

    async fn current_url(&mut self) -> Result<Option<String>, SessionError> {
        Ok(self.driver.url_override.clone().or_else(|| self.url.clone()))
    }

    async fn close(&mut self) -> Result<(), SessionError> {
        self.driver.stats.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// === Section: Failing repository ===

/// 对指定名称的线索写入失败，其余委托给真实仓库
pub struct FlakyRepository<R> {
    pub inner: Arc<R>,
    pub fail_on: String,
    pub fail_lookups: bool,
}

#[async_trait]
impl<R> LeadRepository for FlakyRepository<R>
where
    R: LeadRepository,
{
    async fn exists(
        &self,
        normalized_name: &str,
        normalized_address: &str,
    ) -> Result<bool, RepositoryError> {
        if self.fail_lookups {
            return Err(DbErr::Custom("connection refused".to_string()).into());
        }
        self.inner.exists(normalized_name, normalized_address).await
    }

    async fn create(&self, candidate: &Candidate) -> Result<Lead, RepositoryError> {
        if candidate.name == self.fail_on {
            return Err(DbErr::Custom("disk full".to_string()).into());
        }
        self.inner.create(candidate).await
    }

    async fn list(&self, high_priority_only: bool) -> Result<Vec<Lead>, RepositoryError> {
        self.inner.list(high_priority_only).await
    }
}
