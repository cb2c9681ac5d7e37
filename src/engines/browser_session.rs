// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::engines::block_detection;
use crate::engines::traits::{BrowserDriver, PageHandle, SessionError};
use crate::utils::retry_policy::RetryPolicy;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// 搜索结果滚动容器
pub const FEED_SELECTOR: &str = "div[role='feed']";
/// 主内容：结果列表或单个地点详情的标题
pub const CONTENT_SELECTOR: &str = "div[role='feed'], div[role='main'] h1";
/// 结果列表中的每个地点链接
pub const LISTING_SELECTOR: &str = "div[role='feed'] a.hfpxzc";
/// "You've reached the end of the list."
pub const END_OF_LIST_SELECTOR: &str = "span.HlvSq";

/// 浏览器会话配置
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub content_selector: String,
    pub feed_selector: String,
    pub listing_selector: String,
    pub end_of_list_selector: String,
    /// 等待主内容出现的上限
    pub navigation_timeout: Duration,
    /// 等待主内容时的轮询间隔
    pub poll_interval: Duration,
    /// 滚动加载的最大轮数
    pub max_expand_iterations: u32,
    /// 连续多少轮没有新结果后停止滚动
    pub stale_rounds: u32,
    /// 两次滚动之间的基础间隔
    pub action_delay: Duration,
    /// 在基础间隔上追加的随机抖动上限
    pub action_jitter: Duration,
    pub retry: RetryPolicy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            content_selector: CONTENT_SELECTOR.to_string(),
            feed_selector: FEED_SELECTOR.to_string(),
            listing_selector: LISTING_SELECTOR.to_string(),
            end_of_list_selector: END_OF_LIST_SELECTOR.to_string(),
            navigation_timeout: Duration::from_secs(15),
            poll_interval: Duration::from_millis(250),
            max_expand_iterations: 10,
            stale_rounds: 2,
            action_delay: Duration::from_millis(1500),
            action_jitter: Duration::from_millis(1000),
            retry: RetryPolicy::standard(),
        }
    }
}

/// 页面动作节流器：基础间隔加均匀随机抖动
#[derive(Debug, Clone, Copy)]
pub struct ActionPacer {
    base: Duration,
    jitter: Duration,
}

impl ActionPacer {
    pub fn new(base: Duration, jitter: Duration) -> Self {
        Self { base, jitter }
    }

    /// 本次需要等待的时间
    pub fn next_delay(&self) -> Duration {
        let jitter_ms = self.jitter.as_millis() as u64;
        if jitter_ms == 0 {
            return self.base;
        }
        self.base + Duration::from_millis(rand::random_range(0..=jitter_ms))
    }

    pub async fn pause(&self) {
        let delay = self.next_delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

/// 滚动加载结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExpandOutcome {
    /// 实际执行的滚动轮数
    pub iterations: u32,
    /// 最终可见的结果条目数
    pub listings: usize,
}

/// 单个任务独占的浏览器会话
///
/// 由 [`BrowserSession::open`] 获取，任务结束时必须调用 [`BrowserSession::close`]。
/// 未关闭就被丢弃时，页面句柄自身的 `Drop` 负责回收浏览器进程。
pub struct BrowserSession {
    page: Box<dyn PageHandle>,
    config: SessionConfig,
    driver: &'static str,
    closed: bool,
}

impl BrowserSession {
    /// 通过驱动获取一个新的浏览器页面
    pub async fn open(
        driver: &dyn BrowserDriver,
        config: SessionConfig,
    ) -> Result<Self, SessionError> {
        let page = driver.open().await?;
        info!(driver = driver.name(), "Browser session opened");
        Ok(Self {
            page,
            config,
            driver: driver.name(),
            closed: false,
        })
    }

    /// 加载搜索页并等待主内容出现
    ///
    /// 内容始终未出现时先检查拦截页（返回 `Blocked`，不重试），否则返回 `Timeout`。
    /// 超时和暂时性故障按重试策略整体重试。
    pub async fn navigate(&mut self, locator: &str) -> Result<(), SessionError> {
        let target = locator.to_string();
        let content_selector = self.config.content_selector.clone();
        let timeout = self.config.navigation_timeout;
        let poll_interval = self.config.poll_interval;

        self.config
            .retry
            .run("navigate", self.page.as_mut(), move |page| {
                let target = target.clone();
                let content_selector = content_selector.clone();
                Box::pin(async move {
                    page.goto(&target).await?;
                    wait_for_content(page, &content_selector, timeout, poll_interval).await
                })
            })
            .await?;

        debug!(locator, driver = self.driver, "Primary content loaded");
        Ok(())
    }

    /// 滚动结果列表直到没有新结果、出现列表结束标记或达到最大轮数
    pub async fn expand_results(&mut self) -> Result<ExpandOutcome, SessionError> {
        let feed = self.count("count_feed", self.config.feed_selector.clone()).await?;
        if feed == 0 {
            // single place page, nothing to scroll
            debug!("No results feed present, skipping expansion");
            return Ok(ExpandOutcome::default());
        }

        let pacer = ActionPacer::new(self.config.action_delay, self.config.action_jitter);
        let mut outcome = ExpandOutcome {
            iterations: 0,
            listings: self
                .count("count_listings", self.config.listing_selector.clone())
                .await?,
        };
        let mut stale = 0;

        while outcome.iterations < self.config.max_expand_iterations {
            if self.end_of_list_reached().await? {
                debug!(listings = outcome.listings, "End of list marker reached");
                break;
            }

            pacer.pause().await;
            let visible = self.scroll_step().await?;
            outcome.iterations += 1;

            if visible > outcome.listings {
                outcome.listings = visible;
                stale = 0;
            } else {
                stale += 1;
                if stale >= self.config.stale_rounds {
                    debug!(stale, listings = outcome.listings, "No new listings, stopping expansion");
                    break;
                }
            }
        }

        if outcome.iterations >= self.config.max_expand_iterations {
            debug!(
                iterations = outcome.iterations,
                "Expansion stopped at iteration cap"
            );
        }

        Ok(outcome)
    }

    /// 检查当前页面是否为反自动化拦截页
    pub async fn detect_block(&mut self) -> Result<(), SessionError> {
        let url = self.page.current_url().await?;
        let html = self.page.content().await?;
        match block_detection::detect_block(url.as_deref(), &html) {
            Some(reason) => {
                warn!(reason = %reason, "Anti-automation challenge detected");
                Err(SessionError::Blocked(reason))
            }
            None => Ok(()),
        }
    }

    /// 当前渲染后的页面 HTML
    pub async fn snapshot(&mut self) -> Result<String, SessionError> {
        self.config
            .retry
            .run("snapshot", self.page.as_mut(), |page| {
                Box::pin(async move { page.content().await })
            })
            .await
    }

    /// 释放浏览器页面；重复调用无副作用
    pub async fn close(&mut self) -> Result<(), SessionError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        let result = self.page.close().await;
        info!(driver = self.driver, "Browser session closed");
        result
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    async fn count(&mut self, operation: &str, selector: String) -> Result<usize, SessionError> {
        self.config
            .retry
            .run(operation, self.page.as_mut(), move |page| {
                let selector = selector.clone();
                Box::pin(async move { page.count(&selector).await })
            })
            .await
    }

    async fn end_of_list_reached(&mut self) -> Result<bool, SessionError> {
        let markers = self
            .count("count_end_marker", self.config.end_of_list_selector.clone())
            .await?;
        Ok(markers > 0)
    }

    /// 单轮滚动：滚到底部后统计可见结果数
    async fn scroll_step(&mut self) -> Result<usize, SessionError> {
        let feed_selector = self.config.feed_selector.clone();
        let listing_selector = self.config.listing_selector.clone();

        self.config
            .retry
            .run("expand_results", self.page.as_mut(), move |page| {
                let feed_selector = feed_selector.clone();
                let listing_selector = listing_selector.clone();
                Box::pin(async move {
                    page.scroll_to_end(&feed_selector).await?;
                    page.count(&listing_selector).await
                })
            })
            .await
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        if !self.closed {
            warn!(driver = self.driver, "Browser session dropped without close");
        }
    }
}

/// 轮询等待主内容；每次未命中都检查是否被拦截
async fn wait_for_content(
    page: &mut dyn PageHandle,
    selector: &str,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<(), SessionError> {
    let deadline = Instant::now() + timeout;
    loop {
        if page.count(selector).await? > 0 {
            return Ok(());
        }

        let url = page.current_url().await?;
        let html = page.content().await?;
        if let Some(reason) = block_detection::detect_block(url.as_deref(), &html) {
            return Err(SessionError::Blocked(reason));
        }

        if Instant::now() >= deadline {
            return Err(SessionError::Timeout(format!(
                "'{}' did not appear within {}ms",
                selector,
                timeout.as_millis()
            )));
        }
        tokio::time::sleep(poll_interval).await;
    }
}
