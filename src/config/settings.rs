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

use crate::application::use_cases::ingest_leads::PipelineConfig;
use crate::domain::services::query_normalizer::QueryNormalizer;
use crate::engines::browser_session::SessionConfig;
use crate::queue::job_gate::BusyPolicy;
use crate::utils::retry_policy::RetryPolicy;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;

/// 应用程序配置设置
///
/// 包含服务器、数据库、浏览器、抓取和重试等所有配置项
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// 服务器配置
    pub server: ServerSettings,
    /// 数据库配置
    pub database: DatabaseSettings,
    /// 浏览器配置
    pub browser: BrowserSettings,
    /// 数据源配置
    pub source: SourceSettings,
    /// 抓取任务配置
    pub scraper: ScraperSettings,
    /// 重试配置
    pub retry: RetrySettings,
    /// 指标导出配置
    pub metrics: MetricsSettings,
}

/// 服务器配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    /// 服务器监听主机地址
    pub host: String,
    /// 服务器监听端口
    pub port: u16,
}

/// 数据库配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// 数据库连接URL
    pub url: String,
    /// 最大连接数
    pub max_connections: Option<u32>,
    /// 最小连接数
    pub min_connections: Option<u32>,
    /// 连接超时时间（秒）
    pub connect_timeout: Option<u64>,
    /// 空闲连接超时时间（秒）
    pub idle_timeout: Option<u64>,
}

/// 浏览器配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct BrowserSettings {
    /// 远程 Chrome 调试地址；设置后不再本地启动浏览器
    pub remote_debugging_url: Option<String>,
    /// Chrome 可执行文件路径
    pub chrome_executable: Option<String>,
    /// 是否无头模式
    pub headless: bool,
    /// 自定义 User-Agent
    pub user_agent: Option<String>,
    /// 单个 CDP 请求超时（秒）
    pub request_timeout_secs: u64,
    pub window_width: u32,
    pub window_height: u32,
}

/// 数据源配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct SourceSettings {
    /// 地图站点根地址
    pub maps_base_url: String,
    /// 界面语言（hl 参数）
    pub language: Option<String>,
}

/// 抓取任务配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct ScraperSettings {
    /// 等待主内容出现的上限（毫秒）
    pub navigation_timeout_ms: u64,
    /// 等待主内容时的轮询间隔（毫秒）
    pub content_poll_ms: u64,
    /// 滚动加载最大轮数
    pub max_scroll_iterations: u32,
    /// 连续多少轮无新结果后停止
    pub stale_rounds: u32,
    /// 滚动间隔（毫秒）
    pub action_delay_ms: u64,
    /// 滚动间隔随机抖动上限（毫秒）
    pub action_jitter_ms: u64,
    /// 两个任务开始之间的最小间隔（毫秒），0 表示不限制
    pub min_job_interval_ms: u64,
    /// 浏览器阶段的总时限（秒）
    pub job_timeout_secs: u64,
    /// 单个任务最多处理的结果数
    pub max_results: usize,
    /// 已有任务运行时的处理方式
    pub busy_policy: BusyPolicy,
}

/// 重试配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct RetrySettings {
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub jitter: bool,
}

/// 指标导出配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsSettings {
    pub enabled: bool,
    pub listen_addr: String,
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 依次叠加内置默认值、`config/default`、`config/{APP_ENVIRONMENT}` 和
    /// `LEADRS__` 前缀的环境变量
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        let builder = Self::defaults()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("LEADRS").separator("__"));

        builder.build()?.try_deserialize()
    }

    /// 内置默认值
    pub fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8000)?
            // Default DB pool settings
            .set_default("database.url", "sqlite://leads.db?mode=rwc")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 1)?
            .set_default("database.connect_timeout", 10)?
            .set_default("database.idle_timeout", 300)?
            // Default browser settings
            .set_default("browser.headless", true)?
            .set_default("browser.request_timeout_secs", 30)?
            .set_default("browser.window_width", 1280)?
            .set_default("browser.window_height", 900)?
            .set_default("source.maps_base_url", "https://www.google.com/maps")?
            .set_default("source.language", "en")?
            // Default scraper settings
            .set_default("scraper.navigation_timeout_ms", 15_000)?
            .set_default("scraper.content_poll_ms", 250)?
            .set_default("scraper.max_scroll_iterations", 10)?
            .set_default("scraper.stale_rounds", 2)?
            .set_default("scraper.action_delay_ms", 1_500)?
            .set_default("scraper.action_jitter_ms", 1_000)?
            .set_default("scraper.min_job_interval_ms", 5_000)?
            .set_default("scraper.job_timeout_secs", 120)?
            .set_default("scraper.max_results", 20)?
            .set_default("scraper.busy_policy", "queue")?
            // Default retry settings
            .set_default("retry.max_retries", 3)?
            .set_default("retry.initial_backoff_ms", 1_000)?
            .set_default("retry.max_backoff_ms", 30_000)?
            .set_default("retry.jitter", true)?
            .set_default("metrics.enabled", false)?
            .set_default("metrics.listen_addr", "0.0.0.0:9000")
    }

    /// 转换为会话控制器使用的重试策略
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.retry.max_retries,
            initial_backoff: Duration::from_millis(self.retry.initial_backoff_ms),
            max_backoff: Duration::from_millis(self.retry.max_backoff_ms),
            enable_jitter: self.retry.jitter,
            ..RetryPolicy::default()
        }
    }

    /// 转换为浏览器会话配置
    pub fn session_config(&self) -> SessionConfig {
        let scraper = &self.scraper;
        SessionConfig {
            navigation_timeout: Duration::from_millis(scraper.navigation_timeout_ms),
            poll_interval: Duration::from_millis(scraper.content_poll_ms),
            max_expand_iterations: scraper.max_scroll_iterations,
            stale_rounds: scraper.stale_rounds.max(1),
            action_delay: Duration::from_millis(scraper.action_delay_ms),
            action_jitter: Duration::from_millis(scraper.action_jitter_ms),
            retry: self.retry_policy(),
            ..SessionConfig::default()
        }
    }

    /// 转换为采集流水线配置
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            normalizer: QueryNormalizer::new(
                self.source.maps_base_url.clone(),
                self.source.language.clone(),
            ),
            session: self.session_config(),
            job_timeout: Duration::from_secs(self.scraper.job_timeout_secs),
            max_results: self.scraper.max_results,
        }
    }

    /// 两个任务开始之间的最小间隔
    pub fn min_job_interval(&self) -> Duration {
        Duration::from_millis(self.scraper.min_job_interval_ms)
    }
}
