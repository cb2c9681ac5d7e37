// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::BrowserSettings;
use crate::engines::traits::{BrowserDriver, PageHandle, SessionError};
use async_trait::async_trait;
use chromiumoxide::error::CdpError;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Chromium 浏览器驱动
///
/// 每次 `open` 都启动（或连接）一个独立的浏览器，不在任务之间共享。
pub struct ChromiumDriver {
    settings: BrowserSettings,
}

impl ChromiumDriver {
    pub fn new(settings: BrowserSettings) -> Self {
        Self { settings }
    }

    fn launch_config(&self) -> Result<BrowserConfig, SessionError> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .request_timeout(Duration::from_secs(self.settings.request_timeout_secs))
            .window_size(self.settings.window_width, self.settings.window_height);

        // Production environment setup
        builder = builder
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-blink-features=AutomationControlled");

        if !self.settings.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &self.settings.chrome_executable {
            builder = builder.chrome_executable(path);
        }

        builder.build().map_err(SessionError::Launch)
    }

    async fn start_browser(&self) -> Result<(Browser, JoinHandle<()>, bool), SessionError> {
        let (browser, mut handler, owns_browser) =
            if let Some(url) = &self.settings.remote_debugging_url {
                tracing::info!("Connecting to remote Chrome instance at: {}", url);
                let (browser, handler) = Browser::connect(url).await.map_err(|e| {
                    SessionError::Launch(format!("Failed to connect to remote Chrome: {}", e))
                })?;
                (browser, handler, false)
            } else {
                let (browser, handler) = Browser::launch(self.launch_config()?)
                    .await
                    .map_err(|e| SessionError::Launch(e.to_string()))?;
                (browser, handler, true)
            };

        // Spawn a handler to process browser events
        let handler_task = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        Ok((browser, handler_task, owns_browser))
    }
}

#[async_trait]
impl BrowserDriver for ChromiumDriver {
    async fn open(&self) -> Result<Box<dyn PageHandle>, SessionError> {
        let (browser, handler_task, owns_browser) = self.start_browser().await?;

        let mut handle = ChromiumPage {
            browser: Some(browser),
            page: None,
            handler_task,
            owns_browser,
        };

        let page = match handle.new_page(self.settings.user_agent.as_deref()).await {
            Ok(page) => page,
            Err(e) => {
                discard_page(&mut handle).await;
                return Err(e);
            }
        };
        handle.page = Some(page);

        Ok(Box::new(handle))
    }

    fn name(&self) -> &'static str {
        "chromium"
    }
}

/// 基于 chromiumoxide 的页面句柄
pub struct ChromiumPage {
    browser: Option<Browser>,
    page: Option<Page>,
    handler_task: JoinHandle<()>,
    owns_browser: bool,
}

impl ChromiumPage {
    async fn new_page(&self, user_agent: Option<&str>) -> Result<Page, SessionError> {
        let browser = self
            .browser
            .as_ref()
            .ok_or_else(|| SessionError::Launch("browser already closed".to_string()))?;

        let page = browser.new_page("about:blank").await.map_err(map_cdp_error)?;
        if let Some(agent) = user_agent {
            page.set_user_agent(agent).await.map_err(map_cdp_error)?;
        }
        Ok(page)
    }

    fn page(&self) -> Result<&Page, SessionError> {
        self.page
            .as_ref()
            .ok_or_else(|| SessionError::Cdp("page already closed".to_string()))
    }

    async fn evaluate<T: serde::de::DeserializeOwned>(
        &self,
        script: String,
    ) -> Result<T, SessionError> {
        self.page()?
            .evaluate(script)
            .await
            .map_err(map_cdp_error)?
            .into_value::<T>()
            .map_err(|e| SessionError::Cdp(format!("Unexpected script result: {}", e)))
    }
}

#[async_trait]
impl PageHandle for ChromiumPage {
    async fn goto(&mut self, url: &str) -> Result<(), SessionError> {
        self.page()?.goto(url).await.map_err(map_cdp_error)?;
        Ok(())
    }

    async fn count(&mut self, selector: &str) -> Result<usize, SessionError> {
        let script = format!(
            "document.querySelectorAll({}).length",
            js_string(selector)
        );
        self.evaluate::<usize>(script).await
    }

    async fn scroll_to_end(&mut self, selector: &str) -> Result<(), SessionError> {
        let script = format!(
            "(() => {{ const el = document.querySelector({}); \
             if (el) {{ el.scrollTop = el.scrollHeight; }} \
             else {{ window.scrollTo(0, document.body.scrollHeight); }} \
             return true; }})()",
            js_string(selector)
        );
        self.evaluate::<bool>(script).await.map(|_| ())
    }

    async fn content(&mut self) -> Result<String, SessionError> {
        self.page()?.content().await.map_err(map_cdp_error)
    }

    async fn current_url(&mut self) -> Result<Option<String>, SessionError> {
        self.page()?.url().await.map_err(map_cdp_error)
    }

    async fn close(&mut self) -> Result<(), SessionError> {
        let mut result = Ok(());

        if let Some(page) = self.page.take() {
            if let Err(e) = page.close().await {
                result = Err(map_cdp_error(e));
            }
        }

        if let Some(mut browser) = self.browser.take() {
            if self.owns_browser {
                if let Err(e) = browser.close().await {
                    if result.is_ok() {
                        result = Err(map_cdp_error(e));
                    }
                }
                if let Err(e) = browser.wait().await {
                    tracing::warn!("Failed to reap browser process: {}", e);
                }
            }
        }

        self.handler_task.abort();
        result
    }
}

impl Drop for ChromiumPage {
    fn drop(&mut self) {
        // Browser kills its child process on drop; the event loop must go too.
        self.handler_task.abort();
    }
}

/// 页面初始化失败后释放浏览器；释放失败只记录，原始错误优先返回
async fn discard_page(page: &mut dyn PageHandle) -> Option<SessionError> {
    match page.close().await {
        Ok(()) => None,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to release browser after page setup failure");
            Some(e)
        }
    }
}

fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

fn map_cdp_error(error: CdpError) -> SessionError {
    match error {
        CdpError::Timeout => SessionError::Timeout(error.to_string()),
        CdpError::Ws(_) | CdpError::Io(_) | CdpError::NoResponse => {
            SessionError::Transient(error.to_string())
        }
        other => SessionError::Cdp(other.to_string()),
    }
}
