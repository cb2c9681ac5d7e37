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

use async_trait::async_trait;
use thiserror::Error;

/// 浏览器会话错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// 超时（导航或等待内容）
    #[error("Timeout: {0}")]
    Timeout(String),
    /// 暂时性故障（连接中断、空响应）
    #[error("Transient failure: {0}")]
    Transient(String),
    /// 页面出现反自动化验证
    #[error("Blocked: {0}")]
    Blocked(String),
    /// 无法启动或连接浏览器
    #[error("Launch failed: {0}")]
    Launch(String),
    /// 其他 CDP 错误
    #[error("CDP error: {0}")]
    Cdp(String),
}

impl SessionError {
    /// 判断错误是否可重试
    ///
    /// # 返回值
    ///
    /// 超时和暂时性故障可重试；被拦截永远不重试
    pub fn is_retryable(&self) -> bool {
        matches!(self, SessionError::Timeout(_) | SessionError::Transient(_))
    }
}

/// 浏览器驱动特质
///
/// 每次调用 `open` 都获取一个新的浏览器页面，由调用方负责关闭
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    /// 获取浏览器页面
    async fn open(&self) -> Result<Box<dyn PageHandle>, SessionError>;

    /// 驱动名称
    fn name(&self) -> &'static str;
}

/// 浏览器页面句柄
#[async_trait]
pub trait PageHandle: Send {
    /// 导航到指定地址
    async fn goto(&mut self, url: &str) -> Result<(), SessionError>;
    /// 统计匹配选择器的元素数量
    async fn count(&mut self, selector: &str) -> Result<usize, SessionError>;
    /// 将匹配选择器的滚动容器滚到底部；容器不存在时滚动整个窗口
    async fn scroll_to_end(&mut self, selector: &str) -> Result<(), SessionError>;
    /// 当前渲染后的 HTML
    async fn content(&mut self) -> Result<String, SessionError>;
    /// 当前页面地址
    async fn current_url(&mut self) -> Result<Option<String>, SessionError>;
    /// 释放页面及其浏览器，重复调用无副作用
    async fn close(&mut self) -> Result<(), SessionError>;
}
