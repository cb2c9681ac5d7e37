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

use crate::utils::errors::ScrapeError;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore, TryAcquireError};
use tracing::debug;

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// 已有任务运行时新任务的处理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BusyPolicy {
    /// 排队等待
    #[default]
    Queue,
    /// 立即拒绝
    Reject,
}

/// 进程级采集任务闸门
///
/// 单许可信号量保证同一时间只有一个任务持有浏览器；
/// 获取许可后再按最小任务间隔节流。
#[derive(Clone, Debug)]
pub struct JobGate {
    /// 单许可信号量
    semaphore: Arc<Semaphore>,
    /// 任务开始间隔限制，间隔为 0 时不启用
    limiter: Option<Arc<DirectRateLimiter>>,
    policy: BusyPolicy,
}

impl JobGate {
    /// 创建任务闸门
    ///
    /// # 参数
    ///
    /// * `policy` - 忙碌时的处理方式
    /// * `min_interval` - 两个任务开始之间的最小间隔
    pub fn new(policy: BusyPolicy, min_interval: Duration) -> Self {
        let limiter = Quota::with_period(min_interval)
            .map(|quota| Arc::new(RateLimiter::direct(quota)));

        Self {
            semaphore: Arc::new(Semaphore::new(1)),
            limiter,
            policy,
        }
    }

    /// 获取运行许可
    ///
    /// 许可在返回值被丢弃时释放
    ///
    /// # 返回值
    ///
    /// * `Ok(OwnedSemaphorePermit)` - 运行许可
    /// * `Err(ScrapeError::Busy)` - 策略为拒绝且已有任务在运行
    pub async fn acquire(&self) -> Result<OwnedSemaphorePermit, ScrapeError> {
        let permit = match self.policy {
            BusyPolicy::Reject => {
                self.semaphore
                    .clone()
                    .try_acquire_owned()
                    .map_err(|e| match e {
                        TryAcquireError::NoPermits | TryAcquireError::Closed => ScrapeError::Busy,
                    })?
            }
            BusyPolicy::Queue => {
                if self.semaphore.available_permits() == 0 {
                    debug!("Another scrape job is running, waiting for the gate");
                }
                self.semaphore
                    .clone()
                    .acquire_owned()
                    .await
                    .map_err(|_| ScrapeError::Busy)?
            }
        };

        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }

        Ok(permit)
    }

    /// 当前是否有任务在运行
    pub fn is_busy(&self) -> bool {
        self.semaphore.available_permits() == 0
    }

    pub fn policy(&self) -> BusyPolicy {
        self.policy
    }
}
