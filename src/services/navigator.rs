//! 页面导航 - 业务能力层
//!
//! 打开页面并等待就绪标记出现。只尝试一次，失败交给编排层决定是否跳过。

use std::time::Duration;

use tokio::time::{sleep, timeout, Instant};
use tracing::debug;

use crate::config::Config;
use crate::error::NavigationError;
use crate::infrastructure::BrowserSession;

/// 默认就绪超时
pub const DEFAULT_READY_TIMEOUT: Duration = Duration::from_millis(10_000);

/// 默认轮询间隔
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy)]
pub struct PageNavigator {
    ready_timeout: Duration,
    poll_interval: Duration,
}

impl Default for PageNavigator {
    fn default() -> Self {
        Self::new(DEFAULT_READY_TIMEOUT, DEFAULT_POLL_INTERVAL)
    }
}

impl PageNavigator {
    pub fn new(ready_timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            ready_timeout,
            poll_interval: poll_interval.max(Duration::from_millis(1)),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Duration::from_millis(config.ready_timeout_ms),
            Duration::from_millis(config.poll_interval_ms),
        )
    }

    pub fn ready_timeout(&self) -> Duration {
        self.ready_timeout
    }

    /// 打开 `url` 并等待 `ready_marker` 至少匹配一个元素
    pub async fn load<S: BrowserSession>(
        &self,
        session: &S,
        url: &str,
        ready_marker: &str,
    ) -> Result<(), NavigationError> {
        debug!("导航到: {}", url);

        match timeout(self.ready_timeout, session.goto(url)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                return Err(NavigationError::Failed {
                    url: url.to_string(),
                    reason: format!("{:#}", e),
                })
            }
            Err(_) => return Err(self.timeout_error(url, ready_marker)),
        }

        self.wait_for(session, url, ready_marker).await
    }

    /// 轮询就绪标记直到出现或超时
    ///
    /// 查询出错视为尚未就绪，继续轮询。
    async fn wait_for<S: BrowserSession>(
        &self,
        session: &S,
        url: &str,
        ready_marker: &str,
    ) -> Result<(), NavigationError> {
        let deadline = Instant::now() + self.ready_timeout;

        loop {
            match session.exists(ready_marker).await {
                Ok(true) => {
                    debug!("页面就绪: {}", url);
                    return Ok(());
                }
                Ok(false) => {}
                Err(e) => debug!("查询 '{}' 失败，继续等待: {}", ready_marker, e),
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(self.timeout_error(url, ready_marker));
            }
            sleep(self.poll_interval.min(deadline - now)).await;
        }
    }

    fn timeout_error(&self, url: &str, ready_marker: &str) -> NavigationError {
        NavigationError::Timeout {
            url: url.to_string(),
            marker: ready_marker.to_string(),
            timeout_ms: self.ready_timeout.as_millis() as u64,
        }
    }
}
