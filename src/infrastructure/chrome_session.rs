//! 基于 chromiumoxide 的浏览会话

use anyhow::Result;
use chromiumoxide::Browser;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::browser;
use crate::infrastructure::{BrowserSession, JsExecutor};

/// 报告页（"Primary Mark by Question"）文件名片段，用于在已打开的标签页中定位
pub const REPORT_PAGE_TOKEN: &str = "textbox_select_q";

/// Chromium 会话
///
/// 附加模式下不关闭浏览器（那是操作员自己的窗口），只断开连接；
/// 启动模式下关闭整个浏览器进程。
pub struct ChromeSession {
    browser: Browser,
    executor: JsExecutor,
    handler_task: JoinHandle<()>,
    owns_browser: bool,
}

impl ChromeSession {
    /// 附加到调试端口上已运行的浏览器
    pub async fn attach(port: u16, report_url: Option<&str>) -> Result<Self> {
        let (browser, page, handler_task) =
            browser::connect_to_browser_and_page(port, Some(REPORT_PAGE_TOKEN), report_url).await?;
        Ok(Self {
            browser,
            executor: JsExecutor::new(page),
            handler_task,
            owns_browser: false,
        })
    }

    /// 启动新浏览器并打开门户
    pub async fn launch(portal_url: &str, headless: bool) -> Result<Self> {
        let (browser, page, handler_task) = browser::launch_browser(portal_url, headless).await?;
        Ok(Self {
            browser,
            executor: JsExecutor::new(page),
            handler_task,
            owns_browser: true,
        })
    }

    /// 当前标签页地址
    pub async fn current_url(&self) -> Result<Option<String>> {
        Ok(self.executor.page().url().await?)
    }
}

impl BrowserSession for ChromeSession {
    async fn goto(&self, url: &str) -> Result<()> {
        self.executor.page().goto(url).await?;
        Ok(())
    }

    async fn title(&self) -> Result<Option<String>> {
        Ok(self.executor.page().get_title().await?)
    }

    async fn exists(&self, selector: &str) -> Result<bool> {
        self.executor.query_exists(selector).await
    }

    async fn snapshot(&self) -> Result<String> {
        self.executor.snapshot_html().await
    }

    async fn close(&mut self) -> Result<()> {
        if self.owns_browser {
            debug!("关闭浏览器");
            if let Err(e) = self.browser.close().await {
                warn!("关闭浏览器失败: {}", e);
            }
            if let Err(e) = self.browser.wait().await {
                warn!("等待浏览器退出失败: {}", e);
            }
        } else {
            debug!("断开浏览器连接（保留操作员的窗口）");
        }
        self.handler_task.abort();
        Ok(())
    }
}
