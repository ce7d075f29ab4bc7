//! 应用入口 - 编排层
//!
//! ## 职责
//!
//! 管理应用生命周期：初始化日志、获取浏览会话、确定报告页、运行提取、输出统计。
//!
//! ## 浏览器模式
//!
//! - **附加**（默认）：连接调试端口上操作员已登录的浏览器，选中报告页所在标签页
//! - **启动**：打开新浏览器进入门户，等待操作员登录并打开报告页后按回车
//!
//! Ctrl-C 只设置取消标志，当前题目写完后停止。

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use crate::config::Config;
use crate::events::TracingEventSink;
use crate::infrastructure::chrome_session::REPORT_PAGE_TOKEN;
use crate::infrastructure::ChromeSession;
use crate::models::RunSummary;
use crate::orchestrator::{CancelFlag, ExtractionOrchestrator};
use crate::utils::logging;

/// 应用主结构
pub struct App {
    config: Config,
    log_file: Option<PathBuf>,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        let log_file = logging::init(&config)?;
        logging::log_startup(&config);

        Ok(Self { config, log_file })
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<RunSummary> {
        let (session, report_url) = self.open_session().await?;

        let cancel = CancelFlag::new();
        let ctrl_c = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("⏹️ 收到 Ctrl-C，当前题目完成后停止");
                    cancel.cancel();
                }
            })
        };

        let orchestrator = ExtractionOrchestrator::new(session, TracingEventSink, &self.config)?;
        let result = orchestrator
            .run(&report_url, Path::new(&self.config.output_csv), &cancel)
            .await;
        ctrl_c.abort();

        let summary = result?;
        logging::print_final_stats(&summary, self.log_file.as_deref());
        Ok(summary)
    }

    /// 获取浏览会话和报告页地址
    async fn open_session(&self) -> Result<(ChromeSession, String)> {
        if self.config.launch_browser {
            info!("🖥️ 启动浏览器: {}", self.config.portal_base_url);
            let session =
                ChromeSession::launch(&self.config.portal_base_url, self.config.headless).await?;

            wait_for_operator().await?;

            let report_url = match &self.config.report_url {
                Some(url) => url.clone(),
                None => session
                    .current_url()
                    .await?
                    .context("无法读取当前页面地址")?,
            };
            Ok((session, report_url))
        } else {
            info!("🔗 连接浏览器调试端口: {}", self.config.browser_debug_port);
            let session = ChromeSession::attach(
                self.config.browser_debug_port,
                self.config.report_url.as_deref(),
            )
            .await?;

            let report_url = match &self.config.report_url {
                Some(url) => url.clone(),
                None => {
                    let url = session.current_url().await?.unwrap_or_default();
                    if !url.contains(REPORT_PAGE_TOKEN) {
                        bail!(
                            "未找到报告页（{}），请先在浏览器中打开 \"Primary Mark by Question\" 报告，或通过 --report-url 指定",
                            REPORT_PAGE_TOKEN
                        );
                    }
                    url
                }
            };
            Ok((session, report_url))
        }
    }
}

/// 等待操作员在浏览器中登录并打开报告页
async fn wait_for_operator() -> Result<()> {
    info!("{}", "─".repeat(60));
    info!("👉 请在浏览器中登录 ExamSys，打开 \"Primary Mark by Question\" 报告页");
    info!("👉 完成后回到此处按回车继续");
    info!("{}", "─".repeat(60));

    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await
        .context("读取终端输入失败")?;
    Ok(())
}
