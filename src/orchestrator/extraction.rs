//! 提取编排器 - 编排层
//!
//! ## 职责
//!
//! 给定报告页地址和输出文件，完成一次完整的提取运行。
//!
//! ## 核心功能
//!
//! 1. **打开输出**：先创建 CSV（写表头），失败则在任何导航之前终止
//! 2. **发现题目**：打开报告页，按文档顺序收集题目链接
//! 3. **逐题处理**：委托 `QuestionFlow`，单题失败只记为跳过
//! 4. **取消检查**：每道题开始前检查取消标志
//! 5. **收尾**：计算用时，关闭输出，发出摘要事件
//! 6. **释放会话**：无论成功失败都关闭浏览会话

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{ExtractError, NavigationError, Result};
use crate::events::{EventSink, ExtractionEvent};
use crate::infrastructure::BrowserSession;
use crate::models::{ExtractionRun, QuestionRef, RunState, RunStatus, RunSummary};
use crate::services::{BlockExtractor, CsvSink, PageNavigator, QuestionDiscovery};
use crate::workflow::{QuestionCtx, QuestionFlow};

/// 停止请求标志（题目之间检查）
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// 提取编排器
///
/// 在整个运行期间独占浏览会话，`run` 结束时关闭它。
pub struct ExtractionOrchestrator<S, E> {
    session: S,
    events: E,
    navigator: PageNavigator,
    discovery: QuestionDiscovery,
    flow: QuestionFlow,
    question_link_selector: String,
    return_to_report: bool,
}

impl<S, E> ExtractionOrchestrator<S, E>
where
    S: BrowserSession,
    E: EventSink,
{
    /// 创建编排器；选择器无效时返回错误（尚未进行任何 I/O）
    pub fn new(session: S, events: E, config: &Config) -> Result<Self> {
        let navigator = PageNavigator::from_config(config);
        let selectors = &config.selectors;
        let discovery = QuestionDiscovery::new(selectors, config.portal_base_url.clone())?;
        let extractor = BlockExtractor::new(selectors)?;

        Ok(Self {
            session,
            events,
            navigator,
            discovery,
            flow: QuestionFlow::new(navigator, extractor, selectors.student_block.clone()),
            question_link_selector: selectors.question_link.clone(),
            return_to_report: config.return_to_report,
        })
    }

    /// 执行一次完整运行
    pub async fn run(mut self, report_url: &str, output: &Path, cancel: &CancelFlag) -> Result<RunSummary> {
        let mut run = ExtractionRun::new(report_url, output);
        info!("🚀 开始提取: {}", report_url);

        let result = self.execute(&mut run, cancel).await;

        if let Err(e) = self.session.close().await {
            warn!("关闭浏览会话失败: {:#}", e);
        }

        match result {
            Ok(summary) => Ok(summary),
            Err(e) => {
                let status = match e {
                    ExtractError::NoQuestionsFound { .. } => RunStatus::NoQuestionsFound,
                    _ => RunStatus::Failed,
                };
                let summary = run.finish(status);
                debug!("运行终止: {:?}", summary);
                self.events.emit(ExtractionEvent::RunFailed {
                    reason: e.to_string(),
                });
                Err(e)
            }
        }
    }

    async fn execute(&mut self, run: &mut ExtractionRun, cancel: &CancelFlag) -> Result<RunSummary> {
        let mut sink = CsvSink::create(&run.output_path)?;

        run.transition(RunState::Discovering);
        let questions = self.discover(&run.report_url).await?;
        run.questions_discovered = questions.len();
        let total = questions.len();

        for question in questions {
            if cancel.is_cancelled() {
                info!("⏹️ 收到停止请求，已完成 {}/{} 道题目", question.ordinal - 1, total);
                run.cancelled = true;
                break;
            }

            let ctx = QuestionCtx::new(question, total);
            let outcome = self
                .flow
                .run(&self.session, &ctx, &mut sink, run, &self.events)
                .await?;
            debug!("{} {:?}", ctx, outcome);

            if self.return_to_report && !ctx.is_last() {
                self.back_to_report(&run.report_url).await;
            }
        }

        run.transition(RunState::Finalizing);
        let rows = sink.finish()?;
        debug!("CSV 已关闭，共 {} 行", rows);

        let summary = run.finish(RunStatus::Completed);
        self.events.emit(ExtractionEvent::RunComplete {
            questions: summary.questions_processed,
            students: summary.students_seen,
            rows: summary.rows_written,
            duration_seconds: summary.duration_seconds,
            cancelled: summary.cancelled,
        });
        Ok(summary)
    }

    /// 打开报告页并收集题目
    async fn discover(&self, report_url: &str) -> Result<Vec<QuestionRef>> {
        match self
            .navigator
            .load(&self.session, report_url, &self.question_link_selector)
            .await
        {
            Ok(()) => {}
            Err(NavigationError::Failed { url, reason }) => {
                return Err(ExtractError::ReportUnavailable { url, reason })
            }
            Err(e @ NavigationError::Timeout { .. }) => debug!("报告页未出现题目链接: {}", e),
        }

        match self.session.title().await {
            Ok(Some(title)) => self.events.emit(ExtractionEvent::PageTitleObserved { title }),
            Ok(None) => {}
            Err(e) => debug!("读取页面标题失败: {:#}", e),
        }

        let html = self
            .session
            .snapshot()
            .await
            .map_err(|e| ExtractError::ReportUnavailable {
                url: report_url.to_string(),
                reason: format!("{:#}", e),
            })?;

        let questions = self.discovery.discover(&html);
        if questions.is_empty() {
            return Err(ExtractError::NoQuestionsFound {
                report_url: report_url.to_string(),
            });
        }

        self.events.emit(ExtractionEvent::QuestionsDiscovered {
            count: questions.len(),
        });
        Ok(questions)
    }

    /// 返回报告页（失败只记录）
    async fn back_to_report(&self, report_url: &str) {
        if let Err(e) = self
            .navigator
            .load(&self.session, report_url, &self.question_link_selector)
            .await
        {
            warn!("返回报告页失败: {}", e);
        }
    }
}
