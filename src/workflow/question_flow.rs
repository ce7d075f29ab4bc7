//! 题目处理流程 - 流程层
//!
//! 核心职责：定义"一道题"的完整处理流程
//!
//! 流程顺序：
//! 1. 打开批改页，等待学生答案块出现（失败 → 跳过）
//! 2. 取快照，提取全部学生答案块
//! 3. 归一化分数，逐行写入 CSV

use std::io::Write;

use tracing::debug;

use crate::error::Result;
use crate::events::{EventSink, ExtractionEvent};
use crate::infrastructure::BrowserSession;
use crate::models::{ExtractionRun, RunState};
use crate::services::{mark_normalizer, BlockExtractor, CsvSink, PageNavigator};
use crate::workflow::question_ctx::QuestionCtx;

/// 单题处理结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionOutcome {
    /// 已提取，附学生数
    Extracted { students: usize },
    /// 页面未就绪，跳过
    Skipped { reason: String },
}

/// 题目处理流程
///
/// - 编排单题的导航、提取、写入
/// - 不持有会话和输出文件，由编排层传入
pub struct QuestionFlow {
    navigator: PageNavigator,
    extractor: BlockExtractor,
    ready_marker: String,
}

impl QuestionFlow {
    pub fn new(navigator: PageNavigator, extractor: BlockExtractor, ready_marker: impl Into<String>) -> Self {
        Self {
            navigator,
            extractor,
            ready_marker: ready_marker.into(),
        }
    }

    /// 处理一道题
    ///
    /// 只有写入 CSV 失败会返回错误；页面问题记录为跳过。
    pub async fn run<S, E, W>(
        &self,
        session: &S,
        ctx: &QuestionCtx,
        sink: &mut CsvSink<W>,
        run: &mut ExtractionRun,
        events: &E,
    ) -> Result<QuestionOutcome>
    where
        S: BrowserSession,
        E: EventSink + ?Sized,
        W: Write,
    {
        events.emit(ExtractionEvent::QuestionStarted {
            index: ctx.index(),
            total: ctx.total,
        });

        run.transition(RunState::Navigating);
        if let Err(e) = self
            .navigator
            .load(session, ctx.url(), &self.ready_marker)
            .await
        {
            return Ok(self.skip(ctx, run, events, e.to_string()));
        }

        run.transition(RunState::Extracting);
        let html = match session.snapshot().await {
            Ok(html) => html,
            Err(e) => return Ok(self.skip(ctx, run, events, format!("读取页面失败: {:#}", e))),
        };
        let records = self.extractor.extract(&html, ctx.index());
        debug!("{} 提取到 {} 个答案块", ctx, records.len());

        events.emit(ExtractionEvent::StudentsFound {
            index: ctx.index(),
            count: records.len(),
        });

        run.transition(RunState::Writing);
        let students = records.len();
        for mut record in records {
            record.mark = mark_normalizer::normalize(&record.mark);
            sink.write(&record)?;
            run.rows_written += 1;
            run.record_student(record.identity());

            events.emit(ExtractionEvent::RowWritten {
                index: ctx.index(),
                answer_chars: record.student_answer.chars().count(),
                comment_chars: record.comment.chars().count(),
                student_id: record.student_id,
                student_label: record.student_label,
                mark: record.mark,
            });
        }
        sink.flush()?;
        run.questions_processed += 1;

        Ok(QuestionOutcome::Extracted { students })
    }

    fn skip<E: EventSink + ?Sized>(
        &self,
        ctx: &QuestionCtx,
        run: &mut ExtractionRun,
        events: &E,
        reason: String,
    ) -> QuestionOutcome {
        debug!("{} 跳过: {}", ctx, reason);
        run.questions_skipped += 1;
        events.emit(ExtractionEvent::QuestionFailed {
            index: ctx.index(),
            url: ctx.url().to_string(),
            reason: reason.clone(),
        });
        QuestionOutcome::Skipped { reason }
    }
}
