//! 进度事件
//!
//! 编排层只负责发出事件，如何显示（终端、日志文件、界面）由 [`EventSink`] 的实现决定。

use std::sync::{Arc, Mutex};

use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{error, info, warn};

use crate::utils::truncate_text;

/// 提取过程中的事件
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExtractionEvent {
    /// 报告页标题
    PageTitleObserved { title: String },
    /// 报告页上发现的题目数
    QuestionsDiscovered { count: usize },
    /// 开始处理第 index/total 题
    QuestionStarted { index: usize, total: usize },
    /// 题目页上找到的学生答案块数
    StudentsFound { index: usize, count: usize },
    /// 题目页打开失败，已跳过
    QuestionFailed {
        index: usize,
        url: String,
        reason: String,
    },
    /// 写入一行
    RowWritten {
        index: usize,
        student_id: String,
        student_label: String,
        mark: String,
        answer_chars: usize,
        comment_chars: usize,
    },
    /// 运行结束
    RunComplete {
        questions: usize,
        students: usize,
        rows: usize,
        duration_seconds: f64,
        cancelled: bool,
    },
    /// 运行失败
    RunFailed { reason: String },
}

/// 事件接收方
pub trait EventSink {
    fn emit(&self, event: ExtractionEvent);
}

impl<T: EventSink + ?Sized> EventSink for Arc<T> {
    fn emit(&self, event: ExtractionEvent) {
        (**self).emit(event)
    }
}

/// 把事件写成日志行
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn emit(&self, event: ExtractionEvent) {
        match event {
            ExtractionEvent::PageTitleObserved { title } => info!("📄 页面标题: {}", truncate_text(&title, 80)),
            ExtractionEvent::QuestionsDiscovered { count } => info!("✅ 找到 {} 道题目", count),
            ExtractionEvent::QuestionStarted { index, total } => {
                info!("{}", "─".repeat(30));
                info!("➡️ 处理第 {}/{} 道题目", index, total);
            }
            ExtractionEvent::StudentsFound { index, count } => {
                info!("[题目 {}] 🧑‍🎓 找到 {} 名学生", index, count)
            }
            ExtractionEvent::QuestionFailed { index, url, reason } => {
                warn!("[题目 {}] ⚠️ 无法打开 {}: {}", index, url, truncate_text(&reason, 200))
            }
            ExtractionEvent::RowWritten {
                index,
                student_id,
                student_label,
                mark,
                answer_chars,
                comment_chars,
            } => info!(
                "[题目 {}]   ✅ {} ({}) | mark={} | ans={} chars | comm={} chars",
                index, student_label, student_id, mark, answer_chars, comment_chars
            ),
            ExtractionEvent::RunComplete {
                questions,
                students,
                rows,
                duration_seconds,
                cancelled,
            } => {
                if cancelled {
                    warn!("⏹️ 已按请求停止");
                }
                info!(
                    "🎉 完成: 题目 {} | 学生 {} | 行数 {} | 用时 {:.1}s",
                    questions, students, rows, duration_seconds
                );
            }
            ExtractionEvent::RunFailed { reason } => error!("❌ 提取失败: {}", reason),
        }
    }
}

/// 通过 tokio 通道转发事件（供界面消费）
///
/// 接收端已关闭时静默丢弃。
#[derive(Debug, Clone)]
pub struct ChannelEventSink {
    tx: UnboundedSender<ExtractionEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: UnboundedSender<ExtractionEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: ExtractionEvent) {
        let _ = self.tx.send(event);
    }
}

/// 在内存中保存全部事件
#[derive(Debug, Default, Clone)]
pub struct CollectingEventSink {
    events: Arc<Mutex<Vec<ExtractionEvent>>>,
}

impl CollectingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// 已收到事件的副本
    pub fn events(&self) -> Vec<ExtractionEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl EventSink for CollectingEventSink {
    fn emit(&self, event: ExtractionEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_sink_ignores_closed_receiver() {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        drop(rx);
        let sink = ChannelEventSink::new(tx);
        sink.emit(ExtractionEvent::QuestionsDiscovered { count: 3 });
    }

    #[test]
    fn events_serialize_with_type_tag() {
        let json = serde_json::to_value(ExtractionEvent::QuestionStarted { index: 2, total: 5 }).unwrap();
        assert_eq!(json["type"], "question_started");
        assert_eq!(json["total"], 5);
    }
}
