use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;
use std::time::Instant;

use serde::Serialize;
use tracing::debug;

/// 编排状态机
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunState {
    Idle,
    Discovering,
    Navigating,
    Extracting,
    Writing,
    Finalizing,
    Done,
    Failed,
}

/// 运行的最终状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunStatus {
    /// 正常结束（包括中途取消）
    Completed,
    /// 报告页没有题目
    NoQuestionsFound,
    /// 致命错误
    Failed,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Completed => write!(f, "completed"),
            RunStatus::NoQuestionsFound => write!(f, "no-questions-found"),
            RunStatus::Failed => write!(f, "failed"),
        }
    }
}

/// 一次提取运行的状态
#[derive(Debug)]
pub struct ExtractionRun {
    pub report_url: String,
    pub output_path: PathBuf,
    pub questions_discovered: usize,
    pub questions_processed: usize,
    pub questions_skipped: usize,
    pub rows_written: usize,
    pub cancelled: bool,
    state: RunState,
    students: HashSet<String>,
    started_at: Instant,
}

impl ExtractionRun {
    pub fn new(report_url: impl Into<String>, output_path: impl Into<PathBuf>) -> Self {
        Self {
            report_url: report_url.into(),
            output_path: output_path.into(),
            questions_discovered: 0,
            questions_processed: 0,
            questions_skipped: 0,
            rows_written: 0,
            cancelled: false,
            state: RunState::Idle,
            students: HashSet::new(),
            started_at: Instant::now(),
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn transition(&mut self, next: RunState) {
        debug!("状态切换: {:?} → {:?}", self.state, next);
        self.state = next;
    }

    /// 记录一个学生（按 ID 或标签去重）
    pub fn record_student(&mut self, identity: &str) {
        if !self.students.contains(identity) {
            self.students.insert(identity.to_string());
        }
    }

    pub fn students_seen(&self) -> usize {
        self.students.len()
    }

    /// 结束运行并生成摘要
    pub fn finish(&mut self, status: RunStatus) -> RunSummary {
        self.transition(match status {
            RunStatus::Completed => RunState::Done,
            RunStatus::NoQuestionsFound | RunStatus::Failed => RunState::Failed,
        });

        RunSummary {
            status,
            report_url: self.report_url.clone(),
            output_path: self.output_path.clone(),
            questions_discovered: self.questions_discovered,
            questions_processed: self.questions_processed,
            questions_skipped: self.questions_skipped,
            students_seen: self.students_seen(),
            rows_written: self.rows_written,
            cancelled: self.cancelled,
            duration_seconds: self.started_at.elapsed().as_secs_f64(),
        }
    }
}

/// 运行摘要
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub status: RunStatus,
    pub report_url: String,
    pub output_path: PathBuf,
    pub questions_discovered: usize,
    pub questions_processed: usize,
    pub questions_skipped: usize,
    pub students_seen: usize,
    pub rows_written: usize,
    pub cancelled: bool,
    pub duration_seconds: f64,
}
