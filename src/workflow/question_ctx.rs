//! 题目处理上下文
//!
//! 封装"我正在处理第几题、共几题"这一信息

use std::fmt::Display;

use crate::models::QuestionRef;

/// 题目处理上下文
#[derive(Debug, Clone)]
pub struct QuestionCtx {
    /// 当前题目
    pub question: QuestionRef,

    /// 本次运行发现的题目总数
    pub total: usize,
}

impl QuestionCtx {
    pub fn new(question: QuestionRef, total: usize) -> Self {
        Self { question, total }
    }

    /// 题号（从 1 开始）
    pub fn index(&self) -> usize {
        self.question.ordinal
    }

    pub fn url(&self) -> &str {
        &self.question.url
    }

    pub fn is_last(&self) -> bool {
        self.question.ordinal >= self.total
    }
}

impl Display for QuestionCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[题目 {}/{}]", self.question.ordinal, self.total)
    }
}
