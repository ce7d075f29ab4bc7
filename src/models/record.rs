use serde::{Deserialize, Serialize};

/// CSV 表头（列顺序是对外契约）
pub const CSV_HEADER: [&str; 6] = [
    "question_number",
    "student_id",
    "student_label",
    "mark",
    "comment",
    "student_answer",
];

/// 报告页上发现的一道题
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionRef {
    /// 题号（从 1 开始，按文档顺序）
    pub ordinal: usize,
    /// 题目批改页的绝对地址
    pub url: String,
}

impl QuestionRef {
    pub fn new(ordinal: usize, url: impl Into<String>) -> Self {
        Self {
            ordinal,
            url: url.into(),
        }
    }
}

/// 一名学生在一道题上的作答记录
///
/// 字段顺序与 [`CSV_HEADER`] 一致，直接按 serde 序列化为一行。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentAnswerRecord {
    pub question_number: usize,
    /// 学生 ID（隐藏输入框，可能为空）
    pub student_id: String,
    /// 显示名称，缺失时为 "Student N"
    pub student_label: String,
    pub mark: String,
    pub comment: String,
    pub student_answer: String,
}

impl StudentAnswerRecord {
    /// 用于统计去重的学生身份：优先 ID，否则标签
    pub fn identity(&self) -> &str {
        if self.student_id.is_empty() {
            &self.student_label
        } else {
            &self.student_id
        }
    }
}
