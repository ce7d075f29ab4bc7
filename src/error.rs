use std::path::PathBuf;

use thiserror::Error;

/// 提取流程错误
///
/// 只有这里列出的错误会终止一次运行；单题导航失败见 [`NavigationError`]，
/// 由编排层记录为跳过。
#[derive(Debug, Error)]
pub enum ExtractError {
    /// 报告页没有任何题目链接
    #[error("报告页未找到任何题目链接: {report_url}")]
    NoQuestionsFound { report_url: String },

    /// 报告页本身无法打开
    #[error("无法打开报告页 {url}: {reason}")]
    ReportUnavailable { url: String, reason: String },

    /// 输出文件无法创建或刷新
    #[error("无法写入输出文件 ({}): {source}", path.display())]
    SinkOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 写入 CSV 行失败
    #[error("写入 CSV 失败 ({}): {source}", path.display())]
    SinkWrite {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// 配置中的 CSS 选择器无法解析
    #[error("无效的 CSS 选择器 '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },
}

impl ExtractError {
    pub fn sink_open(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ExtractError::SinkOpen {
            path: path.into(),
            source,
        }
    }

    pub fn sink_write(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        ExtractError::SinkWrite {
            path: path.into(),
            source,
        }
    }
}

/// 单个页面导航失败（可跳过）
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NavigationError {
    /// 导航本身失败（网络错误、会话断开等）
    #[error("导航到 {url} 失败: {reason}")]
    Failed { url: String, reason: String },

    /// 就绪标记在超时时间内未出现
    #[error("等待 '{marker}' 超时 ({timeout_ms}ms): {url}")]
    Timeout {
        url: String,
        marker: String,
        timeout_ms: u64,
    },
}

impl NavigationError {
    pub fn url(&self) -> &str {
        match self {
            NavigationError::Failed { url, .. } | NavigationError::Timeout { url, .. } => url,
        }
    }
}

/// 提取流程结果类型
pub type Result<T> = std::result::Result<T, ExtractError>;
