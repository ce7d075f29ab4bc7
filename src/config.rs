use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// 默认配置文件名（工作目录下）
pub const DEFAULT_CONFIG_FILE: &str = "examsys.toml";

/// 门户页面结构的 CSS 选择器
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PortalSelectors {
    /// 报告页上的题目链接
    pub question_link: String,
    /// 题目批改页文件名（链接 href 必须包含它）
    pub marking_page_token: String,
    /// 已批改的学生答案块
    pub student_block: String,
    /// 块内的学生标签
    pub label: String,
    /// 块内隐藏的学生 ID 输入框
    pub student_id: String,
    /// 块内的作答内容
    pub answer: String,
    /// 块内的分数下拉框
    pub mark: String,
    /// 块内的评语文本框
    pub comment: String,
}

impl Default for PortalSelectors {
    fn default() -> Self {
        Self {
            question_link: "a[href*='textbox_marking.php']".to_string(),
            marking_page_token: "textbox_marking".to_string(),
            student_block: "div.student-answer-block.marked".to_string(),
            label: "p.theme".to_string(),
            student_id: "input[id^='username']".to_string(),
            answer: "div.student_ans".to_string(),
            mark: "select[id^='mark']".to_string(),
            comment: "textarea[id^='comment']".to_string(),
        }
    }
}

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 门户根地址（相对链接以此为基准）
    pub portal_base_url: String,
    /// 报告页地址（"Primary Mark by Question"）；为空时由操作员在浏览器中选择
    pub report_url: Option<String>,
    /// 输出 CSV 文件
    pub output_csv: String,
    /// 浏览器调试端口（附加模式）
    pub browser_debug_port: u16,
    /// 是否自行启动浏览器（否则附加到已运行的浏览器）
    pub launch_browser: bool,
    /// 启动模式下是否无头
    pub headless: bool,
    /// 页面就绪等待超时（毫秒）
    pub ready_timeout_ms: u64,
    /// 就绪轮询间隔（毫秒）
    pub poll_interval_ms: u64,
    /// 每道题之后是否返回报告页
    pub return_to_report: bool,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 是否把日志同时写入文件
    pub mirror_log_file: bool,
    /// 日志目录
    pub log_dir: String,
    pub selectors: PortalSelectors,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            portal_base_url: "https://examsys.nottingham.ac.uk".to_string(),
            report_url: None,
            output_csv: "exam_feedback_by_question.csv".to_string(),
            browser_debug_port: 9222,
            launch_browser: false,
            headless: false,
            ready_timeout_ms: 10_000,
            poll_interval_ms: 250,
            return_to_report: false,
            verbose_logging: false,
            mirror_log_file: true,
            log_dir: ".logs".to_string(),
            selectors: PortalSelectors::default(),
        }
    }
}

impl Config {
    /// 加载配置：TOML 文件（可选）→ 环境变量
    pub fn load() -> Result<Self> {
        let path = std::env::var("EXAMSYS_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        let base = if Path::new(&path).exists() {
            Self::from_toml_file(Path::new(&path))?
        } else {
            Self::default()
        };
        Ok(base.with_env_overrides())
    }

    /// 从 TOML 文件读取，缺失字段使用默认值
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("无法读取配置文件: {}", path.display()))?;
        Self::from_toml_str(&content).with_context(|| format!("无法解析配置文件: {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// 用环境变量覆盖已有配置
    pub fn with_env_overrides(self) -> Self {
        Self {
            portal_base_url: std::env::var("PORTAL_BASE_URL").unwrap_or(self.portal_base_url),
            report_url: std::env::var("REPORT_URL").ok().or(self.report_url),
            output_csv: std::env::var("OUTPUT_CSV").unwrap_or(self.output_csv),
            browser_debug_port: env_parse("BROWSER_DEBUG_PORT").unwrap_or(self.browser_debug_port),
            launch_browser: env_parse("LAUNCH_BROWSER").unwrap_or(self.launch_browser),
            headless: env_parse("HEADLESS").unwrap_or(self.headless),
            ready_timeout_ms: env_parse("READY_TIMEOUT_MS").unwrap_or(self.ready_timeout_ms),
            poll_interval_ms: env_parse("POLL_INTERVAL_MS").unwrap_or(self.poll_interval_ms),
            return_to_report: env_parse("RETURN_TO_REPORT").unwrap_or(self.return_to_report),
            verbose_logging: env_parse("VERBOSE_LOGGING").unwrap_or(self.verbose_logging),
            mirror_log_file: env_parse("MIRROR_LOG_FILE").unwrap_or(self.mirror_log_file),
            log_dir: std::env::var("LOG_DIR").unwrap_or(self.log_dir),
            selectors: self.selectors,
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}
