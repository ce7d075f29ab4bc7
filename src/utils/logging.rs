//! 日志工具模块
//!
//! 提供日志初始化、日志文件和输出格式化的辅助函数

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{fmt::layer, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::models::RunSummary;

/// 初始化日志
///
/// 终端始终输出；`mirror_log_file` 打开时同时写入 `<log_dir>/examsys_log_<时间>.txt`。
/// `RUST_LOG` 优先于 `verbose_logging`。
///
/// # 返回
/// 日志文件路径（如有）
pub fn init(config: &Config) -> Result<Option<PathBuf>> {
    let default_level = if config.verbose_logging { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let (file_layer, log_path) = if config.mirror_log_file {
        let (file, path) = init_log_file(Path::new(&config.log_dir))?;
        let layer = layer()
            .with_ansi(false)
            .with_target(false)
            .with_writer(Mutex::new(file));
        (Some(layer), Some(path))
    } else {
        (None, None)
    };

    // 测试中可能已初始化过
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(layer().with_target(false))
        .with(file_layer)
        .try_init();

    Ok(log_path)
}

/// 创建带时间戳的日志文件并写入文件头
///
/// # 参数
/// - `log_dir`: 日志目录（不存在时创建）
///
/// # 返回
/// 以追加方式打开的文件及其路径
pub fn init_log_file(log_dir: &Path) -> Result<(File, PathBuf)> {
    fs::create_dir_all(log_dir)
        .with_context(|| format!("无法创建日志目录: {}", log_dir.display()))?;

    let now = chrono::Local::now();
    let path = log_dir.join(format!("examsys_log_{}.txt", now.format("%Y-%m-%d_%H-%M-%S")));

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("无法创建日志文件: {}", path.display()))?;

    let header = format!(
        "{}\nExamSys 提取日志 - {}\n{}\n\n",
        "=".repeat(60),
        now.format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    file.write_all(header.as_bytes())?;

    Ok((file, path))
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - ExamSys 简答题批改数据提取");
    info!("🌐 门户地址: {}", config.portal_base_url);
    info!("📄 输出文件: {}", config.output_csv);
    if config.launch_browser {
        info!("🖥️ 浏览器模式: 启动新浏览器{}", if config.headless { "（无头）" } else { "" });
    } else {
        info!("🖥️ 浏览器模式: 附加到端口 {}", config.browser_debug_port);
    }
    info!("{}", "=".repeat(60));
}

/// 打印最终统计信息
///
/// # 参数
/// - `summary`: 运行摘要
/// - `log_file`: 日志文件路径（如有）
pub fn print_final_stats(summary: &RunSummary, log_file: Option<&Path>) {
    let file_name = summary
        .output_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| summary.output_path.display().to_string());
    let full_path = fs::canonicalize(&summary.output_path).unwrap_or_else(|_| summary.output_path.clone());

    info!("\n{}", "=".repeat(60));
    info!("📊 提取完成统计");
    info!("完成时间: {}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"));
    info!("{}", "=".repeat(60));
    info!("📝 题目: {}/{}", summary.questions_processed, summary.questions_discovered);
    if summary.questions_skipped > 0 {
        info!("⚠️ 跳过: {}", summary.questions_skipped);
    }
    info!("🧑‍🎓 学生: {}", summary.students_seen);
    info!("✅ 行数: {}", summary.rows_written);
    info!("⏱️ 用时: {:.1}s", summary.duration_seconds);
    info!("📄 文件: {}", file_name);
    info!("📁 路径: {}", full_path.display());
    info!("{}", "=".repeat(60));
    if let Some(path) = log_file {
        info!("\n日志已保存至: {}", path.display());
    }
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
