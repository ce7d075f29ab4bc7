use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use examsys_saq_extractor::{App, Config};

/// 从 ExamSys "Primary Mark by Question" 报告导出简答题批改数据
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// 报告页地址（默认使用浏览器当前的报告页）
    #[arg(long)]
    report_url: Option<String>,

    /// 输出 CSV 路径
    #[arg(long, short)]
    output: Option<String>,

    /// 浏览器调试端口（附加模式）
    #[arg(long)]
    port: Option<u16>,

    /// 启动新浏览器而不是附加
    #[arg(long)]
    launch: bool,

    /// 启动时使用无头模式
    #[arg(long, requires = "launch")]
    headless: bool,

    /// 页面就绪超时（毫秒）
    #[arg(long, value_name = "MS")]
    timeout_ms: Option<u64>,

    /// 每道题处理完后返回报告页
    #[arg(long)]
    return_to_report: bool,

    /// 输出调试日志
    #[arg(long, short)]
    verbose: bool,

    /// 不写日志文件
    #[arg(long)]
    no_log_file: bool,

    /// TOML 配置文件
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

impl Args {
    /// 命令行参数覆盖配置
    fn apply(self, mut config: Config) -> Config {
        if let Some(url) = self.report_url {
            config.report_url = Some(url);
        }
        if let Some(output) = self.output {
            config.output_csv = output;
        }
        if let Some(port) = self.port {
            config.browser_debug_port = port;
        }
        if let Some(ms) = self.timeout_ms {
            config.ready_timeout_ms = ms;
        }
        config.launch_browser |= self.launch;
        config.headless |= self.headless;
        config.return_to_report |= self.return_to_report;
        config.verbose_logging |= self.verbose;
        if self.no_log_file {
            config.mirror_log_file = false;
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // 加载配置：文件 → 环境变量 → 命令行
    let config = match &args.config {
        Some(path) => Config::from_toml_file(path)?.with_env_overrides(),
        None => Config::load()?,
    };
    let config = args.apply(config);

    // 初始化并运行应用
    App::initialize(config).await?.run().await?;

    Ok(())
}
