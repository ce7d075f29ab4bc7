//! # ExamSys SAQ Extractor
//!
//! 从 ExamSys 门户的 "Primary Mark by Question" 报告中导出简答题批改数据（CSV）
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（Page），只暴露能力
//! - `BrowserSession` - 导航、查询、快照的抽象接口
//! - `ChromeSession` - 基于 chromiumoxide 的实现（附加或启动）
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，对 HTML 快照做纯计算
//! - `QuestionDiscovery` - 发现题目链接
//! - `BlockExtractor` - 提取学生答案块
//! - `mark_normalizer` / `url_resolver` - 分数和地址归一化
//! - `PageNavigator` - 打开页面并等待就绪
//! - `CsvSink` - 逐行写 CSV
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一道题"的完整处理流程
//! - `QuestionCtx` - 上下文封装（题号 + 总数）
//! - `QuestionFlow` - 流程编排（navigate → extract → normalize → write）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/extraction` - 整次运行：发现、逐题、取消、摘要
//! - `orchestrator/app` - 应用生命周期：日志、会话、统计
//!
//! 进度通过 `events::EventSink` 发出，与显示方式解耦。
//!
//! ## 模块结构

pub mod browser;
pub mod config;
pub mod error;
pub mod events;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::{Config, PortalSelectors};
pub use error::{ExtractError, NavigationError, Result};
pub use events::{EventSink, ExtractionEvent};
pub use infrastructure::{BrowserSession, ChromeSession};
pub use models::{QuestionRef, RunStatus, RunSummary, StudentAnswerRecord};
pub use orchestrator::{App, CancelFlag, ExtractionOrchestrator};
pub use workflow::{QuestionCtx, QuestionFlow, QuestionOutcome};
