//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责整次运行的调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `app` - 应用入口
//! - 管理应用生命周期（初始化日志、获取浏览会话、输出统计）
//! - 确定报告页地址（配置指定或当前标签页）
//! - 把 Ctrl-C 转为取消标志
//!
//! ### `extraction` - 提取编排器
//! - 打开输出文件，发现题目
//! - 逐题委托 QuestionFlow，检查取消标志
//! - 汇总运行摘要，发出事件，关闭会话
//!
//! ## 层次关系
//!
//! ```text
//! app (会话 + 报告页)
//!     ↓
//! extraction (处理 Vec<QuestionRef>)
//!     ↓
//! workflow::QuestionFlow (处理单道题)
//!     ↓
//! services (能力层：navigator / extractor / normalizer / csv)
//!     ↓
//! infrastructure (基础设施：BrowserSession)
//! ```
//!
//! ## 设计原则
//!
//! 1. **资源隔离**：只有编排层持有浏览会话和输出文件
//! 2. **向下依赖**：编排层 → workflow → services → infrastructure
//! 3. **无业务逻辑**：只做调度和统计，不做具体提取判断

pub mod app;
pub mod extraction;

// 重新导出主要类型
pub use app::App;
pub use extraction::{CancelFlag, ExtractionOrchestrator};
