//! # Tweet Classifier
//!
//! 借助 LLM 对推文进行主题分类，支持中断后从断点继续的批处理程序
//!
//! ## 架构设计
//!
//! 本系统采用四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有取消令牌，只暴露"可打断的等待"能力
//! - `Cooldown` - 频率限制 / 配额用尽 / 每轮上限后的冷却
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单条推文
//! - `LlmService` - LLM 分类能力
//! - `ClassificationPolicy` - 把分类失败收敛为 `Error` 标记
//! - `ProgressStore` - 追加写结果并立即落盘
//!
//! ### ③ 数据层（Models）
//! - `models/` - 推文、结果行、分类枚举、CSV 加载
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_runner` - 计算待处理集合，逐条处理，控制冷却
//! - `orchestrator/app` - 根据配置组装并运行
//!
//! ## 模块结构

pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult, ClassifyError, ErrorKind};
pub use infrastructure::{Cooldown, RunnerState};
pub use models::{Category, ResultRow, WorkItem, ERROR_LABEL};
pub use orchestrator::{process_csv, App, BatchRunner, RunStats};
pub use services::{Classifier, LlmService, ProgressStore, StoreOptions};
pub use utils::logging;
