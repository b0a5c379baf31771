//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `app` - 应用入口
//! - 根据配置创建分类器、冷却计时器和运行器
//! - 加载输入文件和进度文件
//! - 输出最终统计信息
//!
//! ### `batch_runner` - 可恢复批量运行器
//! - 计算待处理集合
//! - 逐条分类、逐条落盘
//! - 维护每轮计数和冷却状态
//!
//! ## 层次关系
//!
//! ```text
//! app (处理输入文件)
//!     ↓
//! batch_runner (处理 Vec<WorkItem>)
//!     ↓
//! services (能力层：policy / llm / progress_store)
//!     ↓
//! infrastructure (基础设施：Cooldown / shutdown)
//! ```

pub mod app;
pub mod batch_runner;

pub use app::{process_csv, App};
pub use batch_runner::{pending_items, BatchRunner, RunStats};
