//! 日志工具模块
//!
//! 提供日志初始化和格式化输出的辅助函数

use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::orchestrator::RunStats;

/// 初始化 tracing 日志
///
/// 默认 info 级别，可通过 `RUST_LOG` 覆盖；重复调用不会报错。
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 推文分类模式");
    info!("📥 输入文件: {}", config.input_csv);
    info!("📤 输出文件: {}", config.output_csv);
    info!("🤖 模型: {}", config.llm_model_name);
    info!("📊 每轮上限: {}", config.daily_limit);
    info!(
        "⏱️ 冷却: 短 {} 秒 / 长 {} 秒",
        config.short_cooldown_secs, config.long_cooldown_secs
    );
    info!("{}", "=".repeat(60));
}

/// 记录待处理推文信息
///
/// # 参数
/// - `total`: 推文总数
/// - `done`: 之前已完成的数量
/// - `pending`: 待处理数量
pub fn log_pending(total: usize, done: usize, pending: usize) {
    info!("✓ 共 {} 条推文，已完成 {} 条", total, done);
    info!("📋 本次待处理 {} 条", pending);
}

/// 记录一轮开始信息
pub fn log_sweep_start(sweep: usize, pending: usize) {
    info!("\n{}", "=".repeat(60));
    info!("📦 开始第 {} 轮，待处理 {} 条", sweep, pending);
    info!("{}", "=".repeat(60));
}

/// 记录一轮完成信息
///
/// # 参数
/// - `sweep`: 轮次编号
/// - `count`: 本轮处理数量
/// - `total`: 本次运行累计处理数量
pub fn log_sweep_complete(sweep: usize, count: usize, total: usize) {
    info!("\n{}", "─".repeat(60));
    info!("✓ 第 {} 轮完成: 处理 {} 条，累计 {} 条", sweep, count, total);
    info!("{}", "─".repeat(60));
}

/// 打印最终统计信息
pub fn print_final_stats(stats: &RunStats, output_path: &str) {
    info!("\n{}", "=".repeat(60));
    if stats.interrupted {
        info!("⏹️ 运行已中断，下次启动会从断点继续");
    } else {
        info!("📊 所有推文处理完成");
    }
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 分类成功: {}/{}", stats.labelled, stats.processed);
    info!("❌ 记为 Error: {}", stats.error_count());
    for (kind, count) in &stats.errors {
        info!("    {}: {}", kind, count);
    }
    info!("⏭️ 之前已完成: {}", stats.already_done);
    info!(
        "⏸️ 冷却次数: 短 {} / 长 {}",
        stats.short_cooldowns, stats.long_cooldowns
    );
    info!("{}", "=".repeat(60));
    info!("\n结果已保存至: {}", output_path);
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
    match text.char_indices().nth(max_len) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("short", 10), "short");
        assert_eq!(truncate_text("abcdef", 3), "abc...");
        assert_eq!(truncate_text("电动汽车充电", 2), "电动...");
    }
}
