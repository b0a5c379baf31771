//! 冷却计时器 - 基础设施层
//!
//! 持有取消令牌，只暴露"可被打断的等待"能力

use std::fmt;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// 运行器状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerState {
    /// 正常处理中
    Running,
    /// 频率限制后的短冷却
    CooldownShort,
    /// 配额用尽或达到每轮上限后的长冷却
    CooldownLong,
}

impl fmt::Display for RunnerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunnerState::Running => write!(f, "RUNNING"),
            RunnerState::CooldownShort => write!(f, "COOLDOWN_SHORT"),
            RunnerState::CooldownLong => write!(f, "COOLDOWN_LONG"),
        }
    }
}

/// 冷却等待的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuspendOutcome {
    /// 等待时间已满
    Elapsed,
    /// 收到停止信号，提前结束
    Cancelled,
}

/// 冷却计时器
///
/// 职责：
/// - 按状态决定等待多久
/// - 等待期间响应停止信号
/// - 不认识推文 / 分类结果
#[derive(Debug, Clone)]
pub struct Cooldown {
    short: Duration,
    long: Duration,
    shutdown: CancellationToken,
}

impl Cooldown {
    pub fn new(short: Duration, long: Duration, shutdown: CancellationToken) -> Self {
        Self {
            short,
            long,
            shutdown,
        }
    }

    /// 某个状态对应的等待时长
    pub fn duration_for(&self, state: RunnerState) -> Duration {
        match state {
            RunnerState::Running => Duration::ZERO,
            RunnerState::CooldownShort => self.short,
            RunnerState::CooldownLong => self.long,
        }
    }

    /// 是否已经收到停止信号
    pub fn is_shutdown_requested(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// 进入冷却状态并等待，结束后回到 `Running`
    pub async fn suspend(&self, state: RunnerState) -> SuspendOutcome {
        let duration = self.duration_for(state);

        if self.shutdown.is_cancelled() {
            return SuspendOutcome::Cancelled;
        }
        if duration.is_zero() {
            return SuspendOutcome::Elapsed;
        }

        info!(
            "⏸️ 进入 {} 状态，等待 {} 秒 (开始时间: {})",
            state,
            duration.as_secs(),
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        );

        tokio::select! {
            _ = self.shutdown.cancelled() => {
                warn!("收到停止信号，冷却提前结束");
                SuspendOutcome::Cancelled
            }
            _ = tokio::time::sleep(duration) => {
                info!("▶️ 冷却结束，恢复 {} 状态", RunnerState::Running);
                SuspendOutcome::Elapsed
            }
        }
    }
}
