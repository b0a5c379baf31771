//! 可恢复批量分类器 - 编排层
//!
//! ## 核心流程
//!
//! 1. 待处理集合 = 全部推文 − 进度文件中已完成的ID
//! 2. 按源文件顺序逐条分类，每条结果立即追加并落盘
//! 3. 本轮请求数达到 `daily_limit` 时进入长冷却，然后重新计算待处理集合
//! 4. 待处理集合为空时结束
//!
//! 所有推文严格串行处理，分类失败只会记为 `Error`，不会中断运行。

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::error::{AppResult, ErrorKind};
use crate::infrastructure::{Cooldown, RunnerState, SuspendOutcome};
use crate::models::{ResultRow, WorkItem};
use crate::services::{ClassificationPolicy, Classifier, ProgressStore, Verdict};
use crate::utils::logging::{log_pending, log_sweep_complete, log_sweep_start, truncate_text};

/// 运行统计
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunStats {
    /// 启动时已完成的推文数
    pub already_done: usize,
    /// 本次写入的结果行数
    pub processed: usize,
    /// 其中得到分类标签的行数
    pub labelled: usize,
    /// 按类别统计的错误行数
    pub errors: HashMap<ErrorKind, usize>,
    /// 完成的轮数
    pub sweeps: usize,
    /// 短冷却次数
    pub short_cooldowns: usize,
    /// 长冷却次数
    pub long_cooldowns: usize,
    /// 是否因停止信号提前结束
    pub interrupted: bool,
}

impl RunStats {
    pub fn error_count(&self) -> usize {
        self.errors.values().sum()
    }

    fn record(&mut self, verdict: &Verdict) {
        self.processed += 1;
        match verdict.error {
            Some(kind) => *self.errors.entry(kind).or_insert(0) += 1,
            None => self.labelled += 1,
        }
    }

    fn record_cooldown(&mut self, state: RunnerState) {
        match state {
            RunnerState::CooldownShort => self.short_cooldowns += 1,
            RunnerState::CooldownLong => self.long_cooldowns += 1,
            RunnerState::Running => {}
        }
    }
}

/// 一轮处理的结束方式
enum SweepEnd {
    /// 待处理集合全部走完
    Exhausted,
    /// 达到每轮上限，冷却后重新开始
    LimitReached,
    /// 收到停止信号
    Interrupted,
}

/// 批量分类运行器
///
/// - 持有分类策略和冷却计时器
/// - 不持有进度文件，由调用方传入
/// - 状态（本轮计数、当前冷却状态）只存在于 `run` 的局部变量中
pub struct BatchRunner<C> {
    policy: ClassificationPolicy<C>,
    cooldown: Cooldown,
    daily_limit: usize,
    verbose_logging: bool,
}

impl<C: Classifier> BatchRunner<C> {
    pub fn new(classifier: C, cooldown: Cooldown, daily_limit: usize) -> Self {
        Self {
            policy: ClassificationPolicy::new(classifier),
            cooldown,
            daily_limit: daily_limit.max(1),
            verbose_logging: false,
        }
    }

    /// 每条推文都以 info 级别输出预览
    pub fn with_verbose_logging(mut self, verbose: bool) -> Self {
        self.verbose_logging = verbose;
        self
    }

    pub fn classifier(&self) -> &C {
        self.policy.classifier()
    }

    /// 处理所有尚未完成的推文
    pub async fn run(&self, items: &[WorkItem], store: &mut ProgressStore) -> AppResult<RunStats> {
        let mut stats = RunStats {
            already_done: items.iter().filter(|item| store.contains(&item.id)).count(),
            ..Default::default()
        };

        let mut pending = pending_items(items, store);
        log_pending(items.len(), stats.already_done, pending.len());

        while !pending.is_empty() {
            stats.sweeps += 1;
            log_sweep_start(stats.sweeps, pending.len());

            let (request_count, end) = self.sweep(&pending, store, &mut stats).await?;
            log_sweep_complete(stats.sweeps, request_count, stats.processed);

            match end {
                SweepEnd::Interrupted => {
                    stats.interrupted = true;
                    return Ok(stats);
                }
                SweepEnd::Exhausted | SweepEnd::LimitReached => {}
            }

            pending = pending_items(items, store);
        }

        Ok(stats)
    }

    /// 一轮处理，返回本轮请求数
    async fn sweep(
        &self,
        pending: &[&WorkItem],
        store: &mut ProgressStore,
        stats: &mut RunStats,
    ) -> AppResult<(usize, SweepEnd)> {
        let mut request_count = 0;

        for item in pending {
            if self.cooldown.is_shutdown_requested() {
                warn!("⏹️ 收到停止信号，已处理 {} 条", stats.processed);
                return Ok((request_count, SweepEnd::Interrupted));
            }

            if request_count >= self.daily_limit {
                info!(
                    "📛 已达到每轮上限 {} ({})",
                    self.daily_limit,
                    chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
                );
                let end = match self.enter(RunnerState::CooldownLong, stats).await {
                    SuspendOutcome::Elapsed => SweepEnd::LimitReached,
                    SuspendOutcome::Cancelled => SweepEnd::Interrupted,
                };
                return Ok((request_count, end));
            }

            // 源文件中重复的ID会在本轮前面已经写过
            if store.contains(&item.id) {
                debug!("[推文 {}] 已有结果，跳过", item.id);
                continue;
            }

            self.log_item(item);

            let verdict = self.policy.classify(item).await;
            store.append(&ResultRow {
                id: item.id.clone(),
                payload: item.payload.clone().unwrap_or_default(),
                label: verdict.label.clone(),
                error_kind: verdict.error,
            })?;

            request_count += 1;
            stats.record(&verdict);

            let next = verdict.next_state();
            if next != RunnerState::Running {
                if let SuspendOutcome::Cancelled = self.enter(next, stats).await {
                    return Ok((request_count, SweepEnd::Interrupted));
                }
            }
        }

        Ok((request_count, SweepEnd::Exhausted))
    }

    async fn enter(&self, state: RunnerState, stats: &mut RunStats) -> SuspendOutcome {
        stats.record_cooldown(state);
        self.cooldown.suspend(state).await
    }

    fn log_item(&self, item: &WorkItem) {
        let preview = truncate_text(item.payload.as_deref().unwrap_or(""), 80);
        if self.verbose_logging {
            info!("[推文 {}] {}", item.id, preview);
        } else {
            debug!("[推文 {}] {}", item.id, preview);
        }
    }
}

/// 按源文件顺序列出尚未完成的推文
pub fn pending_items<'a>(items: &'a [WorkItem], store: &ProgressStore) -> Vec<&'a WorkItem> {
    items.iter().filter(|item| !store.contains(&item.id)).collect()
}
