use std::path::Path;

use tracing::{info, warn};

use crate::config::Config;
use crate::error::AppResult;
use crate::infrastructure::{install_ctrl_c_handler, Cooldown};
use crate::models::load_work_items;
use crate::orchestrator::batch_runner::{BatchRunner, RunStats};
use crate::services::{Classifier, LlmService, ProgressStore, StoreOptions};
use crate::utils::logging::{log_startup, print_final_stats};

/// 应用主结构
pub struct App {
    config: Config,
    runner: BatchRunner<LlmService>,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> AppResult<Self> {
        log_startup(&config);

        let classifier = LlmService::new(&config)?;
        let cooldown = Cooldown::new(
            config.short_cooldown(),
            config.long_cooldown(),
            install_ctrl_c_handler(),
        );
        let runner = BatchRunner::new(classifier, cooldown, config.daily_limit)
            .with_verbose_logging(config.verbose_logging);

        Ok(Self { config, runner })
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> AppResult<RunStats> {
        let stats = process_csv(&self.config, &self.runner).await?;
        print_final_stats(&stats, &self.config.output_csv);
        Ok(stats)
    }
}

/// 加载输入文件和进度文件，处理所有未完成的推文
pub async fn process_csv<C: Classifier>(
    config: &Config,
    runner: &BatchRunner<C>,
) -> AppResult<RunStats> {
    info!("\n📁 正在加载推文...");
    let items = load_work_items(Path::new(&config.input_csv)).await?;

    if items.is_empty() {
        warn!("⚠️ 输入文件中没有推文: {}", config.input_csv);
    }

    let options = StoreOptions {
        record_error_kind: config.record_error_kind,
        retry_error_rows: config.retry_error_rows,
    };
    let mut store = ProgressStore::open(Path::new(&config.output_csv), options)?;

    runner.run(&items, &mut store).await
}
