use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{AppError, AppResult, ConfigError, FileError};

/// 指向 TOML 配置文件的环境变量
pub const CONFIG_FILE_ENV: &str = "CLASSIFIER_CONFIG";

/// 程序配置文件
///
/// 加载顺序：默认值 → `CLASSIFIER_CONFIG` 指向的 TOML 文件 → 环境变量。
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// 待分类推文 CSV
    pub input_csv: String,
    /// 分类结果 CSV（同时作为进度文件）
    pub output_csv: String,
    /// 每轮最多发出的请求数
    pub daily_limit: usize,
    /// 触发频率限制后的等待秒数
    pub short_cooldown_secs: u64,
    /// 配额用尽或达到每轮上限后的等待秒数
    pub long_cooldown_secs: u64,
    /// 是否在结果中额外写出 error_kind 列
    pub record_error_kind: bool,
    /// 是否重新处理之前标记为 Error 的推文
    pub retry_error_rows: bool,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    pub llm_max_tokens: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_csv: "Co_Tweets_unclassified.csv".to_string(),
            output_csv: "LLM_Classified_Tweets_gpt4o_mini.csv".to_string(),
            daily_limit: 10_000,
            short_cooldown_secs: 60,
            long_cooldown_secs: 24 * 60 * 60,
            record_error_kind: false,
            retry_error_rows: false,
            verbose_logging: false,
            llm_api_key: String::new(),
            llm_api_base_url: "https://api.openai.com/v1".to_string(),
            llm_model_name: "gpt-4o-mini".to_string(),
            llm_max_tokens: 10,
        }
    }
}

impl Config {
    /// 加载完整配置
    pub fn load() -> AppResult<Self> {
        let base = match std::env::var(CONFIG_FILE_ENV) {
            Ok(path) if !path.trim().is_empty() => Self::from_toml_file(Path::new(path.trim()))?,
            _ => Self::default(),
        };
        let config = base.with_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// 从 TOML 文件读取配置，未出现的字段使用默认值
    pub fn from_toml_file(path: &Path) -> AppResult<Self> {
        let display = path.display().to_string();
        if !path.exists() {
            return Err(FileError::NotFound { path: display }.into());
        }
        let content = std::fs::read_to_string(path).map_err(|source| FileError::ReadFailed {
            path: display.clone(),
            source,
        })?;
        Self::from_toml_str(&content, &display)
    }

    pub fn from_toml_str(content: &str, origin: &str) -> AppResult<Self> {
        toml::from_str::<Config>(content).map_err(|source| {
            AppError::from(FileError::TomlParseFailed {
                path: origin.to_string(),
                source,
            })
        })
    }

    /// 用环境变量覆盖已有配置
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides(|name| std::env::var(name).ok())
    }

    /// 用任意来源覆盖配置，便于测试时不去改动进程环境
    pub fn with_overrides<F>(self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let llm_api_key = lookup("LLM_API_KEY")
            .or_else(|| lookup("OPENAI_API_KEY"))
            .unwrap_or(self.llm_api_key);

        Ok(Self {
            input_csv: lookup("INPUT_CSV").unwrap_or(self.input_csv),
            output_csv: lookup("OUTPUT_CSV").unwrap_or(self.output_csv),
            daily_limit: parse_var(&lookup, "DAILY_LIMIT", self.daily_limit)?,
            short_cooldown_secs: parse_var(&lookup, "SHORT_COOLDOWN_SECS", self.short_cooldown_secs)?,
            long_cooldown_secs: parse_var(&lookup, "LONG_COOLDOWN_SECS", self.long_cooldown_secs)?,
            record_error_kind: parse_var(&lookup, "RECORD_ERROR_KIND", self.record_error_kind)?,
            retry_error_rows: parse_var(&lookup, "RETRY_ERROR_ROWS", self.retry_error_rows)?,
            verbose_logging: parse_var(&lookup, "VERBOSE_LOGGING", self.verbose_logging)?,
            llm_api_key,
            llm_api_base_url: lookup("LLM_API_BASE_URL").unwrap_or(self.llm_api_base_url),
            llm_model_name: lookup("LLM_MODEL_NAME").unwrap_or(self.llm_model_name),
            llm_max_tokens: parse_var(&lookup, "LLM_MAX_TOKENS", self.llm_max_tokens)?,
        })
    }

    /// 校验配置项
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.daily_limit == 0 {
            return Err(ConfigError::InvalidValue {
                field: "daily_limit".to_string(),
                reason: "必须大于 0，否则每轮都无法处理任何推文".to_string(),
            });
        }
        if self.input_csv.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "input_csv".to_string(),
                reason: "不能为空".to_string(),
            });
        }
        if self.output_csv.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "output_csv".to_string(),
                reason: "不能为空".to_string(),
            });
        }
        if self.input_csv == self.output_csv {
            return Err(ConfigError::InvalidValue {
                field: "output_csv".to_string(),
                reason: "不能与 input_csv 相同".to_string(),
            });
        }
        Ok(())
    }

    pub fn short_cooldown(&self) -> Duration {
        Duration::from_secs(self.short_cooldown_secs)
    }

    pub fn long_cooldown(&self) -> Duration {
        Duration::from_secs(self.long_cooldown_secs)
    }
}

fn parse_var<T, F>(lookup: &F, var_name: &str, current: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(var_name) {
        Some(value) => value.trim().parse().map_err(|_| ConfigError::EnvVarParseFailed {
            var_name: var_name.to_string(),
            value,
            expected_type: std::any::type_name::<T>().to_string(),
        }),
        None => Ok(current),
    }
}
