use std::fmt;

use async_openai::error::OpenAIError;
use thiserror::Error;

/// 应用程序错误类型
///
/// 只包含会中止整个运行的进程级错误；单条推文的分类失败
/// 在 `ClassificationPolicy` 边界内就被吸收，不会出现在这里。
#[derive(Debug, Error)]
pub enum AppError {
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// 进度文件错误
    #[error("进度文件错误: {0}")]
    Store(#[from] StoreError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 文件不存在
    #[error("文件不存在: {path}")]
    NotFound { path: String },
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// CSV 解析失败
    #[error("CSV解析失败 ({path}): {source}")]
    CsvParseFailed {
        path: String,
        #[source]
        source: csv::Error,
    },
    /// CSV 缺少必需的列
    #[error("CSV缺少必需的列 ({path}): {column}")]
    MissingColumn { path: String, column: String },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// 进度文件错误
#[derive(Debug, Error)]
pub enum StoreError {
    /// 已有进度文件的表头与当前配置不一致
    #[error("进度文件表头不匹配 ({path}): 期望 [{expected}], 实际 [{found}]")]
    HeaderMismatch {
        path: String,
        expected: String,
        found: String,
    },
    /// 打开进度文件失败
    #[error("打开进度文件失败 ({path}): {source}")]
    OpenFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 追加写入失败
    #[error("写入进度文件失败 ({path}): {source}")]
    AppendFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 配置项取值非法
    #[error("配置项 {field} 非法: {reason}")]
    InvalidValue { field: String, reason: String },
    /// 缺少 API Key
    #[error("未配置 LLM API Key (LLM_API_KEY 或 OPENAI_API_KEY)")]
    MissingApiKey,
}

/// 分类器调用失败
///
/// 由 `Classifier` 实现返回，由 `ClassificationPolicy` 统一吸收。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassifyError {
    /// 请求频率限制
    #[error("请求频率限制: {0}")]
    RateLimited(String),
    /// 配额用尽
    #[error("配额已用尽: {0}")]
    QuotaExceeded(String),
    /// 其他失败（网络、响应格式等）
    #[error("分类失败: {0}")]
    Other(String),
}

impl ClassifyError {
    /// 根据服务返回的错误信息判断失败类型
    ///
    /// 配额错误通常也带 429 状态，所以先判断配额。
    pub fn from_message(message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_lowercase();

        if lower.contains("insufficient_quota")
            || lower.contains("quota_exceeded")
            || lower.contains("exceeded your current quota")
        {
            ClassifyError::QuotaExceeded(message)
        } else if lower.contains("rate_limit")
            || lower.contains("rate limit")
            || lower.contains("429")
        {
            ClassifyError::RateLimited(message)
        } else {
            ClassifyError::Other(message)
        }
    }

    /// 对应的错误类别
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClassifyError::RateLimited(_) => ErrorKind::RateLimited,
            ClassifyError::QuotaExceeded(_) => ErrorKind::QuotaExceeded,
            ClassifyError::Other(_) => ErrorKind::Unknown,
        }
    }
}

impl From<OpenAIError> for ClassifyError {
    fn from(err: OpenAIError) -> Self {
        let message = err.to_string();
        if let OpenAIError::ApiError(api) = &err {
            let tags = [api.r#type.as_deref(), api.code.as_deref()];
            if tags.iter().flatten().any(|tag| tag.contains("quota")) {
                return ClassifyError::QuotaExceeded(message);
            }
            if tags.iter().flatten().any(|tag| tag.contains("rate_limit")) {
                return ClassifyError::RateLimited(message);
            }
        }
        ClassifyError::from_message(message)
    }
}

/// 写入结果文件的错误类别
///
/// 默认输出中四种错误都记为同一个 `Error` 标记，
/// 只有开启 `record_error_kind` 时才会额外写出这一列。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// 推文内容为空，未调用分类器
    EmptyPayload,
    /// 请求频率限制
    RateLimited,
    /// 配额用尽
    QuotaExceeded,
    /// 其他失败
    Unknown,
}

impl ErrorKind {
    pub const ALL: [ErrorKind; 4] = [
        ErrorKind::EmptyPayload,
        ErrorKind::RateLimited,
        ErrorKind::QuotaExceeded,
        ErrorKind::Unknown,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::EmptyPayload => "empty_payload",
            ErrorKind::RateLimited => "rate_limited",
            ErrorKind::QuotaExceeded => "quota_exceeded",
            ErrorKind::Unknown => "unknown",
        }
    }

    pub fn from_str_opt(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == s)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quota_message_wins_over_429() {
        let err = ClassifyError::from_message(
            "429: You exceeded your current quota, please check your plan (code: insufficient_quota)",
        );
        assert_eq!(err.kind(), ErrorKind::QuotaExceeded);
    }

    #[test]
    fn test_rate_limit_message() {
        let err = ClassifyError::from_message("Rate limit reached for gpt-4o-mini (code: rate_limit_exceeded)");
        assert_eq!(err.kind(), ErrorKind::RateLimited);
    }

    #[test]
    fn test_other_message() {
        let err = ClassifyError::from_message("error sending request: connection reset");
        assert_eq!(err.kind(), ErrorKind::Unknown);
    }

    #[test]
    fn test_api_error_code_decides_kind() {
        use async_openai::error::ApiError;

        let api_error = |r#type: &str, code: &str| {
            OpenAIError::ApiError(ApiError {
                message: "slow down".to_string(),
                r#type: Some(r#type.to_string()),
                param: None,
                code: Some(code.to_string()),
            })
        };

        let err = ClassifyError::from(api_error("requests", "rate_limit_exceeded"));
        assert_eq!(err.kind(), ErrorKind::RateLimited);
        let err = ClassifyError::from(api_error("insufficient_quota", "insufficient_quota"));
        assert_eq!(err.kind(), ErrorKind::QuotaExceeded);
        let err = ClassifyError::from(api_error("invalid_request_error", "model_not_found"));
        assert_eq!(err.kind(), ErrorKind::Unknown);
    }

    #[test]
    fn test_error_kind_names() {
        for kind in ErrorKind::ALL {
            assert_eq!(ErrorKind::from_str_opt(kind.as_str()), Some(kind));
        }
        assert_eq!(ErrorKind::from_str_opt("Error"), None);
    }
}
