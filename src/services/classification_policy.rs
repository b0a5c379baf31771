//! 分类调用策略 - 业务能力层
//!
//! 包装 `Classifier`，把所有失败都收敛成 `Error` 标记，
//! 并告诉运行器接下来需要进入哪种冷却状态。

use tracing::{error, warn};

use crate::error::{ClassifyError, ErrorKind};
use crate::infrastructure::RunnerState;
use crate::models::{Category, WorkItem, ERROR_LABEL};
use crate::services::classifier::Classifier;

/// 单条推文的处理结论
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    /// 写入结果文件的标签
    pub label: String,
    /// 失败类别，成功时为 None
    pub error: Option<ErrorKind>,
}

impl Verdict {
    pub fn labelled(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            error: None,
        }
    }

    pub fn failed(kind: ErrorKind) -> Self {
        Self {
            label: ERROR_LABEL.to_string(),
            error: Some(kind),
        }
    }

    /// 记录结果后运行器应进入的状态
    pub fn next_state(&self) -> RunnerState {
        match self.error {
            Some(ErrorKind::RateLimited) => RunnerState::CooldownShort,
            Some(ErrorKind::QuotaExceeded) => RunnerState::CooldownLong,
            _ => RunnerState::Running,
        }
    }
}

/// 分类调用策略
///
/// 职责：
/// - 空内容直接判为错误，不调用分类器
/// - 分类器的任何失败都转成 `Verdict`，不向上抛出
/// - 成功时原样返回去掉空白的标签，不校验是否属于已知分类
pub struct ClassificationPolicy<C> {
    classifier: C,
}

impl<C: Classifier> ClassificationPolicy<C> {
    pub fn new(classifier: C) -> Self {
        Self { classifier }
    }

    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    /// 对一条推文给出结论
    pub async fn classify(&self, item: &WorkItem) -> Verdict {
        let Some(text) = item.text() else {
            warn!("[推文 {}] 内容为空，记为 {}", item.id, ERROR_LABEL);
            return Verdict::failed(ErrorKind::EmptyPayload);
        };

        match self.classifier.classify(text).await {
            Ok(label) => {
                let label = label.trim().to_string();
                if Category::from_label(&label).is_none() {
                    warn!(
                        "[推文 {}] {} 返回了未知分类 '{}'，按原样记录",
                        item.id,
                        self.classifier.name(),
                        label
                    );
                }
                Verdict::labelled(label)
            }
            Err(e) => {
                match &e {
                    ClassifyError::RateLimited(_) => {
                        warn!("[推文 {}] ⚠️ 触发频率限制: {}", item.id, e);
                    }
                    ClassifyError::QuotaExceeded(_) => {
                        warn!(
                            "[推文 {}] ⚠️ 配额已用尽 ({}): {}",
                            item.id,
                            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                            e
                        );
                    }
                    ClassifyError::Other(_) => {
                        error!("[推文 {}] ❌ 分类失败: {}", item.id, e);
                    }
                }
                Verdict::failed(e.kind())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedClassifier {
        reply: Result<String, ClassifyError>,
        calls: AtomicUsize,
    }

    impl FixedClassifier {
        fn new(reply: Result<&str, ClassifyError>) -> Self {
            Self {
                reply: reply.map(str::to_string),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Classifier for FixedClassifier {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn classify(&self, _text: &str) -> Result<String, ClassifyError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply.clone()
        }
    }

    #[tokio::test]
    async fn test_success_label_is_trimmed() {
        let policy = ClassificationPolicy::new(FixedClassifier::new(Ok("  3\n")));
        let verdict = policy.classify(&WorkItem::new("1", Some("I love my Tesla"))).await;
        assert_eq!(verdict, Verdict::labelled("3"));
        assert_eq!(verdict.next_state(), RunnerState::Running);
    }

    #[tokio::test]
    async fn test_unknown_label_kept_as_is() {
        let policy = ClassificationPolicy::new(FixedClassifier::new(Ok("Category 3")));
        let verdict = policy.classify(&WorkItem::new("1", Some("text"))).await;
        assert_eq!(verdict.label, "Category 3");
        assert_eq!(verdict.error, None);
    }

    #[tokio::test]
    async fn test_blank_payload_skips_classifier() {
        let policy = ClassificationPolicy::new(FixedClassifier::new(Ok("3")));
        let verdict = policy.classify(&WorkItem::new("2", Some("  "))).await;
        assert_eq!(verdict, Verdict::failed(ErrorKind::EmptyPayload));
        assert_eq!(policy.classifier().calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_rate_limit_requests_short_cooldown() {
        let policy = ClassificationPolicy::new(FixedClassifier::new(Err(
            ClassifyError::RateLimited("slow down".to_string()),
        )));
        let verdict = policy.classify(&WorkItem::new("1", Some("text"))).await;
        assert_eq!(verdict.label, ERROR_LABEL);
        assert_eq!(verdict.next_state(), RunnerState::CooldownShort);
    }

    #[tokio::test]
    async fn test_quota_requests_long_cooldown() {
        let policy = ClassificationPolicy::new(FixedClassifier::new(Err(
            ClassifyError::QuotaExceeded("insufficient_quota".to_string()),
        )));
        let verdict = policy.classify(&WorkItem::new("1", Some("text"))).await;
        assert_eq!(verdict.label, ERROR_LABEL);
        assert_eq!(verdict.next_state(), RunnerState::CooldownLong);
    }

    #[tokio::test]
    async fn test_other_failure_has_no_cooldown() {
        let policy = ClassificationPolicy::new(FixedClassifier::new(Err(ClassifyError::Other(
            "connection reset".to_string(),
        ))));
        let verdict = policy.classify(&WorkItem::new("1", Some("text"))).await;
        assert_eq!(verdict, Verdict::failed(ErrorKind::Unknown));
        assert_eq!(verdict.next_state(), RunnerState::Running);
    }
}
