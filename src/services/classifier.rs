//! 分类器接口 - 业务能力层
//!
//! 运行器只依赖这个 trait，真实实现是 `LlmService`，测试中换成桩。

use async_trait::async_trait;

use crate::error::ClassifyError;

/// 文本分类能力
///
/// 实现方只负责"一段文本 → 一个标签"，
/// 不处理冷却、不写文件、不关心推文ID。
#[async_trait]
pub trait Classifier: Send + Sync {
    /// 用于日志的名称
    fn name(&self) -> &str;

    /// 对一段非空文本分类，返回原始标签文本
    async fn classify(&self, text: &str) -> Result<String, ClassifyError>;
}

