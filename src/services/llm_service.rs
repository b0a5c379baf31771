//! LLM 服务 - 业务能力层
//!
//! 只负责"LLM 分类"能力，不关心冷却和进度
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 支持自定义 API 端点和模型
//! - 兼容 OpenAI API 的服务（如 Azure, Gemini, Doubao 等）

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{ClassifyError, ConfigError};
use crate::services::classifier::Classifier;
use crate::services::prompt::{build_classification_prompt, SYSTEM_MESSAGE};

/// LLM 服务
///
/// 职责：
/// - 调用 LLM API 对单条推文分类
/// - 把服务端错误翻译成 `ClassifyError`
/// - 不出现推文ID
/// - 不做任何等待或重试
pub struct LlmService {
    client: Client<OpenAIConfig>,
    model_name: String,
    max_tokens: u32,
}

impl LlmService {
    /// 创建新的 LLM 服务
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        if config.llm_api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }

        // 配置 OpenAI 客户端（兼容 OpenAI API 的服务）
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        // 关闭客户端自带的 429/5xx 重试，失败要立刻交给冷却策略
        let no_retry: ExponentialBackoff = ExponentialBackoffBuilder::new()
            .with_max_elapsed_time(Some(Duration::ZERO))
            .build();

        Ok(Self {
            client: Client::with_config(openai_config).with_backoff(no_retry),
            model_name: config.llm_model_name.clone(),
            max_tokens: config.llm_max_tokens,
        })
    }

    /// 通用的 LLM 调用函数
    ///
    /// 固定 temperature 为 0，返回去掉首尾空白的第一条回复。
    pub async fn send_to_llm(
        &self,
        user_message: &str,
        system_message: Option<&str>,
    ) -> Result<String, ClassifyError> {
        debug!("调用 LLM API，模型: {}", self.model_name);
        debug!("用户消息长度: {} 字符", user_message.len());

        let mut messages = Vec::new();

        if let Some(sys_msg) = system_message {
            let system_msg = ChatCompletionRequestSystemMessageArgs::default()
                .content(sys_msg)
                .build()?;
            messages.push(ChatCompletionRequestMessage::System(system_msg));
        }

        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(user_message)
            .build()?;
        messages.push(ChatCompletionRequestMessage::User(user_msg));

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(messages)
            .temperature(0.0)
            .max_tokens(self.max_tokens)
            .build()?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            warn!("LLM API 调用失败: {}", e);
            ClassifyError::from(e)
        })?;

        debug!("LLM API 调用成功");

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| ClassifyError::Other("LLM 返回内容为空".to_string()))?;

        Ok(content.trim().to_string())
    }
}

#[async_trait]
impl Classifier for LlmService {
    fn name(&self) -> &str {
        &self.model_name
    }

    async fn classify(&self, text: &str) -> Result<String, ClassifyError> {
        let prompt = build_classification_prompt(text);
        self.send_to_llm(&prompt, Some(SYSTEM_MESSAGE)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::time::timeout;

    #[test]
    fn test_missing_api_key_rejected() {
        let config = Config::default();
        assert!(matches!(LlmService::new(&config), Err(ConfigError::MissingApiKey)));
    }

    #[test]
    fn test_name_is_model() {
        let config = Config {
            llm_api_key: "sk-test".to_string(),
            ..Config::default()
        };
        let service = LlmService::new(&config).unwrap();
        assert_eq!(service.name(), "gpt-4o-mini");
    }

    /// 本地假 API：每个连接只应答一次，并记录收到的请求数
    async fn spawn_api(status_line: &'static str, body: &'static str) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(AtomicUsize::new(0));
        let counter = requests.clone();

        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                read_request(&mut stream).await;
                counter.fetch_add(1, Ordering::SeqCst);
                let reply = format!(
                    "{status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = stream.write_all(reply.as_bytes()).await;
                let _ = stream.shutdown().await;
            }
        });

        (format!("http://{addr}/v1"), requests)
    }

    /// 读完请求头和 Content-Length 指定的请求体
    async fn read_request(stream: &mut TcpStream) {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = stream.read(&mut chunk).await.unwrap_or(0);
            if n == 0 {
                return;
            }
            buf.extend_from_slice(&chunk[..n]);

            let text = String::from_utf8_lossy(&buf);
            if let Some(head_end) = text.find("\r\n\r\n") {
                let content_length = text[..head_end]
                    .lines()
                    .find_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if buf.len() >= head_end + 4 + content_length {
                    return;
                }
            }
        }
    }

    fn service_for(base_url: String) -> LlmService {
        let config = Config {
            llm_api_key: "sk-test".to_string(),
            llm_api_base_url: base_url,
            ..Config::default()
        };
        LlmService::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_classify_trims_reply() {
        let (base_url, requests) = spawn_api(
            "HTTP/1.1 200 OK",
            r#"{"id":"c1","object":"chat.completion","created":1,"model":"gpt-4o-mini","choices":[{"index":0,"message":{"role":"assistant","content":" 3\n"},"finish_reason":"stop"}]}"#,
        )
        .await;

        let label = service_for(base_url).classify("I love my Tesla").await.unwrap();

        assert_eq!(label, "3");
        assert_eq!(requests.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_rate_limit_returned_without_retry() {
        let (base_url, requests) = spawn_api(
            "HTTP/1.1 429 Too Many Requests",
            r#"{"error":{"message":"Rate limit reached for gpt-4o-mini","type":"requests","param":null,"code":"rate_limit_exceeded"}}"#,
        )
        .await;

        let result = timeout(
            Duration::from_secs(5),
            service_for(base_url).classify("hello"),
        )
        .await
        .expect("客户端仍在内部重试");

        assert!(matches!(result, Err(ClassifyError::RateLimited(_))));
        assert_eq!(requests.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_insufficient_quota_maps_to_quota_exceeded() {
        let (base_url, requests) = spawn_api(
            "HTTP/1.1 429 Too Many Requests",
            r#"{"error":{"message":"You exceeded your current quota, please check your plan and billing details.","type":"insufficient_quota","param":null,"code":"insufficient_quota"}}"#,
        )
        .await;

        let result = service_for(base_url).classify("hello").await;

        assert!(matches!(result, Err(ClassifyError::QuotaExceeded(_))));
        assert_eq!(requests.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_server_error_returned_without_retry() {
        let (base_url, requests) = spawn_api(
            "HTTP/1.1 503 Service Unavailable",
            "upstream unavailable",
        )
        .await;

        let result = timeout(
            Duration::from_secs(5),
            service_for(base_url).classify("hello"),
        )
        .await
        .expect("客户端仍在内部重试");

        assert!(matches!(result, Err(ClassifyError::Other(_))));
        assert_eq!(requests.load(Ordering::SeqCst), 1);
    }

    /// 测试真实 API 分类
    ///
    /// 运行方式：
    /// ```bash
    /// OPENAI_API_KEY=sk-... cargo test test_classify_live -- --ignored --nocapture
    /// ```
    #[tokio::test]
    #[ignore]
    async fn test_classify_live() {
        let _ = tracing_subscriber::fmt::try_init();

        let config = Config::default()
            .with_env_overrides()
            .expect("环境变量解析失败");
        let service = LlmService::new(&config).expect("缺少 API Key");

        let label = service
            .classify("New fast chargers are opening along the interstate")
            .await
            .expect("LLM 调用失败");

        println!("LLM 返回标签: {}", label);
        assert!(!label.is_empty());
    }
}
