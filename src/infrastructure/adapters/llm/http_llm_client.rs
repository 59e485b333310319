//! HTTP LLM Client - 调用 Chat Completions 接口
//!
//! 外部 LLM API（火山方舟兼容 OpenAI 格式）:
//! POST https://ark.cn-beijing.volces.com/api/v3/chat/completions
//! Request: {"model": "...", "messages": [{"role": "user", "content": [{"type": "text", "text": "..."}]}]}
//! Response: choices[0].message.content 为字符串或文本片段列表

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use crate::application::ports::{LlmEnginePort, LlmError};

#[derive(Debug, Serialize)]
struct ContentPart<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: Vec<ContentPart<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Value,
}

/// HTTP LLM 客户端配置
#[derive(Debug, Clone)]
pub struct HttpLlmClientConfig {
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
}

impl Default for HttpLlmClientConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://ark.cn-beijing.volces.com/api/v3/chat/completions".to_string(),
            api_key: String::new(),
            model: "doubao-seed-1-6-250615".to_string(),
            timeout_secs: 120,
        }
    }
}

/// HTTP LLM 客户端
pub struct HttpLlmClient {
    client: Client,
    config: HttpLlmClientConfig,
}

impl HttpLlmClient {
    pub fn new(config: HttpLlmClientConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LlmError::NetworkError(e.to_string()))?;

        Ok(Self { client, config })
    }
}

/// 提取消息文本：字符串原样返回，列表时拼接所有 text 片段
fn extract_content(response: ChatResponse) -> String {
    let Some(content) = response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .map(|message| message.content)
    else {
        return String::new();
    };

    match content {
        Value::String(text) => text,
        Value::Array(parts) => parts
            .iter()
            .filter(|part| part.get("type").and_then(Value::as_str) == Some("text"))
            .filter_map(|part| part.get("text").and_then(Value::as_str))
            .collect(),
        _ => String::new(),
    }
}

#[async_trait]
impl LlmEnginePort for HttpLlmClient {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: vec![ContentPart {
                    kind: "text",
                    text: prompt,
                }],
            }],
        };

        tracing::debug!(
            model = %self.config.model,
            prompt_len = prompt.chars().count(),
            "Sending LLM request"
        );

        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout
                } else if e.is_connect() {
                    LlmError::NetworkError(format!("Cannot connect to LLM service: {}", e))
                } else {
                    LlmError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(LlmError::ServiceError(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let body = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                LlmError::Timeout
            } else {
                LlmError::NetworkError(e.to_string())
            }
        })?;
        let parsed: ChatResponse = serde_json::from_slice(&body)
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        let content = extract_content(parsed);
        if content.trim().is_empty() {
            return Err(LlmError::EmptyContent);
        }

        tracing::debug!(content_len = content.len(), "LLM response received");
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn client(server: &MockServer) -> HttpLlmClient {
        HttpLlmClient::new(HttpLlmClientConfig {
            endpoint: server.url("/chat/completions"),
            api_key: "ark-key".to_string(),
            model: "test-model".to_string(),
            timeout_secs: 5,
        })
        .unwrap()
    }

    fn parse(json: &str) -> ChatResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_extract_string_content() {
        let response = parse(r#"{"choices": [{"message": {"role": "assistant", "content": "[]"}}]}"#);
        assert_eq!(extract_content(response), "[]");
    }

    #[test]
    fn test_extract_text_parts() {
        let response = parse(
            r#"{"choices": [{"message": {"content": [
                {"type": "text", "text": "[{\"a\":"},
                {"type": "image_url", "image_url": {}},
                {"type": "text", "text": "1}]"}
            ]}}]}"#,
        );
        assert_eq!(extract_content(response), r#"[{"a":1}]"#);
    }

    #[test]
    fn test_extract_missing_content() {
        assert_eq!(extract_content(parse(r#"{"choices": []}"#)), "");
        assert_eq!(extract_content(parse(r#"{}"#)), "");
        assert_eq!(extract_content(parse(r#"{"choices": [{"message": null}]}"#)), "");
    }

    #[test]
    fn test_request_shape() {
        let request = ChatRequest {
            model: "doubao-seed-1-6-250615",
            messages: vec![ChatMessage {
                role: "user",
                content: vec![ContentPart {
                    kind: "text",
                    text: "提示词",
                }],
            }],
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["model"], "doubao-seed-1-6-250615");
        assert_eq!(value["messages"][0]["role"], "user");
        assert_eq!(value["messages"][0]["content"][0]["type"], "text");
        assert_eq!(value["messages"][0]["content"][0]["text"], "提示词");
    }

    #[tokio::test]
    async fn test_complete_returns_message_content() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/chat/completions")
                    .header("authorization", "Bearer ark-key");
                then.status(200).json_body(json!({
                    "choices": [{"message": {"role": "assistant", "content": "[]"}}]
                }));
            })
            .await;

        let content = client(&server).complete("提示词").await.unwrap();
        mock.assert_async().await;
        assert_eq!(content, "[]");
    }

    #[tokio::test]
    async fn test_complete_http_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/chat/completions");
                then.status(503).body("overloaded");
            })
            .await;

        match client(&server).complete("提示词").await {
            Err(LlmError::ServiceError(msg)) => assert!(msg.contains("503"), "{msg}"),
            other => panic!("expected ServiceError, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_complete_rejects_bad_envelope() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/chat/completions");
                then.status(200).body("<html>gateway</html>");
            })
            .await;

        assert!(matches!(
            client(&server).complete("提示词").await,
            Err(LlmError::InvalidResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_complete_rejects_blank_content() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/chat/completions");
                then.status(200)
                    .json_body(json!({"choices": [{"message": {"content": "  \n"}}]}));
            })
            .await;

        assert!(matches!(
            client(&server).complete("提示词").await,
            Err(LlmError::EmptyContent)
        ));
    }
}
