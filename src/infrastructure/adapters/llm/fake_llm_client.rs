//! Fake LLM Client - 按脚本返回预设内容，记录收到的提示词

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::application::ports::{LlmEnginePort, LlmError};

/// Fake LLM Client
///
/// 队列为空时返回 `[]`（段落不产生话语）
#[derive(Default)]
pub struct FakeLlmClient {
    script: Mutex<VecDeque<Result<String, LlmError>>>,
    prompts: Mutex<Vec<String>>,
}

impl FakeLlmClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_response(&self, content: impl Into<String>) {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(Ok(content.into()));
        }
    }

    pub fn push_error(&self, error: LlmError) {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(Err(error));
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl LlmEnginePort for FakeLlmClient {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }

        let next = self.script.lock().ok().and_then(|mut s| s.pop_front());
        next.unwrap_or_else(|| Ok("[]".to_string()))
    }
}
