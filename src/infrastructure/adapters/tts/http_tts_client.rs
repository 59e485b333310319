//! HTTP TTS Client - 调用火山引擎单向流式语音合成
//!
//! 实现 TtsEnginePort trait
//!
//! 外部 TTS API:
//! POST https://openspeech.bytedance.com/api/v3/tts/unidirectional
//! Headers: X-Api-App-Id / X-Api-Access-Key / X-Api-Resource-Id / X-Api-Request-Id
//! Request: {"user": {"uid"}, "req_params": {"text", "speaker", "audio_params", "namespace"}}
//! Response: 分块流，JSON 信封（base64 音频）或原始音频字节，见 chunk_decoder

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use uuid::Uuid;

use super::chunk_decoder::{ChunkDecoder, TtsFrame};
use crate::application::ports::{SynthesisRequest, SynthesisResponse, TtsEnginePort, TtsError};

#[derive(Debug, Serialize)]
struct TtsUser {
    uid: String,
}

#[derive(Debug, Serialize)]
struct AudioParams<'a> {
    format: &'a str,
    sample_rate: u32,
    bit_rate: u32,
}

#[derive(Debug, Serialize)]
struct ReqParams<'a> {
    text: &'a str,
    speaker: &'a str,
    audio_params: AudioParams<'a>,
    namespace: &'static str,
}

/// TTS 请求体 (JSON)
#[derive(Debug, Serialize)]
struct TtsHttpRequest<'a> {
    user: TtsUser,
    req_params: ReqParams<'a>,
}

/// HTTP TTS 客户端配置
#[derive(Debug, Clone)]
pub struct HttpTtsClientConfig {
    /// 合成接口完整 URL
    pub endpoint: String,
    pub app_id: String,
    pub access_key: String,
    pub resource_id: String,
    /// 请求超时时间（秒），覆盖整个流
    pub timeout_secs: u64,
    pub sample_rate: u32,
    pub bit_rate: u32,
}

impl Default for HttpTtsClientConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://openspeech.bytedance.com/api/v3/tts/unidirectional".to_string(),
            app_id: String::new(),
            access_key: String::new(),
            resource_id: "volc.service_type.10029".to_string(),
            timeout_secs: 60,
            sample_rate: 24000,
            bit_rate: 160,
        }
    }
}

impl HttpTtsClientConfig {
    pub fn new(app_id: impl Into<String>, access_key: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            access_key: access_key.into(),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// HTTP TTS 客户端
pub struct HttpTtsClient {
    client: Client,
    config: HttpTtsClientConfig,
}

impl HttpTtsClient {
    /// 创建新的 HTTP TTS 客户端
    pub fn new(config: HttpTtsClientConfig) -> Result<Self, TtsError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TtsError::NetworkError(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn map_send_error(e: reqwest::Error) -> TtsError {
        if e.is_timeout() {
            TtsError::Timeout
        } else if e.is_connect() {
            TtsError::NetworkError(format!("Cannot connect to TTS service: {}", e))
        } else {
            TtsError::NetworkError(e.to_string())
        }
    }
}

#[async_trait]
impl TtsEnginePort for HttpTtsClient {
    async fn synthesize(&self, request: SynthesisRequest) -> Result<SynthesisResponse, TtsError> {
        let request_id = Uuid::new_v4().to_string();
        let body = TtsHttpRequest {
            user: TtsUser {
                uid: Uuid::new_v4().to_string(),
            },
            req_params: ReqParams {
                text: &request.text,
                speaker: &request.voice_id,
                audio_params: AudioParams {
                    format: request.format.extension(),
                    sample_rate: self.config.sample_rate,
                    bit_rate: self.config.bit_rate,
                },
                namespace: "BidirectionalTTS",
            },
        };

        tracing::debug!(
            request_id = %request_id,
            voice_id = %request.voice_id,
            text_len = request.text.chars().count(),
            "Sending TTS request"
        );

        let response = self
            .client
            .post(&self.config.endpoint)
            .header("X-Api-App-Id", &self.config.app_id)
            .header("X-Api-Access-Key", &self.config.access_key)
            .header("X-Api-Resource-Id", &self.config.resource_id)
            .header("X-Api-Request-Id", &request_id)
            .json(&body)
            .send()
            .await
            .map_err(Self::map_send_error)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(TtsError::ServiceError(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let mut stream = response.bytes_stream();
        let mut decoder = ChunkDecoder::new();
        let mut audio_data = Vec::new();
        let mut chunk_count = 0usize;

        let apply = |frames: Vec<TtsFrame>, audio_data: &mut Vec<u8>| {
            for frame in frames {
                match frame {
                    TtsFrame::Audio(bytes) => audio_data.extend_from_slice(&bytes),
                    TtsFrame::End => {
                        tracing::debug!(request_id = %request_id, "TTS stream finished")
                    }
                    TtsFrame::Ignored { code, message } => tracing::warn!(
                        request_id = %request_id,
                        code,
                        message = %message,
                        "TTS envelope carried no audio"
                    ),
                }
            }
        };

        while let Some(item) = stream.next().await {
            let bytes = item.map_err(|e| {
                if e.is_timeout() {
                    TtsError::Timeout
                } else {
                    TtsError::StreamError(e.to_string())
                }
            })?;
            chunk_count += 1;
            apply(decoder.feed(&bytes), &mut audio_data);
            if decoder.is_finished() {
                break;
            }
        }
        apply(decoder.finish(), &mut audio_data);

        if audio_data.is_empty() {
            return Err(TtsError::EmptyAudio);
        }

        tracing::info!(
            request_id = %request_id,
            voice_id = %request.voice_id,
            chunks = chunk_count,
            audio_size = audio_data.len(),
            "TTS synthesis completed"
        );

        Ok(SynthesisResponse {
            request_id,
            audio_data,
            chunk_count,
        })
    }
}
