//! Fake TTS Client - 用于测试的 TTS 客户端
//!
//! 不调用任何网络服务，为每条文本生成一段 16-bit 单声道 WAV：
//! 所有采样值都等于该文本的标记值，拼接结果可以反查片段顺序。

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;

use crate::application::ports::{SynthesisRequest, SynthesisResponse, TtsEnginePort, TtsError};
use crate::infrastructure::adapters::audio::encode_pcm16_wav;

/// Fake TTS Client 配置
#[derive(Debug, Clone)]
pub struct FakeTtsClientConfig {
    /// 生成片段的采样率
    pub sample_rate: u32,
    /// 每个片段的采样数
    pub samples_per_clip: usize,
    /// 模拟延迟上限（毫秒），实际延迟随文本变化
    pub max_latency_ms: u64,
}

impl Default for FakeTtsClientConfig {
    fn default() -> Self {
        Self {
            sample_rate: 24000,
            samples_per_clip: 2400,
            max_latency_ms: 15,
        }
    }
}

/// Fake TTS Client
pub struct FakeTtsClient {
    config: FakeTtsClientConfig,
    failing: Mutex<HashSet<String>>,
    calls: Mutex<Vec<(String, String)>>,
}

impl FakeTtsClient {
    pub fn new() -> Self {
        Self::with_config(FakeTtsClientConfig::default())
    }

    pub fn with_config(config: FakeTtsClientConfig) -> Self {
        Self {
            config,
            failing: Mutex::new(HashSet::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// 之后对这段文本的合成一律以网络错误失败
    pub fn fail_on(&self, text: impl Into<String>) {
        if let Ok(mut failing) = self.failing.lock() {
            failing.insert(text.into());
        }
    }

    /// 已收到的 (voice_id, text) 调用记录
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// 文本对应的采样标记值（FNV-1a，非零）
    pub fn marker_for(text: &str) -> i16 {
        let hash = text
            .bytes()
            .fold(0x811c_9dc5u32, |acc, b| (acc ^ b as u32).wrapping_mul(0x0100_0193));
        (hash % 30_000) as i16 + 1
    }

    /// 从拼接后的 WAV 中按顺序读出片段标记
    pub fn markers_in(wav: &[u8]) -> Vec<i16> {
        let Some(body) = wav.get(44..) else {
            return Vec::new();
        };
        let mut markers: Vec<i16> = Vec::new();
        for pair in body.chunks_exact(2) {
            let sample = i16::from_le_bytes([pair[0], pair[1]]);
            if markers.last() != Some(&sample) {
                markers.push(sample);
            }
        }
        markers
    }

    fn latency_for(&self, text: &str) -> Duration {
        let max = self.config.max_latency_ms.max(1);
        Duration::from_millis(Self::marker_for(text) as u64 % max)
    }
}

impl Default for FakeTtsClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TtsEnginePort for FakeTtsClient {
    async fn synthesize(&self, request: SynthesisRequest) -> Result<SynthesisResponse, TtsError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((request.voice_id.clone(), request.text.clone()));
        }

        tokio::time::sleep(self.latency_for(&request.text)).await;

        let should_fail = self
            .failing
            .lock()
            .map(|f| f.contains(&request.text))
            .unwrap_or(false);
        if should_fail {
            tracing::debug!(text = %request.text, "FakeTtsClient: simulated failure");
            return Err(TtsError::NetworkError("simulated network failure".to_string()));
        }

        let marker = Self::marker_for(&request.text);
        let samples = vec![marker; self.config.samples_per_clip];
        let audio_data = encode_pcm16_wav(&samples, self.config.sample_rate);

        tracing::debug!(
            voice_id = %request.voice_id,
            text_len = request.text.len(),
            marker,
            "FakeTtsClient: returning generated audio"
        );

        Ok(SynthesisResponse {
            request_id: format!("fake-{}", uuid::Uuid::new_v4()),
            audio_data,
            chunk_count: 1,
        })
    }
}
