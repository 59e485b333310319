//! 话语（Utterance）与段落标注结果
//!
//! LLM 返回的松散 JSON 在标注器边界就被收敛成这里的强类型结果，
//! 之后的流水线只接触 `Utterance`。

use serde::{Deserialize, Serialize};

/// 一条已归属说话人、已分配音色的文本
///
/// 不变量:
/// - text 非空
/// - voice_id 属于音色目录（否则在合成前已被替换为旁白音色）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utterance {
    /// 说话人规范名
    pub speaker: String,
    /// 音色 ID
    pub voice_id: String,
    /// 要朗读的文本
    pub text: String,
}

impl Utterance {
    pub fn new(
        speaker: impl Into<String>,
        voice_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            speaker: speaker.into(),
            voice_id: voice_id.into(),
            text: text.into(),
        }
    }
}

/// 降级为旁白单句的原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    /// LLM 网络/HTTP 调用失败
    BackendUnavailable(String),
    /// LLM 返回内容为空
    EmptyContent,
    /// LLM 响应信封无法解析
    MalformedResponse(String),
    /// LLM 内容不是合法的 JSON 数组，原文整体作为旁白朗读
    UnparsableContent,
}

/// 单个段落的标注结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Annotation {
    /// 正常标注，按阅读顺序排列
    Attributed(Vec<Utterance>),
    /// 降级结果：一条旁白话语
    Fallback {
        utterance: Utterance,
        reason: FallbackReason,
    },
    /// 契约违反（条目缺字段），本段不产生任何话语
    Rejected { reason: String },
}

impl Annotation {
    pub fn is_fallback(&self) -> bool {
        matches!(self, Annotation::Fallback { .. })
    }

    pub fn into_utterances(self) -> Vec<Utterance> {
        match self {
            Annotation::Attributed(utterances) => utterances,
            Annotation::Fallback { utterance, .. } => vec![utterance],
            Annotation::Rejected { .. } => Vec::new(),
        }
    }
}
