//! Speaker Annotator - 说话人标注
//!
//! 把一个段落交给 LLM 拆分为有序的（说话人, 音色, 文本），并负责：
//! - 解析与校验 LLM 输出（音色必须在目录中，否则改用旁白音色）
//! - 别名归一到规范名
//! - 新角色的音色回写注册表，保证跨段落音色一致
//! - 任何后端故障都降级为一条旁白话语，流水线不中断

use serde_json::Value;
use std::sync::Arc;

use crate::application::ports::{LlmEnginePort, LlmError, VoiceRegistryPort};
use crate::domain::character::RegistrySnapshot;
use crate::domain::voice::VoiceCatalog;
use crate::domain::{Annotation, FallbackReason, Utterance};

/// LLM 返回空内容时朗读的提示
pub const EMPTY_CONTENT_MESSAGE: &str = "LLM返回内容为空或格式不正确。";

/// 旁白配置
#[derive(Debug, Clone)]
pub struct NarratorConfig {
    /// 旁白规范名
    pub name: String,
    /// 默认旁白音色（必须在音色目录中）
    pub default_voice_id: String,
}

impl Default for NarratorConfig {
    fn default() -> Self {
        Self {
            name: "旁白".to_string(),
            default_voice_id: "zh_male_jieshuoxiaoming_moon_bigtts".to_string(),
        }
    }
}

/// LLM 输出中的一个条目（字段均可能缺失）
#[derive(Debug, Clone, PartialEq)]
struct RawItem {
    speaker_name: Option<String>,
    speaker_voice_id: Option<String>,
    text: Option<String>,
}

impl RawItem {
    fn from_value(value: &Value) -> Self {
        let field = |key: &str| value.get(key).and_then(Value::as_str).map(str::to_string);
        Self {
            speaker_name: field("speaker_name"),
            speaker_voice_id: field("speaker_voice_id"),
            text: field("text"),
        }
    }
}

/// 通过校验、尚未归一的条目
struct ValidatedItem {
    speaker: String,
    voice_id: String,
    text: String,
}

/// 说话人标注器
pub struct SpeakerAnnotator {
    llm: Arc<dyn LlmEnginePort>,
    registry: Arc<dyn VoiceRegistryPort>,
    catalog: Arc<VoiceCatalog>,
    narrator: NarratorConfig,
}

impl SpeakerAnnotator {
    pub fn new(
        llm: Arc<dyn LlmEnginePort>,
        registry: Arc<dyn VoiceRegistryPort>,
        catalog: Arc<VoiceCatalog>,
        narrator: NarratorConfig,
    ) -> Self {
        Self {
            llm,
            registry,
            catalog,
            narrator,
        }
    }

    pub fn narrator(&self) -> &NarratorConfig {
        &self.narrator
    }

    pub fn catalog(&self) -> &VoiceCatalog {
        &self.catalog
    }

    /// 标注一个段落
    ///
    /// 永不返回错误：后端故障变成可听见的旁白提示，缺字段的输出整段丢弃。
    pub async fn annotate(&self, paragraph: &str, snapshot: &RegistrySnapshot) -> Annotation {
        let narrator_voice = self.narrator_voice(snapshot);
        let prompt = build_prompt(paragraph, snapshot, &self.catalog);

        let content = match self.llm.complete(&prompt).await {
            Ok(content) => content,
            Err(LlmError::EmptyContent) => {
                tracing::warn!("LLM response content is empty");
                return self.fallback(
                    narrator_voice,
                    EMPTY_CONTENT_MESSAGE.to_string(),
                    FallbackReason::EmptyContent,
                );
            }
            Err(LlmError::InvalidResponse(detail)) => {
                tracing::warn!(error = %detail, "LLM response envelope is malformed");
                return self.fallback(
                    narrator_voice,
                    format!("LLM返回JSON解析失败: {}", detail),
                    FallbackReason::MalformedResponse(detail),
                );
            }
            Err(e) => {
                tracing::error!(error = %e, "LLM call failed");
                return self.fallback(
                    narrator_voice,
                    format!("LLM API调用失败: {}", e),
                    FallbackReason::BackendUnavailable(e.to_string()),
                );
            }
        };

        let raw_items = match parse_items(&content) {
            Some(items) => items,
            None => {
                let text = content.trim();
                if text.is_empty() {
                    return self.fallback(
                        narrator_voice,
                        EMPTY_CONTENT_MESSAGE.to_string(),
                        FallbackReason::EmptyContent,
                    );
                }
                tracing::warn!(
                    content_len = text.len(),
                    "LLM response is not a JSON array, reading it as a single narrator segment"
                );
                return self.fallback(
                    narrator_voice,
                    text.to_string(),
                    FallbackReason::UnparsableContent,
                );
            }
        };

        let validated = match self.validate(raw_items, &narrator_voice) {
            Ok(items) => items,
            Err(reason) => {
                tracing::warn!(reason = %reason, "LLM response format invalid after validation");
                return Annotation::Rejected { reason };
            }
        };

        let mut utterances = Vec::with_capacity(validated.len());
        for item in validated {
            let (speaker, voice_id) = self.settle_voice(&item.speaker, item.voice_id).await;
            utterances.push(Utterance::new(speaker, voice_id, item.text));
        }

        tracing::debug!(count = utterances.len(), "Paragraph annotated");
        Annotation::Attributed(utterances)
    }

    /// 旁白当前音色：注册表中的值（需在目录内），否则默认值
    fn narrator_voice(&self, snapshot: &RegistrySnapshot) -> String {
        snapshot
            .voice_of(&self.narrator.name)
            .filter(|v| self.catalog.contains(v))
            .unwrap_or(&self.narrator.default_voice_id)
            .to_string()
    }

    fn fallback(&self, voice_id: String, text: String, reason: FallbackReason) -> Annotation {
        Annotation::Fallback {
            utterance: Utterance::new(self.narrator.name.clone(), voice_id, text),
            reason,
        }
    }

    /// 校验所有条目：非法音色改为旁白音色；缺少说话人或文本则整段拒绝
    fn validate(
        &self,
        items: Vec<RawItem>,
        narrator_voice: &str,
    ) -> Result<Vec<ValidatedItem>, String> {
        let mut validated = Vec::with_capacity(items.len());

        for (position, item) in items.into_iter().enumerate() {
            let voice_id = match item.speaker_voice_id {
                Some(voice) if self.catalog.contains(&voice) => voice,
                suggested => {
                    tracing::warn!(
                        suggested = ?suggested,
                        fallback = %narrator_voice,
                        "LLM suggested invalid voice ID, falling back to narrator voice"
                    );
                    narrator_voice.to_string()
                }
            };

            let speaker = item
                .speaker_name
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty());
            let (Some(speaker), Some(text)) = (speaker, item.text) else {
                return Err(format!(
                    "item {} is missing speaker_name or text",
                    position
                ));
            };

            let text = text.trim();
            if text.is_empty() {
                tracing::debug!(speaker = %speaker, "Skipping empty text segment");
                continue;
            }

            validated.push(ValidatedItem {
                speaker,
                voice_id,
                text: text.to_string(),
            });
        }

        Ok(validated)
    }

    /// 归一说话人并确定最终音色
    ///
    /// - 已知角色且注册音色在目录中：使用注册音色
    /// - 已知角色但没有可用音色、或新角色：使用校验后的建议音色并回写注册表
    async fn settle_voice(&self, speaker: &str, suggested: String) -> (String, String) {
        let canonical = self
            .registry
            .resolve(speaker)
            .await
            .unwrap_or_else(|| speaker.to_string());

        if let Some(registered) = self.registry.get_voice(&canonical).await {
            if self.catalog.contains(&registered) {
                if registered != suggested {
                    tracing::debug!(
                        speaker = %canonical,
                        registered = %registered,
                        suggested = %suggested,
                        "Keeping registered voice"
                    );
                }
                return (canonical, registered);
            }
        }

        match self.registry.set_voice(&canonical, &suggested).await {
            Ok(()) => tracing::info!(
                speaker = %canonical,
                voice_id = %suggested,
                "Assigned voice to character"
            ),
            Err(e) => tracing::warn!(
                speaker = %canonical,
                error = %e,
                "Failed to persist voice assignment"
            ),
        }

        (canonical, suggested)
    }
}

/// 去掉模型常见的 Markdown 代码围栏
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric());
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// 解析为条目列表；不是 JSON 数组（或单个对象）时返回 None
fn parse_items(content: &str) -> Option<Vec<RawItem>> {
    let value: Value = serde_json::from_str(strip_code_fence(content)).ok()?;
    match value {
        Value::Array(values) => Some(values.iter().map(RawItem::from_value).collect()),
        object @ Value::Object(_) => Some(vec![RawItem::from_value(&object)]),
        _ => None,
    }
}

fn pretty_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}

/// 构建标注提示词
pub fn build_prompt(paragraph: &str, snapshot: &RegistrySnapshot, catalog: &VoiceCatalog) -> String {
    format!(
        r#"你是一个专业的有声书制作助手。你的任务是分析小说文本，识别说话者，并为他们分配合适的音色。
请严格按照以下步骤和输出格式进行：

1.  **分析文本：** 仔细阅读以下文本块。
2.  **识别角色和别名：** 识别文本中出现的所有角色及其别名。如果发现新的别名，请将其关联到已知的规范角色名。
3.  **音色分配：**
    *   对于已知的角色（在“当前角色音色映射”中），请严格使用其已分配的音色ID。
    *   对于新识别的角色（不在“当前角色音色映射”中），请根据角色在文本中的描述（例如，性别、年龄、性格），从“可用音色元数据”中**严格选择一个存在的音色ID**。确保音色选择与角色特征匹配。
    *   旁白请使用已分配的旁白音色。
4.  **输出格式：** 严格以 JSON 数组的形式输出，按阅读顺序排列，每个元素是一个字典，包含 'speaker_name', 'speaker_voice_id', 'text'。
    *   'speaker_name' 必须是规范的角色名（如果存在别名，请转换为规范名）。
    *   'speaker_voice_id' 必须是分配给该角色的音色ID，**且必须是“可用音色元数据”中存在的有效ID**。
    *   'text' 是对应的文本内容。

--- 文本块 ---
{paragraph}

--- 当前角色别名映射 ---
{aliases}

--- 当前角色音色映射 ---
{voices}

--- 可用音色元数据 ---
{catalog}

请直接输出 JSON 数组，不要包含任何其他文字或解释。
"#,
        paragraph = paragraph,
        aliases = pretty_json(&snapshot.aliases),
        voices = pretty_json(&snapshot.voices),
        catalog = pretty_json(catalog),
    )
}
