//! TTS 流式响应分帧解码
//!
//! 传输分块与 JSON 信封之间没有对齐保证：一个分块可能包含多个信封，
//! 一个信封也可能跨越多个分块。解码器缓冲字节并增量解析连续的 JSON 值。
//!
//! 信封语义：
//! - `code == 0` 且 `data` 非空：base64 音频片段
//! - `code == 20000000`：流结束
//! - 其它：记录后忽略
//! - 不是 JSON 的字节：原样作为音频

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::Value;

/// 流结束状态码
pub const END_OF_STREAM_CODE: i64 = 20_000_000;

/// 解码出的一帧
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TtsFrame {
    /// 音频字节（按到达顺序追加）
    Audio(Vec<u8>),
    /// 服务端声明流结束
    End,
    /// 无音频的信封
    Ignored { code: i64, message: String },
}

/// 增量分帧解码器
#[derive(Debug, Default)]
pub struct ChunkDecoder {
    buffer: Vec<u8>,
    finished: bool,
}

impl ChunkDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 是否已收到结束信封
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// 送入一个传输分块，返回本次能确定的帧
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<TtsFrame> {
        if self.finished {
            return Vec::new();
        }
        self.buffer.extend_from_slice(chunk);

        let mut frames = Vec::new();
        loop {
            let start = match self.buffer.iter().position(|b| !b.is_ascii_whitespace()) {
                Some(start) => start,
                // 只有空白：可能是信封之间的分隔符，等下一块
                None => break,
            };

            if self.buffer[start] != b'{' {
                frames.push(TtsFrame::Audio(std::mem::take(&mut self.buffer)));
                break;
            }

            let mut values =
                serde_json::Deserializer::from_slice(&self.buffer[start..]).into_iter::<Value>();
            match values.next() {
                Some(Ok(value)) => {
                    let consumed = start + values.byte_offset();
                    self.buffer.drain(..consumed);
                    let frame = interpret(value);
                    let end = frame == TtsFrame::End;
                    frames.push(frame);
                    if end {
                        self.finished = true;
                        self.buffer.clear();
                        break;
                    }
                }
                // 信封被分块截断，等待后续字节
                Some(Err(e)) if e.is_eof() => break,
                Some(Err(_)) => {
                    frames.push(TtsFrame::Audio(std::mem::take(&mut self.buffer)));
                    break;
                }
                None => break,
            }
        }
        frames
    }

    /// 流结束时冲刷残留字节（作为原始音频）
    pub fn finish(&mut self) -> Vec<TtsFrame> {
        let rest = std::mem::take(&mut self.buffer);
        if self.finished || rest.iter().all(|b| b.is_ascii_whitespace()) {
            return Vec::new();
        }
        vec![TtsFrame::Audio(rest)]
    }
}

fn interpret(value: Value) -> TtsFrame {
    let code = value.get("code").and_then(Value::as_i64).unwrap_or(0);
    let message = value
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    if code == END_OF_STREAM_CODE {
        return TtsFrame::End;
    }

    if code == 0 {
        if let Some(data) = value.get("data").and_then(Value::as_str).filter(|d| !d.is_empty()) {
            return match STANDARD.decode(data) {
                Ok(bytes) => TtsFrame::Audio(bytes),
                Err(e) => TtsFrame::Ignored {
                    code,
                    message: format!("invalid base64 audio: {}", e),
                },
            };
        }
    }

    TtsFrame::Ignored { code, message }
}
