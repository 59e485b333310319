//! TTS Adapter - 流式语音合成客户端实现

mod chunk_decoder;
mod fake_tts_client;
mod http_tts_client;

pub use chunk_decoder::{ChunkDecoder, TtsFrame, END_OF_STREAM_CODE};
pub use fake_tts_client::{FakeTtsClient, FakeTtsClientConfig};
pub use http_tts_client::{HttpTtsClient, HttpTtsClientConfig};
