//! Audio Adapter - 片段校验与拼接

mod concatenator;

pub use concatenator::{encode_pcm16_wav, SymphoniaConcatenator};
