//! Symphonia Concatenator - 片段校验与无重编码拼接
//!
//! - probe: 用 symphonia 完整解码一遍，确认可播放并测量时长
//! - MP3: 去掉每个片段的 ID3v2/ID3v1 标签后直接拼接帧流
//! - WAV: 校验所有片段 fmt 参数一致，拼接 PCM 数据并重写 RIFF 头

use std::io::Cursor;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::application::ports::{AudioConcatenatorPort, AudioError, AudioFormat, ClipInfo};

const ID3V1_LEN: usize = 128;
const WAV_HEADER_LEN: usize = 44;

/// 基于 symphonia 的拼接器
#[derive(Debug, Default, Clone, Copy)]
pub struct SymphoniaConcatenator;

impl SymphoniaConcatenator {
    pub fn new() -> Self {
        Self
    }

    fn concat_mp3(&self, clips: &[Vec<u8>]) -> Vec<u8> {
        let total: usize = clips.iter().map(Vec::len).sum();
        let mut out = Vec::with_capacity(total);
        for clip in clips {
            out.extend_from_slice(strip_id3(clip));
        }
        out
    }

    fn concat_wav(&self, clips: &[Vec<u8>]) -> Result<Vec<u8>, AudioError> {
        let layouts = clips
            .iter()
            .enumerate()
            .map(|(index, clip)| {
                parse_wav(clip).map_err(|e| AudioError::InvalidInput(format!("clip {}: {}", index, e)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let fmt = layouts[0].fmt;
        for (index, layout) in layouts.iter().enumerate().skip(1) {
            if !layout.fmt.same_stream(&fmt) {
                return Err(AudioError::IncompatibleClips(format!(
                    "clip {} is {} Hz/{} ch/{} bit, expected {} Hz/{} ch/{} bit",
                    index,
                    layout.fmt.sample_rate,
                    layout.fmt.num_channels,
                    layout.fmt.bits_per_sample,
                    fmt.sample_rate,
                    fmt.num_channels,
                    fmt.bits_per_sample
                )));
            }
        }

        let data_len: usize = layouts.iter().map(|l| l.data_size).sum();
        if data_len > (u32::MAX as usize) - 36 {
            return Err(AudioError::InvalidInput(
                "Merged WAV exceeds 4 GiB".to_string(),
            ));
        }

        let mut out = Vec::with_capacity(WAV_HEADER_LEN + data_len);
        write_wav_header(&mut out, &fmt, data_len as u32);
        for (clip, layout) in clips.iter().zip(&layouts) {
            out.extend_from_slice(&clip[layout.data_start..layout.data_start + layout.data_size]);
        }
        Ok(out)
    }
}

impl AudioConcatenatorPort for SymphoniaConcatenator {
    fn probe(&self, data: &[u8], format: AudioFormat) -> Result<ClipInfo, AudioError> {
        if data.is_empty() {
            return Err(AudioError::InvalidInput("empty audio data".to_string()));
        }

        let cursor = Cursor::new(data.to_vec());
        let mss = MediaSourceStream::new(Box::new(cursor), Default::default());

        let mut hint = Hint::new();
        hint.with_extension(format.extension());

        let probed = symphonia::default::get_probe()
            .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
            .map_err(|e| AudioError::DecodingError(format!("Probe failed: {}", e)))?;
        let mut reader = probed.format;

        let track = reader
            .default_track()
            .ok_or_else(|| AudioError::DecodingError("No audio track found".to_string()))?;
        let track_id = track.id;
        let params = track.codec_params.clone();

        let mut decoder = symphonia::default::get_codecs()
            .make(&params, &DecoderOptions::default())
            .map_err(|e| AudioError::DecodingError(format!("Decoder creation failed: {}", e)))?;

        let mut frames: u64 = 0;
        let mut sample_rate = params.sample_rate.unwrap_or(0);
        let mut channels = params.channels.map(|c| c.count() as u8).unwrap_or(0);

        loop {
            let packet = match reader.next_packet() {
                Ok(p) => p,
                Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    break;
                }
                Err(e) => {
                    return Err(AudioError::DecodingError(format!("Packet read error: {}", e)));
                }
            };

            if packet.track_id() != track_id {
                continue;
            }

            match decoder.decode(&packet) {
                Ok(decoded) => {
                    let spec = decoded.spec();
                    sample_rate = spec.rate;
                    channels = spec.channels.count() as u8;
                    frames += decoded.frames() as u64;
                }
                Err(SymphoniaError::DecodeError(e)) => {
                    tracing::debug!(error = %e, "Decode error (skipping packet)");
                }
                Err(e) => {
                    return Err(AudioError::DecodingError(format!("Decode failed: {}", e)));
                }
            }
        }

        if frames == 0 || sample_rate == 0 {
            return Err(AudioError::DecodingError(
                "No decodable audio frames".to_string(),
            ));
        }

        Ok(ClipInfo {
            duration_ms: frames * 1000 / sample_rate as u64,
            sample_rate,
            channels,
        })
    }

    fn concat(&self, clips: &[Vec<u8>], format: AudioFormat) -> Result<Vec<u8>, AudioError> {
        if clips.is_empty() {
            return Err(AudioError::InvalidInput("no clips to concatenate".to_string()));
        }

        let merged = match format {
            AudioFormat::Mp3 => self.concat_mp3(clips),
            AudioFormat::Wav => self.concat_wav(clips)?,
        };

        tracing::debug!(
            clips = clips.len(),
            format = %format,
            size = merged.len(),
            "Clips concatenated"
        );
        Ok(merged)
    }
}

/// 去掉开头的 ID3v2 标签与结尾的 ID3v1 标签
fn strip_id3(data: &[u8]) -> &[u8] {
    let mut body = data;

    if body.len() >= 10 && &body[0..3] == b"ID3" {
        // 标签大小为 4 字节 syncsafe 整数，不含 10 字节头；flags bit4 表示带 footer
        let size = body[6..10]
            .iter()
            .fold(0usize, |acc, b| (acc << 7) | (*b as usize & 0x7f));
        let footer = if body[5] & 0x10 != 0 { 10 } else { 0 };
        let end = (10 + size + footer).min(body.len());
        body = &body[end..];
    }

    if body.len() >= ID3V1_LEN && &body[body.len() - ID3V1_LEN..body.len() - ID3V1_LEN + 3] == b"TAG" {
        body = &body[..body.len() - ID3V1_LEN];
    }

    body
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FmtChunk {
    audio_format: u16,
    num_channels: u16,
    sample_rate: u32,
    byte_rate: u32,
    block_align: u16,
    bits_per_sample: u16,
}

impl FmtChunk {
    fn same_stream(&self, other: &FmtChunk) -> bool {
        self.audio_format == other.audio_format
            && self.num_channels == other.num_channels
            && self.sample_rate == other.sample_rate
            && self.bits_per_sample == other.bits_per_sample
    }
}

#[derive(Debug)]
struct WavLayout {
    fmt: FmtChunk,
    data_start: usize,
    data_size: usize,
}

fn read_u16(data: &[u8], pos: usize) -> u16 {
    u16::from_le_bytes([data[pos], data[pos + 1]])
}

fn read_u32(data: &[u8], pos: usize) -> u32 {
    u32::from_le_bytes([data[pos], data[pos + 1], data[pos + 2], data[pos + 3]])
}

/// 定位 fmt 与 data 块
///
/// 流式生成的 WAV 常把 data 大小写成占位值，这里按实际长度截断。
fn parse_wav(data: &[u8]) -> Result<WavLayout, String> {
    if data.len() < WAV_HEADER_LEN {
        return Err("WAV data too short".to_string());
    }
    if &data[0..4] != b"RIFF" || &data[8..12] != b"WAVE" {
        return Err("missing RIFF/WAVE header".to_string());
    }

    let mut pos = 12;
    let mut fmt: Option<FmtChunk> = None;

    while pos + 8 <= data.len() {
        let chunk_id = &data[pos..pos + 4];
        let chunk_size = read_u32(data, pos + 4) as usize;
        let body = pos + 8;

        match chunk_id {
            b"fmt " => {
                if chunk_size < 16 || body + 16 > data.len() {
                    return Err("invalid fmt chunk".to_string());
                }
                fmt = Some(FmtChunk {
                    audio_format: read_u16(data, body),
                    num_channels: read_u16(data, body + 2),
                    sample_rate: read_u32(data, body + 4),
                    byte_rate: read_u32(data, body + 8),
                    block_align: read_u16(data, body + 12),
                    bits_per_sample: read_u16(data, body + 14),
                });
            }
            b"data" => {
                let fmt = fmt.ok_or_else(|| "data chunk before fmt chunk".to_string())?;
                let available = data.len() - body;
                let mut data_size = chunk_size.min(available);
                if fmt.block_align > 0 {
                    data_size -= data_size % fmt.block_align as usize;
                }
                if data_size == 0 {
                    return Err("empty data chunk".to_string());
                }
                return Ok(WavLayout {
                    fmt,
                    data_start: body,
                    data_size,
                });
            }
            _ => {}
        }

        // 块按偶数字节对齐
        pos = body.saturating_add(chunk_size).saturating_add(chunk_size % 2);
    }

    Err(if fmt.is_some() {
        "missing data chunk".to_string()
    } else {
        "missing fmt chunk".to_string()
    })
}

fn write_wav_header(out: &mut Vec<u8>, fmt: &FmtChunk, data_len: u32) {
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_len).to_le_bytes());
    out.extend_from_slice(b"WAVE");

    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&fmt.audio_format.to_le_bytes());
    out.extend_from_slice(&fmt.num_channels.to_le_bytes());
    out.extend_from_slice(&fmt.sample_rate.to_le_bytes());
    out.extend_from_slice(&fmt.byte_rate.to_le_bytes());
    out.extend_from_slice(&fmt.block_align.to_le_bytes());
    out.extend_from_slice(&fmt.bits_per_sample.to_le_bytes());

    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
}

/// 16-bit PCM 单声道 WAV
pub fn encode_pcm16_wav(samples: &[i16], sample_rate: u32) -> Vec<u8> {
    let fmt = FmtChunk {
        audio_format: 1,
        num_channels: 1,
        sample_rate,
        byte_rate: sample_rate * 2,
        block_align: 2,
        bits_per_sample: 16,
    };
    let data_len = samples.len() * 2;
    let mut out = Vec::with_capacity(WAV_HEADER_LEN + data_len);
    write_wav_header(&mut out, &fmt, data_len as u32);
    for sample in samples {
        out.extend_from_slice(&sample.to_le_bytes());
    }
    out
}
