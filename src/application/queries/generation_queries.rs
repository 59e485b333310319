//! Generation Queries - 生成状态与成品下载

use std::path::PathBuf;

/// 按句柄查询生成状态
#[derive(Debug, Clone)]
pub struct QueryGenerationStatus {
    pub handle: String,
}

/// 按文件名获取成品有声书
#[derive(Debug, Clone)]
pub struct GetAudiobookFile {
    pub file_name: String,
}

/// 已定位的成品文件（内容由 HTTP 层流式读取）
#[derive(Debug, Clone)]
pub struct AudiobookFile {
    pub file_name: String,
    pub path: PathBuf,
    pub content_type: &'static str,
}
