//! Data Transfer Objects

use serde::Serialize;

// ============================================================================
// 统一响应结构
// ============================================================================

/// 统一 API 响应格式
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub errno: i32,
    pub error: String,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// 成功响应
    pub fn success(data: T) -> Self {
        Self {
            errno: 0,
            error: String::new(),
            data: Some(data),
        }
    }
}

/// 成品下载路径前缀
pub const DOWNLOAD_PATH: &str = "/api/audiobook/download";

/// 拼接成品下载链接
pub fn download_url(base_url: &str, file_name: &str) -> String {
    format!("{}{}/{}", base_url.trim_end_matches('/'), DOWNLOAD_PATH, file_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_url() {
        assert_eq!(
            download_url("http://localhost:5000/", "final_audiobook_book.mp3"),
            "http://localhost:5000/api/audiobook/download/final_audiobook_book.mp3"
        );
    }

    #[test]
    fn test_success_envelope() {
        let json = serde_json::to_value(ApiResponse::success(vec![1, 2])).unwrap();
        assert_eq!(json["errno"], 0);
        assert_eq!(json["error"], "");
        assert_eq!(json["data"], serde_json::json!([1, 2]));
    }
}
