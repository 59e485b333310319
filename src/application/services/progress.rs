//! 生成进度回报与协作式取消

/// 组装器在段落/话语之间调用的进度出口
pub trait ProgressSink: Send + Sync {
    /// 报告粗粒度进度
    fn report(&self, message: String);

    /// 是否已请求取消（在每条话语之前检查）
    fn is_cancelled(&self) -> bool;
}

/// 不回报、不取消
pub struct NoopProgress;

impl ProgressSink for NoopProgress {
    fn report(&self, _message: String) {}

    fn is_cancelled(&self) -> bool {
        false
    }
}
