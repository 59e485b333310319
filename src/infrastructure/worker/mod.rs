//! Worker Layer - 后台生成任务

mod generation_worker;

pub use generation_worker::{GenerationWorker, GenerationWorkerConfig};
