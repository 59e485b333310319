//! Memory Layer - In-Memory State Management
//!
//! 生成项目的状态记录只存在内存中，进程重启后丢失

mod project_store;

pub use project_store::InMemoryProjectStore;
