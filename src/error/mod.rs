//! 错误处理模块
//!
//! 提供统一的错误类型、错误代码以及与 gRPC 状态之间的转换

pub mod cache_error;
pub mod code;
pub mod grpc;

pub use cache_error::{CacheError, Result};
pub use code::ErrorCode;

/// 基础设施层（配置加载等）使用的结果类型
pub type InfraResult<T> = anyhow::Result<T>;
