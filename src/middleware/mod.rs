//! gRPC 客户端中间件模块
//!
//! 提供重试中间件

pub mod retry;

pub use retry::{
    DEFAULT_CLIENT_TIMEOUT, RetryInvoker, RetryLayer, RetryService, RetryableError,
    RetryableRequest,
};
