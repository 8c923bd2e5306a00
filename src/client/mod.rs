//! 缓存客户端传输层模块
//!
//! 提供传输层 trait、单键调用响应类型以及带重试的传输层包装

pub mod response;
pub mod retrying;
pub mod transport;

pub use response::{DeleteResponse, GetResponse, KeysExistResponse, SetResponse};
pub use retrying::RetryingTransport;
pub use transport::CacheTransport;
