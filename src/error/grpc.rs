//! gRPC 错误处理
//!
//! 提供 tonic `Status` 与 `CacheError` 之间的转换

use super::{CacheError, ErrorCode};
use tonic::Status;

/// 服务端返回错误详情时使用的 metadata 键
const ERROR_DETAILS_KEY: &str = "error-details";

impl From<Status> for CacheError {
    fn from(status: Status) -> Self {
        CacheError::from(&status)
    }
}

impl From<&Status> for CacheError {
    fn from(status: &Status) -> Self {
        let error = CacheError::new(ErrorCode::from_grpc(status.code()), status.message());
        match status
            .metadata()
            .get(ERROR_DETAILS_KEY)
            .and_then(|v| v.to_str().ok())
        {
            Some(details) => error.with_details(details),
            None => error,
        }
    }
}

impl From<CacheError> for Status {
    fn from(err: CacheError) -> Self {
        Status::from(&err)
    }
}

impl From<&CacheError> for Status {
    fn from(err: &CacheError) -> Self {
        let mut status = Status::new(err.code().grpc_code(), err.message());
        if let Some(details) = err.details() {
            if let Ok(value) = details.parse() {
                status.metadata_mut().insert(ERROR_DETAILS_KEY, value);
            }
        }
        status
    }
}

impl From<tokio::time::error::Elapsed> for CacheError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        CacheError::timeout("context deadline exceeded")
    }
}
