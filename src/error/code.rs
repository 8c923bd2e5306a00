//! 错误代码定义
//!
//! 与服务端返回的错误类型一一对应，显示名沿用客户端历史上的错误字符串

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::FailureClass;

/// 缓存客户端错误代码
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidArgumentError,
    TimeoutError,
    CancelledError,
    NotFoundError,
    AlreadyExistsError,
    PermissionError,
    AuthenticationError,
    LimitExceededError,
    FailedPreconditionError,
    InternalServerError,
    ServerUnavailableError,
    UnknownServiceError,
    ClientSdkError,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl ErrorCode {
    /// 获取错误代码的标识符
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidArgumentError => "InvalidArgumentError",
            ErrorCode::TimeoutError => "TimeoutError",
            ErrorCode::CancelledError => "CancelledError",
            ErrorCode::NotFoundError => "NotFoundError",
            ErrorCode::AlreadyExistsError => "AlreadyExistsError",
            ErrorCode::PermissionError => "PermissionError",
            ErrorCode::AuthenticationError => "AuthenticationError",
            ErrorCode::LimitExceededError => "LimitExceededError",
            ErrorCode::FailedPreconditionError => "FailedPreconditionError",
            ErrorCode::InternalServerError => "InternalServerError",
            ErrorCode::ServerUnavailableError => "ServerUnavailableError",
            ErrorCode::UnknownServiceError => "UnknownServiceError",
            ErrorCode::ClientSdkError => "ClientSdkError",
        }
    }

    /// 将 gRPC 状态码映射为错误代码
    pub fn from_grpc(code: tonic::Code) -> Self {
        match code {
            tonic::Code::InvalidArgument | tonic::Code::OutOfRange => {
                ErrorCode::InvalidArgumentError
            }
            tonic::Code::DeadlineExceeded => ErrorCode::TimeoutError,
            tonic::Code::Cancelled => ErrorCode::CancelledError,
            tonic::Code::NotFound => ErrorCode::NotFoundError,
            tonic::Code::AlreadyExists => ErrorCode::AlreadyExistsError,
            tonic::Code::PermissionDenied => ErrorCode::PermissionError,
            tonic::Code::Unauthenticated => ErrorCode::AuthenticationError,
            tonic::Code::ResourceExhausted => ErrorCode::LimitExceededError,
            tonic::Code::FailedPrecondition | tonic::Code::Aborted => {
                ErrorCode::FailedPreconditionError
            }
            tonic::Code::Internal | tonic::Code::DataLoss => ErrorCode::InternalServerError,
            tonic::Code::Unavailable => ErrorCode::ServerUnavailableError,
            tonic::Code::Unimplemented => ErrorCode::UnknownServiceError,
            tonic::Code::Ok | tonic::Code::Unknown => ErrorCode::UnknownServiceError,
        }
    }

    /// 映射回 gRPC 状态码
    pub fn grpc_code(&self) -> tonic::Code {
        match self {
            ErrorCode::InvalidArgumentError => tonic::Code::InvalidArgument,
            ErrorCode::TimeoutError => tonic::Code::DeadlineExceeded,
            ErrorCode::CancelledError => tonic::Code::Cancelled,
            ErrorCode::NotFoundError => tonic::Code::NotFound,
            ErrorCode::AlreadyExistsError => tonic::Code::AlreadyExists,
            ErrorCode::PermissionError => tonic::Code::PermissionDenied,
            ErrorCode::AuthenticationError => tonic::Code::Unauthenticated,
            ErrorCode::LimitExceededError => tonic::Code::ResourceExhausted,
            ErrorCode::FailedPreconditionError => tonic::Code::FailedPrecondition,
            ErrorCode::InternalServerError => tonic::Code::Internal,
            ErrorCode::ServerUnavailableError => tonic::Code::Unavailable,
            ErrorCode::UnknownServiceError => tonic::Code::Unknown,
            ErrorCode::ClientSdkError => tonic::Code::Unknown,
        }
    }

    /// 对应的失败分类
    pub fn failure_class(&self) -> FailureClass {
        self.grpc_code().into()
    }
}
