//! 缓存客户端统一错误类型

use super::code::ErrorCode;
use crate::types::FailureClass;
use thiserror::Error;

/// 缓存客户端统一错误类型
///
/// 每个错误携带一个错误代码与说明，单条远程调用失败、批量操作中单个键的失败
/// 以及整批的准备失败都使用它表达
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{code}: {message}")]
pub struct CacheError {
    code: ErrorCode,
    message: String,
    details: Option<String>,
}

impl CacheError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// 添加错误详情
    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    // ============================================================
    // 便捷构造方法
    // ============================================================

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidArgumentError, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::TimeoutError, message)
    }

    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::CancelledError, message)
    }

    pub fn already_exists(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::AlreadyExistsError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalServerError, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ServerUnavailableError, message)
    }

    pub fn client_sdk(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ClientSdkError, message)
    }

    // ============================================================
    // 信息获取方法
    // ============================================================

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn details(&self) -> Option<&str> {
        self.details.as_deref()
    }

    /// 错误对应的失败分类
    pub fn failure_class(&self) -> FailureClass {
        self.code.failure_class()
    }
}

/// 结果类型别名
pub type Result<T> = std::result::Result<T, CacheError>;
