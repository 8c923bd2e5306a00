//! 公共类型
//!
//! 缓存键值、操作名称与失败分类

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// 缓存键
///
/// 以原始字节保存，批量结果按键建立关联
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(Bytes);

impl CacheKey {
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for CacheKey {
    fn from(value: &str) -> Self {
        Self(Bytes::copy_from_slice(value.as_bytes()))
    }
}

impl From<String> for CacheKey {
    fn from(value: String) -> Self {
        Self(Bytes::from(value))
    }
}

impl From<Vec<u8>> for CacheKey {
    fn from(value: Vec<u8>) -> Self {
        Self(Bytes::from(value))
    }
}

impl From<Bytes> for CacheKey {
    fn from(value: Bytes) -> Self {
        Self(value)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

/// 缓存值
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheValue(Bytes);

impl CacheValue {
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// 按 UTF-8 解码（非法字节被替换）
    pub fn as_string(&self) -> String {
        String::from_utf8_lossy(&self.0).into_owned()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for CacheValue {
    fn from(value: &str) -> Self {
        Self(Bytes::copy_from_slice(value.as_bytes()))
    }
}

impl From<String> for CacheValue {
    fn from(value: String) -> Self {
        Self(Bytes::from(value))
    }
}

impl From<Vec<u8>> for CacheValue {
    fn from(value: Vec<u8>) -> Self {
        Self(Bytes::from(value))
    }
}

impl From<Bytes> for CacheValue {
    fn from(value: Bytes) -> Self {
        Self(value)
    }
}

/// 远程操作名称
///
/// 仅用于查询幂等性/可重试性，形如 `Get`、`DictionaryIncrement`、`TopicSubscribe`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OperationName(Cow<'static, str>);

impl OperationName {
    pub const GET: OperationName = OperationName::from_static("Get");
    pub const SET: OperationName = OperationName::from_static("Set");
    pub const DELETE: OperationName = OperationName::from_static("Delete");
    pub const KEYS_EXIST: OperationName = OperationName::from_static("KeysExist");
    pub const TOPIC_SUBSCRIBE: OperationName = OperationName::from_static("TopicSubscribe");

    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn new(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    /// 从 gRPC 方法路径解析操作名称
    ///
    /// `/cache_client.Scs/Get` -> `Get`，
    /// `/cache_client.pubsub.Pubsub/Subscribe` -> `TopicSubscribe`
    pub fn from_grpc_path(path: &str) -> Self {
        let trimmed = path.trim_start_matches('/');
        match trimmed.rsplit_once('/') {
            Some((service, method)) if service.ends_with(".Pubsub") => {
                Self::new(format!("Topic{method}"))
            }
            Some((_, method)) => Self::new(method),
            None => Self::new(trimmed),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OperationName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for OperationName {
    fn from(value: &'static str) -> Self {
        Self::from_static(value)
    }
}

/// 远程调用失败分类
///
/// 由传输层根据 gRPC 状态码产生，重试策略只依据它做决定
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureClass {
    Unavailable,
    Internal,
    DeadlineExceeded,
    Cancelled,
    InvalidArgument,
    ResourceExhausted,
    PermissionDenied,
    NotFound,
    AlreadyExists,
    Unauthenticated,
    FailedPrecondition,
    Aborted,
    OutOfRange,
    Unimplemented,
    DataLoss,
    Unknown,
}

impl FailureClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureClass::Unavailable => "UNAVAILABLE",
            FailureClass::Internal => "INTERNAL",
            FailureClass::DeadlineExceeded => "DEADLINE_EXCEEDED",
            FailureClass::Cancelled => "CANCELLED",
            FailureClass::InvalidArgument => "INVALID_ARGUMENT",
            FailureClass::ResourceExhausted => "RESOURCE_EXHAUSTED",
            FailureClass::PermissionDenied => "PERMISSION_DENIED",
            FailureClass::NotFound => "NOT_FOUND",
            FailureClass::AlreadyExists => "ALREADY_EXISTS",
            FailureClass::Unauthenticated => "UNAUTHENTICATED",
            FailureClass::FailedPrecondition => "FAILED_PRECONDITION",
            FailureClass::Aborted => "ABORTED",
            FailureClass::OutOfRange => "OUT_OF_RANGE",
            FailureClass::Unimplemented => "UNIMPLEMENTED",
            FailureClass::DataLoss => "DATA_LOSS",
            FailureClass::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for FailureClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<tonic::Code> for FailureClass {
    fn from(code: tonic::Code) -> Self {
        match code {
            tonic::Code::Unavailable => FailureClass::Unavailable,
            tonic::Code::Internal => FailureClass::Internal,
            tonic::Code::DeadlineExceeded => FailureClass::DeadlineExceeded,
            tonic::Code::Cancelled => FailureClass::Cancelled,
            tonic::Code::InvalidArgument => FailureClass::InvalidArgument,
            tonic::Code::ResourceExhausted => FailureClass::ResourceExhausted,
            tonic::Code::PermissionDenied => FailureClass::PermissionDenied,
            tonic::Code::NotFound => FailureClass::NotFound,
            tonic::Code::AlreadyExists => FailureClass::AlreadyExists,
            tonic::Code::Unauthenticated => FailureClass::Unauthenticated,
            tonic::Code::FailedPrecondition => FailureClass::FailedPrecondition,
            tonic::Code::Aborted => FailureClass::Aborted,
            tonic::Code::OutOfRange => FailureClass::OutOfRange,
            tonic::Code::Unimplemented => FailureClass::Unimplemented,
            tonic::Code::DataLoss => FailureClass::DataLoss,
            // Ok 不是失败，按未知处理
            tonic::Code::Ok | tonic::Code::Unknown => FailureClass::Unknown,
        }
    }
}

impl From<&tonic::Status> for FailureClass {
    fn from(status: &tonic::Status) -> Self {
        status.code().into()
    }
}
