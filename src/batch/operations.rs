//! 批量操作的单键实现
//!
//! 每种批量操作描述如何从任务项取出键、如何在本地校验任务项，
//! 以及如何通过传输层执行一次单键调用

use std::future::Future;
use std::time::Duration;

use crate::client::{CacheTransport, DeleteResponse, GetResponse, SetResponse};
use crate::error::{CacheError, Result};
use crate::types::{CacheKey, CacheValue};

/// 单键操作
pub trait BulkOperation: Send + Sync + 'static {
    /// 任务项
    type Item: Send + Sync + 'static;
    /// 单键调用的成功响应
    type Response: Send + 'static;

    /// 操作名称，用于日志和 [`BulkError`](super::BulkError) 的描述
    const NAME: &'static str;

    fn key(item: &Self::Item) -> &CacheKey;

    /// 分发前的本地校验；失败只影响这一个键
    fn validate(item: &Self::Item) -> Result<()> {
        validate_key(Self::key(item))
    }

    fn execute<'a, T>(
        transport: &'a T,
        cache_name: &'a str,
        item: &'a Self::Item,
    ) -> impl Future<Output = Result<Self::Response>> + Send + 'a
    where
        T: CacheTransport + ?Sized;
}

fn validate_key(key: &CacheKey) -> Result<()> {
    if key.is_empty() {
        return Err(CacheError::invalid_argument("key cannot be empty"));
    }
    Ok(())
}

/// 批量读取
#[derive(Debug, Clone, Copy, Default)]
pub struct BulkGet;

impl BulkOperation for BulkGet {
    type Item = CacheKey;
    type Response = GetResponse;

    const NAME: &'static str = "get";

    fn key(item: &CacheKey) -> &CacheKey {
        item
    }

    fn execute<'a, T>(
        transport: &'a T,
        cache_name: &'a str,
        item: &'a CacheKey,
    ) -> impl Future<Output = Result<GetResponse>> + Send + 'a
    where
        T: CacheTransport + ?Sized,
    {
        transport.get(cache_name, item)
    }
}

/// 批量删除
#[derive(Debug, Clone, Copy, Default)]
pub struct BulkDelete;

impl BulkOperation for BulkDelete {
    type Item = CacheKey;
    type Response = DeleteResponse;

    const NAME: &'static str = "delete";

    fn key(item: &CacheKey) -> &CacheKey {
        item
    }

    fn execute<'a, T>(
        transport: &'a T,
        cache_name: &'a str,
        item: &'a CacheKey,
    ) -> impl Future<Output = Result<DeleteResponse>> + Send + 'a
    where
        T: CacheTransport + ?Sized,
    {
        transport.delete(cache_name, item)
    }
}

/// 批量写入的任务项
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkSetItem {
    pub key: CacheKey,
    pub value: CacheValue,
    /// 为空时使用服务端默认 TTL
    pub ttl: Option<Duration>,
}

impl BulkSetItem {
    pub fn new(key: impl Into<CacheKey>, value: impl Into<CacheValue>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            ttl: None,
        }
    }

    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }
}

/// 批量写入
#[derive(Debug, Clone, Copy, Default)]
pub struct BulkSet;

impl BulkOperation for BulkSet {
    type Item = BulkSetItem;
    type Response = SetResponse;

    const NAME: &'static str = "set";

    fn key(item: &BulkSetItem) -> &CacheKey {
        &item.key
    }

    fn validate(item: &BulkSetItem) -> Result<()> {
        validate_key(&item.key)?;
        if item.value.is_empty() {
            return Err(CacheError::invalid_argument("value cannot be empty"));
        }
        Ok(())
    }

    fn execute<'a, T>(
        transport: &'a T,
        cache_name: &'a str,
        item: &'a BulkSetItem,
    ) -> impl Future<Output = Result<SetResponse>> + Send + 'a
    where
        T: CacheTransport + ?Sized,
    {
        transport.set(cache_name, &item.key, &item.value, item.ttl)
    }
}
