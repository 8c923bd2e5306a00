//! 传输层抽象
//!
//! 批量执行器只通过 [`CacheTransport`] 发起单键远程调用，
//! 连接管理、序列化与鉴权都由实现方负责

use async_trait::async_trait;
use std::time::Duration;

use super::response::{DeleteResponse, GetResponse, KeysExistResponse, SetResponse};
use crate::error::Result;
use crate::types::{CacheKey, CacheValue};

/// 缓存传输层
///
/// 需要动态分发时可以使用 `Arc<dyn CacheTransport>`
#[async_trait]
pub trait CacheTransport: Send + Sync {
    /// 检查传输层是否可用
    ///
    /// 批量操作在分发任何任务之前调用一次，失败时整批失败。默认总是可用
    async fn ready(&self) -> Result<()> {
        Ok(())
    }

    async fn get(&self, cache_name: &str, key: &CacheKey) -> Result<GetResponse>;

    /// 写入一个键；`ttl` 为空时使用服务端默认 TTL
    async fn set(
        &self,
        cache_name: &str,
        key: &CacheKey,
        value: &CacheValue,
        ttl: Option<Duration>,
    ) -> Result<SetResponse>;

    async fn delete(&self, cache_name: &str, key: &CacheKey) -> Result<DeleteResponse>;

    /// 一次检查多个键是否存在
    async fn keys_exist(&self, cache_name: &str, keys: &[CacheKey]) -> Result<KeysExistResponse>;
}

#[async_trait]
impl<T> CacheTransport for std::sync::Arc<T>
where
    T: CacheTransport + ?Sized,
{
    async fn ready(&self) -> Result<()> {
        (**self).ready().await
    }

    async fn get(&self, cache_name: &str, key: &CacheKey) -> Result<GetResponse> {
        (**self).get(cache_name, key).await
    }

    async fn set(
        &self,
        cache_name: &str,
        key: &CacheKey,
        value: &CacheValue,
        ttl: Option<Duration>,
    ) -> Result<SetResponse> {
        (**self).set(cache_name, key, value, ttl).await
    }

    async fn delete(&self, cache_name: &str, key: &CacheKey) -> Result<DeleteResponse> {
        (**self).delete(cache_name, key).await
    }

    async fn keys_exist(&self, cache_name: &str, keys: &[CacheKey]) -> Result<KeysExistResponse> {
        (**self).keys_exist(cache_name, keys).await
    }
}
