//! 带重试的传输层

use async_trait::async_trait;
use std::time::Duration;

use super::response::{DeleteResponse, GetResponse, KeysExistResponse, SetResponse};
use super::transport::CacheTransport;
use crate::error::Result;
use crate::middleware::RetryInvoker;
use crate::types::{CacheKey, CacheValue, OperationName};

/// 为每次单键调用套上 [`RetryInvoker`] 的传输层包装
#[derive(Debug, Clone)]
pub struct RetryingTransport<T> {
    inner: T,
    invoker: RetryInvoker,
}

impl<T> RetryingTransport<T> {
    pub fn new(inner: T, invoker: RetryInvoker) -> Self {
        Self { inner, invoker }
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }

    pub fn invoker(&self) -> &RetryInvoker {
        &self.invoker
    }
}

#[async_trait]
impl<T> CacheTransport for RetryingTransport<T>
where
    T: CacheTransport,
{
    async fn ready(&self) -> Result<()> {
        self.inner.ready().await
    }

    async fn get(&self, cache_name: &str, key: &CacheKey) -> Result<GetResponse> {
        self.invoker
            .invoke(&OperationName::GET, |_| self.inner.get(cache_name, key))
            .await
    }

    async fn set(
        &self,
        cache_name: &str,
        key: &CacheKey,
        value: &CacheValue,
        ttl: Option<Duration>,
    ) -> Result<SetResponse> {
        self.invoker
            .invoke(&OperationName::SET, |_| {
                self.inner.set(cache_name, key, value, ttl)
            })
            .await
    }

    async fn delete(&self, cache_name: &str, key: &CacheKey) -> Result<DeleteResponse> {
        self.invoker
            .invoke(&OperationName::DELETE, |_| self.inner.delete(cache_name, key))
            .await
    }

    async fn keys_exist(&self, cache_name: &str, keys: &[CacheKey]) -> Result<KeysExistResponse> {
        self.invoker
            .invoke(&OperationName::KEYS_EXIST, |_| {
                self.inner.keys_exist(cache_name, keys)
            })
            .await
    }
}
