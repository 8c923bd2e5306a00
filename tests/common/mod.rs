//! 测试用的内存传输层
//!
//! 支持按键注入失败、注入延迟、前若干次调用的暂时性失败以及整体不可达，
//! 并统计各操作的调用次数与最大并发数

#![allow(dead_code)]

use async_trait::async_trait;
use flare_cache_client::{
    CacheError, CacheKey, CacheTransport, CacheValue, DeleteResponse, GetResponse,
    KeysExistResponse, Result, SetResponse,
};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Debug, Default)]
pub struct InMemoryTransport {
    store: Mutex<HashMap<CacheKey, CacheValue>>,
    key_failures: Mutex<HashMap<CacheKey, CacheError>>,
    slow_keys: Mutex<HashSet<CacheKey>>,
    transient_failure: Mutex<Option<(usize, CacheError)>>,
    latency: Mutex<Option<Duration>>,
    slow_latency: Mutex<Option<Duration>>,
    unreachable: Mutex<bool>,
    keys_exist_failure: Mutex<Option<CacheError>>,

    pub get_calls: AtomicUsize,
    pub set_calls: AtomicUsize,
    pub delete_calls: AtomicUsize,
    pub keys_exist_calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl InMemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let transport = Self::new();
        {
            let mut store = transport.store.lock().unwrap();
            for (key, value) in entries {
                store.insert(CacheKey::from(key), CacheValue::from(value));
            }
        }
        transport
    }

    /// 对某个键的每次调用都返回 `error`
    pub fn fail_key(&self, key: &str, error: CacheError) {
        self.key_failures
            .lock()
            .unwrap()
            .insert(CacheKey::from(key), error);
    }

    /// 前 `count` 次单键调用返回 `error`
    pub fn fail_next(&self, count: usize, error: CacheError) {
        *self.transient_failure.lock().unwrap() = Some((count, error));
    }

    /// 每次调用前等待 `latency`
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap() = Some(latency);
    }

    /// 对指定键的调用等待 `latency`
    pub fn slow_key(&self, key: &str, latency: Duration) {
        self.slow_keys.lock().unwrap().insert(CacheKey::from(key));
        *self.slow_latency.lock().unwrap() = Some(latency);
    }

    pub fn set_unreachable(&self, unreachable: bool) {
        *self.unreachable.lock().unwrap() = unreachable;
    }

    pub fn fail_keys_exist(&self, error: CacheError) {
        *self.keys_exist_failure.lock().unwrap() = Some(error);
    }

    pub fn stored(&self, key: &str) -> Option<CacheValue> {
        self.store.lock().unwrap().get(&CacheKey::from(key)).cloned()
    }

    pub fn len(&self) -> usize {
        self.store.lock().unwrap().len()
    }

    pub fn total_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
            + self.set_calls.load(Ordering::SeqCst)
            + self.delete_calls.load(Ordering::SeqCst)
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// 单键调用的公共前置：计数、延迟与故障注入
    async fn enter(&self, key: &CacheKey) -> Result<InFlightGuard<'_>> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        let guard = InFlightGuard {
            counter: &self.in_flight,
        };

        let latency = *self.latency.lock().unwrap();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        let slow = self.slow_keys.lock().unwrap().contains(key);
        if slow {
            let latency = self.slow_latency.lock().unwrap().unwrap_or_default();
            tokio::time::sleep(latency).await;
        }

        {
            let mut transient = self.transient_failure.lock().unwrap();
            if let Some((remaining, error)) = transient.as_mut() {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(error.clone());
                }
            }
        }

        if let Some(error) = self.key_failures.lock().unwrap().get(key) {
            return Err(error.clone());
        }

        Ok(guard)
    }
}

struct InFlightGuard<'a> {
    counter: &'a AtomicUsize,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl CacheTransport for InMemoryTransport {
    async fn ready(&self) -> Result<()> {
        if *self.unreachable.lock().unwrap() {
            return Err(CacheError::unavailable("transport is not reachable"));
        }
        Ok(())
    }

    async fn get(&self, _cache_name: &str, key: &CacheKey) -> Result<GetResponse> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        let _guard = self.enter(key).await?;
        Ok(match self.store.lock().unwrap().get(key) {
            Some(value) => GetResponse::Hit(value.clone()),
            None => GetResponse::Miss,
        })
    }

    async fn set(
        &self,
        _cache_name: &str,
        key: &CacheKey,
        value: &CacheValue,
        _ttl: Option<Duration>,
    ) -> Result<SetResponse> {
        self.set_calls.fetch_add(1, Ordering::SeqCst);
        let _guard = self.enter(key).await?;
        self.store
            .lock()
            .unwrap()
            .insert(key.clone(), value.clone());
        Ok(SetResponse::Success)
    }

    async fn delete(&self, _cache_name: &str, key: &CacheKey) -> Result<DeleteResponse> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        let _guard = self.enter(key).await?;
        self.store.lock().unwrap().remove(key);
        Ok(DeleteResponse::Success)
    }

    async fn keys_exist(&self, _cache_name: &str, keys: &[CacheKey]) -> Result<KeysExistResponse> {
        self.keys_exist_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.keys_exist_failure.lock().unwrap().clone() {
            return Err(error);
        }
        let store = self.store.lock().unwrap();
        Ok(KeysExistResponse(
            keys.iter().map(|key| store.contains_key(key)).collect(),
        ))
    }
}

pub fn keys(names: &[&str]) -> Vec<CacheKey> {
    names.iter().map(|name| CacheKey::from(*name)).collect()
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
