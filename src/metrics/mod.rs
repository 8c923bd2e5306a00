//! 重试指标收集模块
//!
//! 按 (缓存名称, 操作名称) 记录每一次执行的开始时间，
//! 第一条记录是原始请求，之后每一条都是一次重试。

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::error::{CacheError, Result};
use crate::types::OperationName;

type Timestamps = HashMap<String, HashMap<String, Vec<Instant>>>;

/// 重试指标收集器
///
/// 可廉价克隆，所有克隆共享同一份数据
#[derive(Debug, Clone, Default)]
pub struct RetryMetricsCollector {
    data: Arc<RwLock<Timestamps>>,
}

impl RetryMetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一次执行
    pub async fn add_timestamp(&self, cache_name: &str, operation: &OperationName, at: Instant) {
        let mut data = self.data.write().await;
        data.entry(cache_name.to_string())
            .or_default()
            .entry(operation.as_str().to_string())
            .or_default()
            .push(at);
    }

    /// 重试次数（执行次数减一）
    pub async fn total_retry_count(
        &self,
        cache_name: &str,
        operation: &OperationName,
    ) -> Result<usize> {
        let data = self.data.read().await;
        let timestamps = Self::lookup(&data, cache_name, operation)?;
        Ok(timestamps.len().saturating_sub(1))
    }

    /// 相邻两次执行之间的平均间隔；少于两次执行时为零
    pub async fn average_time_between_retries(
        &self,
        cache_name: &str,
        operation: &OperationName,
    ) -> Result<Duration> {
        let data = self.data.read().await;
        let timestamps = Self::lookup(&data, cache_name, operation)?;
        if timestamps.len() < 2 {
            return Ok(Duration::ZERO);
        }

        let total: Duration = timestamps
            .windows(2)
            .map(|pair| pair[1].saturating_duration_since(pair[0]))
            .sum();
        Ok(total / (timestamps.len() - 1) as u32)
    }

    /// 所有记录的快照
    pub async fn all_metrics(&self) -> Timestamps {
        self.data.read().await.clone()
    }

    pub async fn reset(&self) {
        self.data.write().await.clear();
    }

    fn lookup<'a>(
        data: &'a Timestamps,
        cache_name: &str,
        operation: &OperationName,
    ) -> Result<&'a Vec<Instant>> {
        let by_operation = data.get(cache_name).ok_or_else(|| {
            CacheError::invalid_argument(format!("cache name '{cache_name}' is not valid"))
        })?;
        by_operation.get(operation.as_str()).ok_or_else(|| {
            CacheError::invalid_argument(format!("request name '{operation}' is not valid"))
        })
    }
}
