//! 批量操作执行器

use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::aggregator::OutcomeAggregator;
use super::dispatcher::Dispatcher;
use super::operations::{BulkDelete, BulkGet, BulkOperation, BulkSet, BulkSetItem};
use super::queue::bulk_task_queue;
use super::result::{BulkResult, SetIfAbsentAllResponse};
use super::worker::Worker;
use crate::client::{CacheTransport, DeleteResponse, GetResponse, SetResponse};
use crate::config::BulkConfig;
use crate::error::{CacheError, Result};
use crate::types::CacheKey;

/// 批量操作执行器
///
/// 把一个多键请求拆成多个独立的单键调用，由固定数量的工作者并发执行。
/// 单个键的失败只记录在该键上，不会中断整批。
///
/// # 示例
///
/// ```ignore
/// let executor = BulkExecutor::new(transport, "my-cache")
///     .with_config(BulkConfig::default().with_max_concurrency(10));
///
/// let result = executor
///     .set_batch(vec![BulkSetItem::new("k1", "a"), BulkSetItem::new("k2", "b")])
///     .await?;
/// let (stored, errors) = result.into_parts();
/// ```
#[derive(Debug)]
pub struct BulkExecutor<T: ?Sized> {
    transport: Arc<T>,
    cache_name: Arc<str>,
    config: BulkConfig,
}

impl<T: ?Sized> Clone for BulkExecutor<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            cache_name: Arc::clone(&self.cache_name),
            config: self.config.clone(),
        }
    }
}

impl<T> BulkExecutor<T>
where
    T: CacheTransport + ?Sized + 'static,
{
    pub fn new(transport: Arc<T>, cache_name: impl Into<String>) -> Self {
        Self {
            transport,
            cache_name: Arc::from(cache_name.into()),
            config: BulkConfig::default(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: BulkConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &BulkConfig {
        &self.config
    }

    pub fn cache_name(&self) -> &str {
        &self.cache_name
    }

    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    pub async fn get_batch(&self, keys: Vec<CacheKey>) -> Result<BulkResult<GetResponse>> {
        self.get_batch_with_cancellation(&CancellationToken::new(), keys)
            .await
    }

    pub async fn get_batch_with_cancellation(
        &self,
        cancel: &CancellationToken,
        keys: Vec<CacheKey>,
    ) -> Result<BulkResult<GetResponse>> {
        self.execute::<BulkGet>(cancel, keys).await
    }

    pub async fn set_batch(&self, items: Vec<BulkSetItem>) -> Result<BulkResult<SetResponse>> {
        self.set_batch_with_cancellation(&CancellationToken::new(), items)
            .await
    }

    pub async fn set_batch_with_cancellation(
        &self,
        cancel: &CancellationToken,
        items: Vec<BulkSetItem>,
    ) -> Result<BulkResult<SetResponse>> {
        self.execute::<BulkSet>(cancel, items).await
    }

    pub async fn delete_batch(&self, keys: Vec<CacheKey>) -> Result<BulkResult<DeleteResponse>> {
        self.delete_batch_with_cancellation(&CancellationToken::new(), keys)
            .await
    }

    pub async fn delete_batch_with_cancellation(
        &self,
        cancel: &CancellationToken,
        keys: Vec<CacheKey>,
    ) -> Result<BulkResult<DeleteResponse>> {
        self.execute::<BulkDelete>(cancel, keys).await
    }

    /// 所有键都不存在时才写入
    ///
    /// 先一次检查所有键是否存在，任意一个已存在则不写入任何键。
    /// 检查与写入不是原子的，其间其他调用方可能创建其中的键。
    pub async fn set_if_absent_all(
        &self,
        items: Vec<BulkSetItem>,
    ) -> Result<SetIfAbsentAllResponse<SetResponse>> {
        self.set_if_absent_all_with_cancellation(&CancellationToken::new(), items)
            .await
    }

    pub async fn set_if_absent_all_with_cancellation(
        &self,
        cancel: &CancellationToken,
        items: Vec<BulkSetItem>,
    ) -> Result<SetIfAbsentAllResponse<SetResponse>> {
        if items.is_empty() {
            return Ok(SetIfAbsentAllResponse::Stored(BulkResult::with_capacity(
                BulkSet::NAME,
                0,
            )));
        }
        check_unique_keys(BulkSet::NAME, items.iter().map(BulkSet::key))?;
        self.check_ready(BulkSet::NAME).await?;

        // 校验不通过的键不参与存在性检查，写入阶段会在该键上单独报错
        let keys: Vec<CacheKey> = items
            .iter()
            .filter(|item| BulkSet::validate(item).is_ok())
            .map(|item| item.key.clone())
            .collect();

        if !keys.is_empty() {
            let request_timeout = self.config.request_timeout();
            let exists = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return Err(CacheError::cancelled("set if absent all cancelled"));
                }
                exists = tokio::time::timeout(
                    request_timeout,
                    self.transport.keys_exist(&self.cache_name, &keys),
                ) => exists??,
            };

            if exists.exists().len() != keys.len() {
                return Err(CacheError::internal(format!(
                    "keys exist returned {} results for {} keys",
                    exists.exists().len(),
                    keys.len()
                )));
            }

            if exists.any_exist() {
                debug!(
                    cache_name = %self.cache_name,
                    key_count = keys.len(),
                    "At least one key already exists, nothing stored"
                );
                return Ok(SetIfAbsentAllResponse::NotStored);
            }
        }

        let result = self.dispatch::<BulkSet>(cancel, items).await?;
        Ok(SetIfAbsentAllResponse::Stored(result))
    }

    /// 以 `O` 执行一批任务
    ///
    /// 输入为空时直接返回空结果；同一批中出现重复的键时整批拒绝
    pub async fn execute<O>(
        &self,
        cancel: &CancellationToken,
        items: Vec<O::Item>,
    ) -> Result<BulkResult<O::Response>>
    where
        O: BulkOperation,
    {
        let item_count = items.len();
        if item_count == 0 {
            return Ok(BulkResult::with_capacity(O::NAME, 0));
        }
        check_unique_keys(O::NAME, items.iter().map(O::key))?;
        self.check_ready(O::NAME).await?;
        self.dispatch::<O>(cancel, items).await
    }

    /// 传输层不可用时整批失败，不分发任何任务
    async fn check_ready(&self, operation: &'static str) -> Result<()> {
        if let Err(e) = self.transport.ready().await {
            warn!(
                cache_name = %self.cache_name,
                operation,
                error = %e,
                "Transport unavailable, batch not dispatched"
            );
            return Err(e);
        }
        Ok(())
    }

    /// 启动工作者与分发器并汇总结果，调用前已完成整批检查
    async fn dispatch<O>(
        &self,
        cancel: &CancellationToken,
        items: Vec<O::Item>,
    ) -> Result<BulkResult<O::Response>>
    where
        O: BulkOperation,
    {
        let item_count = items.len();
        let worker_count = self.config.worker_count(item_count);
        let request_timeout = self.config.request_timeout();
        debug!(
            cache_name = %self.cache_name,
            operation = O::NAME,
            item_count,
            worker_count,
            "Dispatching batch"
        );

        // 派生的取消范围，任何返回路径上都会被取消
        let scope = cancel.child_token();
        let _scope_guard = scope.clone().drop_guard();

        let (task_tx, task_rx) = bulk_task_queue::<O::Item>(worker_count);
        let (outcome_tx, mut outcome_rx) = mpsc::unbounded_channel();

        let mut join_set = JoinSet::new();
        for id in 0..worker_count {
            let worker = Worker::<O, T> {
                id,
                transport: Arc::clone(&self.transport),
                cache_name: Arc::clone(&self.cache_name),
                request_timeout,
                tasks: task_rx.clone(),
                outcomes: outcome_tx.clone(),
            };
            join_set.spawn(worker.run());
        }
        drop(task_rx);
        drop(outcome_tx);

        join_set.spawn(
            Dispatcher {
                items,
                worker_count,
                tasks: task_tx,
                cancel: scope.clone(),
            }
            .run(),
        );

        let result = OutcomeAggregator::new(O::NAME, item_count)
            .drain(&mut outcome_rx, cancel)
            .await;

        scope.cancel();
        join_set.shutdown().await;

        match &result {
            Ok(result) if result.has_failures() => info!(
                cache_name = %self.cache_name,
                operation = O::NAME,
                item_count,
                failure_count = result.failures().len(),
                "Batch completed with failures"
            ),
            Ok(_) => debug!(
                cache_name = %self.cache_name,
                operation = O::NAME,
                item_count,
                "Batch completed"
            ),
            Err(e) => warn!(
                cache_name = %self.cache_name,
                operation = O::NAME,
                error = %e,
                "Batch failed"
            ),
        }

        result
    }
}

fn check_unique_keys<'a>(
    operation: &str,
    keys: impl IntoIterator<Item = &'a CacheKey>,
) -> Result<()> {
    let mut seen = HashSet::new();
    for key in keys {
        if !seen.insert(key) {
            return Err(CacheError::invalid_argument(format!(
                "duplicate key in batch {operation}: {key}"
            )));
        }
    }
    Ok(())
}
