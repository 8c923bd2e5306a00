//! 批量操作工作者
//!
//! 每个工作者循环从任务队列取任务，对真实任务执行一次带超时的单键调用并投递
//! 恰好一个单项结果；取到结束标记后退出

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, trace};

use super::operations::BulkOperation;
use super::queue::{BulkTask, TaskReceiver};
use super::result::BulkOutcome;
use crate::client::CacheTransport;
use crate::error::CacheError;

/// 工作者运行所需的共享上下文
pub(crate) struct Worker<O: BulkOperation, T: ?Sized> {
    pub(crate) id: usize,
    pub(crate) transport: Arc<T>,
    pub(crate) cache_name: Arc<str>,
    pub(crate) request_timeout: Duration,
    pub(crate) tasks: TaskReceiver<O::Item>,
    pub(crate) outcomes: mpsc::UnboundedSender<BulkOutcome<O::Response>>,
}

impl<O, T> Worker<O, T>
where
    O: BulkOperation,
    T: CacheTransport + ?Sized,
{
    pub(crate) async fn run(self) {
        trace!(worker_id = self.id, operation = O::NAME, "Worker started");
        let mut processed = 0usize;

        while let Some(BulkTask::Item(item)) = self.tasks.pop().await {
            let outcome = self.process(&item).await;
            processed += 1;
            if self.outcomes.send(outcome).is_err() {
                // 调用方已不再汇总结果
                debug!(worker_id = self.id, "Outcome stream closed, worker stopping early");
                return;
            }
        }

        trace!(
            worker_id = self.id,
            operation = O::NAME,
            processed,
            "Worker received end of work"
        );
    }

    async fn process(&self, item: &O::Item) -> BulkOutcome<O::Response> {
        let key = O::key(item).clone();

        if let Err(error) = O::validate(item) {
            return BulkOutcome::Failure { key, error };
        }

        let result = match tokio::time::timeout(
            self.request_timeout,
            O::execute(&*self.transport, &self.cache_name, item),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(CacheError::timeout(format!(
                "request timed out after {}ms",
                self.request_timeout.as_millis()
            ))),
        };

        if let Err(error) = &result {
            debug!(
                worker_id = self.id,
                operation = O::NAME,
                key = %key,
                error = %error,
                "Bulk item failed"
            );
        }

        BulkOutcome::from_result(key, result)
    }
}
