//! 单项结果汇总
//!
//! 从唯一的结果流中取出恰好 N 个单项结果，按标签归入成功或失败

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::result::{BulkOutcome, BulkResult};
use crate::error::{CacheError, Result};

pub(crate) struct OutcomeAggregator<R> {
    expected: usize,
    result: BulkResult<R>,
}

impl<R> OutcomeAggregator<R> {
    pub(crate) fn new(operation: &'static str, expected: usize) -> Self {
        Self {
            expected,
            result: BulkResult::with_capacity(operation, expected),
        }
    }

    /// 汇总直到收齐所有结果
    ///
    /// 调用方取消时整批失败；所有工作者在收齐之前退出属于内部错误
    pub(crate) async fn drain(
        mut self,
        outcomes: &mut mpsc::UnboundedReceiver<BulkOutcome<R>>,
        cancel: &CancellationToken,
    ) -> Result<BulkResult<R>> {
        let mut received = 0usize;

        while received < self.expected {
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return Err(CacheError::cancelled(format!(
                        "batch {} cancelled after {received} of {} outcomes",
                        self.result.operation(),
                        self.expected
                    )));
                }
                outcome = outcomes.recv() => outcome,
            };

            match outcome {
                Some(outcome) => {
                    self.result.record(outcome);
                    received += 1;
                }
                None => {
                    return Err(CacheError::internal(format!(
                        "batch {} workers exited after {received} of {} outcomes",
                        self.result.operation(),
                        self.expected
                    )));
                }
            }
        }

        Ok(self.result)
    }
}
