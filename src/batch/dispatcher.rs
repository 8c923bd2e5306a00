//! 批量任务分发器
//!
//! 按输入顺序推入每个真实任务，随后为每个工作者推入恰好一个结束标记。
//! 每次推入都与取消信号竞争，取消后立即停止。

use tokio_util::sync::CancellationToken;
use tracing::trace;

use super::queue::{BulkTask, TaskSender};

pub(crate) struct Dispatcher<I> {
    pub(crate) items: Vec<I>,
    pub(crate) worker_count: usize,
    pub(crate) tasks: TaskSender<I>,
    pub(crate) cancel: CancellationToken,
}

impl<I> Dispatcher<I> {
    pub(crate) async fn run(self) {
        let Dispatcher {
            items,
            worker_count,
            tasks,
            cancel,
        } = self;

        let real = items.into_iter().map(BulkTask::Item);
        let sentinels = std::iter::repeat_with(|| BulkTask::EndOfWork).take(worker_count);

        for task in real.chain(sentinels) {
            let pushed = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    trace!("Dispatcher cancelled");
                    return;
                }
                pushed = tasks.push(task) => pushed,
            };
            if !pushed {
                trace!("All workers gone, dispatcher stopping");
                return;
            }
        }
    }
}
