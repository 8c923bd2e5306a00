//! 批量任务队列
//!
//! 有界的多生产者/多消费者队列：分发器推入任务，任意工作者取出任务。
//! 队列满时推入方等待，队列空时取出方等待。

use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};

/// 队列中的任务
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BulkTask<I> {
    /// 一个真实的单键任务
    Item(I),
    /// 工作结束标记；每个工作者取到一个后退出
    EndOfWork,
}

impl<I> BulkTask<I> {
    pub fn is_end_of_work(&self) -> bool {
        matches!(self, BulkTask::EndOfWork)
    }
}

/// 创建容量为 `capacity` 的任务队列
///
/// 容量为 0 时按 1 处理
pub fn bulk_task_queue<I>(capacity: usize) -> (TaskSender<I>, TaskReceiver<I>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (
        TaskSender { tx },
        TaskReceiver {
            rx: Arc::new(Mutex::new(rx)),
        },
    )
}

/// 队列的推入端
#[derive(Debug)]
pub struct TaskSender<I> {
    tx: mpsc::Sender<BulkTask<I>>,
}

impl<I> Clone for TaskSender<I> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<I> TaskSender<I> {
    /// 推入一个任务，队列已满时等待空位
    ///
    /// 所有取出端都已释放时返回 `false`
    pub async fn push(&self, task: BulkTask<I>) -> bool {
        self.tx.send(task).await.is_ok()
    }
}

/// 队列的取出端，克隆后由多个工作者共享
#[derive(Debug)]
pub struct TaskReceiver<I> {
    rx: Arc<Mutex<mpsc::Receiver<BulkTask<I>>>>,
}

impl<I> Clone for TaskReceiver<I> {
    fn clone(&self) -> Self {
        Self {
            rx: Arc::clone(&self.rx),
        }
    }
}

impl<I> TaskReceiver<I> {
    /// 取出下一个任务，队列为空时等待
    ///
    /// 推入端全部释放且队列已空时返回 `None`，工作者应当把它视同结束标记
    pub async fn pop(&self) -> Option<BulkTask<I>> {
        self.rx.lock().await.recv().await
    }
}
