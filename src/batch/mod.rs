//! 批量操作模块
//!
//! 一个多键请求被拆分为多个单键任务：分发器把任务推入有界队列，
//! 固定数量的工作者并发取出并执行，每个任务向唯一的结果流投递一个带标签的单项结果，
//! 调用方汇总后得到 [`BulkResult`]。

mod aggregator;
mod dispatcher;
pub mod executor;
pub mod operations;
pub mod queue;
pub mod result;
mod worker;

pub use crate::config::BulkConfig;
pub use executor::BulkExecutor;
pub use operations::{BulkDelete, BulkGet, BulkOperation, BulkSet, BulkSetItem};
pub use queue::{BulkTask, TaskReceiver, TaskSender, bulk_task_queue};
pub use result::{BulkError, BulkOutcome, BulkResult, SetIfAbsentAllResponse};
