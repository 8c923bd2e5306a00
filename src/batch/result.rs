//! 批量操作的单项结果与汇总结果

use std::collections::HashMap;
use thiserror::Error;

use crate::client::GetResponse;
use crate::error::CacheError;
use crate::types::{CacheKey, CacheValue};

/// 单个键的执行结果，携带原始键
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BulkOutcome<R> {
    Success { key: CacheKey, response: R },
    Failure { key: CacheKey, error: CacheError },
}

impl<R> BulkOutcome<R> {
    pub fn from_result(key: CacheKey, result: Result<R, CacheError>) -> Self {
        match result {
            Ok(response) => BulkOutcome::Success { key, response },
            Err(error) => BulkOutcome::Failure { key, error },
        }
    }

    pub fn key(&self) -> &CacheKey {
        match self {
            BulkOutcome::Success { key, .. } | BulkOutcome::Failure { key, .. } => key,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, BulkOutcome::Success { .. })
    }
}

/// 批量操作的汇总结果
///
/// 每个输入键恰好出现在 `successes` 或 `failures` 之一中
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkResult<R> {
    operation: &'static str,
    successes: HashMap<CacheKey, R>,
    failures: HashMap<CacheKey, CacheError>,
}

impl<R> BulkResult<R> {
    pub(crate) fn with_capacity(operation: &'static str, capacity: usize) -> Self {
        Self {
            operation,
            successes: HashMap::with_capacity(capacity),
            failures: HashMap::new(),
        }
    }

    /// 按标签把一个单项结果归入成功或失败
    pub(crate) fn record(&mut self, outcome: BulkOutcome<R>) {
        match outcome {
            BulkOutcome::Success { key, response } => {
                self.successes.insert(key, response);
            }
            BulkOutcome::Failure { key, error } => {
                self.failures.insert(key, error);
            }
        }
    }

    /// 批量操作名称（`get`、`set`、`delete`）
    pub fn operation(&self) -> &'static str {
        self.operation
    }

    pub fn successes(&self) -> &HashMap<CacheKey, R> {
        &self.successes
    }

    pub fn failures(&self) -> &HashMap<CacheKey, CacheError> {
        &self.failures
    }

    pub fn len(&self) -> usize {
        self.successes.len() + self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    /// 拆分为成功结果与错误；没有失败时错误为 `None`
    pub fn into_parts(self) -> (HashMap<CacheKey, R>, Option<BulkError>) {
        let error = if self.failures.is_empty() {
            None
        } else {
            Some(BulkError {
                operation: self.operation,
                errors: self.failures,
            })
        };
        (self.successes, error)
    }
}

impl BulkResult<GetResponse> {
    /// 命中的键值；未找到的键不在其中
    pub fn hits(&self) -> HashMap<CacheKey, CacheValue> {
        self.successes
            .iter()
            .filter_map(|(key, response)| response.value().map(|v| (key.clone(), v.clone())))
            .collect()
    }
}

/// 批量操作中至少一个键失败
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("errors occurred during batch {operation}")]
pub struct BulkError {
    operation: &'static str,
    errors: HashMap<CacheKey, CacheError>,
}

impl BulkError {
    pub fn operation(&self) -> &'static str {
        self.operation
    }

    /// 每个失败键对应的错误
    pub fn errors(&self) -> &HashMap<CacheKey, CacheError> {
        &self.errors
    }

    pub fn into_errors(self) -> HashMap<CacheKey, CacheError> {
        self.errors
    }
}

/// 全部不存在才写入的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetIfAbsentAllResponse<R> {
    /// 所有键都不存在，已执行批量写入
    Stored(BulkResult<R>),
    /// 至少一个键已存在，未写入任何键
    NotStored,
}

impl<R> SetIfAbsentAllResponse<R> {
    pub fn is_stored(&self) -> bool {
        matches!(self, SetIfAbsentAllResponse::Stored(_))
    }
}
