//! Flare Cache Client Library
//!
//! Client-side retry decisions and bulk (multi-key) operation fan-out for a
//! remote cache service.
//!
//! - [`retry`]: eligibility tables and the closed set of retry strategies
//! - [`middleware`]: the retry call loop and a tower retry layer
//! - [`batch`]: bulk get/set/delete/set-if-absent-all over a worker pool
//! - [`client`]: the transport seam the bulk executor talks to

pub mod batch;
pub mod client;
pub mod config;
pub mod error;
pub mod metrics;
pub mod middleware;
pub mod retry;
pub mod types;

// Re-exports
pub use batch::{
    BulkConfig, BulkDelete, BulkError, BulkExecutor, BulkGet, BulkOperation, BulkOutcome,
    BulkResult, BulkSet, BulkSetItem, SetIfAbsentAllResponse,
};
pub use client::{
    CacheTransport, DeleteResponse, GetResponse, KeysExistResponse, RetryingTransport,
    SetResponse,
};
pub use config::{ClientConfig, Config, RetryConfig, RetryStrategyKind};
pub use error::{CacheError, ErrorCode, InfraResult, Result};
pub use metrics::RetryMetricsCollector;
pub use middleware::{RetryInvoker, RetryLayer, RetryService, RetryableError, RetryableRequest};
pub use retry::{
    AlwaysRetryStrategy, AttemptContext, DeadlineAwareEligibility, DefaultEligibility,
    EligibilityClassifier, EligibilityTable, ExponentialBackoffRetryStrategy,
    FixedCountRetryStrategy, FixedTimeoutRetryStrategy, RetryDecision, RetryStrategy,
    TimeoutAwareFixedCountRetryStrategy, is_idempotent,
};
pub use types::{CacheKey, CacheValue, FailureClass, OperationName};

// tokio-util 取消令牌，批量操作的 `*_with_cancellation` 方法使用
pub use tokio_util::sync::CancellationToken;
