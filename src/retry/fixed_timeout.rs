//! 固定超时重试策略
//!
//! 在客户端整体截止时间之内重试。首次请求失败后，下一次重试在
//! `retry_delay_interval`（带 ±10% 抖动）后发起，且每次重试的单次超时为 `retry_timeout`，
//! 但不会晚于整体截止时间。

use super::{AttemptContext, DefaultEligibility, EligibilityClassifier, RetryDecision, add_jitter};
use crate::types::FailureClass;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{Span, debug};

/// 单次重试等待响应的默认时长
pub const DEFAULT_RETRY_TIMEOUT_MILLIS: u64 = 1000;

/// 两次重试之间的默认间隔
pub const DEFAULT_RETRY_DELAY_INTERVAL_MILLIS: u64 = 100;

#[derive(Debug, Clone)]
pub struct FixedTimeoutRetryStrategy {
    eligibility: Arc<dyn EligibilityClassifier>,
    retry_timeout_millis: u64,
    retry_delay_interval_millis: u64,
    span: Span,
}

impl FixedTimeoutRetryStrategy {
    pub fn builder() -> FixedTimeoutRetryStrategyBuilder {
        FixedTimeoutRetryStrategyBuilder::default()
    }

    pub fn retry_timeout_millis(&self) -> u64 {
        self.retry_timeout_millis
    }

    pub fn retry_delay_interval_millis(&self) -> u64 {
        self.retry_delay_interval_millis
    }

    #[must_use]
    pub fn with_retry_timeout_millis(&self, retry_timeout_millis: u64) -> Self {
        Self {
            retry_timeout_millis,
            ..self.clone()
        }
    }

    #[must_use]
    pub fn with_retry_delay_interval_millis(&self, retry_delay_interval_millis: u64) -> Self {
        Self {
            retry_delay_interval_millis,
            ..self.clone()
        }
    }

    #[must_use]
    pub fn with_eligibility(&self, eligibility: Arc<dyn EligibilityClassifier>) -> Self {
        Self {
            eligibility,
            ..self.clone()
        }
    }

    /// 计算重试的单次截止时间：`now + retry_timeout`，但不晚于整体截止时间
    pub fn calculate_retry_deadline(&self, overall_deadline: Instant) -> Instant {
        let deadline = Instant::now() + Duration::from_millis(self.retry_timeout_millis);
        deadline.min(overall_deadline)
    }

    pub fn decide(&self, ctx: &AttemptContext) -> RetryDecision {
        let _entered = self.span.enter();

        debug!(
            operation = %ctx.operation,
            status = %ctx.failure,
            attempt = ctx.attempt_number,
            "Determining whether request is eligible for retry"
        );

        // 单次重试超时但整体截止时间未到：即使资格表拒绝也继续重试
        if ctx.attempt_number > 0
            && ctx.failure == FailureClass::DeadlineExceeded
            && ctx.overall_deadline > Instant::now()
        {
            let delay_ms = add_jitter(self.retry_delay_interval_millis);
            debug!(
                operation = %ctx.operation,
                status = %ctx.failure,
                attempt = ctx.attempt_number,
                delay_ms,
                "Attempt timed out within overall deadline; retrying"
            );
            return RetryDecision::retry_after_millis(delay_ms);
        }

        if !self.eligibility.is_eligible(&ctx.operation, ctx.failure) {
            debug!(
                operation = %ctx.operation,
                status = %ctx.failure,
                "Request is not retryable"
            );
            return RetryDecision::Stop;
        }

        let delay_ms = add_jitter(self.retry_delay_interval_millis);
        debug!(
            operation = %ctx.operation,
            status = %ctx.failure,
            attempt = ctx.attempt_number,
            delay_ms,
            "Determined request is retryable; retrying after delay"
        );
        RetryDecision::retry_after_millis(delay_ms)
    }
}

impl Default for FixedTimeoutRetryStrategy {
    fn default() -> Self {
        Self::builder().build()
    }
}

#[derive(Debug, Clone, Default)]
pub struct FixedTimeoutRetryStrategyBuilder {
    eligibility: Option<Arc<dyn EligibilityClassifier>>,
    retry_timeout_millis: u64,
    retry_delay_interval_millis: u64,
    span: Option<Span>,
}

impl FixedTimeoutRetryStrategyBuilder {
    /// 单次重试超时（0 表示使用默认值）
    pub fn retry_timeout_millis(mut self, millis: u64) -> Self {
        self.retry_timeout_millis = millis;
        self
    }

    /// 重试间隔（0 表示使用默认值）
    pub fn retry_delay_interval_millis(mut self, millis: u64) -> Self {
        self.retry_delay_interval_millis = millis;
        self
    }

    pub fn eligibility(mut self, eligibility: Arc<dyn EligibilityClassifier>) -> Self {
        self.eligibility = Some(eligibility);
        self
    }

    pub fn span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    pub fn build(self) -> FixedTimeoutRetryStrategy {
        FixedTimeoutRetryStrategy {
            eligibility: self
                .eligibility
                .unwrap_or_else(|| Arc::new(DefaultEligibility)),
            retry_timeout_millis: if self.retry_timeout_millis == 0 {
                DEFAULT_RETRY_TIMEOUT_MILLIS
            } else {
                self.retry_timeout_millis
            },
            retry_delay_interval_millis: if self.retry_delay_interval_millis == 0 {
                DEFAULT_RETRY_DELAY_INTERVAL_MILLIS
            } else {
                self.retry_delay_interval_millis
            },
            span: self
                .span
                .unwrap_or_else(|| tracing::debug_span!("fixed_timeout_retry_strategy")),
        }
    }
}
