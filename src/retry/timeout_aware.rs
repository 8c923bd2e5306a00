//! 超时感知的固定次数重试策略
//!
//! 把 `DeadlineExceeded` 视为可重试（默认搭配 [`DeadlineAwareEligibility`]），
//! 每次重试前为调用重新签发一个 `now + timeout_duration` 的整体截止时间。
//!
//! 与 [`FixedTimeoutRetryStrategy`](super::FixedTimeoutRetryStrategy) 不同：
//! 后者在同一个整体截止时间内收窄单次超时，这里则每次重试都拿到新的截止时间，
//! 总耗时只由 `max_attempts` 约束。

use super::{AttemptContext, DeadlineAwareEligibility, EligibilityClassifier, RetryDecision};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{Span, debug};

/// 默认最大执行次数
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// 默认单次重试超时
pub const DEFAULT_RETRY_TIMEOUT: Duration = Duration::from_millis(500);

#[derive(Debug, Clone)]
pub struct TimeoutAwareFixedCountRetryStrategy {
    eligibility: Arc<dyn EligibilityClassifier>,
    max_attempts: u32,
    timeout_duration: Duration,
    span: Span,
}

impl TimeoutAwareFixedCountRetryStrategy {
    pub fn builder() -> TimeoutAwareFixedCountRetryStrategyBuilder {
        TimeoutAwareFixedCountRetryStrategyBuilder::default()
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn timeout_duration(&self) -> Duration {
        self.timeout_duration
    }

    #[must_use]
    pub fn with_max_attempts(&self, max_attempts: u32) -> Self {
        Self {
            max_attempts,
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

    #[must_use]
    pub fn with_timeout_duration(&self, timeout_duration: Duration) -> Self {
        Self {
            timeout_duration,
            ..self.clone()
        }
    }

    /// 为下一次重试签发新的整体截止时间
    pub fn calculate_new_overall_deadline(&self) -> Instant {
        let deadline = Instant::now() + self.timeout_duration;
        debug!(
            parent: &self.span,
            timeout_ms = self.timeout_duration.as_millis() as u64,
            "Issued a fresh overall deadline for retry"
        );
        deadline
    }

    pub fn decide(&self, ctx: &AttemptContext) -> RetryDecision {
        let _entered = self.span.enter();

        if !self.eligibility.is_eligible(&ctx.operation, ctx.failure) {
            debug!(
                operation = %ctx.operation,
                status = %ctx.failure,
                "Request is not retryable"
            );
            return RetryDecision::Stop;
        }

        if ctx.attempt_number > self.max_attempts {
            debug!(
                operation = %ctx.operation,
                status = %ctx.failure,
                attempt = ctx.attempt_number,
                max_attempts = self.max_attempts,
                "Exceeded max retry attempts; not retrying"
            );
            return RetryDecision::Stop;
        }

        debug!(
            operation = %ctx.operation,
            status = %ctx.failure,
            attempt = ctx.attempt_number,
            max_attempts = self.max_attempts,
            "Determined request is retryable; retrying now"
        );
        RetryDecision::RetryAfter {
            delay: Duration::ZERO,
            revised_deadline: Some(self.calculate_new_overall_deadline()),
        }
    }
}

impl Default for TimeoutAwareFixedCountRetryStrategy {
    fn default() -> Self {
        Self::builder().build()
    }
}

#[derive(Debug, Clone, Default)]
pub struct TimeoutAwareFixedCountRetryStrategyBuilder {
    eligibility: Option<Arc<dyn EligibilityClassifier>>,
    max_attempts: u32,
    timeout_duration: Duration,
    span: Option<Span>,
}

impl TimeoutAwareFixedCountRetryStrategyBuilder {
    /// 设置最大执行次数（0 表示使用默认值）
    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// 设置每次重试签发的超时（0 表示使用默认值）
    pub fn timeout_duration(mut self, timeout_duration: Duration) -> Self {
        self.timeout_duration = timeout_duration;
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

    pub fn build(self) -> TimeoutAwareFixedCountRetryStrategy {
        TimeoutAwareFixedCountRetryStrategy {
            eligibility: self
                .eligibility
                .unwrap_or_else(|| Arc::new(DeadlineAwareEligibility)),
            max_attempts: if self.max_attempts == 0 {
                DEFAULT_MAX_ATTEMPTS
            } else {
                self.max_attempts
            },
            timeout_duration: if self.timeout_duration.is_zero() {
                DEFAULT_RETRY_TIMEOUT
            } else {
                self.timeout_duration
            },
            span: self
                .span
                .unwrap_or_else(|| tracing::debug_span!("timeout_aware_fixed_count_retry_strategy")),
        }
    }
}
