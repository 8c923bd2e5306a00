use super::{AttemptContext, DefaultEligibility, EligibilityClassifier, RetryDecision};
use std::sync::Arc;
use tracing::{Span, debug};

/// 默认最大执行次数
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// 固定次数重试策略
///
/// 可重试的失败立即重试，执行次数超过 `max_attempts` 后停止
#[derive(Debug, Clone)]
pub struct FixedCountRetryStrategy {
    eligibility: Arc<dyn EligibilityClassifier>,
    max_attempts: u32,
    span: Span,
}

impl FixedCountRetryStrategy {
    pub fn builder() -> FixedCountRetryStrategyBuilder {
        FixedCountRetryStrategyBuilder::default()
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
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
        RetryDecision::retry_after_millis(0)
    }
}

impl Default for FixedCountRetryStrategy {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// 固定次数重试策略构建器
#[derive(Debug, Clone, Default)]
pub struct FixedCountRetryStrategyBuilder {
    eligibility: Option<Arc<dyn EligibilityClassifier>>,
    max_attempts: u32,
    span: Option<Span>,
}

impl FixedCountRetryStrategyBuilder {
    /// 设置最大执行次数（0 表示使用默认值）
    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn eligibility(mut self, eligibility: Arc<dyn EligibilityClassifier>) -> Self {
        self.eligibility = Some(eligibility);
        self
    }

    /// 设置日志 span
    pub fn span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    pub fn build(self) -> FixedCountRetryStrategy {
        FixedCountRetryStrategy {
            eligibility: self
                .eligibility
                .unwrap_or_else(|| Arc::new(DefaultEligibility)),
            max_attempts: if self.max_attempts == 0 {
                DEFAULT_MAX_ATTEMPTS
            } else {
                self.max_attempts
            },
            span: self
                .span
                .unwrap_or_else(|| tracing::debug_span!("fixed_count_retry_strategy")),
        }
    }
}
