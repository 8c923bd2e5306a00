use super::{AttemptContext, DefaultEligibility, EligibilityClassifier, RetryDecision};
use std::sync::Arc;
use std::time::Duration;
use tracing::{Span, debug};

/// 默认重连延迟
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(500);

/// 固定延迟后总是重试
///
/// 仅用于主题订阅的流式重连，不要用于一元调用。
/// 资格判定只用于日志，不影响决定。
#[derive(Debug, Clone)]
pub struct AlwaysRetryStrategy {
    eligibility: Arc<dyn EligibilityClassifier>,
    retry_delay: Duration,
    span: Span,
}

impl AlwaysRetryStrategy {
    pub fn builder() -> AlwaysRetryStrategyBuilder {
        AlwaysRetryStrategyBuilder::default()
    }

    pub fn retry_delay(&self) -> Duration {
        self.retry_delay
    }

    #[must_use]
    pub fn with_retry_delay(&self, retry_delay: Duration) -> Self {
        Self {
            retry_delay,
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

        let eligible = self.eligibility.is_eligible(&ctx.operation, ctx.failure);
        debug!(
            operation = %ctx.operation,
            status = %ctx.failure,
            attempt = ctx.attempt_number,
            eligible,
            delay_ms = self.retry_delay.as_millis() as u64,
            "Retrying stream connection after fixed delay"
        );
        RetryDecision::retry_after(self.retry_delay)
    }
}

impl Default for AlwaysRetryStrategy {
    fn default() -> Self {
        Self::builder().build()
    }
}

#[derive(Debug, Clone, Default)]
pub struct AlwaysRetryStrategyBuilder {
    eligibility: Option<Arc<dyn EligibilityClassifier>>,
    retry_delay: Duration,
    span: Option<Span>,
}

impl AlwaysRetryStrategyBuilder {
    /// 重连延迟（0 表示使用默认值）
    pub fn retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    pub fn retry_delay_millis(self, millis: u64) -> Self {
        self.retry_delay(Duration::from_millis(millis))
    }

    pub fn eligibility(mut self, eligibility: Arc<dyn EligibilityClassifier>) -> Self {
        self.eligibility = Some(eligibility);
        self
    }

    pub fn span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    pub fn build(self) -> AlwaysRetryStrategy {
        AlwaysRetryStrategy {
            eligibility: self
                .eligibility
                .unwrap_or_else(|| Arc::new(DefaultEligibility)),
            retry_delay: if self.retry_delay.is_zero() {
                DEFAULT_RETRY_DELAY
            } else {
                self.retry_delay
            },
            span: self
                .span
                .unwrap_or_else(|| tracing::debug_span!("always_retry_strategy")),
        }
    }
}
