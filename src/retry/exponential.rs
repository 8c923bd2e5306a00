use super::{
    AttemptContext, DefaultEligibility, EligibilityClassifier, RetryDecision, rand_in_range,
};
use std::sync::Arc;
use tracing::{Span, debug};

pub const DEFAULT_INITIAL_DELAY_MILLIS: f64 = 0.5;
pub const DEFAULT_GROWTH_FACTOR: u32 = 2;
pub const DEFAULT_MAX_BACKOFF_MILLIS: u64 = 8;

/// 指数退避重试策略
///
/// 第 k 次（从 0 开始）重试的基础延迟为 `min(max_backoff, initial_delay * growth_factor^k)`，
/// 实际延迟在 `[previous, 3 * previous)` 中均匀随机取整，`previous = base / growth_factor`
/// （k = 0 时等于 base）
#[derive(Debug, Clone)]
pub struct ExponentialBackoffRetryStrategy {
    eligibility: Arc<dyn EligibilityClassifier>,
    initial_delay_millis: f64,
    growth_factor: u32,
    max_backoff_millis: u64,
    span: Span,
}

impl ExponentialBackoffRetryStrategy {
    pub fn builder() -> ExponentialBackoffRetryStrategyBuilder {
        ExponentialBackoffRetryStrategyBuilder::default()
    }

    pub fn initial_delay_millis(&self) -> f64 {
        self.initial_delay_millis
    }

    pub fn growth_factor(&self) -> u32 {
        self.growth_factor
    }

    pub fn max_backoff_millis(&self) -> u64 {
        self.max_backoff_millis
    }

    #[must_use]
    pub fn with_initial_delay_millis(&self, initial_delay_millis: f64) -> Self {
        Self {
            initial_delay_millis,
            ..self.clone()
        }
    }

    #[must_use]
    pub fn with_growth_factor(&self, growth_factor: u32) -> Self {
        Self {
            growth_factor: growth_factor.max(1),
            ..self.clone()
        }
    }

    #[must_use]
    pub fn with_max_backoff_millis(&self, max_backoff_millis: u64) -> Self {
        Self {
            max_backoff_millis,
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

    /// 第 `attempt`（从 0 开始）次重试的抖动窗口 `[low, high)`
    pub fn jitter_window(&self, attempt: u32) -> (u64, u64) {
        let base_delay = self.base_delay(attempt);
        let previous_base_delay = if attempt == 0 {
            base_delay
        } else {
            base_delay / u64::from(self.growth_factor)
        };
        (previous_base_delay, previous_base_delay.saturating_mul(3))
    }

    fn base_delay(&self, attempt: u32) -> u64 {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let delay = self.initial_delay_millis * f64::from(self.growth_factor).powi(exponent);
        // f64 -> u64 转换会饱和，inf 也能安全截断
        (delay.min(self.max_backoff_millis as f64)) as u64
    }

    pub fn decide(&self, ctx: &AttemptContext) -> RetryDecision {
        let _entered = self.span.enter();
        let attempt = ctx.attempt_number.saturating_sub(1);

        debug!(
            operation = %ctx.operation,
            status = %ctx.failure,
            attempt,
            "Determining whether request is eligible for retry"
        );

        if !self.eligibility.is_eligible(&ctx.operation, ctx.failure) {
            debug!("Request is not eligible for retry");
            return RetryDecision::Stop;
        }

        let (low, high) = self.jitter_window(attempt);
        let delay_ms = rand_in_range(low, high);
        debug!(
            attempt,
            low_ms = low,
            high_ms = high,
            delay_ms,
            "Computed jittered backoff delay"
        );
        RetryDecision::retry_after_millis(delay_ms)
    }
}

impl Default for ExponentialBackoffRetryStrategy {
    fn default() -> Self {
        Self::builder().build()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExponentialBackoffRetryStrategyBuilder {
    eligibility: Option<Arc<dyn EligibilityClassifier>>,
    initial_delay_millis: f64,
    growth_factor: u32,
    max_backoff_millis: u64,
    span: Option<Span>,
}

impl ExponentialBackoffRetryStrategyBuilder {
    /// 初始延迟（0 表示使用默认值）
    pub fn initial_delay_millis(mut self, millis: f64) -> Self {
        self.initial_delay_millis = millis;
        self
    }

    /// 增长系数（0 表示使用默认值）
    pub fn growth_factor(mut self, growth_factor: u32) -> Self {
        self.growth_factor = growth_factor;
        self
    }

    /// 最大退避（0 表示使用默认值）
    pub fn max_backoff_millis(mut self, millis: u64) -> Self {
        self.max_backoff_millis = millis;
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

    pub fn build(self) -> ExponentialBackoffRetryStrategy {
        ExponentialBackoffRetryStrategy {
            eligibility: self
                .eligibility
                .unwrap_or_else(|| Arc::new(DefaultEligibility)),
            initial_delay_millis: if self.initial_delay_millis <= 0.0 {
                DEFAULT_INITIAL_DELAY_MILLIS
            } else {
                self.initial_delay_millis
            },
            growth_factor: if self.growth_factor == 0 {
                DEFAULT_GROWTH_FACTOR
            } else {
                self.growth_factor
            },
            max_backoff_millis: if self.max_backoff_millis == 0 {
                DEFAULT_MAX_BACKOFF_MILLIS
            } else {
                self.max_backoff_millis
            },
            span: self
                .span
                .unwrap_or_else(|| tracing::debug_span!("exponential_backoff_retry_strategy")),
        }
    }
}
