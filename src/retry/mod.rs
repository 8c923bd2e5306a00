//! 重试策略模块
//!
//! 每次远程调用失败后，调用循环构造一个 [`AttemptContext`] 交给 [`RetryStrategy`]，
//! 由策略给出 [`RetryDecision`]：停止，或等待一段时间后重试。
//!
//! 策略是在客户端构造时确定的不可变值，可在并发调用之间共享；
//! 所有 `with_*` 方法都返回新值而不修改原值。

pub mod always;
pub mod eligibility;
pub mod exponential;
pub mod fixed;
pub mod fixed_timeout;
pub mod timeout_aware;

pub use always::{AlwaysRetryStrategy, AlwaysRetryStrategyBuilder};
pub use eligibility::{
    DeadlineAwareEligibility, DefaultEligibility, EligibilityClassifier, EligibilityTable,
    is_idempotent,
};
pub use exponential::{ExponentialBackoffRetryStrategy, ExponentialBackoffRetryStrategyBuilder};
pub use fixed::{FixedCountRetryStrategy, FixedCountRetryStrategyBuilder};
pub use fixed_timeout::{FixedTimeoutRetryStrategy, FixedTimeoutRetryStrategyBuilder};
pub use timeout_aware::{
    TimeoutAwareFixedCountRetryStrategy, TimeoutAwareFixedCountRetryStrategyBuilder,
};

use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::types::{FailureClass, OperationName};

/// 一次失败调用的上下文
///
/// 每次失败新建一个，只读地交给策略
#[derive(Debug, Clone)]
pub struct AttemptContext {
    /// 被调用的远程操作
    pub operation: OperationName,
    /// 本次失败的分类
    pub failure: FailureClass,
    /// 已经执行的次数（从 1 开始）
    pub attempt_number: u32,
    /// 整个调用的截止时间
    pub overall_deadline: Instant,
}

impl AttemptContext {
    pub fn new(
        operation: OperationName,
        failure: FailureClass,
        attempt_number: u32,
        overall_deadline: Instant,
    ) -> Self {
        Self {
            operation,
            failure,
            attempt_number,
            overall_deadline,
        }
    }
}

/// 重试决定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// 不再重试，返回最后一次的错误
    Stop,
    /// 等待 `delay` 后重试；`revised_deadline` 存在时调用方需以它替换整体截止时间
    RetryAfter {
        delay: Duration,
        revised_deadline: Option<Instant>,
    },
}

impl RetryDecision {
    pub fn retry_after(delay: Duration) -> Self {
        RetryDecision::RetryAfter {
            delay,
            revised_deadline: None,
        }
    }

    pub fn retry_after_millis(delay_ms: u64) -> Self {
        Self::retry_after(Duration::from_millis(delay_ms))
    }

    pub fn is_stop(&self) -> bool {
        matches!(self, RetryDecision::Stop)
    }

    pub fn delay(&self) -> Option<Duration> {
        match self {
            RetryDecision::Stop => None,
            RetryDecision::RetryAfter { delay, .. } => Some(*delay),
        }
    }

    pub fn revised_deadline(&self) -> Option<Instant> {
        match self {
            RetryDecision::Stop => None,
            RetryDecision::RetryAfter {
                revised_deadline, ..
            } => *revised_deadline,
        }
    }
}

/// 重试策略
///
/// 策略集合是封闭的，新增策略需要在此处增加变体
#[derive(Debug, Clone)]
pub enum RetryStrategy {
    /// 从不重试
    Never,
    /// 固定延迟后总是重试（仅用于主题订阅的流式重连）
    Always(AlwaysRetryStrategy),
    /// 固定次数，立即重试
    FixedCount(FixedCountRetryStrategy),
    /// 在整体截止时间内以固定间隔重试，每次重试使用更短的单次超时
    FixedTimeout(FixedTimeoutRetryStrategy),
    /// 指数退避
    ExponentialBackoff(ExponentialBackoffRetryStrategy),
    /// 固定次数，每次重试重新签发截止时间
    TimeoutAwareFixedCount(TimeoutAwareFixedCountRetryStrategy),
}

impl RetryStrategy {
    pub fn never() -> Self {
        RetryStrategy::Never
    }

    pub fn name(&self) -> &'static str {
        match self {
            RetryStrategy::Never => "never",
            RetryStrategy::Always(_) => "always",
            RetryStrategy::FixedCount(_) => "fixed_count",
            RetryStrategy::FixedTimeout(_) => "fixed_timeout",
            RetryStrategy::ExponentialBackoff(_) => "exponential_backoff",
            RetryStrategy::TimeoutAwareFixedCount(_) => "timeout_aware_fixed_count",
        }
    }

    /// 决定是否以及何时重试
    pub fn decide(&self, ctx: &AttemptContext) -> RetryDecision {
        match self {
            RetryStrategy::Never => RetryDecision::Stop,
            RetryStrategy::Always(s) => s.decide(ctx),
            RetryStrategy::FixedCount(s) => s.decide(ctx),
            RetryStrategy::FixedTimeout(s) => s.decide(ctx),
            RetryStrategy::ExponentialBackoff(s) => s.decide(ctx),
            RetryStrategy::TimeoutAwareFixedCount(s) => s.decide(ctx),
        }
    }

    /// 第 `attempt_number` 次执行使用的截止时间
    ///
    /// 只有 `FixedTimeout` 会在重试时收窄单次截止时间，首次执行总是使用整体截止时间
    pub fn attempt_deadline(&self, overall_deadline: Instant, attempt_number: u32) -> Instant {
        match self {
            RetryStrategy::FixedTimeout(s) if attempt_number > 1 => {
                s.calculate_retry_deadline(overall_deadline)
            }
            _ => overall_deadline,
        }
    }

    /// 替换资格判定，返回新的策略
    #[must_use]
    pub fn with_eligibility(&self, eligibility: Arc<dyn EligibilityClassifier>) -> Self {
        match self {
            RetryStrategy::Never => RetryStrategy::Never,
            RetryStrategy::Always(s) => s.with_eligibility(eligibility).into(),
            RetryStrategy::FixedCount(s) => s.with_eligibility(eligibility).into(),
            RetryStrategy::FixedTimeout(s) => s.with_eligibility(eligibility).into(),
            RetryStrategy::ExponentialBackoff(s) => s.with_eligibility(eligibility).into(),
            RetryStrategy::TimeoutAwareFixedCount(s) => s.with_eligibility(eligibility).into(),
        }
    }
}

impl Default for RetryStrategy {
    fn default() -> Self {
        RetryStrategy::FixedCount(FixedCountRetryStrategy::default())
    }
}

impl From<AlwaysRetryStrategy> for RetryStrategy {
    fn from(s: AlwaysRetryStrategy) -> Self {
        RetryStrategy::Always(s)
    }
}

impl From<FixedCountRetryStrategy> for RetryStrategy {
    fn from(s: FixedCountRetryStrategy) -> Self {
        RetryStrategy::FixedCount(s)
    }
}

impl From<FixedTimeoutRetryStrategy> for RetryStrategy {
    fn from(s: FixedTimeoutRetryStrategy) -> Self {
        RetryStrategy::FixedTimeout(s)
    }
}

impl From<ExponentialBackoffRetryStrategy> for RetryStrategy {
    fn from(s: ExponentialBackoffRetryStrategy) -> Self {
        RetryStrategy::ExponentialBackoff(s)
    }
}

impl From<TimeoutAwareFixedCountRetryStrategy> for RetryStrategy {
    fn from(s: TimeoutAwareFixedCountRetryStrategy) -> Self {
        RetryStrategy::TimeoutAwareFixedCount(s)
    }
}

/// 以 [0.9, 1.1) 区间内的均匀随机系数扰动延迟
pub(crate) fn add_jitter(delay_ms: u64) -> u64 {
    let factor: f64 = rand::thread_rng().gen_range(0.9..1.1);
    (factor * delay_ms as f64) as u64
}

/// [min, max) 区间内的均匀随机整数，区间为空时退化为下界
pub(crate) fn rand_in_range(min: u64, max: u64) -> u64 {
    if min >= max {
        return min;
    }
    rand::thread_rng().gen_range(min..max)
}
