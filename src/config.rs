use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::InfraResult;
use crate::middleware::{DEFAULT_CLIENT_TIMEOUT, RetryInvoker};
use crate::retry::{
    AlwaysRetryStrategy, EligibilityTable, ExponentialBackoffRetryStrategy,
    FixedCountRetryStrategy, FixedTimeoutRetryStrategy, RetryStrategy,
    TimeoutAwareFixedCountRetryStrategy,
};

/// 默认批量并发数
pub const DEFAULT_MAX_CONCURRENCY: usize = 5;

/// 默认单键请求超时
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

/// 默认客户端超时，与 [`DEFAULT_CLIENT_TIMEOUT`] 一致
pub const DEFAULT_CLIENT_TIMEOUT_MS: u64 = DEFAULT_CLIENT_TIMEOUT.as_millis() as u64;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub client: ClientConfig,
    pub bulk: BulkConfig,
    pub retry: RetryConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientConfig {
    /// 单次调用（包括所有重试）的截止时长
    pub client_timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            client_timeout_ms: DEFAULT_CLIENT_TIMEOUT_MS,
        }
    }
}

impl ClientConfig {
    pub fn client_timeout(&self) -> Duration {
        Duration::from_millis(self.client_timeout_ms)
    }
}

/// 批量操作配置
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct BulkConfig {
    /// 工作者数量上限（0 表示使用默认值）
    pub max_concurrency: usize,
    /// 每次单键调用的超时（0 表示使用默认值）
    pub request_timeout_ms: u64,
}

impl Default for BulkConfig {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
        }
    }
}

impl BulkConfig {
    #[must_use]
    pub fn with_max_concurrency(&self, max_concurrency: usize) -> Self {
        Self {
            max_concurrency,
            ..self.clone()
        }
    }

    #[must_use]
    pub fn with_request_timeout(&self, request_timeout: Duration) -> Self {
        Self {
            request_timeout_ms: request_timeout.as_millis() as u64,
            ..self.clone()
        }
    }

    pub fn max_concurrency(&self) -> usize {
        if self.max_concurrency == 0 {
            DEFAULT_MAX_CONCURRENCY
        } else {
            self.max_concurrency
        }
    }

    pub fn request_timeout(&self) -> Duration {
        if self.request_timeout_ms == 0 {
            Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS)
        } else {
            Duration::from_millis(self.request_timeout_ms)
        }
    }

    /// 处理 `item_count` 个任务时启动的工作者数量，不会超过任务数
    pub fn worker_count(&self, item_count: usize) -> usize {
        self.max_concurrency().min(item_count)
    }
}

/// 可配置的重试策略类型
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryStrategyKind {
    Never,
    Always,
    #[default]
    FixedCount,
    FixedTimeout,
    ExponentialBackoff,
    TimeoutAwareFixedCount,
}

/// 重试配置
///
/// 数值为 0 的字段使用对应策略的默认值；不适用于所选策略的字段被忽略
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    pub strategy: RetryStrategyKind,
    /// 未设置时使用策略自身的默认资格表
    pub eligibility: Option<EligibilityTable>,
    pub max_attempts: u32,
    pub retry_timeout_ms: u64,
    pub retry_delay_interval_ms: u64,
    pub initial_delay_ms: f64,
    pub growth_factor: u32,
    pub max_backoff_ms: u64,
    pub timeout_ms: u64,
    pub retry_delay_ms: u64,
}

impl RetryConfig {
    pub fn build_strategy(&self) -> RetryStrategy {
        let strategy: RetryStrategy = match self.strategy {
            RetryStrategyKind::Never => return RetryStrategy::Never,
            RetryStrategyKind::Always => AlwaysRetryStrategy::builder()
                .retry_delay_millis(self.retry_delay_ms)
                .build()
                .into(),
            RetryStrategyKind::FixedCount => FixedCountRetryStrategy::builder()
                .max_attempts(self.max_attempts)
                .build()
                .into(),
            RetryStrategyKind::FixedTimeout => FixedTimeoutRetryStrategy::builder()
                .retry_timeout_millis(self.retry_timeout_ms)
                .retry_delay_interval_millis(self.retry_delay_interval_ms)
                .build()
                .into(),
            RetryStrategyKind::ExponentialBackoff => ExponentialBackoffRetryStrategy::builder()
                .initial_delay_millis(self.initial_delay_ms)
                .growth_factor(self.growth_factor)
                .max_backoff_millis(self.max_backoff_ms)
                .build()
                .into(),
            RetryStrategyKind::TimeoutAwareFixedCount => {
                TimeoutAwareFixedCountRetryStrategy::builder()
                    .max_attempts(self.max_attempts)
                    .timeout_duration(Duration::from_millis(self.timeout_ms))
                    .build()
                    .into()
            }
        };

        match self.eligibility {
            Some(table) => strategy.with_eligibility(table.classifier()),
            None => strategy,
        }
    }
}

impl Config {
    pub fn load_from_file(path: impl AsRef<Path>) -> InfraResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> InfraResult<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// 按配置构造重试调用器
    pub fn retry_invoker(&self) -> RetryInvoker {
        RetryInvoker::new(self.retry.build_strategy())
            .with_client_timeout(self.client.client_timeout())
    }
}
