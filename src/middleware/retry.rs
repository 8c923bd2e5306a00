//! 重试中间件
//!
//! [`RetryInvoker`] 驱动单次远程调用的重试循环；[`RetryLayer`] 把它包装成
//! tower 中间件，挂在任意以 `tonic::Status` 为错误类型的客户端服务上。

use futures::future::BoxFuture;
use std::future::Future;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::time::Instant;
use tonic::Status;
use tower::{Layer, Service, ServiceExt};
use tracing::{debug, warn};

use crate::error::CacheError;
use crate::metrics::RetryMetricsCollector;
use crate::retry::{AttemptContext, RetryDecision, RetryStrategy};
use crate::types::{FailureClass, OperationName};

/// 默认客户端超时
pub const DEFAULT_CLIENT_TIMEOUT: Duration = Duration::from_secs(5);

/// 可参与重试的错误
pub trait RetryableError: Sized {
    /// 错误的失败分类
    fn failure_class(&self) -> FailureClass;

    /// 单次执行超过截止时间时使用的错误
    fn deadline_exceeded() -> Self;
}

impl RetryableError for Status {
    fn failure_class(&self) -> FailureClass {
        FailureClass::from(self)
    }

    fn deadline_exceeded() -> Self {
        Status::deadline_exceeded("context deadline exceeded")
    }
}

impl RetryableError for CacheError {
    fn failure_class(&self) -> FailureClass {
        CacheError::failure_class(self)
    }

    fn deadline_exceeded() -> Self {
        CacheError::timeout("context deadline exceeded")
    }
}

/// 能给出自身操作名称的请求
pub trait RetryableRequest {
    fn operation(&self) -> OperationName;
}

/// 重试调用器
#[derive(Debug, Clone)]
pub struct RetryInvoker {
    strategy: RetryStrategy,
    client_timeout: Duration,
    metrics: Option<(RetryMetricsCollector, String)>,
}

impl RetryInvoker {
    pub fn new(strategy: RetryStrategy) -> Self {
        Self {
            strategy,
            client_timeout: DEFAULT_CLIENT_TIMEOUT,
            metrics: None,
        }
    }

    /// 设置整个调用（包括所有重试）的截止时长
    #[must_use]
    pub fn with_client_timeout(mut self, client_timeout: Duration) -> Self {
        self.client_timeout = client_timeout;
        self
    }

    /// 记录每次执行的时间戳，按缓存名称分组
    #[must_use]
    pub fn with_metrics(
        mut self,
        collector: RetryMetricsCollector,
        cache_name: impl Into<String>,
    ) -> Self {
        self.metrics = Some((collector, cache_name.into()));
        self
    }

    pub fn strategy(&self) -> &RetryStrategy {
        &self.strategy
    }

    pub fn client_timeout(&self) -> Duration {
        self.client_timeout
    }

    /// 执行 `call` 直到成功或策略决定停止
    ///
    /// `call` 收到本次执行的截止时间；超过截止时间的执行按 `DeadlineExceeded` 处理。
    /// 停止时返回最后一次执行的错误。
    pub async fn invoke<T, E, F, Fut>(&self, operation: &OperationName, mut call: F) -> Result<T, E>
    where
        E: RetryableError,
        F: FnMut(Instant) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut overall_deadline = Instant::now() + self.client_timeout;
        let mut attempt_number: u32 = 1;

        loop {
            let attempt_deadline = self
                .strategy
                .attempt_deadline(overall_deadline, attempt_number);

            // 截止时间已过的执行不再发起调用，直接按 DeadlineExceeded 交给策略
            let error = if Instant::now() >= attempt_deadline {
                E::deadline_exceeded()
            } else {
                if let Some((collector, cache_name)) = &self.metrics {
                    collector
                        .add_timestamp(cache_name, operation, Instant::now())
                        .await;
                }
                match tokio::time::timeout_at(attempt_deadline, call(attempt_deadline)).await {
                    Ok(Ok(value)) => return Ok(value),
                    Ok(Err(error)) => error,
                    Err(_) => E::deadline_exceeded(),
                }
            };

            let ctx = AttemptContext::new(
                operation.clone(),
                error.failure_class(),
                attempt_number,
                overall_deadline,
            );

            match self.strategy.decide(&ctx) {
                RetryDecision::Stop => {
                    if attempt_number > 1 {
                        warn!(
                            operation = %operation,
                            status = %ctx.failure,
                            attempts = attempt_number,
                            strategy = self.strategy.name(),
                            "Giving up after retries"
                        );
                    }
                    return Err(error);
                }
                RetryDecision::RetryAfter {
                    delay,
                    revised_deadline,
                } => {
                    debug!(
                        operation = %operation,
                        status = %ctx.failure,
                        attempt = attempt_number,
                        delay_ms = delay.as_millis() as u64,
                        "Retrying request"
                    );
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    if let Some(deadline) = revised_deadline {
                        overall_deadline = deadline;
                    }
                    attempt_number = attempt_number.saturating_add(1);
                }
            }
        }
    }
}

/// 重试中间件层
#[derive(Debug, Clone)]
pub struct RetryLayer {
    invoker: RetryInvoker,
}

impl RetryLayer {
    pub fn new(invoker: RetryInvoker) -> Self {
        Self { invoker }
    }

    pub fn from_strategy(strategy: RetryStrategy) -> Self {
        Self::new(RetryInvoker::new(strategy))
    }
}

impl<S> Layer<S> for RetryLayer {
    type Service = RetryService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RetryService {
            inner,
            invoker: self.invoker.clone(),
        }
    }
}

/// 重试服务
///
/// 每次执行都克隆内部服务与请求，因此请求必须实现 `Clone`
#[derive(Debug, Clone)]
pub struct RetryService<S> {
    inner: S,
    invoker: RetryInvoker,
}

impl<S, Req> Service<Req> for RetryService<S>
where
    S: Service<Req, Error = Status> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Response: Send + 'static,
    Req: RetryableRequest + Clone + Send + 'static,
{
    type Response = S::Response;
    type Error = Status;
    type Future = BoxFuture<'static, Result<S::Response, Status>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        // 每次执行由 oneshot 等待克隆出的内部服务就绪
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Req) -> Self::Future {
        let inner = self.inner.clone();
        let invoker = self.invoker.clone();
        let operation = request.operation();

        Box::pin(async move {
            invoker
                .invoke(&operation, move |_deadline| {
                    inner.clone().oneshot(request.clone())
                })
                .await
        })
    }
}
