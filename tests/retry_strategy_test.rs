//! 重试策略与资格判定测试

use flare_cache_client::retry::{
    AlwaysRetryStrategy, AttemptContext, DeadlineAwareEligibility, DefaultEligibility,
    EligibilityClassifier, EligibilityTable, ExponentialBackoffRetryStrategy,
    FixedCountRetryStrategy, FixedTimeoutRetryStrategy, RetryDecision, RetryStrategy,
    TimeoutAwareFixedCountRetryStrategy, is_idempotent,
};
use flare_cache_client::{FailureClass, OperationName};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

fn ctx(operation: &str, failure: FailureClass, attempt_number: u32) -> AttemptContext {
    AttemptContext::new(
        OperationName::new(operation),
        failure,
        attempt_number,
        Instant::now() + Duration::from_secs(5),
    )
}

// ============================================================
// 资格判定
// ============================================================

#[test]
fn default_table_retries_only_transient_failures() {
    let table = DefaultEligibility;
    let get = OperationName::GET;

    assert!(table.is_eligible(&get, FailureClass::Unavailable));
    assert!(table.is_eligible(&get, FailureClass::Internal));
    assert!(!table.is_eligible(&get, FailureClass::DeadlineExceeded));
    assert!(!table.is_eligible(&get, FailureClass::Cancelled));
    assert!(!table.is_eligible(&get, FailureClass::InvalidArgument));
    assert!(!table.is_eligible(&get, FailureClass::NotFound));
}

#[test]
fn deadline_aware_table_also_retries_deadline_exceeded() {
    let table = DeadlineAwareEligibility;
    let get = OperationName::GET;

    assert!(table.is_eligible(&get, FailureClass::Unavailable));
    assert!(table.is_eligible(&get, FailureClass::DeadlineExceeded));
    assert!(!table.is_eligible(&get, FailureClass::Cancelled));
    assert!(!table.is_eligible(
        &OperationName::new("Increment"),
        FailureClass::DeadlineExceeded
    ));
}

#[test]
fn non_idempotent_operations_are_never_eligible() {
    for name in [
        "Increment",
        "UpdateTtl",
        "IncreaseTtl",
        "DecreaseTtl",
        "SetIf",
        "SetIfNotExists",
        "DictionaryIncrement",
        "SetPop",
        "ListPushFront",
        "ListPushBack",
        "ListPopFront",
        "ListPopBack",
        "ListConcatenateFront",
        "ListConcatenateBack",
        "ListRetain",
        "SortedSetIncrement",
        "SomethingUnknown",
    ] {
        let op = OperationName::new(name);
        assert!(!is_idempotent(&op), "{name} should not be idempotent");
        assert!(!DefaultEligibility.is_eligible(&op, FailureClass::Unavailable));
    }
}

#[test]
fn idempotent_operations_are_eligible() {
    for name in [
        "Get",
        "GetBatch",
        "Set",
        "SetBatch",
        "Delete",
        "KeysExist",
        "ItemGetTtl",
        "DictionaryFetch",
        "SetContains",
        "ListFetch",
        "SortedSetPut",
        "SortedSetLengthByScore",
        "TopicSubscribe",
    ] {
        let op = OperationName::new(name);
        assert!(is_idempotent(&op), "{name} should be idempotent");
        assert!(DefaultEligibility.is_eligible(&op, FailureClass::Internal));
    }
}

#[test]
fn operation_name_from_grpc_path() {
    assert_eq!(OperationName::from_grpc_path("/cache_client.Scs/Get").as_str(), "Get");
    assert_eq!(
        OperationName::from_grpc_path("/cache_client.Scs/DictionaryIncrement").as_str(),
        "DictionaryIncrement"
    );
    assert_eq!(
        OperationName::from_grpc_path("/cache_client.pubsub.Pubsub/Subscribe"),
        OperationName::TOPIC_SUBSCRIBE
    );
}

#[test]
fn eligibility_table_selects_classifier() {
    let default = EligibilityTable::Default.classifier();
    let deadline_aware = EligibilityTable::DeadlineAware.classifier();

    assert!(!default.is_eligible(&OperationName::GET, FailureClass::DeadlineExceeded));
    assert!(deadline_aware.is_eligible(&OperationName::GET, FailureClass::DeadlineExceeded));
}

// ============================================================
// 固定次数
// ============================================================

#[test]
fn fixed_count_stops_after_max_attempts() {
    let strategy = FixedCountRetryStrategy::builder().max_attempts(3).build();

    for attempt in 1..=3 {
        assert_eq!(
            strategy.decide(&ctx("Get", FailureClass::Unavailable, attempt)),
            RetryDecision::retry_after(Duration::ZERO),
            "attempt {attempt} should retry"
        );
    }
    assert!(
        strategy
            .decide(&ctx("Get", FailureClass::Unavailable, 4))
            .is_stop()
    );
    assert!(
        strategy
            .decide(&ctx("Get", FailureClass::Unavailable, 100))
            .is_stop()
    );
}

#[test]
fn fixed_count_stops_for_ineligible_failures_at_any_attempt() {
    let strategy = FixedCountRetryStrategy::default();

    for attempt in 0..=5 {
        assert!(
            strategy
                .decide(&ctx("Get", FailureClass::InvalidArgument, attempt))
                .is_stop()
        );
        assert!(
            strategy
                .decide(&ctx("Increment", FailureClass::Unavailable, attempt))
                .is_stop()
        );
    }
}

#[test]
fn zero_max_attempts_makes_first_failure_terminal() {
    let strategy = FixedCountRetryStrategy::default().with_max_attempts(0);

    assert!(
        strategy
            .decide(&ctx("Get", FailureClass::Unavailable, 1))
            .is_stop()
    );
}

#[test]
fn builder_zero_means_default() {
    let strategy = FixedCountRetryStrategy::builder().max_attempts(0).build();
    assert_eq!(strategy.max_attempts(), 3);
}

// ============================================================
// 指数退避
// ============================================================

#[test]
fn exponential_backoff_windows() {
    let strategy = ExponentialBackoffRetryStrategy::default();

    assert_eq!(strategy.initial_delay_millis(), 0.5);
    assert_eq!(strategy.growth_factor(), 2);
    assert_eq!(strategy.max_backoff_millis(), 8);

    assert_eq!(strategy.jitter_window(0), (0, 0));
    assert_eq!(strategy.jitter_window(2), (1, 3));
    assert_eq!(strategy.jitter_window(3), (2, 6));
    // 达到上限后窗口不再增长
    assert_eq!(strategy.jitter_window(4), (4, 12));
    assert_eq!(strategy.jitter_window(5), (4, 12));
    assert_eq!(strategy.jitter_window(1000), (4, 12));
}

#[test]
fn exponential_backoff_first_retry_delay_is_below_one_millisecond() {
    let strategy = ExponentialBackoffRetryStrategy::default();

    for _ in 0..50 {
        let delay = strategy
            .decide(&ctx("Get", FailureClass::Unavailable, 1))
            .delay()
            .unwrap();
        assert!(delay < Duration::from_millis(1));
    }
}

#[test]
fn exponential_backoff_saturates() {
    let strategy = ExponentialBackoffRetryStrategy::default();

    for attempt_number in [5, 6, 10, 64] {
        let delay = strategy
            .decide(&ctx("Get", FailureClass::Internal, attempt_number))
            .delay()
            .unwrap();
        assert!(delay >= Duration::from_millis(4), "{delay:?}");
        assert!(delay < Duration::from_millis(12), "{delay:?}");
    }
}

#[test]
fn exponential_backoff_uses_configured_growth_factor() {
    let strategy = ExponentialBackoffRetryStrategy::builder()
        .initial_delay_millis(10.0)
        .growth_factor(3)
        .max_backoff_millis(1000)
        .build();

    // base(2) = 90, previous = 30
    assert_eq!(strategy.jitter_window(2), (30, 90));
}

#[test]
fn exponential_backoff_respects_eligibility() {
    let strategy = ExponentialBackoffRetryStrategy::default();
    assert!(
        strategy
            .decide(&ctx("Get", FailureClass::DeadlineExceeded, 1))
            .is_stop()
    );
}

// ============================================================
// 固定超时
// ============================================================

#[test]
fn fixed_timeout_applies_jitter_to_delay() {
    let strategy = FixedTimeoutRetryStrategy::default();

    for attempt in 1..20 {
        let delay = strategy
            .decide(&ctx("Get", FailureClass::Unavailable, attempt))
            .delay()
            .unwrap();
        assert!(delay >= Duration::from_millis(90), "{delay:?}");
        assert!(delay < Duration::from_millis(110), "{delay:?}");
    }
}

#[test]
fn fixed_timeout_retries_slow_attempt_within_overall_deadline() {
    let strategy = FixedTimeoutRetryStrategy::default();

    // 默认资格表拒绝 DeadlineExceeded，但整体截止时间未到
    let decision = strategy.decide(&ctx("Get", FailureClass::DeadlineExceeded, 1));
    assert!(!decision.is_stop());

    // 不幂等的操作同样适用
    let decision = strategy.decide(&ctx("Increment", FailureClass::DeadlineExceeded, 2));
    assert!(!decision.is_stop());
}

#[test]
fn fixed_timeout_stops_once_overall_deadline_passed() {
    let strategy = FixedTimeoutRetryStrategy::default();
    let expired = AttemptContext::new(
        OperationName::GET,
        FailureClass::DeadlineExceeded,
        2,
        Instant::now() - Duration::from_millis(1),
    );

    assert!(strategy.decide(&expired).is_stop());
}

#[test]
fn fixed_timeout_stops_for_ineligible_failures() {
    let strategy = FixedTimeoutRetryStrategy::default();
    assert!(
        strategy
            .decide(&ctx("Get", FailureClass::Cancelled, 1))
            .is_stop()
    );
}

#[tokio::test(start_paused = true)]
async fn fixed_timeout_narrows_retry_deadline() {
    let strategy = FixedTimeoutRetryStrategy::builder()
        .retry_timeout_millis(200)
        .build();
    let now = Instant::now();

    let far = now + Duration::from_secs(5);
    assert_eq!(
        strategy.calculate_retry_deadline(far),
        now + Duration::from_millis(200)
    );

    let near = now + Duration::from_millis(50);
    assert_eq!(strategy.calculate_retry_deadline(near), near);

    let wrapped = RetryStrategy::from(strategy);
    assert_eq!(wrapped.attempt_deadline(far, 1), far);
    assert_eq!(
        wrapped.attempt_deadline(far, 2),
        now + Duration::from_millis(200)
    );
}

// ============================================================
// 超时感知的固定次数
// ============================================================

#[tokio::test(start_paused = true)]
async fn timeout_aware_issues_fresh_deadline() {
    let strategy = TimeoutAwareFixedCountRetryStrategy::default();
    let now = Instant::now();

    let decision = strategy.decide(&ctx("Get", FailureClass::DeadlineExceeded, 1));
    assert_eq!(decision.delay(), Some(Duration::ZERO));
    assert_eq!(
        decision.revised_deadline(),
        Some(now + Duration::from_millis(500))
    );

    assert_eq!(
        strategy.calculate_new_overall_deadline(),
        now + strategy.timeout_duration()
    );
}

#[test]
fn timeout_aware_stops_after_max_attempts() {
    let strategy = TimeoutAwareFixedCountRetryStrategy::builder()
        .max_attempts(2)
        .timeout_duration(Duration::from_millis(100))
        .build();

    assert!(
        !strategy
            .decide(&ctx("Get", FailureClass::DeadlineExceeded, 2))
            .is_stop()
    );
    assert!(
        strategy
            .decide(&ctx("Get", FailureClass::DeadlineExceeded, 3))
            .is_stop()
    );
    assert!(
        strategy
            .decide(&ctx("ListPushBack", FailureClass::Unavailable, 1))
            .is_stop()
    );
}

// ============================================================
// 总是重试 / 从不重试
// ============================================================

#[test]
fn always_retry_ignores_eligibility_and_attempts() {
    let strategy = AlwaysRetryStrategy::default();

    for (op, failure, attempt) in [
        ("TopicSubscribe", FailureClass::Unavailable, 1),
        ("Increment", FailureClass::InvalidArgument, 7),
        ("Get", FailureClass::Cancelled, 1000),
    ] {
        assert_eq!(
            strategy.decide(&ctx(op, failure, attempt)),
            RetryDecision::retry_after(Duration::from_millis(500))
        );
    }

    let faster = strategy.with_retry_delay(Duration::from_millis(20));
    assert_eq!(faster.retry_delay(), Duration::from_millis(20));
    assert_eq!(strategy.retry_delay(), Duration::from_millis(500));
}

#[test]
fn never_retry_always_stops() {
    let strategy = RetryStrategy::never();
    assert!(
        strategy
            .decide(&ctx("Get", FailureClass::Unavailable, 1))
            .is_stop()
    );
    assert_eq!(strategy.name(), "never");
}

// ============================================================
// 写时复制
// ============================================================

#[test]
fn with_eligibility_returns_new_strategy() {
    let original = RetryStrategy::from(FixedCountRetryStrategy::default());
    let deadline_aware = original.with_eligibility(Arc::new(DeadlineAwareEligibility));

    let timed_out = ctx("Get", FailureClass::DeadlineExceeded, 1);
    assert!(original.decide(&timed_out).is_stop());
    assert!(!deadline_aware.decide(&timed_out).is_stop());
}

#[test]
fn with_methods_leave_original_untouched() {
    let original = ExponentialBackoffRetryStrategy::default();
    let tuned = original
        .with_initial_delay_millis(5.0)
        .with_growth_factor(4)
        .with_max_backoff_millis(500);

    assert_eq!(original.initial_delay_millis(), 0.5);
    assert_eq!(original.growth_factor(), 2);
    assert_eq!(original.max_backoff_millis(), 8);
    assert_eq!(tuned.initial_delay_millis(), 5.0);
    assert_eq!(tuned.growth_factor(), 4);
    assert_eq!(tuned.max_backoff_millis(), 500);
}

#[test]
fn strategies_are_shareable_across_threads() {
    let strategy = Arc::new(RetryStrategy::default());

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let strategy = Arc::clone(&strategy);
            std::thread::spawn(move || {
                (1..=4)
                    .map(|attempt| {
                        strategy
                            .decide(&ctx("Get", FailureClass::Unavailable, attempt))
                            .is_stop()
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), vec![false, false, false, true]);
    }
}
