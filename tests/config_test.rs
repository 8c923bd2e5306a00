//! 配置加载测试

use flare_cache_client::middleware::DEFAULT_CLIENT_TIMEOUT;
use flare_cache_client::retry::{AttemptContext, RetryStrategy};
use flare_cache_client::{
    Config, EligibilityTable, FailureClass, OperationName, RetryInvoker, RetryStrategyKind,
};
use std::io::Write;
use std::time::Duration;
use tokio::time::Instant;

#[test]
fn empty_config_uses_defaults() {
    let config = Config::from_toml_str("").unwrap();

    assert_eq!(config.bulk.max_concurrency(), 5);
    assert_eq!(config.bulk.request_timeout(), Duration::from_secs(10));
    assert_eq!(config.client.client_timeout(), Duration::from_secs(5));
    assert_eq!(config.retry.strategy, RetryStrategyKind::FixedCount);
    assert!(config.retry.eligibility.is_none());
    // 配置默认值与调用器默认值一致
    assert_eq!(config.client.client_timeout(), DEFAULT_CLIENT_TIMEOUT);
    assert_eq!(
        config.retry_invoker().client_timeout(),
        RetryInvoker::new(RetryStrategy::default()).client_timeout()
    );

    match config.retry.build_strategy() {
        RetryStrategy::FixedCount(strategy) => assert_eq!(strategy.max_attempts(), 3),
        other => panic!("unexpected strategy {}", other.name()),
    }
}

#[test]
fn load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
[client]
client_timeout_ms = 2500

[bulk]
max_concurrency = 12
request_timeout_ms = 750

[retry]
strategy = "exponential_backoff"
initial_delay_ms = 2.0
growth_factor = 3
max_backoff_ms = 100
"#
    )
    .unwrap();

    let config = Config::load_from_file(file.path()).unwrap();

    assert_eq!(config.client.client_timeout(), Duration::from_millis(2500));
    assert_eq!(config.bulk.max_concurrency(), 12);
    assert_eq!(config.bulk.request_timeout(), Duration::from_millis(750));

    let RetryStrategy::ExponentialBackoff(strategy) = config.retry.build_strategy() else {
        panic!("expected exponential backoff");
    };
    assert_eq!(strategy.initial_delay_millis(), 2.0);
    assert_eq!(strategy.growth_factor(), 3);
    assert_eq!(strategy.max_backoff_millis(), 100);

    let invoker = config.retry_invoker();
    assert_eq!(invoker.client_timeout(), Duration::from_millis(2500));
    assert_eq!(invoker.strategy().name(), "exponential_backoff");
}

#[test]
fn eligibility_override_is_applied() {
    let config = Config::from_toml_str(
        r#"
[retry]
strategy = "fixed_count"
max_attempts = 2
eligibility = "deadline_aware"
"#,
    )
    .unwrap();
    assert_eq!(
        config.retry.eligibility,
        Some(EligibilityTable::DeadlineAware)
    );

    let strategy = config.retry.build_strategy();
    let timed_out = AttemptContext::new(
        OperationName::GET,
        FailureClass::DeadlineExceeded,
        1,
        Instant::now() + Duration::from_secs(1),
    );
    assert!(!strategy.decide(&timed_out).is_stop());
}

#[test]
fn every_strategy_kind_builds() {
    for (name, expected) in [
        ("never", "never"),
        ("always", "always"),
        ("fixed_count", "fixed_count"),
        ("fixed_timeout", "fixed_timeout"),
        ("exponential_backoff", "exponential_backoff"),
        ("timeout_aware_fixed_count", "timeout_aware_fixed_count"),
    ] {
        let config =
            Config::from_toml_str(&format!("[retry]\nstrategy = \"{name}\"\n")).unwrap();
        assert_eq!(config.retry.build_strategy().name(), expected);
    }
}

#[test]
fn unknown_strategy_is_rejected() {
    assert!(Config::from_toml_str("[retry]\nstrategy = \"sometimes\"\n").is_err());
}

#[test]
fn missing_file_reports_path() {
    let error = Config::load_from_file("/definitely/not/here.toml").unwrap_err();
    assert!(format!("{error:#}").contains("/definitely/not/here.toml"));
}
