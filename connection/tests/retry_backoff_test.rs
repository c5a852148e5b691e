use std::time::{Duration, Instant};

use config::ConnectionConfig;
use connection::{ConnectionManager, RetryPolicy};
use errors::RelayError;
use relay_core::CompletionRequest;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_failed_request_sleeps_through_backoff_schedule() {
    testing::init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/completions"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    let config = ConnectionConfig {
        max_retries: 3,
        retry_delay_ms: 40,
        ..testing::connection_config_for(&server)
    };
    let policy = RetryPolicy::from_config(&config);
    assert_eq!(
        policy.schedule(),
        vec![Duration::from_millis(40), Duration::from_millis(80)]
    );

    let manager = ConnectionManager::new(config).unwrap();
    let started = Instant::now();
    let err = manager
        .request(&CompletionRequest::new("always failing"))
        .await
        .unwrap_err();

    assert!(started.elapsed() >= Duration::from_millis(120));
    assert!(matches!(err, RelayError::Connection { attempts: 3, .. }));
}

#[tokio::test]
async fn test_unreachable_upstream_is_network_error() {
    let manager = ConnectionManager::new(testing::unreachable_config()).unwrap();

    assert!(!manager.health_check().await);
    let err = manager
        .request(&CompletionRequest::new("anyone there?"))
        .await
        .unwrap_err();

    match err {
        RelayError::Connection { attempts, last } => {
            assert_eq!(attempts, 2);
            assert!(matches!(*last, RelayError::Network { .. }));
        }
        other => panic!("expected Connection error, got {other:?}")
    }
}
