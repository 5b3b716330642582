use std::sync::atomic::{AtomicU32, Ordering};

use mastopipe::backoff;
use mastopipe::{Error, SourceError};

fn flaky_error() -> SourceError {
    SourceError::Status {
        status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
        body: "upstream broke".to_string(),
    }
}

// start_paused makes the backoff sleeps free — the paused clock
// auto-advances whenever the runtime is otherwise idle.

#[tokio::test(start_paused = true)]
async fn succeeds_on_first_attempt_without_retrying() {
    let calls = AtomicU32::new(0);

    let result = backoff::invoke(10, || async {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok::<_, SourceError>(7)
    })
    .await
    .unwrap();

    assert_eq!(result, 7);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn failing_max_minus_one_times_then_succeeding_returns_the_result() {
    let calls = AtomicU32::new(0);
    let max_attempts = 5;

    let result = backoff::invoke(max_attempts, || async {
        let attempt = calls.fetch_add(1, Ordering::SeqCst) + 1;
        if attempt < max_attempts {
            Err(flaky_error())
        } else {
            Ok("made it")
        }
    })
    .await
    .unwrap();

    assert_eq!(result, "made it");
    assert_eq!(calls.load(Ordering::SeqCst), max_attempts);
}

#[tokio::test(start_paused = true)]
async fn failing_every_attempt_exhausts_the_retry_budget() {
    let calls = AtomicU32::new(0);

    let err = backoff::invoke(3, || async {
        calls.fetch_add(1, Ordering::SeqCst);
        Err::<(), _>(flaky_error())
    })
    .await
    .expect_err("all attempts fail");

    assert_eq!(calls.load(Ordering::SeqCst), 3);
    match err {
        Error::RetryExhausted { attempts, last } => {
            assert_eq!(attempts, 3);
            // The last underlying failure rides along
            assert!(matches!(
                last,
                SourceError::Status { status, .. }
                    if status == reqwest::StatusCode::INTERNAL_SERVER_ERROR
            ));
        }
        other => panic!("expected RetryExhausted, got {other}"),
    }
}

#[tokio::test(start_paused = true)]
async fn zero_attempts_still_runs_the_operation_once() {
    let calls = AtomicU32::new(0);

    let err = backoff::invoke(0, || async {
        calls.fetch_add(1, Ordering::SeqCst);
        Err::<(), _>(flaky_error())
    })
    .await
    .expect_err("the single attempt fails");

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(matches!(err, Error::RetryExhausted { attempts: 1, .. }));
}
