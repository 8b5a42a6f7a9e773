use std::future::Future;
use std::time::Duration;

use crate::error::Result;

/// Attempt ceiling and inter-attempt delay for one stage.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

/// Outcome of a bounded run. Failure is a reported condition, not an error:
/// task errors never escape the runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The success predicate held before any work was attempted.
    AlreadySatisfied,
    /// The goal was reached on the given attempt.
    Satisfied { attempts: u32 },
    /// Every attempt was spent with the predicate still false.
    Exhausted { attempts: u32 },
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, RunOutcome::Exhausted { .. })
    }
}

/// Run `task` until `predicate` reports the goal reached, for at most
/// `policy.max_attempts` invocations, sleeping `policy.delay` between
/// attempts.
///
/// Each iteration checks the predicate first, so a goal that is already met
/// costs zero task invocations. A task invocation that returns `Ok` but
/// leaves the predicate false counts against the limit the same as a task
/// error. The delay elapses only between attempts: a run that ends on
/// attempt `k` has slept `k - 1` times.
pub async fn run_bounded<P, PF, T, TF>(
    stage: &str,
    policy: RetryPolicy,
    mut predicate: P,
    mut task: T,
) -> RunOutcome
where
    P: FnMut() -> PF,
    PF: Future<Output = bool>,
    T: FnMut() -> TF,
    TF: Future<Output = Result<()>>,
{
    let mut attempts = 0u32;

    loop {
        if predicate().await {
            return if attempts == 0 {
                tracing::info!(stage, "Goal already satisfied, nothing to do");
                RunOutcome::AlreadySatisfied
            } else {
                tracing::info!(stage, attempts, "Goal satisfied");
                RunOutcome::Satisfied { attempts }
            };
        }

        if attempts >= policy.max_attempts {
            tracing::error!(
                stage,
                attempts,
                "Giving up: maximum number of attempts reached"
            );
            return RunOutcome::Exhausted { attempts };
        }

        attempts += 1;
        tracing::info!(
            stage,
            attempt = attempts,
            max_attempts = policy.max_attempts,
            "Starting attempt"
        );

        match task().await {
            Ok(()) => {
                if predicate().await {
                    tracing::info!(stage, attempts, "Goal satisfied");
                    return RunOutcome::Satisfied { attempts };
                }
                tracing::warn!(
                    stage,
                    attempt = attempts,
                    "Attempt completed but goal still unmet, retrying"
                );
            }
            Err(e) => {
                tracing::warn!(stage, attempt = attempts, error = %e, "Attempt failed");
            }
        }

        if attempts < policy.max_attempts && !policy.delay.is_zero() {
            tokio::time::sleep(policy.delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

    use crate::error::AppError;

    fn policy(max_attempts: u32, delay_secs: u64) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            delay: Duration::from_secs(delay_secs),
        }
    }

    #[tokio::test]
    async fn test_satisfied_predicate_short_circuits() {
        let calls = AtomicU32::new(0);
        let calls_ref = &calls;

        let outcome = run_bounded(
            "test",
            policy(3, 0),
            move || async move { true },
            move || async move {
                calls_ref.fetch_add(1, Ordering::SeqCst);
                Ok(())
            },
        )
        .await;

        assert_eq!(outcome, RunOutcome::AlreadySatisfied);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_always_failing_task_exhausts_exactly() {
        let calls = AtomicU32::new(0);
        let calls_ref = &calls;

        let outcome = run_bounded(
            "test",
            policy(2, 0),
            move || async move { false },
            move || async move {
                calls_ref.fetch_add(1, Ordering::SeqCst);
                Err(AppError::Internal("boom".to_string()))
            },
        )
        .await;

        assert_eq!(outcome, RunOutcome::Exhausted { attempts: 2 });
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_success_mid_run_stops_early() {
        let calls = AtomicU32::new(0);
        let done = AtomicBool::new(false);
        let (calls_ref, done_ref) = (&calls, &done);

        let outcome = run_bounded(
            "test",
            policy(5, 0),
            move || async move { done_ref.load(Ordering::SeqCst) },
            move || async move {
                let attempt = calls_ref.fetch_add(1, Ordering::SeqCst) + 1;
                if attempt < 3 {
                    return Err(AppError::Internal("not yet".to_string()));
                }
                done_ref.store(true, Ordering::SeqCst);
                Ok(())
            },
        )
        .await;

        assert_eq!(outcome, RunOutcome::Satisfied { attempts: 3 });
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_task_success_with_unmet_goal_counts_as_failure() {
        let calls = AtomicU32::new(0);
        let calls_ref = &calls;

        let outcome = run_bounded(
            "test",
            policy(3, 0),
            move || async move { false },
            move || async move {
                calls_ref.fetch_add(1, Ordering::SeqCst);
                Ok(())
            },
        )
        .await;

        assert_eq!(outcome, RunOutcome::Exhausted { attempts: 3 });
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_elapses_between_attempts_only() {
        // Goal reached on attempt 3 of 3: two delay intervals, not three.
        let calls = AtomicU32::new(0);
        let done = AtomicBool::new(false);
        let (calls_ref, done_ref) = (&calls, &done);

        let started = tokio::time::Instant::now();
        let outcome = run_bounded(
            "test",
            policy(3, 2),
            move || async move { done_ref.load(Ordering::SeqCst) },
            move || async move {
                let attempt = calls_ref.fetch_add(1, Ordering::SeqCst) + 1;
                if attempt == 3 {
                    done_ref.store(true, Ordering::SeqCst);
                    Ok(())
                } else {
                    Err(AppError::Internal("not yet".to_string()))
                }
            },
        )
        .await;

        assert_eq!(outcome, RunOutcome::Satisfied { attempts: 3 });
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(started.elapsed(), Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_delay_after_final_attempt() {
        let started = tokio::time::Instant::now();
        let outcome = run_bounded(
            "test",
            policy(2, 2),
            move || async move { false },
            move || async move { Err(AppError::Internal("boom".to_string())) },
        )
        .await;

        assert_eq!(outcome, RunOutcome::Exhausted { attempts: 2 });
        // One delay between the two attempts, none after the last.
        assert_eq!(started.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_goal_reached_by_side_effect_of_erroring_task() {
        // The final re-check can observe a goal met even though the task
        // reported an error.
        let done = AtomicBool::new(false);
        let done_ref = &done;

        let outcome = run_bounded(
            "test",
            policy(2, 0),
            move || async move { done_ref.load(Ordering::SeqCst) },
            move || async move {
                done_ref.store(true, Ordering::SeqCst);
                Err(AppError::Internal("partial".to_string()))
            },
        )
        .await;

        assert_eq!(outcome, RunOutcome::Satisfied { attempts: 1 });
    }
}
