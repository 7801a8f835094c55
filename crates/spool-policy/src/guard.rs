use std::time::Instant;

use tracing::warn;

use spool_core::errors::SpoolResult;

/// How an over-budget but *successful* operation is treated.
///
/// This runtime is cooperative: a busy computation cannot be preempted
/// at the budget boundary, so the check happens after the fact.
/// `Strict` discards the late result in favor of the fallback, keeping
/// per-turn timing deterministic. `Advisory` keeps the late result but
/// reports the violation through `GuardOutcome::over_budget`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetMode {
    Strict,
    Advisory,
}

/// Result of a guarded call. Always carries a usable value, either the
/// operation's or the fallback's, never the original error.
#[derive(Debug)]
pub struct GuardOutcome<T> {
    pub value: T,
    /// Measured duration of the primary operation.
    pub elapsed_ms: f64,
    /// Whether the fallback's value is being returned.
    pub fell_back: bool,
    /// Whether the primary operation ran past the budget (set even in
    /// `Advisory` mode, where its value is still used).
    pub over_budget: bool,
}

/// Run `op` under a wall-clock budget, substituting `fallback` when it
/// errors or (in `Strict` mode) overruns.
pub fn guarded_call<T>(
    budget_ms: u64,
    mode: BudgetMode,
    op: impl FnOnce() -> SpoolResult<T>,
    fallback: impl FnOnce() -> T,
) -> GuardOutcome<T> {
    let started = Instant::now();
    let result = op();
    let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
    let over_budget = elapsed_ms > budget_ms as f64;

    match result {
        Ok(value) if !over_budget => GuardOutcome {
            value,
            elapsed_ms,
            fell_back: false,
            over_budget: false,
        },
        Ok(value) => match mode {
            BudgetMode::Advisory => {
                warn!(elapsed_ms, budget_ms, "guarded call exceeded budget; keeping result");
                GuardOutcome {
                    value,
                    elapsed_ms,
                    fell_back: false,
                    over_budget: true,
                }
            }
            BudgetMode::Strict => {
                warn!(elapsed_ms, budget_ms, "guarded call exceeded budget; using fallback");
                GuardOutcome {
                    value: fallback(),
                    elapsed_ms,
                    fell_back: true,
                    over_budget: true,
                }
            }
        },
        Err(error) => {
            warn!(elapsed_ms, %error, "guarded call failed; using fallback");
            GuardOutcome {
                value: fallback(),
                elapsed_ms,
                fell_back: true,
                over_budget,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spool_core::errors::SpoolError;
    use std::time::Duration;

    #[test]
    fn fast_success_passes_through() {
        let outcome = guarded_call(1_000, BudgetMode::Strict, || Ok(7), || 0);
        assert_eq!(outcome.value, 7);
        assert!(!outcome.fell_back);
        assert!(!outcome.over_budget);
    }

    #[test]
    fn error_triggers_fallback() {
        let outcome = guarded_call(
            1_000,
            BudgetMode::Strict,
            || Err::<i32, _>(SpoolError::EmptyBuffer),
            || 42,
        );
        assert_eq!(outcome.value, 42);
        assert!(outcome.fell_back);
    }

    #[test]
    fn zero_budget_always_trips_strict() {
        let outcome = guarded_call(0, BudgetMode::Strict, || Ok(7), || 42);
        assert_eq!(outcome.value, 42);
        assert!(outcome.fell_back);
        assert!(outcome.over_budget);
    }

    #[test]
    fn advisory_keeps_slow_result_but_reports() {
        let outcome = guarded_call(
            1,
            BudgetMode::Advisory,
            || {
                std::thread::sleep(Duration::from_millis(10));
                Ok(7)
            },
            || 42,
        );
        assert_eq!(outcome.value, 7);
        assert!(!outcome.fell_back);
        assert!(outcome.over_budget);
    }

    #[test]
    fn strict_discards_slow_result() {
        let outcome = guarded_call(
            1,
            BudgetMode::Strict,
            || {
                std::thread::sleep(Duration::from_millis(10));
                Ok(7)
            },
            || 42,
        );
        assert_eq!(outcome.value, 42);
        assert!(outcome.fell_back);
        assert!(outcome.over_budget);
    }
}
