// ============================================================================
// collection-signals - Batching & Untracking
// Group writes into a single flush, or read without creating dependencies
// ============================================================================

use crate::core::context::with_context;
use crate::reactivity::tracking::flush_pending_effects;

// =============================================================================
// BATCH GUARD
// =============================================================================

/// RAII guard that exits the batch on drop and flushes at depth zero.
///
/// Drop-based so that an early return or panic inside the batch closure still
/// closes the batch.
struct BatchGuard;

impl Drop for BatchGuard {
    fn drop(&mut self) {
        let depth = with_context(|ctx| ctx.exit_batch());

        if depth == 0 {
            flush_pending_effects();
        }
    }
}

// =============================================================================
// BATCH
// =============================================================================

/// Batch multiple writes into a single flush.
///
/// Effects dirtied inside the closure run once, after the outermost batch
/// exits. Batches nest: only the outermost exit flushes.
///
/// # Example
/// ```
/// use collection_signals::{batch, ReactiveCollection};
///
/// let items: ReactiveCollection<String> = ReactiveCollection::new();
/// batch(|| {
///     items.add("a".to_owned());
///     items.add("b".to_owned());
/// });
/// ```
pub fn batch<R>(f: impl FnOnce() -> R) -> R {
    with_context(|ctx| ctx.enter_batch());
    let _guard = BatchGuard;
    f()
}

// =============================================================================
// UNTRACK
// =============================================================================

/// RAII guard that restores the previous untracking state on drop.
struct UntrackGuard {
    previous: bool,
}

impl Drop for UntrackGuard {
    fn drop(&mut self) {
        with_context(|ctx| ctx.set_untracking(self.previous));
    }
}

/// Read reactive values without creating dependencies.
///
/// Useful inside an effect when a value should be read once without
/// re-running the effect when it later changes.
pub fn untrack<R>(f: impl FnOnce() -> R) -> R {
    let previous = with_context(|ctx| ctx.set_untracking(true));
    let _guard = UntrackGuard { previous };
    f()
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::context::{is_batching, is_untracking};

    #[test]
    fn batch_enters_and_exits() {
        assert!(!is_batching());

        batch(|| {
            assert!(is_batching());

            batch(|| {
                assert!(is_batching());
            });

            assert!(is_batching());
        });

        assert!(!is_batching());
    }

    #[test]
    fn batch_returns_value() {
        let result = batch(|| 42);
        assert_eq!(result, 42);
    }

    #[test]
    fn untrack_sets_and_restores() {
        assert!(!is_untracking());

        untrack(|| {
            assert!(is_untracking());

            untrack(|| {
                assert!(is_untracking());
            });

            assert!(is_untracking());
        });

        assert!(!is_untracking());
    }

    #[test]
    fn untrack_returns_value() {
        let result = untrack(|| "hello");
        assert_eq!(result, "hello");
    }

    #[test]
    fn batch_exits_on_panic() {
        let result = std::panic::catch_unwind(|| {
            batch(|| {
                panic!("boom");
            })
        });

        assert!(result.is_err());
        assert!(!is_batching());
    }
}
