//! Recursion guard for deeply recursive walks.
//!
//! The parser, the local-scope pass, and the evaluator all recurse once
//! per level of AST nesting; pathological input (thousands of nested
//! parentheses, unbounded recursion in the interpreted program) would
//! otherwise crash the host with a real stack overflow. Each of those
//! walks acquires a [`StackGuard`] at entry; when the thread-local depth
//! exceeds the limit the guard fails with [`StackOverflowError`] instead,
//! and the error unwinds cleanly. State stays consistent because all
//! mutations commit only after recursive calls return.
//!
//! The guard is a depth counter rather than a stack-bottom probe, so it
//! behaves identically on every platform and on any host thread.

use std::cell::Cell;

use thiserror::Error;

/// Default maximum nesting depth shared by all guarded walks.
pub const DEFAULT_RECURSION_LIMIT: u32 = 512;

thread_local! {
    static DEPTH: Cell<u32> = const { Cell::new(0) };
    static LIMIT: Cell<u32> = const { Cell::new(DEFAULT_RECURSION_LIMIT) };
}

/// Raised when a guarded walk nests deeper than the configured limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("stack overflow: recursion limit exceeded")]
pub struct StackOverflowError;

/// RAII token holding one level of guarded recursion depth.
///
/// # Examples
///
/// ```
/// use mirac_util::stack::StackGuard;
///
/// fn walk(n: u32) -> Result<u32, mirac_util::stack::StackOverflowError> {
///     let _guard = StackGuard::enter()?;
///     if n == 0 { Ok(0) } else { walk(n - 1) }
/// }
///
/// assert!(walk(100).is_ok());
/// ```
#[must_use = "the guard releases its depth when dropped"]
pub struct StackGuard {
    _private: (),
}

impl StackGuard {
    /// Acquire one level of depth, failing once the limit is exceeded.
    pub fn enter() -> Result<Self, StackOverflowError> {
        DEPTH.with(|depth| {
            let next = depth.get() + 1;
            if next > LIMIT.with(Cell::get) {
                Err(StackOverflowError)
            } else {
                depth.set(next);
                Ok(StackGuard { _private: () })
            }
        })
    }
}

impl Drop for StackGuard {
    fn drop(&mut self) {
        DEPTH.with(|depth| depth.set(depth.get() - 1));
    }
}

/// Override the recursion limit for the current thread.
pub fn set_recursion_limit(limit: u32) {
    LIMIT.with(|l| l.set(limit));
}

/// Current guarded depth on this thread.
pub fn recursion_depth() -> u32 {
    DEPTH.with(Cell::get)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nest(levels: u32) -> Result<(), StackOverflowError> {
        let _guard = StackGuard::enter()?;
        if levels > 1 {
            nest(levels - 1)?;
        }
        Ok(())
    }

    #[test]
    fn test_depth_is_released_on_drop() {
        {
            let _guard = StackGuard::enter().unwrap();
            assert_eq!(recursion_depth(), 1);
        }
        assert_eq!(recursion_depth(), 0);
    }

    #[test]
    fn test_nesting_under_limit_succeeds() {
        set_recursion_limit(64);
        assert!(nest(64).is_ok());
        assert_eq!(recursion_depth(), 0);
        set_recursion_limit(DEFAULT_RECURSION_LIMIT);
    }

    #[test]
    fn test_nesting_over_limit_fails() {
        set_recursion_limit(16);
        assert_eq!(nest(17), Err(StackOverflowError));
        // Unwinding released every acquired level.
        assert_eq!(recursion_depth(), 0);
        set_recursion_limit(DEFAULT_RECURSION_LIMIT);
    }

    #[test]
    fn test_guard_is_reentrant_after_failure() {
        set_recursion_limit(8);
        assert!(nest(9).is_err());
        assert!(nest(8).is_ok());
        set_recursion_limit(DEFAULT_RECURSION_LIMIT);
    }
}
