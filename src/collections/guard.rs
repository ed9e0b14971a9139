// ============================================================================
// collection-signals - Internal Change Guard
// Depth counter distinguishing internal mutations from external ones
// ============================================================================
//
// While the depth is non-zero, mutations are "internal": bulk operations on
// the reactive collection use this to suppress per-element interaction
// forwarding (they dispatch one batched event instead). A counter rather
// than a flag so that nested internal scopes compose.
// ============================================================================

use std::cell::Cell;

// =============================================================================
// INTERNAL DEPTH
// =============================================================================

/// Nesting counter for internal-change scopes.
pub struct InternalDepth {
    depth: Cell<u32>,
}

impl InternalDepth {
    pub fn new() -> Self {
        Self { depth: Cell::new(0) }
    }

    /// Enter an internal-change scope.
    pub fn begin(&self) {
        self.depth.set(self.depth.get() + 1);
    }

    /// Leave an internal-change scope. Unbalanced calls clamp at zero.
    pub fn end(&self) {
        let depth = self.depth.get();
        debug_assert!(depth > 0, "unbalanced internal-change end");
        if depth == 0 {
            tracing::warn!("unbalanced internal-change end ignored");
            return;
        }
        self.depth.set(depth - 1);
    }

    /// Whether any internal-change scope is open.
    pub fn is_internal(&self) -> bool {
        self.depth.get() > 0
    }

    /// Open an RAII scope that closes itself on drop.
    pub fn scope(&self) -> InternalChangeGuard<'_> {
        self.begin();
        InternalChangeGuard { depth: self }
    }
}

impl Default for InternalDepth {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// GUARD
// =============================================================================

/// RAII guard for an internal-change scope.
///
/// Drop-based so early returns and panics inside the scope still close it.
pub struct InternalChangeGuard<'a> {
    depth: &'a InternalDepth,
}

impl Drop for InternalChangeGuard<'_> {
    fn drop(&mut self) {
        self.depth.end();
    }
}

// =============================================================================
// TESTS
// =============================================================================
