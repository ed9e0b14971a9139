// ============================================================================
// collection-signals - Constants
// Flag constants for nodes in the reactive graph
// ============================================================================

// =============================================================================
// NODE TYPE FLAGS
// =============================================================================

/// Source node (reactive value, e.g. a subscriber's version counter)
pub const SOURCE: u32 = 1 << 0;

/// Effect node (observer that re-runs when dependencies change)
pub const EFFECT: u32 = 1 << 1;

// =============================================================================
// NODE STATE FLAGS
// =============================================================================

/// Node is clean (up-to-date)
pub const CLEAN: u32 = 1 << 10;

/// Node is dirty (needs to re-run)
pub const DIRTY: u32 = 1 << 11;

/// Reaction is currently executing its update
pub const REACTION_IS_UPDATING: u32 = 1 << 13;

/// Effect has been destroyed
pub const DESTROYED: u32 = 1 << 14;

// =============================================================================
// STATUS MASK (for clearing status bits)
// =============================================================================

/// Mask to clear the status bits (CLEAN, DIRTY)
pub const STATUS_MASK: u32 = !(DIRTY | CLEAN);

// =============================================================================
// TESTS
// =============================================================================
