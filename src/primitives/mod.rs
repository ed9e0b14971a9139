// ============================================================================
// collection-signals - Primitives Module
// User-facing reactive building blocks
// ============================================================================

pub mod effect;

pub use effect::{effect, effect_with_cleanup, CleanupFn, Effect, EffectFn};
