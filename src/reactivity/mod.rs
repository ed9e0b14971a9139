// ============================================================================
// collection-signals - Reactivity Module
// Dependency tracking, batching, and the external-source subscriber
// ============================================================================

pub mod batching;
pub mod subscriber;
pub mod tracking;

pub use batching::{batch, untrack};
pub use subscriber::{create_subscriber, Invalidate, Subscriber, Teardown};
pub use tracking::{notify_write, track_read};
