// ============================================================================
// collection-signals - Reactive collections with interaction binding
// ============================================================================
//
// An ordered, evented collection that participates in fine-grained
// reactivity. Reads inside effects subscribe lazily (no listeners are wired
// while nothing observes), writes invalidate, and an optional interaction
// binding forwards mutations outward as synthetic selection events, with
// bulk operations batched into a single event.
//
// ```
// use collection_signals::{effect, ReactiveCollection};
//
// let items: ReactiveCollection<String> = ReactiveCollection::new();
//
// let items_in_effect = items.clone();
// let handle = effect(move || {
//     tracing::info!(count = items_in_effect.len(), "items changed");
// });
//
// items.add("first".to_owned()); // effect re-runs
// drop(handle);                  // listeners unwire automatically
// ```
// ============================================================================

pub mod collections;
pub mod core;
pub mod primitives;
pub mod reactivity;

// =============================================================================
// PUBLIC API
// =============================================================================

pub use collections::{
    CollectionEvent, CollectionEventKind, CollectionOptions, EntityId, EventedCollection,
    Interaction, InternalChangeGuard, Keyed, ListenerKey, ReactiveCollection, SelectEvent,
};
pub use core::constants;
pub use core::context::{is_batching, is_tracking, is_untracking, with_context, ReactiveContext};
pub use core::types::{AnyReaction, AnySource, SourceInner};
pub use primitives::{effect, effect_with_cleanup, CleanupFn, Effect};
pub use reactivity::{batch, create_subscriber, untrack, Invalidate, Subscriber, Teardown};
pub use reactivity::tracking::{notify_write, track_read};
