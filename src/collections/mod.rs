// ============================================================================
// collection-signals - Collections Module
// Evented storage, reactive facade, and interaction binding
// ============================================================================

pub mod binding;
pub mod entity;
pub mod evented;
pub mod guard;
pub mod reactive;

pub use binding::{Interaction, SelectEvent};
pub use entity::{EntityId, Keyed};
pub use evented::{CollectionEvent, CollectionEventKind, EventedCollection, ListenerKey};
pub use guard::{InternalChangeGuard, InternalDepth};
pub use reactive::{CollectionOptions, ReactiveCollection};
