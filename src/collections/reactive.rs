// ============================================================================
// collection-signals - Reactive Collection
// Ordered evented collection with reactive reads and interaction binding
// ============================================================================
//
// Layers, bottom to top:
//   EventedCollection  ordered storage + add/remove listeners
//   Subscriber         lazy bridge from those listeners into the effect graph
//   InternalDepth      distinguishes bulk/internal mutations from external
//   Interaction        outbound synthetic selection events
//
// Reads subscribe, writes invalidate. An unobserved collection wires no
// listeners at all.
// ============================================================================

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::collections::binding::{Interaction, SelectEvent};
use crate::collections::entity::{EntityId, Keyed};
use crate::collections::evented::{CollectionEventKind, EventedCollection, ListenerKey};
use crate::collections::guard::{InternalChangeGuard, InternalDepth};
use crate::reactivity::subscriber::{create_subscriber, Subscriber, Teardown};

// =============================================================================
// OPTIONS
// =============================================================================

/// Construction options for [`ReactiveCollection`].
#[derive(Debug, Clone)]
pub struct CollectionOptions {
    /// Whether reads participate in dependency tracking. When false the
    /// collection behaves as a plain evented collection.
    pub reactive: bool,

    /// Attribute name used by id lookups (`has_id`, `get_by_id`).
    pub id_field: String,
}

impl Default for CollectionOptions {
    fn default() -> Self {
        Self {
            reactive: true,
            id_field: "id".to_owned(),
        }
    }
}

// =============================================================================
// INNER
// =============================================================================

struct BoundInteraction<T> {
    // Non-owning: the caller keeps the handler alive
    target: Weak<dyn Interaction<T>>,
    add_key: ListenerKey,
    remove_key: ListenerKey,
}

struct CollectionInner<T> {
    base: EventedCollection<T>,
    internal: InternalDepth,
    subscriber: Option<Subscriber>,
    id_field: String,
    bound: RefCell<Option<BoundInteraction<T>>>,
}

impl<T> CollectionInner<T> {
    fn track(&self) {
        if let Some(subscriber) = &self.subscriber {
            subscriber.subscribe();
        }
    }

    /// Forward a selection delta to the bound interaction.
    ///
    /// Skipped inside internal-change scopes (the bulk operation that opened
    /// the scope dispatches one batched event itself) and when nothing
    /// changed or nothing is bound.
    fn dispatch_selection(&self, selected: Vec<Rc<T>>, deselected: Vec<Rc<T>>) {
        if self.internal.is_internal() {
            return;
        }
        if selected.is_empty() && deselected.is_empty() {
            return;
        }

        // Upgrade outside the borrow so the handler may rebind during dispatch
        let target = match self.bound.borrow().as_ref() {
            Some(bound) => bound.target.clone(),
            None => return,
        };
        let target = match target.upgrade() {
            Some(target) => target,
            None => return,
        };

        tracing::debug!(
            selected = selected.len(),
            deselected = deselected.len(),
            "dispatching selection event"
        );

        let event = SelectEvent::new(selected, deselected, Rc::downgrade(&target));
        target.dispatch_event(&event);
    }
}

// =============================================================================
// REACTIVE COLLECTION
// =============================================================================

/// Ordered, observable collection of shared elements.
///
/// Cloning the handle is cheap and shares the underlying collection.
/// Elements are `Rc<T>` and identified by pointer: two allocations of equal
/// values are distinct members.
///
/// Every read method subscribes the current effect (if any); listeners on the
/// underlying storage are wired lazily on the first tracked read and unwired
/// when the last observing effect is gone.
pub struct ReactiveCollection<T: 'static> {
    inner: Rc<CollectionInner<T>>,
}

impl<T: 'static> Clone for ReactiveCollection<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: 'static> Default for ReactiveCollection<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> ReactiveCollection<T> {
    // =========================================================================
    // CONSTRUCTION
    // =========================================================================

    pub fn new() -> Self {
        Self::with_options(CollectionOptions::default())
    }

    pub fn with_options(options: CollectionOptions) -> Self {
        let inner = Rc::new_cyclic(|weak: &Weak<CollectionInner<T>>| {
            let subscriber = if options.reactive {
                Some(make_bridge(weak.clone()))
            } else {
                None
            };

            CollectionInner {
                base: EventedCollection::new(),
                internal: InternalDepth::new(),
                subscriber,
                id_field: options.id_field,
                bound: RefCell::new(None),
            }
        });

        Self { inner }
    }

    pub fn from_items(items: impl IntoIterator<Item = T>) -> Self {
        Self::from_items_with_options(items, CollectionOptions::default())
    }

    pub fn from_items_with_options(
        items: impl IntoIterator<Item = T>,
        options: CollectionOptions,
    ) -> Self {
        let collection = Self::with_options(options);
        {
            // Initial fill: no observers or bindings can exist yet
            let _scope = collection.inner.internal.scope();
            for item in items {
                collection.inner.base.push(Rc::new(item));
            }
        }
        collection
    }

    // =========================================================================
    // MUTATION
    // =========================================================================

    /// Append an element. Accepts a value or an existing `Rc<T>`; returns the
    /// shared handle under which the element is stored.
    pub fn add(&self, element: impl Into<Rc<T>>) -> Rc<T> {
        let element = element.into();
        self.inner.base.push(element.clone());
        element
    }

    /// Insert an element at a position.
    ///
    /// # Panics
    /// Panics if `index > len`.
    pub fn insert_at(&self, index: usize, element: impl Into<Rc<T>>) -> Rc<T> {
        let element = element.into();
        self.inner.base.insert_at(index, element.clone());
        element
    }

    /// Remove an element by identity. Absent elements are ignored.
    pub fn remove(&self, element: &Rc<T>) -> Option<Rc<T>> {
        self.inner.base.remove(element)
    }

    /// Remove the element at a position.
    pub fn remove_at(&self, index: usize) -> Option<Rc<T>> {
        self.inner.base.remove_at(index)
    }

    /// Remove every element.
    ///
    /// The bound interaction receives one batched deselection event instead
    /// of one per element. Returns the removed elements in order.
    pub fn clear(&self) -> Vec<Rc<T>> {
        let removed = {
            let _scope = self.inner.internal.scope();
            self.inner.base.clear()
        };
        self.inner.dispatch_selection(Vec::new(), removed.clone());
        removed
    }

    /// Append all elements, forwarding one batched selection event.
    pub fn extend(&self, items: impl IntoIterator<Item = T>) -> Vec<Rc<T>> {
        let added = {
            let _scope = self.inner.internal.scope();
            let added: Vec<Rc<T>> = items.into_iter().map(Rc::new).collect();
            self.inner.base.extend(added.iter().cloned());
            added
        };
        self.inner.dispatch_selection(added.clone(), Vec::new());
        added
    }

    /// Replace the entire contents.
    ///
    /// Forwards a single event carrying both the new elements (selected) and
    /// the old ones (deselected). Returns the new shared handles.
    pub fn replace_all(&self, items: impl IntoIterator<Item = T>) -> Vec<Rc<T>> {
        let (added, removed) = {
            let _scope = self.inner.internal.scope();
            let removed = self.inner.base.clear();
            let added: Vec<Rc<T>> = items.into_iter().map(Rc::new).collect();
            self.inner.base.extend(added.iter().cloned());
            (added, removed)
        };
        self.inner.dispatch_selection(added.clone(), removed);
        added
    }

    /// Remove the element if present, add it otherwise.
    ///
    /// Returns true when the element is present after the call.
    pub fn toggle(&self, element: &Rc<T>) -> bool {
        if self.inner.base.contains(element) {
            self.inner.base.remove(element);
            false
        } else {
            self.inner.base.push(element.clone());
            true
        }
    }

    // =========================================================================
    // READS (tracked)
    // =========================================================================

    pub fn len(&self) -> usize {
        self.inner.track();
        self.inner.base.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.track();
        self.inner.base.is_empty()
    }

    /// Snapshot of the elements in collection order.
    pub fn array(&self) -> Vec<Rc<T>> {
        self.inner.track();
        self.inner.base.array()
    }

    /// The element at the given position.
    pub fn item(&self, index: usize) -> Option<Rc<T>> {
        self.inner.track();
        self.inner.base.item(index)
    }

    /// Whether the element (by identity) is present.
    pub fn has(&self, element: &Rc<T>) -> bool {
        self.inner.track();
        self.inner.base.contains(element)
    }

    /// Visit each element in order.
    pub fn for_each(&self, f: impl FnMut(&Rc<T>)) {
        self.inner.track();
        self.inner.base.for_each(f);
    }

    // =========================================================================
    // INTERNAL CHANGE SCOPES
    // =========================================================================

    /// Open an internal-change scope: element forwarding to the bound
    /// interaction is suppressed until the guard drops.
    pub fn internal_scope(&self) -> InternalChangeGuard<'_> {
        self.inner.internal.scope()
    }

    /// Enter an internal-change scope without a guard. Prefer
    /// [`internal_scope`](Self::internal_scope); this exists for callers that
    /// cannot hold a borrow across the mutation.
    pub fn begin_internal_change(&self) {
        self.inner.internal.begin();
    }

    /// Leave an internal-change scope opened with
    /// [`begin_internal_change`](Self::begin_internal_change).
    pub fn end_internal_change(&self) {
        self.inner.internal.end();
    }

    /// Whether an internal-change scope is currently open.
    pub fn is_internal_change(&self) -> bool {
        self.inner.internal.is_internal()
    }

    // =========================================================================
    // INTERACTION BINDING
    // =========================================================================

    /// Bind an interaction handler: external single-element mutations are
    /// forwarded to it as synthetic selection events.
    ///
    /// The binding is non-owning; the caller keeps the handler alive. A
    /// previously bound handler is unbound first.
    pub fn bind_interaction(&self, target: Rc<dyn Interaction<T>>) {
        self.unbind_interaction();

        let weak = Rc::downgrade(&self.inner);
        let add_key = self.inner.base.on(CollectionEventKind::Add, move |event| {
            if let Some(inner) = weak.upgrade() {
                inner.dispatch_selection(vec![event.element.clone()], Vec::new());
            }
        });

        let weak = Rc::downgrade(&self.inner);
        let remove_key = self
            .inner
            .base
            .on(CollectionEventKind::Remove, move |event| {
                if let Some(inner) = weak.upgrade() {
                    inner.dispatch_selection(Vec::new(), vec![event.element.clone()]);
                }
            });

        tracing::debug!("interaction bound");

        *self.inner.bound.borrow_mut() = Some(BoundInteraction {
            target: Rc::downgrade(&target),
            add_key,
            remove_key,
        });
    }

    /// Unbind the current interaction handler. Idempotent.
    pub fn unbind_interaction(&self) {
        if let Some(bound) = self.inner.bound.borrow_mut().take() {
            self.inner.base.un(bound.add_key);
            self.inner.base.un(bound.remove_key);
            tracing::debug!("interaction unbound");
        }
    }

    /// Whether a live interaction handler is currently bound.
    pub fn is_bound(&self) -> bool {
        self.inner
            .bound
            .borrow()
            .as_ref()
            .is_some_and(|bound| bound.target.upgrade().is_some())
    }
}

// =============================================================================
// KEYED LOOKUPS
// =============================================================================

impl<T: Keyed + 'static> ReactiveCollection<T> {
    /// Whether any element's configured id attribute equals `id`.
    pub fn has_id(&self, id: &EntityId) -> bool {
        self.get_by_id(id).is_some()
    }

    /// The first element whose configured id attribute equals `id`.
    pub fn get_by_id(&self, id: &EntityId) -> Option<Rc<T>> {
        self.inner.track();

        let mut found = None;
        self.inner.base.for_each(|element| {
            if found.is_none()
                && element.attribute(&self.inner.id_field).as_ref() == Some(id)
            {
                found = Some(element.clone());
            }
        });
        found
    }
}

// =============================================================================
// SUBSCRIPTION BRIDGE
// =============================================================================

/// Wire the collection's listener registry into the reactive graph.
///
/// The setup registers add/remove listeners that invalidate on every
/// mutation, internal or not: reactive reads must see bulk operations too.
/// Only outbound interaction forwarding respects internal scopes.
fn make_bridge<T: 'static>(weak: Weak<CollectionInner<T>>) -> Subscriber {
    create_subscriber(move |invalidate| {
        let inner = match weak.upgrade() {
            Some(inner) => inner,
            None => return Box::new(|| {}) as Teardown,
        };

        let inv = invalidate.clone();
        let add_key = inner
            .base
            .on(CollectionEventKind::Add, move |_| inv.invalidate());

        let inv = invalidate;
        let remove_key = inner
            .base
            .on(CollectionEventKind::Remove, move |_| inv.invalidate());

        tracing::debug!("collection bridge listeners attached");

        let weak = Rc::downgrade(&inner);
        Box::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.base.un(add_key);
                inner.base.un(remove_key);
                tracing::debug!("collection bridge listeners detached");
            }
        }) as Teardown
    })
}

// =============================================================================
// TESTS
// =============================================================================
