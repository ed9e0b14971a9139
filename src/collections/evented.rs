// ============================================================================
// collection-signals - Evented Collection
// Ordered collection with add/remove listener registration
// ============================================================================
//
// This is the non-reactive base layer: an insertion-ordered list of shared
// elements that notifies registered listeners after each mutation. Reactivity
// and interaction forwarding are layered on top of it.
// ============================================================================

use std::cell::{Cell, RefCell};
use std::rc::Rc;

// =============================================================================
// EVENTS
// =============================================================================

/// The kind of mutation a collection event describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionEventKind {
    Add,
    Remove,
}

/// A single mutation, delivered to listeners after the mutation applied.
#[derive(Clone)]
pub struct CollectionEvent<T> {
    /// Whether the element was added or removed
    pub kind: CollectionEventKind,

    /// The element involved
    pub element: Rc<T>,

    /// Collection length after the mutation
    pub length: usize,
}

/// Opaque key identifying a registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerKey(u64);

type Listener<T> = Rc<dyn Fn(&CollectionEvent<T>)>;

struct ListenerEntry<T> {
    key: ListenerKey,
    kind: CollectionEventKind,
    listener: Listener<T>,
}

// =============================================================================
// EVENTED COLLECTION
// =============================================================================

/// Insertion-ordered collection of shared elements with mutation events.
///
/// Elements are held as `Rc<T>` and compared by pointer identity, so the same
/// value may appear twice as two distinct allocations. All methods take
/// `&self`; interior mutability keeps the API usable from listener closures.
pub struct EventedCollection<T> {
    items: RefCell<Vec<Rc<T>>>,
    listeners: RefCell<Vec<ListenerEntry<T>>>,
    next_key: Cell<u64>,
}

impl<T> EventedCollection<T> {
    pub fn new() -> Self {
        Self {
            items: RefCell::new(Vec::new()),
            listeners: RefCell::new(Vec::new()),
            next_key: Cell::new(0),
        }
    }

    pub fn from_items(items: impl IntoIterator<Item = T>) -> Self {
        let collection = Self::new();
        {
            let mut vec = collection.items.borrow_mut();
            vec.extend(items.into_iter().map(Rc::new));
        }
        collection
    }

    // =========================================================================
    // MUTATION
    // =========================================================================

    /// Append an element and emit an Add event.
    pub fn push(&self, element: Rc<T>) {
        let length = {
            let mut items = self.items.borrow_mut();
            items.push(element.clone());
            items.len()
        };
        self.emit(CollectionEventKind::Add, element, length);
    }

    /// Insert an element at the given position and emit an Add event.
    ///
    /// # Panics
    /// Panics if `index > len`.
    pub fn insert_at(&self, index: usize, element: Rc<T>) {
        let length = {
            let mut items = self.items.borrow_mut();
            items.insert(index, element.clone());
            items.len()
        };
        self.emit(CollectionEventKind::Add, element, length);
    }

    /// Remove the first occurrence of an element (by pointer identity) and
    /// emit a Remove event. Silently does nothing when absent.
    ///
    /// Returns the removed element.
    pub fn remove(&self, element: &Rc<T>) -> Option<Rc<T>> {
        let removed = {
            let mut items = self.items.borrow_mut();
            let pos = items.iter().position(|item| Rc::ptr_eq(item, element));
            pos.map(|i| (items.remove(i), items.len()))
        };

        match removed {
            Some((element, length)) => {
                self.emit(CollectionEventKind::Remove, element.clone(), length);
                Some(element)
            }
            None => None,
        }
    }

    /// Remove the element at the given position and emit a Remove event.
    ///
    /// Returns `None` when the index is out of bounds.
    pub fn remove_at(&self, index: usize) -> Option<Rc<T>> {
        let removed = {
            let mut items = self.items.borrow_mut();
            if index < items.len() {
                let element = items.remove(index);
                Some((element, items.len()))
            } else {
                None
            }
        };

        match removed {
            Some((element, length)) => {
                self.emit(CollectionEventKind::Remove, element.clone(), length);
                Some(element)
            }
            None => None,
        }
    }

    /// Remove every element, emitting one Remove event per element in
    /// removal order (last to first).
    ///
    /// Returns the removed elements in their former collection order.
    pub fn clear(&self) -> Vec<Rc<T>> {
        let snapshot = self.items.borrow().clone();

        // Pop from the back so each event's length is consistent
        for _ in 0..snapshot.len() {
            let removed = {
                let mut items = self.items.borrow_mut();
                items.pop().map(|element| (element, items.len()))
            };
            if let Some((element, length)) = removed {
                self.emit(CollectionEventKind::Remove, element, length);
            }
        }

        snapshot
    }

    /// Append all elements, emitting one Add event per element.
    pub fn extend(&self, elements: impl IntoIterator<Item = Rc<T>>) {
        for element in elements {
            self.push(element);
        }
    }

    // =========================================================================
    // ACCESS
    // =========================================================================

    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }

    /// Snapshot of the elements in collection order.
    pub fn array(&self) -> Vec<Rc<T>> {
        self.items.borrow().clone()
    }

    /// The element at the given position, if any.
    pub fn item(&self, index: usize) -> Option<Rc<T>> {
        self.items.borrow().get(index).cloned()
    }

    /// Whether the element (by pointer identity) is present.
    pub fn contains(&self, element: &Rc<T>) -> bool {
        self.items
            .borrow()
            .iter()
            .any(|item| Rc::ptr_eq(item, element))
    }

    /// Visit each element in order without snapshotting.
    ///
    /// The collection must not be mutated from the callback.
    pub fn for_each(&self, mut f: impl FnMut(&Rc<T>)) {
        for item in self.items.borrow().iter() {
            f(item);
        }
    }

    // =========================================================================
    // LISTENERS
    // =========================================================================

    /// Register a listener for the given event kind. Listeners fire in
    /// registration order, after the mutation has applied.
    pub fn on(
        &self,
        kind: CollectionEventKind,
        listener: impl Fn(&CollectionEvent<T>) + 'static,
    ) -> ListenerKey {
        let key = ListenerKey(self.next_key.get());
        self.next_key.set(key.0 + 1);

        self.listeners.borrow_mut().push(ListenerEntry {
            key,
            kind,
            listener: Rc::new(listener),
        });

        key
    }

    /// Unregister a listener. Unknown keys are ignored.
    pub fn un(&self, key: ListenerKey) {
        self.listeners.borrow_mut().retain(|entry| entry.key != key);
    }

    fn emit(&self, kind: CollectionEventKind, element: Rc<T>, length: usize) {
        // Collect matching listeners first: a listener may register or
        // unregister listeners while running
        let to_call: Vec<Listener<T>> = self
            .listeners
            .borrow()
            .iter()
            .filter(|entry| entry.kind == kind)
            .map(|entry| entry.listener.clone())
            .collect();

        let event = CollectionEvent {
            kind,
            element,
            length,
        };

        for listener in to_call {
            listener(&event);
        }
    }
}

impl<T> Default for EventedCollection<T> {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_preserves_order() {
        let c = EventedCollection::new();
        c.push(Rc::new(1));
        c.push(Rc::new(2));
        c.push(Rc::new(3));

        let values: Vec<i32> = c.array().iter().map(|rc| **rc).collect();
        assert_eq!(values, vec![1, 2, 3]);
    }

    #[test]
    fn insert_at_position() {
        let c = EventedCollection::from_items([1, 3]);
        c.insert_at(1, Rc::new(2));

        let values: Vec<i32> = c.array().iter().map(|rc| **rc).collect();
        assert_eq!(values, vec![1, 2, 3]);
    }

    #[test]
    fn remove_by_identity_not_value() {
        let c = EventedCollection::new();
        let a = Rc::new(5);
        let b = Rc::new(5);
        c.push(a.clone());
        c.push(b.clone());

        // `a` and `b` carry the same value but are distinct elements
        assert!(c.remove(&a).is_some());
        assert_eq!(c.len(), 1);
        assert!(c.contains(&b));
        assert!(!c.contains(&a));
    }

    #[test]
    fn remove_absent_is_silent() {
        let c = EventedCollection::from_items([1]);
        let outsider = Rc::new(1);

        assert!(c.remove(&outsider).is_none());
        assert_eq!(c.len(), 1);
    }

    #[test]
    fn remove_at_out_of_bounds() {
        let c = EventedCollection::from_items([1, 2]);
        assert!(c.remove_at(5).is_none());
        assert_eq!(c.len(), 2);
    }

    #[test]
    fn add_events_fire_after_mutation() {
        let c: Rc<EventedCollection<i32>> = Rc::new(EventedCollection::new());
        let seen: Rc<RefCell<Vec<(i32, usize)>>> = Rc::new(RefCell::new(Vec::new()));

        let seen_clone = seen.clone();
        c.on(CollectionEventKind::Add, move |event| {
            seen_clone.borrow_mut().push((*event.element, event.length));
        });

        c.push(Rc::new(10));
        c.push(Rc::new(20));

        assert_eq!(*seen.borrow(), vec![(10, 1), (20, 2)]);
    }

    #[test]
    fn listeners_fire_in_registration_order() {
        let c: EventedCollection<i32> = EventedCollection::new();
        let order: Rc<RefCell<Vec<&'static str>>> = Rc::new(RefCell::new(Vec::new()));

        let order_a = order.clone();
        c.on(CollectionEventKind::Add, move |_| {
            order_a.borrow_mut().push("first");
        });
        let order_b = order.clone();
        c.on(CollectionEventKind::Add, move |_| {
            order_b.borrow_mut().push("second");
        });

        c.push(Rc::new(1));

        assert_eq!(*order.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn un_removes_listener() {
        let c: EventedCollection<i32> = EventedCollection::new();
        let count = Rc::new(Cell::new(0));

        let count_clone = count.clone();
        let key = c.on(CollectionEventKind::Add, move |_| {
            count_clone.set(count_clone.get() + 1);
        });

        c.push(Rc::new(1));
        c.un(key);
        c.un(key); // unknown key: ignored
        c.push(Rc::new(2));

        assert_eq!(count.get(), 1);
    }

    #[test]
    fn clear_emits_remove_per_element() {
        let c = EventedCollection::from_items([1, 2, 3]);
        let removals = Rc::new(Cell::new(0));

        let removals_clone = removals.clone();
        c.on(CollectionEventKind::Remove, move |_| {
            removals_clone.set(removals_clone.get() + 1);
        });

        let removed = c.clear();

        assert_eq!(removals.get(), 3);
        assert!(c.is_empty());
        let values: Vec<i32> = removed.iter().map(|rc| **rc).collect();
        assert_eq!(values, vec![1, 2, 3]);
    }

    #[test]
    fn listener_can_unregister_during_event() {
        let c: Rc<EventedCollection<i32>> = Rc::new(EventedCollection::new());

        let key_slot: Rc<RefCell<Option<ListenerKey>>> = Rc::new(RefCell::new(None));
        let c_clone = c.clone();
        let key_slot_clone = key_slot.clone();

        let key = c.on(CollectionEventKind::Add, move |_| {
            if let Some(key) = key_slot_clone.borrow_mut().take() {
                c_clone.un(key);
            }
        });
        *key_slot.borrow_mut() = Some(key);

        // Must not panic on re-entrant listener mutation
        c.push(Rc::new(1));
        c.push(Rc::new(2));
    }
}
