// ============================================================================
// collection-signals - Interaction Binding
// Synthetic selection events bridging collections to interaction handlers
// ============================================================================

use std::rc::{Rc, Weak};

// =============================================================================
// INTERACTION
// =============================================================================

/// A selection-style interaction handler a collection can be bound to.
///
/// Registration of the handler's own listeners is the binder's business, not
/// the collection's; the collection only dispatches synthetic events here
/// when its contents change from the outside.
pub trait Interaction<T> {
    fn dispatch_event(&self, event: &SelectEvent<T>);
}

// =============================================================================
// SELECT EVENT
// =============================================================================

/// A synthetic selection event.
///
/// Mirrors the shape interaction handlers expect from a native selection:
/// which elements entered the selection, which left, and the handler the
/// event targets. Bulk collection operations produce one event carrying all
/// affected elements.
pub struct SelectEvent<T> {
    pub selected: Vec<Rc<T>>,
    pub deselected: Vec<Rc<T>>,
    target: Weak<dyn Interaction<T>>,
}

impl<T> SelectEvent<T> {
    pub fn new(
        selected: Vec<Rc<T>>,
        deselected: Vec<Rc<T>>,
        target: Weak<dyn Interaction<T>>,
    ) -> Self {
        Self {
            selected,
            deselected,
            target,
        }
    }

    /// Event type tag, always `"select"`.
    pub fn event_type(&self) -> &'static str {
        "select"
    }

    /// The interaction this event targets, if it is still alive.
    pub fn target(&self) -> Option<Rc<dyn Interaction<T>>> {
        self.target.upgrade()
    }

    /// Whether the event carries no elements at all.
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty() && self.deselected.is_empty()
    }

    /// Present for interface parity with native events; synthetic selection
    /// events have no default action to prevent.
    pub fn prevent_default(&self) {}

    /// Present for interface parity with native events; synthetic selection
    /// events do not propagate.
    pub fn stop_propagation(&self) {}
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct Recorder {
        seen: RefCell<Vec<(usize, usize)>>,
    }

    impl Interaction<i32> for Recorder {
        fn dispatch_event(&self, event: &SelectEvent<i32>) {
            self.seen
                .borrow_mut()
                .push((event.selected.len(), event.deselected.len()));
        }
    }

    #[test]
    fn event_shape() {
        let recorder: Rc<Recorder> = Rc::new(Recorder {
            seen: RefCell::new(Vec::new()),
        });
        let target: Rc<dyn Interaction<i32>> = recorder.clone();

        let event = SelectEvent::new(
            vec![Rc::new(1), Rc::new(2)],
            vec![],
            Rc::downgrade(&target),
        );

        assert_eq!(event.event_type(), "select");
        assert!(!event.is_empty());
        assert!(event.target().is_some());

        // No-ops, callable without effect
        event.prevent_default();
        event.stop_propagation();
    }

    #[test]
    fn target_is_weak() {
        let event = {
            let recorder: Rc<dyn Interaction<i32>> = Rc::new(Recorder {
                seen: RefCell::new(Vec::new()),
            });
            SelectEvent::new(vec![], vec![Rc::new(3)], Rc::downgrade(&recorder))
        };

        // Handler dropped: the event must not keep it alive
        assert!(event.target().is_none());
        assert!(!event.is_empty());
    }

    #[test]
    fn dispatch_reaches_handler() {
        let recorder = Rc::new(Recorder {
            seen: RefCell::new(Vec::new()),
        });
        let target: Rc<dyn Interaction<i32>> = recorder.clone();

        let event = SelectEvent::new(vec![Rc::new(1)], vec![Rc::new(2)], Rc::downgrade(&target));
        target.dispatch_event(&event);

        assert_eq!(*recorder.seen.borrow(), vec![(1, 1)]);
    }
}
