// ============================================================================
// collection-signals - Subscriber
// Lazy bridge between external event sources and the reactive graph
// ============================================================================
//
// A subscriber wraps an external, non-reactive event source (e.g. a
// collection's listener registry) behind a version counter. Reading it inside
// an effect tracks the counter; the setup closure wires real listeners the
// first time anything tracks, and the teardown runs when the last observer
// goes away. Nothing is wired while nobody is listening.
// ============================================================================

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::core::context::{is_tracking, with_context};
use crate::core::types::{AnySource, SourceInner};
use crate::reactivity::tracking::{notify_write, track_read};

// =============================================================================
// TYPES
// =============================================================================

/// Cleanup returned by a subscriber's setup closure.
pub type Teardown = Box<dyn FnOnce()>;

/// Handle given to the setup closure. Calling `invalidate` re-runs every
/// effect currently subscribed.
#[derive(Clone)]
pub struct Invalidate {
    version: Rc<SourceInner<u32>>,
}

impl Invalidate {
    /// Signal that the external source changed.
    pub fn invalidate(&self) {
        let next = self.version.get().wrapping_add(1);
        self.version.set(next);

        let global = with_context(|ctx| ctx.increment_write_version());
        self.version.set_write_version(global);

        notify_write(self.version.clone() as Rc<dyn AnySource>);
    }
}

// =============================================================================
// SUBSCRIBER STATE
// =============================================================================

struct SubscriberState {
    /// The version counter effects actually depend on
    version: Rc<SourceInner<u32>>,

    /// Whether setup has run and teardown is pending
    installed: Cell<bool>,

    /// Runs on first tracked read of each activation cycle
    setup: Box<dyn Fn(Invalidate) -> Teardown>,

    /// Pending teardown from the current activation
    teardown: RefCell<Option<Teardown>>,
}

impl SubscriberState {
    fn install(self: &Rc<Self>) {
        if self.installed.get() {
            return;
        }
        self.installed.set(true);

        let invalidate = Invalidate {
            version: self.version.clone(),
        };
        let teardown = (self.setup)(invalidate);
        *self.teardown.borrow_mut() = Some(teardown);

        tracing::trace!("subscriber setup installed");
    }

    /// Run the pending teardown. Idempotent: the unobserved hook may fire
    /// more than once for the same activation.
    fn uninstall(&self) {
        if !self.installed.get() {
            return;
        }
        self.installed.set(false);

        if let Some(teardown) = self.teardown.borrow_mut().take() {
            teardown();
        }

        tracing::trace!("subscriber teardown ran");
    }
}

// =============================================================================
// SUBSCRIBER
// =============================================================================

/// Cloneable handle to a lazy subscription.
///
/// Created by [`create_subscriber`]. Call [`subscribe`](Subscriber::subscribe)
/// from every read path of the value the external source backs.
#[derive(Clone)]
pub struct Subscriber {
    state: Rc<SubscriberState>,
}

impl Subscriber {
    /// Register the current reaction as a subscriber.
    ///
    /// Outside of tracking this is a no-op: untracked reads never wire
    /// listeners. Inside an effect, the first call runs the setup closure
    /// and every call tracks the version counter.
    pub fn subscribe(&self) {
        if !is_tracking() {
            return;
        }

        self.state.install();
        track_read(self.state.version.clone() as Rc<dyn AnySource>);
    }

    /// Whether the setup is currently installed (listeners wired).
    pub fn is_active(&self) -> bool {
        self.state.installed.get()
    }
}

/// Create a lazy subscription around an external event source.
///
/// `setup` receives an [`Invalidate`] handle to call whenever the external
/// source changes, and returns the teardown that unwires its listeners. Setup
/// runs on the first tracked read; teardown runs when the last subscribed
/// effect is destroyed. The cycle may repeat: a later tracked read installs
/// the setup again.
pub fn create_subscriber(setup: impl Fn(Invalidate) -> Teardown + 'static) -> Subscriber {
    let state = Rc::new(SubscriberState {
        version: Rc::new(SourceInner::new(0)),
        installed: Cell::new(false),
        setup: Box::new(setup),
        teardown: RefCell::new(None),
    });

    // Teardown fires at the moment the version counter loses its last
    // observer. Weak: the hook must not keep the state alive.
    let weak = Rc::downgrade(&state);
    state.version.set_unobserved_hook(Some(Rc::new(move || {
        if let Some(state) = weak.upgrade() {
            state.uninstall();
        }
    })));

    Subscriber { state }
}

// =============================================================================
// TESTS
// =============================================================================
