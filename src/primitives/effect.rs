// ============================================================================
// collection-signals - Effect
// Side-effect observers that re-run when their dependencies change
// ============================================================================

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::core::constants::*;
use crate::core::context::with_context;
use crate::core::types::{AnyReaction, AnySource};
use crate::reactivity::tracking::{notify_emptied_sources, remove_reactions};

// =============================================================================
// TYPES
// =============================================================================

/// Cleanup function returned by an effect run, executed before the next run
/// and on destroy
pub type CleanupFn = Box<dyn FnOnce()>;

/// The effect body. May return a cleanup to run before the next execution.
pub type EffectFn = Box<dyn FnMut() -> Option<CleanupFn>>;

// =============================================================================
// EFFECT INNER
// =============================================================================

/// Internal state of an effect.
pub struct EffectInner {
    /// Flags bitmask (EFFECT + status)
    flags: Cell<u32>,

    /// The effect body; dropped on destroy to release captures
    func: RefCell<Option<EffectFn>>,

    /// Sources this effect currently depends on
    deps: RefCell<Vec<Rc<dyn AnySource>>>,

    /// Cleanup from the previous run
    cleanup: RefCell<Option<CleanupFn>>,

    /// Weak self-reference so the trait-object update can reach the Rc
    self_weak: RefCell<Weak<EffectInner>>,
}

impl AnyReaction for EffectInner {
    fn flags(&self) -> u32 {
        self.flags.get()
    }

    fn set_flags(&self, flags: u32) {
        self.flags.set(flags);
    }

    fn dep_count(&self) -> usize {
        self.deps.borrow().len()
    }

    fn add_dep(&self, source: Rc<dyn AnySource>) {
        self.deps.borrow_mut().push(source);
    }

    fn clear_deps(&self) {
        self.deps.borrow_mut().clear();
    }

    fn remove_deps_from(&self, start: usize) {
        self.deps.borrow_mut().truncate(start);
    }

    fn for_each_dep(&self, f: &mut dyn FnMut(&Rc<dyn AnySource>) -> bool) {
        for dep in self.deps.borrow().iter() {
            if !f(dep) {
                break;
            }
        }
    }

    fn update(&self) -> bool {
        if let Some(rc) = self.self_weak.borrow().upgrade() {
            update_effect(&rc);
        }
        false
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// =============================================================================
// EFFECT HANDLE
// =============================================================================

/// Handle to a running effect.
///
/// The effect runs as long as a handle is alive; dropping the last handle
/// destroys it (runs the pending cleanup and detaches from all sources).
pub struct Effect {
    inner: Rc<EffectInner>,
}

impl Effect {
    /// Destroy the effect now, regardless of other handles.
    pub fn dispose(&self) {
        destroy_effect(&self.inner);
    }

    /// Whether this effect has been destroyed.
    pub fn is_disposed(&self) -> bool {
        self.inner.is_destroyed()
    }
}

impl Clone for Effect {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl Drop for Effect {
    fn drop(&mut self) {
        // Sources hold only weak refs, so the last handle owns the effect
        if Rc::strong_count(&self.inner) == 1 {
            destroy_effect(&self.inner);
        }
    }
}

// =============================================================================
// CONSTRUCTORS
// =============================================================================

/// Create an effect that re-runs whenever a dependency changes.
///
/// Runs synchronously once on creation to establish dependencies.
///
/// # Example
/// ```
/// use collection_signals::{effect, ReactiveCollection};
///
/// let items: ReactiveCollection<i32> = ReactiveCollection::new();
/// let items2 = items.clone();
/// let handle = effect(move || {
///     tracing::debug!(len = items2.len(), "collection changed");
/// });
/// items.add(1);
/// drop(handle);
/// ```
pub fn effect(mut f: impl FnMut() + 'static) -> Effect {
    make_effect(Box::new(move || {
        f();
        None
    }))
}

/// Like [`effect`], but each run returns a cleanup executed before the next
/// run and when the effect is destroyed.
pub fn effect_with_cleanup(mut f: impl FnMut() -> CleanupFn + 'static) -> Effect {
    make_effect(Box::new(move || Some(f())))
}

fn make_effect(func: EffectFn) -> Effect {
    let inner = Rc::new(EffectInner {
        flags: Cell::new(EFFECT | DIRTY),
        func: RefCell::new(Some(func)),
        deps: RefCell::new(Vec::new()),
        cleanup: RefCell::new(None),
        self_weak: RefCell::new(Weak::new()),
    });

    *inner.self_weak.borrow_mut() = Rc::downgrade(&inner);

    update_effect(&inner);

    Effect { inner }
}

// =============================================================================
// UPDATE
// =============================================================================

/// Execute an effect and rebuild its dependency list.
fn update_effect(inner: &Rc<EffectInner>) {
    if inner.is_destroyed() {
        return;
    }

    // Re-entrant update (an effect writing a source it reads) would deadlock
    // on the body's RefCell
    if (inner.flags() & REACTION_IS_UPDATING) != 0 {
        return;
    }

    // Cleanup from the previous run goes first
    if let Some(cleanup) = inner.cleanup.borrow_mut().take() {
        cleanup();
    }

    inner.set_flags((inner.flags() & STATUS_MASK) | CLEAN | REACTION_IS_UPDATING);

    let reaction: Rc<dyn AnyReaction> = inner.clone();

    let (prev_reaction, prev_new_deps) = with_context(|ctx| {
        ctx.increment_read_version();
        let prev_reaction = ctx.set_active_reaction(Some(Rc::downgrade(&reaction)));
        let prev_new_deps = ctx.swap_new_deps(Vec::new());
        (prev_reaction, prev_new_deps)
    });

    let new_cleanup = {
        let mut func_slot = inner.func.borrow_mut();
        match func_slot.as_mut() {
            Some(func) => func(),
            None => None,
        }
    };

    let new_deps = with_context(|ctx| {
        ctx.set_active_reaction(prev_reaction);
        ctx.swap_new_deps(prev_new_deps)
    });

    *inner.cleanup.borrow_mut() = new_cleanup;

    // Swap the dependency set: detach everywhere, then install what this run
    // actually read. Sources that ended up observer-less get their unobserved
    // hooks only after reinstallation, so a dep kept across runs never sees a
    // spurious teardown.
    let emptied = remove_reactions(reaction.clone(), 0);

    for dep in new_deps {
        dep.add_reaction(Rc::downgrade(&reaction));
        inner.add_dep(dep);
    }

    notify_emptied_sources(emptied);

    inner.set_flags(inner.flags() & !REACTION_IS_UPDATING);
}

// =============================================================================
// DESTROY
// =============================================================================

/// Destroy an effect: run its cleanup, detach from sources, drop the body.
fn destroy_effect(inner: &Rc<EffectInner>) {
    if inner.is_destroyed() {
        return;
    }
    inner.set_flags(inner.flags() | DESTROYED);

    if let Some(cleanup) = inner.cleanup.borrow_mut().take() {
        cleanup();
    }

    let reaction: Rc<dyn AnyReaction> = inner.clone();
    let emptied = remove_reactions(reaction, 0);
    notify_emptied_sources(emptied);

    // Release captured state
    *inner.func.borrow_mut() = None;

    tracing::trace!("effect destroyed");
}

// =============================================================================
// TESTS
// =============================================================================
