// ============================================================================
// collection-signals - Type Definitions
// Type-erased traits and base types for the reactive graph
// ============================================================================

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use super::constants::*;

// =============================================================================
// TYPE-ERASED TRAITS
// =============================================================================
//
// These traits enable heterogeneous storage in the reactive graph.
// Graph operations (mark dirty, track deps, remove observers) don't need to
// know the value type T, so dependency lists can hold Rc<dyn AnySource> and
// reaction lists can hold Weak<dyn AnyReaction>.
// =============================================================================

/// Type-erased source interface for reactive graph operations.
///
/// Implemented by `SourceInner<T>`. A source is something reactions can
/// depend on; here sources are the version counters behind subscribers.
pub trait AnySource: Any {
    /// Get the flags bitmask
    fn flags(&self) -> u32;

    /// Set the flags bitmask
    fn set_flags(&self, flags: u32);

    /// Get the write version (incremented when the value changes)
    fn write_version(&self) -> u32;

    /// Set the write version
    fn set_write_version(&self, version: u32);

    /// Get the read version (for dependency deduplication)
    fn read_version(&self) -> u32;

    /// Set the read version
    fn set_read_version(&self, version: u32);

    /// Get the number of reactions depending on this source
    fn reaction_count(&self) -> usize;

    /// Add a reaction that depends on this source
    fn add_reaction(&self, reaction: Weak<dyn AnyReaction>);

    /// Remove dead (dropped) reactions from the list
    fn cleanup_dead_reactions(&self);

    /// Iterate over live reactions; the callback returns false to stop.
    fn for_each_reaction(&self, f: &mut dyn FnMut(Rc<dyn AnyReaction>) -> bool);

    /// Remove a specific reaction from this source's reactions list.
    ///
    /// Returns true if the list transitioned to empty, i.e. this source just
    /// lost its last observer. Callers decide when to act on that (see
    /// `notify_unobserved`) so a transient empty state during an effect
    /// re-run does not trigger a premature teardown.
    fn remove_reaction(&self, reaction: &Rc<dyn AnyReaction>) -> bool;

    /// Run the unobserved hook if this source currently has no observers.
    ///
    /// Safe to call at any time; a no-op when observers exist or no hook is
    /// installed.
    fn notify_unobserved(&self);

    /// Check if this source is dirty
    fn is_dirty(&self) -> bool {
        self.flags() & DIRTY != 0
    }

    /// Check if this source is clean
    fn is_clean(&self) -> bool {
        self.flags() & CLEAN != 0
    }

    /// Mark as dirty (clear status bits, set DIRTY)
    fn mark_dirty(&self) {
        let flags = (self.flags() & STATUS_MASK) | DIRTY;
        self.set_flags(flags);
    }

    /// Mark as clean (clear status bits, set CLEAN)
    fn mark_clean(&self) {
        let flags = (self.flags() & STATUS_MASK) | CLEAN;
        self.set_flags(flags);
    }

    /// Upcast to Any for downcasting
    fn as_any(&self) -> &dyn Any;
}

/// Type-erased reaction interface for scheduling and updates.
///
/// Implemented by `EffectInner`. A reaction is something that is notified
/// when sources it depends on change.
pub trait AnyReaction: Any {
    /// Get the flags bitmask
    fn flags(&self) -> u32;

    /// Set the flags bitmask
    fn set_flags(&self, flags: u32);

    /// Get the number of dependencies
    fn dep_count(&self) -> usize;

    /// Add a dependency (a source this reaction reads from)
    fn add_dep(&self, source: Rc<dyn AnySource>);

    /// Clear all dependencies (before re-running to rebuild the dep list)
    fn clear_deps(&self);

    /// Remove dependencies starting from index (for cleanup)
    fn remove_deps_from(&self, start: usize);

    /// Iterate over dependencies
    fn for_each_dep(&self, f: &mut dyn FnMut(&Rc<dyn AnySource>) -> bool);

    /// Execute the reaction. Returns true if a value changed (unused for
    /// effects, kept for interface symmetry).
    fn update(&self) -> bool;

    /// Check if this is an effect
    fn is_effect(&self) -> bool {
        self.flags() & EFFECT != 0
    }

    /// Check if this reaction is dirty
    fn is_dirty(&self) -> bool {
        self.flags() & DIRTY != 0
    }

    /// Check if this reaction is clean
    fn is_clean(&self) -> bool {
        self.flags() & CLEAN != 0
    }

    /// Check if this reaction is destroyed
    fn is_destroyed(&self) -> bool {
        self.flags() & DESTROYED != 0
    }

    /// Mark as dirty
    fn mark_dirty(&self) {
        let flags = (self.flags() & STATUS_MASK) | DIRTY;
        self.set_flags(flags);
    }

    /// Mark as clean
    fn mark_clean(&self) {
        let flags = (self.flags() & STATUS_MASK) | CLEAN;
        self.set_flags(flags);
    }

    /// Upcast to Any for downcasting
    fn as_any(&self) -> &dyn Any;
}

// =============================================================================
// SOURCE INNER
// =============================================================================

/// Hook fired when a source loses its last observer.
pub type UnobservedHook = Rc<dyn Fn()>;

/// The internal data for a reactive source.
///
/// There is no equality function: the sources in this crate are monotonic
/// version counters, so every `set` is a change.
pub struct SourceInner<T> {
    /// Flags bitmask (type + status)
    flags: Cell<u32>,

    /// The current value
    value: RefCell<T>,

    /// Write version - incremented when the value changes
    write_version: Cell<u32>,

    /// Read version - for dependency deduplication during tracking
    read_version: Cell<u32>,

    /// Reactions that depend on this source (weak refs to avoid cycles)
    reactions: RefCell<Vec<Weak<dyn AnyReaction>>>,

    /// Called when the reactions list transitions to empty
    unobserved: RefCell<Option<UnobservedHook>>,
}

impl<T> SourceInner<T> {
    /// Create a new source with the given value
    pub fn new(value: T) -> Self {
        Self {
            flags: Cell::new(SOURCE | CLEAN),
            value: RefCell::new(value),
            write_version: Cell::new(0),
            read_version: Cell::new(0),
            reactions: RefCell::new(Vec::new()),
            unobserved: RefCell::new(None),
        }
    }

    /// Get the current value (cloning)
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.value.borrow().clone()
    }

    /// Access the current value with a closure (avoids clone)
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.value.borrow())
    }

    /// Set the value unconditionally and bump the local write version.
    pub fn set(&self, value: T) {
        *self.value.borrow_mut() = value;
        self.write_version.set(self.write_version.get() + 1);
    }

    /// Install the hook fired when the last observer disappears.
    ///
    /// Replaces any previous hook. The subscription bridge uses this to run
    /// its teardown at the observer-gone garbage point.
    pub fn set_unobserved_hook(&self, hook: Option<UnobservedHook>) {
        *self.unobserved.borrow_mut() = hook;
    }
}

impl<T: 'static> AnySource for SourceInner<T> {
    fn flags(&self) -> u32 {
        self.flags.get()
    }

    fn set_flags(&self, flags: u32) {
        self.flags.set(flags);
    }

    fn write_version(&self) -> u32 {
        self.write_version.get()
    }

    fn set_write_version(&self, version: u32) {
        self.write_version.set(version);
    }

    fn read_version(&self) -> u32 {
        self.read_version.get()
    }

    fn set_read_version(&self, version: u32) {
        self.read_version.set(version);
    }

    fn reaction_count(&self) -> usize {
        self.reactions.borrow().len()
    }

    fn add_reaction(&self, reaction: Weak<dyn AnyReaction>) {
        self.reactions.borrow_mut().push(reaction);
    }

    fn cleanup_dead_reactions(&self) {
        self.reactions.borrow_mut().retain(|w| w.strong_count() > 0);
    }

    fn for_each_reaction(&self, f: &mut dyn FnMut(Rc<dyn AnyReaction>) -> bool) {
        // Collect first so callbacks may re-borrow the reactions list
        let live: Vec<Rc<dyn AnyReaction>> = self
            .reactions
            .borrow()
            .iter()
            .filter_map(|w| w.upgrade())
            .collect();
        for rc in live {
            if !f(rc) {
                break;
            }
        }
    }

    fn remove_reaction(&self, reaction: &Rc<dyn AnyReaction>) -> bool {
        let reaction_ptr = Rc::as_ptr(reaction) as *const ();
        let mut reactions = self.reactions.borrow_mut();
        let was_empty = reactions.is_empty();
        reactions.retain(|weak| {
            if let Some(rc) = weak.upgrade() {
                let weak_ptr = Rc::as_ptr(&rc) as *const ();
                weak_ptr != reaction_ptr
            } else {
                // Drop dead weak references while we're at it
                false
            }
        });
        !was_empty && reactions.is_empty()
    }

    fn notify_unobserved(&self) {
        if !self.reactions.borrow().is_empty() {
            return;
        }
        // Clone out of the cell so the hook may reinstall itself
        let hook = self.unobserved.borrow().clone();
        if let Some(hook) = hook {
            hook();
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// =============================================================================
// TESTS
// =============================================================================
