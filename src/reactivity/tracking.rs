// ============================================================================
// collection-signals - Dependency Tracking
// The core of the reactivity system - tracking reads and propagating writes
// ============================================================================
//
// The key Rust constraint is borrow scoping: RefCell borrows must be released
// before mutating, so this module uses the "collect-then-mutate" pattern
// throughout.
// ============================================================================

use std::rc::Rc;

use crate::core::constants::*;
use crate::core::context::with_context;
use crate::core::types::{AnyReaction, AnySource};

// =============================================================================
// TRACK READ - Register dependency when reading a source
// =============================================================================

/// Track a read of a source, registering it as a dependency if inside a
/// reaction.
///
/// Called by `Subscriber::subscribe()` after arming its version source.
pub fn track_read(source: Rc<dyn AnySource>) {
    with_context(|ctx| {
        // Only track if we're inside a reaction and not untracking
        if !ctx.has_active_reaction() || ctx.is_untracking() {
            return;
        }

        let reaction = match ctx.get_active_reaction().and_then(|w| w.upgrade()) {
            Some(r) => r,
            None => return,
        };

        if (reaction.flags() & REACTION_IS_UPDATING) != 0 {
            // Inside the reaction's update cycle: deps are collected into the
            // context and installed afterwards. Version-based deduplication
            // keeps a source from being added twice in one cycle.
            let read_version = ctx.get_read_version();

            if source.read_version() < read_version {
                source.set_read_version(read_version);
                ctx.add_new_dep(source.clone());
            }
        } else {
            // Outside an update cycle (e.g. reading after reaction setup):
            // wire the dependency directly
            reaction.add_dep(source.clone());
            source.add_reaction(Rc::downgrade(&reaction));
        }
    });
}

// =============================================================================
// NOTIFY WRITE - Called when a source's value changes
// =============================================================================

/// Notify the reactive system that a source's value has changed.
///
/// Marks dependent reactions dirty and flushes them unless a batch or an
/// outer flush is already in progress.
pub fn notify_write(source: Rc<dyn AnySource>) {
    mark_reactions(source);
}

// =============================================================================
// MARK REACTIONS - Propagate dirty state
// =============================================================================

/// Mark all reactions of a source dirty and schedule the effects among them.
///
/// # Borrow Safety
/// Reactions are collected into a temporary Vec before being mutated, so the
/// source's reactions list is never borrowed while a reaction runs.
pub fn mark_reactions(source: Rc<dyn AnySource>) {
    // Prune dropped observers first; if that empties the list, the source has
    // silently lost its last observer and its unobserved hook gets a chance
    // to run (e.g. bridge teardown after an observer leaked away).
    source.cleanup_dead_reactions();
    if source.reaction_count() == 0 {
        source.notify_unobserved();
        return;
    }

    let reactions: Vec<Rc<dyn AnyReaction>> = {
        let mut collected = Vec::new();
        source.for_each_reaction(&mut |reaction| {
            collected.push(reaction);
            true
        });
        collected
    };

    let mut effects_to_schedule: Vec<Rc<dyn AnyReaction>> = Vec::new();

    for reaction in reactions {
        let flags = reaction.flags();

        if (flags & DIRTY) == 0 {
            set_reaction_status(&*reaction, DIRTY);

            if (flags & EFFECT) != 0 {
                effects_to_schedule.push(reaction);
            }
        }
    }

    for effect in effects_to_schedule {
        schedule_effect(effect);
    }
}

/// Schedule an effect for execution.
///
/// Adds the effect to the pending queue and flushes immediately unless a
/// batch is open or a flush is already running.
fn schedule_effect(effect: Rc<dyn AnyReaction>) {
    with_context(|ctx| {
        ctx.add_pending_reaction(Rc::downgrade(&effect));
    });

    let should_flush = with_context(|ctx| !ctx.is_batching() && !ctx.is_flushing());

    if should_flush {
        flush_pending_effects();
    }
}

// =============================================================================
// FLUSH - Run pending effects
// =============================================================================

/// Maximum flush iterations before we consider it an infinite loop
const MAX_FLUSH_COUNT: u32 = 1000;

/// Flush all pending effects.
///
/// Runs until the pending queue stays empty. Effects that keep re-dirtying
/// themselves trip the loop breaker.
pub(crate) fn flush_pending_effects() {
    let was_flushing = with_context(|ctx| {
        let was = ctx.is_flushing();
        ctx.set_flushing(true);
        was
    });

    let mut iterations = 0u32;

    loop {
        iterations += 1;
        if iterations > MAX_FLUSH_COUNT {
            with_context(|ctx| ctx.set_flushing(was_flushing));
            panic!(
                "Maximum update depth exceeded. This can happen when an effect \
                 continuously triggers itself."
            );
        }

        let pending = with_context(|ctx| ctx.take_pending_reactions());

        if pending.is_empty() {
            break;
        }

        for reaction_weak in pending {
            if let Some(reaction) = reaction_weak.upgrade() {
                let flags = reaction.flags();

                if (flags & DESTROYED) != 0 {
                    continue;
                }

                if is_dirty(&*reaction) && (flags & EFFECT) != 0 {
                    reaction.update();
                }
            }
        }
    }

    with_context(|ctx| ctx.set_flushing(was_flushing));
}

// =============================================================================
// STATUS HELPERS
// =============================================================================

/// Set the status flags of a reaction (CLEAN, DIRTY).
pub fn set_reaction_status(target: &dyn AnyReaction, status: u32) {
    let new_flags = (target.flags() & STATUS_MASK) | status;
    target.set_flags(new_flags);
}

/// Check if a reaction is dirty and needs to be updated.
pub fn is_dirty(reaction: &dyn AnyReaction) -> bool {
    (reaction.flags() & DIRTY) != 0
}

// =============================================================================
// REMOVE REACTIONS - Clean up stale dependencies
// =============================================================================

/// Remove a reaction from its dependencies, starting at the given index.
///
/// Called when a reaction re-runs (to drop deps it no longer reads) and when
/// it is destroyed. Returns the sources whose observer list transitioned to
/// empty, WITHOUT firing their unobserved hooks: during a re-run the reaction
/// may immediately re-install some of those deps, and firing mid-swap would
/// tear down a subscription that is still live. The caller fires the hooks
/// once the new dependency set is in place.
///
/// # Borrow Safety
/// Deps are collected before each dep's reactions list is mutated.
pub fn remove_reactions(reaction: Rc<dyn AnyReaction>, start: usize) -> Vec<Rc<dyn AnySource>> {
    let deps_to_remove: Vec<Rc<dyn AnySource>> = {
        let mut collected = Vec::new();
        let mut idx = 0;
        reaction.for_each_dep(&mut |dep| {
            if idx >= start {
                collected.push(dep.clone());
            }
            idx += 1;
            true
        });
        collected
    };

    let mut emptied = Vec::new();
    for dep in deps_to_remove {
        if dep.remove_reaction(&reaction) {
            emptied.push(dep);
        }
    }

    reaction.remove_deps_from(start);

    emptied
}

/// Fire the unobserved hooks of sources that are still observer-less.
///
/// The re-check matters: the caller may have re-installed a dependency on a
/// source reported by `remove_reactions` in between.
pub fn notify_emptied_sources(emptied: Vec<Rc<dyn AnySource>>) {
    for source in emptied {
        if source.reaction_count() == 0 {
            source.notify_unobserved();
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
