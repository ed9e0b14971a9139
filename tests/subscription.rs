// ============================================================================
// collection-signals - Subscription Lifecycle Tests
// Lazy setup, teardown on last-observer drop, batching, opt-out
// ============================================================================

use std::cell::Cell;
use std::rc::Rc;

use collection_signals::{
    batch, create_subscriber, effect, CollectionOptions, ReactiveCollection, Teardown,
};

// =============================================================================
// SUBSCRIBER LIFECYCLE
// =============================================================================

#[test]
fn setup_runs_lazily_on_first_tracked_read() {
    let setups = Rc::new(Cell::new(0));
    let setups_clone = setups.clone();

    let subscriber = create_subscriber(move |_invalidate| {
        setups_clone.set(setups_clone.get() + 1);
        Box::new(|| {}) as Teardown
    });

    // Untracked reads never install
    subscriber.subscribe();
    assert_eq!(setups.get(), 0);

    let sub = subscriber.clone();
    let handle = effect(move || {
        sub.subscribe();
    });

    assert_eq!(setups.get(), 1);

    drop(handle);
}

#[test]
fn teardown_runs_once_when_last_observer_drops() {
    let teardowns = Rc::new(Cell::new(0));
    let teardowns_clone = teardowns.clone();

    let subscriber = create_subscriber(move |_invalidate| {
        let teardowns = teardowns_clone.clone();
        Box::new(move || teardowns.set(teardowns.get() + 1)) as Teardown
    });

    let sub_a = subscriber.clone();
    let first = effect(move || sub_a.subscribe());

    let sub_b = subscriber.clone();
    let second = effect(move || sub_b.subscribe());

    assert!(subscriber.is_active());

    drop(first);
    assert_eq!(teardowns.get(), 0, "one observer still subscribed");

    drop(second);
    assert_eq!(teardowns.get(), 1);
    assert!(!subscriber.is_active());
}

#[test]
fn setup_reinstalls_after_full_teardown() {
    let setups = Rc::new(Cell::new(0));
    let setups_clone = setups.clone();

    let subscriber = create_subscriber(move |_invalidate| {
        setups_clone.set(setups_clone.get() + 1);
        Box::new(|| {}) as Teardown
    });

    let sub = subscriber.clone();
    let first = effect(move || sub.subscribe());
    drop(first);

    let sub = subscriber.clone();
    let second = effect(move || sub.subscribe());

    assert_eq!(setups.get(), 2);
    drop(second);
}

#[test]
fn invalidate_reruns_subscribed_effects() {
    let captured: Rc<std::cell::RefCell<Option<collection_signals::Invalidate>>> =
        Rc::new(std::cell::RefCell::new(None));
    let captured_clone = captured.clone();

    let subscriber = create_subscriber(move |invalidate| {
        *captured_clone.borrow_mut() = Some(invalidate);
        Box::new(|| {}) as Teardown
    });

    let runs = Rc::new(Cell::new(0));
    let runs_clone = runs.clone();
    let sub = subscriber.clone();

    let handle = effect(move || {
        sub.subscribe();
        runs_clone.set(runs_clone.get() + 1);
    });

    assert_eq!(runs.get(), 1);

    if let Some(invalidate) = captured.borrow().as_ref() {
        invalidate.invalidate();
    }

    assert_eq!(runs.get(), 2);
    drop(handle);
}

// =============================================================================
// COLLECTION REACTIVITY
// =============================================================================

#[test]
fn effect_reruns_on_collection_mutation() {
    let items: ReactiveCollection<i32> = ReactiveCollection::new();
    let runs = Rc::new(Cell::new(0));
    let observed_len = Rc::new(Cell::new(0));

    let items_clone = items.clone();
    let runs_clone = runs.clone();
    let observed_clone = observed_len.clone();

    let handle = effect(move || {
        runs_clone.set(runs_clone.get() + 1);
        observed_clone.set(items_clone.len());
    });

    assert_eq!(runs.get(), 1);
    assert_eq!(observed_len.get(), 0);

    let element = items.add(10);
    assert_eq!(runs.get(), 2);
    assert_eq!(observed_len.get(), 1);

    items.remove(&element);
    assert_eq!(runs.get(), 3);
    assert_eq!(observed_len.get(), 0);

    drop(handle);
}

#[test]
fn mutations_after_observer_drop_do_not_rerun() {
    let items: ReactiveCollection<i32> = ReactiveCollection::new();
    let runs = Rc::new(Cell::new(0));

    let items_clone = items.clone();
    let runs_clone = runs.clone();
    let handle = effect(move || {
        runs_clone.set(runs_clone.get() + 1);
        let _ = items_clone.len();
    });

    assert_eq!(runs.get(), 1);
    drop(handle);

    items.add(1);
    items.add(2);

    assert_eq!(runs.get(), 1);
    // Plain reads still see the data
    assert_eq!(items.len(), 2);
}

#[test]
fn bulk_operations_invalidate_observers() {
    let items = ReactiveCollection::from_items([1, 2, 3]);
    let observed_len = Rc::new(Cell::new(usize::MAX));

    let items_clone = items.clone();
    let observed_clone = observed_len.clone();
    let handle = effect(move || {
        observed_clone.set(items_clone.len());
    });

    assert_eq!(observed_len.get(), 3);

    items.clear();
    assert_eq!(observed_len.get(), 0);

    items.extend([7, 8]);
    assert_eq!(observed_len.get(), 2);

    items.replace_all([1]);
    assert_eq!(observed_len.get(), 1);

    drop(handle);
}

#[test]
fn batch_coalesces_effect_runs() {
    let items: ReactiveCollection<i32> = ReactiveCollection::new();
    let runs = Rc::new(Cell::new(0));

    let items_clone = items.clone();
    let runs_clone = runs.clone();
    let handle = effect(move || {
        runs_clone.set(runs_clone.get() + 1);
        let _ = items_clone.len();
    });

    assert_eq!(runs.get(), 1);

    batch(|| {
        items.add(1);
        items.add(2);
        items.add(3);
    });

    assert_eq!(runs.get(), 2, "three adds inside a batch run the effect once");
    assert_eq!(items.len(), 3);

    drop(handle);
}

#[test]
fn non_reactive_collection_never_invalidates() {
    let items: ReactiveCollection<i32> = ReactiveCollection::with_options(CollectionOptions {
        reactive: false,
        ..Default::default()
    });

    let runs = Rc::new(Cell::new(0));
    let items_clone = items.clone();
    let runs_clone = runs.clone();

    let handle = effect(move || {
        runs_clone.set(runs_clone.get() + 1);
        let _ = items_clone.len();
    });

    assert_eq!(runs.get(), 1);

    items.add(1);
    items.clear();

    assert_eq!(runs.get(), 1);
    drop(handle);
}

#[test]
fn two_effects_track_same_collection_independently() {
    let items: ReactiveCollection<i32> = ReactiveCollection::new();

    let len_runs = Rc::new(Cell::new(0));
    let items_clone = items.clone();
    let len_runs_clone = len_runs.clone();
    let len_effect = effect(move || {
        len_runs_clone.set(len_runs_clone.get() + 1);
        let _ = items_clone.len();
    });

    let array_runs = Rc::new(Cell::new(0));
    let items_clone = items.clone();
    let array_runs_clone = array_runs.clone();
    let array_effect = effect(move || {
        array_runs_clone.set(array_runs_clone.get() + 1);
        let _ = items_clone.array();
    });

    items.add(1);
    assert_eq!(len_runs.get(), 2);
    assert_eq!(array_runs.get(), 2);

    drop(len_effect);

    items.add(2);
    assert_eq!(len_runs.get(), 2);
    assert_eq!(array_runs.get(), 3);

    drop(array_effect);
}
