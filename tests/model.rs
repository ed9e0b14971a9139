// ============================================================================
// collection-signals - Model Tests
// Property-based comparison against a plain Vec model
// ============================================================================

use std::rc::Rc;

use proptest::prelude::*;

use collection_signals::ReactiveCollection;

// =============================================================================
// OPERATIONS
// =============================================================================

#[derive(Debug, Clone)]
enum Op {
    Add(i32),
    InsertAt(usize, i32),
    RemoveAt(usize),
    ToggleExisting(usize),
    ToggleNew(i32),
    Clear,
    Extend(Vec<i32>),
    ReplaceAll(Vec<i32>),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        any::<i32>().prop_map(Op::Add),
        (any::<usize>(), any::<i32>()).prop_map(|(i, v)| Op::InsertAt(i, v)),
        any::<usize>().prop_map(Op::RemoveAt),
        any::<usize>().prop_map(Op::ToggleExisting),
        any::<i32>().prop_map(Op::ToggleNew),
        Just(Op::Clear),
        prop::collection::vec(any::<i32>(), 0..5).prop_map(Op::Extend),
        prop::collection::vec(any::<i32>(), 0..5).prop_map(Op::ReplaceAll),
    ]
}

fn values(collection: &ReactiveCollection<i32>) -> Vec<i32> {
    collection.array().iter().map(|rc| **rc).collect()
}

// =============================================================================
// PROPERTIES
// =============================================================================

proptest! {
    /// The collection behaves exactly like a Vec of shared elements under
    /// any sequence of operations, preserving insertion order throughout.
    #[test]
    fn matches_vec_model(ops in prop::collection::vec(op_strategy(), 0..40)) {
        let collection: ReactiveCollection<i32> = ReactiveCollection::new();
        let mut model: Vec<Rc<i32>> = Vec::new();

        for op in ops {
            match op {
                Op::Add(v) => {
                    let element = collection.add(v);
                    model.push(element);
                }
                Op::InsertAt(i, v) => {
                    let index = if model.is_empty() { 0 } else { i % (model.len() + 1) };
                    let element = collection.insert_at(index, v);
                    model.insert(index, element);
                }
                Op::RemoveAt(i) => {
                    if model.is_empty() {
                        prop_assert!(collection.remove_at(i).is_none());
                    } else {
                        let index = i % model.len();
                        let removed = collection.remove_at(index);
                        let expected = model.remove(index);
                        prop_assert!(removed.is_some());
                        prop_assert!(Rc::ptr_eq(&removed.unwrap(), &expected));
                    }
                }
                Op::ToggleExisting(i) => {
                    if !model.is_empty() {
                        let index = i % model.len();
                        let element = model[index].clone();
                        // Present before, absent after
                        prop_assert!(!collection.toggle(&element));
                        model.remove(index);
                    }
                }
                Op::ToggleNew(v) => {
                    let element = Rc::new(v);
                    // Fresh allocation: identity miss even if the value exists
                    prop_assert!(collection.toggle(&element));
                    model.push(element);
                }
                Op::Clear => {
                    let removed = collection.clear();
                    prop_assert_eq!(removed.len(), model.len());
                    model.clear();
                }
                Op::Extend(vs) => {
                    let added = collection.extend(vs);
                    model.extend(added);
                }
                Op::ReplaceAll(vs) => {
                    let added = collection.replace_all(vs);
                    model = added;
                }
            }

            // Order and membership agree after every step
            let expected: Vec<i32> = model.iter().map(|rc| **rc).collect();
            prop_assert_eq!(values(&collection), expected);
            prop_assert_eq!(collection.len(), model.len());

            for (index, element) in model.iter().enumerate() {
                prop_assert!(collection.has(element));
                let item = collection.item(index);
                prop_assert!(item.is_some());
                prop_assert!(Rc::ptr_eq(&item.unwrap(), element));
            }
        }
    }

    /// Toggling any element twice restores the previous membership.
    #[test]
    fn toggle_twice_is_identity(initial in prop::collection::vec(any::<i32>(), 0..10), v in any::<i32>()) {
        let collection = ReactiveCollection::from_items(initial);
        let before = values(&collection);

        let element = Rc::new(v);
        prop_assert!(collection.toggle(&element));
        prop_assert!(!collection.toggle(&element));

        prop_assert_eq!(values(&collection), before);
    }
}
