// ObservableMap property tests.
//
// Property 1: distinct inserts.
//  - Invariant: len() == number of inserts; iteration yields insertion order;
//    each insert reports position == previous len.
//
// Property 2: state machine against an insertion-ordered Vec model.
//  - Operations: insert, set, remove, remove_if, clear.
//  - Invariant: get(k) is the latest inserted/set value; the emitted change
//    event matches the model's expectation exactly (kind, key, values,
//    position); a failed or no-op operation emits nothing.
//  - Invariant: after removing position p, every remaining key previously
//    at q > p is now at q - 1 and every key at q < p is unchanged.
use observable_map::{ChangeEvent, MapError, ObservableMap};
use proptest::prelude::*;
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

proptest! {
    #[test]
    fn prop_distinct_inserts_keep_order(keys in proptest::collection::vec(any::<u16>(), 0..64)) {
        let mut seen = HashSet::new();
        let distinct: Vec<u16> = keys.into_iter().filter(|k| seen.insert(*k)).collect();

        let m: ObservableMap<u16, u32> = ObservableMap::new();
        for (i, k) in distinct.iter().enumerate() {
            prop_assert_eq!(m.insert(*k, i as u32), Ok(i));
        }
        prop_assert_eq!(m.len(), distinct.len());
        let order: Vec<u16> = m.iter().map(|(k, _)| k).collect();
        prop_assert_eq!(&order, &distinct);
        prop_assert_eq!(m.keys().to_vec(), distinct);
    }
}

#[derive(Clone, Debug)]
enum Op {
    Insert(u8, i32),
    Set(u8, i32),
    Remove(u8),
    RemoveIf(u8, i32),
    Clear,
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0u8..8, 0i32..4).prop_map(|(k, v)| Op::Insert(k, v)),
        4 => (0u8..8, 0i32..4).prop_map(|(k, v)| Op::Set(k, v)),
        3 => (0u8..8).prop_map(Op::Remove),
        2 => (0u8..8, 0i32..4).prop_map(|(k, v)| Op::RemoveIf(k, v)),
        1 => Just(Op::Clear),
    ]
}

fn model_pos(model: &[(u8, i32)], k: u8) -> Option<usize> {
    model.iter().position(|(mk, _)| *mk == k)
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_events(ops in proptest::collection::vec(arb_op(), 1..80)) {
        let m: ObservableMap<u8, i32> = ObservableMap::new();
        let events: Rc<RefCell<Vec<ChangeEvent<u8, i32>>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = events.clone();
        m.subscribe_changes(move |_, e| sink.borrow_mut().push(e.clone()));

        let mut model: Vec<(u8, i32)> = Vec::new();

        for op in ops {
            events.borrow_mut().clear();
            let before = model.clone();
            let expected: Option<ChangeEvent<u8, i32>> = match op {
                Op::Insert(k, v) => {
                    let res = m.insert(k, v);
                    if model_pos(&model, k).is_some() {
                        prop_assert_eq!(res, Err(MapError::DuplicateKey));
                        None
                    } else {
                        prop_assert_eq!(res, Ok(model.len()));
                        model.push((k, v));
                        Some(ChangeEvent::Add { key: k, value: v, position: model.len() - 1 })
                    }
                }
                Op::Set(k, v) => {
                    let res = m.set(k, v);
                    match model_pos(&model, k) {
                        Some(p) => {
                            let old = model[p].1;
                            prop_assert_eq!(res, Ok(Some(old)));
                            model[p].1 = v;
                            Some(ChangeEvent::Replace { key: k, old_value: old, new_value: v, position: p })
                        }
                        None => {
                            prop_assert_eq!(res, Ok(None));
                            model.push((k, v));
                            Some(ChangeEvent::Add { key: k, value: v, position: model.len() - 1 })
                        }
                    }
                }
                Op::Remove(k) => {
                    let res = m.remove(&k);
                    match model_pos(&model, k) {
                        Some(p) => {
                            prop_assert_eq!(res, Ok(true));
                            let (_, v) = model.remove(p);
                            Some(ChangeEvent::Remove { key: k, value: v, position: p })
                        }
                        None => {
                            prop_assert_eq!(res, Ok(false));
                            None
                        }
                    }
                }
                Op::RemoveIf(k, v) => {
                    let res = m.remove_if(&k, &v);
                    match model_pos(&model, k).filter(|&p| model[p].1 == v) {
                        Some(p) => {
                            prop_assert_eq!(res, Ok(true));
                            model.remove(p);
                            Some(ChangeEvent::Remove { key: k, value: v, position: p })
                        }
                        None => {
                            prop_assert_eq!(res, Ok(false));
                            None
                        }
                    }
                }
                Op::Clear => {
                    prop_assert_eq!(m.clear(), Ok(()));
                    model.clear();
                    Some(ChangeEvent::Reset)
                }
            };

            // Exactly the expected event, or none for failed/no-op calls.
            let got = events.borrow().clone();
            prop_assert_eq!(got, expected.clone().into_iter().collect::<Vec<_>>());

            // Removal compacts: positions above p drop by one, below p unchanged.
            if let Some(ChangeEvent::Remove { position: p, .. }) = expected {
                for (q, (k, _)) in before.iter().enumerate() {
                    let now = m.position_of(k);
                    if q < p {
                        prop_assert_eq!(now, Some(q));
                    } else if q > p {
                        prop_assert_eq!(now, Some(q - 1));
                    } else {
                        prop_assert_eq!(now, None);
                    }
                }
            }

            // get(k) is the latest value; order and len match the model.
            prop_assert_eq!(m.len(), model.len());
            prop_assert_eq!(&m.to_vec(), &model);
            for (k, v) in &model {
                prop_assert_eq!(m.get(k), Ok(*v));
            }
        }
    }
}
