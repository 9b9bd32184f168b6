//! Property tests: random operation sequences must keep the queue's
//! structural guarantees.

use std::collections::HashSet;

use ferrum_queue::{Queue, QueueItem, TrackId};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Next,
    Prev,
    Prepend(Vec<u8>),
    Append(Vec<u8>),
    Insert(Vec<u8>, usize, bool),
    Remove(Vec<usize>),
    Move(Vec<usize>, usize, bool),
    Shuffle(bool),
    Repeat(bool),
    Prune(u8),
}

fn track(n: u8) -> TrackId {
    TrackId::new(format!("t{n}"))
}

fn op() -> impl Strategy<Value = Op> {
    let tracks = || prop::collection::vec(0u8..12, 1..4);
    prop_oneof![
        3 => Just(Op::Next),
        2 => Just(Op::Prev),
        1 => tracks().prop_map(Op::Prepend),
        1 => tracks().prop_map(Op::Append),
        1 => (tracks(), 0usize..30, any::<bool>()).prop_map(|(t, i, f)| Op::Insert(t, i, f)),
        1 => prop::collection::vec(0usize..30, 0..4).prop_map(Op::Remove),
        1 => (prop::collection::vec(0usize..30, 1..4), 0usize..30, any::<bool>())
            .prop_map(|(i, n, u)| Op::Move(i, n, u)),
        1 => any::<bool>().prop_map(Op::Shuffle),
        1 => any::<bool>().prop_map(Op::Repeat),
        1 => (0u8..12).prop_map(Op::Prune),
    ]
}

fn apply(queue: &mut Queue, op: Op) {
    let ids = |t: Vec<u8>| t.into_iter().map(track).collect::<Vec<_>>();
    match op {
        Op::Next => {
            queue.next();
        }
        Op::Prev => {
            queue.prev();
        }
        Op::Prepend(t) => {
            queue.prepend_to_user_queue(ids(t));
        }
        Op::Append(t) => {
            queue.append_to_user_queue(ids(t));
        }
        Op::Insert(t, index, force) => {
            let _ = queue.insert_ids(ids(t), index, force);
        }
        Op::Remove(indexes) => {
            let _ = queue.remove_indexes(&indexes);
        }
        Op::Move(indexes, new_index, user) => {
            let _ = queue.move_indexes(&indexes, new_index, user);
        }
        Op::Shuffle(enabled) => {
            queue.set_shuffle(enabled);
        }
        Op::Repeat(enabled) => {
            queue.set_repeat(enabled);
        }
        Op::Prune(gone) => {
            let gone = track(gone);
            queue.remove_deleted(&|id: &TrackId| *id != gone);
        }
    }
}

fn start() -> impl Strategy<Value = (Vec<u8>, usize, u64)> {
    prop::collection::vec(0u8..12, 1..10).prop_flat_map(|list| {
        let len = list.len();
        (Just(list), 0..len, any::<u64>())
    })
}

fn build(list: &[u8], start: usize, seed: u64) -> Queue {
    let mut queue = Queue::with_seed(seed);
    queue
        .set_new_queue(list.iter().copied().map(track).collect(), start)
        .expect("start is in range");
    queue
}

fn check_invariants(queue: &Queue) -> Result<(), TestCaseError> {
    let expected = queue.past().len()
        + usize::from(queue.current().is_some())
        + queue.user_queue().len()
        + queue.auto_queue().len();
    prop_assert_eq!(queue.len(), expected);
    prop_assert_eq!(queue.iter().count(), expected);

    let ids: HashSet<_> = queue.iter().map(QueueItem::id).collect();
    prop_assert_eq!(ids.len(), expected, "queue ids must be unique");

    for (index, item) in queue.iter().enumerate() {
        prop_assert_eq!(queue.get_by_flat_index(index).map(QueueItem::id), Ok(item.id()));
    }
    prop_assert!(queue.get_by_flat_index(expected).is_err());

    let stamped_outside_auto = queue
        .past()
        .iter()
        .chain(queue.current())
        .chain(queue.user_queue())
        .any(|item| item.non_shuffle_pos().is_some());
    prop_assert!(!stamped_outside_auto, "only auto queue items carry stamps");
    if !queue.shuffle() {
        prop_assert!(queue.auto_queue().iter().all(|i| i.non_shuffle_pos().is_none()));
    }
    Ok(())
}

proptest! {
    /// Property: length, id uniqueness, addressing and stamp placement hold after any sequence.
    #[test]
    fn invariants_hold_for_any_sequence(
        (list, start, seed) in start(),
        ops in prop::collection::vec(op(), 0..40),
    ) {
        let mut queue = build(&list, start, seed);
        check_invariants(&queue)?;
        for op in ops {
            apply(&mut queue, op);
            check_invariants(&queue)?;
        }
    }

    /// Property: shuffle then unshuffle with nothing in between is the identity.
    #[test]
    fn shuffle_round_trip(
        (list, start, seed) in start(),
    ) {
        let mut queue = build(&list, start, seed);
        let before: Vec<_> = queue.auto_queue().iter().map(QueueItem::id).collect();
        queue.apply_shuffle(true);
        queue.apply_shuffle(false);
        let after: Vec<_> = queue.auto_queue().iter().map(QueueItem::id).collect();
        prop_assert_eq!(before, after);
    }

    /// Property: batch removal removes the same entries whatever the input order.
    #[test]
    fn batch_removal_is_order_independent(
        (list, start, seed) in start(),
        extra in prop::collection::vec(0u8..12, 0..6),
        picks in prop::collection::vec(any::<prop::sample::Index>(), 0..6),
    ) {
        let mut queue = build(&list, start, seed);
        queue.append_to_user_queue(extra.into_iter().map(track).collect());
        let len = queue.len();
        let indexes: Vec<usize> = picks.iter().map(|pick| pick.index(len)).collect();
        let mut reversed = indexes.clone();
        reversed.reverse();

        let mut forward = queue.clone();
        let mut backward = queue.clone();
        let a = forward.remove_indexes(&indexes).expect("indexes in range");
        let b = backward.remove_indexes(&reversed).expect("indexes in range");
        prop_assert_eq!(&a, &b);

        let boundary = queue.boundary();
        let wanted: HashSet<_> = indexes
            .iter()
            .filter(|&&i| i >= boundary)
            .map(|&i| queue.get_by_flat_index(i).expect("in range").id())
            .collect();
        let got: HashSet<_> = a.iter().map(QueueItem::id).collect();
        prop_assert_eq!(wanted, got);

        let remaining: Vec<_> = forward.iter().map(QueueItem::id).collect();
        let expected: Vec<_> = queue
            .iter()
            .map(QueueItem::id)
            .filter(|id| !a.iter().any(|item| item.id() == *id))
            .collect();
        prop_assert_eq!(remaining, expected);
    }

    /// Property: with repeat off, next then prev returns to the same item.
    #[test]
    fn next_prev_round_trip(
        (list, start, seed) in start(),
        extra in prop::collection::vec(0u8..12, 0..3),
    ) {
        let mut queue = build(&list, start, seed);
        queue.append_to_user_queue(extra.into_iter().map(track).collect());
        let before = queue.current().map(QueueItem::id);
        queue.next();
        queue.prev();
        prop_assert_eq!(queue.current().map(QueueItem::id), before);
    }

    /// Property: a move lands exactly the moved entries in the returned range.
    #[test]
    fn move_reports_landing_range(
        (list, start, seed) in start(),
        picks in prop::collection::vec(any::<prop::sample::Index>(), 1..4),
        dest in any::<prop::sample::Index>(),
        to_user_queue in any::<bool>(),
    ) {
        let mut queue = build(&list, start, seed);
        let len = queue.len();
        let boundary = queue.boundary();
        let indexes: Vec<usize> = picks.iter().map(|pick| pick.index(len)).collect();
        let new_index = boundary + dest.index(len - boundary + 1);

        let outcome = queue
            .move_indexes(&indexes, new_index, to_user_queue)
            .expect("valid move");
        let landed: Vec<_> = outcome
            .range
            .clone()
            .map(|i| queue.get_by_flat_index(i).expect("in range").id())
            .collect();
        let reported: Vec<_> = outcome.items.iter().map(|item| item.id()).collect();
        prop_assert_eq!(landed, reported);
        check_invariants(&queue)?;
    }
}

#[test]
fn scenario_manual_queue_priority() {
    let mut queue = Queue::with_seed(0);
    queue
        .set_new_queue(["a", "b", "c", "d"].map(TrackId::from).to_vec(), 1)
        .expect("valid start");
    queue.prepend_to_user_queue(vec![TrackId::from("x")]);
    queue.next();

    let names = |items: &[QueueItem]| -> Vec<String> {
        items.iter().map(|item| item.track_id().to_string()).collect()
    };
    assert_eq!(names(queue.past()), ["a", "b"]);
    assert_eq!(queue.current().map(|item| item.track_id().as_str()), Some("x"));
    assert!(queue.user_queue().is_empty());
    assert_eq!(names(queue.auto_queue()), ["c", "d"]);
}

#[test]
fn scenario_repeat_loop() {
    let mut queue = Queue::with_seed(0);
    queue
        .set_new_queue(["a", "b", "c"].map(TrackId::from).to_vec(), 1)
        .expect("valid start");
    queue.set_repeat(true);

    let b = queue.current().expect("current").clone();
    let now = queue.next().expect("c is next").clone();
    assert_eq!(now.track_id().as_str(), "c");

    let looped = &queue.auto_queue()[0];
    assert_eq!(queue.auto_queue().len(), 1);
    assert_eq!(looped.track_id(), b.track_id());
    assert_ne!(looped.id(), b.id());

    for _ in 0..10 {
        assert!(queue.next().is_some(), "repeat never runs dry");
    }
}
