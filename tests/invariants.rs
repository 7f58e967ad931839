use media_viewer::filter::{ALL_TAGS, Filters, tag_universe};
use media_viewer::item::{RawItem, normalize};
use media_viewer::navigation::{Phase, ViewerState, normalize_index};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Next,
    Prev,
    GoTo(isize),
    Search(String),
    Tag(String),
    Replace(Vec<RawItem>),
    Append(Vec<RawItem>, bool),
}

fn raw_item() -> impl Strategy<Value = RawItem> {
    (
        prop::option::of("[a-e]{1,2}"),
        prop::option::of("[a-z ]{0,8}"),
        prop::collection::vec(prop::sample::select(vec!["Nature", "Urban", "all", ""]), 0..3),
    )
        .prop_map(|(src, title, tags)| {
            let mut raw = RawItem {
                src: src.map(|s| format!("{s}.jpg")),
                ..RawItem::default()
            };
            raw.title = title;
            raw.with_tags(tags)
        })
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::Next),
        Just(Op::Prev),
        (-20isize..20).prop_map(Op::GoTo),
        "[a-z]{0,2}".prop_map(Op::Search),
        prop::sample::select(vec!["all", "Nature", "Urban", "Missing"])
            .prop_map(|t| Op::Tag(t.to_string())),
        prop::collection::vec(raw_item(), 0..6).prop_map(Op::Replace),
        (prop::collection::vec(raw_item(), 0..3), any::<bool>())
            .prop_map(|(items, last)| Op::Append(items, last)),
    ]
}

fn apply(state: &mut ViewerState, op: Op) {
    match op {
        Op::Next => {
            state.next();
        }
        Op::Prev => {
            state.prev();
        }
        Op::GoTo(idx) => {
            state.go_to(idx);
        }
        Op::Search(query) => state.set_search(&query),
        Op::Tag(tag) => state.set_tag(&tag),
        Op::Replace(raw) => state.set_items(normalize(&raw)),
        Op::Append(raw, last) => state.append_items(normalize(&raw), last),
    }
}

proptest! {
    /// The active index is always inside the filtered set, and absent only
    /// when that set is empty.
    #[test]
    fn active_index_stays_in_bounds(
        initial in prop::collection::vec(raw_item(), 0..6),
        start in -10isize..10,
        ops in prop::collection::vec(op(), 0..40),
    ) {
        let mut state = ViewerState::new(normalize(&initial), Filters::default(), start);
        for op in ops {
            apply(&mut state, op);
            match state.active_index() {
                Some(active) => {
                    prop_assert!(active < state.filtered_len());
                    prop_assert_eq!(state.phase(), Phase::Active);
                }
                None => {
                    prop_assert_eq!(state.filtered_len(), 0);
                    prop_assert_eq!(state.phase(), Phase::Empty);
                }
            }
        }
    }

    /// The filtered set is exactly the items passing the filters, in order.
    #[test]
    fn filtered_set_matches_predicate(
        initial in prop::collection::vec(raw_item(), 0..8),
        ops in prop::collection::vec(op(), 0..20),
    ) {
        let mut state = ViewerState::new(normalize(&initial), Filters::default(), 0);
        for op in ops {
            apply(&mut state, op);
        }
        let expected: Vec<_> = state
            .items()
            .iter()
            .filter(|item| state.filters().matches(item))
            .map(|item| item.id().to_string())
            .collect();
        let actual: Vec<_> = state.filtered_items().map(|item| item.id().to_string()).collect();
        prop_assert_eq!(actual, expected);
    }

    #[test]
    fn normalize_index_is_total(idx in any::<isize>(), len in 0usize..1000) {
        let wrapped = normalize_index(idx, len);
        if len == 0 {
            prop_assert_eq!(wrapped, 0);
        } else {
            prop_assert!(wrapped < len);
            prop_assert_eq!(normalize_index(wrapped as isize, len), wrapped);
        }
    }

    /// "all" first, then every distinct tag exactly once.
    #[test]
    fn tag_universe_is_all_then_distinct(raw in prop::collection::vec(raw_item(), 0..10)) {
        let items = normalize(&raw);
        let universe = tag_universe(&items);
        prop_assert_eq!(universe.first().map(String::as_str), Some(ALL_TAGS));
        for (i, tag) in universe.iter().enumerate() {
            prop_assert!(!universe[i + 1..].contains(tag));
        }
        for tag in items.iter().flat_map(|item| item.tags()) {
            prop_assert!(universe.contains(tag));
        }
    }

    /// Every normalized item has a source; nothing with a usable source is lost.
    #[test]
    fn normalization_keeps_exactly_sourced_items(raw in prop::collection::vec(raw_item(), 0..10)) {
        let items = normalize(&raw);
        let sourced = raw.iter().filter(|r| r.src.is_some()).count();
        prop_assert_eq!(items.len(), sourced);
        prop_assert!(items.iter().all(|item| !item.src().is_empty()));
    }
}
