//! Viewer state: canonical items, filters, the derived filtered set and the
//! active index into it.
//!
//! The state machine has two phases. `Empty` when no item passes the
//! filters, `Active` otherwise; in `Active` the active index is always a
//! valid position in the filtered set. Every mutation that can change the
//! filtered set goes through [`ViewerState::refilter`], which recomputes it
//! from scratch and then repairs the active index.

use tracing::debug;

use crate::filter::{self, Filters};
use crate::item::Item;

/// Wraps `idx` into `[0, len)`; `0` when `len == 0`.
pub fn normalize_index(idx: isize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    let len = len as isize;
    idx.rem_euclid(len) as usize
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Empty,
    Active,
}

/// Which item should be active after the filtered set is recomputed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Keep the currently active item if it still passes the filters.
    Preserve,
    /// A position in the new filtered set (used for start indices).
    FilteredIndex(isize),
    /// A position in `items`, e.g. the item just appended.
    ItemIndex(usize),
    /// The filtered item with this id, e.g. across a full item refresh.
    ItemId(String),
}

/// Result of a navigation call that actually ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Moved {
    pub from: usize,
    pub to: usize,
}

impl Moved {
    pub fn changed(&self) -> bool {
        self.from != self.to
    }
}

#[derive(Debug, Clone)]
pub struct ViewerState {
    items: Vec<Item>,
    filters: Filters,
    /// Positions in `items` that pass `filters`, in display order.
    filtered: Vec<usize>,
    active: usize,
}

impl ViewerState {
    pub fn new(items: Vec<Item>, filters: Filters, start_index: isize) -> Self {
        let mut state = Self {
            items,
            filters,
            filtered: Vec::new(),
            active: 0,
        };
        state.refilter(Selection::FilteredIndex(start_index));
        state
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn filters(&self) -> &Filters {
        &self.filters
    }

    pub fn phase(&self) -> Phase {
        if self.filtered.is_empty() {
            Phase::Empty
        } else {
            Phase::Active
        }
    }

    pub fn filtered_len(&self) -> usize {
        self.filtered.len()
    }

    pub fn filtered_items(&self) -> impl Iterator<Item = &Item> + '_ {
        self.filtered.iter().map(|&idx| &self.items[idx])
    }

    pub fn filtered_item(&self, position: usize) -> Option<&Item> {
        self.filtered.get(position).map(|&idx| &self.items[idx])
    }

    /// Active position in the filtered set; `None` while empty.
    pub fn active_index(&self) -> Option<usize> {
        match self.phase() {
            Phase::Empty => None,
            Phase::Active => Some(self.active),
        }
    }

    pub fn active_item(&self) -> Option<&Item> {
        self.active_index().and_then(|pos| self.filtered_item(pos))
    }

    pub fn tag_universe(&self) -> Vec<String> {
        filter::tag_universe(&self.items)
    }

    /// Replaces the item set wholesale, keeping the active item by id.
    pub fn set_items(&mut self, items: Vec<Item>) {
        let selection = match self.active_item() {
            Some(item) => Selection::ItemId(item.id().to_string()),
            None => Selection::FilteredIndex(0),
        };
        self.items = items;
        self.refilter(selection);
    }

    /// Replaces the item set and starts over from the first filtered item.
    pub fn reset_items(&mut self, items: Vec<Item>) {
        self.items = items;
        self.refilter(Selection::FilteredIndex(0));
    }

    /// Appends items; optionally makes the last appended item active.
    pub fn append_items(&mut self, items: Vec<Item>, activate_last: bool) {
        if items.is_empty() {
            return;
        }
        self.items.extend(items);
        let selection = if activate_last {
            Selection::ItemIndex(self.items.len() - 1)
        } else {
            Selection::Preserve
        };
        self.refilter(selection);
    }

    pub fn set_search(&mut self, query: &str) {
        self.filters.set_search(query);
        self.refilter(Selection::Preserve);
    }

    pub fn set_tag(&mut self, tag: &str) {
        self.filters.set_tag(tag);
        self.refilter(Selection::Preserve);
    }

    /// Recomputes the filtered set from `items` and repairs the active index.
    ///
    /// When the requested item is not in the new filtered set the active
    /// index falls back to `0`.
    pub fn refilter(&mut self, selection: Selection) {
        let previous = self.active_item_index();
        self.filtered = self
            .items
            .iter()
            .enumerate()
            .filter(|(_, item)| self.filters.matches(item))
            .map(|(idx, _)| idx)
            .collect();

        let wanted = match selection {
            Selection::Preserve => previous.and_then(|idx| self.position_of_item(idx)),
            Selection::FilteredIndex(pos) => {
                usize::try_from(pos).ok().filter(|&p| p < self.filtered.len())
            }
            Selection::ItemIndex(idx) => self.position_of_item(idx),
            Selection::ItemId(id) => self.filtered_items().position(|item| item.id() == id),
        };
        self.active = wanted.unwrap_or(0);
        debug!(
            total = self.items.len(),
            visible = self.filtered.len(),
            active = self.active,
            "filtered set recomputed"
        );
    }

    /// Moves to `raw` wrapped into the filtered set. No-op while empty.
    pub fn go_to(&mut self, raw: isize) -> Option<Moved> {
        if self.filtered.is_empty() {
            return None;
        }
        let from = self.active;
        self.active = normalize_index(raw, self.filtered.len());
        Some(Moved {
            from,
            to: self.active,
        })
    }

    pub fn next(&mut self) -> Option<Moved> {
        self.go_to(self.active as isize + 1)
    }

    pub fn prev(&mut self) -> Option<Moved> {
        self.go_to(self.active as isize - 1)
    }

    pub fn first(&mut self) -> Option<Moved> {
        self.go_to(0)
    }

    pub fn last(&mut self) -> Option<Moved> {
        self.go_to(self.filtered.len() as isize - 1)
    }

    /// Moves to the filtered item with `id`; no-op when it is filtered out.
    pub fn go_to_id(&mut self, id: &str) -> Option<Moved> {
        let pos = self.filtered_items().position(|item| item.id() == id)?;
        self.go_to(pos as isize)
    }

    /// Positions of the next and previous neighbors, when there are any.
    pub fn neighbors(&self) -> Option<(usize, usize)> {
        if self.filtered.len() <= 1 {
            return None;
        }
        let len = self.filtered.len();
        let active = self.active as isize;
        Some((
            normalize_index(active + 1, len),
            normalize_index(active - 1, len),
        ))
    }

    fn active_item_index(&self) -> Option<usize> {
        self.filtered.get(self.active).copied()
    }

    fn position_of_item(&self, item_idx: usize) -> Option<usize> {
        self.filtered.iter().position(|&idx| idx == item_idx)
    }
}
