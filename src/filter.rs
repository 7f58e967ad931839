//! Search and tag filtering over normalized items.

use serde::Deserialize;

use crate::item::Item;

/// Tag value meaning "no tag filter".
pub const ALL_TAGS: &str = "all";

/// Search query and active tag, stored in canonical form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filters {
    search: String,
    tag: String,
}

impl Default for Filters {
    fn default() -> Self {
        Self {
            search: String::new(),
            tag: ALL_TAGS.to_string(),
        }
    }
}

impl Filters {
    pub fn new(search: &str, tag: &str) -> Self {
        let mut filters = Self::default();
        filters.set_search(search);
        filters.set_tag(tag);
        filters
    }

    /// Trimmed, lower-cased query. Empty means no search filter.
    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn set_search(&mut self, query: &str) {
        self.search = query.trim().to_lowercase();
    }

    /// An empty tag selects everything, same as [`ALL_TAGS`].
    pub fn set_tag(&mut self, tag: &str) {
        self.tag = if tag.is_empty() {
            ALL_TAGS.to_string()
        } else {
            tag.to_string()
        };
    }

    pub fn is_active(&self) -> bool {
        !self.search.is_empty() || self.tag != ALL_TAGS
    }

    pub fn matches(&self, item: &Item) -> bool {
        matches(item, self)
    }
}

/// `initial-filters` as written in configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct InitialFilters {
    pub search: String,
    pub tag: String,
}

impl From<&InitialFilters> for Filters {
    fn from(initial: &InitialFilters) -> Self {
        Filters::new(&initial.search, &initial.tag)
    }
}

/// True when `item` passes both the tag and the search criteria.
pub fn matches(item: &Item, filters: &Filters) -> bool {
    tag_matches(item, filters.tag()) && search_matches(item, filters.search())
}

fn tag_matches(item: &Item, tag: &str) -> bool {
    tag == ALL_TAGS || item.tags().iter().any(|t| t == tag)
}

fn search_matches(item: &Item, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }
    let haystack = format!("{} {}", item.title(), item.tags().join(" ")).to_lowercase();
    haystack.contains(query)
}

/// `"all"` followed by every distinct tag in first-seen order.
pub fn tag_universe(items: &[Item]) -> Vec<String> {
    let mut tags = vec![ALL_TAGS.to_string()];
    for tag in items.iter().flat_map(|item| item.tags()) {
        if !tags.contains(tag) {
            tags.push(tag.clone());
        }
    }
    tags
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{RawItem, normalize};

    fn sample() -> Vec<Item> {
        normalize(&[
            RawItem::new("a.jpg")
                .with_id("a")
                .with_title("Sunset")
                .with_tags(["Nature"]),
            RawItem::new("b.jpg")
                .with_id("b")
                .with_title("City")
                .with_tags(["Urban", "Night"]),
            RawItem::new("c.jpg")
                .with_id("c")
                .with_title("Forest at night")
                .with_tags(["Nature", "Night"]),
        ])
    }

    #[test]
    fn canonicalizes_inputs() {
        let filters = Filters::new("  SunSet ", "");
        assert_eq!(filters.search(), "sunset");
        assert_eq!(filters.tag(), ALL_TAGS);
        assert!(filters.is_active());
        assert!(!Filters::default().is_active());
    }

    #[test]
    fn tag_match_is_exact_and_case_sensitive() {
        let items = sample();
        let urban = Filters::new("", "Urban");
        assert!(!urban.matches(&items[0]));
        assert!(urban.matches(&items[1]));
        assert!(!Filters::new("", "urban").matches(&items[1]));
    }

    #[test]
    fn search_covers_title_and_tags() {
        let items = sample();
        let night = Filters::new("NIGHT", ALL_TAGS);
        let hits: Vec<_> = items.iter().filter(|i| night.matches(i)).map(Item::id).collect();
        assert_eq!(hits, ["b", "c"]);

        let by_tag_text = Filters::new("urban", ALL_TAGS);
        assert!(by_tag_text.matches(&items[1]));
    }

    #[test]
    fn both_criteria_must_hold() {
        let items = sample();
        let filters = Filters::new("forest", "Night");
        let hits: Vec<_> = items.iter().filter(|i| filters.matches(i)).map(Item::id).collect();
        assert_eq!(hits, ["c"]);
    }

    #[test]
    fn universe_starts_with_all_and_dedups() {
        assert_eq!(tag_universe(&sample()), ["all", "Nature", "Urban", "Night"]);
        assert_eq!(tag_universe(&[]), ["all"]);
    }

    #[test]
    fn universe_never_repeats_all() {
        let items = normalize(&[RawItem::new("a.jpg").with_tags(["x", "all"])]);
        assert_eq!(tag_universe(&items), ["all", "x"]);
    }
}
