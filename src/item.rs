//! Raw item descriptors and their canonical, normalized form.
//!
//! Raw descriptors come from configuration files, the items endpoint, or the
//! local add flow. They are loosely typed: any field may be missing, ids may
//! be numbers, and tag lists may hold nulls or empty strings. Normalization
//! turns them into [`Item`]s that always carry a non-empty `src`; descriptors
//! without any usable source are dropped without an error.

use serde::de::{Deserializer, IgnoredAny};
use serde::{Deserialize, Serialize};

pub const UNTITLED: &str = "Untitled";

/// An item descriptor as supplied by callers, before normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RawItem {
    #[serde(deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub title: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub alt: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub src: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub thumb: Option<String>,
    #[serde(deserialize_with = "lenient_tags")]
    pub tags: Vec<String>,
}

impl RawItem {
    pub fn new(src: impl Into<String>) -> Self {
        Self {
            src: Some(src.into()),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_alt(mut self, alt: impl Into<String>) -> Self {
        self.alt = Some(alt.into());
        self
    }

    pub fn with_thumb(mut self, thumb: impl Into<String>) -> Self {
        self.thumb = Some(thumb.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }
}

/// One displayable image. Immutable once normalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Item {
    id: String,
    title: String,
    alt: String,
    src: String,
    thumb: String,
    tags: Vec<String>,
}

impl Item {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn alt(&self) -> &str {
        &self.alt
    }

    pub fn src(&self) -> &str {
        &self.src
    }

    pub fn thumb(&self) -> &str {
        &self.thumb
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Caption text for the modal stage: title, else alt, else nothing.
    pub fn caption(&self) -> Option<&str> {
        [self.title.as_str(), self.alt.as_str()]
            .into_iter()
            .find(|text| !text.is_empty())
    }
}

/// What a missing title becomes during normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TitleFallback {
    /// Missing titles read "Untitled" (inline gallery).
    #[default]
    Untitled,
    /// Missing titles stay empty so the caption can be hidden (lightbox).
    Empty,
}

impl TitleFallback {
    fn apply(self, title: Option<String>) -> String {
        match (title, self) {
            (Some(title), _) => title,
            (None, Self::Untitled) => UNTITLED.to_string(),
            (None, Self::Empty) => String::new(),
        }
    }
}

/// Normalizes raw descriptors with the default "Untitled" title fallback.
pub fn normalize(raw: &[RawItem]) -> Vec<Item> {
    normalize_with(raw, TitleFallback::Untitled)
}

/// Canonicalizes raw descriptors, keeping input order.
///
/// Auto-ids use the position in `raw` (dropped entries still consume a
/// position), so callers that address items by id across refreshes must
/// supply their own ids.
pub fn normalize_with(raw: &[RawItem], fallback: TitleFallback) -> Vec<Item> {
    raw.iter()
        .enumerate()
        .filter_map(|(idx, entry)| normalize_one(idx, entry, fallback))
        .collect()
}

fn normalize_one(idx: usize, raw: &RawItem, fallback: TitleFallback) -> Option<Item> {
    let src = present(&raw.src).or_else(|| present(&raw.thumb))?;
    let title = fallback.apply(present(&raw.title));
    let alt = present(&raw.alt).unwrap_or_else(|| title.clone());
    let thumb = present(&raw.thumb).unwrap_or_else(|| src.clone());
    let tags = raw
        .tags
        .iter()
        .filter(|tag| !tag.is_empty())
        .cloned()
        .collect();
    Some(Item {
        id: present(&raw.id).unwrap_or_else(|| format!("item-{idx}")),
        title,
        alt,
        src,
        thumb,
        tags,
    })
}

fn present(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.is_empty()).cloned()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Integer(i64),
    Float(f64),
    Other(IgnoredAny),
}

impl Scalar {
    fn into_text(self) -> Option<String> {
        match self {
            Scalar::Text(text) => Some(text),
            Scalar::Integer(0) => None,
            Scalar::Integer(n) => Some(n.to_string()),
            Scalar::Float(f) if f == 0.0 || f.is_nan() => None,
            Scalar::Float(f) => Some(f.to_string()),
            Scalar::Other(_) => None,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TagList {
    List(Vec<Scalar>),
    Other(IgnoredAny),
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Scalar::deserialize(deserializer)?.into_text())
}

fn lenient_tags<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match TagList::deserialize(deserializer)? {
        TagList::List(values) => values
            .into_iter()
            .filter_map(Scalar::into_text)
            .filter(|tag| !tag.is_empty())
            .collect(),
        TagList::Other(_) => Vec::new(),
    })
}

/// Accepts an array of raw items, or anything else as an empty list.
pub(crate) fn lenient_items<'de, D>(deserializer: D) -> Result<Vec<RawItem>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ItemList {
        List(Vec<RawItem>),
        Other(IgnoredAny),
    }

    Ok(match ItemList::deserialize(deserializer)? {
        ItemList::List(items) => items,
        ItemList::Other(_) => Vec::new(),
    })
}
