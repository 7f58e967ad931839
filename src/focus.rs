//! Keyboard focus containment for the modal overlay.

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementId(pub String);

impl ElementId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ElementId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// A focusable element inside the overlay, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Focusable {
    pub id: ElementId,
    pub disabled: bool,
    pub visible: bool,
}

impl Focusable {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: ElementId::new(id),
            disabled: false,
            visible: true,
        }
    }

    fn reachable(&self) -> bool {
        !self.disabled && self.visible
    }
}

/// Where Tab (or Shift+Tab when `backward`) must wrap focus to, if anywhere.
///
/// Only the boundary elements wrap; inside the ring the platform's default
/// traversal applies and `None` is returned.
pub fn wrap_target(
    focusables: &[Focusable],
    active: Option<&ElementId>,
    backward: bool,
) -> Option<ElementId> {
    let ring: Vec<&Focusable> = focusables.iter().filter(|f| f.reachable()).collect();
    let first = ring.first()?;
    let last = ring.last()?;
    let active = active?;
    if backward && *active == first.id {
        Some(last.id.clone())
    } else if !backward && *active == last.id {
        Some(first.id.clone())
    } else {
        None
    }
}
