//! The host document the modal overlay lives in.
//!
//! [`Document`] covers exactly the document-level state the lightbox touches:
//! focus, the body's scroll-permitting style, overlay attachment and
//! listener registration. [`HeadlessDocument`] is an in-memory host used by
//! the console binary and tests.

use std::collections::BTreeMap;

use crate::focus::{ElementId, Focusable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ListenerKind {
    DocumentKeydown,
    StripWheel,
    ThumbClick,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

pub trait Document {
    fn active_element(&self) -> Option<ElementId>;
    fn focus(&mut self, id: &ElementId);
    /// Current inline `overflow` style of the body, verbatim.
    fn body_overflow(&self) -> String;
    fn set_body_overflow(&mut self, value: &str);
    fn attach_overlay(&mut self);
    fn detach_overlay(&mut self);
    /// Focusable elements inside the overlay, in document order.
    fn overlay_focusables(&self) -> Vec<Focusable>;
    fn add_listener(&mut self, kind: ListenerKind) -> ListenerId;
    fn remove_listener(&mut self, id: ListenerId);
}

impl<D: Document + ?Sized> Document for &mut D {
    fn active_element(&self) -> Option<ElementId> {
        (**self).active_element()
    }

    fn focus(&mut self, id: &ElementId) {
        (**self).focus(id)
    }

    fn body_overflow(&self) -> String {
        (**self).body_overflow()
    }

    fn set_body_overflow(&mut self, value: &str) {
        (**self).set_body_overflow(value)
    }

    fn attach_overlay(&mut self) {
        (**self).attach_overlay()
    }

    fn detach_overlay(&mut self) {
        (**self).detach_overlay()
    }

    fn overlay_focusables(&self) -> Vec<Focusable> {
        (**self).overlay_focusables()
    }

    fn add_listener(&mut self, kind: ListenerKind) -> ListenerId {
        (**self).add_listener(kind)
    }

    fn remove_listener(&mut self, id: ListenerId) {
        (**self).remove_listener(id)
    }
}

/// In-memory document.
#[derive(Debug, Clone, Default)]
pub struct HeadlessDocument {
    pub active: Option<ElementId>,
    pub body_overflow: String,
    pub overlay_attached: bool,
    /// Overlay controls in document order.
    pub overlay_controls: Vec<Focusable>,
    listeners: BTreeMap<ListenerId, ListenerKind>,
    next_listener: u64,
}

impl HeadlessDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_focus(mut self, id: &str) -> Self {
        self.active = Some(ElementId::new(id));
        self
    }

    pub fn with_body_overflow(mut self, value: &str) -> Self {
        self.body_overflow = value.to_string();
        self
    }

    pub fn with_overlay_controls<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.overlay_controls = ids.into_iter().map(Focusable::new).collect();
        self
    }

    pub fn listener_count(&self, kind: ListenerKind) -> usize {
        self.listeners.values().filter(|k| **k == kind).count()
    }

    pub fn total_listeners(&self) -> usize {
        self.listeners.len()
    }
}

impl Document for HeadlessDocument {
    fn active_element(&self) -> Option<ElementId> {
        self.active.clone()
    }

    fn focus(&mut self, id: &ElementId) {
        self.active = Some(id.clone());
    }

    fn body_overflow(&self) -> String {
        self.body_overflow.clone()
    }

    fn set_body_overflow(&mut self, value: &str) {
        self.body_overflow = value.to_string();
    }

    fn attach_overlay(&mut self) {
        self.overlay_attached = true;
    }

    fn detach_overlay(&mut self) {
        self.overlay_attached = false;
    }

    fn overlay_focusables(&self) -> Vec<Focusable> {
        if !self.overlay_attached {
            return Vec::new();
        }
        self.overlay_controls.clone()
    }

    fn add_listener(&mut self, kind: ListenerKind) -> ListenerId {
        self.next_listener += 1;
        let id = ListenerId(self.next_listener);
        self.listeners.insert(id, kind);
        id
    }

    fn remove_listener(&mut self, id: ListenerId) {
        self.listeners.remove(&id);
    }
}
