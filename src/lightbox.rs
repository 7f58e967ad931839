//! Modal full-screen viewer.
//!
//! While open the lightbox owns three pieces of document state: the body's
//! scroll lock, the overlay attachment, and its listeners. They are captured
//! together in an [`OpenSession`] when the overlay opens and released in one
//! place when it closes, so every exit path restores the document exactly.

use tracing::{debug, info};

use crate::document::{Document, ListenerId, ListenerKind};
use crate::filter::Filters;
use crate::focus::{self, ElementId};
use crate::input::{Command, InputEvent, InputRouter, Routed};
use crate::item::{RawItem, TitleFallback, normalize_with};
use crate::navigation::{Moved, ViewerState};
use crate::render::{Presenter, RenderCoordinator, ThumbOptions, Variant};
use crate::tasks::preloader::Preloader;

pub const CLOSE_CONTROL: &str = "lightbox-close";
pub const PREV_CONTROL: &str = "lightbox-prev";
pub const NEXT_CONTROL: &str = "lightbox-next";

/// Focusable overlay controls in document order, before the thumbnails.
pub const OVERLAY_CONTROLS: [&str; 3] = [CLOSE_CONTROL, PREV_CONTROL, NEXT_CONTROL];

const BOUND_LISTENERS: [ListenerKind; 3] = [
    ListenerKind::DocumentKeydown,
    ListenerKind::StripWheel,
    ListenerKind::ThumbClick,
];

#[derive(Debug, Clone, Default)]
pub struct LightboxOptions {
    /// Element that opened the lightbox; focus returns here on close.
    pub trigger: Option<ElementId>,
    pub images: Vec<RawItem>,
    pub start_index: isize,
}

/// Document state captured on open and given back on close.
#[derive(Debug)]
struct OpenSession {
    saved_overflow: String,
    listeners: Vec<ListenerId>,
    previously_focused: Option<ElementId>,
}

pub struct Lightbox<D: Document, P: Presenter> {
    document: D,
    presenter: P,
    state: ViewerState,
    coordinator: RenderCoordinator,
    router: InputRouter,
    preloader: Preloader,
    trigger: Option<ElementId>,
    start_index: isize,
    session: Option<OpenSession>,
}

impl<D: Document, P: Presenter> Lightbox<D, P> {
    /// Builds a closed lightbox.
    pub fn new(document: D, presenter: P, options: LightboxOptions) -> Self {
        let state = ViewerState::new(
            normalize_with(&options.images, TitleFallback::Empty),
            Filters::default(),
            options.start_index,
        );
        Self {
            document,
            presenter,
            state,
            coordinator: RenderCoordinator::new(Variant::Modal),
            router: InputRouter::new(Variant::Modal),
            preloader: Preloader::disabled(),
            trigger: options.trigger,
            start_index: options.start_index,
            session: None,
        }
    }

    pub fn with_preloader(mut self, preloader: Preloader) -> Self {
        self.preloader = preloader;
        self
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    pub fn state(&self) -> &ViewerState {
        &self.state
    }

    pub fn document(&self) -> &D {
        &self.document
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    /// Opens the overlay at the configured start index.
    pub fn show(&mut self) -> bool {
        self.open(None, self.start_index)
    }

    /// Opens the overlay, optionally replacing the images first.
    ///
    /// Opening with an empty image list, or with no images at all, changes
    /// nothing. Opening while already open only re-renders.
    pub fn open(&mut self, images: Option<&[RawItem]>, start_index: isize) -> bool {
        if let Some(images) = images {
            let items = normalize_with(images, TitleFallback::Empty);
            if items.is_empty() {
                debug!("lightbox open ignored: no displayable images");
                return false;
            }
            self.state.reset_items(items);
        }
        if self.state.filtered_len() == 0 {
            debug!("lightbox open ignored: nothing to show");
            return false;
        }
        self.state.go_to(start_index);

        if self.session.is_none() {
            let previously_focused = self.document.active_element();
            self.document.attach_overlay();
            let saved_overflow = self.document.body_overflow();
            self.document.set_body_overflow("hidden");
            let listeners = BOUND_LISTENERS
                .iter()
                .map(|kind| self.document.add_listener(*kind))
                .collect();
            self.session = Some(OpenSession {
                saved_overflow,
                listeners,
                previously_focused,
            });
            self.coordinator.reset();
            info!(
                items = self.state.filtered_len(),
                start = ?self.state.active_index(),
                "lightbox opened"
            );
        }

        self.coordinator
            .render_all(&self.state, ThumbOptions::default(), &mut self.presenter);
        self.preloader.preload_neighbors(&self.state);
        self.document.focus(&ElementId::new(CLOSE_CONTROL));
        true
    }

    /// Closes the overlay and gives the document back. No-op when closed.
    pub fn close(&mut self) -> bool {
        let Some(session) = self.session.take() else {
            return false;
        };
        for id in session.listeners {
            self.document.remove_listener(id);
        }
        self.document.set_body_overflow(&session.saved_overflow);
        self.document.detach_overlay();
        if let Some(target) = self.trigger.clone().or(session.previously_focused) {
            self.document.focus(&target);
        }
        info!("lightbox closed");
        true
    }

    pub fn go_to(&mut self, raw: isize) -> Option<Moved> {
        let moved = self.state.go_to(raw);
        self.after_move(moved)
    }

    pub fn next(&mut self) -> Option<Moved> {
        let moved = self.state.next();
        self.after_move(moved)
    }

    pub fn prev(&mut self) -> Option<Moved> {
        let moved = self.state.prev();
        self.after_move(moved)
    }

    /// Routes input delivered to the overlay. Ignored while closed since no
    /// listeners are bound then.
    pub fn handle_input(&mut self, event: &InputEvent) -> Routed {
        if !self.is_open() {
            return Routed::default();
        }
        let mut routed = self.router.route(event);
        match routed.command.clone() {
            Some(Command::Prev) => {
                self.prev();
            }
            Some(Command::Next) => {
                self.next();
            }
            Some(Command::First) => {
                self.go_to(0);
            }
            Some(Command::Last) => {
                self.go_to(-1);
            }
            Some(Command::GoTo(idx)) => {
                self.go_to(idx);
            }
            Some(Command::ScrollStrip(dx)) => self.presenter.scroll_strip_by(dx),
            Some(Command::Close) => {
                self.close();
            }
            Some(Command::ContainFocus { backward }) => {
                let focusables = self.document.overlay_focusables();
                let active = self.document.active_element();
                if let Some(target) = focus::wrap_target(&focusables, active.as_ref(), backward) {
                    self.document.focus(&target);
                    routed.prevent_default = true;
                }
            }
            None => {}
        }
        routed
    }

    pub fn stage_src(&self) -> Option<&str> {
        self.coordinator.stage_src()
    }

    /// Load completion for the stage asset.
    pub fn stage_loaded(&mut self, src: &str) {
        self.coordinator.asset_loaded(src, &mut self.presenter);
    }

    /// A preload finished; neighbors reached later show as loaded right away.
    pub fn asset_ready(&mut self, src: &str) {
        self.coordinator.asset_ready(src, &mut self.presenter);
    }

    fn after_move(&mut self, moved: Option<Moved>) -> Option<Moved> {
        let moved = moved?;
        self.coordinator
            .render_active(&self.state, &mut self.presenter);
        self.preloader.preload_neighbors(&self.state);
        Some(moved)
    }
}

impl<D: Document, P: Presenter> Drop for Lightbox<D, P> {
    fn drop(&mut self) {
        self.close();
    }
}
