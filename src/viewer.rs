//! Inline, always-visible gallery viewer with search and tag filtering.
//!
//! Every operation runs to completion synchronously: state is updated, the
//! render pipeline runs against the [`Presenter`], and neighbor preloads are
//! queued before the call returns. Work that needs the network is requested
//! through [`ViewerEvent`]s and fed back by the owner (see
//! [`crate::tasks::session`]).

use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

use crate::config::{AddHandler, Role, ViewerOptions, effective_limit};
use crate::error::{Error, Result};
use crate::events::ViewerEvent;
use crate::filter::{ALL_TAGS, Filters};
use crate::input::{Command, InputEvent, InputRouter, Routed};
use crate::item::{RawItem, normalize};
use crate::navigation::{Moved, ViewerState};
use crate::render::{
    AddControlView, ChipView, CounterView, Notice, Presenter, RenderCoordinator, ThumbOptions,
    Variant,
};
use crate::tasks::preloader::Preloader;

pub struct GalleryViewer<P: Presenter> {
    gallery_id: String,
    role: Role,
    add_handler: AddHandler,
    delete_items: bool,
    enable_search: bool,
    enable_filters: bool,
    limit: usize,
    state: ViewerState,
    presenter: P,
    coordinator: RenderCoordinator,
    router: InputRouter,
    preloader: Preloader,
    events: Option<UnboundedSender<ViewerEvent>>,
}

impl<P: Presenter> GalleryViewer<P> {
    /// Mounts the viewer and renders the initial state.
    ///
    /// Fails with [`Error::MissingMount`] when no attach point is configured.
    pub fn new(options: ViewerOptions, presenter: P) -> Result<Self> {
        Self::build(options, presenter, Preloader::disabled(), None)
    }

    pub fn with_channels(
        options: ViewerOptions,
        presenter: P,
        preloader: Preloader,
        events: UnboundedSender<ViewerEvent>,
    ) -> Result<Self> {
        Self::build(options, presenter, preloader, Some(events))
    }

    fn build(
        options: ViewerOptions,
        mut presenter: P,
        preloader: Preloader,
        events: Option<UnboundedSender<ViewerEvent>>,
    ) -> Result<Self> {
        let mount = options
            .mount
            .as_deref()
            .filter(|mount| !mount.is_empty())
            .ok_or(Error::MissingMount)?;
        presenter.mount(mount);

        let state = ViewerState::new(
            normalize(&options.items),
            Filters::from(&options.initial_filters),
            options.start_index,
        );
        let mut viewer = Self {
            add_handler: options.add_handler(),
            limit: options.effective_limit(),
            gallery_id: options.gallery_id,
            role: options.current_user_role,
            delete_items: options.delete_items,
            enable_search: options.enable_search,
            enable_filters: options.enable_filters,
            state,
            presenter,
            coordinator: RenderCoordinator::new(Variant::Inline),
            router: InputRouter::new(Variant::Inline),
            preloader,
            events,
        };
        info!(
            gallery = %viewer.gallery_id,
            items = viewer.state.items().len(),
            "gallery viewer mounted"
        );
        viewer.refresh();
        Ok(viewer)
    }

    pub fn state(&self) -> &ViewerState {
        &self.state
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn presenter_mut(&mut self) -> &mut P {
        &mut self.presenter
    }

    pub fn gallery_id(&self) -> &str {
        &self.gallery_id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn add_handler(&self) -> &AddHandler {
        &self.add_handler
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn at_limit(&self) -> bool {
        self.state.items().len() >= self.limit
    }

    pub fn active_index(&self) -> Option<usize> {
        self.state.active_index()
    }

    /// Replaces all items, e.g. after a server refresh.
    pub fn set_items(&mut self, raw: &[RawItem], limit: Option<usize>) {
        if let Some(limit) = limit {
            self.limit = effective_limit(limit);
        }
        self.state.set_items(normalize(raw));
        info!(
            gallery = %self.gallery_id,
            items = self.state.items().len(),
            limit = self.limit,
            "gallery items replaced"
        );
        self.refresh();
    }

    /// Appends items; with `activate_last` the last new item becomes active.
    pub fn add_items(&mut self, raw: &[RawItem], activate_last: bool) {
        let items = normalize(raw);
        if items.is_empty() {
            return;
        }
        self.state.append_items(items, activate_last);
        self.refresh();
    }

    pub fn update_search(&mut self, query: &str) {
        self.state.set_search(query);
        self.refresh();
    }

    pub fn set_tag(&mut self, tag: &str) {
        self.state.set_tag(tag);
        self.refresh();
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

    pub fn first(&mut self) -> Option<Moved> {
        let moved = self.state.first();
        self.after_move(moved)
    }

    pub fn last(&mut self) -> Option<Moved> {
        let moved = self.state.last();
        self.after_move(moved)
    }

    /// Navigates to the filtered item with `id`; no-op when it is not visible.
    pub fn go_to_id(&mut self, id: &str) -> Option<Moved> {
        let moved = self.state.go_to_id(id);
        self.after_move(moved)
    }

    /// Routes one input event and runs the resulting command.
    pub fn handle_input(&mut self, event: &InputEvent) -> Routed {
        let routed = self.router.route(event);
        match &routed.command {
            Some(Command::Prev) => {
                self.prev();
            }
            Some(Command::Next) => {
                self.next();
            }
            Some(Command::First) => {
                self.first();
            }
            Some(Command::Last) => {
                self.last();
            }
            Some(Command::GoTo(idx)) => {
                self.go_to(*idx);
            }
            Some(Command::ScrollStrip(dx)) => self.presenter.scroll_strip_by(*dx),
            Some(Command::Close | Command::ContainFocus { .. }) | None => {}
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

    /// A neighbor finished preloading; the stage may have been waiting on it.
    pub fn asset_ready(&mut self, src: &str) {
        if self.coordinator.asset_ready(src, &mut self.presenter) {
            debug!(%src, "stage completed by preload");
        }
    }

    /// The add control was pressed. Returns false while at the limit.
    pub fn click_add(&mut self) -> bool {
        if self.at_limit() {
            debug!(limit = self.limit, "add ignored at limit");
            return false;
        }
        let event = match &self.add_handler {
            AddHandler::Link(_) => ViewerEvent::AddRequested {
                gallery_id: self.gallery_id.clone(),
            },
            AddHandler::FilePicker => ViewerEvent::FilePickerRequested,
        };
        self.emit(event);
        true
    }

    /// The remove affordance on a thumbnail was pressed. Never navigates.
    pub fn click_remove(&mut self, item_id: &str) -> bool {
        if !self.removable() {
            return false;
        }
        self.emit(ViewerEvent::DeleteRequested {
            item_id: item_id.to_string(),
        });
        true
    }

    pub fn notify(&mut self, message: impl Into<String>) {
        self.presenter.notify(&Notice {
            message: message.into(),
        });
    }

    /// Re-runs the full pipeline: filter chips, placeholder, stage, strip,
    /// counter and add control.
    pub fn refresh(&mut self) {
        if self.enable_filters {
            let chips = self.chip_views();
            self.presenter.render_chips(&chips);
        }
        let thumbs = ThumbOptions {
            removable: self.removable(),
        };
        self.coordinator
            .render_all(&self.state, thumbs, &mut self.presenter);
        if self.has_controls() {
            let used = self.state.items().len();
            let full = used >= self.limit;
            self.presenter.set_counter(&CounterView {
                used,
                limit: self.limit,
                full,
            });
            self.presenter.set_add_control(&AddControlView {
                enabled: !full,
                limit_note: full.then(|| {
                    format!(
                        "Limit reached ({}). Remove one to add another.",
                        self.limit
                    )
                }),
            });
        }
    }

    fn after_move(&mut self, moved: Option<Moved>) -> Option<Moved> {
        let moved = moved?;
        debug!(from = moved.from, to = moved.to, "navigated");
        self.coordinator
            .render_active(&self.state, &mut self.presenter);
        self.preloader.preload_neighbors(&self.state);
        Some(moved)
    }

    fn removable(&self) -> bool {
        self.delete_items && self.role.is_privileged()
    }

    fn has_controls(&self) -> bool {
        self.enable_search || self.enable_filters || matches!(self.add_handler, AddHandler::Link(_))
    }

    fn chip_views(&self) -> Vec<ChipView> {
        let active = self.state.filters().tag();
        self.state
            .tag_universe()
            .into_iter()
            .map(|tag| ChipView {
                label: if tag == ALL_TAGS {
                    "All".to_string()
                } else {
                    tag.clone()
                },
                active: tag == active,
                tag,
            })
            .collect()
    }

    fn emit(&self, event: ViewerEvent) {
        match &self.events {
            Some(tx) => {
                if tx.send(event).is_err() {
                    warn!("viewer owner stopped listening; request dropped");
                }
            }
            None => debug!(?event, "no owner attached; request dropped"),
        }
    }
}

impl<P: Presenter> Drop for GalleryViewer<P> {
    fn drop(&mut self) {
        self.presenter.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{ClickTarget, Key, KeyEvent};
    use crate::scene::Scene;
    use tokio::sync::mpsc;

    fn options(raw: Vec<RawItem>) -> ViewerOptions {
        ViewerOptions {
            items: raw,
            ..ViewerOptions::with_mount("#gallery")
        }
    }

    fn three() -> Vec<RawItem> {
        vec![
            RawItem::new("a.jpg").with_id("a").with_title("Sunset").with_tags(["Nature"]),
            RawItem::new("b.jpg").with_id("b").with_title("City").with_tags(["Urban"]),
            RawItem::new("c.jpg").with_id("c").with_title("Lake").with_tags(["Nature"]),
        ]
    }

    #[test]
    fn missing_mount_is_fatal() {
        let result = GalleryViewer::new(ViewerOptions::default(), Scene::default());
        assert!(matches!(result, Err(Error::MissingMount)));
    }

    #[test]
    fn initial_render_builds_chips_counter_and_strip() {
        let viewer = GalleryViewer::new(options(three()), Scene::default()).unwrap();
        let scene = viewer.presenter();
        assert_eq!(scene.mount.as_deref(), Some("#gallery"));
        let labels: Vec<_> = scene.chips.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, ["All", "Nature", "Urban"]);
        assert_eq!(scene.active_chip(), Some("all"));
        assert_eq!(scene.counter.as_ref().unwrap().text(), "3 / 10 photos used");
        assert_eq!(scene.current_thumbs(), vec![0]);
    }

    #[test]
    fn keyboard_navigation_wraps_and_preloads() {
        let (tx, mut rx) = mpsc::channel(16);
        let (events, _events_rx) = mpsc::unbounded_channel();
        let mut viewer =
            GalleryViewer::with_channels(options(three()), Scene::default(), Preloader::new(tx), events)
                .unwrap();

        let routed = viewer.handle_input(&InputEvent::Key(KeyEvent::new(Key::ArrowLeft)));
        assert!(routed.prevent_default);
        assert_eq!(viewer.active_index(), Some(2));
        assert_eq!(viewer.presenter().current_thumbs(), vec![2]);
        assert_eq!(rx.try_recv().unwrap().0, "a.jpg");
        assert_eq!(rx.try_recv().unwrap().0, "b.jpg");

        viewer.handle_input(&InputEvent::Key(KeyEvent::new(Key::Home)));
        assert_eq!(viewer.active_index(), Some(0));
        viewer.handle_input(&InputEvent::Key(KeyEvent::new(Key::End)));
        assert_eq!(viewer.active_index(), Some(2));
    }

    #[test]
    fn thumb_click_and_wheel() {
        let mut viewer = GalleryViewer::new(options(three()), Scene::default()).unwrap();
        viewer.handle_input(&InputEvent::Click(ClickTarget::Thumb { index: "1".into() }));
        assert_eq!(viewer.active_index(), Some(1));
        viewer.handle_input(&InputEvent::Click(ClickTarget::Strip));
        assert_eq!(viewer.active_index(), Some(1));

        viewer.handle_input(&InputEvent::Wheel { dx: 0.0, dy: 120.0 });
        assert_eq!(viewer.presenter().strip_scroll_left, 120.0);
    }

    #[test]
    fn tag_filter_scenario() {
        let raw = vec![
            RawItem::new("a.jpg").with_id("a").with_title("Sunset").with_tags(["Nature"]),
            RawItem::new("b.jpg").with_id("b").with_title("City").with_tags(["Urban"]),
        ];
        let mut viewer = GalleryViewer::new(options(raw), Scene::default()).unwrap();
        viewer.set_tag("Urban");
        let ids: Vec<_> = viewer.state().filtered_items().map(|i| i.id()).collect();
        assert_eq!(ids, ["b"]);
        assert_eq!(viewer.active_index(), Some(0));
        assert_eq!(viewer.presenter().active_chip(), Some("Urban"));
    }

    #[test]
    fn search_with_no_hits_shows_placeholder() {
        let mut viewer = GalleryViewer::new(options(three()), Scene::default()).unwrap();
        viewer.update_search("  MOUNTAIN ");
        assert!(viewer.presenter().empty_visible);
        assert!(viewer.next().is_none());
        viewer.update_search("");
        assert!(!viewer.presenter().empty_visible);
        assert_eq!(viewer.state().filtered_len(), 3);
    }

    #[test]
    fn limit_disables_add_and_shows_note() {
        let (events, mut events_rx) = mpsc::unbounded_channel();
        let mut viewer = GalleryViewer::with_channels(
            ViewerOptions {
                limit: 3,
                ..options(three())
            },
            Scene::default(),
            Preloader::disabled(),
            events,
        )
        .unwrap();
        let add = viewer.presenter().add_control.clone().unwrap();
        assert!(!add.enabled);
        assert_eq!(
            add.limit_note.as_deref(),
            Some("Limit reached (3). Remove one to add another.")
        );
        assert!(viewer.presenter().counter.as_ref().unwrap().full);
        assert!(!viewer.click_add());
        assert!(events_rx.try_recv().is_err());

        viewer.set_items(&three()[..2], Some(5));
        assert!(viewer.click_add());
        assert_eq!(events_rx.try_recv().unwrap(), ViewerEvent::FilePickerRequested);
    }

    #[test]
    fn delegated_add_emits_request() {
        let (events, mut events_rx) = mpsc::unbounded_channel();
        let mut viewer = GalleryViewer::with_channels(
            ViewerOptions {
                add_link: Some("/works/default/add/".into()),
                ..options(three())
            },
            Scene::default(),
            Preloader::disabled(),
            events,
        )
        .unwrap();
        assert!(viewer.click_add());
        assert_eq!(
            events_rx.try_recv().unwrap(),
            ViewerEvent::AddRequested {
                gallery_id: "default".into()
            }
        );
    }

    #[test]
    fn remove_affordance_requires_admin_and_handler() {
        let (events, mut events_rx) = mpsc::unbounded_channel();
        let mut viewer = GalleryViewer::with_channels(
            ViewerOptions {
                delete_items: true,
                ..options(three())
            },
            Scene::default(),
            Preloader::disabled(),
            events.clone(),
        )
        .unwrap();
        assert!(viewer.presenter().thumbs.iter().all(|t| !t.removable));
        assert!(!viewer.click_remove("a"));

        let mut admin = GalleryViewer::with_channels(
            ViewerOptions {
                delete_items: true,
                current_user_role: Role::Admin,
                ..options(three())
            },
            Scene::default(),
            Preloader::disabled(),
            events,
        )
        .unwrap();
        assert!(admin.presenter().thumbs.iter().all(|t| t.removable));
        assert!(admin.click_remove("b"));
        assert_eq!(admin.active_index(), Some(0));
        assert_eq!(
            events_rx.try_recv().unwrap(),
            ViewerEvent::DeleteRequested {
                item_id: "b".into()
            }
        );
    }

    #[test]
    fn add_items_can_activate_last() {
        let mut viewer = GalleryViewer::new(options(three()), Scene::default()).unwrap();
        viewer.add_items(&[RawItem::new("d.jpg").with_id("d")], true);
        assert_eq!(viewer.state().active_item().map(|i| i.id()), Some("d"));
        assert_eq!(viewer.presenter().thumbs.len(), 4);
        viewer.add_items(&[RawItem::default()], true);
        assert_eq!(viewer.state().items().len(), 4);
    }

    #[test]
    fn go_to_id_only_within_filter() {
        let mut viewer = GalleryViewer::new(options(three()), Scene::default()).unwrap();
        viewer.set_tag("Nature");
        assert!(viewer.go_to_id("b").is_none());
        assert!(viewer.go_to_id("c").is_some());
        assert_eq!(viewer.active_index(), Some(1));
    }

    #[test]
    fn drop_tears_down_presentation() {
        let mut scene = Scene::default();
        {
            let viewer = GalleryViewer::new(options(three()), &mut scene).unwrap();
            assert!(!viewer.presenter().torn_down);
        }
        assert!(scene.torn_down);
    }
}
