//! Presentation contract and the coordinator that drives it.
//!
//! [`Presenter`] is the seam between the state machine and whatever draws
//! it (a DOM binding, a GUI toolkit, or the headless [`crate::scene::Scene`]).
//! The coordinator decides *what* must become observably true after each
//! transition and in which order; presenters only apply it.

use crate::item::Item;
use crate::navigation::ViewerState;

/// Which viewer the coordinator renders for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    Inline,
    Modal,
}

/// Load state of a stage asset right after it was assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetState {
    /// Already decoded/cached; the stage can be marked loaded immediately.
    Ready,
    /// Completion arrives later through [`RenderCoordinator::asset_loaded`].
    Pending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageView {
    pub item_id: String,
    pub src: String,
    pub alt: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThumbView {
    pub index: usize,
    pub item_id: String,
    pub src: String,
    pub alt: String,
    pub label: String,
    pub current: bool,
    pub removable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChipView {
    pub tag: String,
    pub label: String,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterView {
    pub used: usize,
    pub limit: usize,
    pub full: bool,
}

impl CounterView {
    pub fn text(&self) -> String {
        format!("{} / {} photos used", self.used, self.limit)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddControlView {
    pub enabled: bool,
    /// Shown as a tooltip and as the limit note while the limit is reached.
    pub limit_note: Option<String>,
}

/// How a thumbnail is brought into view inside its strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollIntoView {
    pub smooth: bool,
    pub center_inline: bool,
    /// Only scroll the page vertically if the strip is off screen.
    pub block_nearest: bool,
}

impl Default for ScrollIntoView {
    fn default() -> Self {
        Self {
            smooth: true,
            center_inline: true,
            block_nearest: true,
        }
    }
}

/// User-visible message, e.g. a failed network request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
}

pub trait Presenter {
    /// Attaches the viewer's root under `mount`.
    fn mount(&mut self, _mount: &str) {}

    /// Shows the placeholder instead of stage and thumbnails, or hides it.
    fn set_empty(&mut self, empty: bool);

    /// Assigns the stage asset. The stage must read as "not loaded" until
    /// [`Presenter::set_stage_loaded`] is called, unless `Ready` is returned.
    fn show_stage(&mut self, stage: &StageView) -> AssetState;

    fn set_stage_loaded(&mut self, loaded: bool);

    /// `src` finished preloading; a later [`Presenter::show_stage`] for it
    /// may return `Ready`.
    fn asset_cached(&mut self, _src: &str) {}

    fn set_caption(&mut self, _caption: Option<&str>) {}

    /// Rebuilds the thumbnail strip.
    fn render_thumbs(&mut self, thumbs: &[ThumbView]);

    /// Marks exactly the thumbnail at `index` as current.
    fn mark_current(&mut self, index: usize);

    fn scroll_thumb_into_view(&mut self, index: usize, scroll: ScrollIntoView);

    /// Horizontal scroll of the thumbnail strip by `dx` logical pixels.
    fn scroll_strip_by(&mut self, dx: f64);

    fn render_chips(&mut self, _chips: &[ChipView]) {}

    fn set_counter(&mut self, _counter: &CounterView) {}

    fn set_add_control(&mut self, _add: &AddControlView) {}

    fn notify(&mut self, notice: &Notice);

    fn follow_link(&mut self, _url: &str) {}

    /// Opens the default picker; the choice comes back as a local file path.
    fn open_file_picker(&mut self) {}

    /// Releases everything bound at mount time.
    fn teardown(&mut self) {}
}

impl<P: Presenter + ?Sized> Presenter for &mut P {
    fn mount(&mut self, mount: &str) {
        (**self).mount(mount)
    }

    fn set_empty(&mut self, empty: bool) {
        (**self).set_empty(empty)
    }

    fn show_stage(&mut self, stage: &StageView) -> AssetState {
        (**self).show_stage(stage)
    }

    fn set_stage_loaded(&mut self, loaded: bool) {
        (**self).set_stage_loaded(loaded)
    }

    fn asset_cached(&mut self, src: &str) {
        (**self).asset_cached(src)
    }

    fn set_caption(&mut self, caption: Option<&str>) {
        (**self).set_caption(caption)
    }

    fn render_thumbs(&mut self, thumbs: &[ThumbView]) {
        (**self).render_thumbs(thumbs)
    }

    fn mark_current(&mut self, index: usize) {
        (**self).mark_current(index)
    }

    fn scroll_thumb_into_view(&mut self, index: usize, scroll: ScrollIntoView) {
        (**self).scroll_thumb_into_view(index, scroll)
    }

    fn scroll_strip_by(&mut self, dx: f64) {
        (**self).scroll_strip_by(dx)
    }

    fn render_chips(&mut self, chips: &[ChipView]) {
        (**self).render_chips(chips)
    }

    fn set_counter(&mut self, counter: &CounterView) {
        (**self).set_counter(counter)
    }

    fn set_add_control(&mut self, add: &AddControlView) {
        (**self).set_add_control(add)
    }

    fn notify(&mut self, notice: &Notice) {
        (**self).notify(notice)
    }

    fn follow_link(&mut self, url: &str) {
        (**self).follow_link(url)
    }

    fn open_file_picker(&mut self) {
        (**self).open_file_picker()
    }

    fn teardown(&mut self) {
        (**self).teardown()
    }
}

/// Per-render options that come from the viewer rather than the state.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThumbOptions {
    pub removable: bool,
}

#[derive(Debug, Clone)]
pub struct RenderCoordinator {
    variant: Variant,
    /// Stage currently assigned to the presenter and whether it finished loading.
    shown: Option<(StageView, bool)>,
    scroll: ScrollIntoView,
}

impl RenderCoordinator {
    pub fn new(variant: Variant) -> Self {
        Self {
            variant,
            shown: None,
            scroll: ScrollIntoView::default(),
        }
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn stage_loaded(&self) -> bool {
        self.shown.as_ref().is_some_and(|(_, loaded)| *loaded)
    }

    /// Full pipeline after the filtered set changed: placeholder, stage,
    /// rebuilt strip, highlight, scroll.
    pub fn render_all<P: Presenter + ?Sized>(
        &mut self,
        state: &ViewerState,
        thumbs: ThumbOptions,
        presenter: &mut P,
    ) {
        let Some(active) = state.active_index() else {
            self.shown = None;
            presenter.set_empty(true);
            return;
        };
        presenter.set_empty(false);
        self.update_stage(state, presenter);
        presenter.render_thumbs(&thumb_views(state, active, thumbs));
        presenter.mark_current(active);
        presenter.scroll_thumb_into_view(active, self.scroll);
    }

    /// Pipeline after a navigation call: stage, highlight, scroll.
    pub fn render_active<P: Presenter + ?Sized>(&mut self, state: &ViewerState, presenter: &mut P) {
        let Some(active) = state.active_index() else {
            return;
        };
        self.update_stage(state, presenter);
        presenter.mark_current(active);
        presenter.scroll_thumb_into_view(active, self.scroll);
    }

    /// Source of the asset currently assigned to the stage.
    pub fn stage_src(&self) -> Option<&str> {
        self.shown.as_ref().map(|(stage, _)| stage.src.as_str())
    }

    /// Load completion for `src`. Completions for a superseded stage are ignored.
    pub fn asset_loaded<P: Presenter + ?Sized>(&mut self, src: &str, presenter: &mut P) -> bool {
        match self.shown.as_mut() {
            Some((stage, loaded)) if stage.src == src && !*loaded => {
                *loaded = true;
                presenter.set_stage_loaded(true);
                true
            }
            _ => false,
        }
    }

    /// A preload for `src` completed. The presenter records it as cached and
    /// the stage completes when it was waiting on that asset.
    pub fn asset_ready<P: Presenter + ?Sized>(&mut self, src: &str, presenter: &mut P) -> bool {
        presenter.asset_cached(src);
        self.asset_loaded(src, presenter)
    }

    /// Forgets the assigned stage so the next render reassigns it.
    pub fn reset(&mut self) {
        self.shown = None;
    }

    fn update_stage<P: Presenter + ?Sized>(&mut self, state: &ViewerState, presenter: &mut P) {
        let Some(item) = state.active_item() else {
            return;
        };
        let stage = stage_view(item);
        if self.shown.as_ref().is_some_and(|(shown, _)| *shown == stage) {
            return;
        }
        presenter.set_stage_loaded(false);
        let loaded = presenter.show_stage(&stage) == AssetState::Ready;
        if loaded {
            presenter.set_stage_loaded(true);
        }
        if self.variant == Variant::Modal {
            presenter.set_caption(item.caption());
        }
        self.shown = Some((stage, loaded));
    }
}

fn stage_view(item: &Item) -> StageView {
    let alt = [item.alt(), item.title()]
        .into_iter()
        .find(|text| !text.is_empty())
        .unwrap_or("Gallery image");
    StageView {
        item_id: item.id().to_string(),
        src: item.src().to_string(),
        alt: alt.to_string(),
    }
}

fn thumb_views(state: &ViewerState, active: usize, options: ThumbOptions) -> Vec<ThumbView> {
    state
        .filtered_items()
        .enumerate()
        .map(|(index, item)| {
            let alt = [item.alt(), item.title()]
                .into_iter()
                .find(|text| !text.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| format!("Image {}", index + 1));
            let label = if item.title().is_empty() {
                "View image".to_string()
            } else {
                format!("View {}", item.title())
            };
            ThumbView {
                index,
                item_id: item.id().to_string(),
                src: item.thumb().to_string(),
                alt,
                label,
                current: index == active,
                removable: options.removable,
            }
        })
        .collect()
}
