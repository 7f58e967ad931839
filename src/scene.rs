//! Headless presenter that records what a real presentation layer would show.
//!
//! Used by the console binary and by tests to observe render contracts
//! without any windowing or DOM.

use std::collections::HashSet;
use std::fmt;

use crate::render::{
    AddControlView, AssetState, ChipView, CounterView, Notice, Presenter, ScrollIntoView,
    StageView, ThumbView,
};

#[derive(Debug, Default, Clone)]
pub struct Scene {
    pub mount: Option<String>,
    pub empty_visible: bool,
    pub stage: Option<StageView>,
    pub stage_loaded: bool,
    /// Number of stage asset assignments so far.
    pub stage_assignments: usize,
    pub caption: Option<String>,
    pub thumbs: Vec<ThumbView>,
    pub scrolled_to: Option<usize>,
    pub strip_scroll_left: f64,
    pub chips: Vec<ChipView>,
    pub counter: Option<CounterView>,
    pub add_control: Option<AddControlView>,
    pub notices: Vec<String>,
    pub followed_links: Vec<String>,
    pub file_picker_requests: usize,
    pub torn_down: bool,
    cached: HashSet<String>,
}

impl Scene {
    /// Marks `src` as decoded so a later stage assignment completes synchronously.
    pub fn cache_asset(&mut self, src: impl Into<String>) {
        self.cached.insert(src.into());
    }

    pub fn current_thumbs(&self) -> Vec<usize> {
        self.thumbs
            .iter()
            .filter(|thumb| thumb.current)
            .map(|thumb| thumb.index)
            .collect()
    }

    pub fn active_chip(&self) -> Option<&str> {
        self.chips
            .iter()
            .find(|chip| chip.active)
            .map(|chip| chip.tag.as_str())
    }
}

impl Presenter for Scene {
    fn mount(&mut self, mount: &str) {
        self.mount = Some(mount.to_string());
        self.torn_down = false;
    }

    fn set_empty(&mut self, empty: bool) {
        self.empty_visible = empty;
        if empty {
            self.stage = None;
            self.stage_loaded = false;
            self.thumbs.clear();
            self.caption = None;
        }
    }

    fn show_stage(&mut self, stage: &StageView) -> AssetState {
        self.stage = Some(stage.clone());
        self.stage_assignments += 1;
        if self.cached.contains(&stage.src) {
            AssetState::Ready
        } else {
            AssetState::Pending
        }
    }

    fn set_stage_loaded(&mut self, loaded: bool) {
        self.stage_loaded = loaded;
        if loaded && let Some(stage) = &self.stage {
            self.cached.insert(stage.src.clone());
        }
    }

    fn asset_cached(&mut self, src: &str) {
        self.cache_asset(src);
    }

    fn set_caption(&mut self, caption: Option<&str>) {
        self.caption = caption.map(str::to_string);
    }

    fn render_thumbs(&mut self, thumbs: &[ThumbView]) {
        self.thumbs = thumbs.to_vec();
        self.strip_scroll_left = 0.0;
    }

    fn mark_current(&mut self, index: usize) {
        for thumb in &mut self.thumbs {
            thumb.current = thumb.index == index;
        }
    }

    fn scroll_thumb_into_view(&mut self, index: usize, _scroll: ScrollIntoView) {
        self.scrolled_to = Some(index);
    }

    fn scroll_strip_by(&mut self, dx: f64) {
        self.strip_scroll_left = (self.strip_scroll_left + dx).max(0.0);
    }

    fn render_chips(&mut self, chips: &[ChipView]) {
        self.chips = chips.to_vec();
    }

    fn set_counter(&mut self, counter: &CounterView) {
        self.counter = Some(counter.clone());
    }

    fn set_add_control(&mut self, add: &AddControlView) {
        self.add_control = Some(add.clone());
    }

    fn notify(&mut self, notice: &Notice) {
        self.notices.push(notice.message.clone());
    }

    fn follow_link(&mut self, url: &str) {
        self.followed_links.push(url.to_string());
    }

    fn open_file_picker(&mut self) {
        self.file_picker_requests += 1;
    }

    fn teardown(&mut self) {
        self.torn_down = true;
        self.mount = None;
    }
}

impl fmt::Display for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.chips.is_empty() {
            let chips: Vec<String> = self
                .chips
                .iter()
                .map(|chip| {
                    if chip.active {
                        format!("[{}]", chip.label)
                    } else {
                        chip.label.clone()
                    }
                })
                .collect();
            writeln!(f, "filters: {}", chips.join(" "))?;
        }
        if let Some(counter) = &self.counter {
            let full = if counter.full { " (full)" } else { "" };
            writeln!(f, "counter: {}{full}", counter.text())?;
        }
        if let Some(note) = self.add_control.as_ref().and_then(|a| a.limit_note.as_ref()) {
            writeln!(f, "note: {note}")?;
        }
        if self.empty_visible {
            writeln!(f, "No results. Adjust search or filters.")?;
        } else if let Some(stage) = &self.stage {
            let state = if self.stage_loaded { "loaded" } else { "loading" };
            writeln!(f, "stage: {} <{}> ({state})", stage.alt, stage.src)?;
            if let Some(caption) = &self.caption {
                writeln!(f, "caption: {caption}")?;
            }
            let strip: Vec<String> = self
                .thumbs
                .iter()
                .map(|thumb| {
                    let marker = if thumb.current { ">" } else { " " };
                    let remove = if thumb.removable { " [x]" } else { "" };
                    format!("{marker}{}:{}{remove}", thumb.index, thumb.item_id)
                })
                .collect();
            writeln!(f, "thumbs: {}", strip.join(" "))?;
        }
        for notice in &self.notices {
            writeln!(f, "notice: {notice}")?;
        }
        Ok(())
    }
}
