//! Maps raw keyboard, pointer, wheel and touch input to viewer commands.

use crate::render::Variant;

/// Minimum horizontal travel, in logical pixels, for a swipe to navigate.
pub const SWIPE_THRESHOLD_PX: f64 = 40.0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    ArrowLeft,
    ArrowRight,
    Home,
    End,
    Escape,
    Tab,
    Other(String),
}

impl Key {
    /// Parses a DOM-style `KeyboardEvent.key` name.
    pub fn from_name(name: &str) -> Self {
        match name {
            "ArrowLeft" => Key::ArrowLeft,
            "ArrowRight" => Key::ArrowRight,
            "Home" => Key::Home,
            "End" => Key::End,
            "Escape" => Key::Escape,
            "Tab" => Key::Tab,
            other => Key::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    pub shift: bool,
}

impl KeyEvent {
    pub fn new(key: Key) -> Self {
        Self { key, shift: false }
    }

    pub fn shifted(key: Key) -> Self {
        Self { key, shift: true }
    }
}

/// What a pointer click landed on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickTarget {
    /// A thumbnail carrying its `data-index` attribute verbatim.
    Thumb { index: String },
    /// The strip's own scroll container.
    Strip,
    Other,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    Key(KeyEvent),
    Click(ClickTarget),
    /// Wheel gesture while hovering the thumbnail strip.
    Wheel { dx: f64, dy: f64 },
    TouchStart { x: f64 },
    TouchEnd { x: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Prev,
    Next,
    First,
    Last,
    GoTo(isize),
    Close,
    ScrollStrip(f64),
    /// Tab at the overlay boundary; the owner decides whether to wrap.
    ContainFocus { backward: bool },
}

/// Routing result: the command to run and whether the platform default
/// (page scroll, focus move) must be suppressed.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Routed {
    pub command: Option<Command>,
    pub prevent_default: bool,
}

impl Routed {
    fn ignore() -> Self {
        Self::default()
    }

    fn run(command: Command) -> Self {
        Self {
            command: Some(command),
            prevent_default: true,
        }
    }

    fn passive(command: Command) -> Self {
        Self {
            command: Some(command),
            prevent_default: false,
        }
    }
}

/// Tracks the start of a touch gesture on the stage.
#[derive(Debug, Clone, Default)]
pub struct SwipeTracker {
    start_x: Option<f64>,
}

impl SwipeTracker {
    pub fn start(&mut self, x: f64) {
        self.start_x = Some(x);
    }

    /// Leftward travel means next, rightward means previous.
    ///
    /// Only horizontal displacement is considered, so a mostly vertical
    /// gesture that drifts far enough sideways still navigates.
    pub fn end(&mut self, x: f64) -> Option<Command> {
        let start = self.start_x.take()?;
        let delta = x - start;
        if delta.abs() < SWIPE_THRESHOLD_PX {
            return None;
        }
        Some(if delta < 0.0 {
            Command::Next
        } else {
            Command::Prev
        })
    }
}

#[derive(Debug, Clone)]
pub struct InputRouter {
    variant: Variant,
    swipe: SwipeTracker,
}

impl InputRouter {
    pub fn new(variant: Variant) -> Self {
        Self {
            variant,
            swipe: SwipeTracker::default(),
        }
    }

    pub fn route(&mut self, event: &InputEvent) -> Routed {
        match event {
            InputEvent::Key(key) => route_key(self.variant, key),
            InputEvent::Click(target) => route_click(target),
            InputEvent::Wheel { dx, dy } => route_wheel(*dx, *dy),
            InputEvent::TouchStart { x } if self.variant == Variant::Modal => {
                self.swipe.start(*x);
                Routed::ignore()
            }
            InputEvent::TouchEnd { x } if self.variant == Variant::Modal => self
                .swipe
                .end(*x)
                .map(Routed::passive)
                .unwrap_or_default(),
            InputEvent::TouchStart { .. } | InputEvent::TouchEnd { .. } => Routed::ignore(),
        }
    }
}

pub fn route_key(variant: Variant, event: &KeyEvent) -> Routed {
    match (&event.key, variant) {
        (Key::ArrowLeft, _) => Routed::run(Command::Prev),
        (Key::ArrowRight, _) => Routed::run(Command::Next),
        (Key::Home, _) => Routed::run(Command::First),
        (Key::End, _) => Routed::run(Command::Last),
        (Key::Escape, Variant::Modal) => Routed::run(Command::Close),
        (Key::Tab, Variant::Modal) => Routed::passive(Command::ContainFocus {
            backward: event.shift,
        }),
        _ => Routed::ignore(),
    }
}

/// Thumbnails navigate when their index attribute is an integer.
pub fn route_click(target: &ClickTarget) -> Routed {
    match target {
        ClickTarget::Thumb { index } => index
            .trim()
            .parse::<isize>()
            .map(|idx| Routed::passive(Command::GoTo(idx)))
            .unwrap_or_default(),
        ClickTarget::Strip | ClickTarget::Other => Routed::ignore(),
    }
}

/// Mostly vertical wheel motion scrolls the strip sideways.
pub fn route_wheel(dx: f64, dy: f64) -> Routed {
    if dy.abs() > dx.abs() {
        Routed::run(Command::ScrollStrip(dy))
    } else {
        Routed::ignore()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arrows_and_home_end_prevent_default() {
        for (key, command) in [
            (Key::ArrowLeft, Command::Prev),
            (Key::ArrowRight, Command::Next),
            (Key::Home, Command::First),
            (Key::End, Command::Last),
        ] {
            let routed = route_key(Variant::Inline, &KeyEvent::new(key));
            assert_eq!(routed.command, Some(command));
            assert!(routed.prevent_default);
        }
    }

    #[test]
    fn escape_and_tab_only_matter_in_modal() {
        let esc = KeyEvent::new(Key::Escape);
        assert_eq!(route_key(Variant::Inline, &esc), Routed::default());
        assert_eq!(route_key(Variant::Modal, &esc).command, Some(Command::Close));

        let tab = KeyEvent::shifted(Key::Tab);
        let routed = route_key(Variant::Modal, &tab);
        assert_eq!(routed.command, Some(Command::ContainFocus { backward: true }));
        assert!(!routed.prevent_default);
    }

    #[test]
    fn key_names_parse() {
        assert_eq!(Key::from_name("End"), Key::End);
        assert_eq!(Key::from_name("a"), Key::Other("a".into()));
    }

    #[test]
    fn thumb_click_requires_numeric_index() {
        let click = |index: &str| {
            route_click(&ClickTarget::Thumb {
                index: index.into(),
            })
        };
        assert_eq!(click("3").command, Some(Command::GoTo(3)));
        assert_eq!(click("x").command, None);
        assert_eq!(click("1.5").command, None);
        assert_eq!(route_click(&ClickTarget::Strip).command, None);
    }

    #[test]
    fn wheel_translation_needs_dominant_vertical_delta() {
        let routed = route_wheel(2.0, -30.0);
        assert_eq!(routed.command, Some(Command::ScrollStrip(-30.0)));
        assert!(routed.prevent_default);
        assert_eq!(route_wheel(30.0, 2.0), Routed::default());
        assert_eq!(route_wheel(5.0, 5.0), Routed::default());
    }

    #[test]
    fn swipe_threshold() {
        let mut router = InputRouter::new(Variant::Modal);
        router.route(&InputEvent::TouchStart { x: 100.0 });
        assert_eq!(router.route(&InputEvent::TouchEnd { x: 70.0 }).command, None);

        router.route(&InputEvent::TouchStart { x: 100.0 });
        assert_eq!(
            router.route(&InputEvent::TouchEnd { x: 40.0 }).command,
            Some(Command::Next)
        );

        router.route(&InputEvent::TouchStart { x: 100.0 });
        assert_eq!(
            router.route(&InputEvent::TouchEnd { x: 160.0 }).command,
            Some(Command::Prev)
        );
    }

    #[test]
    fn touch_end_without_start_is_ignored() {
        let mut swipe = SwipeTracker::default();
        assert_eq!(swipe.end(500.0), None);
    }

    #[test]
    fn inline_viewer_ignores_touch() {
        let mut router = InputRouter::new(Variant::Inline);
        router.route(&InputEvent::TouchStart { x: 100.0 });
        assert_eq!(router.route(&InputEvent::TouchEnd { x: 0.0 }), Routed::default());
    }
}
