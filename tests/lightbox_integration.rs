use media_viewer::document::{HeadlessDocument, ListenerKind};
use media_viewer::focus::ElementId;
use media_viewer::input::{ClickTarget, InputEvent, Key, KeyEvent};
use media_viewer::item::RawItem;
use media_viewer::lightbox::{CLOSE_CONTROL, Lightbox, LightboxOptions, OVERLAY_CONTROLS};
use media_viewer::scene::Scene;
use media_viewer::tasks::preloader::Preloader;
use tokio::sync::mpsc;

fn images(n: usize) -> Vec<RawItem> {
    (0..n)
        .map(|i| RawItem::new(format!("/img/{i}.jpg")).with_id(format!("p{i}")))
        .collect()
}

fn document() -> HeadlessDocument {
    HeadlessDocument::new()
        .with_focus("page-link")
        .with_body_overflow("clip")
        .with_overlay_controls(OVERLAY_CONTROLS)
}

fn focused(lb: &Lightbox<HeadlessDocument, Scene>) -> Option<&str> {
    lb.document().active.as_ref().map(ElementId::as_str)
}

fn esc() -> InputEvent {
    InputEvent::Key(KeyEvent::new(Key::Escape))
}

#[test]
fn escape_restores_prior_overflow_and_focus() {
    let mut lb = Lightbox::new(
        document(),
        Scene::default(),
        LightboxOptions {
            images: images(3),
            ..LightboxOptions::default()
        },
    );
    assert!(lb.show());
    assert_eq!(lb.document().body_overflow, "hidden");
    assert_eq!(focused(&lb), Some(CLOSE_CONTROL));

    lb.handle_input(&esc());
    assert!(!lb.is_open());
    assert_eq!(lb.document().body_overflow, "clip");
    assert_eq!(focused(&lb), Some("page-link"));
    assert_eq!(lb.document().total_listeners(), 0);
}

#[test]
fn trigger_takes_precedence_for_focus_return() {
    let mut lb = Lightbox::new(
        document(),
        Scene::default(),
        LightboxOptions {
            trigger: Some("gallery-open".into()),
            images: images(2),
            start_index: 0,
        },
    );
    lb.show();
    lb.close();
    assert_eq!(focused(&lb), Some("gallery-open"));
}

#[test]
fn repeated_cycles_never_accumulate_listeners() {
    let mut lb = Lightbox::new(
        document(),
        Scene::default(),
        LightboxOptions {
            images: images(4),
            ..LightboxOptions::default()
        },
    );
    for round in 0..10 {
        lb.open(None, round);
        for kind in [
            ListenerKind::DocumentKeydown,
            ListenerKind::StripWheel,
            ListenerKind::ThumbClick,
        ] {
            assert_eq!(lb.document().listener_count(kind), 1);
        }
        lb.handle_input(&esc());
        assert_eq!(lb.document().total_listeners(), 0);
        assert_eq!(lb.document().body_overflow, "clip");
    }
}

#[test]
fn navigation_while_open() {
    let mut lb = Lightbox::new(
        document(),
        Scene::default(),
        LightboxOptions {
            images: images(3),
            start_index: 2,
            ..LightboxOptions::default()
        },
    );
    lb.show();
    assert_eq!(lb.state().active_index(), Some(2));
    lb.handle_input(&InputEvent::Key(KeyEvent::new(Key::ArrowRight)));
    assert_eq!(lb.state().active_index(), Some(0));
    lb.handle_input(&InputEvent::Key(KeyEvent::new(Key::End)));
    assert_eq!(lb.state().active_index(), Some(2));
    lb.handle_input(&InputEvent::Click(ClickTarget::Thumb { index: "1".into() }));
    assert_eq!(lb.state().active_index(), Some(1));
    assert_eq!(lb.presenter().current_thumbs(), vec![1]);

    lb.handle_input(&InputEvent::Wheel { dx: 0.0, dy: 50.0 });
    assert_eq!(lb.presenter().strip_scroll_left, 50.0);
    lb.handle_input(&InputEvent::Wheel { dx: 50.0, dy: 10.0 });
    assert_eq!(lb.presenter().strip_scroll_left, 50.0);
}

#[test]
fn swipe_thirty_ignored_sixty_navigates() {
    let mut lb = Lightbox::new(
        document(),
        Scene::default(),
        LightboxOptions {
            images: images(3),
            ..LightboxOptions::default()
        },
    );
    lb.show();
    lb.handle_input(&InputEvent::TouchStart { x: 300.0 });
    lb.handle_input(&InputEvent::TouchEnd { x: 270.0 });
    assert_eq!(lb.state().active_index(), Some(0));

    lb.handle_input(&InputEvent::TouchStart { x: 300.0 });
    lb.handle_input(&InputEvent::TouchEnd { x: 240.0 });
    assert_eq!(lb.state().active_index(), Some(1));

    lb.handle_input(&InputEvent::TouchStart { x: 300.0 });
    lb.handle_input(&InputEvent::TouchEnd { x: 360.0 });
    assert_eq!(lb.state().active_index(), Some(0));
}

#[test]
fn open_preloads_neighbors() {
    let (tx, mut rx) = mpsc::channel(8);
    let mut lb = Lightbox::new(
        document(),
        Scene::default(),
        LightboxOptions {
            images: images(5),
            ..LightboxOptions::default()
        },
    )
    .with_preloader(Preloader::new(tx));
    lb.open(None, 2);
    assert_eq!(rx.try_recv().unwrap().0, "/img/3.jpg");
    assert_eq!(rx.try_recv().unwrap().0, "/img/1.jpg");
    lb.next();
    assert_eq!(rx.try_recv().unwrap().0, "/img/4.jpg");
    assert_eq!(rx.try_recv().unwrap().0, "/img/2.jpg");
}

#[test]
fn caption_hidden_without_text() {
    let mut lb = Lightbox::new(
        document(),
        Scene::default(),
        LightboxOptions {
            images: vec![
                RawItem::new("/img/a.jpg"),
                RawItem::new("/img/b.jpg").with_alt("Harbor at dusk"),
            ],
            ..LightboxOptions::default()
        },
    );
    lb.show();
    assert_eq!(lb.presenter().caption, None);
    lb.next();
    assert_eq!(lb.presenter().caption.as_deref(), Some("Harbor at dusk"));
}

#[test]
fn drop_while_open_releases_document() {
    let mut doc = document();
    {
        let mut lb = Lightbox::new(
            &mut doc,
            Scene::default(),
            LightboxOptions {
                images: images(2),
                ..LightboxOptions::default()
            },
        );
        lb.show();
    }
    assert_eq!(doc.body_overflow, "clip");
    assert_eq!(doc.total_listeners(), 0);
    assert!(!doc.overlay_attached);
    assert_eq!(doc.active.as_ref().map(ElementId::as_str), Some("page-link"));
}
