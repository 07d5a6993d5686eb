//! The demo app driven against a headless engine.

use std::ops::ControlFlow;

use ncwrap::prelude::*;
use ncwrap_demo::app::App;
use ncwrap_demo::demos::{self, Demo, MouseDemo};
use ncwrap_demo::error::DemoError;
use ncwrap_engine::EngineMonitor;

fn session(rows: u32, cols: u32) -> (Session, EngineMonitor) {
    let engine = SoftEngine::headless(rows, cols);
    let monitor = engine.monitor();
    let session = Session::init(engine, &InitOptions::default()).unwrap();
    (session, monitor)
}

#[test]
fn lays_out_title_menu_and_content() {
    let (session, monitor) = session(24, 80);
    let app = App::new(&session, 0, None).unwrap();

    let title = monitor.frame().row_text(0);
    assert!(title.starts_with(" ncwrap demo"), "{title:?}");
    assert!(title.trim_end().ends_with("Quit: q"), "{title:?}");
    assert_eq!(session.at(0, 0).unwrap().channels.bg_rgb(), Color::BLUE);

    assert_eq!(app.current(), 0);
    assert_eq!(app.selector().selected().as_deref(), Some("0"));
    assert_eq!(app.selector().items().len(), demos::all(None).len());
    assert!(app.content().parent().unwrap().ptr_eq(app.border()));
    assert_eq!(app.border().abs_y(), 4);
    assert_eq!(app.border().rows(), 18);
}

#[test]
fn arrows_and_vi_keys_switch_demos() {
    let (session, monitor) = session(24, 80);
    let mut app = App::new(&session, 0, None).unwrap();
    let text_planes = monitor.live_plane_count();

    let flow = app.handle(&session, &InputEvent::key(Key::Down));
    assert_eq!(flow, ControlFlow::Continue(()));
    assert_eq!(app.current(), 1);
    assert_eq!(app.selector().selected().as_deref(), Some("1"));
    // The plane demo adds a gradient, a box and an overlay.
    assert_eq!(monitor.live_plane_count(), text_planes + 3);

    app.handle(&session, &InputEvent::key('k'));
    assert_eq!(app.current(), 0);
    assert_eq!(monitor.live_plane_count(), text_planes);

    // Already at the top.
    app.handle(&session, &InputEvent::key(Key::Up));
    assert_eq!(app.current(), 0);
    assert_eq!(app.selector().selected().as_deref(), Some("0"));

    app.handle(&session, &InputEvent::key('j'));
    app.handle(&session, &InputEvent::key('j'));
    app.handle(&session, &InputEvent::key('j'));
    assert_eq!(app.current(), 2);
}

#[test]
fn run_returns_on_quit() {
    let (session, monitor) = session(24, 80);
    let mut app = App::new(&session, 1, None).unwrap();
    monitor.push_input(InputEvent::key(Key::Down));
    monitor.push_input(InputEvent::key('q'));
    monitor.push_input(InputEvent::key(Key::Up));
    app.run(&session).unwrap();
    assert_eq!(app.current(), 2);
    assert!(monitor.stats().renders >= 2);
}

#[test]
fn start_index_is_clamped() {
    let (session, _monitor) = session(24, 80);
    let app = App::new(&session, 99, None).unwrap();
    assert_eq!(app.current(), 2);
}

#[test]
fn tiny_terminal_is_rejected() {
    let (session, _monitor) = session(8, 40);
    let err = App::new(&session, 0, None).err().unwrap();
    assert!(matches!(err, DemoError::TooSmall { rows: 8, cols: 40 }), "{err}");
}

#[test]
fn dropping_the_app_releases_its_planes() {
    let (session, monitor) = session(24, 80);
    let app = App::new(&session, 1, None).unwrap();
    assert!(monitor.live_plane_count() > 1);
    drop(app);
    assert_eq!(monitor.live_plane_count(), 1);
    assert_eq!(monitor.stats().selector_destroys, 1);
}

#[test]
fn mouse_demo_counts_clicks_in_its_pad() {
    let (session, monitor) = session(24, 80);
    let content = Plane::create_at(&session.std_plane(), 2, 2, 16, 37).unwrap();
    let mut demo = MouseDemo::new(None);
    demo.start(&session, &content).unwrap();
    assert_eq!(monitor.stats().blits, 1);

    // The icon is 8x16 pixels, two pixel rows per cell, at content (1, 1).
    // The pad starts two rows below it, at content (6, 1).
    let press = InputEvent::mouse(Key::Button(1), 2 + 7, 2 + 3, EventType::Press);
    assert!(demo.handle_input(&press));
    assert_eq!(demo.clicks(), 1);
    assert_eq!(content.at(15, 1).unwrap().egc, "1");

    let outside = InputEvent::mouse(Key::Button(1), 0, 0, EventType::Press);
    assert!(demo.handle_input(&outside));
    assert_eq!(demo.clicks(), 1);
    assert!(!demo.handle_input(&InputEvent::key('x')));

    demo.stop();
    assert_eq!(monitor.live_plane_count(), 2);
}

#[test]
fn mouse_demo_falls_back_to_the_built_in_icon() {
    let dir = tempfile::tempdir().unwrap();
    let (session, monitor) = session(24, 80);
    let content = Plane::create_at(&session.std_plane(), 2, 2, 16, 37).unwrap();
    let mut demo = MouseDemo::new(Some(dir.path().join("missing.png")));
    demo.start(&session, &content).unwrap();
    assert_eq!(monitor.stats().visual_creates, 1);
}
